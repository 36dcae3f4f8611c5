use chrono::NaiveDateTime;

const ACCEPTED_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses the wall-clock date-times the web client sends.
///
/// Both `2024-01-01 09:00:00` and `2024-01-01T09:00:00` are accepted, with
/// optional seconds and fraction.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

pub fn format_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Serde adapter writing `YYYY-MM-DD HH:MM:SS` and reading any accepted format
pub mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_datetime(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_datetime(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid date-time: {}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("2024-01-01 09:00:00" ; "space separated")]
    #[test_case("2024-01-01T09:00:00" ; "iso separated")]
    #[test_case("2024-01-01T09:00" ; "iso without seconds")]
    #[test_case("2024-01-01 09:00:00.000" ; "with fraction")]
    fn accepted_formats(input: &str) {
        let parsed = parse_datetime(input).expect("should parse");
        assert_eq!(format_datetime(parsed), "2024-01-01 09:00:00");
    }

    #[test_case("" ; "empty")]
    #[test_case("tomorrow" ; "words")]
    #[test_case("2024-13-01 09:00:00" ; "bad month")]
    #[test_case("2024-01-01" ; "date only")]
    fn rejected_formats(input: &str) {
        assert!(parse_datetime(input).is_none());
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Stamp {
        #[serde(with = "wall_clock")]
        at: NaiveDateTime,
    }

    #[test]
    fn wall_clock_serde_uses_space_separator() {
        let stamp: Stamp = serde_json::from_str(r#"{"at":"2024-01-01T09:30:00"}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&stamp).unwrap(),
            r#"{"at":"2024-01-01 09:30:00"}"#
        );
        assert!(serde_json::from_str::<Stamp>(r#"{"at":"soon"}"#).is_err());
    }
}
