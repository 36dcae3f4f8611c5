use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Manip API",
        version = "1.0.0",
        description = r#"
# Equipment reservation API

Schedules manips: named, time-boxed reservations of laboratory equipment at a
location, owned by a user and optionally shared with a team.

## Reservation rules

- `begin_date` and `end_date` use the `YYYY-MM-DD HH:MM:SS` wall-clock format
- both must fall between 07:00:00 and 19:00:00 inclusive, and begin must precede end
- an equipment cannot be held by two manips whose windows overlap; touching windows are fine
- the owner cannot also be listed in the team
- a `recurrence` creates every occurrence or none of them

## Authentication

Every `/api` route except `/api/auth/login` and `/api/auth/register` needs a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

## Error Handling

Validation failures answer `422 Unprocessable Entity` with a field map:

```json
{
  "error": "Unprocessable Entity",
  "message": "The given data was invalid",
  "errors": { "begin_date": ["The begin date (2024-01-01 06:00:00) must be between 07:00 and 19:00."] },
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login and registration"),
        (name = "sites", description = "Sites hosting locations"),
        (name = "locations", description = "Rooms where manips take place"),
        (name = "categories", description = "Equipment categories"),
        (name = "equipment-groups", description = "Equipment groups within a category"),
        (name = "equipments", description = "Reservable equipment"),
        (name = "users", description = "User accounts"),
        (name = "preferences", description = "Saved equipment selections"),
        (name = "manips", description = "Equipment reservations"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::health::health_check,

        crate::auth::login_handler,
        crate::auth::register_handler,

        crate::handlers::sites::list_sites,
        crate::handlers::sites::get_site,
        crate::handlers::sites::create_site,
        crate::handlers::sites::update_site,
        crate::handlers::sites::delete_site,

        crate::handlers::locations::list_locations,
        crate::handlers::locations::get_location,
        crate::handlers::locations::create_location,
        crate::handlers::locations::update_location,
        crate::handlers::locations::delete_location,

        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        crate::handlers::equipment_groups::list_equipment_groups,
        crate::handlers::equipment_groups::get_equipment_group,
        crate::handlers::equipment_groups::create_equipment_group,
        crate::handlers::equipment_groups::update_equipment_group,
        crate::handlers::equipment_groups::delete_equipment_group,

        crate::handlers::equipments::list_equipments,
        crate::handlers::equipments::get_equipment,
        crate::handlers::equipments::create_equipment,
        crate::handlers::equipments::update_equipment,
        crate::handlers::equipments::delete_equipment,

        crate::handlers::users::list_users,
        crate::handlers::users::other_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::change_color,
        crate::handlers::users::delete_user,

        crate::handlers::preferences::list_preferences,
        crate::handlers::preferences::my_preferences,
        crate::handlers::preferences::get_preference,
        crate::handlers::preferences::create_preference,
        crate::handlers::preferences::update_preference,
        crate::handlers::preferences::delete_preference,

        crate::handlers::manips::list_manips,
        crate::handlers::manips::my_manips,
        crate::handlers::manips::get_manip,
        crate::handlers::manips::create_manip,
        crate::handlers::manips::update_manip,
        crate::handlers::manips::delete_manip,
    ),
    components(
        schemas(
            crate::entities::site::Model,
            crate::entities::location::Model,
            crate::entities::category::Model,
            crate::entities::equipment_group::Model,
            crate::entities::equipment::Model,
            crate::entities::user::Model,
            crate::entities::preference::Model,
            crate::entities::manip::Model,

            crate::services::sites::SiteInput,
            crate::services::locations::LocationInput,
            crate::services::categories::CategoryInput,
            crate::services::equipment_groups::EquipmentGroupInput,
            crate::services::equipments::EquipmentInput,
            crate::services::users::UserInput,
            crate::services::preferences::PreferenceInput,
            crate::services::preferences::PreferenceResponse,
            crate::services::manips::ManipInput,
            crate::services::manips::ManipResponse,
            crate::services::manips::RecurrenceInput,
            crate::services::manips::Frequency,

            crate::auth::LoginCredentials,
            crate::auth::TokenResponse,
            crate::health::HealthInfo,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_routes_and_security() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Manip API"));
        assert!(json.contains("/api/manips/{id}"));
        assert!(json.contains("/api/users/{id}/change-color/{color}"));
        assert!(json.contains("/api/auth/login"));
        assert!(json.contains("bearer_auth"));
    }
}
