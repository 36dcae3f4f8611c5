use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_site_tables::Migration),
            Box::new(m20240101_000002_create_equipment_tables::Migration),
            Box::new(m20240101_000003_create_users_table::Migration),
            Box::new(m20240101_000004_create_manip_tables::Migration),
            Box::new(m20240101_000005_create_preference_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_site_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_site_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sites::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Sites::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Sites::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Sites::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sites::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Locations::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Locations::SiteId).integer().not_null())
                        .col(
                            ColumnDef::new(Locations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Locations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_locations_site_id")
                                .from(Locations::Table, Locations::SiteId)
                                .to(Sites::Table, Sites::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sites::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Sites {
        Table,
        Id,
        Name,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
        Name,
        SiteId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_equipment_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_equipment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Categories::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EquipmentGroups::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EquipmentGroups::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(EquipmentGroups::Name)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EquipmentGroups::CategoryId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EquipmentGroups::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EquipmentGroups::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_equipment_groups_category_id")
                                .from(EquipmentGroups::Table, EquipmentGroups::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Equipments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Equipments::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Equipments::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Equipments::Operational)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Equipments::EquipmentGroupId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Equipments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Equipments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_equipments_equipment_group_id")
                                .from(Equipments::Table, Equipments::EquipmentGroupId)
                                .to(EquipmentGroups::Table, EquipmentGroups::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Equipments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(EquipmentGroups::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Categories {
        Table,
        Id,
        Name,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum EquipmentGroups {
        Table,
        Id,
        Name,
        CategoryId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Equipments {
        Table,
        Id,
        Name,
        Operational,
        EquipmentGroupId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Users::FirstName).string_len(255).not_null())
                        .col(ColumnDef::new(Users::LastName).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::Color)
                                .string_len(6)
                                .not_null()
                                .default("3f51b5"),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        PasswordHash,
        Color,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_manip_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_manip_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Manips::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Manips::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Manips::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Manips::UserId).integer().not_null())
                        .col(ColumnDef::new(Manips::LocationId).integer().not_null())
                        .col(ColumnDef::new(Manips::BeginDate).date_time().not_null())
                        .col(ColumnDef::new(Manips::EndDate).date_time().not_null())
                        .col(
                            ColumnDef::new(Manips::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Manips::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_manips_user_id")
                                .from(Manips::Table, Manips::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_manips_location_id")
                                .from(Manips::Table, Manips::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // The conflict lookup filters on both bounds
            manager
                .create_index(
                    Index::create()
                        .name("idx_manips_begin_end")
                        .table(Manips::Table)
                        .col(Manips::BeginDate)
                        .col(Manips::EndDate)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EquipmentManip::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(EquipmentManip::ManipId).integer().not_null())
                        .col(
                            ColumnDef::new(EquipmentManip::EquipmentId)
                                .integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .name("pk_equipment_manip")
                                .col(EquipmentManip::ManipId)
                                .col(EquipmentManip::EquipmentId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_equipment_manip_manip_id")
                                .from(EquipmentManip::Table, EquipmentManip::ManipId)
                                .to(Manips::Table, Manips::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_equipment_manip_equipment_id")
                                .from(EquipmentManip::Table, EquipmentManip::EquipmentId)
                                .to(Equipments::Table, Equipments::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_equipment_manip_equipment_id")
                        .table(EquipmentManip::Table)
                        .col(EquipmentManip::EquipmentId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ManipUser::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ManipUser::ManipId).integer().not_null())
                        .col(ColumnDef::new(ManipUser::UserId).integer().not_null())
                        .primary_key(
                            Index::create()
                                .name("pk_manip_user")
                                .col(ManipUser::ManipId)
                                .col(ManipUser::UserId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_manip_user_manip_id")
                                .from(ManipUser::Table, ManipUser::ManipId)
                                .to(Manips::Table, Manips::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_manip_user_user_id")
                                .from(ManipUser::Table, ManipUser::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ManipUser::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(EquipmentManip::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Manips::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Manips {
        Table,
        Id,
        Name,
        UserId,
        LocationId,
        BeginDate,
        EndDate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum EquipmentManip {
        Table,
        ManipId,
        EquipmentId,
    }

    #[derive(DeriveIden)]
    enum ManipUser {
        Table,
        ManipId,
        UserId,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Equipments {
        Table,
        Id,
    }
}

mod m20240101_000005_create_preference_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_preference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Preferences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Preferences::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Preferences::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Preferences::UserId).integer().not_null())
                        .col(
                            ColumnDef::new(Preferences::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Preferences::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_preferences_user_id")
                                .from(Preferences::Table, Preferences::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EquipmentPreference::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EquipmentPreference::PreferenceId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EquipmentPreference::EquipmentId)
                                .integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .name("pk_equipment_preference")
                                .col(EquipmentPreference::PreferenceId)
                                .col(EquipmentPreference::EquipmentId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_equipment_preference_preference_id")
                                .from(EquipmentPreference::Table, EquipmentPreference::PreferenceId)
                                .to(Preferences::Table, Preferences::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_equipment_preference_equipment_id")
                                .from(EquipmentPreference::Table, EquipmentPreference::EquipmentId)
                                .to(Equipments::Table, Equipments::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EquipmentPreference::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Preferences::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Preferences {
        Table,
        Id,
        Name,
        UserId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum EquipmentPreference {
        Table,
        PreferenceId,
        EquipmentId,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Equipments {
        Table,
        Id,
    }
}
