use crate::{
    config::BookingConfig,
    db::DbPool,
    services::{
        categories::CategoryService, equipment_groups::EquipmentGroupService,
        equipments::EquipmentService, locations::LocationService, manips::ManipService,
        preferences::PreferenceService, sites::SiteService, users::UserService,
    },
    validation::OperatingHours,
};
use std::sync::Arc;

pub mod categories;
pub mod common;
pub mod equipment_groups;
pub mod equipments;
pub mod locations;
pub mod manips;
pub mod preferences;
pub mod sites;
pub mod users;

/// Services shared by every HTTP handler
#[derive(Clone)]
pub struct AppServices {
    pub sites: Arc<SiteService>,
    pub locations: Arc<LocationService>,
    pub categories: Arc<CategoryService>,
    pub equipment_groups: Arc<EquipmentGroupService>,
    pub equipments: Arc<EquipmentService>,
    pub users: Arc<UserService>,
    pub preferences: Arc<PreferenceService>,
    pub manips: Arc<ManipService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, booking: &BookingConfig) -> Self {
        Self {
            sites: Arc::new(SiteService::new(db_pool.clone())),
            locations: Arc::new(LocationService::new(db_pool.clone())),
            categories: Arc::new(CategoryService::new(db_pool.clone())),
            equipment_groups: Arc::new(EquipmentGroupService::new(db_pool.clone())),
            equipments: Arc::new(EquipmentService::new(db_pool.clone())),
            users: Arc::new(UserService::new(db_pool.clone())),
            preferences: Arc::new(PreferenceService::new(db_pool.clone())),
            manips: Arc::new(ManipService::new(
                db_pool,
                OperatingHours::from(booking),
                booking.max_occurrences,
            )),
        }
    }
}
