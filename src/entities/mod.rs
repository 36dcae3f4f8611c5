pub mod category;
pub mod equipment;
pub mod equipment_group;
pub mod equipment_manip;
pub mod equipment_preference;
pub mod location;
pub mod manip;
pub mod manip_user;
pub mod preference;
pub mod site;
pub mod user;
