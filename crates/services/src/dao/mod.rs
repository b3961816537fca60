pub mod base;
pub mod inventory;
pub mod redemption;
pub mod registration;
pub mod user;

pub use base::BaseDao;
