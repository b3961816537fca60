pub mod inventory;
pub mod redemption;
pub mod registration_request;
pub mod user;

pub use inventory::*;
pub use redemption::*;
pub use registration_request::*;
pub use user::*;
