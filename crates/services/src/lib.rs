pub mod admin;
pub mod approval;
pub mod auth;
pub mod dao;
pub mod error;
pub mod export;
pub mod inventory;
pub mod notify;
pub mod redemption;
pub mod reporting;

pub use admin::AccountService;
pub use approval::ApprovalService;
pub use auth::AuthService;
pub use dao::*;
pub use error::{ServiceError, ServiceResult};
pub use inventory::InventoryService;
pub use notify::Notifier;
pub use redemption::RedemptionEngine;
pub use reporting::ReportingService;
