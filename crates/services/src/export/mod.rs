pub mod excel;

pub use excel::export_redemptions;
