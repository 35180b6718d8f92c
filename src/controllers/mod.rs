pub mod predict;
pub mod reload;
pub mod status;
