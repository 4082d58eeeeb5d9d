pub mod actions;
pub mod analysis;
pub mod models;
pub mod session;
