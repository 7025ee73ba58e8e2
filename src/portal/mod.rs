pub mod commands;
pub mod controller;
pub mod state;

pub use controller::PortalController;
pub use state::{FilterState, PortalSnapshot, PortalState};
