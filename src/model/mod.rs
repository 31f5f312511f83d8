pub mod claim;
pub mod config;
pub mod stac;

pub use claim::*;
pub use config::{year_window, Config};
