//! Infrastructure layer: stores, stock reservation, order intake, config.

pub mod catalog;
pub mod config;
pub mod error;
pub mod intake;
pub mod inventory;
pub mod store;


pub use catalog::CatalogService;
pub use config::{AppConfig, ConfigError};
pub use error::{ServiceError, ServiceResult};
pub use intake::{OrderIntake, Submission};
pub use inventory::{InventoryAdjuster, Reservation};
