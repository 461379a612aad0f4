pub mod adapters;
#[cfg(feature = "server")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{Cli, Command};
pub use config::ImportConfig;

pub use core::factory::{ImportFactory, ImportFormat, SourceOptions, SourceSpec};
pub use core::import::{import_entity, ImportOutcome};
pub use core::processor::{DataProcessor, ImportState};
pub use domain::model::{Car, Domain, DomainModel, Entity, Liability, Record};
pub use utils::error::{ImportError, Result};
