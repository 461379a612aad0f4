pub mod converter;
pub mod factory;
pub mod import;
pub mod processor;
pub mod validator;

pub use crate::domain::model::{DomainModel, Record};
pub use crate::domain::ports::{Converter, DataFactory, DataLoader, Validator};
pub use crate::utils::error::Result;
