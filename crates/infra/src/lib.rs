//! Infrastructure layer: store adapters, the CRUD context, configuration.

pub mod config;
pub mod crud;
pub mod schemas;

pub use config::{AppConfig, ConfigError, Profile};
pub use crud::{Context, Crud, CrudError, Filter, MutationOutcome, Page, Stored};
