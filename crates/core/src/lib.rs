//! `heroes-core`: domain records and input rules.
//!
//! This crate contains **pure domain** types (no storage or HTTP concerns).

pub mod error;
pub mod hero;
pub mod id;
pub mod record;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use hero::{Hero, HeroPatch, validate_name_filter};
pub use id::RecordId;
pub use record::Record;
pub use user::{User, UserPatch, normalize_username};
