//! Hero record and its input rules.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::record::Record;

pub const NAME_MIN: usize = 3;
pub const NAME_MAX: usize = 100;
pub const POWER_MIN: usize = 2;
pub const POWER_MAX: usize = 30;

/// A hero as stored in the document store.
///
/// Wire and storage field names are `nome` / `poder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    #[serde(rename = "nome")]
    pub name: String,

    #[serde(rename = "poder")]
    pub power: String,
}

impl Hero {
    /// Build a hero, enforcing the length bounds on both fields.
    pub fn new(name: impl Into<String>, power: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let power = power.into();
        validate_name(&name)?;
        validate_power(&power)?;
        Ok(Self { name, power })
    }
}

/// Partial hero update; absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroPatch {
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "poder", default, skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
}

impl HeroPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.power.is_none()
    }

    /// Validate supplied fields; an empty patch is rejected.
    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation(
                "at least one of nome, poder must be supplied",
            ));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(power) = &self.power {
            validate_power(power)?;
        }
        Ok(())
    }
}

impl Record for Hero {
    type Patch = HeroPatch;
}

pub fn validate_name(name: &str) -> DomainResult<()> {
    check_len("nome", name, NAME_MIN, NAME_MAX)
}

pub fn validate_power(power: &str) -> DomainResult<()> {
    check_len("poder", power, POWER_MIN, POWER_MAX)
}

/// Free-text search on `nome` shares the name bounds.
pub fn validate_name_filter(term: &str) -> DomainResult<()> {
    validate_name(term)
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::validation(format!(
            "{field} must be between {min} and {max} characters (got {len})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn serializes_with_wire_names() {
        let hero = Hero::new("Batman", "Dinheiro").unwrap();
        let json = serde_json::to_value(&hero).unwrap();
        assert_eq!(json, serde_json::json!({"nome": "Batman", "poder": "Dinheiro"}));
    }

    #[test]
    fn patch_serializes_only_supplied_fields() {
        let patch = HeroPatch {
            name: None,
            power: Some("Voar".into()),
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"poder": "Voar"}));
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(matches!(
            HeroPatch::default().validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn bounds_count_characters_not_bytes() {
        // 3 chars, 6 bytes
        assert!(validate_name("ÁÉÍ").is_ok());
        assert!(validate_power("ç").is_err());
    }

    proptest! {
        #[test]
        fn name_accepted_iff_within_bounds(name in "[a-zA-Z ]{0,120}") {
            let len = name.chars().count();
            let ok = (NAME_MIN..=NAME_MAX).contains(&len);
            prop_assert_eq!(validate_name(&name).is_ok(), ok);
        }

        #[test]
        fn power_accepted_iff_within_bounds(power in "[a-z]{0,40}") {
            let len = power.chars().count();
            let ok = (POWER_MIN..=POWER_MAX).contains(&len);
            prop_assert_eq!(Hero::new("Valid", power).is_ok(), ok);
        }
    }
}
