use serde::Deserialize;

use heroes_core::{DomainError, DomainResult, Hero, HeroPatch, validate_name_filter};
use heroes_infra::Page;

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
/// Stores take signed 64-bit offsets.
pub const MAX_SKIP: u64 = i64::MAX as u64;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListHeroesQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub nome: Option<String>,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl ListHeroesQuery {
    /// `skip` in `0..=MAX_SKIP`, `limit` in `1..=MAX_LIMIT`.
    pub fn page(&self) -> DomainResult<Page> {
        if self.skip > MAX_SKIP {
            return Err(DomainError::validation(format!(
                "skip must be at most {MAX_SKIP}"
            )));
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Page::new(self.skip, self.limit))
    }

    /// The `nome` search term, if any, checked against the name bounds.
    pub fn name_filter(&self) -> DomainResult<Option<&str>> {
        match self.nome.as_deref() {
            Some(term) => {
                validate_name_filter(term)?;
                Ok(Some(term))
            }
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateHeroRequest {
    pub nome: String,
    pub poder: String,
}

impl CreateHeroRequest {
    pub fn into_hero(self) -> DomainResult<Hero> {
        Hero::new(self.nome, self.poder)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateHeroRequest {
    pub nome: Option<String>,
    pub poder: Option<String>,
}

impl UpdateHeroRequest {
    pub fn into_patch(self) -> DomainResult<HeroPatch> {
        let patch = HeroPatch {
            name: self.nome,
            power: self.poder,
        };
        patch.validate()?;
        Ok(patch)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults() {
        let q: ListHeroesQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.skip, 0);
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.name_filter().unwrap(), None);
        assert_eq!(q.page().unwrap(), Page::new(0, DEFAULT_LIMIT));
    }

    #[test]
    fn page_bounds_are_enforced() {
        let page = |skip: u64, limit: u64| ListHeroesQuery { skip, limit, nome: None }.page();
        assert!(page(MAX_SKIP, MAX_LIMIT).is_ok());
        assert!(page(u64::MAX, 10).is_err());
        assert!(page(MAX_SKIP + 1, 10).is_err());
        assert!(page(0, 0).is_err());
        assert!(page(0, MAX_LIMIT + 1).is_err());
    }

    #[test]
    fn short_search_term_is_rejected() {
        let q: ListHeroesQuery = serde_json::from_str(r#"{"nome":"Ba"}"#).unwrap();
        assert!(q.name_filter().is_err());
    }

    #[test]
    fn unknown_body_fields_are_rejected() {
        let res: Result<CreateHeroRequest, _> =
            serde_json::from_str(r#"{"nome":"Flash","poder":"Velocidade","idade":30}"#);
        assert!(res.is_err());
    }

    #[test]
    fn empty_update_is_rejected() {
        let req: UpdateHeroRequest = serde_json::from_str("{}").unwrap();
        assert!(req.into_patch().is_err());
    }
}
