use heroes_core::RecordId;

/// Identity of the caller, attached by the auth middleware once the token's
/// username has been matched against the users store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    id: RecordId,
    username: String,
}

impl AuthenticatedUser {
    pub fn new(id: RecordId, username: String) -> Self {
        Self { id, username }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_store_id_and_username() {
        let user = AuthenticatedUser::new(RecordId::from(7), "xuxadasilva".to_string());
        assert_eq!(user.id().as_str(), "7");
        assert_eq!(user.username(), "xuxadasilva");
    }
}
