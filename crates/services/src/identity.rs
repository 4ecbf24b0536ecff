use quiz_core::model::UserId;

/// The signed-in user as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: Option<String>,
}

/// Read-only source of the current user.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<CurrentUser>;
}

/// Fixed identity, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<CurrentUser>,
}

impl StaticIdentity {
    #[must_use]
    pub fn signed_in(id: UserId) -> Self {
        Self {
            user: Some(CurrentUser { id, name: None }),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        if let Some(user) = self.user.as_mut() {
            user.name = Some(name.into());
        }
        self
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<CurrentUser> {
        self.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_user() {
        assert!(StaticIdentity::anonymous().current_user().is_none());
        assert!(
            StaticIdentity::anonymous()
                .with_name("ghost")
                .current_user()
                .is_none()
        );
    }

    #[test]
    fn signed_in_user_keeps_name() {
        let user = StaticIdentity::signed_in(UserId::new("u1"))
            .with_name("Ada")
            .current_user()
            .unwrap();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.name.as_deref(), Some("Ada"));
    }
}
