//! Caller identity passed explicitly into every service call.

use taisen_common::{AppError, AppResult};
use uuid::Uuid;

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Identity-provider user ID.
    pub user_id: Uuid,
    /// Whether the caller may review fighter requests.
    pub is_admin: bool,
}

/// The session a request runs under. Anonymous when no identity is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    /// A session with no identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { identity: None }
    }

    /// A signed-in, non-admin user.
    #[must_use]
    pub const fn user(user_id: Uuid) -> Self {
        Self {
            identity: Some(Identity {
                user_id,
                is_admin: false,
            }),
        }
    }

    /// A signed-in administrator.
    #[must_use]
    pub const fn admin(user_id: Uuid) -> Self {
        Self {
            identity: Some(Identity {
                user_id,
                is_admin: true,
            }),
        }
    }

    /// The attached identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<Identity> {
        self.identity
    }

    /// The caller's user ID, if signed in.
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        self.identity.map(|i| i.user_id)
    }

    /// The caller's user ID, or [`AppError::Unauthorized`].
    pub fn require_user(&self) -> AppResult<Uuid> {
        self.user_id().ok_or(AppError::Unauthorized)
    }

    /// The caller's user ID if they are an administrator.
    ///
    /// Anonymous callers get [`AppError::Unauthorized`], signed-in
    /// non-admins get [`AppError::Forbidden`].
    pub fn require_admin(&self) -> AppResult<Uuid> {
        match self.identity {
            None => Err(AppError::Unauthorized),
            Some(Identity {
                is_admin: false, ..
            }) => Err(AppError::Forbidden("Administrator only".to_string())),
            Some(Identity { user_id, .. }) => Ok(user_id),
        }
    }
}

impl From<Identity> for Session {
    fn from(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_is_rejected() {
        let session = Session::anonymous();
        assert!(matches!(session.require_user(), Err(AppError::Unauthorized)));
        assert!(matches!(session.require_admin(), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_user_is_not_admin() {
        let id = Uuid::new_v4();
        let session = Session::user(id);
        assert_eq!(session.require_user().unwrap(), id);
        assert!(matches!(session.require_admin(), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_admin() {
        let id = Uuid::new_v4();
        assert_eq!(Session::admin(id).require_admin().unwrap(), id);
    }
}
