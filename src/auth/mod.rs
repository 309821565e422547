//! Authentication and authorization primitives.
//!
//! [`authenticate`] turns credentials into a [`Principal`]; the
//! [`SessionStore`] keeps resolved principals alive between requests;
//! the [`Authority`] set on a principal is what endpoint policy checks
//! against. Authorization is flat membership: holding ROLE_ADMIN says
//! nothing about ROLE_USER.

pub mod password;
pub mod session;

pub use session::{spawn_sweeper, Session, SessionError, SessionStore};

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::warn;

use crate::db::User;

/// A granted authority, the unit of authorization policy. Derived
/// one-to-one from role names (USER becomes ROLE_USER).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authority {
    User,
    Professional,
    Admin,
}

impl Authority {
    /// Wire form, e.g. `ROLE_USER`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Authority::User => "ROLE_USER",
            Authority::Professional => "ROLE_PROFESSIONAL",
            Authority::Admin => "ROLE_ADMIN",
        }
    }

    /// The stored role name this authority is derived from.
    pub fn role_name(&self) -> &'static str {
        match self {
            Authority::User => "USER",
            Authority::Professional => "PROFESSIONAL",
            Authority::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Authority {
    type Err = String;

    /// Accepts role names with or without the ROLE_ prefix, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match name {
            "USER" => Ok(Authority::User),
            "PROFESSIONAL" => Ok(Authority::Professional),
            "ADMIN" => Ok(Authority::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// The authenticated caller, resolved once per request and passed as an
/// explicit argument to whatever needs it. There is no ambient
/// "current user".
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub authorities: Vec<Authority>,
}

impl Principal {
    /// Exact membership check; there is no hierarchy between
    /// authorities.
    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }

    /// Wire forms of the granted authorities, for responses.
    pub fn authority_strings(&self) -> Vec<String> {
        self.authorities.iter().map(|a| a.as_str().to_string()).collect()
    }
}

/// Why an authentication attempt failed. Clients always see
/// [`AuthError::GENERIC_MESSAGE`]; the variants are for server logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown username")]
    UnknownUser,
    #[error("wrong password")]
    BadCredentials,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl AuthError {
    /// Single client-facing failure message; wrong-password and
    /// unknown-username are indistinguishable to callers.
    pub const GENERIC_MESSAGE: &'static str = "Authentication failed";
}

/// Validate credentials against the user store and build the caller's
/// principal with its flattened authority set. Never mutates anything.
pub async fn authenticate(
    db: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Principal, AuthError> {
    let user = User::find_by_username(db, username)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    if !password::verify_password(password, &user.password_hash) {
        return Err(AuthError::BadCredentials);
    }

    let role_names = User::load_role_names(db, user.id).await?;
    let authorities = role_names
        .iter()
        .filter_map(|name| match name.parse::<Authority>() {
            Ok(authority) => Some(authority),
            Err(e) => {
                warn!("Skipping unmappable role for {}: {}", user.username, e);
                None
            }
        })
        .collect();

    Ok(Principal {
        user_id: user.id,
        username: user.username,
        authorities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewUser, Role};
    use crate::db::test_pool;

    async fn register_user(db: &SqlitePool, username: &str, password: &str, role: &str) {
        let role_id = Role::find_by_name(db, role).await.unwrap().unwrap().id;
        let hash = password::hash_password(password).unwrap();
        User::register(
            db,
            NewUser {
                username,
                password_hash: &hash,
                email: "user@example.com",
                address: "4 Test Street",
                pincode: 560001,
                role_id,
                service_ids: &[],
            },
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_authority_parses_role_names_in_any_form() {
        assert_eq!("USER".parse::<Authority>(), Ok(Authority::User));
        assert_eq!("role_admin".parse::<Authority>(), Ok(Authority::Admin));
        assert_eq!("ROLE_PROFESSIONAL".parse::<Authority>(), Ok(Authority::Professional));
        assert_eq!("professional".parse::<Authority>(), Ok(Authority::Professional));
        assert!("SUPERVISOR".parse::<Authority>().is_err());
    }

    #[test]
    fn test_authority_wire_forms() {
        assert_eq!(Authority::User.as_str(), "ROLE_USER");
        assert_eq!(Authority::Professional.role_name(), "PROFESSIONAL");
        assert_eq!(Authority::Admin.to_string(), "ROLE_ADMIN");
    }

    #[test]
    fn test_membership_is_flat() {
        let principal = Principal {
            user_id: 1,
            username: "root".to_string(),
            authorities: vec![Authority::Admin],
        };

        assert!(principal.has_authority(Authority::Admin));
        // ADMIN does not imply USER
        assert!(!principal.has_authority(Authority::User));
        assert_eq!(principal.authority_strings(), vec!["ROLE_ADMIN"]);
    }

    #[tokio::test]
    async fn test_authenticate_returns_flattened_authorities() {
        let db = test_pool().await;
        register_user(&db, "alice", "Passw0rd!", "USER").await;

        let principal = authenticate(&db, "alice", "Passw0rd!").await.unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.authorities, vec![Authority::User]);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_distinct_internally() {
        let db = test_pool().await;
        register_user(&db, "bob", "Passw0rd!", "USER").await;

        let wrong = authenticate(&db, "bob", "nope").await.unwrap_err();
        assert!(matches!(wrong, AuthError::BadCredentials));

        let unknown = authenticate(&db, "nobody", "nope").await.unwrap_err();
        assert!(matches!(unknown, AuthError::UnknownUser));
    }
}
