//! Domain types for identity and access control with strong typing.
//!
//! Roles and audit actions are closed sets persisted as short string codes;
//! `Access` describes what a protected operation requires of its caller.

pub mod notices;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a User in the system.
///
/// This newtype wrapper keeps user ids from being mixed up with other
/// numeric ids (session rows, linked staff profiles).
///
/// # Examples
///
/// ```rust
/// use clinicdesk::domain::UserId;
///
/// let id = UserId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserId(i32);

impl UserId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "UserId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Canonical form of a login email: trimmed and lower-cased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Staff role. Every account has exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    #[serde(rename = "admin")]
    Administrator,

    #[sea_orm(string_value = "physician")]
    #[serde(rename = "physician")]
    Physician,

    #[sea_orm(string_value = "front_desk")]
    #[serde(rename = "front_desk")]
    FrontDesk,

    /// Unattended waiting-room display.
    #[sea_orm(string_value = "tv")]
    #[serde(rename = "tv")]
    TvPanel,
}

impl Role {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Administrator => "admin",
            Self::Physician => "physician",
            Self::FrontDesk => "front_desk",
            Self::TvPanel => "tv",
        }
    }

    /// Where a freshly logged-in user of this role is sent.
    #[must_use]
    pub const fn landing_route(self) -> &'static str {
        match self {
            Self::Administrator | Self::TvPanel => routes::DASHBOARD,
            Self::Physician => routes::PHYSICIAN_DASHBOARD,
            Self::FrontDesk => routes::SCHEDULING,
        }
    }

    /// Only TV-panel accounts carry a TV access token.
    #[must_use]
    pub const fn uses_tv_token(self) -> bool {
        matches!(self, Self::TvPanel)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Self::Administrator),
            "physician" => Ok(Self::Physician),
            "front_desk" => Ok(Self::FrontDesk),
            "tv" => Ok(Self::TvPanel),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Capability a protected operation demands of the resolved user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any user with a valid session, TV panel included.
    Authenticated,
    /// Everyday clinic operations: everyone except the TV panel.
    Staff,
    /// Physician or administrator.
    Clinical,
    AdminOnly,
}

impl Access {
    #[must_use]
    pub const fn permits(self, role: Role) -> bool {
        match self {
            Self::Authenticated => true,
            Self::Staff => matches!(
                role,
                Role::Administrator | Role::Physician | Role::FrontDesk
            ),
            Self::Clinical => matches!(role, Role::Administrator | Role::Physician),
            Self::AdminOnly => matches!(role, Role::Administrator),
        }
    }
}

/// Audit trail action kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    #[sea_orm(string_value = "login")]
    Login,

    #[sea_orm(string_value = "logout")]
    Logout,

    #[sea_orm(string_value = "password_changed")]
    PasswordChanged,

    #[sea_orm(string_value = "access_denied")]
    AccessDenied,

    #[sea_orm(string_value = "tv_token_regenerated")]
    TvTokenRegenerated,
}

/// Route table shared by redirects and the router.
pub mod routes {
    pub const LOGIN: &str = "/auth/login";
    pub const PROFILE: &str = "/auth/profile";
    pub const DASHBOARD: &str = "/";
    pub const PHYSICIAN_DASHBOARD: &str = "/physician/dashboard";
    pub const SCHEDULING: &str = "/scheduling/appointments";
    pub const TV_PANEL: &str = "/panel/tv";
    pub const ADMIN_USERS: &str = "/admin/users";
    pub const ADMIN_TV_TOKEN: &str = "/admin/tv-token";
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn user_id_conversions() {
        let id = UserId::new(7);
        assert_eq!(id.value(), 7);
        assert_eq!(i32::from(id), 7);
        assert_eq!(UserId::from(7), id);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        assert_eq!(Some(id).map(UserId::value), Some(7));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Admin@Clinic.Local "), "admin@clinic.local");
        assert_eq!(normalize_email(""), "");
    }

    #[test]
    fn role_codes_round_trip() {
        for role in Role::iter() {
            assert_eq!(role.code().parse::<Role>().unwrap(), role);
            assert_eq!(
                serde_json::to_string(&role).unwrap(),
                format!("\"{}\"", role.code())
            );
        }
        assert!("medico".parse::<Role>().is_err());
    }

    #[test]
    fn landing_routes() {
        assert_eq!(Role::Administrator.landing_route(), routes::DASHBOARD);
        assert_eq!(Role::Physician.landing_route(), routes::PHYSICIAN_DASHBOARD);
        assert_eq!(Role::FrontDesk.landing_route(), routes::SCHEDULING);
        assert_eq!(Role::TvPanel.landing_route(), routes::DASHBOARD);
    }

    #[test]
    fn access_matrix() {
        for role in Role::iter() {
            assert!(Access::Authenticated.permits(role));
        }

        assert!(Access::AdminOnly.permits(Role::Administrator));
        assert!(!Access::AdminOnly.permits(Role::Physician));
        assert!(!Access::AdminOnly.permits(Role::FrontDesk));
        assert!(!Access::AdminOnly.permits(Role::TvPanel));

        assert!(Access::Clinical.permits(Role::Physician));
        assert!(Access::Clinical.permits(Role::Administrator));
        assert!(!Access::Clinical.permits(Role::FrontDesk));

        assert!(Access::Staff.permits(Role::FrontDesk));
        assert!(!Access::Staff.permits(Role::TvPanel));
    }

    #[test]
    fn only_tv_role_uses_token() {
        let with_token: Vec<Role> = Role::iter().filter(|r| r.uses_tv_token()).collect();
        assert_eq!(with_token, vec![Role::TvPanel]);
    }
}
