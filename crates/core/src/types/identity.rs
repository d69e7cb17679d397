//! Row-level security identity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The identity bound into a connection's session before a query runs.
///
/// Row-level security policies on the `retail` schema read this value
/// through `current_setting('app.current_rls_user_id')`. The empty string is
/// the store manager identity, which the policies treat as unrestricted.
///
/// Identities are transient, per-call values. They are never cached against
/// a pooled connection; every search binds its own identity again.
///
/// ## Examples
///
/// ```
/// use zava_core::RlsUserId;
///
/// assert!(RlsUserId::manager().is_manager());
/// assert!(RlsUserId::from("").is_manager());
///
/// let store = RlsUserId::from("00000000-0000-0000-0000-000000000001");
/// assert!(!store.is_manager());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RlsUserId(String);

impl RlsUserId {
    /// Name of the server-side setting the row-level security policies read.
    pub const SETTING_NAME: &'static str = "app.current_rls_user_id";

    /// The unrestricted store manager identity.
    #[must_use]
    pub const fn manager() -> Self {
        Self(String::new())
    }

    /// Create an identity from any string. The empty string means manager.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns `true` for the unrestricted manager identity.
    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RlsUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_manager() {
            f.write_str("<manager>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for RlsUserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RlsUserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for RlsUserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for RlsUserId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RlsUserId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for RlsUserId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
