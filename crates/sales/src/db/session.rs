//! Session identity binding for row-level security.
//!
//! The identity is a session-level setting on the connection. Pooled
//! connections keep whatever the previous caller bound, so the identity is
//! bound again on every checkout, on the same connection, before the query.

use sqlx::PgConnection;
use tracing::instrument;

use zava_core::RlsUserId;

use crate::error::SalesError;

/// Bind `identity` into the session of `conn`.
///
/// Runs `set_config('app.current_rls_user_id', identity, false)`. The empty
/// identity is bound like any other value; it is never skipped.
///
/// # Errors
///
/// Returns `SalesError::IdentityBind` if the store rejects the call.
#[instrument(skip_all, fields(manager = identity.is_manager()))]
pub async fn bind_identity(conn: &mut PgConnection, identity: &RlsUserId) -> Result<(), SalesError> {
    sqlx::query("SELECT set_config($1, $2, false)")
        .bind(RlsUserId::SETTING_NAME)
        .bind(identity)
        .execute(conn)
        .await
        .map_err(SalesError::IdentityBind)?;

    Ok(())
}

/// Read back the identity currently bound on `conn`.
///
/// Returns `None` if the setting has never been set on this session.
///
/// # Errors
///
/// Returns `SalesError::QueryExecution` if the query fails.
pub async fn current_identity(conn: &mut PgConnection) -> Result<Option<RlsUserId>, SalesError> {
    sqlx::query_scalar::<_, Option<RlsUserId>>("SELECT current_setting($1, true)")
        .bind(RlsUserId::SETTING_NAME)
        .fetch_one(conn)
        .await
        .map_err(SalesError::QueryExecution)
}
