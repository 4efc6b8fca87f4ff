//! Session-cookie extractor resolving the current user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use crate::db::User;
use crate::error::AppError;
use crate::handlers::http::AppState;

/// Name of the session cookie issued on login.
pub const SESSION_COOKIE: &str = "session_id";

/// Extractor: the user matching the request's session cookie. A missing
/// cookie and a stale one are rejected identically (403).
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

        let user = state
            .auth()
            .get_user_from_session_id(session_id.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;
        Ok(CurrentUser(user))
    }
}
