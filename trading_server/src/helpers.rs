use actix_web::HttpRequest;
use log::debug;

use crate::errors::ServerError;

/// The authenticated user id for the request, taken from the `X-User-Id` header.
///
/// Authentication happens upstream of this server; a request reaching a `/api` route is trusted
/// to carry the id of a user that upstream has already verified.
pub fn authenticated_user(req: &HttpRequest) -> Result<String, ServerError> {
    let user_id = req
        .headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ServerError::MissingUserId)?;
    debug!("💻️ Request authenticated as {user_id}");
    Ok(user_id.to_string())
}
