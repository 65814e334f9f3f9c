//! Actix-web extractor for the authenticated caller.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use uuid::Uuid;

use super::SessionKey;
use super::token::verify_token;
use crate::error::{AppError, AppResult};
use crate::models::UserRole;

/// Caller identity taken from the `Authorization: Bearer <token>` header.
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> AppResult<HttpResponse> {
///     user.require_writer()?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl CurrentUser {
    /// Fail with Forbidden unless the caller may write.
    pub fn require_writer(&self) -> AppResult<()> {
        if !self.role.can_write() {
            return Err(AppError::Forbidden(format!(
                "{} role cannot modify data",
                self.role
            )));
        }
        Ok(())
    }

    /// Fail with Forbidden unless the caller is an admin.
    pub fn require_admin(&self) -> AppResult<()> {
        if !self.role.is_admin() {
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(())
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> AppResult<CurrentUser> {
    let key = req
        .app_data::<web::Data<SessionKey>>()
        .ok_or_else(|| AppError::Unauthorized("Internal configuration error".to_string()))?;

    let token = bearer_token(req).ok_or_else(|| {
        AppError::Unauthorized("Missing bearer token. Provide Authorization header.".to_string())
    })?;

    let claims = verify_token(token, key.get_ref()).map_err(AppError::Unauthorized)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid subject in session token".to_string()))?;

    Ok(CurrentUser {
        user_id,
        role: claims.role,
    })
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
