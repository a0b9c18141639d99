use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    db::UserExt,
    error::{ErrorMessage, HttpError},
    models::User,
    utils::token,
};

/// Name of the cookie holding the signed session token
pub const SESSION_COOKIE: &str = "access_token";

/// Per-request context handed to every handler
///
/// Built once per request by [`load_context`] from the session cookie.
/// `user` is `None` for anonymous visitors, and also when the cookie is missing,
/// invalid, expired, or points at a deleted account.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<User>,
}

impl RequestContext {
    /// The logged-in user, or a redirect to the login page that returns to `next`
    pub fn require_user(&self, next: &str) -> Result<&User, HttpError> {
        self.require_user_with(next, ErrorMessage::LoginRequired)
    }

    pub fn require_user_with(&self, next: &str, message: ErrorMessage) -> Result<&User, HttpError> {
        self.user
            .as_ref()
            .ok_or_else(|| HttpError::redirect(message.to_string(), login_url(next)))
    }
}

/// Login page URL that sends the user back to `next` afterwards
pub fn login_url(next: &str) -> String {
    format!("/login?next={}", next)
}

/// Resolve the session cookie into a [`RequestContext`]
///
/// Applied to the whole router. Never rejects a request: an unusable token just
/// means an anonymous context.
pub async fn load_context(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut context = RequestContext::default();

    // Steps:
    // 1. No cookie → anonymous.
    // 2. Signature or expiry check fails → anonymous (logged at DEBUG only, a
    //    stale cookie in a browser is normal).
    // 3. Token is valid but the user row is gone (deleted by an admin) → anonymous.
    // 4. Database error → anonymous as well, logged as an error; guarded routes
    //    then redirect to login instead of the whole site failing.
    // The guards below (`login_required`, `admin_only`) only ever read the
    // context, so the database is hit at most once per request for the session.
    if let Some(cookie) = cookie_jar.get(SESSION_COOKIE) {
        match token::decode_token(cookie.value(), app_state.env.secret_key.as_bytes()) {
            Ok(user_id) => match app_state.db_client.get_user(Some(user_id), None).await {
                Ok(user) => context.user = user,
                Err(e) => tracing::error!("DB error, loading session user: {}", e),
            },
            Err(_) => tracing::debug!("Ignoring invalid session token"),
        }
    }

    req.extensions_mut().insert(context);
    next.run(req).await
}

/// Only let logged-in users through; others go to the login page
pub async fn login_required(
    Extension(context): Extension<RequestContext>,
    req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    context.require_user(req.uri().path())?;
    Ok(next.run(req).await)
}

/// Only let admins through; anonymous users go to login, others back home
///
/// Stack it inside `login_required` or use it alone: both cases redirect.
pub async fn admin_only(
    Extension(context): Extension<RequestContext>,
    req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let message = if req.method() == axum::http::Method::GET {
        ErrorMessage::PermissionDenied
    } else {
        ErrorMessage::ActionDenied
    };

    let user = context.require_user(req.uri().path())?;
    if !user.is_admin() {
        tracing::warn!(username = %user.username, path = %req.uri().path(), "Non-admin blocked");
        return Err(HttpError::redirect(message.to_string(), "/"));
    }

    Ok(next.run(req).await)
}
