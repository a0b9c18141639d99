use crate::{
    AppState,
    db::UserExt,
    dtos::{FormResponseDto, LoginQueryDto, LoginUserDto, RegisterUserDto, Response},
    error::{ErrorMessage, HttpError},
    middleware::{RequestContext, SESSION_COOKIE},
    models::UserRole,
    utils::{password, token},
};
use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::WithRejection;
use tracing::instrument;
use validator::Validate;

/// Router for account endpoints
pub fn auth_handler() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

/// Only same-site absolute paths are followed after login
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

pub async fn register_form(
    Extension(context): Extension<RequestContext>,
) -> axum::response::Response {
    if context.user.is_some() {
        return Redirect::to("/").into_response();
    }

    Json(FormResponseDto {
        status: "success",
        title: "Register",
        fields: vec!["username", "password", "confirmPassword"],
    })
    .into_response()
}

/// Create a regular (non-admin) account
#[instrument(skip(app_state, context, body), fields(username = %body.username))]
pub async fn register(
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterUserDto>, HttpError>,
) -> Result<axum::response::Response, HttpError> {
    if context.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    body.validate().map_err(|e| {
        tracing::error!("Invalid register input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let hash_password = password::hash(&body.password).map_err(|e| {
        tracing::error!("Password hashing error: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let result = app_state
        .db_client
        .save_user(&body.username, &hash_password, UserRole::User, None)
        .await;

    match result {
        Ok(_user) => {
            tracing::info!("Register Successful");
            Ok((
                StatusCode::CREATED,
                Json(Response {
                    status: "success",
                    message: "Your account has been created! You are now able to log in"
                        .to_string(),
                }),
            )
                .into_response())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::warn!("Username already taken");
            Err(HttpError::unique_constraint_violation(
                ErrorMessage::UsernameTaken.to_string(),
            ))
        }
        Err(e) => {
            tracing::error!("DB error, saving user: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

pub async fn login_form(
    Extension(context): Extension<RequestContext>,
) -> axum::response::Response {
    if context.user.is_some() {
        return Redirect::to("/").into_response();
    }

    Json(FormResponseDto {
        status: "success",
        title: "Login",
        fields: vec!["username", "password"],
    })
    .into_response()
}

/// Check credentials, set the session cookie and go to `?next=` (or home)
#[instrument(skip(app_state, context, cookie_jar, body), fields(username = %body.username))]
pub async fn login(
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    WithRejection(Query(query), _): WithRejection<Query<LoginQueryDto>, HttpError>,
    cookie_jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<LoginUserDto>, HttpError>,
) -> Result<axum::response::Response, HttpError> {
    if context.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    body.validate().map_err(|e| {
        tracing::error!("Invalid login input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let login_failed = || HttpError::unauthorized(ErrorMessage::LoginFailed.to_string());

    let user = app_state
        .db_client
        .get_user(None, Some(&body.username))
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| {
            tracing::warn!("Login for unknown user");
            login_failed()
        })?;

    let password_matched = password::compare(&body.password, &user.password).map_err(|e| {
        tracing::warn!("Password error: {}", e);
        login_failed()
    })?;

    if !password_matched {
        tracing::warn!("Wrong password");
        return Err(login_failed());
    }

    let access_token = token::create_token(
        user.id,
        app_state.env.secret_key.as_bytes(),
        app_state.env.session_maxage,
    )
    .map_err(|e| {
        tracing::error!("Session token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let session_cookie = Cookie::build((SESSION_COOKIE, access_token))
        .path("/")
        .http_only(true)
        .secure(!cfg!(debug_assertions))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(app_state.env.session_maxage))
        .build();

    let target = safe_next(query.next.as_deref()).to_string();
    tracing::info!(next = %target, "Login Successful");

    Ok((cookie_jar.add(session_cookie), Redirect::to(&target)).into_response())
}

/// Drop the session cookie and go home
pub async fn logout(cookie_jar: CookieJar) -> impl IntoResponse {
    let cookie_jar = cookie_jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (cookie_jar, Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/item/3")), "/item/3");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
