use crate::{
    AppState,
    db::{ReviewExt, UserExt},
    dtos::{
        FilterUserDto, ProfileFormResponseDto, UpdateProfileDto, UserProfileResponseDto,
        UserResponseDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{RequestContext, login_required},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::WithRejection;
use tracing::instrument;
use validator::Validate;

/// Router for profiles
///
/// `/user/{username}` is public; the own-profile routes need a login.
pub fn profile_handler() -> Router<AppState> {
    let own_profile = Router::new()
        .route("/profile", get(my_profile))
        .route("/profile/edit", get(edit_profile_form).post(edit_profile))
        .route_layer(middleware::from_fn(login_required));

    Router::new()
        .route("/user/{username}", get(user_profile))
        .merge(own_profile)
}

pub async fn my_profile(
    Extension(context): Extension<RequestContext>,
) -> Result<Redirect, HttpError> {
    let user = context.require_user("/profile")?;
    Ok(Redirect::to(&format!("/user/{}", user.username)))
}

pub async fn edit_profile_form(
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, HttpError> {
    let user = context.require_user("/profile/edit")?;

    Ok(Json(ProfileFormResponseDto {
        status: "success",
        data: UpdateProfileDto {
            username: user.username.clone(),
            bio: user.bio.clone(),
        },
    }))
}

/// Change the own username and bio; an empty bio clears it
#[instrument(skip(app_state, context, body))]
pub async fn edit_profile(
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateProfileDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    let user = context.require_user("/profile/edit")?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid profile input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let bio = body
        .bio
        .as_deref()
        .map(str::trim)
        .filter(|bio| !bio.is_empty());

    let result = app_state
        .db_client
        .update_profile(user.id, &body.username, bio)
        .await;

    match result {
        Ok(updated) => {
            tracing::info!(old = %user.username, new = %updated.username, "Profile updated");
            Ok((
                StatusCode::OK,
                Json(UserResponseDto {
                    status: "success",
                    message: "Your account has been updated!".to_string(),
                    data: FilterUserDto::filter_user(&updated),
                }),
            ))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            HttpError::unique_constraint_violation(ErrorMessage::UsernameTaken.to_string()),
        ),
        Err(e) => {
            tracing::error!("DB error, updating profile: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

/// Public profile with the user's reviews, newest first
#[instrument(skip(app_state))]
pub async fn user_profile(
    WithRejection(Path(username), _): WithRejection<Path<String>, HttpError>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let db_error = |e: sqlx::Error| {
        tracing::error!("DB error, loading profile: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    };

    let user = app_state
        .db_client
        .get_user(None, Some(&username))
        .await
        .map_err(db_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::UserNotFound.to_string()))?;

    let reviews = app_state
        .db_client
        .get_user_reviews(user.id)
        .await
        .map_err(db_error)?;

    Ok(Json(UserProfileResponseDto {
        status: "success",
        user: FilterUserDto::filter_user(&user),
        reviews,
    }))
}
