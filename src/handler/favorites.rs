use crate::{
    AppState,
    db::{FavoriteExt, ItemExt},
    dtos::{ItemListResponseDto, Response},
    error::{ErrorMessage, HttpError},
    middleware::{RequestContext, login_required},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use tracing::instrument;

/// Router for a user's favorite items; every route needs a login
pub fn favorites_handler() -> Router<AppState> {
    Router::new()
        .route("/favorite/{item_id}", post(add_favorite))
        .route("/unfavorite/{item_id}", post(remove_favorite))
        .route("/favorites", get(list_favorites))
        .route_layer(middleware::from_fn(login_required))
}

fn db_error(e: sqlx::Error) -> HttpError {
    tracing::error!("DB error, updating favorites: {}", e);
    HttpError::server_error(ErrorMessage::ServerError.to_string())
}

#[instrument(skip(app_state, context))]
pub async fn add_favorite(
    WithRejection(Path(item_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, HttpError> {
    let user = context.require_user(&format!("/item/{}", item_id))?;

    let item = app_state
        .db_client
        .get_item(item_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ItemNotFound.to_string()))?;

    let added = app_state
        .db_client
        .add_favorite(user.id, item_id)
        .await
        .map_err(db_error)?;

    let message = if added {
        format!("{} added to your favorites!", item.item.name)
    } else {
        format!("{} is already in your favorites.", item.item.name)
    };

    Ok(Json(Response {
        status: "success",
        message,
    }))
}

#[instrument(skip(app_state, context))]
pub async fn remove_favorite(
    WithRejection(Path(item_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, HttpError> {
    let user = context.require_user(&format!("/item/{}", item_id))?;

    let item = app_state
        .db_client
        .get_item(item_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ItemNotFound.to_string()))?;

    let removed = app_state
        .db_client
        .remove_favorite(user.id, item_id)
        .await
        .map_err(db_error)?;

    let message = if removed {
        format!("{} removed from your favorites.", item.item.name)
    } else {
        format!("{} was not in your favorites.", item.item.name)
    };

    Ok(Json(Response {
        status: "success",
        message,
    }))
}

#[instrument(skip(app_state, context))]
pub async fn list_favorites(
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, HttpError> {
    let user = context.require_user("/favorites")?;

    let favorites = app_state
        .db_client
        .get_favorites(user.id)
        .await
        .map_err(db_error)?;

    Ok(Json(ItemListResponseDto {
        status: "success",
        data: favorites,
    }))
}
