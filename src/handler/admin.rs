use crate::{
    AppState,
    db::{ItemExt, ReviewExt, UserExt},
    dtos::{
        AddItemDto, AdminDashboardResponseDto, DeleteResponseDto, FormResponseDto,
        ItemResponseDto, Response,
    },
    error::{ErrorMessage, HttpError},
    middleware::{RequestContext, admin_only},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use tracing::instrument;
use validator::Validate;

/// Router for moderation and menu management
///
/// Every route is behind `admin_only`: anonymous visitors are sent to the
/// login page, regular users back home.
pub fn admin_handler() -> Router<AppState> {
    Router::new()
        // GET /add_item - form description; POST /add_item - create a menu item
        .route("/add_item", get(add_item_form).post(add_item))
        // GET /admin - every review, newest first
        .route("/admin", get(dashboard))
        .route("/admin/delete_review/{review_id}", post(delete_review))
        .route("/admin/delete_item/{item_id}", post(delete_item))
        .route("/admin/delete_user/{user_id}", post(delete_user))
        .route_layer(middleware::from_fn(admin_only))
}

pub async fn add_item_form() -> impl IntoResponse {
    Json(FormResponseDto {
        status: "success",
        title: "Add New Menu Item",
        fields: vec!["name", "category", "description", "imageUrl"],
    })
}

#[instrument(skip(app_state, body), fields(name = %body.name))]
pub async fn add_item(
    State(app_state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<AddItemDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid item input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let name = body.name.trim();
    let category = body.category.trim();
    if name.is_empty() || category.is_empty() {
        return Err(HttpError::bad_request("Item name and category are required"));
    }

    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let image_url = body
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let result = app_state
        .db_client
        .create_item(name, category, description, image_url)
        .await;

    match result {
        Ok(item) => {
            tracing::info!(item_id = item.id, "Item added");
            Ok((
                StatusCode::CREATED,
                Json(ItemResponseDto {
                    status: "success",
                    message: format!("Item \"{}\" has been added!", item.name),
                    data: item,
                }),
            ))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            HttpError::unique_constraint_violation(ErrorMessage::ItemNameTaken.to_string()),
        ),
        Err(e) => {
            tracing::error!("DB error, adding item: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

#[instrument(skip(app_state))]
pub async fn dashboard(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state.db_client.get_all_reviews().await.map_err(|e| {
        tracing::error!("DB error, loading reviews: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    Ok(Json(AdminDashboardResponseDto {
        status: "success",
        reviews,
    }))
}

/// Remove a review; the item's statistics follow on the next read
#[instrument(skip(app_state, context))]
pub async fn delete_review(
    WithRejection(Path(review_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, HttpError> {
    let db_error = |e: sqlx::Error| {
        tracing::error!("DB error, deleting review: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    };

    let review = app_state
        .db_client
        .get_review(review_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ReviewNotFound.to_string()))?;

    match app_state.db_client.delete_review(review.id).await {
        Ok(()) => {}
        // Deleted concurrently by another admin
        Err(sqlx::Error::RowNotFound) => {
            return Err(HttpError::not_found(
                ErrorMessage::ReviewNotFound.to_string(),
            ));
        }
        Err(e) => return Err(db_error(e)),
    }

    tracing::info!(
        admin = context.user.as_ref().map(|u| u.username.as_str()).unwrap_or_default(),
        item_id = review.item_id,
        author_id = review.user_id,
        "Review deleted"
    );

    Ok(Json(Response {
        status: "success",
        message: "Review has been deleted.".to_string(),
    }))
}

/// Remove a menu item with its reviews and favorites
#[instrument(skip(app_state))]
pub async fn delete_item(
    WithRejection(Path(item_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    match app_state.db_client.delete_item(item_id).await {
        Ok(removed_reviews) => {
            tracing::info!(removed_reviews, "Item deleted");
            Ok(Json(DeleteResponseDto {
                status: "success",
                message: "Item has been deleted.".to_string(),
                removed_reviews,
            }))
        }
        Err(sqlx::Error::RowNotFound) => Err(HttpError::not_found(
            ErrorMessage::ItemNotFound.to_string(),
        )),
        Err(e) => {
            tracing::error!("DB error, deleting item: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

/// Remove an account with its reviews and favorites
///
/// Admins cannot delete their own account here.
#[instrument(skip(app_state, context))]
pub async fn delete_user(
    WithRejection(Path(user_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, HttpError> {
    if context.user.as_ref().is_some_and(|admin| admin.id == user_id) {
        return Err(HttpError::bad_request("You cannot delete your own account."));
    }

    match app_state.db_client.delete_user(user_id).await {
        Ok(removed_reviews) => {
            tracing::info!(removed_reviews, "User deleted");
            Ok(Json(DeleteResponseDto {
                status: "success",
                message: "User has been deleted.".to_string(),
                removed_reviews,
            }))
        }
        Err(sqlx::Error::RowNotFound) => Err(HttpError::not_found(
            ErrorMessage::UserNotFound.to_string(),
        )),
        Err(e) => {
            tracing::error!("DB error, deleting user: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}
