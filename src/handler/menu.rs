use crate::{
    AppState,
    db::{FavoriteExt, ItemExt, ReviewExt},
    dtos::{
        InputReviewDto, ItemDetailResponseDto, MenuQueryDto, MenuResponseDto, PaginationDto,
        SingleReviewResponseDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::RequestContext,
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::WithRejection;
use tracing::instrument;
use validator::Validate;

pub const ITEMS_PER_PAGE: i64 = 6;

/// Router for browsing the menu and reviewing items
pub fn menu_handler() -> Router<AppState> {
    Router::new()
        // GET /menu?page=&q=&category= - paginated, searchable menu
        .route("/menu", get(menu))
        // GET /item/{id} - item details; POST /item/{id} - submit a review
        .route("/item/{item_id}", get(item_detail).post(submit_review))
}

/// Blank filters behave like missing ones
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn total_pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

/// Paginated menu, optionally filtered by name substring and category
///
/// Query parameters (all optional):
/// - `page`: 1-based, defaults to 1. `0` or less is a 400; a page past the last
///   one is a 404, except page 1 which always answers (empty menu, or a filter
///   that matches nothing).
/// - `q`: case-insensitive substring of the item name.
/// - `category`: exact category name.
///
/// The count query runs first so an out-of-range page never loads any items.
#[instrument(skip(app_state))]
pub async fn menu(
    WithRejection(Query(query_params), _): WithRejection<Query<MenuQueryDto>, HttpError>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate().map_err(|e| {
        tracing::error!("Invalid menu query: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = query_params.page.unwrap_or(1);
    let search = non_empty(query_params.q);
    let category = non_empty(query_params.category);

    let db_error = |e: sqlx::Error| {
        tracing::error!("DB error, loading menu: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    };

    let total = app_state
        .db_client
        .get_item_count(search.as_deref(), category.as_deref())
        .await
        .map_err(db_error)?;

    let total_pages = total_pages(total, ITEMS_PER_PAGE);
    if page > total_pages && page != 1 {
        return Err(HttpError::not_found(ErrorMessage::PageNotFound.to_string()));
    }

    let items = app_state
        .db_client
        .get_items(page, ITEMS_PER_PAGE, search.as_deref(), category.as_deref())
        .await
        .map_err(db_error)?;

    let categories = app_state
        .db_client
        .get_categories()
        .await
        .map_err(db_error)?;

    Ok(Json(MenuResponseDto {
        status: "success",
        data: items,
        categories,
        search_query: search,
        category_filter: category,
        pagination: PaginationDto {
            page,
            limit: ITEMS_PER_PAGE,
            total,
            total_pages,
        },
    }))
}

/// Item with statistics, its reviews (newest first) and the viewer's favorite flag
#[instrument(skip(app_state, context))]
pub async fn item_detail(
    WithRejection(Path(item_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, HttpError> {
    let db_error = |e: sqlx::Error| {
        tracing::error!("DB error, loading item: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    };

    let item = app_state
        .db_client
        .get_item(item_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ItemNotFound.to_string()))?;

    let reviews = app_state
        .db_client
        .get_item_reviews(item_id)
        .await
        .map_err(db_error)?;

    let is_favorite = match &context.user {
        Some(user) => app_state
            .db_client
            .is_favorite(user.id, item_id)
            .await
            .map_err(db_error)?,
        None => false,
    };

    Ok(Json(ItemDetailResponseDto {
        status: "success",
        item,
        reviews,
        is_favorite,
    }))
}

/// Post a review on an item
///
/// Checks run in this order:
/// 1. The item must exist (404), so a stale link never asks anyone to log in.
/// 2. The visitor must be logged in, otherwise 303 to the login page with
///    `next` pointing back at this item.
/// 3. The body must validate (rating 1-5, text 10-500 characters).
///
/// The sentiment is scored once here and stored with the review. If a remote
/// scorer is configured and fails or times out, the review is stored with no
/// score rather than rejected.
#[instrument(skip(app_state, context, body))]
pub async fn submit_review(
    WithRejection(Path(item_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    WithRejection(Json(body), _): WithRejection<Json<InputReviewDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    let db_error = |e: sqlx::Error| {
        tracing::error!("DB error, submitting review: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    };

    app_state
        .db_client
        .get_item(item_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ItemNotFound.to_string()))?;

    let user = context.require_user_with(
        &format!("/item/{}", item_id),
        ErrorMessage::ReviewLoginRequired,
    )?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid review input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let text = body.text.trim();
    let sentiment = app_state.sentiment.score(text).await;

    let review = app_state
        .db_client
        .create_review(user.id, item_id, body.rating, text, sentiment)
        .await
        .map_err(db_error)?;

    tracing::info!(
        username = %user.username,
        review_id = review.id,
        "Review submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(SingleReviewResponseDto {
            status: "success",
            message: "Your review has been submitted!".to_string(),
            data: review,
        }),
    ))
}
