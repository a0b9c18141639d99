use crate::{
    AppState,
    db::{ItemExt, ReviewExt},
    dtos::HomeResponseDto,
    error::{ErrorMessage, HttpError},
    middleware::RequestContext,
    recommend::{Recommendation, recommend},
};
use axum::{Extension, Json, Router, extract::State, response::IntoResponse, routing::get};
use chrono::{Duration, Utc};
use tracing::instrument;

const TOP_ITEMS: i64 = 3;
const TRENDING_ITEMS: i64 = 3;
const TRENDING_WINDOW_DAYS: i64 = 7;
const TOP_REVIEWERS: i64 = 5;

pub fn home_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/home", get(home))
}

/// Landing page: best rated, trending this week, most active reviewers, and
/// personal recommendations for logged-in users
#[instrument(skip(app_state, context))]
pub async fn home(
    State(app_state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, HttpError> {
    let db_error = |e: sqlx::Error| {
        tracing::error!("DB error, loading home page: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    };

    let top_items = app_state
        .db_client
        .get_top_rated_items(TOP_ITEMS)
        .await
        .map_err(db_error)?;

    let since = Utc::now() - Duration::days(TRENDING_WINDOW_DAYS);
    let trending_items = app_state
        .db_client
        .get_trending_items(since, TRENDING_ITEMS)
        .await
        .map_err(db_error)?;

    let top_reviewers = app_state
        .db_client
        .get_top_reviewers(TOP_REVIEWERS)
        .await
        .map_err(db_error)?;

    let recommendation = match &context.user {
        Some(user) => {
            let history = app_state
                .db_client
                .get_review_history(user.id)
                .await
                .map_err(db_error)?;

            if history.is_empty() {
                Recommendation::default()
            } else {
                let catalog = app_state.db_client.get_catalog().await.map_err(db_error)?;
                recommend(&history, &catalog)
            }
        }
        None => Recommendation::default(),
    };

    Ok(Json(HomeResponseDto {
        status: "success",
        top_items,
        trending_items,
        top_reviewers,
        recommendation,
    }))
}
