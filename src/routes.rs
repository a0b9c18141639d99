use axum::{Router, middleware};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    AppState,
    handler::{
        admin::admin_handler, auth::auth_handler, favorites::favorites_handler,
        home::home_handler, menu::menu_handler, profile::profile_handler,
    },
    middleware::load_context,
};

pub fn create_router(app_state: AppState) -> Router {
    let static_files = ServeDir::new(&app_state.env.static_dir);

    Router::new()
        .merge(home_handler())
        .merge(auth_handler())
        .merge(menu_handler())
        .merge(favorites_handler())
        .merge(profile_handler())
        .merge(admin_handler())
        .nest_service("/static", static_files)
        // Outermost of the app layers: every handler and route layer sees a RequestContext
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            load_context,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
