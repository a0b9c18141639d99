mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod http;
mod middleware;
mod models;
mod recommend;
mod routes;
mod seed;
mod sentiment;
mod tracing_config;
mod utils;

use axum::http::{
    HeaderValue, Method,
    header::{ACCEPT, CONTENT_TYPE},
};
use config::Config;
use db::DBClient;
use dotenv::dotenv;
use http::HttpClient;
use sentiment::SentimentScorer;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub env: Arc<Config>,
    pub db_client: db::DBClient,
    pub sentiment: SentimentScorer,
}

#[tokio::main]
async fn main() {
    let _guard = tracing_config::init_tracing();

    dotenv().ok();

    let config = Config::init();

    let db_client = match DBClient::connect(&config.database_url, 10).await {
        Ok(db_client) => {
            tracing::info!("Connection to the database is successful!");
            db_client
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = db_client.migrate().await {
        tracing::error!("Failed to run database migrations: {:?}", err);
        std::process::exit(1);
    }

    let sentiment = SentimentScorer::new(
        HttpClient::with_timeout(config.sentiment_timeout_secs),
        config.sentiment_url.clone(),
    );
    match &sentiment {
        SentimentScorer::Lexicon => tracing::info!("Scoring review sentiment with the built-in lexicon"),
        SentimentScorer::Remote { url, .. } => {
            tracing::info!(url = %url, "Scoring review sentiment remotely")
        }
    }

    if config.seed_demo_data {
        if let Err(err) = seed::seed_demo_data(&db_client, &sentiment).await {
            tracing::error!("Failed to seed demo data: {:?}", err);
            std::process::exit(1);
        }
    }

    let cors = match config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_headers([ACCEPT, CONTENT_TYPE])
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS]),
        Err(err) => {
            tracing::error!("FRONTEND_URL is not a valid origin: {}", err);
            std::process::exit(1);
        }
    };

    let app_state = AppState {
        env: Arc::new(config.clone()),
        db_client,
        sentiment,
    };

    let app = routes::create_router(app_state).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
