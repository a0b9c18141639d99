use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub session_maxage: i64,
    pub port: u16,
    pub static_dir: String,
    pub frontend_url: String,
    pub sentiment_url: Option<String>,
    pub sentiment_timeout_secs: u64,
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://canteen.db".to_string(),
            secret_key: "a-super-secret-key-you-should-change".to_string(),
            session_maxage: 60 * 60 * 24,
            port: 8000,
            static_dir: "static".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            sentiment_url: None,
            sentiment_timeout_secs: 5,
            seed_demo_data: false,
        }
    }
}

impl Config {
    /// Read settings from the environment, falling back to development defaults
    ///
    /// Call after `dotenv()` so values from `.env` are visible. Every variable is
    /// optional:
    /// - strings (`DATABASE_URL`, `SECRET_KEY`, `STATIC_DIR`, `FRONTEND_URL`) are
    ///   taken as-is;
    /// - numbers and booleans (`SESSION_MAXAGE`, `PORT`, `SENTIMENT_TIMEOUT_SECS`,
    ///   `SEED_DEMO_DATA`) fall back to the default with a warning when they do
    ///   not parse, rather than refusing to start;
    /// - `SENTIMENT_URL` unset means the built-in lexicon scores reviews.
    ///
    /// The default `SECRET_KEY` is only meant for local development: anyone who
    /// knows it can forge session cookies.
    pub fn init() -> Config {
        let defaults = Config::default();

        Config {
            database_url: env_or("DATABASE_URL", defaults.database_url),
            secret_key: env_or("SECRET_KEY", defaults.secret_key),
            session_maxage: env_parse("SESSION_MAXAGE", defaults.session_maxage),
            port: env_parse("PORT", defaults.port),
            static_dir: env_or("STATIC_DIR", defaults.static_dir),
            frontend_url: env_or("FRONTEND_URL", defaults.frontend_url),
            sentiment_url: std::env::var("SENTIMENT_URL").ok(),
            sentiment_timeout_secs: env_parse(
                "SENTIMENT_TIMEOUT_SECS",
                defaults.sentiment_timeout_secs,
            ),
            seed_demo_data: env_parse("SEED_DEMO_DATA", defaults.seed_demo_data),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: FromStr + Copy + std::fmt::Debug>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!("{} has an invalid value {:?}, using {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
