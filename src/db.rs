use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

mod user;
pub use user::UserExt;

mod item;
pub use item::ItemExt;

mod review;
pub use review::ReviewExt;

mod favorite;
pub use favorite::FavoriteExt;

/// Columns of an item plus its review aggregates, shared by every catalog query
///
/// Must be followed by `FROM items i LEFT JOIN reviews r ON r.item_id = i.id`
/// and a `GROUP BY i.id`.
///
/// How the aggregates behave:
/// - `COUNT(r.id)` counts review ids, not rows, so an item whose LEFT JOIN
///   found no review (one row of NULLs) counts 0 instead of 1.
/// - `AVG(...)` skips NULLs. With no reviews both averages are NULL, which
///   decodes to `None` and becomes 0 in [`ItemStats::new`](crate::models::ItemStats::new).
/// - Reviews stored without a sentiment score (remote scorer failed) drop out of
///   `sentiment_avg` but still count for `rating_avg`.
///
/// Nothing here is persisted: stats are recomputed on every read, so deleting a
/// review is reflected immediately.
pub(crate) const ITEM_WITH_STATS_COLUMNS: &str = r#"
    i.id, i.name, i.category, i.description, i.image_url, i.created_at,
    COUNT(r.id) AS review_count,
    AVG(r.rating) AS rating_avg,
    AVG(r.sentiment) AS sentiment_avg
"#;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Sqlite>,
}

impl DBClient {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        DBClient { pool }
    }

    /// Open (and create if missing) the SQLite database at `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(DBClient::new(pool))
    }

    /// Apply the embedded migrations under `migrations/`
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Fresh in-memory database with the schema applied
///
/// A single connection that never expires: every connection to
/// `sqlite::memory:` would otherwise get its own empty database.
#[cfg(test)]
pub async fn test_client() -> DBClient {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let client = DBClient::new(pool);
    client.migrate().await.unwrap();
    client
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("dosa"), "%dosa%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
