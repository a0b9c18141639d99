use super::{DBClient, ITEM_WITH_STATS_COLUMNS};
use crate::models::{ItemAggregateRow, ItemWithStats};

/// Favorites: a plain (user, item) set with no lifecycle of its own
pub trait FavoriteExt {
    /// Mark an item as favorite; `false` if it already was
    async fn add_favorite(&self, user_id: i64, item_id: i64) -> Result<bool, sqlx::Error>;

    /// Unmark an item; `false` if it was not a favorite
    async fn remove_favorite(&self, user_id: i64, item_id: i64) -> Result<bool, sqlx::Error>;

    async fn is_favorite(&self, user_id: i64, item_id: i64) -> Result<bool, sqlx::Error>;

    /// A user's favorite items with statistics, by name
    async fn get_favorites(&self, user_id: i64) -> Result<Vec<ItemWithStats>, sqlx::Error>;
}

impl FavoriteExt for DBClient {
    async fn add_favorite(&self, user_id: i64, item_id: i64) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO favorites (user_id, item_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(item_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_favorite(&self, user_id: i64, item_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND item_id = ?")
            .bind(user_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_favorite(&self, user_id: i64, item_id: i64) -> Result<bool, sqlx::Error> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ? AND item_id = ?)",
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn get_favorites(&self, user_id: i64) -> Result<Vec<ItemWithStats>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ItemAggregateRow>(&format!(
            r#"
            SELECT {}
            FROM favorites f
            JOIN items i ON i.id = f.item_id
            LEFT JOIN reviews r ON r.item_id = i.id
            WHERE f.user_id = ?
            GROUP BY i.id
            ORDER BY i.name ASC
            "#,
            ITEM_WITH_STATS_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItemWithStats::from).collect())
    }
}
