use super::{DBClient, ITEM_WITH_STATS_COLUMNS, like_pattern};
use crate::models::{DEFAULT_ITEM_IMAGE, Item, ItemAggregateRow, ItemWithStats};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

/// Menu item database operations
pub trait ItemExt {
    /// Single item with its review statistics
    async fn get_item(&self, item_id: i64) -> Result<Option<ItemWithStats>, sqlx::Error>;

    /// One page of the menu, ordered by name
    ///
    /// `search` is a case-insensitive substring of the name, `category` an exact
    /// category. Both are optional.
    async fn get_items(
        &self,
        page: i64,
        limit: i64,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<ItemWithStats>, sqlx::Error>;

    /// Number of items matching the same filters as `get_items`
    async fn get_item_count(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<i64, sqlx::Error>;

    /// Every item with its statistics (input of the recommendation engine)
    async fn get_catalog(&self) -> Result<Vec<ItemWithStats>, sqlx::Error>;

    /// Distinct categories, alphabetically
    async fn get_categories(&self) -> Result<Vec<String>, sqlx::Error>;

    /// Reviewed items with the highest average rating
    async fn get_top_rated_items(&self, limit: i64) -> Result<Vec<ItemWithStats>, sqlx::Error>;

    /// Items with the most reviews posted since `since`
    async fn get_trending_items(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ItemWithStats>, sqlx::Error>;

    /// Insert a menu item; unique violation if the name is taken
    async fn create_item(
        &self,
        name: &str,
        category: &str,
        description: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Item, sqlx::Error>;

    /// Delete an item together with its reviews and favorite rows
    ///
    /// One transaction; returns how many reviews were removed, `RowNotFound`
    /// if the item does not exist.
    async fn delete_item(&self, item_id: i64) -> Result<u64, sqlx::Error>;
}

fn push_filters<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    search: Option<&str>,
    category: Option<&'a str>,
) {
    builder.push(" WHERE 1 = 1");
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        builder
            .push(" AND i.name LIKE ")
            .push_bind(like_pattern(search))
            .push(" ESCAPE '\\'");
    }
    if let Some(category) = category.filter(|c| !c.is_empty()) {
        builder.push(" AND i.category = ").push_bind(category);
    }
}

impl ItemExt for DBClient {
    async fn get_item(&self, item_id: i64) -> Result<Option<ItemWithStats>, sqlx::Error> {
        let row = sqlx::query_as::<_, ItemAggregateRow>(&format!(
            r#"
            SELECT {}
            FROM items i
            LEFT JOIN reviews r ON r.item_id = i.id
            WHERE i.id = ?
            GROUP BY i.id
            "#,
            ITEM_WITH_STATS_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ItemWithStats::from))
    }

    async fn get_items(
        &self,
        page: i64,
        limit: i64,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<ItemWithStats>, sqlx::Error> {
        // Pages are 1-based; the handler has already rejected page < 1
        let offset = (page - 1) * limit;

        // QueryBuilder instead of a fixed string because `search` and `category`
        // are both optional: push_filters only emits the WHERE/AND clauses that
        // are actually needed, and every user value goes through push_bind.

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM items i LEFT JOIN reviews r ON r.item_id = i.id",
            ITEM_WITH_STATS_COLUMNS
        ));
        push_filters(&mut builder, search, category);
        builder
            .push(" GROUP BY i.id ORDER BY i.name ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder
            .build_query_as::<ItemAggregateRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ItemWithStats::from).collect())
    }

    async fn get_item_count(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM items i");
        push_filters(&mut builder, search, category);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_catalog(&self) -> Result<Vec<ItemWithStats>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ItemAggregateRow>(&format!(
            r#"
            SELECT {}
            FROM items i
            LEFT JOIN reviews r ON r.item_id = i.id
            GROUP BY i.id
            ORDER BY i.name ASC
            "#,
            ITEM_WITH_STATS_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItemWithStats::from).collect())
    }

    async fn get_categories(&self) -> Result<Vec<String>, sqlx::Error> {
        let categories =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM items ORDER BY category")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    async fn get_top_rated_items(&self, limit: i64) -> Result<Vec<ItemWithStats>, sqlx::Error> {
        // INNER JOIN: items nobody reviewed have no average to rank by.
        let rows = sqlx::query_as::<_, ItemAggregateRow>(&format!(
            r#"
            SELECT {}
            FROM items i
            JOIN reviews r ON r.item_id = i.id
            GROUP BY i.id
            ORDER BY rating_avg DESC, i.name ASC
            LIMIT ?
            "#,
            ITEM_WITH_STATS_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItemWithStats::from).collect())
    }

    async fn get_trending_items(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ItemWithStats>, sqlx::Error> {
        // Two different review sets are involved here:
        // - the subquery `t` counts only reviews posted since `since`, and both
        //   picks the trending items (inner join) and ranks them;
        // - the outer LEFT JOIN on `r` brings back *all* reviews of those items,
        //   so the stats shown next to a trending item are its lifetime stats,
        //   not just this week's.
        // Joining `t` first keeps items without recent reviews out entirely.
        let rows = sqlx::query_as::<_, ItemAggregateRow>(&format!(
            r#"
            SELECT {}
            FROM (
                SELECT item_id, COUNT(*) AS recent_count
                FROM reviews
                WHERE date_posted >= ?
                GROUP BY item_id
            ) t
            JOIN items i ON i.id = t.item_id
            LEFT JOIN reviews r ON r.item_id = i.id
            GROUP BY i.id
            ORDER BY t.recent_count DESC, i.name ASC
            LIMIT ?
            "#,
            ITEM_WITH_STATS_COLUMNS
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItemWithStats::from).collect())
    }

    async fn create_item(
        &self,
        name: &str,
        category: &str,
        description: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Item, sqlx::Error> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, category, description, image_url, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, category, description, image_url, created_at
            "#,
        )
        .bind(name)
        .bind(category)
        .bind(description)
        .bind(image_url.unwrap_or(DEFAULT_ITEM_IMAGE))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    async fn delete_item(&self, item_id: i64) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let removed_reviews = sqlx::query("DELETE FROM reviews WHERE item_id = ?")
            .bind(item_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM favorites WHERE item_id = ?")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        tx.commit().await?;
        Ok(removed_reviews)
    }
}
