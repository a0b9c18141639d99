use super::DBClient;
use crate::dtos::{ReviewDto, TopReviewerDto};
use crate::models::Review;
use crate::recommend::ReviewedItem;
use chrono::Utc;

const REVIEW_DTO_SELECT: &str = r#"
    SELECT r.id, r.rating, r.text, r.image_file, r.sentiment, r.date_posted,
           r.user_id, r.item_id,
           u.username AS author_username,
           i.name AS item_name
    FROM reviews r
    JOIN users u ON u.id = r.user_id
    JOIN items i ON i.id = r.item_id
"#;

/// Review database operations
///
/// There is no update statement for reviews: rating, text and sentiment are
/// fixed once inserted.
pub trait ReviewExt {
    /// Insert a review with its precomputed sentiment
    async fn create_review(
        &self,
        user_id: i64,
        item_id: i64,
        rating: i64,
        text: &str,
        sentiment: Option<f64>,
    ) -> Result<ReviewDto, sqlx::Error>;

    async fn get_review(&self, review_id: i64) -> Result<Option<Review>, sqlx::Error>;

    /// Reviews of one item, newest first
    async fn get_item_reviews(&self, item_id: i64) -> Result<Vec<ReviewDto>, sqlx::Error>;

    /// Reviews written by one user, newest first
    async fn get_user_reviews(&self, user_id: i64) -> Result<Vec<ReviewDto>, sqlx::Error>;

    /// Every review, newest first (admin dashboard)
    async fn get_all_reviews(&self) -> Result<Vec<ReviewDto>, sqlx::Error>;

    /// Category and rating of each review a user wrote, in submission order
    async fn get_review_history(&self, user_id: i64) -> Result<Vec<ReviewedItem>, sqlx::Error>;

    /// Users with the most reviews
    async fn get_top_reviewers(&self, limit: i64) -> Result<Vec<TopReviewerDto>, sqlx::Error>;

    /// `RowNotFound` if the review does not exist
    async fn delete_review(&self, review_id: i64) -> Result<(), sqlx::Error>;
}

impl ReviewExt for DBClient {
    async fn create_review(
        &self,
        user_id: i64,
        item_id: i64,
        rating: i64,
        text: &str,
        sentiment: Option<f64>,
    ) -> Result<ReviewDto, sqlx::Error> {
        let review_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO reviews (rating, text, image_file, sentiment, date_posted, user_id, item_id)
            VALUES (?, ?, NULL, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(rating)
        .bind(text)
        .bind(sentiment)
        .bind(Utc::now())
        .bind(user_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        let review = sqlx::query_as::<_, ReviewDto>(&format!("{} WHERE r.id = ?", REVIEW_DTO_SELECT))
            .bind(review_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(review)
    }

    async fn get_review(&self, review_id: i64) -> Result<Option<Review>, sqlx::Error> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, rating, text, image_file, sentiment, date_posted, user_id, item_id
            FROM reviews
            WHERE id = ?
            "#,
        )
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn get_item_reviews(&self, item_id: i64) -> Result<Vec<ReviewDto>, sqlx::Error> {
        let reviews = sqlx::query_as::<_, ReviewDto>(&format!(
            "{} WHERE r.item_id = ? ORDER BY r.date_posted DESC, r.id DESC",
            REVIEW_DTO_SELECT
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    async fn get_user_reviews(&self, user_id: i64) -> Result<Vec<ReviewDto>, sqlx::Error> {
        let reviews = sqlx::query_as::<_, ReviewDto>(&format!(
            "{} WHERE r.user_id = ? ORDER BY r.date_posted DESC, r.id DESC",
            REVIEW_DTO_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    async fn get_all_reviews(&self) -> Result<Vec<ReviewDto>, sqlx::Error> {
        let reviews = sqlx::query_as::<_, ReviewDto>(&format!(
            "{} ORDER BY r.date_posted DESC, r.id DESC",
            REVIEW_DTO_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    async fn get_review_history(&self, user_id: i64) -> Result<Vec<ReviewedItem>, sqlx::Error> {
        let history = sqlx::query_as::<_, ReviewedItem>(
            r#"
            SELECT r.item_id, i.category, r.rating
            FROM reviews r
            JOIN items i ON i.id = r.item_id
            WHERE r.user_id = ?
            ORDER BY r.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }

    async fn get_top_reviewers(&self, limit: i64) -> Result<Vec<TopReviewerDto>, sqlx::Error> {
        let reviewers = sqlx::query_as::<_, TopReviewerDto>(
            r#"
            SELECT u.username, u.image_file, COUNT(r.id) AS review_count
            FROM users u
            JOIN reviews r ON r.user_id = u.id
            GROUP BY u.id
            ORDER BY review_count DESC, u.username ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviewers)
    }

    async fn delete_review(&self, review_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ItemExt, UserExt, test_client};
    use crate::models::UserRole;

    #[tokio::test]
    async fn created_review_keeps_its_sentiment() {
        let db = test_client().await;
        let troy = db.save_user("Troy", "hash", UserRole::User, None).await.unwrap();
        let biryani = db.create_item("Chicken Biryani", "Lunch", None, None).await.unwrap();

        let review = db
            .create_review(troy.id, biryani.id, 3, "The biryani was just average.", Some(-0.15))
            .await
            .unwrap();
        assert_eq!(review.author_username, "Troy");
        assert_eq!(review.item_name, "Chicken Biryani");
        assert_eq!(review.sentiment, Some(-0.15));
        assert!(review.image_file.is_none());

        let stored = db.get_review(review.id).await.unwrap().unwrap();
        assert_eq!(stored.sentiment, Some(-0.15));
        assert_eq!(stored.rating, 3);
    }

    #[tokio::test]
    async fn rating_outside_range_is_rejected_by_schema() {
        let db = test_client().await;
        let troy = db.save_user("Troy", "hash", UserRole::User, None).await.unwrap();
        let biryani = db.create_item("Chicken Biryani", "Lunch", None, None).await.unwrap();

        assert!(
            db.create_review(troy.id, biryani.id, 6, "Too good to be true.", None)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn history_carries_categories() {
        let db = test_client().await;
        let troy = db.save_user("Troy", "hash", UserRole::User, None).await.unwrap();
        let paneer = db.create_item("Paneer Butter Masala", "Lunch", None, None).await.unwrap();
        let samosa = db.create_item("Veg Samosa", "Snack", None, None).await.unwrap();

        db.create_review(troy.id, paneer.id, 5, "Creamy and delicious.", None).await.unwrap();
        db.create_review(troy.id, samosa.id, 2, "Soggy and stale today.", None).await.unwrap();

        let history = db.get_review_history(troy.id).await.unwrap();
        assert_eq!(
            history,
            vec![
                ReviewedItem { item_id: paneer.id, category: "Lunch".to_string(), rating: 5 },
                ReviewedItem { item_id: samosa.id, category: "Snack".to_string(), rating: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn deleting_review_updates_lists_and_stats() {
        let db = test_client().await;
        let troy = db.save_user("Troy", "hash", UserRole::User, None).await.unwrap();
        let admin = db.save_user("admin", "hash", UserRole::Admin, None).await.unwrap();
        let samosa = db.create_item("Veg Samosa", "Snack", None, None).await.unwrap();

        db.create_review(admin.id, samosa.id, 5, "Best samosa ever.", None).await.unwrap();
        let low = db
            .create_review(troy.id, samosa.id, 2, "Too oily for me.", None)
            .await
            .unwrap();
        assert_eq!(db.get_item(samosa.id).await.unwrap().unwrap().stats.avg_rating, 3.5);

        db.delete_review(low.id).await.unwrap();

        assert!(db.get_all_reviews().await.unwrap().iter().all(|r| r.id != low.id));
        assert_eq!(db.get_item_reviews(samosa.id).await.unwrap().len(), 1);
        assert_eq!(db.get_item(samosa.id).await.unwrap().unwrap().stats.avg_rating, 5.0);
        assert!(matches!(
            db.delete_review(low.id).await,
            Err(sqlx::Error::RowNotFound)
        ));
    }

    #[tokio::test]
    async fn top_reviewers_are_ranked_by_count() {
        let db = test_client().await;
        let troy = db.save_user("Troy", "hash", UserRole::User, None).await.unwrap();
        let admin = db.save_user("admin", "hash", UserRole::Admin, None).await.unwrap();
        db.save_user("lurker", "hash", UserRole::User, None).await.unwrap();
        let samosa = db.create_item("Veg Samosa", "Snack", None, None).await.unwrap();
        let coffee = db.create_item("Cold Coffee", "Beverage", None, None).await.unwrap();

        db.create_review(troy.id, samosa.id, 4, "Good samosa here.", None).await.unwrap();
        db.create_review(troy.id, coffee.id, 3, "Coffee was decent.", None).await.unwrap();
        db.create_review(admin.id, coffee.id, 2, "Coffee was watery.", None).await.unwrap();

        let top = db.get_top_reviewers(5).await.unwrap();
        let counts: Vec<(&str, i64)> = top
            .iter()
            .map(|r| (r.username.as_str(), r.review_count))
            .collect();
        assert_eq!(counts, vec![("Troy", 2), ("admin", 1)]);
    }
}
