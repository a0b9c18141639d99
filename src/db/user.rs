use super::DBClient;
use crate::models::{DEFAULT_PROFILE_IMAGE, User, UserRole};
use chrono::Utc;

const USER_COLUMNS: &str = "id, username, password, role, image_file, bio, created_at";

/// User database operations
pub trait UserExt {
    /// Find a user by id or username; `None` if no such user exists
    async fn get_user(
        &self,
        user_id: Option<i64>,
        username: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Insert a user; fails with a unique violation if the username is taken
    async fn save_user(
        &self,
        username: &str,
        password_hash: &str,
        role: UserRole,
        bio: Option<&str>,
    ) -> Result<User, sqlx::Error>;

    /// Change username and bio
    async fn update_profile(
        &self,
        user_id: i64,
        username: &str,
        bio: Option<&str>,
    ) -> Result<User, sqlx::Error>;

    /// Delete a user together with their reviews and favorites
    ///
    /// Runs in one transaction and returns how many reviews were removed.
    /// `RowNotFound` if the user does not exist; nothing is deleted then.
    async fn delete_user(&self, user_id: i64) -> Result<u64, sqlx::Error>;

    async fn get_user_count(&self) -> Result<i64, sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<i64>,
        username: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = ?",
                USER_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE username = ?",
                USER_COLUMNS
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn save_user(
        &self,
        username: &str,
        password_hash: &str,
        role: UserRole,
        bio: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password, role, image_file, bio, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(DEFAULT_PROFILE_IMAGE)
        .bind(bio)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        username: &str,
        bio: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = ?, bio = ?
            WHERE id = ?
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(bio)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, user_id: i64) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let removed_reviews = sqlx::query("DELETE FROM reviews WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM favorites WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        // Dropping the transaction rolls the review/favorite deletes back.
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        tx.commit().await?;
        Ok(removed_reviews)
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FavoriteExt, ItemExt, ReviewExt, test_client};

    #[tokio::test]
    async fn save_and_find_user() {
        let db = test_client().await;
        let saved = db
            .save_user("Troy", "hash", UserRole::User, Some("Just a student"))
            .await
            .unwrap();

        assert_eq!(saved.role, UserRole::User);
        assert_eq!(saved.image_file, DEFAULT_PROFILE_IMAGE);

        let by_id = db.get_user(Some(saved.id), None).await.unwrap().unwrap();
        let by_name = db.get_user(None, Some("Troy")).await.unwrap().unwrap();
        assert_eq!(by_id.id, by_name.id);
        assert_eq!(by_name.bio.as_deref(), Some("Just a student"));

        assert!(db.get_user(None, Some("nobody")).await.unwrap().is_none());
        assert!(db.get_user(None, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_unique_violation() {
        let db = test_client().await;
        db.save_user("admin", "hash", UserRole::Admin, None).await.unwrap();

        match db.save_user("admin", "hash", UserRole::User, None).await {
            Err(sqlx::Error::Database(db_err)) => assert!(db_err.is_unique_violation()),
            other => panic!("expected unique violation, got {:?}", other.map(|u| u.id)),
        }
    }

    #[tokio::test]
    async fn update_profile_changes_name_and_bio() {
        let db = test_client().await;
        let user = db.save_user("Troy", "hash", UserRole::User, None).await.unwrap();

        let updated = db
            .update_profile(user.id, "TroyB", Some("Lunch enthusiast"))
            .await
            .unwrap();
        assert_eq!(updated.username, "TroyB");
        assert_eq!(updated.bio.as_deref(), Some("Lunch enthusiast"));
    }

    #[tokio::test]
    async fn delete_user_cascades_to_reviews_and_favorites() {
        let db = test_client().await;
        let troy = db.save_user("Troy", "hash", UserRole::User, None).await.unwrap();
        let admin = db.save_user("admin", "hash", UserRole::Admin, None).await.unwrap();
        let samosa = db.create_item("Veg Samosa", "Snack", None, None).await.unwrap();

        db.create_review(troy.id, samosa.id, 4, "Really good samosa.", Some(0.7))
            .await
            .unwrap();
        db.create_review(admin.id, samosa.id, 5, "Best samosa on campus!", Some(1.0))
            .await
            .unwrap();
        db.add_favorite(troy.id, samosa.id).await.unwrap();

        assert_eq!(db.delete_user(troy.id).await.unwrap(), 1);
        assert!(db.get_user(Some(troy.id), None).await.unwrap().is_none());

        let remaining = db.get_item_reviews(samosa.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].author_username, "admin");
        assert!(db.get_favorites(troy.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_user_is_row_not_found() {
        let db = test_client().await;
        assert!(matches!(
            db.delete_user(999).await,
            Err(sqlx::Error::RowNotFound)
        ));
    }
}
