use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// Placeholder shown for menu items created without a picture
pub const DEFAULT_ITEM_IMAGE: &str = "https://placehold.co/600x400/CCCCCC/FFFFFF?text=No+Image";

/// Profile picture every new account starts with
pub const DEFAULT_PROFILE_IMAGE: &str = "default.jpg";

/// User role for access control
///
/// Stored as lowercase TEXT in the `users.role` column ("admin" / "user").
/// Admins curate the menu and moderate reviews; everyone else can only review
/// and favorite.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

/// Row of the `users` table
///
/// `password` holds the argon2 PHC string, never the plain text. This struct is
/// deliberately not `Serialize`: responses go through `FilterUserDto`.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub image_file: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Row of the `items` table (one dish or drink on the menu)
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Row of the `reviews` table
///
/// `sentiment` is written once by the insert and no statement ever updates it.
/// It stays `None` when the scorer was unavailable at submission time.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Review {
    pub id: i64,
    pub rating: i64,
    pub text: String,
    #[serde(rename = "imageFile")]
    pub image_file: Option<String>,
    pub sentiment: Option<f64>,
    #[serde(rename = "datePosted")]
    pub date_posted: DateTime<Utc>,
    pub user_id: i64,
    pub item_id: i64,
}

/// Derived, read-only statistics of an item
///
/// Computed from the item's reviews every time they are read, never persisted.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct ItemStats {
    #[serde(rename = "avgRating")]
    pub avg_rating: f64,
    #[serde(rename = "reviewCount")]
    pub review_count: i64,
    #[serde(rename = "avgSentiment")]
    pub avg_sentiment: f64,
}

impl ItemStats {
    /// Build stats from raw SQL aggregates
    ///
    /// `rating_avg` / `sentiment_avg` are `None` when there is nothing to average
    /// (no reviews, or no review with a sentiment score); both then report 0.
    /// Ratings are rounded to one decimal, sentiment to two.
    pub fn new(review_count: i64, rating_avg: Option<f64>, sentiment_avg: Option<f64>) -> Self {
        let avg_rating = match rating_avg {
            Some(avg) if review_count > 0 => round_to(avg, 1),
            _ => 0.0,
        };
        let avg_sentiment = sentiment_avg.map(|avg| round_to(avg, 2)).unwrap_or(0.0);

        ItemStats {
            avg_rating,
            review_count,
            avg_sentiment,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Item joined with its aggregate review columns
///
/// Every catalog query selects `review_count`, `rating_avg` and `sentiment_avg`
/// through a LEFT JOIN on `reviews`, so items without reviews still show up.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct ItemAggregateRow {
    #[sqlx(flatten)]
    pub item: Item,
    pub review_count: i64,
    pub rating_avg: Option<f64>,
    pub sentiment_avg: Option<f64>,
}

/// An item together with its derived statistics, as shown on listing pages
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ItemWithStats {
    #[serde(flatten)]
    pub item: Item,
    #[serde(flatten)]
    pub stats: ItemStats,
}

impl From<ItemAggregateRow> for ItemWithStats {
    fn from(row: ItemAggregateRow) -> Self {
        ItemWithStats {
            stats: ItemStats::new(row.review_count, row.rating_avg, row.sentiment_avg),
            item: row.item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_without_reviews_are_zero() {
        let stats = ItemStats::new(0, None, None);
        assert_eq!(stats.avg_rating, 0.0);
        assert_eq!(stats.review_count, 0);
        assert_eq!(stats.avg_sentiment, 0.0);
    }

    #[test]
    fn stats_round_rating_to_one_decimal() {
        assert_eq!(ItemStats::new(2, Some(4.5), None).avg_rating, 4.5);
        assert_eq!(ItemStats::new(3, Some(11.0 / 3.0), None).avg_rating, 3.7);
    }

    #[test]
    fn stats_round_sentiment_to_two_decimals() {
        let stats = ItemStats::new(3, Some(4.0), Some(0.123_456));
        assert_eq!(stats.avg_sentiment, 0.12);
    }

    #[test]
    fn stats_ignore_missing_sentiment() {
        let stats = ItemStats::new(2, Some(3.0), None);
        assert_eq!(stats.avg_sentiment, 0.0);
        assert_eq!(stats.avg_rating, 3.0);
    }

    #[test]
    fn role_reports_admin() {
        assert_eq!(UserRole::Admin.to_str(), "admin");
        assert_eq!(UserRole::User.to_str(), "user");
    }
}
