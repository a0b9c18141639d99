use crate::models::{Item, ItemWithStats, User};
use crate::recommend::Recommendation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// Request bodies are validated with `validator` before touching the database;
// response types only expose what the client should see (no password hashes).

// ============================================================================
// Authentication DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(
        length(min = 2, max = 20, message = "Username must be between 2 and 20 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "confirmPassword")]
    pub password_confirm: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// `?next=` on the login form, set when a protected page bounced the user
#[derive(Debug, Default, Deserialize)]
pub struct LoginQueryDto {
    pub next: Option<String>,
}

/// Describes a form for GET requests on form routes
#[derive(Debug, Serialize)]
pub struct FormResponseDto {
    pub status: &'static str,
    pub title: &'static str,
    pub fields: Vec<&'static str>,
}

/// Usernames end up in profile URLs, so keep them to a URL-safe alphabet
fn validate_username(username: &str) -> Result<(), validator::ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_username")
            .with_message("Username may only contain letters, digits, '_', '-' and '.'".into()))
    }
}

// ============================================================================
// User DTOs
// ============================================================================

/// Public view of a user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FilterUserDto {
    pub id: i64,
    pub username: String,
    pub role: String,
    #[serde(rename = "imageFile")]
    pub image_file: String,
    pub bio: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            username: user.username.to_owned(),
            role: user.role.to_str().to_string(),
            image_file: user.image_file.to_owned(),
            bio: user.bio.to_owned(),
            created_at: user.created_at,
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProfileDto {
    #[validate(
        length(min = 2, max = 20, message = "Username must be between 2 and 20 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(length(max = 255, message = "Bio must not be more than 255 characters"))]
    pub bio: Option<String>,
}

/// Edit-profile form prefilled with the current values
#[derive(Debug, Serialize)]
pub struct ProfileFormResponseDto {
    pub status: &'static str,
    pub data: UpdateProfileDto,
}

#[derive(Debug, Serialize)]
pub struct UserResponseDto {
    pub status: &'static str,
    pub message: String,
    pub data: FilterUserDto,
}

#[derive(Debug, Serialize)]
pub struct UserProfileResponseDto {
    pub status: &'static str,
    pub user: FilterUserDto,
    pub reviews: Vec<ReviewDto>,
}

/// A user and the number of reviews they wrote
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct TopReviewerDto {
    pub username: String,
    #[serde(rename = "imageFile")]
    pub image_file: String,
    #[serde(rename = "reviewCount")]
    pub review_count: i64,
}

// ============================================================================
// Menu & Item DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize, Validate)]
pub struct MenuQueryDto {
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    pub page: Option<i64>,

    pub q: Option<String>,

    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PaginationDto {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct MenuResponseDto {
    pub status: &'static str,
    pub data: Vec<ItemWithStats>,
    pub categories: Vec<String>,
    #[serde(rename = "searchQuery")]
    pub search_query: Option<String>,
    #[serde(rename = "categoryFilter")]
    pub category_filter: Option<String>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
pub struct ItemDetailResponseDto {
    pub status: &'static str,
    pub item: ItemWithStats,
    pub reviews: Vec<ReviewDto>,
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct AddItemDto {
    #[validate(length(min = 1, max = 100, message = "Item name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "Category must be between 1 and 50 characters"))]
    pub category: String,

    #[validate(length(max = 500, message = "Description must not be more than 500 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Image URL is invalid"))]
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponseDto {
    pub status: &'static str,
    pub message: String,
    pub data: Item,
}

#[derive(Debug, Serialize)]
pub struct ItemListResponseDto {
    pub status: &'static str,
    pub data: Vec<ItemWithStats>,
}

// ============================================================================
// Review DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct InputReviewDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i64,

    #[validate(length(min = 10, max = 500, message = "Review must be between 10 and 500 characters"))]
    pub text: String,
}

/// A review joined with its author's username and the item's name
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct ReviewDto {
    pub id: i64,
    pub rating: i64,
    pub text: String,
    #[serde(rename = "imageFile")]
    pub image_file: Option<String>,
    pub sentiment: Option<f64>,
    #[serde(rename = "datePosted")]
    pub date_posted: DateTime<Utc>,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "itemId")]
    pub item_id: i64,
    #[serde(rename = "authorUsername")]
    pub author_username: String,
    #[serde(rename = "itemName")]
    pub item_name: String,
}

#[derive(Debug, Serialize)]
pub struct SingleReviewResponseDto {
    pub status: &'static str,
    pub message: String,
    pub data: ReviewDto,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboardResponseDto {
    pub status: &'static str,
    pub reviews: Vec<ReviewDto>,
}

// ============================================================================
// Home DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HomeResponseDto {
    pub status: &'static str,
    #[serde(rename = "topItems")]
    pub top_items: Vec<ItemWithStats>,
    #[serde(rename = "trendingItems")]
    pub trending_items: Vec<ItemWithStats>,
    #[serde(rename = "topReviewers")]
    pub top_reviewers: Vec<TopReviewerDto>,
    #[serde(flatten)]
    pub recommendation: Recommendation,
}

// ============================================================================
// Misc DTOs
// ============================================================================

/// Generic success response carrying a flash-style message
#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

/// Result of an admin cascade deletion
#[derive(Debug, Serialize)]
pub struct DeleteResponseDto {
    pub status: &'static str,
    pub message: String,
    #[serde(rename = "removedReviews")]
    pub removed_reviews: u64,
}

/// Body sent to a remote sentiment service
#[derive(Debug, Serialize)]
pub struct SentimentRequestDto {
    pub text: String,
}

/// Body expected back from a remote sentiment service
#[derive(Debug, Deserialize)]
pub struct SentimentResponseDto {
    pub polarity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_matching_passwords() {
        let dto = RegisterUserDto {
            username: "Troy".to_string(),
            password: "123456".to_string(),
            password_confirm: "654321".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = RegisterUserDto {
            password_confirm: "123456".to_string(),
            ..dto
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn register_rejects_short_username() {
        let dto = RegisterUserDto {
            username: "T".to_string(),
            password: "123456".to_string(),
            password_confirm: "123456".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn register_rejects_url_unsafe_username() {
        let dto = RegisterUserDto {
            username: "Troy B".to_string(),
            password: "123456".to_string(),
            password_confirm: "123456".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = RegisterUserDto {
            username: "troy.b_2".to_string(),
            ..dto
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn review_rating_must_be_in_range() {
        let mut dto = InputReviewDto {
            rating: 6,
            text: "Perfectly fine lunch.".to_string(),
        };
        assert!(dto.validate().is_err());
        dto.rating = 0;
        assert!(dto.validate().is_err());
        dto.rating = 5;
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn review_text_length_is_bounded() {
        let dto = InputReviewDto {
            rating: 3,
            text: "too short".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = InputReviewDto {
            rating: 3,
            text: "x".repeat(501),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn add_item_checks_image_url() {
        let dto = AddItemDto {
            name: "Vada Pav".to_string(),
            category: "Snack".to_string(),
            description: None,
            image_url: Some("not a url".to_string()),
        };
        assert!(dto.validate().is_err());

        let dto = AddItemDto {
            image_url: None,
            ..dto
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn menu_page_must_be_positive() {
        let query = MenuQueryDto {
            page: Some(0),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }
}
