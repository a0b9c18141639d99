use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error body sent to clients
///
/// Example:
/// ```json
/// {
///   "status": "fail",
///   "message": "You must be logged in to submit a review."
/// }
/// ```
///
/// The message plays the role of a flash message: it is meant to be shown to
/// the user next to the form or page they came from.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

/// Every user-facing failure message of the application
///
/// Keeping them in one enum means handlers and middleware cannot drift apart on
/// wording, and tests can compare against `to_string()`.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    // Password validation
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,

    // Session
    InvalidToken,
    LoginRequired,
    ReviewLoginRequired,
    LoginFailed,

    // Authorization
    PermissionDenied,
    ActionDenied,

    // Conflicts
    UsernameTaken,
    ItemNameTaken,

    // Missing resources
    ItemNotFound,
    UserNotFound,
    ReviewNotFound,
    PageNotFound,

    ServerError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::EmptyPassword => "Password cannot be empty".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Password must not be more than {} characters", max_length)
            }
            ErrorMessage::InvalidHashFormat => "Invalid password hash format".to_string(),
            ErrorMessage::HashingError => "Error while hashing password".to_string(),
            ErrorMessage::InvalidToken => "Session is invalid or expired".to_string(),
            ErrorMessage::LoginRequired => "Please log in to access this page.".to_string(),
            ErrorMessage::ReviewLoginRequired => {
                "You must be logged in to submit a review.".to_string()
            }
            ErrorMessage::LoginFailed => {
                "Login Unsuccessful. Please check username and password".to_string()
            }
            ErrorMessage::PermissionDenied => {
                "You do not have permission to access this page.".to_string()
            }
            ErrorMessage::ActionDenied => {
                "You do not have permission to perform this action.".to_string()
            }
            ErrorMessage::UsernameTaken => {
                "That username is already taken. Please choose a different one.".to_string()
            }
            ErrorMessage::ItemNameTaken => {
                "An item with that name is already on the menu.".to_string()
            }
            ErrorMessage::ItemNotFound => "Item not found".to_string(),
            ErrorMessage::UserNotFound => "User not found".to_string(),
            ErrorMessage::ReviewNotFound => "Review not found".to_string(),
            ErrorMessage::PageNotFound => "Page not found".to_string(),
            ErrorMessage::ServerError => "Server Error. Please try again later".to_string(),
        };
        write!(f, "{}", message)
    }
}

/// Error type returned by every handler and middleware
///
/// `redirect_to` turns the error into a `303 See Other` pointing at that
/// location, with the message still in the body. Authorization failures use it
/// to send the user to the login page or back home instead of failing hard.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
    pub redirect_to: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
            redirect_to: None,
        }
    }

    /// 500, for database, hashing and other unexpected failures
    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// 400, for input that failed validation
    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::BAD_REQUEST)
    }

    /// 409, for unique constraint violations (username, item name)
    pub fn unique_constraint_violation(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::CONFLICT)
    }

    /// 401, for wrong credentials
    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::UNAUTHORIZED)
    }

    /// 404, for unknown item, user or review ids
    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::NOT_FOUND)
    }

    /// 303 to `location`, carrying a warning message
    pub fn redirect(message: impl Into<String>, location: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::SEE_OTHER,
            redirect_to: Some(location.into()),
        }
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            status: "fail".to_string(),
            message: self.message,
        });

        match self.redirect_to {
            Some(location) => {
                (self.status, [(header::LOCATION, location)], json_response).into_response()
            }
            None => (self.status, json_response).into_response(),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

// Extractor rejections (malformed JSON, missing fields, `?page=abc`, `/item/abc`)
// are wrapped with `axum_extra::extract::WithRejection` in the handlers, which
// needs these conversions. They all answer 400 with the usual JSON body instead
// of axum's plain-text 400/415/422.

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected JSON body: {}", rejection.body_text());
        HttpError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::warn!("Rejected query string: {}", rejection.body_text());
        HttpError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        tracing::warn!("Rejected path parameter: {}", rejection.body_text());
        HttpError::bad_request(rejection.body_text())
    }
}
