pub mod admin;
pub mod auth;
pub mod favorites;
pub mod home;
pub mod menu;
pub mod profile;
