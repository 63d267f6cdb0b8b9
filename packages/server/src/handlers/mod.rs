pub mod auth;
pub mod category;
pub mod image;
pub mod page;
pub mod profile;
pub mod recipe;
