pub mod auth;
pub mod category;
pub mod image;
pub mod ingredient;
pub mod page;
pub mod profile;
pub mod recipe;
pub mod shared;
