pub mod category;
pub mod ingredient;
pub mod profile;
pub mod recipe;
pub mod session;
pub mod user;
