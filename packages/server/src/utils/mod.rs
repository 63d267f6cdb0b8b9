pub mod hash;
pub mod image;
pub mod ingredient_editor;
pub mod ingredients;
pub mod jwt;
pub mod recipe_filter;
