use serde::Serialize;

/// Stored recipe image.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageUploadResponse {
    /// Object key inside the image bucket.
    #[schema(example = "recipes/42-1718000000123-Nudelsalat.jpg")]
    pub path: String,
    /// Public URL to store as the recipe's `image_url`.
    #[schema(example = "http://127.0.0.1:3000/storage/recipe-images/recipes/42-1718000000123-Nudelsalat.jpg")]
    pub url: String,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
    #[schema(example = 48213)]
    pub size: u64,
}
