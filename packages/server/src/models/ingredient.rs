use serde::{Deserialize, Deserializer, Serialize};

use crate::entity::ingredient;
use crate::error::AppError;
use crate::models::shared::{validate_optional_text, validate_required_text};
use crate::utils::ingredient_editor::{IngredientDraft, IngredientEdit, coerce_quantity};

pub const MAX_INGREDIENTS: usize = 100;
const MAX_NAME_LEN: usize = 100;
const MAX_UNIT_LEN: usize = 50;
const MAX_INFO_LEN: usize = 500;

/// An ingredient as submitted with a recipe.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct IngredientInput {
    #[schema(example = "Mehl")]
    pub name: String,
    /// Number or numeric text; text is coerced and falls back to 0.
    #[serde(default, deserialize_with = "quantity_from_number_or_text")]
    #[schema(value_type = f64, example = 250.0)]
    pub quantity: f64,
    #[serde(default)]
    #[schema(example = "g")]
    pub unit: String,
    #[serde(default)]
    #[schema(example = "Type 405")]
    pub additional_info: Option<String>,
}

impl From<IngredientInput> for IngredientDraft {
    fn from(input: IngredientInput) -> Self {
        Self {
            name: input.name,
            quantity: input.quantity,
            unit: input.unit,
            additional_info: input.additional_info,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn quantity_from_number_or_text<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => n,
        Some(NumberOrText::Text(s)) => coerce_quantity(&s),
        None => 0.0,
    })
}

/// Check drafts before they are saved. Names must contain text.
pub fn validate_ingredients(drafts: &[IngredientDraft]) -> Result<(), AppError> {
    if drafts.len() > MAX_INGREDIENTS {
        return Err(AppError::Validation(format!(
            "Ein Rezept darf höchstens {MAX_INGREDIENTS} Zutaten haben"
        )));
    }
    for (pos, d) in drafts.iter().enumerate() {
        let label = format!("Der Name der Zutat {}", pos + 1);
        validate_required_text(&d.name, &label, MAX_NAME_LEN)?;
        if !d.quantity.is_finite() || d.quantity < 0.0 {
            return Err(AppError::Validation(format!(
                "Die Menge der Zutat {} muss eine Zahl ab 0 sein",
                pos + 1
            )));
        }
        validate_optional_text(Some(&d.unit), "Die Einheit", MAX_UNIT_LEN)?;
        validate_optional_text(d.additional_info.as_deref(), "Der Zusatz", MAX_INFO_LEN)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct IngredientResponse {
    #[schema(example = 7)]
    pub id: i32,
    /// 0-based position within the recipe.
    #[schema(example = 0)]
    pub position: i32,
    #[schema(example = "Mehl")]
    pub name: String,
    #[schema(example = 250.0)]
    pub quantity: f64,
    #[schema(example = "g")]
    pub unit: String,
    pub additional_info: Option<String>,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(m: ingredient::Model) -> Self {
        Self {
            id: m.id,
            position: m.position,
            name: m.name,
            quantity: m.quantity,
            unit: m.unit,
            additional_info: m.additional_info,
        }
    }
}

/// A batch of position-keyed edits applied to a recipe's stored ingredients.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct IngredientEditRequest {
    #[schema(example = json!([{"op": "remove", "index": 1}, {"op": "append"}, {"op": "set", "index": 2, "field": "name", "value": "Salz"}]))]
    pub edits: Vec<IngredientEdit>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct IngredientListResponse {
    #[schema(example = 3)]
    pub recipe_id: i32,
    pub ingredients: Vec<IngredientResponse>,
}
