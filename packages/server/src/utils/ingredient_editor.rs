//! Position-keyed editing of a recipe's ingredient list.
//!
//! Drafts are addressed by their index in the list, never by database id:
//! removing an entry shifts every later entry down by one. Field values
//! arrive as form text; quantities are coerced to numbers and fall back to
//! zero when the text is not numeric.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::ingredient;
use crate::error::AppError;

/// One ingredient entry while a recipe is being edited.
#[derive(Debug, Clone, PartialEq, Default, Serialize, utoipa::ToSchema)]
pub struct IngredientDraft {
    #[schema(example = "Spaghetti")]
    pub name: String,
    #[schema(example = 500.0)]
    pub quantity: f64,
    #[schema(example = "g")]
    pub unit: String,
    #[schema(example = "al dente")]
    pub additional_info: Option<String>,
}

impl From<ingredient::Model> for IngredientDraft {
    fn from(m: ingredient::Model) -> Self {
        Self {
            name: m.name,
            quantity: m.quantity,
            unit: m.unit,
            additional_info: m.additional_info,
        }
    }
}

/// Editable field of an ingredient draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IngredientField {
    Name,
    Quantity,
    Unit,
    AdditionalInfo,
}

/// A single editor operation.
#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum IngredientEdit {
    /// Append a blank entry at the end.
    Append,
    /// Remove the entry at `index`.
    Remove { index: usize },
    /// Set one field of the entry at `index` from its text value.
    Set {
        index: usize,
        field: IngredientField,
        value: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Zutat an Position {index} existiert nicht (die Liste hat {len} Einträge)")]
    OutOfRange { index: usize, len: usize },
}

impl From<EditError> for AppError {
    fn from(err: EditError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Ordered ingredient drafts of one recipe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientList {
    items: Vec<IngredientDraft>,
}

impl IngredientList {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding a single blank entry, the starting state of a new recipe.
    pub fn with_blank() -> Self {
        let mut list = Self::new();
        list.push_blank();
        list
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[IngredientDraft] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<IngredientDraft> {
        self.items
    }

    /// Append a blank entry and return its position.
    pub fn push_blank(&mut self) -> usize {
        self.items.push(IngredientDraft::default());
        self.items.len() - 1
    }

    /// Remove the entry at `index`; later entries shift down by one.
    pub fn remove(&mut self, index: usize) -> Result<IngredientDraft, EditError> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Set one field of the entry at `index` from form text.
    pub fn set_field(
        &mut self,
        index: usize,
        field: IngredientField,
        value: &str,
    ) -> Result<(), EditError> {
        self.check_index(index)?;
        let draft = &mut self.items[index];
        match field {
            IngredientField::Name => draft.name = value.to_string(),
            IngredientField::Quantity => draft.quantity = coerce_quantity(value),
            IngredientField::Unit => draft.unit = value.to_string(),
            IngredientField::AdditionalInfo => {
                draft.additional_info = (!value.is_empty()).then(|| value.to_string());
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, edit: IngredientEdit) -> Result<(), EditError> {
        match edit {
            IngredientEdit::Append => {
                self.push_blank();
            }
            IngredientEdit::Remove { index } => {
                self.remove(index)?;
            }
            IngredientEdit::Set {
                index,
                field,
                value,
            } => self.set_field(index, field, &value)?,
        }
        Ok(())
    }

    /// Apply edits in order, stopping at the first invalid one.
    pub fn apply_all(
        &mut self,
        edits: impl IntoIterator<Item = IngredientEdit>,
    ) -> Result<(), EditError> {
        edits.into_iter().try_for_each(|edit| self.apply(edit))
    }

    fn check_index(&self, index: usize) -> Result<(), EditError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(EditError::OutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }
}

impl From<Vec<IngredientDraft>> for IngredientList {
    fn from(items: Vec<IngredientDraft>) -> Self {
        Self { items }
    }
}

/// Coerce quantity text to a number.
///
/// Uses the longest numeric prefix (`"2 Tassen"` is 2), accepts a comma as
/// decimal separator (`"1,5"` is 1.5), and yields 0 when no number can be read.
pub fn coerce_quantity(raw: &str) -> f64 {
    let normalized = raw.trim().replacen(',', ".", 1);
    let len = numeric_prefix_len(&normalized);
    normalized[..len]
        .parse::<f64>()
        .ok()
        .filter(|q| q.is_finite())
        .unwrap_or(0.0)
}

fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_end = digits_from(i);
    let mut digit_count = int_end - i;
    i = int_end;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_end = digits_from(i + 1);
        if digit_count > 0 || frac_end > i + 1 {
            digit_count += frac_end - (i + 1);
            i = frac_end;
        }
    }

    if digit_count == 0 {
        return 0;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            i = exp_end;
        }
    }

    i
}
