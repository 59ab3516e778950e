use serde::{Deserialize, Serialize};

use super::repo_types::Item;
use crate::error::AppError;
use crate::validation::{validate_description, validate_title};

#[derive(Debug, Clone, Deserialize)]
pub struct ItemCreate {
    pub title: String,
    pub description: Option<String>,
}

/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemsPublic {
    pub data: Vec<Item>,
    pub count: i64,
}

impl ItemCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())
    }
}

impl ItemUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = self.title.as_deref() {
            validate_title(title)?;
        }
        validate_description(self.description.as_deref())
    }

    pub fn apply(self, mut item: Item) -> Item {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(description) = self.description {
            item.description = Some(description);
        }
        item
    }
}
