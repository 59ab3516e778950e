use serde::{Deserialize, Serialize};

/// Generic `{"message": ...}` body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Pagination {
    /// Negative values are clamped to zero.
    pub fn bounds(&self) -> (i64, i64) {
        (self.skip.max(0), self.limit.max(0))
    }
}
