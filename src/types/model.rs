//! Model catalog types.

use serde::{Deserialize, Serialize};

/// A model available for new conversations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}
