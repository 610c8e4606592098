//! User-related models

use serde::{Deserialize, Serialize};

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl User {
    /// Name to show in headers and prompts, falling back to email then id.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}
