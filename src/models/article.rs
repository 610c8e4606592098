//! Knowledge-hub article models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A knowledge-hub article. List responses omit `body`; the single-article
/// endpoint includes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}
