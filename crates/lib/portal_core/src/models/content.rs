//! Article content models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::language::Language;

/// A published article as returned by the content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}
