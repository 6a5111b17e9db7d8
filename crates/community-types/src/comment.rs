use serde::{Deserialize, Serialize};

use crate::Author;

/// A comment on a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "commentId")]
    pub id: u64,
    #[serde(default)]
    pub post_id: u64,
    #[serde(default)]
    pub author_id: Option<u64>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Comment {
    /// Author id from either the flat field or the embedded author.
    pub fn author_id(&self) -> Option<u64> {
        self.author_id
            .or_else(|| self.author.as_ref().map(|author| author.id))
    }
}

/// Create/update body for comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentBody {
    pub content: String,
}
