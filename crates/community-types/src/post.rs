use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Author;

/// A post as returned by the list and detail endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(alias = "postId")]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// Markdown body. List responses may omit it.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Whether the current user liked the post (detail only).
    #[serde(default)]
    pub liked: bool,
    #[serde(default, alias = "tagNames")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_image_url: Option<String>,
}

/// Create/update body for posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    pub title: String,
    pub content: String,
    pub tag_names: Vec<String>,
}

/// Like state echoed by the like/unlike endpoints. Either field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    #[serde(default)]
    pub liked: Option<bool>,
    #[serde(default)]
    pub like_count: Option<u64>,
}

impl Post {
    /// Flips `liked` and adjusts `like_count`, never going below zero.
    pub fn toggle_like(&mut self) {
        self.liked = !self.liked;
        self.like_count = if self.liked {
            self.like_count.saturating_add(1)
        } else {
            self.like_count.saturating_sub(1)
        };
    }

    /// Applies the server's view of the like state.
    pub fn apply_like_status(&mut self, status: LikeStatus) {
        if let Some(liked) = status.liked {
            self.liked = liked;
        }
        if let Some(count) = status.like_count {
            self.like_count = count;
        }
    }
}

/// Ordering accepted by `GET /api/posts`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostSort {
    /// Newest first
    #[default]
    #[serde(rename = "NEW")]
    New,
    /// Most viewed
    #[serde(rename = "VIEW")]
    Views,
    /// Most liked
    #[serde(rename = "LIKE")]
    Likes,
    /// Most commented
    #[serde(rename = "CMT")]
    Comments,
}

impl PostSort {
    /// Value sent in the `sort` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            PostSort::New => "NEW",
            PostSort::Views => "VIEW",
            PostSort::Likes => "LIKE",
            PostSort::Comments => "CMT",
        }
    }
}

impl fmt::Display for PostSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for PostSort {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "new" | "latest" => Ok(Self::New),
            "view" | "views" => Ok(Self::Views),
            "like" | "likes" => Ok(Self::Likes),
            "cmt" | "comments" => Ok(Self::Comments),
            _ => Err(format!(
                "Unknown sort order: {value} (expected new, views, likes or comments)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_post_from_list_item() {
        let post: Post = serde_json::from_value(json!({
            "postId": 12,
            "title": "hello",
            "author": { "userId": 3, "nickname": "alice" },
            "likeCount": 4,
            "viewCount": 10,
            "commentCount": 1,
            "createdAt": "2025-01-02T03:04:05",
            "tags": ["#Rust"]
        }))
        .unwrap();
        assert_eq!(post.id, 12);
        assert_eq!(post.author.as_ref().map(|a| a.id), Some(3));
        assert!(!post.liked);
        assert!(post.content.is_empty());
        assert_eq!(post.tags, vec!["#Rust".to_string()]);
    }

    #[test]
    fn test_toggle_like_saturates() {
        let mut post = Post::default();
        post.toggle_like();
        assert!(post.liked);
        assert_eq!(post.like_count, 1);
        post.toggle_like();
        assert!(!post.liked);
        assert_eq!(post.like_count, 0);

        post.liked = true;
        post.toggle_like();
        assert_eq!(post.like_count, 0);
    }

    #[test]
    fn test_apply_like_status_keeps_missing_fields() {
        let mut post = Post {
            liked: true,
            like_count: 7,
            ..Post::default()
        };
        post.apply_like_status(LikeStatus {
            liked: None,
            like_count: Some(9),
        });
        assert!(post.liked);
        assert_eq!(post.like_count, 9);
    }

    #[test]
    fn test_sort_parse_and_param() {
        assert_eq!("likes".parse::<PostSort>().unwrap(), PostSort::Likes);
        assert_eq!("CMT".parse::<PostSort>().unwrap(), PostSort::Comments);
        assert_eq!(PostSort::Views.as_param(), "VIEW");
        assert!("random".parse::<PostSort>().is_err());
    }
}
