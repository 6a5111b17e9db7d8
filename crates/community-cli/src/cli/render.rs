//! Plain-text rendering of posts, comments and users.

use community_core::format::{format_count, format_datetime};
use community_types::{Author, Comment, Page, Post, User};

fn author_name(author: Option<&Author>) -> &str {
    author
        .map(|a| a.nickname.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("(unknown)")
}

/// One line per post, for listings.
pub fn post_line(post: &Post) -> String {
    format!(
        "#{id}  {title}  [likes {likes} · comments {comments} · views {views}]  {author}  {date}",
        id = post.id,
        title = post.title,
        likes = format_count(post.like_count),
        comments = format_count(post.comment_count),
        views = format_count(post.view_count),
        author = author_name(post.author.as_ref()),
        date = format_datetime(post.created_at.as_deref()),
    )
}

pub fn post_detail(post: &Post) -> String {
    let mut out = format!("#{} {}\n", post.id, post.title);
    out.push_str(&format!(
        "by {}  {}\n",
        author_name(post.author.as_ref()),
        format_datetime(post.created_at.as_deref())
    ));
    if !post.tags.is_empty() {
        out.push_str(&format!("tags: {}\n", post.tags.join(", ")));
    }
    if let Some(image) = &post.post_image_url {
        out.push_str(&format!("image: {image}\n"));
    }
    out.push('\n');
    out.push_str(post.content.trim_end());
    out.push_str("\n\n");
    out.push_str(&format!(
        "{} likes{} · {} comments · {} views",
        format_count(post.like_count),
        if post.liked { " (liked)" } else { "" },
        format_count(post.comment_count),
        format_count(post.view_count),
    ));
    out
}

pub fn comment_line(comment: &Comment) -> String {
    format!(
        "[{id}] {author} ({date}): {content}",
        id = comment.id,
        author = author_name(comment.author.as_ref()),
        date = format_datetime(comment.created_at.as_deref()),
        content = comment.content,
    )
}

/// Comment lines plus a `page x/y` footer.
pub fn comment_page(page: &Page<Comment>, requested: u32) -> String {
    if page.content.is_empty() {
        return "No comments yet.".to_string();
    }
    let mut lines: Vec<String> = page.content.iter().map(comment_line).collect();
    lines.push(format!(
        "page {}/{}",
        page.page.unwrap_or(requested),
        page.total_pages()
    ));
    lines.join("\n")
}

pub fn user(user: &User) -> String {
    let mut out = format!("{} <{}> (id {})", user.nickname, user.email, user.id);
    if let Some(image) = &user.profile_image_url {
        out.push_str(&format!("\nprofile image: {image}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post {
            id: 3,
            title: "Hello".into(),
            content: "Body text\n".into(),
            author: Some(Author {
                id: 1,
                nickname: "alice".into(),
                profile_image_url: None,
            }),
            like_count: 1_500,
            comment_count: 2,
            view_count: 12_000,
            liked: true,
            ..Post::default()
        }
    }

    #[test]
    fn test_post_line_abbreviates_counts() {
        let line = post_line(&post());
        assert!(line.starts_with("#3  Hello"));
        assert!(line.contains("likes 1k"));
        assert!(line.contains("views 10k"));
        assert!(line.contains("alice"));
    }

    #[test]
    fn test_post_detail_marks_liked() {
        let detail = post_detail(&post());
        assert!(detail.contains("Body text"));
        assert!(detail.contains("1k likes (liked)"));
    }

    #[test]
    fn test_comment_page_footer() {
        let page = Page {
            content: vec![Comment {
                id: 9,
                content: "nice".into(),
                ..Comment::default()
            }],
            page: Some(2),
            total_pages: Some(4),
        };
        let text = comment_page(&page, 2);
        assert!(text.contains("[9] (unknown)"));
        assert!(text.ends_with("page 2/4"));
        assert_eq!(comment_page(&Page::default(), 1), "No comments yet.");
    }
}
