//! Blog post records and the lookup that decides what a post route shows.
//!
//! The viewport controller only ever consumes `BlogPost::content`, the
//! rendered body markup. Everything else here is what the post view needs
//! to frame it: title, date line, tag chip.

use crate::error::PostError;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostTag {
    Tech,
    Life,
    Other,
}

impl PostTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostTag::Tech => "Tech",
            PostTag::Life => "Life",
            PostTag::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    /// ISO date (`2025-01-05`) or RFC 3339 timestamp.
    pub date: String,
    /// Rendered body markup, diagram placeholders included.
    pub content: String,
    pub description: String,
    pub tag: PostTag,
    #[serde(default)]
    pub is_new: bool,
}

impl BlogPost {
    /// The date line shown under the title.
    pub fn display_date(&self) -> String {
        format_date(&self.date)
    }
}

/// Anything that can look a post up by slug.
pub trait PostSource {
    /// `Ok(None)` means the slug is unknown; `Err` means the source failed.
    fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, PostError>;
}

/// In-memory post collection.
#[derive(Debug, Clone, Default)]
pub struct StaticPosts {
    posts: Vec<BlogPost>,
}

impl StaticPosts {
    pub fn new(posts: Vec<BlogPost>) -> Self {
        Self { posts }
    }

    /// Load from a JSON array of post records.
    pub fn from_json(json: &str) -> Result<Self, PostError> {
        let posts: Vec<BlogPost> = serde_json::from_str(json)?;
        Ok(Self::new(posts))
    }

    /// Posts newest first, for the blog index.
    pub fn newest_first(&self) -> Vec<&BlogPost> {
        let mut posts: Vec<&BlogPost> = self.posts.iter().collect();
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl PostSource for StaticPosts {
    fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, PostError> {
        Ok(self.posts.iter().find(|p| p.slug == slug).cloned())
    }
}

/// What a post route should display.
#[derive(Debug, Clone, PartialEq)]
pub enum PostRoute {
    Show(BlogPost),
    /// Missing slug, unknown slug, or a failing source: go back to the index.
    RedirectToIndex,
}

pub fn resolve_post(slug: Option<&str>, source: &impl PostSource) -> PostRoute {
    let Some(slug) = slug.filter(|s| !s.is_empty()) else {
        return PostRoute::RedirectToIndex;
    };
    match source.post_by_slug(slug) {
        Ok(Some(post)) => PostRoute::Show(post),
        Ok(None) => {
            log::debug!("no post for slug {slug:?}");
            PostRoute::RedirectToIndex
        }
        Err(err) => {
            log::error!("error loading post {slug:?}: {err}");
            PostRoute::RedirectToIndex
        }
    }
}

/// Render a post date as `January 5, 2025`.
/// Input that is neither an ISO date nor RFC 3339 comes back unchanged.
pub fn format_date(date: &str) -> String {
    let trimmed = date.trim();
    let parsed = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()));
    match parsed {
        Some(day) => day.format("%B %-d, %Y").to_string(),
        None => date.to_string(),
    }
}
