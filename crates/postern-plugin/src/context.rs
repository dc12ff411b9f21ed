//! Post context passed to inspectors and raw injectors.

use std::fmt;

/// Everything a plugin may know about the post it is rendering into.
///
/// Produced by the host's social-network adapter; plugins treat it as
/// read-only. The permalink is optional because some hosts render posts
/// whose identity is not resolvable (e.g. previews).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContext {
    post_id: String,
    author: Option<String>,
    permalink: Option<String>,
}

impl PostContext {
    /// Create a context for a post with a known identifier.
    #[must_use]
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            author: None,
            permalink: None,
        }
    }

    /// Attach the author handle.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Attach the post permalink.
    #[must_use]
    pub fn with_permalink(mut self, permalink: impl Into<String>) -> Self {
        self.permalink = Some(permalink.into());
        self
    }

    #[must_use]
    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    #[must_use]
    pub fn permalink(&self) -> Option<&str> {
        self.permalink.as_deref()
    }
}

impl fmt::Display for PostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.author {
            Some(author) => write!(f, "post:{} by {author}", self.post_id),
            None => write!(f, "post:{}", self.post_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builders() {
        let ctx = PostContext::new("p-1")
            .with_author("alice")
            .with_permalink("https://example.com/p/1");
        assert_eq!(ctx.post_id(), "p-1");
        assert_eq!(ctx.author(), Some("alice"));
        assert_eq!(ctx.permalink(), Some("https://example.com/p/1"));
    }

    #[test]
    fn test_context_display() {
        let ctx = PostContext::new("p-2").with_author("bob");
        assert_eq!(ctx.to_string(), "post:p-2 by bob");
        assert_eq!(PostContext::new("p-3").to_string(), "post:p-3");
    }
}
