use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A group of users sharing a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub owner: String,
    /// uid -> true
    #[serde(default)]
    pub members: BTreeMap<String, bool>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        let owner = owner.into();
        let mut members = BTreeMap::new();
        members.insert(owner.clone(), true);
        Self {
            id: String::new(),
            name: name.into(),
            owner,
            members,
            created_at: Utc::now(),
        }
    }

    pub fn is_member(&self, uid: &str) -> bool {
        self.members.get(uid).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            author_id: author_id.into(),
            author_name: author_name.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    /// uid -> true for every user that liked the post.
    #[serde(default)]
    pub likes: BTreeMap<String, bool>,
    /// comment id -> comment
    #[serde(default)]
    pub comments: BTreeMap<String, Comment>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            author_id: author_id.into(),
            author_name: author_name.into(),
            text: text.into(),
            likes: BTreeMap::new(),
            comments: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn like_count(&self) -> usize {
        self.likes.values().filter(|liked| **liked).count()
    }

    pub fn liked_by(&self, uid: &str) -> bool {
        self.likes.get(uid).copied().unwrap_or(false)
    }

    /// Comments oldest first.
    pub fn sorted_comments(&self) -> Vec<&Comment> {
        let mut comments: Vec<&Comment> = self.comments.values().collect();
        comments.sort_by_key(|c| c.created_at);
        comments
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} - {}",
            self.author_name,
            self.created_at.format("%Y-%m-%d %H:%M")
        )?;
        writeln!(f, "  {}", self.text)?;
        write!(
            f,
            "  {} like(s), {} comment(s)",
            self.like_count(),
            self.comments.len()
        )
    }
}
