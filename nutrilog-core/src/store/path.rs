//! Slash-separated paths into the store tree.

use std::fmt;
use std::str::FromStr;

use super::error::StoreError;

/// Characters never allowed inside a path segment.
const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']', '/', '\\'];

/// A validated location in the store tree, e.g. `perfiles/u1`.
///
/// The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `a/b/c`. Leading, trailing and repeated slashes are ignored.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let mut segments = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            validate_segment(path, segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Builds a path from individual segments, validating each.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = Self::root();
        for segment in segments {
            path = path.child(segment.as_ref())?;
        }
        Ok(path)
    }

    /// Appends one segment.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        validate_segment(segment, segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Appends a relative, possibly multi-segment path such as `likes/u1`.
    pub fn join(&self, relative: &str) -> Result<Self, StoreError> {
        let rel = Self::parse(relative)?;
        let mut segments = self.segments.clone();
        segments.extend(rel.segments);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// True when `self` equals `other` or lies above it.
    pub fn contains(&self, other: &DbPath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True when a write at one path can change the value at the other.
    pub fn overlaps(&self, other: &DbPath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

fn validate_segment(path: &str, segment: &str) -> Result<(), StoreError> {
    if segment.is_empty() {
        return Err(StoreError::invalid_path(path, "empty segment"));
    }
    if segment == ".." {
        return Err(StoreError::invalid_path(path, "parent reference"));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| FORBIDDEN.contains(c) || c.is_control())
    {
        return Err(StoreError::invalid_path(
            path,
            format!("forbidden character {:?} in segment '{}'", c, segment),
        ));
    }
    Ok(())
}

impl fmt::Display for DbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for DbPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = DbPath::parse("/registros_diarios/u1/20250101/").unwrap();
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.to_string(), "registros_diarios/u1/20250101");
        assert_eq!(path.last(), Some("20250101"));
    }

    #[test]
    fn test_root() {
        let root = DbPath::parse("").unwrap();
        assert!(root.is_root());
        assert_eq!(root.parent(), None);
        assert_eq!(root.to_string(), "");
    }

    #[test]
    fn test_invalid_segments() {
        assert!(DbPath::parse("a/../b").is_err());
        assert!(DbPath::parse("a/b.c").is_err());
        assert!(DbPath::parse("a/$key").is_err());
        assert!(DbPath::parse("a/[0]").is_err());
        assert!(DbPath::root().child("x/y").is_err());
        assert!(DbPath::root().child("").is_err());
    }

    #[test]
    fn test_join_and_parent() {
        let base = DbPath::parse("publicaciones/t1/p1").unwrap();
        let like = base.join("likes/u2").unwrap();
        assert_eq!(like.to_string(), "publicaciones/t1/p1/likes/u2");
        assert_eq!(like.parent().unwrap().to_string(), "publicaciones/t1/p1/likes");
    }

    #[test]
    fn test_overlaps() {
        let a = DbPath::parse("a/b").unwrap();
        let ab_c = DbPath::parse("a/b/c").unwrap();
        let a_x = DbPath::parse("a/x").unwrap();

        assert!(a.contains(&ab_c));
        assert!(!ab_c.contains(&a));
        assert!(a.overlaps(&ab_c));
        assert!(ab_c.overlaps(&a));
        assert!(!a_x.overlaps(&ab_c));
        assert!(DbPath::root().overlaps(&a_x));
    }
}
