//! Operations on the JSON tree that backs the in-process stores.
//!
//! The tree never contains `null` or empty objects: writing `null` deletes a
//! node, and parents left empty by a delete are pruned.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;

use super::path::DbPath;

pub fn get_at<'a>(root: &'a Value, path: &DbPath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Writes `value` at `path`, creating intermediate objects as needed.
///
/// Non-object intermediates are replaced. `null` removes the node.
pub fn set_at(root: &mut Value, path: &DbPath, value: Value) {
    let value = normalize(value);
    if value.is_null() {
        remove_at(root, path.segments());
        return;
    }

    let mut node = root;
    for segment in path.segments() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node.as_object_mut() {
            Some(map) => map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            None => return,
        };
    }
    *node = value;
}

/// Removes the node at `segments` and prunes parents that become empty.
fn remove_at(node: &mut Value, segments: &[String]) {
    let Some((first, rest)) = segments.split_first() else {
        *node = Value::Object(Map::new());
        return;
    };
    let Value::Object(map) = node else { return };
    if rest.is_empty() {
        map.remove(first);
        return;
    }
    if let Some(child) = map.get_mut(first) {
        remove_at(child, rest);
        if child.as_object().is_some_and(Map::is_empty) {
            map.remove(first);
        }
    }
}

/// Drops nulls and empty objects, recursively.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// Content hash used for conditional writes. Absent values hash as `null`.
pub fn etag(value: Option<&Value>) -> String {
    let canonical = match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    };
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// How children are ordered before bounds and limits apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OrderBy {
    #[default]
    Key,
    Child(String),
}

/// Filter over the direct children of a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub order_by: OrderBy,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub limit_to_first: Option<usize>,
}

impl Query {
    pub fn by_key() -> Self {
        Self::default()
    }

    pub fn by_child(child: impl Into<String>) -> Self {
        Self {
            order_by: OrderBy::Child(child.into()),
            ..Self::default()
        }
    }

    pub fn start_at(mut self, bound: impl Into<String>) -> Self {
        self.start_at = Some(bound.into());
        self
    }

    pub fn end_at(mut self, bound: impl Into<String>) -> Self {
        self.end_at = Some(bound.into());
        self
    }

    /// Children whose ordering value starts with `prefix`.
    pub fn prefix(self, prefix: &str) -> Self {
        let end = format!("{}\u{f8ff}", prefix);
        self.start_at(prefix).end_at(end)
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit_to_first = Some(n);
        self
    }

    /// Query-string pairs in the server's REST dialect.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![(
            "orderBy",
            match &self.order_by {
                OrderBy::Key => "$key".to_string(),
                OrderBy::Child(c) => c.clone(),
            },
        )];
        if let Some(s) = &self.start_at {
            params.push(("startAt", s.clone()));
        }
        if let Some(e) = &self.end_at {
            params.push(("endAt", e.clone()));
        }
        if let Some(n) = self.limit_to_first {
            params.push(("limitToFirst", n.to_string()));
        }
        params
    }

    /// Inverse of [`Query::to_params`].
    pub fn from_params<'a, I>(params: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = None::<Query>;
        let mut start_at = None;
        let mut end_at = None;
        let mut limit = None;
        for (key, value) in params {
            match key {
                "orderBy" => {
                    query = Some(if value == "$key" {
                        Query::by_key()
                    } else {
                        Query::by_child(value)
                    })
                }
                "startAt" => start_at = Some(value.to_string()),
                "endAt" => end_at = Some(value.to_string()),
                "limitToFirst" => limit = value.parse().ok(),
                _ => {}
            }
        }
        let mut query = query?;
        query.start_at = start_at;
        query.end_at = end_at;
        query.limit_to_first = limit;
        Some(query)
    }

    /// Applies ordering, bounds and limit to the children of `node`.
    pub fn apply(&self, node: Option<&Value>) -> Vec<(String, Value)> {
        let Some(Value::Object(children)) = node else {
            return Vec::new();
        };

        let mut keyed: Vec<(SortKey, &String, &Value)> = children
            .iter()
            .filter_map(|(k, v)| {
                let sort = match &self.order_by {
                    OrderBy::Key => SortKey::Str(k.clone()),
                    OrderBy::Child(c) => SortKey::of(v.get(c)?)?,
                };
                Some((sort, k, v))
            })
            .filter(|(sort, _, _)| {
                self.start_at
                    .as_deref()
                    .map_or(true, |b| sort.cmp_bound(b) != Ordering::Less)
                    && self
                        .end_at
                        .as_deref()
                        .map_or(true, |b| sort.cmp_bound(b) != Ordering::Greater)
            })
            .collect();

        keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        let limit = self.limit_to_first.unwrap_or(usize::MAX);
        keyed
            .into_iter()
            .take(limit)
            .map(|(_, k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Ordering value of a child: numbers sort before strings.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Bool(bool),
    Number(f64),
    Str(String),
}

impl SortKey {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(SortKey::Bool(*b)),
            Value::Number(n) => n.as_f64().map(SortKey::Number),
            Value::String(s) => Some(SortKey::Str(s.clone())),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Bool(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Str(_) => 2,
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Str(a), SortKey::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Compares against a textual bound, numerically when both sides are numbers.
    fn cmp_bound(&self, bound: &str) -> Ordering {
        match self {
            SortKey::Number(n) => match bound.parse::<f64>() {
                Ok(b) => n.total_cmp(&b),
                Err(_) => Ordering::Less,
            },
            SortKey::Str(s) => s.as_str().cmp(bound),
            SortKey::Bool(b) => b.to_string().as_str().cmp(bound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> DbPath {
        DbPath::parse(s).unwrap()
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut root = json!({});
        set_at(&mut root, &path("a/b/c"), json!(1));
        assert_eq!(root, json!({"a": {"b": {"c": 1}}}));
        assert_eq!(get_at(&root, &path("a/b")), Some(&json!({"c": 1})));
        assert_eq!(get_at(&root, &path("a/x")), None);
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut root = json!({"a": 5});
        set_at(&mut root, &path("a/b"), json!("x"));
        assert_eq!(root, json!({"a": {"b": "x"}}));
    }

    #[test]
    fn test_null_deletes_and_prunes() {
        let mut root = json!({"a": {"b": {"c": 1}}, "z": true});
        set_at(&mut root, &path("a/b/c"), Value::Null);
        assert_eq!(root, json!({"z": true}));
    }

    #[test]
    fn test_set_root() {
        let mut root = json!({"a": 1});
        set_at(&mut root, &DbPath::root(), json!({"b": 2}));
        assert_eq!(root, json!({"b": 2}));
        set_at(&mut root, &DbPath::root(), Value::Null);
        assert_eq!(root, json!({}));
    }

    #[test]
    fn test_normalize_drops_empty() {
        let value = json!({"a": null, "b": {}, "c": {"d": null}, "e": [1, null]});
        assert_eq!(normalize(value), json!({"e": [1, null]}));
    }

    #[test]
    fn test_etag_changes_with_value() {
        let a = json!({"x": 1});
        let b = json!({"x": 2});
        assert_eq!(etag(Some(&a)), etag(Some(&a.clone())));
        assert_ne!(etag(Some(&a)), etag(Some(&b)));
        assert_ne!(etag(Some(&a)), etag(None));
    }

    #[test]
    fn test_query_by_child_prefix() {
        let foods = json!({
            "f1": {"search_name": "apple"},
            "f2": {"search_name": "banana"},
            "f3": {"search_name": "apricot"},
            "f4": {"name": "no search name"},
        });
        let hits = Query::by_child("search_name").prefix("ap").apply(Some(&foods));
        let keys: Vec<&str> = hits.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["f1", "f3"]);
    }

    #[test]
    fn test_query_by_key_with_bounds_and_limit() {
        let days = json!({
            "20250101": 1, "20250102": 2, "20250103": 3, "20250104": 4,
        });
        let hits = Query::by_key()
            .start_at("20250102")
            .end_at("20250104")
            .limit(2)
            .apply(Some(&days));
        let keys: Vec<&str> = hits.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["20250102", "20250103"]);
    }

    #[test]
    fn test_query_numeric_child() {
        let items = json!({
            "a": {"kcal": 250}, "b": {"kcal": 90}, "c": {"kcal": 1000},
        });
        let hits = Query::by_child("kcal").start_at("100").apply(Some(&items));
        let keys: Vec<&str> = hits.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_query_by_child_skips_unsortable_values() {
        let items = json!({
            "a": {"kcal": 250}, "b": {"kcal": null}, "c": {"kcal": [1]}, "d": {"other": 1},
        });
        let hits = Query::by_child("kcal").apply(Some(&items));
        let keys: Vec<&str> = hits.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn test_query_params_roundtrip() {
        let query = Query::by_child("search_name").prefix("oat").limit(5);
        let params = query.to_params();
        let parsed =
            Query::from_params(params.iter().map(|(k, v)| (*k, v.as_str()))).unwrap();
        assert_eq!(parsed, query);
    }

    #[test]
    fn test_query_on_missing_node() {
        assert!(Query::by_key().apply(None).is_empty());
        assert!(Query::by_key().apply(Some(&json!(3))).is_empty());
    }
}
