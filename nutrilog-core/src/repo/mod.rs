//! Typed repositories over the store tree.
//!
//! Each repository owns a shared [`RemoteStore`] handle and turns typed calls
//! into reads and writes at the paths in [`crate::paths`]. None of them keep
//! state of their own, so they are cheap to clone and share.

mod exercise;
mod food;
mod meal;
mod profile;
mod progress;
mod recipe;
mod rollup;
mod team;
mod water;

pub use exercise::ExerciseRepository;
pub use food::FoodRepository;
pub use meal::MealRepository;
pub use profile::ProfileRepository;
pub use progress::ProgressRepository;
pub use recipe::RecipeRepository;
pub use rollup::{RefreshReport, RollupRepository};
pub use team::TeamRepository;
pub use water::WaterRepository;

use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Comment, ExerciseLog, MealLog, Post, Team};
use crate::openfoodfacts::OpenFoodFactsError;
use crate::store::{RemoteStore, StoreError};

pub type SharedStore = Arc<dyn RemoteStore>;

pub type RepoStream<T> = BoxStream<'static, Result<T, RepoError>>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error(transparent)]
    Lookup(#[from] OpenFoodFactsError),
}

impl From<serde_json::Error> for RepoError {
    fn from(e: serde_json::Error) -> Self {
        RepoError::Store(StoreError::Serialization(e))
    }
}

/// Records whose id is the store key they were pushed under.
pub(crate) trait Keyed {
    fn set_key(&mut self, key: String);
}

impl Keyed for MealLog {
    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

impl Keyed for ExerciseLog {
    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

impl Keyed for Post {
    fn set_key(&mut self, key: String) {
        self.id = key;
        for (id, comment) in self.comments.iter_mut() {
            comment.id = id.clone();
        }
    }
}

impl Keyed for Team {
    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

impl Keyed for Comment {
    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

/// Copies each key into its record, keeping key order.
pub(crate) fn with_keys<T: Keyed>(items: Vec<(String, T)>) -> Vec<T> {
    items
        .into_iter()
        .map(|(key, mut item)| {
            item.set_key(key);
            item
        })
        .collect()
}

/// Decodes the children of a snapshot value, skipping malformed ones.
pub(crate) fn decode_keyed<T: DeserializeOwned + Keyed>(value: Option<Value>) -> Vec<T> {
    let Some(Value::Object(children)) = value else {
        return Vec::new();
    };
    let items = children
        .into_iter()
        .filter_map(|(key, v)| match serde_json::from_value::<T>(v) {
            Ok(item) => Some((key, item)),
            Err(e) => {
                tracing::warn!("Skipping malformed record {}: {}", key, e);
                None
            }
        })
        .collect();
    with_keys(items)
}

pub(crate) fn require(condition: bool, message: impl Into<String>) -> Result<(), RepoError> {
    if condition {
        Ok(())
    } else {
        Err(RepoError::Invalid(message.into()))
    }
}
