//! Headless per-screen state.
//!
//! Each holder owns the values a screen shows, refreshes them through the
//! repositories and never returns repository errors: a failed call leaves the
//! previous values in place and stores the error message in `error`.

mod diary;
mod food_search;
mod progress;
mod recipes;
mod water;

pub use diary::DiaryState;
pub use food_search::FoodSearchState;
pub use progress::ProgressState;
pub use recipes::RecipeState;
pub use water::WaterState;

use std::fmt::Display;

/// Unwraps `result`, recording a failure in `error` and clearing it on success.
pub(crate) fn capture<T, E: Display>(
    error: &mut Option<String>,
    result: Result<T, E>,
) -> Option<T> {
    match result {
        Ok(value) => {
            *error = None;
            Some(value)
        }
        Err(e) => {
            tracing::warn!("{}", e);
            *error = Some(e.to_string());
            None
        }
    }
}
