//! Where each record lives in the store tree.
//!
//! Collection names are part of the stored data layout and must not change.

use chrono::NaiveDate;

use crate::models::date_key;
use crate::store::{DbPath, StoreError};

pub const PROFILES: &str = "perfiles";
pub const FOODS: &str = "alimentos";
pub const CUSTOM_FOODS: &str = "alimentos_personalizados";
pub const MEAL_LOGS: &str = "registros_comidas";
pub const EXERCISES: &str = "ejercicios";
pub const EXERCISE_LOGS: &str = "registros_ejercicio";
pub const WATER_LOGS: &str = "registros_agua";
pub const PROGRESS: &str = "progreso";
pub const RECIPES: &str = "recetas";
pub const RECIPE_CATALOG: &str = "recetas_catalogo";
pub const DAILY_ROLLUPS: &str = "registros_diarios";
pub const TEAMS: &str = "equipos";
pub const POSTS: &str = "publicaciones";

/// Collections whose second segment is the owning user's id.
pub const USER_SCOPED: &[&str] = &[
    PROFILES,
    CUSTOM_FOODS,
    MEAL_LOGS,
    EXERCISE_LOGS,
    WATER_LOGS,
    PROGRESS,
    RECIPES,
    DAILY_ROLLUPS,
];

fn path(segments: &[&str]) -> Result<DbPath, StoreError> {
    DbPath::from_segments(segments)
}

pub fn profile(uid: &str) -> Result<DbPath, StoreError> {
    path(&[PROFILES, uid])
}

pub fn foods() -> Result<DbPath, StoreError> {
    path(&[FOODS])
}

pub fn food(id: &str) -> Result<DbPath, StoreError> {
    path(&[FOODS, id])
}

pub fn custom_foods(uid: &str) -> Result<DbPath, StoreError> {
    path(&[CUSTOM_FOODS, uid])
}

pub fn custom_food(uid: &str, id: &str) -> Result<DbPath, StoreError> {
    path(&[CUSTOM_FOODS, uid, id])
}

/// All meal-log days of a user.
pub fn meal_days(uid: &str) -> Result<DbPath, StoreError> {
    path(&[MEAL_LOGS, uid])
}

pub fn meal_logs(uid: &str, date: NaiveDate) -> Result<DbPath, StoreError> {
    path(&[MEAL_LOGS, uid, &date_key(date)])
}

pub fn meal_log(uid: &str, date: NaiveDate, log_id: &str) -> Result<DbPath, StoreError> {
    path(&[MEAL_LOGS, uid, &date_key(date), log_id])
}

pub fn exercises() -> Result<DbPath, StoreError> {
    path(&[EXERCISES])
}

pub fn exercise(id: &str) -> Result<DbPath, StoreError> {
    path(&[EXERCISES, id])
}

pub fn exercise_logs(uid: &str, date: NaiveDate) -> Result<DbPath, StoreError> {
    path(&[EXERCISE_LOGS, uid, &date_key(date)])
}

pub fn exercise_log(uid: &str, date: NaiveDate, log_id: &str) -> Result<DbPath, StoreError> {
    path(&[EXERCISE_LOGS, uid, &date_key(date), log_id])
}

pub fn water_log(uid: &str, date: NaiveDate) -> Result<DbPath, StoreError> {
    path(&[WATER_LOGS, uid, &date_key(date)])
}

pub fn progress_entries(uid: &str) -> Result<DbPath, StoreError> {
    path(&[PROGRESS, uid])
}

pub fn progress_entry(uid: &str, date: NaiveDate) -> Result<DbPath, StoreError> {
    path(&[PROGRESS, uid, &date_key(date)])
}

pub fn recipes(uid: &str) -> Result<DbPath, StoreError> {
    path(&[RECIPES, uid])
}

pub fn recipe(uid: &str, id: &str) -> Result<DbPath, StoreError> {
    path(&[RECIPES, uid, id])
}

pub fn recipe_catalog() -> Result<DbPath, StoreError> {
    path(&[RECIPE_CATALOG])
}

pub fn catalog_recipe(id: &str) -> Result<DbPath, StoreError> {
    path(&[RECIPE_CATALOG, id])
}

pub fn rollups(uid: &str) -> Result<DbPath, StoreError> {
    path(&[DAILY_ROLLUPS, uid])
}

pub fn rollup(uid: &str, date: NaiveDate) -> Result<DbPath, StoreError> {
    path(&[DAILY_ROLLUPS, uid, &date_key(date)])
}

pub fn teams() -> Result<DbPath, StoreError> {
    path(&[TEAMS])
}

pub fn team(team_id: &str) -> Result<DbPath, StoreError> {
    path(&[TEAMS, team_id])
}

pub fn team_member(team_id: &str, uid: &str) -> Result<DbPath, StoreError> {
    path(&[TEAMS, team_id, "members", uid])
}

pub fn posts(team_id: &str) -> Result<DbPath, StoreError> {
    path(&[POSTS, team_id])
}

pub fn post(team_id: &str, post_id: &str) -> Result<DbPath, StoreError> {
    path(&[POSTS, team_id, post_id])
}

pub fn post_likes(team_id: &str, post_id: &str) -> Result<DbPath, StoreError> {
    path(&[POSTS, team_id, post_id, "likes"])
}

pub fn post_comments(team_id: &str, post_id: &str) -> Result<DbPath, StoreError> {
    path(&[POSTS, team_id, post_id, "comments"])
}

/// The user a path belongs to, for user-scoped collections.
pub fn owner_of(path: &DbPath) -> Option<&str> {
    match path.segments() {
        [collection, uid, ..] if USER_SCOPED.contains(&collection.as_str()) => Some(uid.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dated_paths() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            meal_log("u1", date, "abc").unwrap().to_string(),
            "registros_comidas/u1/20250307/abc"
        );
        assert_eq!(
            rollup("u1", date).unwrap().to_string(),
            "registros_diarios/u1/20250307"
        );
        assert_eq!(
            water_log("u1", date).unwrap().to_string(),
            "registros_agua/u1/20250307"
        );
    }

    #[test]
    fn test_ids_are_validated() {
        assert!(profile("a/b").is_err());
        assert!(food("").is_err());
        assert!(post("t1", "p.1").is_err());
    }

    #[test]
    fn test_owner_of() {
        assert_eq!(owner_of(&profile("u1").unwrap()), Some("u1"));
        assert_eq!(owner_of(&recipes("u9").unwrap()), Some("u9"));
        assert_eq!(owner_of(&food("f1").unwrap()), None);
        assert_eq!(owner_of(&posts("t1").unwrap()), None);
        assert_eq!(owner_of(&DbPath::parse(PROFILES).unwrap()), None);
    }
}
