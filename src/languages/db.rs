//! Store operations for the language reference table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::ApiError;

/// A language users can speak or learn. Reference data, seeded once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: String,
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub flag: String,
    pub popularity: i64,
    pub created_at: DateTime<Utc>,
}

fn map_language(row: &sqlx::sqlite::SqliteRow) -> Language {
    Language {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        native_name: row.get("native_name"),
        flag: row.get("flag"),
        popularity: row.get("popularity"),
        created_at: row.get("created_at"),
    }
}

const LANGUAGE_COLUMNS: &str = "id, code, name, native_name, flag, popularity, created_at";

/// All languages, name-sorted.
pub async fn list_languages(pool: &SqlitePool) -> Result<Vec<Language>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {LANGUAGE_COLUMNS} FROM languages ORDER BY name ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_language).collect())
}

pub async fn get_language(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<Language>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {LANGUAGE_COLUMNS} FROM languages WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_language))
}

/// Fetch several languages at once, preserving the requested order.
pub async fn get_languages_by_ids(
    pool: &SqlitePool,
    ids: &[String],
) -> Result<Vec<Language>, sqlx::Error> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(lang) = get_language(pool, id).await? {
            out.push(lang);
        }
    }
    Ok(out)
}

pub async fn create_language(
    pool: &SqlitePool,
    code: &str,
    name: &str,
    native_name: &str,
    flag: &str,
    popularity: i64,
) -> Result<Language, ApiError> {
    if code.len() < 2 || code.len() > 3 {
        return Err(ApiError::validation(
            "Language code must be 2 to 3 characters (ISO 639)",
        ));
    }

    let language = Language {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        name: name.to_string(),
        native_name: native_name.to_string(),
        flag: flag.to_string(),
        popularity,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO languages (id, code, name, native_name, flag, popularity, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&language.id)
    .bind(&language.code)
    .bind(&language.name)
    .bind(&language.native_name)
    .bind(&language.flag)
    .bind(language.popularity)
    .bind(language.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if crate::error::types::is_unique_violation(&e) {
            ApiError::conflict("A language with that code or name already exists")
        } else {
            ApiError::from(e)
        }
    })?;

    Ok(language)
}

pub async fn update_language(
    pool: &SqlitePool,
    id: &str,
    name: Option<&str>,
    native_name: Option<&str>,
    flag: Option<&str>,
    popularity: Option<i64>,
) -> Result<Option<Language>, sqlx::Error> {
    let Some(current) = get_language(pool, id).await? else {
        return Ok(None);
    };

    let name = name.unwrap_or(&current.name);
    let native_name = native_name.unwrap_or(&current.native_name);
    let flag = flag.unwrap_or(&current.flag);
    let popularity = popularity.unwrap_or(current.popularity);

    sqlx::query(
        "UPDATE languages SET name = ?, native_name = ?, flag = ?, popularity = ? WHERE id = ?",
    )
    .bind(name)
    .bind(native_name)
    .bind(flag)
    .bind(popularity)
    .bind(id)
    .execute(pool)
    .await?;

    get_language(pool, id).await
}

/// Hard delete. Returns false when the id did not exist.
pub async fn delete_language(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM languages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_languages(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM languages")
        .fetch_one(pool)
        .await?;
    Ok(row.get("n"))
}
