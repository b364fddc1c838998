//! Store operations for users, language preferences, and connections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::languages::db::{self as languages_db, Language};

/// A user row, password hash included. Never serialized directly.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_picture: String,
    pub bio: Option<String>,
    pub interests: Vec<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub is_online: bool,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Self-assessed level for a learning language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Fluent,
}

impl Proficiency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Fluent => "fluent",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "intermediate" => Self::Intermediate,
            "advanced" => Self::Advanced,
            "fluent" => Self::Fluent,
            _ => Self::Beginner,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningLanguage {
    pub language: Language,
    pub proficiency: Proficiency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Public view of a user: profile fields plus populated language sets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile_picture: String,
    pub bio: Option<String>,
    pub interests: Vec<String>,
    pub location: Location,
    pub is_online: bool,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub native_languages: Vec<Language>,
    pub learning_languages: Vec<LearningLanguage>,
}

fn map_user(row: &sqlx::sqlite::SqliteRow) -> UserRecord {
    let interests: String = row.get("interests");
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        profile_picture: row.get("profile_picture"),
        bio: row.get("bio"),
        interests: serde_json::from_str(&interests).unwrap_or_default(),
        country: row.get("country"),
        city: row.get("city"),
        is_online: row.get("is_online"),
        last_active: row.get("last_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, profile_picture, bio, interests, \
     country, city, is_online, last_active, created_at, updated_at";

pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<UserRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, last_active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_user_by_id(pool, &id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn get_user_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(map_user))
}

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(map_user))
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(map_user).collect())
}

/// Partial profile update; `None` fields keep their current value.
pub struct DetailsUpdate<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub interests: Option<&'a [String]>,
    pub country: Option<&'a str>,
    pub city: Option<&'a str>,
}

pub async fn update_details(
    pool: &SqlitePool,
    id: &str,
    update: DetailsUpdate<'_>,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let Some(current) = get_user_by_id(pool, id).await? else {
        return Ok(None);
    };

    let interests_json = match update.interests {
        Some(list) => serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string()),
        None => serde_json::to_string(&current.interests).unwrap_or_else(|_| "[]".to_string()),
    };

    sqlx::query(
        "UPDATE users SET username = ?, email = ?, bio = ?, interests = ?, country = ?, city = ?,
         updated_at = ? WHERE id = ?",
    )
    .bind(update.username.unwrap_or(&current.username))
    .bind(update.email.unwrap_or(&current.email))
    .bind(update.bio.or(current.bio.as_deref()))
    .bind(interests_json)
    .bind(update.country.or(current.country.as_deref()))
    .bind(update.city.or(current.city.as_deref()))
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    get_user_by_id(pool, id).await
}

pub async fn update_password_hash(
    pool: &SqlitePool,
    id: &str,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_profile_picture(
    pool: &SqlitePool,
    id: &str,
    profile_picture: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query("UPDATE users SET profile_picture = ?, updated_at = ? WHERE id = ?")
        .bind(profile_picture)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    get_user_by_id(pool, id).await
}

pub async fn set_online(pool: &SqlitePool, id: &str, online: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_online = ?, last_active = ? WHERE id = ?")
        .bind(online)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn touch_last_active(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_active = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---- password reset ----

pub async fn set_reset_token(
    pool: &SqlitePool,
    id: &str,
    token_digest: &str,
    expires: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET reset_password_token = ?, reset_password_expires = ? WHERE id = ?")
        .bind(token_digest)
        .bind(expires)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Look up a user by an unexpired reset-token digest.
pub async fn find_by_reset_token(
    pool: &SqlitePool,
    token_digest: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE reset_password_token = ? AND reset_password_expires > ?"
    ))
    .bind(token_digest)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(map_user))
}

pub async fn clear_reset_token(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET reset_password_token = NULL, reset_password_expires = NULL WHERE id = ?",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

// ---- language preferences ----

pub async fn set_native_languages(
    pool: &SqlitePool,
    user_id: &str,
    language_ids: &[String],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_native_languages WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    for lang_id in language_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO user_native_languages (user_id, language_id) VALUES (?, ?)",
        )
        .bind(user_id)
        .bind(lang_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

pub async fn set_learning_languages(
    pool: &SqlitePool,
    user_id: &str,
    entries: &[(String, Proficiency)],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_learning_languages WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    for (position, (lang_id, proficiency)) in entries.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO user_learning_languages (user_id, language_id, proficiency, position)
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(lang_id)
        .bind(proficiency.as_str())
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

pub async fn native_language_ids(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT language_id FROM user_native_languages WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(|r| r.get("language_id")).collect())
}

pub async fn learning_language_ids(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT language_id FROM user_learning_languages WHERE user_id = ? ORDER BY position ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(|r| r.get("language_id")).collect())
}

async fn learning_languages(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<LearningLanguage>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT language_id, proficiency FROM user_learning_languages
         WHERE user_id = ? ORDER BY position ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let lang_id: String = row.get("language_id");
        let proficiency: String = row.get("proficiency");
        if let Some(language) = languages_db::get_language(pool, &lang_id).await? {
            out.push(LearningLanguage {
                language,
                proficiency: Proficiency::parse(&proficiency),
            });
        }
    }
    Ok(out)
}

/// Assemble the public profile view: record plus populated language sets.
pub async fn load_profile(
    pool: &SqlitePool,
    user: &UserRecord,
) -> Result<UserProfile, sqlx::Error> {
    let native_ids = native_language_ids(pool, &user.id).await?;
    let native_languages = languages_db::get_languages_by_ids(pool, &native_ids).await?;
    let learning_languages = learning_languages(pool, &user.id).await?;

    Ok(UserProfile {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        profile_picture: user.profile_picture.clone(),
        bio: user.bio.clone(),
        interests: user.interests.clone(),
        location: Location {
            country: user.country.clone(),
            city: user.city.clone(),
        },
        is_online: user.is_online,
        last_active: user.last_active,
        created_at: user.created_at,
        native_languages,
        learning_languages,
    })
}

// ---- connections ----

/// Both directions are written together so the graph stays symmetric.
pub async fn add_connection(
    pool: &SqlitePool,
    user_id: &str,
    peer_id: &str,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    sqlx::query("INSERT OR IGNORE INTO connections (user_id, peer_id, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(peer_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT OR IGNORE INTO connections (user_id, peer_id, created_at) VALUES (?, ?, ?)")
        .bind(peer_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

pub async fn remove_connection(
    pool: &SqlitePool,
    user_id: &str,
    peer_id: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM connections WHERE user_id = ? AND peer_id = ?")
        .bind(user_id)
        .bind(peer_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM connections WHERE user_id = ? AND peer_id = ?")
        .bind(peer_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

pub async fn is_connected(
    pool: &SqlitePool,
    user_id: &str,
    peer_id: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM connections WHERE user_id = ? AND peer_id = ?")
        .bind(user_id)
        .bind(peer_id)
        .fetch_one(pool)
        .await?;
    let n: i64 = row.get("n");
    Ok(n > 0)
}

pub async fn connection_ids(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT peer_id FROM connections WHERE user_id = ? ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(|r| r.get("peer_id")).collect())
}
