//! Store operations and state transitions for voice rooms.
//!
//! Join-order is the AUTOINCREMENT `seq` on the participant row; host
//! transfer always goes to the lowest remaining `seq`. Capacity is enforced
//! with a conditional insert inside the join transaction, so two racing joins
//! cannot both land in a room with one seat left.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::languages::db as languages_db;
use crate::languages::Language;
use crate::messaging::db::ParticipantSummary;
use crate::users::db as users_db;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("Already in this voice room")]
    AlreadyJoined,
    #[error("Voice room is full")]
    AtCapacity,
    #[error("Incorrect password")]
    InvalidPassword,
    #[error("Not in this voice room")]
    NotInRoom,
    #[error("Not authorized to modify this voice room")]
    NotAuthorized,
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::AlreadyJoined | RoomError::AtCapacity | RoomError::NotInRoom => {
                ApiError::validation(err.to_string())
            }
            RoomError::InvalidPassword | RoomError::NotAuthorized => {
                ApiError::unauthorized(err.to_string())
            }
        }
    }
}

/// Raw room row. The password never leaves the store layer.
#[derive(Debug, Clone)]
pub struct RoomRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub host_id: String,
    pub is_private: bool,
    pub password: Option<String>,
    pub max_participants: i64,
    pub topic: String,
    pub is_active: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomParticipant {
    pub user: ParticipantSummary,
    pub is_muted: bool,
    pub is_deafened: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub host: ParticipantSummary,
    pub participants: Vec<RoomParticipant>,
    pub languages: Vec<Language>,
    pub is_private: bool,
    pub max_participants: i64,
    pub topic: String,
    pub is_active: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ROOM_COLUMNS: &str = "id, name, description, host_id, is_private, password, max_participants, \
     topic, is_active, start_time, end_time, created_at, updated_at";

fn map_room(row: &sqlx::sqlite::SqliteRow) -> RoomRecord {
    RoomRecord {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        host_id: row.get("host_id"),
        is_private: row.get("is_private"),
        password: row.get("password"),
        max_participants: row.get("max_participants"),
        topic: row.get("topic"),
        is_active: row.get("is_active"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn get_room(pool: &SqlitePool, id: &str) -> Result<Option<RoomRecord>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {ROOM_COLUMNS} FROM voice_rooms WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(map_room))
}

/// Active rooms only, newest first.
pub async fn list_active_rooms(pool: &SqlitePool) -> Result<Vec<RoomRecord>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {ROOM_COLUMNS} FROM voice_rooms WHERE is_active = 1 ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(map_room).collect())
}

pub struct NewRoom<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub host_id: &'a str,
    pub language_ids: &'a [String],
    pub is_private: bool,
    pub password: Option<&'a str>,
    pub max_participants: Option<i64>,
    pub topic: Option<&'a str>,
}

/// Create a room with the host as its first participant.
pub async fn create_room(pool: &SqlitePool, room: NewRoom<'_>) -> Result<RoomRecord, ApiError> {
    if room.name.trim().is_empty() {
        return Err(ApiError::validation("Please provide a room name"));
    }
    if room.is_private && room.password.map_or(true, |p| p.is_empty()) {
        return Err(ApiError::validation("Private rooms require a password"));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let max = room.max_participants.unwrap_or(10).max(1);

    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    sqlx::query(
        "INSERT INTO voice_rooms (id, name, description, host_id, is_private, password, max_participants, topic, is_active, start_time, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)",
    )
    .bind(&id)
    .bind(room.name.trim())
    .bind(room.description)
    .bind(room.host_id)
    .bind(room.is_private)
    .bind(room.password)
    .bind(max)
    .bind(room.topic.unwrap_or("casual"))
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    sqlx::query(
        "INSERT INTO voice_room_participants (room_id, user_id, is_muted, is_deafened, joined_at)
         VALUES (?, ?, 0, 0, ?)",
    )
    .bind(&id)
    .bind(room.host_id)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    for language_id in room.language_ids {
        sqlx::query("INSERT INTO voice_room_languages (room_id, language_id) VALUES (?, ?)")
            .bind(&id)
            .bind(language_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from)?;
    }

    tx.commit().await.map_err(ApiError::from)?;

    get_room(pool, &id)
        .await?
        .ok_or_else(|| ApiError::Internal("voice room vanished after insert".to_string()))
}

pub struct RoomUpdate<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub language_ids: Option<&'a [String]>,
    pub is_private: Option<bool>,
    pub password: Option<&'a str>,
    pub max_participants: Option<i64>,
    pub topic: Option<&'a str>,
}

/// Partial update. Host and participant list are not updatable here, and the
/// capacity cannot drop below the number of people already in the room.
pub async fn update_room(
    pool: &SqlitePool,
    id: &str,
    update: RoomUpdate<'_>,
) -> Result<RoomRecord, ApiError> {
    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    if let Some(max) = update.max_participants {
        let occupied = sqlx::query(
            "SELECT COUNT(*) AS n FROM voice_room_participants WHERE room_id = ?",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(ApiError::from)?;
        let occupied: i64 = occupied.get("n");
        if max < occupied {
            return Err(ApiError::validation(format!(
                "Cannot set max participants below current participant count of {occupied}"
            )));
        }
    }

    sqlx::query(
        "UPDATE voice_rooms SET
             name = COALESCE(?, name),
             description = COALESCE(?, description),
             is_private = COALESCE(?, is_private),
             password = COALESCE(?, password),
             max_participants = COALESCE(?, max_participants),
             topic = COALESCE(?, topic),
             updated_at = ?
         WHERE id = ?",
    )
    .bind(update.name)
    .bind(update.description)
    .bind(update.is_private)
    .bind(update.password)
    .bind(update.max_participants)
    .bind(update.topic)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    if let Some(language_ids) = update.language_ids {
        sqlx::query("DELETE FROM voice_room_languages WHERE room_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from)?;
        for language_id in language_ids {
            sqlx::query("INSERT INTO voice_room_languages (room_id, language_id) VALUES (?, ?)")
                .bind(id)
                .bind(language_id)
                .execute(&mut *tx)
                .await
                .map_err(ApiError::from)?;
        }
    }

    tx.commit().await.map_err(ApiError::from)?;

    get_room(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Voice room not found with id of {id}")))
}

pub async fn delete_room(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM voice_rooms WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Join a room. Rejections are checked in order: already joined, capacity,
/// then password. The final capacity check is a conditional insert inside
/// the transaction: the row only lands if the current participant count is
/// still below the limit, so the check and the insert cannot be interleaved.
pub async fn join_room(
    pool: &SqlitePool,
    room: &RoomRecord,
    user_id: &str,
    password: Option<&str>,
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    let already = sqlx::query(
        "SELECT COUNT(*) AS n FROM voice_room_participants WHERE room_id = ? AND user_id = ?",
    )
    .bind(&room.id)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(ApiError::from)?;
    let n: i64 = already.get("n");
    if n > 0 {
        return Err(RoomError::AlreadyJoined.into());
    }

    let occupied = sqlx::query(
        "SELECT COUNT(*) AS n FROM voice_room_participants WHERE room_id = ?",
    )
    .bind(&room.id)
    .fetch_one(&mut *tx)
    .await
    .map_err(ApiError::from)?;
    let occupied: i64 = occupied.get("n");
    if occupied >= room.max_participants {
        return Err(RoomError::AtCapacity.into());
    }

    if room.is_private {
        let supplied = password.unwrap_or("");
        if room.password.as_deref() != Some(supplied) {
            return Err(RoomError::InvalidPassword.into());
        }
    }

    let result = sqlx::query(
        "INSERT INTO voice_room_participants (room_id, user_id, is_muted, is_deafened, joined_at)
         SELECT ?, ?, 0, 0, ?
         WHERE (SELECT COUNT(*) FROM voice_room_participants WHERE room_id = ?) < ?",
    )
    .bind(&room.id)
    .bind(user_id)
    .bind(Utc::now())
    .bind(&room.id)
    .bind(room.max_participants)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(RoomError::AtCapacity.into());
    }

    tx.commit().await.map_err(ApiError::from)?;
    Ok(())
}

/// Leave a room. If the host leaves, the host role moves to the earliest
/// remaining joiner; if the room empties, it is closed with an end time.
pub async fn leave_room(
    pool: &SqlitePool,
    room: &RoomRecord,
    user_id: &str,
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    let removed = sqlx::query(
        "DELETE FROM voice_room_participants WHERE room_id = ? AND user_id = ?",
    )
    .bind(&room.id)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::from)?;
    if removed.rows_affected() == 0 {
        return Err(RoomError::NotInRoom.into());
    }

    let next = sqlx::query(
        "SELECT user_id FROM voice_room_participants WHERE room_id = ? ORDER BY seq ASC LIMIT 1",
    )
    .bind(&room.id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    match next {
        Some(row) => {
            if room.host_id == user_id {
                let new_host: String = row.get("user_id");
                sqlx::query("UPDATE voice_rooms SET host_id = ?, updated_at = ? WHERE id = ?")
                    .bind(&new_host)
                    .bind(Utc::now())
                    .bind(&room.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(ApiError::from)?;
            }
        }
        None => {
            let now = Utc::now();
            sqlx::query(
                "UPDATE voice_rooms SET is_active = 0, end_time = ?, updated_at = ? WHERE id = ?",
            )
            .bind(now)
            .bind(now)
            .bind(&room.id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from)?;
        }
    }

    tx.commit().await.map_err(ApiError::from)?;
    Ok(())
}

/// Flip the mute flag. Returns the new state.
pub async fn toggle_mute(
    pool: &SqlitePool,
    room_id: &str,
    user_id: &str,
) -> Result<bool, ApiError> {
    let row = sqlx::query(
        "SELECT is_muted FROM voice_room_participants WHERE room_id = ? AND user_id = ?",
    )
    .bind(room_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(ApiError::from)?
    .ok_or(RoomError::NotInRoom)?;

    let muted: bool = row.get("is_muted");
    let next = !muted;
    sqlx::query(
        "UPDATE voice_room_participants SET is_muted = ? WHERE room_id = ? AND user_id = ?",
    )
    .bind(next)
    .bind(room_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(ApiError::from)?;
    Ok(next)
}

/// Flip the deafen flag. Deafening forces mute on; undeafening forces mute
/// off, whatever it was before.
pub async fn toggle_deafen(
    pool: &SqlitePool,
    room_id: &str,
    user_id: &str,
) -> Result<(bool, bool), ApiError> {
    let row = sqlx::query(
        "SELECT is_deafened FROM voice_room_participants WHERE room_id = ? AND user_id = ?",
    )
    .bind(room_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(ApiError::from)?
    .ok_or(RoomError::NotInRoom)?;

    let deafened: bool = row.get("is_deafened");
    let next_deafened = !deafened;
    let next_muted = next_deafened;

    sqlx::query(
        "UPDATE voice_room_participants SET is_deafened = ?, is_muted = ? WHERE room_id = ? AND user_id = ?",
    )
    .bind(next_deafened)
    .bind(next_muted)
    .bind(room_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(ApiError::from)?;
    Ok((next_deafened, next_muted))
}

pub async fn participants(
    pool: &SqlitePool,
    room_id: &str,
) -> Result<Vec<RoomParticipant>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT user_id, is_muted, is_deafened, joined_at
         FROM voice_room_participants WHERE room_id = ? ORDER BY seq ASC",
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let user_id: String = row.get("user_id");
        let Some(record) = users_db::get_user_by_id(pool, &user_id).await? else {
            continue;
        };
        out.push(RoomParticipant {
            user: ParticipantSummary {
                id: record.id,
                username: record.username,
                profile_picture: record.profile_picture,
                is_online: record.is_online,
                last_active: record.last_active,
            },
            is_muted: row.get("is_muted"),
            is_deafened: row.get("is_deafened"),
            joined_at: row.get("joined_at"),
        });
    }
    Ok(out)
}

pub async fn room_view(pool: &SqlitePool, room: &RoomRecord) -> Result<RoomView, sqlx::Error> {
    let host = users_db::get_user_by_id(pool, &room.host_id)
        .await?
        .map(|u| ParticipantSummary {
            id: u.id,
            username: u.username,
            profile_picture: u.profile_picture,
            is_online: u.is_online,
            last_active: u.last_active,
        })
        .unwrap_or(ParticipantSummary {
            id: room.host_id.clone(),
            username: "deleted".to_string(),
            profile_picture: String::new(),
            is_online: false,
            last_active: room.created_at,
        });

    let language_rows = sqlx::query(
        "SELECT language_id FROM voice_room_languages WHERE room_id = ?",
    )
    .bind(&room.id)
    .fetch_all(pool)
    .await?;
    let mut languages = Vec::with_capacity(language_rows.len());
    for row in &language_rows {
        let id: String = row.get("language_id");
        if let Some(language) = languages_db::get_language(pool, &id).await? {
            languages.push(language);
        }
    }

    Ok(RoomView {
        id: room.id.clone(),
        name: room.name.clone(),
        description: room.description.clone(),
        host,
        participants: participants(pool, &room.id).await?,
        languages,
        is_private: room.is_private,
        max_participants: room.max_participants,
        topic: room.topic.clone(),
        is_active: room.is_active,
        start_time: room.start_time,
        end_time: room.end_time,
        created_at: room.created_at,
        updated_at: room.updated_at,
    })
}
