//! Store operations for conversations and messages.
//!
//! The unread counter lives on the participant row; send-side increments and
//! read-side resets run inside single transactions so the counter and the
//! message read flags cannot drift apart.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{types::is_unique_violation, ApiError};
use crate::languages::db as languages_db;
use crate::languages::Language;
use crate::users::db as users_db;

/// Raw conversation row.
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub id: String,
    pub is_group: bool,
    pub name: Option<String>,
    pub group_admin: Option<String>,
    pub main_language: Option<String>,
    pub last_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw message row.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub original_language: Option<String>,
    pub is_read: bool,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Trimmed user view embedded in conversation/message responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub id: String,
    pub username: String,
    pub profile_picture: String,
    pub is_online: bool,
    pub last_active: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationView {
    pub language: Language,
    pub content: String,
    pub corrected: bool,
    pub corrected_by: Option<ParticipantSummary>,
    pub corrected_content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub conversation: String,
    pub sender: ParticipantSummary,
    pub content: String,
    pub original_language: Option<Language>,
    pub translations: Vec<TranslationView>,
    pub read: bool,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub participants: Vec<ParticipantSummary>,
    pub is_group: bool,
    pub name: Option<String>,
    pub group_admin: Option<String>,
    pub main_language: Option<Language>,
    pub last_message: Option<MessageView>,
    pub unread_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_participant: Option<ParticipantSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn map_conversation(row: &sqlx::sqlite::SqliteRow) -> ConversationRecord {
    ConversationRecord {
        id: row.get("id"),
        is_group: row.get("is_group"),
        name: row.get("name"),
        group_admin: row.get("group_admin"),
        main_language: row.get("main_language"),
        last_message: row.get("last_message"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_message(row: &sqlx::sqlite::SqliteRow) -> MessageRecord {
    let attachments: String = row.get("attachments");
    MessageRecord {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender_id: row.get("sender_id"),
        content: row.get("content"),
        original_language: row.get("original_language"),
        is_read: row.get("is_read"),
        attachments: serde_json::from_str(&attachments).unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}

const CONVERSATION_COLUMNS: &str =
    "id, is_group, name, group_admin, main_language, last_message, created_at, updated_at";
const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, content, original_language, is_read, attachments, created_at";

/// Sorted participant pair; the UNIQUE column that makes direct
/// conversations idempotent.
pub fn direct_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}:{b}")
    } else {
        format!("{b}:{a}")
    }
}

pub async fn get_conversation(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<ConversationRecord>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(map_conversation))
}

pub async fn participant_ids(
    pool: &SqlitePool,
    conversation_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT user_id FROM conversation_participants
         WHERE conversation_id = ? ORDER BY joined_at ASC, user_id ASC",
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(|r| r.get("user_id")).collect())
}

pub async fn is_participant(
    pool: &SqlitePool,
    conversation_id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS n FROM conversation_participants
         WHERE conversation_id = ? AND user_id = ?",
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    let n: i64 = row.get("n");
    Ok(n > 0)
}

pub async fn unread_count(
    pool: &SqlitePool,
    conversation_id: &str,
    user_id: &str,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT unread_count FROM conversation_participants
         WHERE conversation_id = ? AND user_id = ?",
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.get("unread_count")).unwrap_or(0))
}

/// Find the direct conversation for a pair, if any.
pub async fn find_direct(
    pool: &SqlitePool,
    a: &str,
    b: &str,
) -> Result<Option<ConversationRecord>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE direct_key = ?"
    ))
    .bind(direct_key(a, b))
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(map_conversation))
}

/// Create a conversation with unread counters initialized to 0 for every
/// participant. For direct pairs the UNIQUE `direct_key` rejects a duplicate;
/// a racing creator re-reads the winner's row.
pub async fn create_conversation(
    pool: &SqlitePool,
    participants: &[String],
    is_group: bool,
    name: Option<&str>,
    group_admin: Option<&str>,
    main_language: Option<&str>,
) -> Result<ConversationRecord, ApiError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let key = if !is_group && participants.len() == 2 {
        Some(direct_key(&participants[0], &participants[1]))
    } else {
        None
    };

    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    let inserted = sqlx::query(
        "INSERT INTO conversations (id, is_group, name, group_admin, main_language, direct_key, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(is_group)
    .bind(name)
    .bind(group_admin)
    .bind(main_language)
    .bind(&key)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await;

    if let Err(e) = inserted {
        drop(tx);
        if is_unique_violation(&e) {
            // Lost the create race for this pair; the existing row wins.
            if let (Some(_), [a, b]) = (&key, participants) {
                if let Some(existing) = find_direct(pool, a, b).await? {
                    return Ok(existing);
                }
            }
        }
        return Err(ApiError::from(e));
    }

    for user_id in participants {
        sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, user_id, unread_count, joined_at)
             VALUES (?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::from)?;
    }

    tx.commit().await.map_err(ApiError::from)?;

    get_conversation(pool, &id)
        .await?
        .ok_or_else(|| ApiError::Internal("conversation vanished after insert".to_string()))
}

/// All conversations a user participates in, most recently updated first.
pub async fn conversations_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<ConversationRecord>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations c
         JOIN conversation_participants p ON p.conversation_id = c.id
         WHERE p.user_id = ?
         ORDER BY c.updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(map_conversation).collect())
}

/// Insert a message and apply the send-side bookkeeping in one transaction:
/// set `lastMessage`, bump the conversation, and increment every other
/// participant's unread counter.
pub async fn send_message(
    pool: &SqlitePool,
    conversation_id: &str,
    sender_id: &str,
    content: &str,
    original_language: Option<&str>,
    attachments: &[String],
) -> Result<MessageRecord, ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::validation("Message content cannot be empty"));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let attachments_json = serde_json::to_string(attachments)?;

    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    sqlx::query(
        "INSERT INTO messages (id, conversation_id, sender_id, content, original_language, is_read, attachments, created_at)
         VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
    )
    .bind(&id)
    .bind(conversation_id)
    .bind(sender_id)
    .bind(content)
    .bind(original_language)
    .bind(&attachments_json)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    sqlx::query("UPDATE conversations SET last_message = ?, updated_at = ? WHERE id = ?")
        .bind(&id)
        .bind(now)
        .bind(conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::from)?;

    sqlx::query(
        "UPDATE conversation_participants SET unread_count = unread_count + 1
         WHERE conversation_id = ? AND user_id != ?",
    )
    .bind(conversation_id)
    .bind(sender_id)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    tx.commit().await.map_err(ApiError::from)?;

    get_message(pool, &id)
        .await?
        .ok_or_else(|| ApiError::Internal("message vanished after insert".to_string()))
}

pub async fn get_message(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<MessageRecord>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(map_message))
}

/// One page of messages, oldest-first within the page. `page` is 1-based and
/// counts back from the newest message.
pub async fn fetch_messages(
    pool: &SqlitePool,
    conversation_id: &str,
    page: i64,
    limit: i64,
) -> Result<Vec<MessageRecord>, sqlx::Error> {
    let offset = (page.max(1) - 1) * limit;
    let rows = sqlx::query(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE conversation_id = ?
         ORDER BY created_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(conversation_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let mut messages: Vec<MessageRecord> = rows.iter().map(map_message).collect();
    messages.reverse();
    Ok(messages)
}

/// Read-side bookkeeping, one transaction: flag every unread message from
/// other senders as read and zero the reader's unread counter. Applies to the
/// whole conversation regardless of the page requested.
pub async fn mark_read_and_reset_unread(
    pool: &SqlitePool,
    conversation_id: &str,
    reader_id: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE messages SET is_read = 1
         WHERE conversation_id = ? AND sender_id != ? AND is_read = 0",
    )
    .bind(conversation_id)
    .bind(reader_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE conversation_participants SET unread_count = 0
         WHERE conversation_id = ? AND user_id = ?",
    )
    .bind(conversation_id)
    .bind(reader_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Hard delete. Caller checks sender ownership first.
pub async fn delete_message(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Add or overwrite a correction on a message's translation entry for the
/// given language.
pub async fn upsert_translation_correction(
    pool: &SqlitePool,
    message_id: &str,
    language_id: &str,
    corrected_by: &str,
    corrected_content: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO message_translations (message_id, language_id, content, corrected, corrected_by, corrected_content)
         VALUES (?, ?, ?, 1, ?, ?)
         ON CONFLICT (message_id, language_id) DO UPDATE SET
             corrected = 1, corrected_by = excluded.corrected_by,
             corrected_content = excluded.corrected_content",
    )
    .bind(message_id)
    .bind(language_id)
    .bind(corrected_content)
    .bind(corrected_by)
    .bind(corrected_content)
    .execute(pool)
    .await?;
    Ok(())
}

// ---- view assembly ----

pub async fn participant_summary(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<ParticipantSummary>, sqlx::Error> {
    Ok(users_db::get_user_by_id(pool, user_id).await?.map(|u| ParticipantSummary {
        id: u.id,
        username: u.username,
        profile_picture: u.profile_picture,
        is_online: u.is_online,
        last_active: u.last_active,
    }))
}

pub async fn message_view(
    pool: &SqlitePool,
    message: &MessageRecord,
) -> Result<MessageView, sqlx::Error> {
    let sender = participant_summary(pool, &message.sender_id)
        .await?
        .unwrap_or(ParticipantSummary {
            id: message.sender_id.clone(),
            username: "deleted".to_string(),
            profile_picture: String::new(),
            is_online: false,
            last_active: message.created_at,
        });

    let original_language = match &message.original_language {
        Some(id) => languages_db::get_language(pool, id).await?,
        None => None,
    };

    let rows = sqlx::query(
        "SELECT language_id, content, corrected, corrected_by, corrected_content
         FROM message_translations WHERE message_id = ?",
    )
    .bind(&message.id)
    .fetch_all(pool)
    .await?;

    let mut translations = Vec::with_capacity(rows.len());
    for row in &rows {
        let language_id: String = row.get("language_id");
        let Some(language) = languages_db::get_language(pool, &language_id).await? else {
            continue;
        };
        let corrected_by: Option<String> = row.get("corrected_by");
        let corrected_by = match corrected_by {
            Some(id) => participant_summary(pool, &id).await?,
            None => None,
        };
        translations.push(TranslationView {
            language,
            content: row.get("content"),
            corrected: row.get("corrected"),
            corrected_by,
            corrected_content: row.get("corrected_content"),
        });
    }

    Ok(MessageView {
        id: message.id.clone(),
        conversation: message.conversation_id.clone(),
        sender,
        content: message.content.clone(),
        original_language,
        translations,
        read: message.is_read,
        attachments: message.attachments.clone(),
        created_at: message.created_at,
    })
}

/// Conversation view for a given requester: populated participants, the
/// requester's unread count, and the other participant for direct pairs.
pub async fn conversation_view(
    pool: &SqlitePool,
    conversation: &ConversationRecord,
    requester_id: &str,
) -> Result<ConversationView, sqlx::Error> {
    let ids = participant_ids(pool, &conversation.id).await?;
    let mut participants = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(p) = participant_summary(pool, id).await? {
            participants.push(p);
        }
    }

    let other_participant = if !conversation.is_group && participants.len() == 2 {
        participants.iter().find(|p| p.id != requester_id).cloned()
    } else {
        None
    };

    let main_language = match &conversation.main_language {
        Some(id) => languages_db::get_language(pool, id).await?,
        None => None,
    };

    let last_message = match &conversation.last_message {
        Some(id) => match get_message(pool, id).await? {
            Some(m) => Some(message_view(pool, &m).await?),
            None => None,
        },
        None => None,
    };

    let unread = unread_count(pool, &conversation.id, requester_id).await?;

    Ok(ConversationView {
        id: conversation.id.clone(),
        participants,
        is_group: conversation.is_group,
        name: conversation.name.clone(),
        group_admin: conversation.group_admin.clone(),
        main_language,
        last_message,
        unread_count: unread,
        other_participant,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
    })
}
