//! Chat document operations.

use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Chat, HistoryEntry};
use crate::validation::{validate_message_text, validate_user_id};

/// Row shape of the `chats` table; `history` holds a JSON array.
#[derive(FromRow)]
struct ChatRow {
    id: String,
    user_id: String,
    history: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ChatRow> for Chat {
    type Error = DatabaseError;

    fn try_from(row: ChatRow) -> Result<Self> {
        Ok(Chat {
            id: row.id,
            user_id: row.user_id,
            history: serde_json::from_str(&row.history)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Create a chat whose history starts with the user's first message.
///
/// Rejects an invalid user id or message with [`DatabaseError::Validation`].
pub async fn create_chat(pool: &SqlitePool, user_id: &str, text: &str) -> Result<Chat> {
    validate_user_id(user_id)?;
    validate_message_text(text)?;

    let id = Uuid::new_v4().to_string();
    let history = serde_json::to_string(&[HistoryEntry::user(text)])?;

    sqlx::query(
        r#"
        INSERT INTO chats (id, user_id, history)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(history)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Chat",
                    id: id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    tracing::debug!(chat_id = %id, user_id, "Created chat");

    get_chat(pool, &id, user_id).await
}

/// Get a chat owned by `user_id`.
///
/// A chat that exists but belongs to someone else is reported as not found.
pub async fn get_chat(pool: &SqlitePool, chat_id: &str, user_id: &str) -> Result<Chat> {
    let row = sqlx::query_as::<_, ChatRow>(
        r#"
        SELECT id, user_id, history, created_at, updated_at
        FROM chats
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Chat",
        id: chat_id.to_string(),
    })?;

    row.try_into()
}

/// Append entries to a chat's history, in order.
///
/// All entries land in a single transaction: either every entry is appended
/// or none is.
pub async fn append_history(
    pool: &SqlitePool,
    chat_id: &str,
    user_id: &str,
    entries: &[HistoryEntry],
) -> Result<()> {
    if entries.is_empty() {
        get_chat(pool, chat_id, user_id).await?;
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for entry in entries {
        let payload = serde_json::to_string(entry)?;
        let result = sqlx::query(
            r#"
            UPDATE chats
            SET history = json_insert(history, '$[#]', json(?)),
                updated_at = datetime('now')
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(payload)
        .bind(chat_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                entity: "Chat",
                id: chat_id.to_string(),
            });
        }
    }

    tx.commit().await?;

    tracing::debug!(chat_id, appended = entries.len(), "Appended chat history");
    Ok(())
}

/// Count chats owned by a user.
pub async fn count_chats(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM chats WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
