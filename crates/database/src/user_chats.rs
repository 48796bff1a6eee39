//! Per-user chat index operations.

use sqlx::{FromRow, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{ChatEntry, UserChats};

#[derive(FromRow)]
struct UserChatsRow {
    user_id: String,
    chats: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserChatsRow> for UserChats {
    type Error = DatabaseError;

    fn try_from(row: UserChatsRow) -> Result<Self> {
        Ok(UserChats {
            user_id: row.user_id,
            chats: serde_json::from_str(&row.chats)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Outcome of [`add_chat_for_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWrite {
    /// The user had no index; one was created holding the entry.
    Created,
    /// The entry was appended to the user's existing index.
    Appended,
}

/// Get a user's chat index, if they have one.
pub async fn get_user_chats(pool: &SqlitePool, user_id: &str) -> Result<Option<UserChats>> {
    let row = sqlx::query_as::<_, UserChatsRow>(
        r#"
        SELECT user_id, chats, created_at, updated_at
        FROM user_chats
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(UserChats::try_from).transpose()
}

/// List a user's chat entries, oldest first. Empty if the user has no index.
pub async fn list_chat_entries(pool: &SqlitePool, user_id: &str) -> Result<Vec<ChatEntry>> {
    Ok(get_user_chats(pool, user_id)
        .await?
        .map(|index| index.chats)
        .unwrap_or_default())
}

/// Create a user's chat index holding a single entry.
pub async fn create_user_chats(
    pool: &SqlitePool,
    user_id: &str,
    chat_id: &str,
    title: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_chats (user_id, chats)
        VALUES (?, json_array(json_object('_id', ?, 'title', ?, 'createdAt', datetime('now'))))
        "#,
    )
    .bind(user_id)
    .bind(chat_id)
    .bind(title)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "UserChats",
                    id: user_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Append an entry to a user's existing chat index.
pub async fn append_user_chat(
    pool: &SqlitePool,
    user_id: &str,
    chat_id: &str,
    title: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE user_chats
        SET chats = json_insert(
                chats,
                '$[#]',
                json_object('_id', ?, 'title', ?, 'createdAt', datetime('now'))
            ),
            updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(chat_id)
    .bind(title)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "UserChats",
            id: user_id.to_string(),
        });
    }

    Ok(())
}

/// Record a new chat in the user's index, creating the index on first use.
///
/// A concurrent first chat for the same user can win the insert; in that
/// case the entry is appended to the index it created.
pub async fn add_chat_for_user(
    pool: &SqlitePool,
    user_id: &str,
    chat_id: &str,
    title: &str,
) -> Result<IndexWrite> {
    if get_user_chats(pool, user_id).await?.is_some() {
        append_user_chat(pool, user_id, chat_id, title).await?;
        return Ok(IndexWrite::Appended);
    }

    match create_user_chats(pool, user_id, chat_id, title).await {
        Ok(()) => Ok(IndexWrite::Created),
        Err(DatabaseError::AlreadyExists { .. }) => {
            append_user_chat(pool, user_id, chat_id, title).await?;
            Ok(IndexWrite::Appended)
        }
        Err(e) => Err(e),
    }
}
