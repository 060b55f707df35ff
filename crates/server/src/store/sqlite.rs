//! SQLite-backed store
//!
//! Tables use `AUTOINCREMENT` keys so ids are never reused, and message
//! order is the primary key order.

use super::{ConversationStore, StoreError, StoreResult};
use crate::models::{Conversation, Message, Role, User, DEFAULT_CONVERSATION_TITLE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

type UserRow = (i64, String, String, Option<String>, String);
type ConversationRow = (i64, i64, String, String, String);
type MessageRow = (i64, i64, String, String, String);

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.init_db().await?;

        info!("[Store] SQLite database at {:?}", path);
        Ok(store)
    }

    async fn init_db(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                username TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages (conversation_id, id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations (user_id, id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_time(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {:?}: {}", raw, e)))
}

fn user_from_row((id, email, password_hash, username, created_at): UserRow) -> StoreResult<User> {
    Ok(User {
        id,
        email,
        password_hash,
        username,
        created_at: parse_time(&created_at)?,
    })
}

fn conversation_from_row(
    (id, user_id, title, created_at, updated_at): ConversationRow,
) -> StoreResult<Conversation> {
    Ok(Conversation {
        id,
        user_id,
        title,
        created_at: parse_time(&created_at)?,
        updated_at: parse_time(&updated_at)?,
    })
}

fn message_from_row(
    (id, conversation_id, role, content, created_at): MessageRow,
) -> StoreResult<Message> {
    Ok(Message {
        id,
        conversation_id,
        role: Role::from_str(&role).map_err(StoreError::Corrupt)?,
        content,
        created_at: parse_time(&created_at)?,
    })
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        username: Option<&str>,
    ) -> StoreResult<User> {
        let created_at = Utc::now();

        // The UNIQUE constraint on email makes this an atomic conditional insert.
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, username, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(username)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(email.to_string())
            }
            other => StoreError::Database(other),
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            username: username.map(str::to_string),
            created_at,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, username, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, username, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn create_conversation(
        &self,
        user_id: i64,
        title: Option<&str>,
    ) -> StoreResult<Conversation> {
        let now = Utc::now();
        let title = title.unwrap_or(DEFAULT_CONVERSATION_TITLE);

        let result = sqlx::query(
            "INSERT INTO conversations (user_id, title, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(title)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound {
                entity: "User",
                id: user_id,
            },
            other => StoreError::Database(other),
        })?;

        Ok(Conversation {
            id: result.last_insert_rowid(),
            user_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_conversation(&self, id: i64) -> StoreResult<Option<Conversation>> {
        let row: Option<ConversationRow> = sqlx::query_as(
            "SELECT id, user_id, title, created_at, updated_at FROM conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(conversation_from_row).transpose()
    }

    async fn get_conversations_by_user(&self, user_id: i64) -> StoreResult<Vec<Conversation>> {
        let rows: Vec<ConversationRow> = sqlx::query_as(
            "SELECT id, user_id, title, created_at, updated_at FROM conversations WHERE user_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(conversation_from_row).collect()
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        role: Role,
        content: &str,
    ) -> StoreResult<Message> {
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(created_at.to_rfc3339())
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(StoreError::NotFound {
                entity: "Conversation",
                id: conversation_id,
            });
        }

        let result = sqlx::query(
            "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .bind(created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            conversation_id,
            role,
            content: content.to_string(),
            created_at,
        })
    }

    async fn get_messages(&self, conversation_id: i64) -> StoreResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, conversation_id, role, content, created_at FROM messages WHERE conversation_id = ? ORDER BY id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(message_from_row).collect()
    }
}
