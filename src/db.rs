pub mod messages;
pub mod participants;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use time::{macros::format_description, OffsetDateTime};
use uuid::Uuid;

/// Recipient meaning "everyone in the room".
pub const BROADCAST: &str = "Todos";
pub const JOIN_NOTICE: &str = "entra na sala...";
pub const LEAVE_NOTICE: &str = "sai da sala...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub last_status: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Message,
    PrivateMessage,
    Status,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        use MessageType::*;
        match self {
            Message => "message",
            PrivateMessage => "private_message",
            Status => "status",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(MessageType::Message),
            "private_message" => Ok(MessageType::PrivateMessage),
            "status" => Ok(MessageType::Status),
            other => Err(format!("unknown message type {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub time: String,
}

impl Message {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        kind: MessageType,
        at: OffsetDateTime,
    ) -> Result<Message, time::error::Format> {
        Ok(Message {
            id: Uuid::now_v7().to_string(),
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind,
            time: clock_time(at)?,
        })
    }

    /// System notice about `name` entering or leaving, addressed to everyone.
    pub fn status(name: &str, notice: &str, at: OffsetDateTime) -> Result<Message, time::error::Format> {
        Message::new(name, BROADCAST, notice, MessageType::Status, at)
    }
}

/// `hh:mm:ss` on a 12-hour clock.
pub fn clock_time(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.format(format_description!("[hour repr:12]:[minute]:[second]"))
}

pub fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(16)
        .connect(url)
        .await
}

/// Single-connection pool over a private in-memory database.
pub async fn connect_memory() -> Result<SqlitePool, sqlx::Error> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}

pub async fn migrate(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS participants (
            name TEXT PRIMARY KEY NOT NULL,
            last_status INTEGER NOT NULL
        )",
    )
    .execute(db_pool)
    .await?;

    // seq keeps insertion order, id is what clients see
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS messages (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            sender TEXT NOT NULL,
            recipient TEXT NOT NULL,
            text TEXT NOT NULL,
            kind TEXT NOT NULL,
            time TEXT NOT NULL
        )",
    )
    .execute(db_pool)
    .await?;

    Ok(())
}
