use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{Message, MessageType};

type MessageRow = (String, String, String, String, String, String);

fn from_row((id, from, to, text, kind, time): MessageRow) -> Result<Message, sqlx::Error> {
    let kind = kind.parse::<MessageType>().map_err(|e| sqlx::Error::Decode(e.into()))?;
    Ok(Message { id, from, to, text, kind, time })
}

/// Every message, oldest first.
pub async fn find_all(db_pool: &SqlitePool) -> Result<Vec<Message>, sqlx::Error> {
    let rows: Vec<MessageRow> = sqlx::query_as("SELECT id,sender,recipient,text,kind,time FROM messages ORDER BY seq")
        .fetch_all(db_pool)
        .await?;

    rows.into_iter().map(from_row).collect()
}

pub async fn find_one(db_pool: &SqlitePool, id: &str) -> Result<Option<Message>, sqlx::Error> {
    let row: Option<MessageRow> = sqlx::query_as("SELECT id,sender,recipient,text,kind,time FROM messages WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await?;

    row.map(from_row).transpose()
}

pub async fn insert_one(db_pool: &SqlitePool, message: &Message) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO messages (id,sender,recipient,text,kind,time) VALUES (?,?,?,?,?,?)")
        .bind(&message.id)
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.kind.as_str())
        .bind(&message.time)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Rows per INSERT; 6 binds each stays under SQLite's 999-variable floor.
pub const INSERT_CHUNK: usize = 150;

pub async fn insert_many(db_pool: &SqlitePool, messages: &[Message]) -> Result<(), sqlx::Error> {
    for chunk in messages.chunks(INSERT_CHUNK) {
        let mut query = QueryBuilder::<Sqlite>::new("INSERT INTO messages (id,sender,recipient,text,kind,time) ");
        query.push_values(chunk, |mut row, message| {
            row.push_bind(&message.id)
                .push_bind(&message.from)
                .push_bind(&message.to)
                .push_bind(&message.text)
                .push_bind(message.kind.as_str())
                .push_bind(&message.time);
        });
        query.build().execute(db_pool).await?;
    }
    Ok(())
}

/// Returns whether a message was removed.
pub async fn delete_one(db_pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM messages WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::db;

    fn message(from: &str, to: &str, text: &str) -> Message {
        Message::new(from, to, text, MessageType::Message, datetime!(2024-03-01 10:00:00 UTC)).unwrap()
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let db_pool = db::connect_memory().await.unwrap();
        let first = message("Alice", "Todos", "one");
        let second = message("Bob", "Todos", "two");
        let third = message("Carl", "Alice", "three");

        insert_one(&db_pool, &first).await.unwrap();
        insert_many(&db_pool, &[second.clone(), third.clone()]).await.unwrap();
        insert_many(&db_pool, &[]).await.unwrap();

        assert_eq!(find_all(&db_pool).await.unwrap(), vec![first, second, third]);
    }

    #[tokio::test]
    async fn delete_one_only_removes_the_matching_id() {
        let db_pool = db::connect_memory().await.unwrap();
        let keep = message("Alice", "Todos", "keep");
        let gone = message("Alice", "Todos", "gone");
        insert_many(&db_pool, &[keep.clone(), gone.clone()]).await.unwrap();

        assert!(delete_one(&db_pool, &gone.id).await.unwrap());
        assert!(!delete_one(&db_pool, &gone.id).await.unwrap());
        assert_eq!(find_one(&db_pool, &gone.id).await.unwrap(), None);
        assert_eq!(find_one(&db_pool, &keep.id).await.unwrap(), Some(keep));
    }

    #[tokio::test]
    async fn insert_many_spans_several_statements() {
        let db_pool = db::connect_memory().await.unwrap();
        let batch: Vec<Message> = (0..INSERT_CHUNK * 2 + 7)
            .map(|i| message("Alice", "Todos", &i.to_string()))
            .collect();

        insert_many(&db_pool, &batch).await.unwrap();

        assert_eq!(find_all(&db_pool).await.unwrap(), batch);
    }
}
