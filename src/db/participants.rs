use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::Participant;

pub async fn find_all(db_pool: &SqlitePool) -> Result<Vec<Participant>, sqlx::Error> {
    let rows: Vec<(String, i64)> = sqlx::query_as("SELECT name,last_status FROM participants ORDER BY rowid")
        .fetch_all(db_pool)
        .await?;

    Ok(rows.into_iter().map(|(name, last_status)| Participant { name, last_status }).collect())
}

pub async fn find_one(db_pool: &SqlitePool, name: &str) -> Result<Option<Participant>, sqlx::Error> {
    let row: Option<(String, i64)> = sqlx::query_as("SELECT name,last_status FROM participants WHERE name=?")
        .bind(name)
        .fetch_optional(db_pool)
        .await?;

    Ok(row.map(|(name, last_status)| Participant { name, last_status }))
}

/// Participants last seen at or before `cutoff` (ms since epoch).
pub async fn find_stale(db_pool: &SqlitePool, cutoff: i64) -> Result<Vec<Participant>, sqlx::Error> {
    let rows: Vec<(String, i64)> = sqlx::query_as("SELECT name,last_status FROM participants WHERE last_status<=? ORDER BY rowid")
        .bind(cutoff)
        .fetch_all(db_pool)
        .await?;

    Ok(rows.into_iter().map(|(name, last_status)| Participant { name, last_status }).collect())
}

pub async fn insert_one(db_pool: &SqlitePool, participant: &Participant) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO participants (name,last_status) VALUES (?,?)")
        .bind(&participant.name)
        .bind(participant.last_status)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Returns whether a participant with that name existed.
pub async fn update_last_status(db_pool: &SqlitePool, name: &str, last_status: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE participants SET last_status=? WHERE name=?")
        .bind(last_status)
        .bind(name)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Names per DELETE, one bind each.
pub const DELETE_CHUNK: usize = 900;

pub async fn delete_many(db_pool: &SqlitePool, names: &[String]) -> Result<u64, sqlx::Error> {
    let mut removed = 0;
    for chunk in names.chunks(DELETE_CHUNK) {
        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM participants WHERE name IN (");
        let mut separated = query.separated(",");
        for name in chunk {
            separated.push_bind(name);
        }
        separated.push_unseparated(")");

        removed += query.build().execute(db_pool).await?.rows_affected();
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn participant(name: &str, last_status: i64) -> Participant {
        Participant { name: name.to_owned(), last_status }
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected_by_the_store() {
        let db_pool = db::connect_memory().await.unwrap();
        insert_one(&db_pool, &participant("Alice", 1)).await.unwrap();

        let err = insert_one(&db_pool, &participant("Alice", 2)).await.unwrap_err();
        assert!(db::is_unique_violation(&err));
        assert_eq!(find_all(&db_pool).await.unwrap(), vec![participant("Alice", 1)]);
    }

    #[tokio::test]
    async fn find_stale_includes_the_cutoff() {
        let db_pool = db::connect_memory().await.unwrap();
        insert_one(&db_pool, &participant("old", 100)).await.unwrap();
        insert_one(&db_pool, &participant("edge", 200)).await.unwrap();
        insert_one(&db_pool, &participant("fresh", 201)).await.unwrap();

        let stale: Vec<String> = find_stale(&db_pool, 200).await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(stale, vec!["old", "edge"]);
    }

    #[tokio::test]
    async fn update_and_delete_report_what_they_touched() {
        let db_pool = db::connect_memory().await.unwrap();
        insert_one(&db_pool, &participant("Alice", 1)).await.unwrap();
        insert_one(&db_pool, &participant("Bob", 1)).await.unwrap();

        assert!(update_last_status(&db_pool, "Alice", 50).await.unwrap());
        assert!(!update_last_status(&db_pool, "Carl", 50).await.unwrap());
        assert_eq!(find_one(&db_pool, "Alice").await.unwrap(), Some(participant("Alice", 50)));

        let removed = delete_many(&db_pool, &["Alice".to_owned(), "Carl".to_owned()]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(delete_many(&db_pool, &[]).await.unwrap(), 0);
        assert_eq!(find_all(&db_pool).await.unwrap(), vec![participant("Bob", 1)]);
    }

    #[tokio::test]
    async fn delete_many_spans_several_statements() {
        let db_pool = db::connect_memory().await.unwrap();
        let names: Vec<String> = (0..DELETE_CHUNK + 10).map(|i| format!("user{i}")).collect();
        for name in &names {
            insert_one(&db_pool, &participant(name, 1)).await.unwrap();
        }
        insert_one(&db_pool, &participant("stays", 1)).await.unwrap();

        assert_eq!(delete_many(&db_pool, &names).await.unwrap(), names.len() as u64);
        assert_eq!(find_all(&db_pool).await.unwrap(), vec![participant("stays", 1)]);
    }
}
