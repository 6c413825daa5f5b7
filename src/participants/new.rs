use axum::{debug_handler, extract::{rejection::JsonRejection, State}, http::StatusCode, Json};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{clock::SharedClock, db::{self, Message, Participant, JOIN_NOTICE}, AppError, AppResult, AppState};

const NAME_REQUIRED: &str = "Please insert a name.";
const NAME_TAKEN: &str = "Name already being used, please insert a different one.";

#[derive(Deserialize)]
pub(crate) struct NewParticipant {
    name: Option<String>,
}

/// Insert that reports a lost registration race as a name conflict.
async fn insert_participant(db_pool: &SqlitePool, participant: &Participant) -> AppResult<()> {
    match db::participants::insert_one(db_pool, participant).await {
        Err(err) if db::is_unique_violation(&err) => Err(AppError::Conflict(NAME_TAKEN.to_owned())),
        result => Ok(result?),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    State(clock): State<SharedClock>,

    body: Result<Json<NewParticipant>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Some(name) = body
        .ok()
        .and_then(|Json(NewParticipant { name })| name)
        .filter(|name| !name.is_empty())
    else {
        return Err(AppError::validation(NAME_REQUIRED));
    };

    if db::participants::find_one(&db_pool, &name).await?.is_some() {
        return Err(AppError::Conflict(NAME_TAKEN.to_owned()));
    }

    let now = clock.now();
    let participant = Participant { name, last_status: db::unix_millis(now) };
    insert_participant(&db_pool, &participant).await?;

    // no transaction: a failure here leaves the participant without a join notice
    let notice = Message::status(&participant.name, JOIN_NOTICE, now)?;
    db::messages::insert_one(&db_pool, &notice).await?;

    tracing::info!(name = %participant.name, "participant joined");
    Ok(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn name_taken_after_lookup_is_a_conflict() {
        let db_pool = db::connect_memory().await.unwrap();
        let alice = Participant { name: "Alice".to_owned(), last_status: 1 };

        // another request got in between the lookup and this insert
        db::participants::insert_one(&db_pool, &alice).await.unwrap();
        let err = insert_participant(&db_pool, &Participant { last_status: 2, ..alice.clone() })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref message) if message == NAME_TAKEN));
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(db::participants::find_all(&db_pool).await.unwrap(), vec![alice]);
    }

    #[tokio::test]
    async fn other_store_errors_stay_store_errors() {
        let db_pool = db::connect_memory().await.unwrap();
        db_pool.close().await;

        let err = insert_participant(&db_pool, &Participant { name: "Bob".to_owned(), last_status: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }
}
