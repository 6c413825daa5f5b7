use axum::{debug_handler, extract::State, http::StatusCode};
use sqlx::SqlitePool;

use crate::{clock::SharedClock, db, user::User, AppError, AppResult, AppState};

/// Heartbeat: keeps the caller out of the next sweep.
#[debug_handler(state = AppState)]
pub async fn heartbeat(
    State(db_pool): State<SqlitePool>,
    State(clock): State<SharedClock>,
    user: User,
) -> AppResult<StatusCode> {
    let not_found = || AppError::NotFound("Participant not found.".to_owned());

    let name = user.name().ok_or_else(not_found)?;
    if db::participants::find_one(&db_pool, name).await?.is_none() {
        return Err(not_found());
    }

    // swept in between: report it the same way
    if !db::participants::update_last_status(&db_pool, name, clock.now_millis()).await? {
        return Err(not_found());
    }

    Ok(StatusCode::OK)
}
