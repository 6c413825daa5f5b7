use axum::{debug_handler, extract::{Path, State}, http::StatusCode};
use sqlx::SqlitePool;

use crate::{db, user::User, AppError, AppResult};

#[debug_handler]
pub(crate) async fn remove(
    State(db_pool): State<SqlitePool>,
    Path(id): Path<String>,
    user: User,
) -> AppResult<StatusCode> {
    let Some(message) = db::messages::find_one(&db_pool, &id).await? else {
        return Err(AppError::NotFound("Message not found.".to_owned()));
    };

    if user.name() != Some(message.from.as_str()) {
        return Err(AppError::Unauthorized("Only the sender can delete this message.".to_owned()));
    }

    db::messages::delete_one(&db_pool, &id).await?;

    tracing::debug!(%id, from = %message.from, "message deleted");
    Ok(StatusCode::OK)
}
