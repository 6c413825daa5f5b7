use axum::{debug_handler, extract::State, Json};
use sqlx::SqlitePool;

use crate::{db::{self, Participant}, AppResult};

#[debug_handler]
pub(crate) async fn list(State(db_pool): State<SqlitePool>) -> AppResult<Json<Vec<Participant>>> {
    Ok(Json(db::participants::find_all(&db_pool).await?))
}
