use axum::{debug_handler, extract::{Query, State}, Json};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{db::{self, Message}, user::User, AppResult};

use super::visibility;

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    limit: Option<String>,
}

#[debug_handler]
pub(crate) async fn list(
    State(db_pool): State<SqlitePool>,
    Query(ListQuery { limit }): Query<ListQuery>,
    user: User,
) -> AppResult<Json<Vec<Message>>> {
    let messages = db::messages::find_all(&db_pool).await?;
    let limit = limit.as_deref().and_then(visibility::parse_limit);

    Ok(Json(visibility::visible_to(messages, user.name(), limit)))
}
