mod list;
mod remove;
mod send;
pub mod visibility;

use axum::{routing::{delete, get}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list::list).post(send::send))
        .route("/messages/{id}", delete(remove::remove))
}
