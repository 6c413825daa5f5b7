use axum::{debug_handler, extract::{rejection::JsonRejection, State}, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{clock::SharedClock, db::{self, Message, MessageType}, user::User, AppError, AppResult, AppState};

const UNKNOWN_SENDER: &str = "Participant doesn't exist!";

/// Raw body. Fields stay untyped so every problem can be reported at once.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SendMessageBody {
    to: Option<Value>,
    text: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<Value>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct Outgoing {
    to: String,
    text: String,
    kind: MessageType,
    from: String,
}

fn required_string(field: &str, value: Option<&Value>, errors: &mut Vec<String>) -> Option<String> {
    match value {
        None | Some(Value::Null) => errors.push(format!("\"{field}\" is required")),
        Some(Value::String(s)) if s.is_empty() => errors.push(format!("\"{field}\" is not allowed to be empty")),
        Some(Value::String(s)) => return Some(s.clone()),
        Some(_) => errors.push(format!("\"{field}\" must be a string")),
    }
    None
}

pub(crate) fn validate(body: &SendMessageBody, from: Option<&str>) -> Result<Outgoing, Vec<String>> {
    let mut errors = Vec::new();

    let to = required_string("to", body.to.as_ref(), &mut errors);
    let text = required_string("text", body.text.as_ref(), &mut errors);
    let kind = required_string("type", body.kind.as_ref(), &mut errors).and_then(|kind| {
        match kind.parse::<MessageType>() {
            Ok(kind @ (MessageType::Message | MessageType::PrivateMessage)) => Some(kind),
            _ => {
                errors.push("\"type\" must be one of [message, private_message]".to_owned());
                None
            }
        }
    });
    let from = required_string("from", from.map(|f| Value::String(f.to_owned())).as_ref(), &mut errors);

    match (to, text, kind, from) {
        (Some(to), Some(text), Some(kind), Some(from)) if errors.is_empty() => Ok(Outgoing { to, text, kind, from }),
        _ => Err(errors),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn send(
    State(db_pool): State<SqlitePool>,
    State(clock): State<SharedClock>,
    user: User,

    body: Result<Json<SendMessageBody>, JsonRejection>,
) -> AppResult<StatusCode> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let Outgoing { to, text, kind, from } = validate(&body, user.name()).map_err(AppError::validation)?;

    if db::participants::find_one(&db_pool, &from).await?.is_none() {
        return Err(AppError::validation(UNKNOWN_SENDER));
    }

    let message = Message::new(from, to, text, kind, clock.now())?;
    db::messages::insert_one(&db_pool, &message).await?;

    tracing::debug!(id = %message.id, from = %message.from, to = %message.to, "message sent");
    Ok(StatusCode::CREATED)
}
