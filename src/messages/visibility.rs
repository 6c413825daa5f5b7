//! Which stored messages a caller gets to read.

use crate::db::{Message, MessageType, BROADCAST};

// `message` type is public even when `to` names one participant
pub fn is_visible(message: &Message, user: Option<&str>) -> bool {
    message.to == BROADCAST
        || user.is_some_and(|user| message.to == user || message.from == user)
        || message.kind == MessageType::Message
}

/// Visible messages in stored order, cut down to the newest `limit` if given.
pub fn visible_to(messages: Vec<Message>, user: Option<&str>, limit: Option<usize>) -> Vec<Message> {
    let mut visible: Vec<Message> = messages
        .into_iter()
        .filter(|message| is_visible(message, user))
        .collect();

    if let Some(limit) = limit {
        let skip = visible.len().saturating_sub(limit);
        visible.drain(..skip);
    }
    visible
}

/// `?limit=` only counts when it is a positive integer.
pub fn parse_limit(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&limit| limit > 0)
}
