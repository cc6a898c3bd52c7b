//! Inbound events as delivered by the chat client.

use crate::{EventId, RoomId, UserId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Type-specific part of an inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    /// Plain text message, optionally replying to an earlier event
    Text {
        /// Message body
        body: String,
        /// Event this message replies to
        reply_to: Option<EventId>,
    },
    /// Media upload referencing chat-server content
    Media {
        /// Content reference (`mxc://server/id`)
        content_uri: String,
        /// Size announced by the sender, if any
        declared_size: Option<u64>,
    },
    /// Retraction of an earlier event
    Redaction {
        /// The retracted event
        redacts: EventId,
    },
}

/// Event record handed to the bridge by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct InboundEvent {
    /// Sender identity
    sender: UserId,
    /// Room the event arrived in
    room: RoomId,
    /// Event identifier
    event_id: EventId,
    /// Type-specific payload
    payload: EventPayload,
}

impl InboundEvent {
    /// Create a new inbound event.
    pub fn new(
        sender: impl Into<UserId>,
        room: impl Into<RoomId>,
        event_id: impl Into<EventId>,
        payload: EventPayload,
    ) -> Self {
        Self {
            sender: sender.into(),
            room: room.into(),
            event_id: event_id.into(),
            payload,
        }
    }
}
