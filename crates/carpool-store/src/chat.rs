use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Result;
use carpool_types::models::{ChatMessage, ChatRoom};
use uuid::Uuid;

use crate::poisoned;

/// In-memory chat room registry. Rooms are provisioned by ride approval and
/// never destroyed; their participant pair is fixed at creation.
#[derive(Clone, Default)]
pub struct ChatRoomRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<ChatRoom>>>>>,
}

#[derive(Debug)]
pub enum SendOutcome {
    Sent(ChatMessage),
    NotParticipant,
    NotFound,
}

#[derive(Debug)]
pub enum HistoryOutcome {
    Messages(Vec<ChatMessage>),
    NotParticipant,
    NotFound,
}

impl ChatRoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn provision(&self, room: ChatRoom) -> Result<()> {
        let mut map = self.inner.write().map_err(|_| poisoned("room map"))?;
        map.insert(room.id, Arc::new(Mutex::new(room)));
        Ok(())
    }

    fn handle(&self, room_id: Uuid) -> Result<Option<Arc<Mutex<ChatRoom>>>> {
        let map = self.inner.read().map_err(|_| poisoned("room map"))?;
        Ok(map.get(&room_id).cloned())
    }

    /// Snapshot of a room, membership not checked. Gated callers should use
    /// `send` / `history` instead.
    pub fn get(&self, room_id: Uuid) -> Result<Option<ChatRoom>> {
        match self.handle(room_id)? {
            Some(handle) => {
                let room = handle.lock().map_err(|_| poisoned("room"))?;
                Ok(Some(room.clone()))
            }
            None => Ok(None),
        }
    }

    /// Append a message to the room. The timestamp is assigned under the room
    /// lock, so append order and timestamp order agree.
    pub fn send(&self, room_id: Uuid, sender: &str, body: String) -> Result<SendOutcome> {
        let Some(handle) = self.handle(room_id)? else {
            return Ok(SendOutcome::NotFound);
        };
        let mut room = handle.lock().map_err(|_| poisoned("room"))?;
        if !room.has_participant(sender) {
            return Ok(SendOutcome::NotParticipant);
        }
        let message = ChatMessage {
            sender: sender.to_string(),
            body,
            sent_at: chrono::Utc::now(),
        };
        room.messages.push(message.clone());
        Ok(SendOutcome::Sent(message))
    }

    /// Full message sequence in append order.
    pub fn history(&self, room_id: Uuid, requester: &str) -> Result<HistoryOutcome> {
        let Some(handle) = self.handle(room_id)? else {
            return Ok(HistoryOutcome::NotFound);
        };
        let room = handle.lock().map_err(|_| poisoned("room"))?;
        if !room.has_participant(requester) {
            return Ok(HistoryOutcome::NotParticipant);
        }
        Ok(HistoryOutcome::Messages(room.messages.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_room() -> (ChatRoomRegistry, Uuid) {
        let registry = ChatRoomRegistry::new();
        let room_id = Uuid::new_v4();
        registry
            .provision(ChatRoom {
                id: room_id,
                ride_id: Uuid::new_v4(),
                participants: ["driver@example.com".into(), "p1@example.com".into()],
                messages: Vec::new(),
            })
            .unwrap();
        (registry, room_id)
    }

    #[test]
    fn messages_come_back_in_append_order() {
        let (registry, room_id) = registry_with_room();
        for body in ["first", "second", "third"] {
            let outcome = registry.send(room_id, "p1@example.com", body.into()).unwrap();
            assert!(matches!(outcome, SendOutcome::Sent(_)));
        }

        let HistoryOutcome::Messages(messages) =
            registry.history(room_id, "driver@example.com").unwrap()
        else {
            panic!("driver is a participant");
        };
        let bodies: Vec<_> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["first", "second", "third"]);
        assert!(messages.windows(2).all(|w| w[0].sent_at <= w[1].sent_at));
    }

    #[test]
    fn third_identity_is_not_a_participant() {
        let (registry, room_id) = registry_with_room();
        let outcome = registry.send(room_id, "p2@example.com", "hi".into()).unwrap();
        assert!(matches!(outcome, SendOutcome::NotParticipant));

        let outcome = registry.history(room_id, "p2@example.com").unwrap();
        assert!(matches!(outcome, HistoryOutcome::NotParticipant));
    }

    #[test]
    fn unknown_room_reports_not_found() {
        let registry = ChatRoomRegistry::new();
        let outcome = registry.send(Uuid::new_v4(), "p1@example.com", "hi".into()).unwrap();
        assert!(matches!(outcome, SendOutcome::NotFound));
    }
}
