use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Passenger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Identity: the unique key every other record refers to.
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Argon2 PHC string. Opaque outside the auth handlers.
    pub password_hash: String,
    pub verified: bool,
    /// Pending email-confirmation token, consumed when the account is verified.
    pub verify_token: Option<String>,
    /// Drivers only.
    pub vehicle_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideOffer {
    pub id: Uuid,
    /// Identity of the owning driver. Lookup reference into the account store.
    pub driver: String,
    pub departure: String,
    pub destination: String,
    pub departs_at: DateTime<Utc>,
    pub capacity: u32,
    /// Join requests in arrival order, deduped by identity.
    pub requesters: Vec<String>,
    /// Approved passenger identity -> chat room id.
    /// Key set is always a subset of `requesters`.
    pub approved: BTreeMap<String, Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: Uuid,
    /// Back-reference only; the ride does not own the room.
    pub ride_id: Uuid,
    /// Fixed at creation: the ride's driver and one approved passenger.
    pub participants: [String; 2],
    pub messages: Vec<ChatMessage>,
}

impl ChatRoom {
    pub fn has_participant(&self, identity: &str) -> bool {
        self.participants.iter().any(|p| p == identity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub body: String,
    /// Server-assigned; non-decreasing within a room.
    pub sent_at: DateTime<Utc>,
}
