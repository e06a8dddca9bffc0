use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ChatMessage, RideOffer, Role};

// -- JWT Claims --

/// JWT claims shared between the auth handlers and the bearer-token
/// middleware. Canonical definition lives here in carpool-types.
/// `sub` is the account identity (email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub vehicle_info: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub email: String,
    /// Whether the verification mail was handed to the relay. Registration
    /// itself succeeds either way.
    pub notified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub verified: bool,
    pub vehicle_info: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub vehicle_info: Option<String>,
}

// -- Rides --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRideRequest {
    pub departure: String,
    pub destination: String,
    pub departs_at: DateTime<Utc>,
    pub capacity: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRideResponse {
    pub ride_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RideResponse {
    pub id: Uuid,
    pub driver: String,
    pub departure: String,
    pub destination: String,
    pub departs_at: DateTime<Utc>,
    pub capacity: u32,
    pub requesters: Vec<String>,
    pub approved: Vec<String>,
}

impl From<RideOffer> for RideResponse {
    fn from(ride: RideOffer) -> Self {
        Self {
            id: ride.id,
            driver: ride.driver,
            departure: ride.departure,
            destination: ride.destination,
            departs_at: ride.departs_at,
            capacity: ride.capacity,
            requesters: ride.requesters,
            approved: ride.approved.into_keys().collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRideResponse {
    pub ride_id: Uuid,
    /// True when the caller had already requested this ride; the sequence is
    /// left untouched in that case.
    pub already_requested: bool,
    pub notified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovePassengerRequest {
    pub passenger: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApprovePassengerResponse {
    pub room_id: Uuid,
    /// True when the pair was approved earlier; `room_id` is the existing room.
    pub already_approved: bool,
    pub notified: bool,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub sender: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageResponse {
    fn from(msg: ChatMessage) -> Self {
        Self {
            sender: msg.sender,
            body: msg.body,
            sent_at: msg.sent_at,
        }
    }
}
