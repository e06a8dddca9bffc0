use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use carpool_store::rides::{ApproveOutcome, JoinOutcome};
use carpool_types::api::{
    ApprovePassengerRequest, ApprovePassengerResponse, Claims, CreateRideRequest,
    CreateRideResponse, JoinRideResponse, RideResponse,
};
use carpool_types::models::{RideOffer, Role};

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RideQuery {
    pub departure: Option<String>,
    pub destination: Option<String>,
    /// Calendar date of departure, `YYYY-MM-DD`.
    pub date: Option<NaiveDate>,
}

pub async fn create_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateRideRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Driver {
        return Err(ApiError::RoleMismatch("only drivers can post ride offers"));
    }
    if req.capacity == 0 {
        return Err(ApiError::Validation("capacity must be positive".into()));
    }
    if req.departure.is_empty() || req.destination.is_empty() {
        return Err(ApiError::Validation(
            "departure and destination are required".into(),
        ));
    }

    let ride = RideOffer {
        id: Uuid::new_v4(),
        driver: claims.sub,
        departure: req.departure,
        destination: req.destination,
        departs_at: req.departs_at,
        capacity: req.capacity,
        requesters: Vec::new(),
        approved: Default::default(),
        created_at: chrono::Utc::now(),
    };
    let ride_id = ride.id;
    state.store.rides.insert(ride)?;

    Ok((StatusCode::CREATED, Json(CreateRideResponse { ride_id })))
}

/// Unfiltered listing, or exact-match search when departure, destination and
/// date are all given.
pub async fn list_rides(
    State(state): State<AppState>,
    Query(query): Query<RideQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rides = state.store.rides.list()?;

    let rides: Vec<RideResponse> = match (&query.departure, &query.destination, query.date) {
        (Some(departure), Some(destination), Some(date)) => rides
            .into_iter()
            .filter(|r| {
                r.departure == *departure
                    && r.destination == *destination
                    && r.departs_at.date_naive() == date
            })
            .map(RideResponse::from)
            .collect(),
        _ => rides.into_iter().map(RideResponse::from).collect(),
    };

    Ok(Json(rides))
}

pub async fn get_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ride = state
        .store
        .rides
        .get(ride_id)?
        .ok_or(ApiError::NotFound("ride"))?;
    Ok(Json(RideResponse::from(ride)))
}

pub async fn join_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Passenger {
        return Err(ApiError::RoleMismatch("only passengers can join a ride"));
    }

    // The join commits under the ride lock; the driver notification runs
    // after, with no lock held.
    let (driver, already_requested) = match state.store.rides.join(ride_id, &claims.sub)? {
        JoinOutcome::Joined { driver } => (driver, false),
        JoinOutcome::AlreadyRequested { driver } => (driver, true),
        JoinOutcome::NotFound => return Err(ApiError::NotFound("ride")),
    };

    let notified = if already_requested {
        false
    } else {
        state
            .notifier
            .deliver_best_effort(
                &driver,
                "New join request",
                &format!("{} asked to join your ride.", claims.sub),
            )
            .await
    };

    Ok(Json(JoinRideResponse {
        ride_id,
        already_requested,
        notified,
    }))
}

pub async fn approve_passenger(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ApprovePassengerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome =
        state
            .store
            .rides
            .approve(ride_id, &claims.sub, &req.passenger, &state.store.rooms)?;

    let (room_id, already_approved) = match outcome {
        ApproveOutcome::Approved { room_id } => (room_id, false),
        ApproveOutcome::AlreadyApproved { room_id } => (room_id, true),
        ApproveOutcome::NotOwner => {
            return Err(ApiError::Forbidden("only the ride owner can approve"));
        }
        ApproveOutcome::NotRequested => {
            return Err(ApiError::Validation(
                "passenger has not requested this ride".into(),
            ));
        }
        ApproveOutcome::NotFound => return Err(ApiError::NotFound("ride")),
    };

    let notified = if already_approved {
        false
    } else {
        state
            .notifier
            .deliver_best_effort(
                &req.passenger,
                "Join request approved",
                "Your join request was approved. A chat with the driver is open.",
            )
            .await
    };

    Ok(Json(ApprovePassengerResponse {
        room_id,
        already_approved,
        notified,
    }))
}
