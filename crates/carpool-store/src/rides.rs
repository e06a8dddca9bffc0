use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Result;
use carpool_types::models::{ChatRoom, RideOffer};
use uuid::Uuid;

use crate::chat::ChatRoomRegistry;
use crate::poisoned;

/// In-memory ride board. Offers are created by drivers and mutated by the
/// join/approve lifecycle; nothing in scope ever removes one.
#[derive(Clone, Default)]
pub struct RideBoard {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<RideOffer>>>>>,
}

#[derive(Debug)]
pub enum JoinOutcome {
    /// Appended to the requester sequence. Carries the driver identity for
    /// the post-commit notification.
    Joined { driver: String },
    /// Identity already in the sequence; nothing was appended.
    AlreadyRequested { driver: String },
    NotFound,
}

#[derive(Debug)]
pub enum ApproveOutcome {
    /// Newly approved; a chat room was provisioned for the pair.
    Approved { room_id: Uuid },
    /// The pair was approved earlier; the existing room is returned.
    AlreadyApproved { room_id: Uuid },
    NotOwner,
    /// The passenger never requested to join this ride.
    NotRequested,
    NotFound,
}

impl RideBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, ride: RideOffer) -> Result<()> {
        let mut map = self.inner.write().map_err(|_| poisoned("ride map"))?;
        map.insert(ride.id, Arc::new(Mutex::new(ride)));
        Ok(())
    }

    fn handle(&self, id: Uuid) -> Result<Option<Arc<Mutex<RideOffer>>>> {
        let map = self.inner.read().map_err(|_| poisoned("ride map"))?;
        Ok(map.get(&id).cloned())
    }

    /// Snapshot of one offer.
    pub fn get(&self, id: Uuid) -> Result<Option<RideOffer>> {
        match self.handle(id)? {
            Some(handle) => {
                let ride = handle.lock().map_err(|_| poisoned("ride"))?;
                Ok(Some(ride.clone()))
            }
            None => Ok(None),
        }
    }

    /// Snapshots of every offer, oldest first.
    pub fn list(&self) -> Result<Vec<RideOffer>> {
        let handles: Vec<_> = {
            let map = self.inner.read().map_err(|_| poisoned("ride map"))?;
            map.values().cloned().collect()
        };
        let mut rides = Vec::with_capacity(handles.len());
        for handle in handles {
            let ride = handle.lock().map_err(|_| poisoned("ride"))?;
            rides.push(ride.clone());
        }
        rides.sort_by_key(|r| r.created_at);
        Ok(rides)
    }

    /// Append `passenger` to the ride's requester sequence, deduped by
    /// identity. Concurrent joins on the same ride serialize on the ride
    /// lock, so arrival order is preserved and no append is lost.
    pub fn join(&self, id: Uuid, passenger: &str) -> Result<JoinOutcome> {
        let Some(handle) = self.handle(id)? else {
            return Ok(JoinOutcome::NotFound);
        };
        let mut ride = handle.lock().map_err(|_| poisoned("ride"))?;
        if ride.requesters.iter().any(|r| r == passenger) {
            return Ok(JoinOutcome::AlreadyRequested {
                driver: ride.driver.clone(),
            });
        }
        ride.requesters.push(passenger.to_string());
        Ok(JoinOutcome::Joined {
            driver: ride.driver.clone(),
        })
    }

    /// Approve a prior requester and provision the pair's chat room.
    ///
    /// The approved map doubles as the check-and-set guard: the room is
    /// created and recorded under the ride lock, so racing approvals of the
    /// same (ride, passenger) pair yield exactly one room. Lock order is
    /// always ride, then room map.
    pub fn approve(
        &self,
        id: Uuid,
        caller: &str,
        passenger: &str,
        rooms: &ChatRoomRegistry,
    ) -> Result<ApproveOutcome> {
        let Some(handle) = self.handle(id)? else {
            return Ok(ApproveOutcome::NotFound);
        };
        let mut ride = handle.lock().map_err(|_| poisoned("ride"))?;
        if ride.driver != caller {
            return Ok(ApproveOutcome::NotOwner);
        }
        if !ride.requesters.iter().any(|r| r == passenger) {
            return Ok(ApproveOutcome::NotRequested);
        }
        if let Some(room_id) = ride.approved.get(passenger) {
            return Ok(ApproveOutcome::AlreadyApproved { room_id: *room_id });
        }

        let room_id = Uuid::new_v4();
        rooms.provision(ChatRoom {
            id: room_id,
            ride_id: ride.id,
            participants: [ride.driver.clone(), passenger.to_string()],
            messages: Vec::new(),
        })?;
        ride.approved.insert(passenger.to_string(), room_id);
        Ok(ApproveOutcome::Approved { room_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ride(driver: &str) -> RideOffer {
        RideOffer {
            id: Uuid::new_v4(),
            driver: driver.into(),
            departure: "Tokyo".into(),
            destination: "Kyoto".into(),
            departs_at: chrono::Utc::now(),
            capacity: 2,
            requesters: Vec::new(),
            approved: BTreeMap::new(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn join_preserves_arrival_order_and_dedupes() {
        let board = RideBoard::new();
        let offer = ride("driver@example.com");
        let id = offer.id;
        board.insert(offer).unwrap();

        assert!(matches!(
            board.join(id, "p1@example.com").unwrap(),
            JoinOutcome::Joined { .. }
        ));
        assert!(matches!(
            board.join(id, "p2@example.com").unwrap(),
            JoinOutcome::Joined { .. }
        ));
        assert!(matches!(
            board.join(id, "p1@example.com").unwrap(),
            JoinOutcome::AlreadyRequested { .. }
        ));

        let snapshot = board.get(id).unwrap().unwrap();
        assert_eq!(snapshot.requesters, ["p1@example.com", "p2@example.com"]);
    }

    #[test]
    fn approve_requires_owner_and_prior_request() {
        let board = RideBoard::new();
        let rooms = ChatRoomRegistry::new();
        let offer = ride("driver@example.com");
        let id = offer.id;
        board.insert(offer).unwrap();
        board.join(id, "p1@example.com").unwrap();

        assert!(matches!(
            board
                .approve(id, "other@example.com", "p1@example.com", &rooms)
                .unwrap(),
            ApproveOutcome::NotOwner
        ));
        assert!(matches!(
            board
                .approve(id, "driver@example.com", "stranger@example.com", &rooms)
                .unwrap(),
            ApproveOutcome::NotRequested
        ));

        let ApproveOutcome::Approved { room_id } = board
            .approve(id, "driver@example.com", "p1@example.com", &rooms)
            .unwrap()
        else {
            panic!("owner approving a requester must succeed");
        };

        let room = rooms.get(room_id).unwrap().unwrap();
        assert_eq!(room.ride_id, id);
        assert!(room.has_participant("driver@example.com"));
        assert!(room.has_participant("p1@example.com"));

        // approved set stays a subset of the requester sequence
        let snapshot = board.get(id).unwrap().unwrap();
        for approved in snapshot.approved.keys() {
            assert!(snapshot.requesters.contains(approved));
        }
    }

    #[test]
    fn repeat_approval_reuses_the_room() {
        let board = RideBoard::new();
        let rooms = ChatRoomRegistry::new();
        let offer = ride("driver@example.com");
        let id = offer.id;
        board.insert(offer).unwrap();
        board.join(id, "p1@example.com").unwrap();

        let ApproveOutcome::Approved { room_id } = board
            .approve(id, "driver@example.com", "p1@example.com", &rooms)
            .unwrap()
        else {
            panic!("first approval must create a room");
        };
        let ApproveOutcome::AlreadyApproved { room_id: second } = board
            .approve(id, "driver@example.com", "p1@example.com", &rooms)
            .unwrap()
        else {
            panic!("second approval must reuse the room");
        };
        assert_eq!(room_id, second);
    }

    #[test]
    fn racing_approvals_create_one_room() {
        let board = RideBoard::new();
        let rooms = ChatRoomRegistry::new();
        let offer = ride("driver@example.com");
        let id = offer.id;
        board.insert(offer).unwrap();
        board.join(id, "p1@example.com").unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let board = board.clone();
            let rooms = rooms.clone();
            handles.push(std::thread::spawn(move || {
                board
                    .approve(id, "driver@example.com", "p1@example.com", &rooms)
                    .unwrap()
            }));
        }

        let mut created = Vec::new();
        let mut reused = Vec::new();
        for handle in handles {
            match handle.join().unwrap() {
                ApproveOutcome::Approved { room_id } => created.push(room_id),
                ApproveOutcome::AlreadyApproved { room_id } => reused.push(room_id),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(created.len(), 1);
        assert!(reused.iter().all(|r| *r == created[0]));
    }

    #[test]
    fn concurrent_joins_lose_no_requester() {
        let board = RideBoard::new();
        let offer = ride("driver@example.com");
        let id = offer.id;
        board.insert(offer).unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let board = board.clone();
            handles.push(std::thread::spawn(move || {
                board.join(id, &format!("p{i}@example.com")).unwrap()
            }));
        }
        for handle in handles {
            assert!(matches!(handle.join().unwrap(), JoinOutcome::Joined { .. }));
        }
        assert_eq!(board.get(id).unwrap().unwrap().requesters.len(), 16);
    }
}
