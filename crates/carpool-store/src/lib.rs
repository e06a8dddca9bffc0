pub mod accounts;
pub mod chat;
pub mod rides;

use accounts::AccountStore;
use chat::ChatRoomRegistry;
use rides::RideBoard;

/// Shared handle over every in-memory repository. Cheap to clone; all clones
/// see the same records.
///
/// Locking discipline: each repository holds a map of record handles behind
/// an `RwLock`, and each record behind its own `Mutex`. The map lock is held
/// only to resolve a handle; record mutation happens under the record's own
/// lock, so concurrent operations on different records never serialize
/// against each other.
#[derive(Clone, Default)]
pub struct Store {
    pub accounts: AccountStore,
    pub rides: RideBoard,
    pub rooms: ChatRoomRegistry,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn poisoned(what: &str) -> anyhow::Error {
    anyhow::anyhow!("{what} lock poisoned")
}
