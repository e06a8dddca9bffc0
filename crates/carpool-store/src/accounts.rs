use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Result;
use carpool_types::models::Account;

use crate::poisoned;

/// In-memory account repository keyed by identity (email).
#[derive(Clone, Default)]
pub struct AccountStore {
    inner: Arc<RwLock<HashMap<String, Arc<Mutex<Account>>>>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new account. Returns false without touching the map if the
    /// identity is already registered.
    pub fn insert(&self, account: Account) -> Result<bool> {
        let mut map = self.inner.write().map_err(|_| poisoned("account map"))?;
        if map.contains_key(&account.email) {
            return Ok(false);
        }
        map.insert(account.email.clone(), Arc::new(Mutex::new(account)));
        Ok(true)
    }

    fn handle(&self, identity: &str) -> Result<Option<Arc<Mutex<Account>>>> {
        let map = self.inner.read().map_err(|_| poisoned("account map"))?;
        Ok(map.get(identity).cloned())
    }

    /// Snapshot of the account for `identity`.
    pub fn find(&self, identity: &str) -> Result<Option<Account>> {
        match self.handle(identity)? {
            Some(handle) => {
                let account = handle.lock().map_err(|_| poisoned("account"))?;
                Ok(Some(account.clone()))
            }
            None => Ok(None),
        }
    }

    /// Run a closure against the account record under its own lock.
    /// Returns None if the identity is unknown.
    pub fn update<F, T>(&self, identity: &str, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Account) -> T,
    {
        match self.handle(identity)? {
            Some(handle) => {
                let mut account = handle.lock().map_err(|_| poisoned("account"))?;
                Ok(Some(f(&mut account)))
            }
            None => Ok(None),
        }
    }

    /// Resolve a pending verification token, flip the verified flag and
    /// consume the token. Returns the verified identity, or None if no
    /// account holds this token (including tokens already used).
    pub fn confirm(&self, token: &str) -> Result<Option<String>> {
        let handles: Vec<_> = {
            let map = self.inner.read().map_err(|_| poisoned("account map"))?;
            map.values().cloned().collect()
        };
        for handle in handles {
            let mut account = handle.lock().map_err(|_| poisoned("account"))?;
            if account.verify_token.as_deref() == Some(token) {
                account.verified = true;
                account.verify_token = None;
                return Ok(Some(account.email.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpool_types::models::Role;

    fn account(email: &str) -> Account {
        Account {
            email: email.into(),
            name: "Test".into(),
            role: Role::Passenger,
            password_hash: "$argon2id$stub".into(),
            verified: false,
            verify_token: Some("tok-123".into()),
            vehicle_info: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn insert_rejects_duplicate_identity() {
        let store = AccountStore::new();
        assert!(store.insert(account("a@example.com")).unwrap());
        assert!(!store.insert(account("a@example.com")).unwrap());
    }

    #[test]
    fn confirm_consumes_token_exactly_once() {
        let store = AccountStore::new();
        store.insert(account("a@example.com")).unwrap();

        let verified = store.confirm("tok-123").unwrap();
        assert_eq!(verified.as_deref(), Some("a@example.com"));

        let found = store.find("a@example.com").unwrap().unwrap();
        assert!(found.verified);
        assert!(found.verify_token.is_none());

        // second use of the same token
        assert!(store.confirm("tok-123").unwrap().is_none());
    }

    #[test]
    fn update_edits_mutable_fields() {
        let store = AccountStore::new();
        store.insert(account("a@example.com")).unwrap();

        let updated = store
            .update("a@example.com", |acct| {
                acct.name = "Renamed".into();
            })
            .unwrap();
        assert!(updated.is_some());
        assert_eq!(store.find("a@example.com").unwrap().unwrap().name, "Renamed");

        assert!(store.update("missing@example.com", |_| ()).unwrap().is_none());
    }
}
