//! Credential Storage
//! Mission: Hold principal records in memory and keep emails unique

use crate::auth::models::{Principal, PrincipalId};
use crate::auth::password::{generate_salt, PasswordError, VerifierScheme};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Password(#[from] PasswordError),
}

#[derive(Default)]
struct Inner {
    principals: Vec<Principal>,
    by_email: HashMap<String, usize>,
    next_id: PrincipalId,
}

/// Process-lifetime principal store. Records are append-only; the backing
/// container is never handed out.
pub struct CredentialStore {
    scheme: Arc<dyn VerifierScheme>,
    inner: Mutex<Inner>,
}

impl CredentialStore {
    pub fn new(scheme: Arc<dyn VerifierScheme>) -> Self {
        Self {
            scheme,
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
        }
    }

    /// Verifier scheme shared with the authenticator
    pub fn scheme(&self) -> &Arc<dyn VerifierScheme> {
        &self.scheme
    }

    /// Register a new principal. Fails with `DuplicateEmail` on an exact,
    /// case-sensitive match.
    pub fn register(&self, email: &str, password: &str) -> Result<Principal, StoreError> {
        // Cheap early rejection; the authoritative check is repeated under the lock.
        if self.inner.lock().by_email.contains_key(email) {
            return Err(StoreError::DuplicateEmail);
        }

        let salt = generate_salt();
        let verifier = self.scheme.derive(password, &salt)?;

        let mut inner = self.inner.lock();
        if inner.by_email.contains_key(email) {
            return Err(StoreError::DuplicateEmail);
        }

        let principal = Principal {
            id: inner.next_id,
            email: email.to_string(),
            verifier,
            salt,
            created_at: Utc::now(),
        };
        inner.next_id += 1;

        let index = inner.principals.len();
        inner.principals.push(principal.clone());
        inner.by_email.insert(principal.email.clone(), index);

        debug!(principal_id = principal.id, "principal stored");
        Ok(principal)
    }

    /// Look up a principal by exact email
    pub fn find_by_email(&self, email: &str) -> Option<Principal> {
        let inner = self.inner.lock();
        inner
            .by_email
            .get(email)
            .and_then(|&index| inner.principals.get(index))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::fast_scheme;
    use std::collections::HashSet;

    fn create_test_store() -> CredentialStore {
        CredentialStore::new(Arc::new(fast_scheme()))
    }

    #[test]
    fn test_register_and_find() {
        let store = create_test_store();

        let principal = store.register("alice@example.com", "Secr3tPW").unwrap();
        assert_eq!(principal.id, 1);
        assert_eq!(principal.email, "alice@example.com");
        assert_ne!(principal.verifier, "Secr3tPW");

        let found = store.find_by_email("alice@example.com").unwrap();
        assert_eq!(found.id, principal.id);
        assert_eq!(found.verifier, principal.verifier);
        assert!(store
            .scheme()
            .verify("Secr3tPW", &found.salt, &found.verifier));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = create_test_store();

        store.register("alice@example.com", "Secr3tPW").unwrap();
        let second = store.register("alice@example.com", "different");
        assert!(matches!(second, Err(StoreError::DuplicateEmail)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_email_match_is_case_sensitive() {
        let store = create_test_store();

        store.register("alice@example.com", "pw").unwrap();
        store.register("Alice@example.com", "pw").unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.find_by_email("ALICE@EXAMPLE.COM").is_none());
    }

    #[test]
    fn test_ids_monotonic_and_salts_unique() {
        let store = create_test_store();

        let a = store.register("a@example.com", "same").unwrap();
        let b = store.register("b@example.com", "same").unwrap();
        let _ = store.register("a@example.com", "same");
        let c = store.register("c@example.com", "same").unwrap();

        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.verifier, b.verifier);
    }

    #[test]
    fn test_find_unknown_email() {
        let store = create_test_store();
        assert!(store.is_empty());
        assert!(store.find_by_email("nobody@example.com").is_none());
    }

    #[test]
    fn test_concurrent_same_email_single_winner() {
        let store = Arc::new(create_test_store());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.register("race@example.com", &format!("pw{}", i))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::DuplicateEmail)))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_distinct_emails_unique_ids() {
        let store = Arc::new(create_test_store());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .register(&format!("user{}@example.com", i), "pw")
                        .unwrap()
                        .id
                })
            })
            .collect();

        let ids: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 16);
        assert_eq!(store.len(), 16);
    }
}
