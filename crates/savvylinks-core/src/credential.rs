//! Credential store
//!
//! Holds the API token and notifies subscribers synchronously whenever it
//! is replaced. The refresh scheduler is the main subscriber.

use std::fmt;
use std::sync::{Mutex, RwLock};

use tracing::debug;

/// An opaque API token
///
/// An empty (or whitespace-only) token means "unauthenticated".
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Unauthenticated credential
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Raw token, for the Authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Handle returned by [`CredentialStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&Credential) + Send + Sync>;

struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

/// Mutable token with change notification
///
/// Listeners run on the caller's thread before `set` returns, so they must
/// not block and must not call `set` themselves.
pub struct CredentialStore {
    current: RwLock<Credential>,
    subscribers: Mutex<Subscribers>,
}

impl CredentialStore {
    pub fn new(initial: Credential) -> Self {
        Self {
            current: RwLock::new(initial),
            subscribers: Mutex::new(Subscribers {
                next_id: 0,
                listeners: Vec::new(),
            }),
        }
    }

    /// Current credential
    pub fn get(&self) -> Credential {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the credential and notify every listener
    pub fn set(&self, credential: Credential) {
        {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            *current = credential.clone();
        }

        let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        debug!(
            "Credential changed, notifying {} listener(s)",
            subscribers.listeners.len()
        );
        for (_, listener) in &subscribers.listeners {
            listener(&credential);
        }
    }

    /// Register a change listener
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Credential) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        let id = SubscriptionId(subscribers.next_id);
        subscribers.next_id += 1;
        subscribers.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        let before = subscribers.listeners.len();
        subscribers.listeners.retain(|(sid, _)| *sid != id);
        subscribers.listeners.len() != before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .listeners
            .len()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(Credential::empty())
    }
}
