use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::content::{Category, ContentTable, Draw, SessionCyclers};

/// Opaque client-chosen session identifier.
///
/// Clients pick their own token (the reference client draws a random 31-bit
/// integer), so two clients can collide and will then share one rotation.
/// The server never assigns identities itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(pub i64);

impl FromStr for SessionToken {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(SessionToken)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// # Client Session
///
/// Delivery state for one session token: one [`crate::content::Cycler`] per
/// category. Sessions live for the lifetime of the process; nothing evicts
/// them.
///
/// Two requests bearing the same token may be served by different workers at
/// the same time, so the cyclers sit behind a per-session mutex. The lock is
/// only held for the draw itself, never across socket I/O.
#[derive(Debug)]
pub struct Session {
    token: SessionToken,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
}

#[derive(Debug)]
struct SessionState {
    cyclers: SessionCyclers,
    served: u64,
    last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(token: SessionToken, cyclers: SessionCyclers) -> Self {
        let now = Utc::now();
        Session {
            token,
            created_at: now,
            state: Mutex::new(SessionState {
                cyclers,
                served: 0,
                last_seen: now,
            }),
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Draw the next label of `category` for this session.
    pub fn next(&self, category: Category) -> Draw {
        let mut state = self.lock();
        state.served += 1;
        state.last_seen = Utc::now();
        state.cyclers.next(category)
    }

    /// Number of items served to this session so far.
    pub fn served(&self) -> u64 {
        self.lock().served
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.lock().last_seen
    }

    /// Labels left in the current permutation of `category`.
    pub fn remaining(&self, category: Category) -> usize {
        self.lock().cyclers.cycler(category).remaining()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keyed registry of sessions shared by all content workers.
///
/// A single mutex guards the map; the create path runs under that lock via the
/// entry API, so concurrent first requests for a new token construct exactly
/// one [`Session`] and every caller receives the same `Arc`.
#[derive(Debug)]
pub struct SessionStore {
    table: Arc<ContentTable>,
    sessions: Mutex<HashMap<SessionToken, Arc<Session>>>,
}

impl SessionStore {
    pub fn new(table: Arc<ContentTable>) -> Self {
        SessionStore {
            table,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return the session for `token`, creating it on first sight.
    pub fn lookup_or_create(&self, token: SessionToken) -> Arc<Session> {
        self.get_or_insert(token).0
    }

    /// Like [`lookup_or_create`](Self::lookup_or_create) but also reports
    /// whether this call created the session.
    pub fn get_or_insert(&self, token: SessionToken) -> (Arc<Session>, bool) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut created = false;
        let session = sessions
            .entry(token)
            .or_insert_with(|| {
                created = true;
                Arc::new(Session::new(token, SessionCyclers::new(&self.table)))
            })
            .clone();
        drop(sessions);
        if created {
            debug!("Session {} created", token);
        }
        (session, created)
    }

    pub fn get(&self, token: SessionToken) -> Option<Arc<Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&token)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn table(&self) -> &ContentTable {
        &self.table
    }
}
