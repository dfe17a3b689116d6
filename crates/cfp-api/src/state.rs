//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The in-memory stores are the source of truth while the process runs.
//! When a database is configured every mutation is written through to it,
//! and the stores are hydrated from it on startup.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::PgPool;

use cfp_core::{AttendeeId, EmailAddress, PaperId};
use cfp_state::{Actor, Attendee, Paper, ReviewRegistry, Timeline};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot` and is never held across `.await`.
#[derive(Debug)]
pub struct Store<K, T> {
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<K, T> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + Hash + Copy, T: Clone> Store<K, T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: K, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Insert unless some existing record satisfies `conflicts`.
    ///
    /// The scan and insert happen under one write lock. Returns `false`
    /// without inserting when a conflict is found.
    pub fn insert_unless(&self, id: K, value: T, conflicts: impl Fn(&T) -> bool) -> bool {
        let mut guard = self.data.write();
        if guard.values().any(conflicts) {
            return false;
        }
        guard.insert(id, value);
        true
    }

    pub fn get(&self, id: &K) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(&self, id: &K, f: impl FnOnce(&mut T) -> Result<R, E>) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    pub fn remove(&self, id: &K) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Remove a record only if `check` accepts it, under one write lock.
    ///
    /// Returns `None` if the record doesn't exist.
    pub fn remove_if<E>(&self, id: &K, check: impl FnOnce(&T) -> Result<(), E>) -> Option<Result<T, E>> {
        let mut guard = self.data.write();
        if let Err(e) = check(guard.get(id)?) {
            return Some(Err(e));
        }
        guard.remove(id).map(Ok)
    }

    /// Put `previous` back only while the record still equals `current`.
    ///
    /// Undoes one request's own write without clobbering a later one.
    /// Returns whether the record was restored.
    pub fn restore_if_unchanged(&self, id: &K, current: &T, previous: T) -> bool
    where
        T: PartialEq,
    {
        let mut guard = self.data.write();
        match guard.get_mut(id) {
            Some(record) if record == current => {
                *record = previous;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: &K) -> bool {
        self.data.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Copy, T: Clone> Default for Store<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Configuration ------------------------------------------------------------

/// Service configuration.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Shared secret for bearer tokens. `None` disables the secret check.
    pub auth_token: Option<String>,
    /// Addresses granted the organizer capability when they sign up.
    pub organizer_emails: Vec<EmailAddress>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("organizer_emails", &self.organizer_emails)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            organizer_emails: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Parse a comma separated `ORGANIZER_EMAILS` value. Invalid entries
    /// are skipped with a warning.
    pub fn parse_organizer_emails(raw: &str) -> Vec<EmailAddress> {
        raw.split(',')
            .filter(|s| !s.trim().is_empty())
            .filter_map(|s| match EmailAddress::parse(s) {
                Ok(email) => Some(email),
                Err(e) => {
                    tracing::warn!(entry = %s.trim(), error = %e, "ignoring invalid ORGANIZER_EMAILS entry");
                    None
                }
            })
            .collect()
    }
}

// -- Application State --------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppState {
    pub attendees: Store<AttendeeId, Attendee>,
    pub papers: Store<PaperId, Paper>,
    /// Reviews sit behind one lock so the `(paper, reviewer)` uniqueness
    /// check and the insert are atomic.
    pub reviews: Arc<RwLock<ReviewRegistry>>,
    pub timeline: Arc<RwLock<Timeline>>,
    /// Held for a whole timeline move, database write included, so at most
    /// one move is in flight.
    pub timeline_moves: Arc<tokio::sync::Mutex<()>>,
    /// `None` runs the service in-memory only.
    pub db_pool: Option<PgPool>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            attendees: Store::new(),
            papers: Store::new(),
            reviews: Arc::new(RwLock::new(ReviewRegistry::new())),
            timeline: Arc::new(RwLock::new(Timeline::new())),
            timeline_moves: Arc::new(tokio::sync::Mutex::new(())),
            db_pool,
            config,
        }
    }

    /// Resolve an attendee into an [`Actor`] with effective capabilities.
    ///
    /// Speaker eligibility is recomputed from the current paper set.
    pub fn actor(&self, id: AttendeeId) -> Option<Actor> {
        let attendee = self.attendees.get(&id)?;
        let papers = self.papers.list();
        Some(Actor::new(id, attendee.effective_capabilities(papers.iter())))
    }

    /// Whether `email` should receive the organizer capability at signup.
    pub fn is_bootstrap_organizer(&self, email: &EmailAddress) -> bool {
        self.config.organizer_emails.iter().any(|e| e == email)
    }

    /// Load all records from the database into the in-memory stores.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let attendees = crate::db::attendees::load_all(pool)
            .await
            .map_err(|e| format!("failed to load attendees: {e}"))?;
        let attendee_count = attendees.len();
        for record in attendees {
            self.attendees.insert(record.id, record);
        }

        let papers = crate::db::papers::load_all(pool)
            .await
            .map_err(|e| format!("failed to load papers: {e}"))?;
        let paper_count = papers.len();
        for record in papers {
            self.papers.insert(record.id, record);
        }

        let reviews = crate::db::reviews::load_all(pool)
            .await
            .map_err(|e| format!("failed to load reviews: {e}"))?;
        let review_count = reviews.len();
        *self.reviews.write() = reviews.into_iter().collect();

        let timeline = crate::db::events::load_timeline(pool)
            .await
            .map_err(|e| format!("failed to load timeline: {e}"))?;
        let current = timeline.current();
        *self.timeline.write() = timeline;

        tracing::info!(
            attendees = attendee_count,
            papers = paper_count,
            reviews = review_count,
            current_milestone = %current,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_insert_unless_rejects_conflicts() {
        let store: Store<u32, &str> = Store::new();
        assert!(store.insert_unless(1, "a@x.org", |v| *v == "a@x.org"));
        assert!(!store.insert_unless(2, "a@x.org", |v| *v == "a@x.org"));
        assert_eq!(store.len(), 1);
        assert!(store.contains(&1));
    }

    #[test]
    fn store_try_update_reports_missing() {
        let store: Store<u32, i32> = Store::new();
        assert!(store.try_update(&1, |v| Ok::<_, ()>(*v)).is_none());
        store.insert(1, 10);
        let out = store.try_update(&1, |v| {
            *v += 1;
            Ok::<_, ()>(*v)
        });
        assert_eq!(out, Some(Ok(11)));
    }

    #[test]
    fn store_remove_if_keeps_rejected_records() {
        let store: Store<u32, i32> = Store::new();
        assert!(store.remove_if(&1, |_| Ok::<_, ()>(())).is_none());
        store.insert(1, 10);
        assert_eq!(store.remove_if(&1, |v| if *v > 5 { Err("locked") } else { Ok(()) }), Some(Err("locked")));
        assert_eq!(store.get(&1), Some(10));
        assert_eq!(store.remove_if(&1, |_| Ok::<_, ()>(())), Some(Ok(10)));
        assert!(store.is_empty());
    }

    #[test]
    fn store_restore_if_unchanged_spares_later_writes() {
        let store: Store<u32, &str> = Store::new();
        // Our write produced "second"; a later writer replaced it.
        store.insert(1, "third");
        assert!(!store.restore_if_unchanged(&1, &"second", "first"));
        assert_eq!(store.get(&1), Some("third"));

        assert!(store.restore_if_unchanged(&1, &"third", "second"));
        assert_eq!(store.get(&1), Some("second"));
        assert!(!store.restore_if_unchanged(&2, &"x", "y"));
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("hunter2".into()),
            ..Default::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn organizer_emails_parse_and_skip_garbage() {
        let emails = AppConfig::parse_organizer_emails(" Chair@Conf.org , nonsense ,, pc@conf.org");
        let rendered: Vec<&str> = emails.iter().map(|e| e.as_str()).collect();
        assert_eq!(rendered, vec!["chair@conf.org", "pc@conf.org"]);
    }

    #[test]
    fn new_state_starts_at_signup() {
        let state = AppState::new();
        assert_eq!(state.timeline.read().current(), cfp_state::Milestone::Signup);
        assert!(state.attendees.is_empty());
    }
}
