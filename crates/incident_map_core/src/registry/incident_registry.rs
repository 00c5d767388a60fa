//! In-memory incident registry.
//!
//! # Responsibility
//! - Own every `Incident` record and its map anchor.
//! - Validate inputs, apply mutations and publish change notifications.
//!
//! # Invariants
//! - One mutex guards the list, the sequence counter and the event queue, so
//!   title numbering and insertion are atomic.
//! - Reads return snapshot copies; callers never observe a half-applied
//!   mutation.
//! - Failed operations leave state untouched and emit nothing.
//! - Events are delivered in commit order, outside the state lock.
//! - A subscriber receives exactly the events committed after its snapshot.
//! - An observer panic ends the current drain only; queued events go out with
//!   the next mutation.

use crate::config::{RegistryConfig, TitleNumbering};
use crate::model::geo::Coordinate;
use crate::model::incident::{
    default_title, normalize_title, Incident, IncidentId, IncidentValidationError,
};
use crate::registry::events::{IncidentObserver, RegistryEvent, SubscriptionId};
use crate::registry::filter::IncidentFilter;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Recoverable registry failures returned to callers.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    Validation(IncidentValidationError),
    NotFound(IncidentId),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "incident not found: {id}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<IncidentValidationError> for RegistryError {
    fn from(value: IncidentValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Time source for `created_at` stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct Subscription {
    id: SubscriptionId,
    /// Commit count at subscription; only later commits are delivered.
    since: u64,
    observer: Arc<dyn IncidentObserver>,
}

#[derive(Default)]
struct RegistryState {
    incidents: Vec<Incident>,
    next_sequence: u64,
    commits: u64,
    pending: VecDeque<(u64, RegistryEvent)>,
    dispatching: bool,
}

/// Clears `dispatching` if an observer unwinds out of the drain loop.
struct DispatchReset<'a> {
    state: &'a Mutex<RegistryState>,
}

impl Drop for DispatchReset<'_> {
    fn drop(&mut self) {
        if !thread::panicking() {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.dispatching = false;
        warn!(
            "event=notify module=registry status=observer_panicked pending={}",
            state.pending.len()
        );
    }
}

/// Single source of truth for incidents.
///
/// All operations take `&self`; share it behind an `Arc` between the map
/// surface and list collaborators.
pub struct IncidentRegistry {
    config: RegistryConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<RegistryState>,
    observers: Mutex<Vec<Subscription>>,
    next_subscription: AtomicU64,
}

impl Default for IncidentRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl IncidentRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RegistryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(RegistryState {
                next_sequence: 1,
                ..RegistryState::default()
            }),
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Places a new incident at `location`.
    ///
    /// # Contract
    /// - Rejects out-of-range or non-finite coordinates.
    /// - Title is `"<prefix> #<n>"`, `n` chosen per `TitleNumbering` under the
    ///   same lock as the insert.
    /// - Emits `IncidentAdded`.
    pub fn add(&self, location: Coordinate) -> RegistryResult<Incident> {
        if let Err(err) = location.validate() {
            warn!("event=incident_add module=registry status=rejected reason=invalid_coordinate");
            return Err(err.into());
        }

        let mut state = self.lock_state();
        let number = match self.config.numbering {
            TitleNumbering::Sequence => state.next_sequence,
            TitleNumbering::LiveCount => state.incidents.len() as u64 + 1,
        };
        let incident = Incident::create(
            state.next_sequence,
            default_title(&self.config.title_prefix, number),
            location,
            self.clock.now(),
        )?;
        state.next_sequence += 1;
        state.incidents.push(incident.clone());
        let index = state.incidents.len() - 1;

        info!(
            "event=incident_add module=registry status=ok id={} seq={} count={}",
            incident.id(),
            incident.sequence(),
            state.incidents.len()
        );
        self.commit(
            state,
            RegistryEvent::IncidentAdded {
                incident: incident.clone(),
                index,
            },
        );
        Ok(incident)
    }

    /// Renames one incident in place.
    ///
    /// # Contract
    /// - Blank or whitespace-only titles fail with `Validation(BlankTitle)`.
    /// - Unknown ids fail with `NotFound`.
    /// - List position is preserved; `IncidentUpdated` is emitted even when
    ///   the title is unchanged.
    pub fn rename(&self, id: IncidentId, new_title: &str) -> RegistryResult<Incident> {
        let title = match normalize_title(new_title) {
            Ok(title) => title,
            Err(err) => {
                warn!("event=incident_rename module=registry status=rejected reason=blank_title id={id}");
                return Err(err.into());
            }
        };

        let mut state = self.lock_state();
        let Some(index) = state.incidents.iter().position(|i| i.id() == id) else {
            warn!("event=incident_rename module=registry status=not_found id={id}");
            return Err(RegistryError::NotFound(id));
        };
        let previous_title = state.incidents[index].set_title(title);
        let incident = state.incidents[index].clone();

        info!("event=incident_rename module=registry status=ok id={id} index={index}");
        self.commit(
            state,
            RegistryEvent::IncidentUpdated {
                incident: incident.clone(),
                previous_title,
                index,
            },
        );
        Ok(incident)
    }

    /// Deletes one incident and returns the removed record.
    pub fn remove(&self, id: IncidentId) -> RegistryResult<Incident> {
        let mut state = self.lock_state();
        let Some(index) = state.incidents.iter().position(|i| i.id() == id) else {
            warn!("event=incident_remove module=registry status=not_found id={id}");
            return Err(RegistryError::NotFound(id));
        };
        let incident = state.incidents.remove(index);

        info!(
            "event=incident_remove module=registry status=ok id={id} index={index} count={}",
            state.incidents.len()
        );
        self.commit(
            state,
            RegistryEvent::IncidentRemoved {
                incident: incident.clone(),
                index,
            },
        );
        Ok(incident)
    }

    pub fn get(&self, id: IncidentId) -> Option<Incident> {
        self.lock_state()
            .incidents
            .iter()
            .find(|i| i.id() == id)
            .cloned()
    }

    /// Current list index of `id`.
    pub fn position(&self, id: IncidentId) -> Option<usize> {
        self.lock_state().incidents.iter().position(|i| i.id() == id)
    }

    /// Snapshot of all incidents in insertion order.
    pub fn list(&self) -> Vec<Incident> {
        self.lock_state().incidents.clone()
    }

    /// Incidents whose title contains `name` (case-insensitive) and, when
    /// `date` is set, that were created on that UTC day.
    pub fn filter(&self, name: &str, date: Option<NaiveDate>) -> Vec<Incident> {
        self.matching(&IncidentFilter::new(name, date))
    }

    pub fn matching(&self, filter: &IncidentFilter) -> Vec<Incident> {
        let hits: Vec<Incident> = self
            .lock_state()
            .incidents
            .iter()
            .filter(|incident| filter.matches(incident))
            .cloned()
            .collect();
        debug!(
            "event=incident_filter module=registry status=ok hits={}",
            hits.len()
        );
        hits
    }

    pub fn len(&self) -> usize {
        self.lock_state().incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().incidents.is_empty()
    }

    /// Registers an observer for all subsequent events.
    ///
    /// `on_subscribed` receives the current list under the same lock that
    /// fixes which commits the observer will see.
    pub fn subscribe(&self, observer: Arc<dyn IncidentObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let state = self.lock_state();
        observer.on_subscribed(&state.incidents);
        self.lock_observers().push(Subscription {
            id,
            since: state.commits,
            observer,
        });
        debug!(
            "event=observer_subscribe module=registry status=ok subscription={} since={}",
            id.0, state.commits
        );
        id
    }

    /// Removes an observer. Returns `false` for unknown handles.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.lock_observers();
        let before = observers.len();
        observers.retain(|subscription| subscription.id != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.lock_observers().len()
    }

    /// Queues `event` and, unless another call is already delivering, drains
    /// the queue to observers with the state lock released.
    fn commit<'a>(&'a self, mut state: MutexGuard<'a, RegistryState>, event: RegistryEvent) {
        state.commits += 1;
        let seq = state.commits;
        state.pending.push_back((seq, event));
        if state.dispatching {
            return;
        }
        state.dispatching = true;
        let _reset = DispatchReset { state: &self.state };

        loop {
            let Some((seq, event)) = state.pending.pop_front() else {
                state.dispatching = false;
                return;
            };
            drop(state);

            let observers: Vec<Arc<dyn IncidentObserver>> = self
                .lock_observers()
                .iter()
                .filter(|subscription| subscription.since < seq)
                .map(|subscription| Arc::clone(&subscription.observer))
                .collect();
            debug!(
                "event=notify module=registry kind={} seq={seq} observers={}",
                event.name(),
                observers.len()
            );
            for observer in observers {
                observer.on_registry_event(&event);
            }

            state = self.lock_state();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
