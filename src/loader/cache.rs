//! Process-wide resource cache and the tickets that wait on it.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::ResourceLoadError;

/// Result every waiter on a resource receives.
pub type LoadOutcome = Result<Arc<[u8]>, ResourceLoadError>;

/// Observable state of one cached resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    NotRequested,
    Loading { waiters: usize },
    Loaded,
    Failed(ResourceLoadError),
}

#[derive(Debug)]
enum Entry {
    Loading {
        generation: u64,
        waiters: Vec<Sender<LoadOutcome>>,
    },
    Loaded(Arc<[u8]>),
    Failed(ResourceLoadError),
}

/// What a requester has to do after consulting the cache.
#[derive(Debug)]
pub(crate) enum Acquire {
    /// The resource already settled.
    Settled(LoadOutcome),
    /// Another requester's fetch is in flight; wait on the receiver.
    Joined(Receiver<LoadOutcome>),
    /// This requester owns the fetch and must start it, settling with
    /// `generation`.
    Started {
        rx: Receiver<LoadOutcome>,
        generation: u64,
    },
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Entry>,
    fetches_started: u64,
    /// Never reset, so a fetch outliving `forget` or `reset` cannot settle
    /// a newer entry.
    next_generation: u64,
}

/// Resource load state keyed by location, shared by every loader and widget
/// holding a clone.
///
/// Check-and-mark happens under one lock, so a location has at most one fetch
/// in flight no matter how many threads ask for it. Failures are kept until
/// [`ResourceCache::forget`] or [`ResourceCache::reset`].
#[derive(Debug, Clone, Default)]
pub struct ResourceCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn status(&self, url: &str) -> ResourceStatus {
        match self.lock().entries.get(url) {
            None => ResourceStatus::NotRequested,
            Some(Entry::Loading { waiters, .. }) => ResourceStatus::Loading {
                waiters: waiters.len(),
            },
            Some(Entry::Loaded(_)) => ResourceStatus::Loaded,
            Some(Entry::Failed(err)) => ResourceStatus::Failed(err.clone()),
        }
    }

    /// Total fetches started through this cache.
    pub fn fetches_started(&self) -> u64 {
        self.lock().fetches_started
    }

    /// Number of locations with an entry.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn acquire(&self, url: &str) -> Acquire {
        let (tx, rx) = mpsc::channel();
        let mut guard = self.lock();
        match guard.entries.get_mut(url) {
            Some(Entry::Loaded(bytes)) => Acquire::Settled(Ok(Arc::clone(bytes))),
            Some(Entry::Failed(err)) => Acquire::Settled(Err(err.clone())),
            Some(Entry::Loading { waiters, .. }) => {
                waiters.push(tx);
                Acquire::Joined(rx)
            }
            None => {
                guard.next_generation += 1;
                let generation = guard.next_generation;
                guard.entries.insert(
                    url.to_string(),
                    Entry::Loading {
                        generation,
                        waiters: vec![tx],
                    },
                );
                guard.fetches_started += 1;
                Acquire::Started { rx, generation }
            }
        }
    }

    /// Record the result of fetch `generation` for `url` and wake every
    /// waiter.
    ///
    /// Returns the number of waiters notified. A result for a location that
    /// is no longer loading that fetch (forgotten, refetched, or already
    /// settled) is dropped.
    pub(crate) fn settle(&self, url: &str, generation: u64, outcome: LoadOutcome) -> usize {
        let mut guard = self.lock();
        match guard.entries.get(url) {
            Some(Entry::Loading { generation: current, .. }) if *current == generation => {}
            _ => return 0,
        }
        let settled = match &outcome {
            Ok(bytes) => Entry::Loaded(Arc::clone(bytes)),
            Err(err) => Entry::Failed(err.clone()),
        };
        let Some(Entry::Loading { waiters, .. }) = guard.entries.insert(url.to_string(), settled)
        else {
            return 0;
        };
        drop(guard);

        let mut notified = 0;
        for waiter in waiters {
            if waiter.send(outcome.clone()).is_ok() {
                notified += 1;
            }
        }
        notified
    }

    /// Drop the entry for `url` so the next request fetches again.
    ///
    /// Waiters on an in-flight load settle with
    /// [`ResourceLoadError::Abandoned`].
    pub fn forget(&self, url: &str) -> bool {
        self.lock().entries.remove(url).is_some()
    }

    /// Drop every entry.
    pub fn reset(&self) {
        let mut guard = self.lock();
        guard.entries.clear();
        guard.fetches_started = 0;
    }
}

#[derive(Debug)]
enum TicketState {
    Pending(Receiver<LoadOutcome>),
    Settled(LoadOutcome),
}

/// A pending or settled request for one resource.
///
/// Every ticket for the same location settles with the same outcome.
#[derive(Debug)]
pub struct LoadTicket {
    url: String,
    state: TicketState,
}

impl LoadTicket {
    pub(crate) fn settled(url: impl Into<String>, outcome: LoadOutcome) -> Self {
        Self {
            url: url.into(),
            state: TicketState::Settled(outcome),
        }
    }

    pub(crate) fn pending(url: impl Into<String>, rx: Receiver<LoadOutcome>) -> Self {
        Self {
            url: url.into(),
            state: TicketState::Pending(rx),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn is_settled(&self) -> bool {
        matches!(self.state, TicketState::Settled(_))
    }

    /// Non-blocking check; returns the outcome once the load has settled.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        if let TicketState::Pending(rx) = &self.state {
            let outcome = match rx.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => Err(self.abandoned()),
            };
            self.state = TicketState::Settled(outcome);
        }
        match &self.state {
            TicketState::Settled(outcome) => Some(outcome.clone()),
            TicketState::Pending(_) => None,
        }
    }

    /// Block until the load settles or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> Option<LoadOutcome> {
        match self.state {
            TicketState::Settled(outcome) => Some(outcome),
            TicketState::Pending(rx) => match rx.recv_timeout(timeout) {
                Ok(outcome) => Some(outcome),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(Err(ResourceLoadError::Abandoned {
                    url: self.url,
                })),
            },
        }
    }

    fn abandoned(&self) -> ResourceLoadError {
        ResourceLoadError::Abandoned {
            url: self.url.clone(),
        }
    }
}
