//! Single-flight acquisition of the conversation session.
//!
//! The first caller that finds no session registers a shared creation future;
//! every caller arriving while it is pending awaits that same future, so the
//! collaborator sees exactly one creation request per attempt. A failed
//! attempt leaves the coordinator empty so a later call can retry.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::collaborator::SessionFactory;
use crate::error::SessionError;
use crate::identifier::{IdentifierExtractor, SessionId};

type PendingCreation = Shared<BoxFuture<'static, Result<SessionId, SessionError>>>;

/// Observable lifecycle of the cached session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Absent,
    Creating,
    Ready,
}

enum Slot {
    Absent,
    Creating {
        attempt: u64,
        pending: PendingCreation,
    },
    Ready(SessionId),
}

struct Inner {
    slot: Slot,
    attempts: u64,
}

/// Owns the cached session identifier and its in-flight creation handle.
pub struct SessionCoordinator {
    factory: Arc<dyn SessionFactory>,
    extractor: Arc<IdentifierExtractor>,
    inner: Mutex<Inner>,
}

impl SessionCoordinator {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self::with_slot(factory, Slot::Absent)
    }

    /// Starts ready with an identifier created elsewhere.
    pub fn with_session(factory: Arc<dyn SessionFactory>, session_id: SessionId) -> Self {
        Self::with_slot(factory, Slot::Ready(session_id))
    }

    fn with_slot(factory: Arc<dyn SessionFactory>, slot: Slot) -> Self {
        Self {
            factory,
            extractor: Arc::new(IdentifierExtractor::default()),
            inner: Mutex::new(Inner { slot, attempts: 0 }),
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: IdentifierExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn state(&self) -> SessionState {
        match lock_unpoisoned(&self.inner).slot {
            Slot::Absent => SessionState::Absent,
            Slot::Creating { .. } => SessionState::Creating,
            Slot::Ready(_) => SessionState::Ready,
        }
    }

    /// Ready identifier, without triggering creation.
    pub fn cached(&self) -> Option<SessionId> {
        match &lock_unpoisoned(&self.inner).slot {
            Slot::Ready(session_id) => Some(session_id.clone()),
            _ => None,
        }
    }

    /// Return the session identifier, creating the session on first demand.
    pub async fn ensure(&self) -> Result<SessionId, SessionError> {
        let (attempt, pending) = {
            let mut guard = lock_unpoisoned(&self.inner);
            let inner = &mut *guard;
            match &inner.slot {
                Slot::Ready(session_id) => {
                    debug!(%session_id, "reusing cached session");
                    return Ok(session_id.clone());
                }
                Slot::Creating { attempt, pending } => {
                    debug!(attempt, "joining in-flight session creation");
                    (*attempt, pending.clone())
                }
                Slot::Absent => {
                    inner.attempts += 1;
                    let attempt = inner.attempts;
                    let pending = self.begin_creation(attempt);
                    inner.slot = Slot::Creating {
                        attempt,
                        pending: pending.clone(),
                    };
                    (attempt, pending)
                }
            }
        };

        let outcome = pending.await;
        self.settle(attempt, &outcome);
        outcome
    }

    fn begin_creation(&self, attempt: u64) -> PendingCreation {
        let factory = Arc::clone(&self.factory);
        let extractor = Arc::clone(&self.extractor);

        async move {
            info!(attempt, "creating session");
            let response = factory.create_session().await.map_err(|error| {
                warn!(attempt, %error, "session creation failed");
                SessionError::creation_failed(&error)
            })?;

            match extractor.extract(&response) {
                Some(session_id) => {
                    info!(attempt, %session_id, "session ready");
                    Ok(session_id)
                }
                None => {
                    warn!(attempt, "session creation response carried no identifier");
                    Err(SessionError::IdentifierMissing)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Record the outcome of `attempt`; later attempts are left untouched.
    fn settle(&self, attempt: u64, outcome: &Result<SessionId, SessionError>) {
        let mut guard = lock_unpoisoned(&self.inner);
        let is_current = matches!(
            &guard.slot,
            Slot::Creating { attempt: current, .. } if *current == attempt
        );
        if !is_current {
            return;
        }

        guard.slot = match outcome {
            Ok(session_id) => Slot::Ready(session_id.clone()),
            Err(_) => Slot::Absent,
        };
    }
}

impl fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("state", &self.state())
            .field("cached", &self.cached())
            .field("extractor", &self.extractor)
            .finish()
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
