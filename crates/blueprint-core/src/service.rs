//! Collaborator interfaces of the generation service.
//!
//! The orchestrator only ever talks to the service through these two traits.
//! Transport (HTTP, RPC, push channel, polling) is the implementor's concern.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::errors::Result;
use crate::model::{BlueprintId, BlueprintJob, GenerationRequest, JobStatus};

/// Service acknowledgement of a queued generation job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub blueprint_id: BlueprintId,
    pub status: JobStatus,
    pub payload_path: String,
}

impl GenerationTicket {
    pub fn new(blueprint_id: impl Into<BlueprintId>) -> Self {
        Self {
            blueprint_id: blueprint_id.into(),
            status: JobStatus::Processing,
            payload_path: String::new(),
        }
    }
}

/// Submits generation jobs
///
/// A rejected call is treated as if no job was created.
#[async_trait]
pub trait GenerationRequester: Send + Sync {
    async fn request_generation(&self, request: &GenerationRequest) -> Result<GenerationTicket>;
}

/// Callback receiving job snapshots; `None` marks an empty or errored frame
pub type UpdateCallback = Arc<dyn Fn(Option<BlueprintJob>) + Send + Sync>;

/// Opens streaming subscriptions to job status
///
/// Snapshots for one id must be delivered in lifecycle order, and every
/// callback invocation must go through the subscription's
/// [`SubscriptionGate::deliver`] so that nothing is delivered once
/// `unsubscribe` has returned.
pub trait StatusSubscriber: Send + Sync {
    fn subscribe(&self, blueprint_id: &BlueprintId, on_update: UpdateCallback) -> Subscription;
}

/// Shared open/closed flag between a subscription handle and its delivery task
///
/// Delivery and closing take the same lock, so a callback is either fully
/// delivered before `close` returns or never delivered at all. Callbacks
/// must not unsubscribe their own subscription from inside `deliver`.
#[derive(Clone)]
pub struct SubscriptionGate {
    open: Arc<Mutex<bool>>,
}

impl Default for SubscriptionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionGate {
    pub fn new() -> Self {
        Self {
            open: Arc::new(Mutex::new(true)),
        }
    }

    /// Run `deliver` if the gate is still open; returns whether it ran
    pub fn deliver(&self, deliver: impl FnOnce()) -> bool {
        let Ok(open) = self.open.lock() else {
            return false;
        };
        if !*open {
            return false;
        }
        deliver();
        true
    }

    pub fn is_open(&self) -> bool {
        self.open.lock().map(|open| *open).unwrap_or(false)
    }

    /// Close the gate; returns true only for the call that closed it
    pub fn close(&self) -> bool {
        match self.open.lock() {
            Ok(mut open) => std::mem::replace(&mut *open, false),
            Err(_) => false,
        }
    }
}

type Teardown = Box<dyn FnOnce() + Send>;

/// Handle to an open status subscription
///
/// `unsubscribe` is idempotent, a no-op after the stream completed, and also
/// runs on drop.
pub struct Subscription {
    gate: SubscriptionGate,
    teardown: Mutex<Option<Teardown>>,
}

impl Subscription {
    /// Subscription guarded by `gate` that runs `teardown` once when cancelled
    pub fn new(gate: SubscriptionGate, teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            gate,
            teardown: Mutex::new(Some(Box::new(teardown))),
        }
    }

    /// Subscription with nothing to tear down (stream already finished)
    pub fn closed() -> Self {
        let gate = SubscriptionGate::new();
        gate.close();
        Self {
            gate,
            teardown: Mutex::new(None),
        }
    }

    pub fn gate(&self) -> &SubscriptionGate {
        &self.gate
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_open()
    }

    /// Cancel the subscription
    ///
    /// After this returns the callback is never invoked again.
    pub fn unsubscribe(&self) {
        self.gate.close();
        let teardown = self
            .teardown
            .lock()
            .map(|mut slot| slot.take())
            .unwrap_or(None);
        if let Some(teardown) = teardown {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_subscription() -> (Subscription, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let subscription = Subscription::new(SubscriptionGate::new(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (subscription, calls)
    }

    #[test]
    fn test_unsubscribe_runs_teardown_once() {
        let (subscription, calls) = counting_subscription();

        assert!(subscription.is_active());
        subscription.unsubscribe();
        subscription.unsubscribe();
        drop(subscription);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closed_gate_blocks_delivery() {
        let (subscription, _) = counting_subscription();
        let gate = subscription.gate().clone();

        assert!(gate.deliver(|| {}));
        drop(subscription);

        let mut delivered = false;
        assert!(!gate.deliver(|| delivered = true));
        assert!(!delivered);
    }

    #[test]
    fn test_close_reports_first_closer_only() {
        let gate = SubscriptionGate::new();
        assert!(gate.close());
        assert!(!gate.close());
        assert!(!gate.is_open());
    }

    #[test]
    fn test_closed_subscription_is_inert() {
        let subscription = Subscription::closed();
        assert!(!subscription.is_active());
        subscription.unsubscribe();
    }
}
