//! In-process notification hub.
//!
//! [`InProcessHub`] is a registry of [`PreemptNotifier`]s keyed by context. A
//! scheduler (real or simulated) reports transitions through
//! [`InProcessHub::sched_out`] and [`InProcessHub::sched_in`]; the hub fans
//! them out to every notifier subscribed to that context.
//!
//! Dispatch holds the registry's read lock while callbacks run and
//! `unsubscribe` takes the write lock, so `unsubscribe` returns only once every
//! in-flight callback for the removed subscription has finished.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::{ContextId, MonitorError, NotifierHub, PreemptNotifier, SubscriptionHandle};
use crate::sync::RwLock;

/// Reference-counted "notifications active" flag.
///
/// Goes active on the first acquire and inactive on the last release. While
/// inactive the hub skips dispatch entirely.
#[derive(Debug, Default)]
pub struct NotifierGate {
    users: AtomicUsize,
}

impl NotifierGate {
    /// New, inactive gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            users: AtomicUsize::new(0),
        }
    }

    /// Add a user. Returns `true` when this activated the gate.
    pub fn acquire(&self) -> bool {
        self.users.fetch_add(1, Ordering::AcqRel) == 0
    }

    /// Drop a user. Returns `true` when this deactivated the gate.
    pub fn release(&self) -> bool {
        self.users
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok_and(|prev| prev == 1)
    }

    /// Whether at least one user holds the gate.
    pub fn is_active(&self) -> bool {
        self.users.load(Ordering::Acquire) > 0
    }

    /// Current number of users.
    pub fn users(&self) -> usize {
        self.users.load(Ordering::Acquire)
    }
}

struct Subscriber {
    id: u64,
    notifier: Arc<dyn PreemptNotifier>,
}

/// Subscription registry and dispatcher for in-process schedulers.
pub struct InProcessHub {
    contexts: RwLock<HashMap<ContextId, Vec<Subscriber>>>,
    next_id: AtomicU64,
    gate: NotifierGate,
    closed: AtomicBool,
}

impl InProcessHub {
    /// Empty hub accepting subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            gate: NotifierGate::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Refuse further subscriptions. Existing ones keep working until removed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Whether new subscriptions are refused.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of live subscriptions across all contexts.
    pub fn subscription_count(&self) -> usize {
        self.contexts.read().values().map(Vec::len).sum()
    }

    /// The global enable gate.
    pub const fn gate(&self) -> &NotifierGate {
        &self.gate
    }

    /// Report that `context` is being descheduled in favour of `next`.
    pub fn sched_out(&self, context: ContextId, next: &str) {
        if !self.gate.is_active() {
            return;
        }
        let contexts = self.contexts.read();
        if let Some(subscribers) = contexts.get(&context) {
            for sub in subscribers {
                sub.notifier.sched_out(next);
            }
        }
    }

    /// Report that `context` was put onto processor `cpu`.
    pub fn sched_in(&self, context: ContextId, cpu: i32) {
        if !self.gate.is_active() {
            return;
        }
        let contexts = self.contexts.read();
        if let Some(subscribers) = contexts.get(&context) {
            for sub in subscribers {
                sub.notifier.sched_in(cpu);
            }
        }
    }
}

impl Default for InProcessHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifierHub for InProcessHub {
    fn subscribe(
        &self,
        context: ContextId,
        notifier: Arc<dyn PreemptNotifier>,
    ) -> Result<SubscriptionHandle, MonitorError> {
        if self.is_closed() {
            return Err(MonitorError::SubscribeFailed("hub is closed".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.contexts
            .write()
            .entry(context)
            .or_default()
            .push(Subscriber { id, notifier });
        if self.gate.acquire() {
            info!("preemption notifications enabled");
        }
        debug!(context, subscription = id, "notifier registered");
        Ok(SubscriptionHandle { id, context })
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let removed = {
            let mut contexts = self.contexts.write();
            let removed = contexts.get_mut(&handle.context).and_then(|subs| {
                let pos = subs.iter().position(|s| s.id == handle.id)?;
                Some(subs.remove(pos))
            });
            if contexts.get(&handle.context).is_some_and(Vec::is_empty) {
                contexts.remove(&handle.context);
            }
            removed
        };
        if removed.is_some() {
            if self.gate.release() {
                info!("preemption notifications disabled");
            }
            debug!(context = handle.context, subscription = handle.id, "notifier unregistered");
        }
    }
}
