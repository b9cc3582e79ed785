//! Seams between sessions and the scheduler's notification facility.

use std::sync::Arc;

use crate::core::MonitorError;

/// Identifier of a schedulable execution context (a task or thread).
pub type ContextId = u64;

/// Receiver of scheduling transitions for one subscribed context.
///
/// Both methods may be invoked from a context that must not block or sleep.
/// Implementations must not propagate failures back to the caller.
pub trait PreemptNotifier: Send + Sync {
    /// The context was put onto processor `cpu`.
    fn sched_in(&self, cpu: i32);
    /// The context is being taken off its processor in favour of `next`.
    fn sched_out(&self, next: &str);
}

/// Handle for one live subscription, returned by [`NotifierHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    /// Hub-assigned subscription id.
    pub id: u64,
    /// Context the notifier is attached to.
    pub context: ContextId,
}

/// Subscription capability offered by the scheduler.
pub trait NotifierHub: Send + Sync {
    /// Attach `notifier` to `context`.
    ///
    /// # Errors
    ///
    /// [`MonitorError::SubscribeFailed`] when the hub refuses the registration.
    fn subscribe(
        &self,
        context: ContextId,
        notifier: Arc<dyn PreemptNotifier>,
    ) -> Result<SubscriptionHandle, MonitorError>;

    /// Detach a subscription. Once this returns no callback for it is running
    /// and none will start.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}
