//! Builders to construct a monitor device from configuration.

use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::core::{MonitorError, NotifierHub};
use crate::infra::InProcessHub;
use crate::runtime::MonitorDevice;
use crate::util::clock::{Clock, MonotonicClock};

/// Build a device over an existing hub and clock after validating `cfg`.
///
/// # Errors
///
/// [`MonitorError::Config`] when validation fails.
pub fn build_device(
    cfg: MonitorConfig,
    hub: Arc<dyn NotifierHub>,
    clock: Arc<dyn Clock>,
) -> Result<MonitorDevice, MonitorError> {
    cfg.validate().map_err(MonitorError::Config)?;
    Ok(MonitorDevice::new(cfg, hub, clock))
}

/// Build a device together with a fresh in-process hub and monotonic clock.
///
/// The hub is returned so a scheduler can report transitions to it.
///
/// # Errors
///
/// [`MonitorError::Config`] when validation fails.
pub fn build_in_process(
    cfg: MonitorConfig,
) -> Result<(MonitorDevice, Arc<InProcessHub>), MonitorError> {
    let hub = Arc::new(InProcessHub::new());
    let device = build_device(cfg, hub.clone(), Arc::new(MonotonicClock::new()))?;
    Ok((device, hub))
}
