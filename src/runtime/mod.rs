//! Runtime adapters: the control channel and a simulated scheduler.

pub mod device;
pub mod sim;

pub use device::{
    ControlCommand, ControlReply, MonitorDevice, SessionHandle, DISABLE_TRACKING, ENABLE_TRACKING,
};
pub use sim::{SimConfig, SimReport, SimScheduler, SimTask};
