//! Builders to construct monitor components from configuration.

pub mod device_builder;

pub use device_builder::{build_device, build_in_process};
