//! Command-line monitor.
//!
//! Opens the monitor device, enables tracking for a context, lets a simulated
//! scheduler run it against competing workloads, disables tracking and prints
//! every retrieved record.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use sched_monitor::builders::build_in_process;
use sched_monitor::config::MonitorConfig;
use sched_monitor::core::{AppResult, PreemptionInfo, WIRE_SIZE};
use sched_monitor::runtime::{SimConfig, SimScheduler, SimTask, DISABLE_TRACKING, ENABLE_TRACKING};
use sched_monitor::util::telemetry::init_tracing;

/// Context id of the process being monitored.
const TRACKED_CONTEXT: u64 = 1;

#[derive(Debug, Parser)]
#[command(name = "sched_monitor", about = "Record preemptions of a context and print them")]
struct Opts {
    /// Number of virtual cpus.
    #[arg(short = 'c', long, default_value = "2")]
    cpus: usize,

    /// Time slices each cpu runs.
    #[arg(short = 's', long, default_value = "200")]
    slices: usize,

    /// Slice length in microseconds.
    #[arg(short = 'u', long, default_value = "500")]
    slice_us: u64,

    /// Names of competing contexts.
    #[arg(short = 'w', long, num_args = 1.., default_values = ["dense_mm", "fibonacci"])]
    workloads: Vec<String>,

    /// Name of the tracked context.
    #[arg(short = 'n', long, default_value = "monitor")]
    name: String,

    /// Print records as JSON lines.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    json: bool,
}

fn main() -> AppResult<()> {
    init_tracing();
    let opts = Opts::parse();
    if opts.cpus == 0 {
        bail!("--cpus must be at least 1");
    }

    let cfg = MonitorConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading monitor configuration")?;
    let (device, hub) = build_in_process(cfg)?;
    let fd = device
        .open(TRACKED_CONTEXT)
        .with_context(|| format!("could not open {}", device.config().device_path()))?;

    device
        .ioctl(fd, ENABLE_TRACKING)
        .context("could not enable preemption tracking")?;

    let mut tasks = vec![SimTask::new(TRACKED_CONTEXT, opts.name.clone())];
    tasks.extend(
        opts.workloads
            .iter()
            .zip(2u64..)
            .map(|(name, context)| SimTask::new(context, name.clone())),
    );
    let sim = SimScheduler::new(
        Arc::clone(&hub),
        SimConfig {
            cpus: opts.cpus,
            slices_per_cpu: opts.slices,
            slice: Duration::from_micros(opts.slice_us),
        },
    );
    let report = sim.run(tasks);
    info!(switches = report.context_switches, elapsed = ?report.elapsed, "workload window finished");

    device
        .ioctl(fd, DISABLE_TRACKING)
        .context("could not disable preemption tracking")?;

    let mut buf = [0u8; WIRE_SIZE];
    let mut event = 1;
    while device.read(fd, &mut buf)? > 0 {
        let info = PreemptionInfo::from_bytes(&buf)?;
        if opts.json {
            println!("{}", serde_json::to_string(&info)?);
        } else {
            println!("Event {event}");
            println!(
                "\tTime off: {} us. Time on: {} us.",
                info.time_off / 1_000,
                info.time_on / 1_000
            );
            println!("\tScheduled on core {}", info.cpu);
            println!("\tPreempted by {}", info.preempted_by);
        }
        event += 1;
    }

    let stats = device.stats(fd)?;
    info!(?stats, "session statistics");
    device.close(fd)?;

    println!("Monitor ran to completion!");
    Ok(())
}
