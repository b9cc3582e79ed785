//! Simulated multi-processor scheduler.
//!
//! Runs one OS thread per virtual cpu. Runnable tasks wait in a shared
//! crossbeam run queue; at the end of each time slice a cpu swaps its current
//! task for the next queued one and reports the switch to the
//! [`InProcessHub`]: "scheduled out" for the outgoing task (naming its
//! successor), then "scheduled in" for the incoming one. A task is only
//! re-queued after its "scheduled out" has been reported, so each context sees
//! strictly alternating transitions.
//!
//! When a cpu stops, its current task is handed to the idle task
//! (`swapper/<cpu>`) and re-queued for the cpus still running.
//!
//! A task that starts running without ever having been descheduled produces a
//! leading "scheduled in" with no matching "out"; sessions treat that as a
//! no-op, the same as enabling tracking on a context that is already running.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::ContextId;
use crate::infra::InProcessHub;

/// A schedulable context known to the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTask {
    /// Context identifier reported to the hub.
    pub context: ContextId,
    /// Name reported as the successor when this task preempts another.
    pub name: String,
}

impl SimTask {
    /// Task with the given context and name.
    pub fn new(context: ContextId, name: impl Into<String>) -> Self {
        Self {
            context,
            name: name.into(),
        }
    }
}

/// Simulator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of virtual cpus (worker threads).
    pub cpus: usize,
    /// Time slices each cpu runs before stopping.
    pub slices_per_cpu: usize,
    /// Length of one slice; zero yields instead of sleeping.
    pub slice: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cpus: num_cpus::get().clamp(1, 4),
            slices_per_cpu: 100,
            slice: Duration::from_micros(200),
        }
    }
}

/// Totals gathered over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimReport {
    /// Task swaps performed across all cpus.
    pub context_switches: u64,
    /// Slices in which a cpu found nothing to run.
    pub idle_slices: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
}

#[derive(Default)]
struct SimCounters {
    switches: AtomicU64,
    idle: AtomicU64,
}

/// Thread-per-cpu scheduler that reports transitions to a hub.
pub struct SimScheduler {
    hub: Arc<InProcessHub>,
    config: SimConfig,
}

impl SimScheduler {
    /// Scheduler driving `hub`.
    #[must_use]
    pub const fn new(hub: Arc<InProcessHub>, config: SimConfig) -> Self {
        Self { hub, config }
    }

    /// Simulator parameters.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run `tasks` to the end of the configured slices and report totals.
    pub fn run(&self, tasks: Vec<SimTask>) -> SimReport {
        let (tx, rx) = unbounded();
        for task in tasks {
            let _ = tx.send(task);
        }

        let counters = SimCounters::default();
        let started = Instant::now();
        thread::scope(|scope| {
            for cpu in 0..self.config.cpus.max(1) {
                let (tx, rx, counters) = (tx.clone(), rx.clone(), &counters);
                let cpu = i32::try_from(cpu).unwrap_or(i32::MAX);
                scope.spawn(move || self.run_cpu(cpu, &tx, &rx, counters));
            }
        });

        let report = SimReport {
            context_switches: counters.switches.load(Ordering::Relaxed),
            idle_slices: counters.idle.load(Ordering::Relaxed),
            elapsed: started.elapsed(),
        };
        info!(
            cpus = self.config.cpus,
            switches = report.context_switches,
            idle = report.idle_slices,
            "simulation finished"
        );
        report
    }

    fn run_cpu(&self, cpu: i32, tx: &Sender<SimTask>, rx: &Receiver<SimTask>, counters: &SimCounters) {
        let mut current: Option<SimTask> = None;
        for _ in 0..self.config.slices_per_cpu {
            let running = match current.take() {
                Some(task) => task,
                None => {
                    if let Ok(task) = rx.try_recv() {
                        self.hub.sched_in(task.context, cpu);
                        task
                    } else {
                        counters.idle.fetch_add(1, Ordering::Relaxed);
                        self.pause();
                        continue;
                    }
                }
            };

            self.pause();

            match rx.try_recv() {
                Ok(next) => {
                    self.hub.sched_out(running.context, &next.name);
                    let _ = tx.send(running);
                    self.hub.sched_in(next.context, cpu);
                    counters.switches.fetch_add(1, Ordering::Relaxed);
                    current = Some(next);
                }
                Err(_) => current = Some(running),
            }
        }
        if let Some(task) = current {
            self.hub.sched_out(task.context, &format!("swapper/{cpu}"));
            let _ = tx.send(task);
        }
        debug!(cpu, "virtual cpu stopped");
    }

    fn pause(&self) {
        if self.config.slice.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(self.config.slice);
        }
    }
}
