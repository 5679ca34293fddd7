//! Periodic per-organization analysis runner.
//!
//! One thread per organization keeps cycles for that organization strictly
//! sequential; independent organizations run concurrently and share nothing
//! but the stores.

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use adhelm_core::OrganizationId;

use crate::engine::DecisionEngine;

/// Config for the analysis cycle runner.
#[derive(Debug, Clone)]
pub struct AnalysisCycleRunner {
    pub interval: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
    /// Whether decided budgets are applied or left pending for approval.
    pub auto_execute: bool,
}

impl Default for AnalysisCycleRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
            auto_execute: false,
        }
    }
}

/// Handle for the running analysis runner (shutdown + trigger hook).
#[derive(Debug)]
pub struct AnalysisCycleRunnerHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl AnalysisCycleRunnerHandle {
    /// Event-trigger hook: call after a burst of ingested touchpoints to run
    /// a cycle ahead of schedule.
    ///
    /// Backpressure: triggers are coalesced (bounded queue). If the runner is
    /// already pending, this becomes a no-op.
    pub fn trigger(&self) {
        // Coalesce: channel capacity=1; ignore if already full.
        let _ = self.trigger.try_send(());
    }

    /// Gracefully stop the runner thread.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl AnalysisCycleRunner {
    /// Spawn an organization-scoped runner.
    ///
    /// - Schedule: runs every `interval`
    /// - Event-trigger: call `handle.trigger()` after ingest bursts
    /// - Failures: logged + retried with bounded exponential backoff; never
    ///   propagate out of the thread
    pub fn spawn_for_organization(
        &self,
        name: &'static str,
        organization_id: OrganizationId,
        engine: Arc<DecisionEngine>,
    ) -> AnalysisCycleRunnerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let cfg = self.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || runner_loop(name, organization_id, cfg, shutdown_rx, trigger_rx, engine))
            .expect("failed to spawn analysis cycle runner thread");

        AnalysisCycleRunnerHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        }
    }
}

fn runner_loop(
    name: &'static str,
    organization_id: OrganizationId,
    cfg: AnalysisCycleRunner,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    engine: Arc<DecisionEngine>,
) {
    info!(runner = name, organization = %organization_id, "analysis cycle runner started");

    let mut next_tick = Instant::now() + cfg.interval;
    let mut pending = true; // run once on startup
    let mut failures: u32 = 0;
    let mut backoff_until: Option<Instant> = None;

    loop {
        // Shutdown has priority.
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            // Keep a stable cadence even if we were delayed.
            while next_tick <= now {
                next_tick += cfg.interval;
            }
        }

        // Event-trigger: non-blocking drain to coalesce multiple triggers.
        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        // Backoff gate.
        if let Some(until) = backoff_until {
            if Instant::now() < until {
                thread::sleep(Duration::from_millis(50));
                continue;
            }
            backoff_until = None;
        }

        if !pending {
            // Wait until next tick or trigger or shutdown.
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(250));
            thread::sleep(sleep_for);
            continue;
        }

        pending = false;

        // One full pass: budget cycle, then anomaly sweep. Oracle failures
        // are already absorbed inside the cycle; what reaches us here is
        // persistence trouble, which is retried with backoff.
        let result = engine
            .run_analysis_cycle(organization_id, cfg.auto_execute)
            .and_then(|outcome| {
                engine.detect_anomalies(organization_id)?;
                Ok(outcome)
            });

        match result {
            Ok(outcome) => {
                failures = 0;
                info!(
                    runner = name,
                    organization = %organization_id,
                    decisions = outcome.decisions.len(),
                    executed = outcome.executed,
                    "analysis cycle completed"
                );
            }
            Err(e) => {
                warn!(runner = name, organization = %organization_id, error = ?e, "analysis cycle failed");
                failures += 1;
                if failures <= cfg.max_retries {
                    pending = true;
                    backoff_until = Some(Instant::now() + backoff(cfg.base_backoff, failures));
                } else {
                    failures = 0;
                }
            }
        }
    }

    info!(runner = name, organization = %organization_id, "analysis cycle runner stopped");
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    // Exponential backoff: base * 2^(attempt-1), capped.
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    let ms = base.as_millis().saturating_mul(pow as u128);
    Duration::from_millis(ms.min(10_000) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let base = Duration::from_millis(250);
        assert_eq!(backoff(base, 1), Duration::from_millis(250));
        assert_eq!(backoff(base, 2), Duration::from_millis(500));
        assert_eq!(backoff(base, 3), Duration::from_millis(1_000));
        assert_eq!(backoff(base, 20), Duration::from_millis(10_000));
    }
}
