//! Periodic fee reminder job
//!
//! Runs the reminder engine across every institute on a fixed interval.
//! A failed run is logged and the next tick tries again.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use core_kernel::Timezone;
use domain_reminders::ReminderEngine;

/// Spawns the reminder loop; abort the handle to stop it
pub fn spawn_reminder_job(engine: ReminderEngine, timezone: Timezone, every: Duration) -> JoinHandle<()> {
    info!(
        interval_secs = every.as_secs(),
        timezone = timezone.name(),
        "starting fee reminder scheduler"
    );

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_once(&engine, timezone).await;
        }
    })
}

/// Runs one scheduled pass for today's date in `timezone`
pub async fn run_once(engine: &ReminderEngine, timezone: Timezone) {
    let today = timezone.today();
    match engine.run(today, None).await {
        Ok(report) => info!(run_date = %today, created = report.created, "scheduled reminder run finished"),
        Err(e) => error!(run_date = %today, error = %e, "scheduled reminder run failed"),
    }
}
