//! Cron-driven internal tick scheduler.
//!
//! Optional: runs only when `SCHEDULE_CRON` is configured. An external
//! scheduler hitting `POST /tick` works identically; both trigger sources
//! serialize through the shared runner, so overlap cannot occur.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use tracing::{info, warn};

use telepull_connector::TriggerKind;

use crate::state::AppState;

/// Poll interval between schedule checks.
const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Parse a cron expression, auto-prepending "0 " for 5-field expressions.
///
/// The `cron` crate requires 6 fields (sec min hr dom mon dow), but users
/// typically write 5-field cron (min hr dom mon dow). We detect and adapt.
pub fn parse_cron(expr: &str) -> Result<Schedule, cron::error::Error> {
    let parts: Vec<&str> = expr.split_whitespace().collect();
    if parts.len() == 5 {
        // Standard 5-field cron — prepend seconds field
        let six_field = format!("0 {}", expr);
        Schedule::from_str(&six_field)
    } else {
        Schedule::from_str(expr)
    }
}

/// Run the scheduler loop. Returns immediately if no cron is configured
/// or the expression does not parse.
pub async fn run_tick_scheduler(state: Arc<AppState>) {
    let expr = match state.config.schedule.cron.as_deref() {
        Some(e) => e.to_string(),
        None => return, // no schedule — external trigger only
    };

    let schedule = match parse_cron(&expr) {
        Ok(s) => s,
        Err(e) => {
            warn!(cron = %expr, error = %e, "invalid SCHEDULE_CRON — scheduler disabled");
            return;
        }
    };

    info!(cron = %expr, "tick scheduler started (poll interval: {}s)", POLL_INTERVAL.as_secs());
    let mut next_fire = schedule.upcoming(Utc).next();

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let due = match next_fire {
            Some(at) => Utc::now() >= at,
            None => false,
        };
        if !due {
            continue;
        }

        info!(trigger = "scheduled", "scheduler: triggering tick");
        match state.runner.run(TriggerKind::Scheduled).await {
            Ok(report) => info!(
                tick = %report.id,
                records = report.records_fetched,
                advanced = report.cursors_advanced.len(),
                duration_ms = report.duration_ms,
                "scheduled tick complete"
            ),
            Err(e) => warn!(error = %e, "scheduled tick failed — retrying at next fire"),
        }

        next_fire = schedule.upcoming(Utc).next();
    }
}

// ── Tests ────────────────────────────────────────────────────────────
