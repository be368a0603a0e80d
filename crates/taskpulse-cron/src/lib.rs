//! # Taskpulse Cron
//!
//! Cron expression parsing, minimum-frequency validation, and next-run
//! preview. All entry points share one parser so validation and display
//! never disagree about what an expression means.

pub mod error;

pub use error::CronError;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use serde::{Deserialize, Serialize};

/// Minimum-frequency policy for probe schedules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrequencyPolicy {
    /// Smallest allowed spacing across the sampled window, in seconds.
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,

    /// Number of consecutive intervals to sample.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
}

fn default_min_interval_secs() -> u64 {
    60
}

fn default_sample_count() -> usize {
    1
}

impl Default for FrequencyPolicy {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            sample_count: default_sample_count(),
        }
    }
}

/// Convert a standard 5-field Unix cron expression to the 7-field format
/// expected by the `cron` crate.
///
/// 5-field format: minute hour day-of-month month day-of-week
/// 7-field format: second minute hour day-of-month month day-of-week year
///
/// We add "0" for seconds (run at :00 of each minute) and "*" for year.
/// 6- and 7-field expressions pass through unchanged, so seconds-precision
/// schedules are supported directly.
fn normalize_expression(expression: &str) -> String {
    let field_count = expression.split_whitespace().count();
    if field_count == 5 {
        format!("0 {} *", expression)
    } else {
        expression.to_string()
    }
}

/// Parse a cron expression, accepting 5-, 6-, or 7-field forms.
pub fn parse_schedule(expression: &str) -> Result<Schedule, CronError> {
    Schedule::from_str(&normalize_expression(expression))
        .map_err(|e| CronError::InvalidCron(format!("'{}': {}", expression, e)))
}

/// Resolve an IANA timezone name. An empty name means UTC.
pub fn resolve_timezone(timezone: &str) -> Result<Tz, CronError> {
    if timezone.is_empty() {
        return Ok(Tz::UTC);
    }
    timezone
        .parse()
        .map_err(|_| CronError::InvalidCron(format!("unknown timezone '{}'", timezone)))
}

/// Check that a schedule does not fire more often than the policy allows.
///
/// Samples the next `sample_count + 1` fire times from now in the given
/// timezone and compares the spacing between the first and last against the
/// policy minimum. Only that leading window is inspected: an expression with
/// irregular spacing (say, firing at :00 and :01 of every hour) can pass
/// even though a later gap is shorter. That trade-off is inherited from the
/// sampling approach and accepted.
pub fn validate_frequency(
    expression: &str,
    timezone: &str,
    policy: &FrequencyPolicy,
) -> Result<(), CronError> {
    let tz = resolve_timezone(timezone)?;
    let schedule = parse_schedule(expression)?;

    let now = Utc::now().with_timezone(&tz);
    let fires: Vec<DateTime<Tz>> = schedule.after(&now).take(policy.sample_count + 1).collect();

    // A schedule with fewer upcoming fires than the sample window cannot
    // violate the minimum.
    if fires.len() < policy.sample_count + 1 {
        return Ok(());
    }

    let (first, last) = (fires[0], fires[fires.len() - 1]);
    let elapsed_secs = (last - first).num_seconds().max(0) as u64;
    if elapsed_secs < policy.min_interval_secs {
        return Err(CronError::TooFrequent {
            actual_secs: elapsed_secs,
            min_secs: policy.min_interval_secs,
        });
    }

    Ok(())
}

/// The next `count` fire times of an expression, in UTC.
///
/// Recomputed from now on every call; intended for display only.
pub fn next_run_times(
    expression: &str,
    timezone: &str,
    count: usize,
) -> Result<Vec<DateTime<Utc>>, CronError> {
    let tz = resolve_timezone(timezone)?;
    let schedule = parse_schedule(expression)?;

    Ok(schedule
        .after(&Utc::now().with_timezone(&tz))
        .take(count)
        .map(|t| t.with_timezone(&Utc))
        .collect())
}
