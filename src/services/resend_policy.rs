use chrono::{DateTime, Duration, Utc};

use crate::config::ResendLimits;

/// Counters read from the account row.
#[derive(Debug, Clone, Copy)]
pub struct ResendState {
    pub resend_count: i32,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub window_started_at: Option<DateTime<Utc>>,
}

/// Counters to persist when a resend is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendGrant {
    pub resend_count: i32,
    pub window_started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendDenial {
    LimitExceeded,
    TooSoon { wait_seconds: i64 },
}

/// Daily cap plus cooldown. A window older than `limits.window` is reset
/// before either check runs.
pub fn evaluate(limits: &ResendLimits, state: ResendState, now: DateTime<Utc>) -> Result<ResendGrant, ResendDenial> {
    let (count, window_started_at) = match state.window_started_at {
        Some(started) if now - started <= limits.window => (state.resend_count, started),
        _ => (0, now),
    };

    if count >= limits.max_per_window {
        return Err(ResendDenial::LimitExceeded);
    }

    if let Some(last) = state.last_sent_at {
        let elapsed = now - last;
        if elapsed < limits.cooldown {
            return Err(ResendDenial::TooSoon {
                wait_seconds: ceil_seconds(limits.cooldown - elapsed),
            });
        }
    }

    Ok(ResendGrant {
        resend_count: count + 1,
        window_started_at,
    })
}

fn ceil_seconds(d: Duration) -> i64 {
    let secs = d.num_seconds();
    if d > Duration::seconds(secs) {
        secs + 1
    } else {
        secs
    }
}
