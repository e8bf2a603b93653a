use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::interface::{AccountRepository, RefreshTokenRepository, Result};
use crate::services::clock::Clock;
use crate::services::metrics::AuthMetricsCollector;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub refresh_tokens: u64,
    pub account_tokens: u64,
}

/// Housekeeping for expired refresh tokens and expired, unredeemed
/// verification/reset tokens. Every read path re-checks expiry on its own.
pub struct TokenSweeper {
    accounts: Arc<dyn AccountRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    clock: Arc<dyn Clock>,
    metrics: Option<AuthMetricsCollector>,
}

impl TokenSweeper {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            refresh_tokens,
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: AuthMetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn sweep_once(&self) -> Result<SweepReport> {
        let now = self.clock.now();
        let report = SweepReport {
            refresh_tokens: self.refresh_tokens.delete_expired(now).await?,
            account_tokens: self.accounts.clear_expired_tokens(now).await?,
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_swept("refresh_token", report.refresh_tokens);
            metrics.record_swept("account_token", report.account_tokens);
        }

        Ok(report)
    }

    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                match self.sweep_once().await {
                    Ok(report) => tracing::debug!(
                        refresh_tokens = report.refresh_tokens,
                        account_tokens = report.account_tokens,
                        "Token sweep finished"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Token sweep failed"),
                }
            }
        })
    }
}
