//! Scheduled expiry sweeps
//!
//! There is no payment webhook to close stores for us, so two batch
//! sweeps keep tenant state honest: the trial sweep closes stores whose
//! seven-day window lapsed without payment, and the subscription sweep
//! suspends stores whose paid period ran out. Both take the clock as an
//! argument, skip rows that a concurrent approval already moved, and
//! tolerate per-row failures so one broken tenant cannot wedge a batch.
//! An immediate rerun matches zero rows.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, instrument, warn};

use rahba_db::{DbError, SubscriptionRepository, TenantRepository, TenantRow};
use rahba_types::TenantStatus;

use crate::error::BillingError;
use crate::notify::Notifier;

/// How far ahead the trial sweep warns about upcoming expiries, in days
pub const TRIAL_WARNING_DAYS: i64 = 2;

/// Counts from one sweep run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Rows matched by the scan
    pub examined: usize,
    /// Rows successfully transitioned
    pub transitioned: usize,
    /// Notifications delivered
    pub notified: usize,
    /// Rows skipped after a per-row failure
    pub failed: usize,
}

/// Trial and subscription expiry sweeps
pub struct Sweeper<T: TenantRepository, S: SubscriptionRepository> {
    tenants: Arc<T>,
    subscriptions: Arc<S>,
    notifier: Arc<dyn Notifier>,
}

impl<T: TenantRepository, S: SubscriptionRepository> Sweeper<T, S> {
    /// Create a new sweeper
    pub fn new(tenants: Arc<T>, subscriptions: Arc<S>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tenants,
            subscriptions,
            notifier,
        }
    }

    /// Close stores whose trial lapsed and warn about upcoming expiries.
    ///
    /// Each lapsed tenant has its subscription expired and its status set
    /// to expired in one transaction. Tenants whose trial ends within the
    /// next [`TRIAL_WARNING_DAYS`] only get a notification, no state
    /// change.
    #[instrument(skip(self))]
    pub async fn run_trial_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, BillingError> {
        let due = self.tenants.find_expired_trials(now).await?;
        let mut report = SweepReport {
            examined: due.len(),
            ..Default::default()
        };

        for tenant in &due {
            match self.expire_trial(tenant).await {
                Ok(true) => {
                    report.transitioned += 1;
                    self.send(
                        "Trial expired",
                        &format!(
                            "Store '{}' ({}) ran out of trial and was closed.",
                            tenant.name, tenant.subdomain
                        ),
                        &mut report,
                    )
                    .await;
                }
                Ok(false) => {
                    debug!(tenant_id = %tenant.id, "trial already resolved, skipping");
                }
                Err(err) => {
                    report.failed += 1;
                    error!(
                        tenant_id = %tenant.id,
                        error = %err,
                        "trial expiry failed, skipping tenant"
                    );
                }
            }
        }

        let ending = self
            .tenants
            .find_trials_ending_within(now, now + Duration::days(TRIAL_WARNING_DAYS))
            .await?;
        for tenant in &ending {
            self.send(
                "Trial ending soon",
                &format!(
                    "Store '{}' ({}) has its trial ending at {}.",
                    tenant.name,
                    tenant.subdomain,
                    tenant.trial_ends_at.format("%Y-%m-%d %H:%M UTC")
                ),
                &mut report,
            )
            .await;
        }

        info!(
            examined = report.examined,
            transitioned = report.transitioned,
            notified = report.notified,
            failed = report.failed,
            "Trial sweep finished"
        );
        Ok(report)
    }

    /// Suspend stores whose paid period ran out.
    #[instrument(skip(self))]
    pub async fn run_subscription_sweep(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, BillingError> {
        let due = self.subscriptions.find_expired_active(now).await?;
        let mut report = SweepReport {
            examined: due.len(),
            ..Default::default()
        };

        for subscription in &due {
            match self.subscriptions.expire_lapsed(subscription.id, now).await {
                Ok(()) => {
                    report.transitioned += 1;
                    let label = self.tenant_label(subscription.tenant_id).await;
                    self.send(
                        "Subscription expired",
                        &format!("Store {label} was suspended after its paid period ended."),
                        &mut report,
                    )
                    .await;
                }
                // A renewal approval opened a new period since the scan.
                Err(DbError::NotFound) => {
                    debug!(subscription_id = %subscription.id, "period renewed, skipping");
                }
                Err(err) => {
                    report.failed += 1;
                    error!(
                        subscription_id = %subscription.id,
                        error = %err,
                        "subscription expiry failed, skipping row"
                    );
                }
            }
        }

        info!(
            examined = report.examined,
            transitioned = report.transitioned,
            notified = report.notified,
            failed = report.failed,
            "Subscription sweep finished"
        );
        Ok(report)
    }

    /// Returns whether the tenant was transitioned. A false means an
    /// approval resolved the trial between the scan and the update.
    async fn expire_trial(&self, tenant: &TenantRow) -> Result<bool, BillingError> {
        let Some(subscription) = self.subscriptions.find_by_tenant(tenant.id).await? else {
            // Provisioning always creates one; tolerate a missing row.
            warn!(tenant_id = %tenant.id, "trial tenant has no subscription row");
            self.tenants
                .update_status(tenant.id, &TenantStatus::Expired.to_string())
                .await?;
            return Ok(true);
        };

        match self.subscriptions.expire_unpaid(subscription.id).await {
            Ok(()) => Ok(true),
            Err(DbError::NotFound) => Ok(false),
            Err(other) => Err(other.into()),
        }
    }

    async fn tenant_label(&self, tenant_id: uuid::Uuid) -> String {
        match self.tenants.find_by_id(tenant_id).await {
            Ok(Some(tenant)) => format!("'{}' ({})", tenant.name, tenant.subdomain),
            _ => tenant_id.to_string(),
        }
    }

    async fn send(&self, title: &str, message: &str, report: &mut SweepReport) {
        match self.notifier.notify(title, message).await {
            Ok(()) => report.notified += 1,
            Err(err) => warn!(error = %err, "billing notification failed"),
        }
    }
}

impl<T: TenantRepository, S: SubscriptionRepository> std::fmt::Debug for Sweeper<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper").finish_non_exhaustive()
    }
}
