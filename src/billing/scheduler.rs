use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use futures_util::future::join_all;
use tokio::time;
use tracing::{info, warn};

use crate::config;
use crate::error::BillingResult;

use super::models::{PaymentIntent, PaymentIntentType};
use super::store::ScheduleStore;
use super::submitter::PaymentSubmitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// key: billing-scheduler -> self-perpetuating daily due-charge scan
///
/// A single one-shot timer, re-armed after every firing. The delay is
/// recomputed from the current wall clock each cycle, so irregular firing
/// delays never accumulate and a process restart needs no persisted state.
pub fn spawn(schedules: Arc<dyn ScheduleStore>, submitter: Arc<PaymentSubmitter>) {
    tokio::spawn(async move {
        loop {
            let delay = next_scan_delay(Utc::now());
            info!(delay_secs = delay.as_secs(), "armed next billing scan");
            time::sleep(delay).await;
            if let Err(err) =
                scan_and_process(schedules.as_ref(), submitter.as_ref(), Utc::now()).await
            {
                warn!(?err, "billing scan failed");
            }
        }
    });
}

/// key: billing-scheduler -> scan handler
///
/// Submits one scheduled intent per due entry, all dispatched concurrently.
/// One charge's failure never blocks or fails the others; the aggregate is
/// logged once every in-flight submission has settled.
pub async fn scan_and_process(
    schedules: &dyn ScheduleStore,
    submitter: &PaymentSubmitter,
    now: DateTime<Utc>,
) -> BillingResult<ScanSummary> {
    let cutoff = local_midnight(now);
    let due = schedules.find_due(cutoff).await?;

    let submissions = due.iter().map(|entry| {
        let intent = PaymentIntent {
            business_id: entry.business_id.clone(),
            merchant_uid: entry.merchant_uid.clone(),
            intent_type: PaymentIntentType::Scheduled,
            billing_plan: entry.billing_plan,
            intended_pay_date: entry.schedule,
            amount: entry.amount,
            vat: entry.vat,
        };
        async move {
            match submitter.pay(&intent).await {
                Ok(receipt) => {
                    info!(
                        merchant_uid = %intent.merchant_uid,
                        tx_id = %receipt.tx_id,
                        "scheduled charge submitted"
                    );
                    true
                }
                Err(err) => {
                    warn!(
                        merchant_uid = %intent.merchant_uid,
                        error = %err,
                        "scheduled charge failed"
                    );
                    false
                }
            }
        }
    });

    let outcomes = join_all(submissions).await;
    let succeeded = outcomes.iter().filter(|ok| **ok).count();
    let summary = ScanSummary {
        scanned: outcomes.len(),
        succeeded,
        failed: outcomes.len() - succeeded,
    };
    info!(
        scanned = summary.scanned,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "daily billing scan settled"
    );
    Ok(summary)
}

/// Wall-clock delay until the next occurrence of the configured scan hour in
/// the business timezone.
pub fn next_scan_delay(now: DateTime<Utc>) -> StdDuration {
    delay_until_scan(now, *config::BILLING_UTC_OFFSET_HOURS, *config::BILLING_SCAN_HOUR)
}

pub fn delay_until_scan(now: DateTime<Utc>, offset_hours: i32, scan_hour: u32) -> StdDuration {
    let offset = Duration::hours(offset_hours as i64);
    let local = (now + offset).naive_utc();
    let mut target = local.date().and_time(NaiveTime::MIN) + Duration::hours(scan_hour as i64);
    if local >= target {
        target += Duration::days(1);
    }
    (target - local).to_std().unwrap_or(StdDuration::ZERO)
}

/// Instant of local midnight for the day containing `now`, in the business
/// timezone.
pub fn local_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    local_midnight_at(now, *config::BILLING_UTC_OFFSET_HOURS)
}

pub fn local_midnight_at(now: DateTime<Utc>, offset_hours: i32) -> DateTime<Utc> {
    let offset = Duration::hours(offset_hours as i64);
    let midnight = (now + offset).naive_utc().date().and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&midnight) - offset
}
