use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BillingError;

/// Version stamped into every confirmation metadata payload. Bump when adding
/// fields; decoding tolerates unknown fields from newer writers.
pub const METADATA_VERSION: u32 = 1;

/// key: billing-plans -> cadence catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingPlan {
    #[serde(rename = "4_WEEK")]
    FourWeek,
    #[serde(rename = "26_WEEK")]
    TwentySixWeek,
    #[serde(rename = "52_WEEK")]
    FiftyTwoWeek,
}

impl BillingPlan {
    pub fn cadence_weeks(&self) -> i64 {
        match self {
            BillingPlan::FourWeek => 4,
            BillingPlan::TwentySixWeek => 26,
            BillingPlan::FiftyTwoWeek => 52,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BillingPlan::FourWeek => "4_WEEK",
            BillingPlan::TwentySixWeek => "26_WEEK",
            BillingPlan::FiftyTwoWeek => "52_WEEK",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, BillingError> {
        match code {
            "4_WEEK" => Ok(BillingPlan::FourWeek),
            "26_WEEK" => Ok(BillingPlan::TwentySixWeek),
            "52_WEEK" => Ok(BillingPlan::FiftyTwoWeek),
            other => Err(BillingError::InvalidPlan(other.to_string())),
        }
    }

    pub fn catalog() -> &'static [BillingPlan] {
        &[
            BillingPlan::FourWeek,
            BillingPlan::TwentySixWeek,
            BillingPlan::FiftyTwoWeek,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentIntentType {
    Initial,
    Scheduled,
    /// Reserved. No submission path builds refund intents yet.
    Refund,
}

/// Status of one billing cycle. `Pending` entries are picked up by the daily
/// scan; `Failed` entries are only retried through a default-method change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// A stored payment credential. `customer_uid` is the gateway-issued token;
/// at most one method per business carries `default_method`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub business_id: String,
    pub customer_uid: String,
    pub default_method: bool,
    pub created_at: DateTime<Utc>,
}

/// One recorded decline, kept most-recent-first on the schedule entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub tx_id: String,
    pub params: Value,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// key: billing-schedule-entry -> durable record of one billing cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingScheduleEntry {
    pub merchant_uid: String,
    pub business_id: String,
    /// Due date, normalized to local midnight in the business timezone.
    pub schedule: DateTime<Utc>,
    pub amount: i64,
    pub vat: i64,
    pub billing_plan: BillingPlan,
    pub status: PaymentStatus,
    pub failures: Vec<FailureRecord>,
    pub created_at: DateTime<Utc>,
}

/// Immutable record of a confirmed charge outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub business_id: String,
    pub tx_id: String,
    pub merchant_uid: String,
    pub intent_type: PaymentIntentType,
    pub name: String,
    pub currency: String,
    pub amount: i64,
    pub vat: i64,
    pub customer_uid: String,
    pub status: PaymentStatus,
    pub receipt_url: Option<String>,
    pub intended_pay_date: DateTime<Utc>,
    pub paid_at: DateTime<Utc>,
}

/// What a caller asks the submitter to charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub business_id: String,
    pub merchant_uid: String,
    pub intent_type: PaymentIntentType,
    pub billing_plan: BillingPlan,
    pub intended_pay_date: DateTime<Utc>,
    pub amount: i64,
    pub vat: i64,
}

/// Returned to the caller when the gateway accepts a charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub merchant_uid: String,
    pub tx_id: String,
    pub amount: i64,
    pub receipt_url: Option<String>,
    pub paid_at: DateTime<Utc>,
}

/// key: billing-metadata -> gateway-roundtripped billing context
///
/// Serialized into the charge request's `custom_data` and echoed back verbatim
/// with the confirmation. This is the only channel carrying billing context
/// into the asynchronous confirmation path; no secondary lookup is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeMetadata {
    pub version: u32,
    pub business_id: String,
    pub merchant_uid: String,
    pub customer_uid: String,
    pub name: String,
    pub intent_type: PaymentIntentType,
    pub billing_plan: BillingPlan,
    pub intended_pay_date: DateTime<Utc>,
    pub amount: i64,
    pub vat: i64,
}

impl ChargeMetadata {
    pub fn for_intent(intent: &PaymentIntent, customer_uid: &str, name: &str) -> Self {
        Self {
            version: METADATA_VERSION,
            business_id: intent.business_id.clone(),
            merchant_uid: intent.merchant_uid.clone(),
            customer_uid: customer_uid.to_string(),
            name: name.to_string(),
            intent_type: intent.intent_type,
            billing_plan: intent.billing_plan,
            intended_pay_date: intent.intended_pay_date,
            amount: intent.amount,
            vat: intent.vat,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Builds the business-scoped charge identifier for one cycle.
pub fn merchant_uid(business_id: &str, charge_seq: u32) -> String {
    format!("{business_id}_ch{charge_seq}")
}

/// Derives the next cycle's identifier by incrementing the numeric suffix.
pub fn next_merchant_uid(current: &str) -> Result<String, BillingError> {
    let (prefix, seq) = current.rsplit_once("_ch").ok_or_else(|| {
        BillingError::Validation(format!("merchant uid `{current}` has no charge sequence"))
    })?;
    let seq: u32 = seq.parse().map_err(|_| {
        BillingError::Validation(format!("merchant uid `{current}` has a non-numeric sequence"))
    })?;
    Ok(format!("{prefix}_ch{}", seq + 1))
}
