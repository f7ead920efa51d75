use crate::domain::transition;
use crate::error::{PayoutError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque payout identifier, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutId(Uuid);

impl PayoutId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PayoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The closed set of currencies payouts can be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cny,
    Chf,
    Cad,
    Aud,
    Nzd,
    Rub,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Cny => "CNY",
            Self::Chf => "CHF",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
            Self::Nzd => "NZD",
            Self::Rub => "RUB",
        };
        f.write_str(code)
    }
}

/// Recipient banking details. The engine treats these as an opaque bundle
/// of required fields; format rules are enforced at intake only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientDetails {
    pub full_name: String,
    pub bank_name: String,
    pub account_number: String,
    pub inn: String,
    pub kpp: String,
    pub bik: String,
    pub corr_account: String,
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

impl RecipientDetails {
    /// Intake-time format checks, applied before a record is created.
    /// Distinct from the worker's non-empty check: a record that slipped
    /// past intake is still re-checked for presence before settlement.
    pub fn validate_format(&self) -> Result<()> {
        if self.account_number.len() != 20 || !all_digits(&self.account_number) {
            return Err(PayoutError::Validation(
                "account number must contain exactly 20 digits".into(),
            ));
        }
        if !matches!(self.inn.len(), 10 | 12) || !all_digits(&self.inn) {
            return Err(PayoutError::Validation(
                "inn must contain 10 or 12 digits".into(),
            ));
        }
        if self.kpp.len() != 9 || !all_digits(&self.kpp) {
            return Err(PayoutError::Validation(
                "kpp must contain exactly 9 digits".into(),
            ));
        }
        if self.bik.len() != 9 || !all_digits(&self.bik) {
            return Err(PayoutError::Validation(
                "bik must contain exactly 9 digits".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PayoutStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Result of a processing run, reported back over the result channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Failed,
    Cancelled,
    Skipped,
    NotFound,
    ValidationFailed,
}

/// A single outbound payment request tracked through its lifecycle.
///
/// Mutated exclusively through the store's row-lock contract after
/// creation; `status` only ever advances along the transition graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub id: PayoutId,
    pub amount: Decimal,
    pub currency: Currency,
    pub recipient: RecipientDetails,
    pub description: Option<String>,
    pub status: PayoutStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PayoutRecord {
    pub fn new(
        amount: Decimal,
        currency: Currency,
        recipient: RecipientDetails,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PayoutId::new(),
            amount: amount.round_dp(2),
            currency,
            recipient,
            description,
            status: PayoutStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advances `status`, consulting the transition table first.
    /// Refreshes `updated_at` and clears any stale diagnostic; `Failed`
    /// transitions go through [`PayoutRecord::fail`] so the message is
    /// always set together with the status.
    pub fn transition(&mut self, to: PayoutStatus) -> Result<()> {
        transition::validate(self.status, to)?;
        self.status = to;
        if to != PayoutStatus::Failed {
            self.error_message = None;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Terminal `Failed` transition with its diagnostic.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(PayoutStatus::Failed)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Field validation run by the worker before settlement: positive
    /// amount and every required recipient field present.
    pub fn validate_fields(&self) -> std::result::Result<(), String> {
        if self.amount <= Decimal::ZERO {
            return Err(format!("amount must be positive, got {}", self.amount));
        }
        let required = [
            ("full_name", &self.recipient.full_name),
            ("bank_name", &self.recipient.bank_name),
            ("account_number", &self.recipient.account_number),
            ("inn", &self.recipient.inn),
            ("bik", &self.recipient.bik),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("recipient field {name} is empty"));
            }
        }
        Ok(())
    }
}

/// Complete, format-valid recipient details for unit tests.
#[cfg(test)]
pub(crate) fn test_recipient() -> RecipientDetails {
    RecipientDetails {
        full_name: "ООО ТехноСфера".into(),
        bank_name: "Сбербанк".into(),
        account_number: "40817810900000000001".into(),
        inn: "7701000001".into(),
        kpp: "770101001".into(),
        bik: "044525225".into(),
        corr_account: "30101810400000000225".into(),
    }
}
