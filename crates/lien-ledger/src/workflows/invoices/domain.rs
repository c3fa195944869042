use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ledger::{self, LedgerState};
use crate::workflows::projects::ProjectId;

/// Identifier wrapper for persisted invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub i64);

/// Identifier wrapper for ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub i64);

/// Payment state of an invoice.
///
/// The ledger only ever stores `pending`, `partial`, or `paid`; `overdue` is a read-time
/// overlay computed from the due date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Overdue,
}

text_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Partial => "partial",
    Paid => "paid",
    Overdue => "overdue",
});

/// Persisted invoice row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub user_id: String,
    pub project_id: Option<ProjectId>,
    pub invoice_number: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub retainage_percent: Decimal,
    pub retainage_amount: Decimal,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn ledger(&self) -> LedgerState {
        LedgerState {
            amount: self.amount,
            amount_paid: self.amount_paid,
            payment_status: self.payment_status,
            paid_date: self.paid_date,
        }
    }

    pub fn set_ledger(&mut self, state: LedgerState) {
        self.amount = state.amount;
        self.amount_paid = state.amount_paid;
        self.payment_status = state.payment_status;
        self.paid_date = state.paid_date;
    }

    /// Coalesces `patch` into the invoice.
    ///
    /// Supplying either `amount` or `retainagePercent` recomputes the retainage amount;
    /// changing the amount re-derives the payment status against what has been paid.
    pub fn apply_patch(&mut self, patch: &InvoicePatch, today: NaiveDate) {
        if let Some(number) = &patch.invoice_number {
            self.invoice_number = number.clone();
        }
        if patch.description.is_some() {
            self.description = patch.description.clone();
        }
        if patch.project_id.is_some() {
            self.project_id = patch.project_id;
        }
        if patch.invoice_date.is_some() {
            self.invoice_date = patch.invoice_date;
        }
        if patch.due_date.is_some() {
            self.due_date = patch.due_date;
        }
        if let Some(percent) = patch.retainage_percent {
            self.retainage_percent = percent;
        }
        if let Some(amount) = patch.amount {
            let repriced = self.ledger().reprice(amount, today);
            self.set_ledger(repriced);
        }
        if patch.amount.is_some() || patch.retainage_percent.is_some() {
            self.retainage_amount = ledger::retainage_amount(self.amount, self.retainage_percent);
        }
    }

    /// Status shown to clients: the stored status, or `overdue` once an unpaid invoice
    /// is past its due date.
    pub fn display_status(&self, today: NaiveDate) -> PaymentStatus {
        match (self.payment_status, self.due_date) {
            (PaymentStatus::Pending | PaymentStatus::Partial, Some(due)) if due < today => {
                PaymentStatus::Overdue
            }
            (status, _) => status,
        }
    }
}

/// Invoice awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub user_id: String,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    pub invoice_number: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub retainage_percent: Decimal,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Validated invoice with derived columns filled in, ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub user_id: String,
    pub project_id: Option<ProjectId>,
    pub invoice_number: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub retainage_percent: Decimal,
    pub retainage_amount: Decimal,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// Partial update; absent fields keep their stored value. Ledger columns
/// (`amount_paid`, `payment_status`, `paid_date`) are only moved by payments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePatch {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub retainage_percent: Option<Decimal>,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Immutable ledger entry against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub check_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub check_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Invoice as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub display_status: PaymentStatus,
}

/// Per-user totals across every invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    pub invoice_count: usize,
    pub total_invoiced: Decimal,
    pub total_paid: Decimal,
    /// Unpaid balance; over-payments never reduce it below zero.
    pub outstanding: Decimal,
    /// Sum of amounts paid beyond each invoice's total.
    pub credit: Decimal,
    pub retainage_total: Decimal,
    pub overdue_count: usize,
}

impl InvoiceSummary {
    pub fn from_views<'a>(views: impl IntoIterator<Item = &'a InvoiceView>) -> Self {
        views
            .into_iter()
            .fold(Self::default(), |mut summary, view| {
                let invoice = &view.invoice;
                let balance = invoice.amount - invoice.amount_paid;

                summary.invoice_count += 1;
                summary.total_invoiced += invoice.amount;
                summary.total_paid += invoice.amount_paid;
                if balance.is_sign_positive() {
                    summary.outstanding += balance;
                } else {
                    summary.credit -= balance;
                }
                summary.retainage_total += invoice.retainage_amount;
                if view.display_status == PaymentStatus::Overdue {
                    summary.overdue_count += 1;
                }
                summary
            })
    }
}
