use chrono::NaiveDate;

use super::domain::{Invoice, InvoiceDraft, InvoiceId, InvoicePatch, NewPayment, Payment};
use crate::workflows::RepositoryError;

/// Storage abstraction for invoices and their payment ledger.
pub trait InvoiceRepository: Send + Sync {
    fn insert(&self, draft: InvoiceDraft) -> Result<Invoice, RepositoryError>;
    fn fetch(&self, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError>;
    fn list(&self, user_id: &str) -> Result<Vec<Invoice>, RepositoryError>;
    /// Reads, coalesces, and writes the invoice as one atomic step.
    fn update(
        &self,
        id: InvoiceId,
        patch: &InvoicePatch,
        today: NaiveDate,
    ) -> Result<Invoice, RepositoryError>;
    /// Removes the invoice together with its payments.
    fn delete(&self, id: InvoiceId) -> Result<bool, RepositoryError>;
    /// Appends a payment and moves the invoice's ledger columns in one transaction;
    /// either both writes land or neither does.
    fn record_payment(
        &self,
        invoice_id: InvoiceId,
        payment: &NewPayment,
    ) -> Result<(Payment, Invoice), RepositoryError>;
    /// Payments for an invoice in the order they were recorded.
    fn payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, RepositoryError>;
}
