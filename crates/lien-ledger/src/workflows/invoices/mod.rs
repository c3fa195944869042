//! Invoices, retainage, and the append-only payment ledger.

pub mod domain;
pub mod ledger;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Invoice, InvoiceDraft, InvoiceId, InvoicePatch, InvoiceSummary, InvoiceView, NewInvoice,
    NewPayment, Payment, PaymentId, PaymentStatus,
};
pub use ledger::{retainage_amount, LedgerState};
pub use repository::InvoiceRepository;
pub use router::invoice_router;
pub use service::{InvoiceService, InvoiceServiceError};
