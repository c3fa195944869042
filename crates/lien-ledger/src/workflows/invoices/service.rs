use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::domain::{
    Invoice, InvoiceDraft, InvoiceId, InvoicePatch, InvoiceSummary, InvoiceView, NewInvoice,
    NewPayment, Payment, PaymentStatus,
};
use super::ledger::{self, retainage_amount};
use super::repository::InvoiceRepository;
use crate::clock::Clock;
use crate::workflows::projects::{ProjectId, ProjectRepository};
use crate::workflows::{require_text, RepositoryError, ValidationError};

/// Service composing invoice storage, the payment ledger, and the read-time clock.
pub struct InvoiceService<R, P> {
    repository: Arc<R>,
    projects: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<R, P> InvoiceService<R, P>
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    pub fn new(repository: Arc<R>, projects: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            projects,
            clock,
        }
    }

    pub fn create(&self, invoice: NewInvoice) -> Result<InvoiceView, InvoiceServiceError> {
        require_text("userId", &invoice.user_id)?;
        require_text("invoiceNumber", &invoice.invoice_number)?;
        validate_amount("amount", invoice.amount)?;
        validate_percent(invoice.retainage_percent)?;
        if let Some(project_id) = invoice.project_id {
            self.require_owned_project(project_id, &invoice.user_id)?;
        }

        let amount = ledger::round_currency(invoice.amount);
        let draft = InvoiceDraft {
            retainage_amount: retainage_amount(amount, invoice.retainage_percent),
            user_id: invoice.user_id,
            project_id: invoice.project_id,
            invoice_number: invoice.invoice_number,
            description: invoice.description,
            amount,
            retainage_percent: invoice.retainage_percent,
            invoice_date: invoice.invoice_date,
            due_date: invoice.due_date,
        };

        let stored = self.repository.insert(draft)?;
        info!(
            invoice_id = stored.id.0,
            user_id = %stored.user_id,
            amount = %stored.amount,
            "invoice created"
        );
        Ok(self.view(stored))
    }

    pub fn get(&self, id: InvoiceId) -> Result<InvoiceView, InvoiceServiceError> {
        Ok(self.view(self.fetch(id)?))
    }

    /// Lists a user's invoices. `status` filters on the displayed status, so
    /// `overdue` selects unpaid invoices past their due date.
    pub fn list(
        &self,
        user_id: &str,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<InvoiceView>, InvoiceServiceError> {
        require_text("userId", user_id)?;
        let views = self
            .repository
            .list(user_id)?
            .into_iter()
            .map(|invoice| self.view(invoice))
            .filter(|view| status.map_or(true, |wanted| view.display_status == wanted))
            .collect();
        Ok(views)
    }

    pub fn summary(&self, user_id: &str) -> Result<InvoiceSummary, InvoiceServiceError> {
        let views = self.list(user_id, None)?;
        Ok(InvoiceSummary::from_views(&views))
    }

    pub fn update(
        &self,
        id: InvoiceId,
        patch: InvoicePatch,
    ) -> Result<InvoiceView, InvoiceServiceError> {
        if let Some(number) = &patch.invoice_number {
            require_text("invoiceNumber", number)?;
        }
        if let Some(amount) = patch.amount {
            validate_amount("amount", amount)?;
        }
        if let Some(percent) = patch.retainage_percent {
            validate_percent(percent)?;
        }
        if let Some(project_id) = patch.project_id {
            let current = self.fetch(id)?;
            self.require_owned_project(project_id, &current.user_id)?;
        }
        let patch = InvoicePatch {
            amount: patch.amount.map(ledger::round_currency),
            ..patch
        };

        let stored = self.repository.update(id, &patch, self.clock.today())?;
        info!(
            invoice_id = stored.id.0,
            status = %stored.payment_status,
            "invoice updated"
        );
        Ok(self.view(stored))
    }

    pub fn delete(&self, id: InvoiceId) -> Result<(), InvoiceServiceError> {
        if !self.repository.delete(id)? {
            return Err(RepositoryError::NotFound.into());
        }
        info!(invoice_id = id.0, "invoice deleted");
        Ok(())
    }

    /// Appends a payment and returns it; the invoice's running balance, status, and
    /// paid date move in the same transaction.
    pub fn record_payment(
        &self,
        invoice_id: InvoiceId,
        payment: NewPayment,
    ) -> Result<Payment, InvoiceServiceError> {
        validate_amount("amount", payment.amount)?;
        if payment.amount <= Decimal::ZERO {
            return Err(ValidationError("amount must be greater than zero".to_string()).into());
        }
        let payment = NewPayment {
            amount: ledger::round_currency(payment.amount),
            ..payment
        };
        if payment.amount.is_zero() {
            return Err(ValidationError("amount rounds to zero cents".to_string()).into());
        }

        let (payment, invoice) = self.repository.record_payment(invoice_id, &payment)?;
        info!(
            invoice_id = invoice.id.0,
            payment_id = payment.id.0,
            amount = %payment.amount,
            amount_paid = %invoice.amount_paid,
            status = %invoice.payment_status,
            "payment recorded"
        );
        Ok(payment)
    }

    pub fn payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, InvoiceServiceError> {
        self.fetch(invoice_id)?;
        Ok(self.repository.payments(invoice_id)?)
    }

    fn fetch(&self, id: InvoiceId) -> Result<Invoice, InvoiceServiceError> {
        let invoice = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(invoice)
    }

    /// Missing projects and projects owned by another user look the same to callers.
    fn require_owned_project(
        &self,
        id: ProjectId,
        user_id: &str,
    ) -> Result<(), InvoiceServiceError> {
        match self.projects.fetch(id)? {
            Some(project) if project.user_id == user_id => Ok(()),
            _ => Err(InvoiceServiceError::ProjectNotFound(id.0)),
        }
    }

    fn view(&self, invoice: Invoice) -> InvoiceView {
        let display_status = invoice.display_status(self.clock.today());
        InvoiceView {
            invoice,
            display_status,
        }
    }
}

fn validate_amount(field: &str, amount: Decimal) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError(format!("{field} must not be negative")));
    }
    if ledger::to_cents(amount).is_none() {
        return Err(ValidationError(format!("{field} is out of range")));
    }
    Ok(())
}

fn validate_percent(percent: Decimal) -> Result<(), ValidationError> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError(
            "retainagePercent must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

/// Error raised by the invoice service.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("project {0} not found")]
    ProjectNotFound(i64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
