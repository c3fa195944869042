use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::clock::FixedClock;
use crate::store::SqliteStore;
use crate::workflows::deadlines::ProjectType;
use crate::workflows::invoices::{
    Invoice, InvoiceDraft, InvoiceId, InvoicePatch, InvoiceRepository, InvoiceService, NewInvoice,
    NewPayment, Payment,
};
use crate::workflows::projects::{NewProject, Project, ProjectRepository};
use crate::workflows::RepositoryError;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2025, 10, 1)
}

pub(super) fn money(value: i64) -> Decimal {
    Decimal::from(value)
}

pub(super) fn build_service() -> InvoiceService<SqliteStore, SqliteStore> {
    build_service_with_store().0
}

pub(super) fn build_service_with_store() -> (
    InvoiceService<SqliteStore, SqliteStore>,
    Arc<SqliteStore>,
) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let service = InvoiceService::new(
        store.clone(),
        store.clone(),
        Arc::new(FixedClock(today())),
    );
    (service, store)
}

/// Builds a service over a fake invoice repository with real project storage behind it.
pub(super) fn service_over<R>(repository: R) -> InvoiceService<R, SqliteStore>
where
    R: InvoiceRepository + 'static,
{
    let projects = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    InvoiceService::new(
        Arc::new(repository),
        projects,
        Arc::new(FixedClock(today())),
    )
}

pub(super) fn insert_project(store: &SqliteStore, user_id: &str) -> Project {
    ProjectRepository::insert(
        store,
        NewProject {
            user_id: user_id.to_string(),
            name: "Eastgate Parking Structure".to_string(),
            project_type: ProjectType::Private,
            work_start_date: Some(date(2025, 8, 4)),
            work_end_date: None,
        },
    )
    .expect("project stored")
}

pub(super) fn new_invoice(user_id: &str, amount: i64) -> NewInvoice {
    NewInvoice {
        user_id: user_id.to_string(),
        project_id: None,
        invoice_number: "INV-1001".to_string(),
        description: Some("Progress billing, level 2 framing".to_string()),
        amount: money(amount),
        retainage_percent: Decimal::ZERO,
        invoice_date: Some(date(2025, 9, 1)),
        due_date: Some(date(2025, 10, 31)),
    }
}

pub(super) fn payment(amount: i64, payment_date: NaiveDate) -> NewPayment {
    NewPayment {
        payment_date,
        amount: money(amount),
        payment_method: Some("check".to_string()),
        check_number: Some("10442".to_string()),
        notes: None,
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Repository that loses every write race.
pub(super) struct ConflictRepository;

impl InvoiceRepository for ConflictRepository {
    fn insert(&self, _draft: InvoiceDraft) -> Result<Invoice, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        Ok(None)
    }

    fn list(&self, _user_id: &str) -> Result<Vec<Invoice>, RepositoryError> {
        Ok(Vec::new())
    }

    fn update(
        &self,
        _id: InvoiceId,
        _patch: &InvoicePatch,
        _today: NaiveDate,
    ) -> Result<Invoice, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn delete(&self, _id: InvoiceId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn record_payment(
        &self,
        _invoice_id: InvoiceId,
        _payment: &NewPayment,
    ) -> Result<(Payment, Invoice), RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn payments(&self, _invoice_id: InvoiceId) -> Result<Vec<Payment>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableRepository;

impl InvoiceRepository for UnavailableRepository {
    fn insert(&self, _draft: InvoiceDraft) -> Result<Invoice, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _user_id: &str) -> Result<Vec<Invoice>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _id: InvoiceId,
        _patch: &InvoicePatch,
        _today: NaiveDate,
    ) -> Result<Invoice, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: InvoiceId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_payment(
        &self,
        _invoice_id: InvoiceId,
        _payment: &NewPayment,
    ) -> Result<(Payment, Invoice), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn payments(&self, _invoice_id: InvoiceId) -> Result<Vec<Payment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
