use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::codec::{cents, DecimalText};
use super::SqliteStore;
use crate::workflows::invoices::ledger::from_cents;
use crate::workflows::invoices::{
    Invoice, InvoiceDraft, InvoiceId, InvoicePatch, InvoiceRepository, NewPayment, Payment,
    PaymentId, PaymentStatus,
};
use crate::workflows::projects::ProjectId;
use crate::workflows::RepositoryError;

const INVOICE_COLUMNS: &str = "id, user_id, project_id, invoice_number, description, \
     amount_cents, retainage_percent, retainage_cents, amount_paid_cents, payment_status, \
     invoice_date, due_date, paid_date, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, invoice_id, payment_date, amount_cents, payment_method, \
     check_number, notes, created_at";

fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    let DecimalText(retainage_percent) = row.get(6)?;
    Ok(Invoice {
        id: InvoiceId(row.get(0)?),
        user_id: row.get(1)?,
        project_id: row.get::<_, Option<i64>>(2)?.map(ProjectId),
        invoice_number: row.get(3)?,
        description: row.get(4)?,
        amount: from_cents(row.get(5)?),
        retainage_percent,
        retainage_amount: from_cents(row.get(7)?),
        amount_paid: from_cents(row.get(8)?),
        payment_status: row.get(9)?,
        invoice_date: row.get(10)?,
        due_date: row.get(11)?,
        paid_date: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: PaymentId(row.get(0)?),
        invoice_id: InvoiceId(row.get(1)?),
        payment_date: row.get(2)?,
        amount: from_cents(row.get(3)?),
        payment_method: row.get(4)?,
        check_number: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn fetch_invoice(conn: &Connection, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
    let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");
    Ok(conn.query_row(&sql, [id.0], invoice_from_row).optional()?)
}

fn fetch_payment(conn: &Connection, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1");
    Ok(conn.query_row(&sql, [id.0], payment_from_row).optional()?)
}

impl InvoiceRepository for SqliteStore {
    fn insert(&self, draft: InvoiceDraft) -> Result<Invoice, RepositoryError> {
        let amount_cents = cents("amount", draft.amount)?;
        let retainage_cents = cents("retainage amount", draft.retainage_amount)?;

        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO invoices
                    (user_id, project_id, invoice_number, description, amount_cents,
                     retainage_percent, retainage_cents, amount_paid_cents, payment_status,
                     invoice_date, due_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10, ?11, ?11)",
                params![
                    draft.user_id,
                    draft.project_id.map(|id| id.0),
                    draft.invoice_number,
                    draft.description,
                    amount_cents,
                    DecimalText(draft.retainage_percent),
                    retainage_cents,
                    PaymentStatus::Pending,
                    draft.invoice_date,
                    draft.due_date,
                    now,
                ],
            )?;
            let id = InvoiceId(conn.last_insert_rowid());
            fetch_invoice(conn, id)?.ok_or(RepositoryError::NotFound)
        })
    }

    fn fetch(&self, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        self.with_conn(|conn| fetch_invoice(conn, id))
    }

    fn list(&self, user_id: &str) -> Result<Vec<Invoice>, RepositoryError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = ?1 ORDER BY id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let invoices = stmt
                .query_map([user_id], invoice_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(invoices)
        })
    }

    fn update(
        &self,
        id: InvoiceId,
        patch: &InvoicePatch,
        today: NaiveDate,
    ) -> Result<Invoice, RepositoryError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut invoice = fetch_invoice(&tx, id)?.ok_or(RepositoryError::NotFound)?;
            invoice.apply_patch(patch, today);

            tx.execute(
                "UPDATE invoices
                 SET project_id = ?1, invoice_number = ?2, description = ?3, amount_cents = ?4,
                     retainage_percent = ?5, retainage_cents = ?6, payment_status = ?7,
                     invoice_date = ?8, due_date = ?9, paid_date = ?10, updated_at = ?11
                 WHERE id = ?12",
                params![
                    invoice.project_id.map(|id| id.0),
                    invoice.invoice_number,
                    invoice.description,
                    cents("amount", invoice.amount)?,
                    DecimalText(invoice.retainage_percent),
                    cents("retainage amount", invoice.retainage_amount)?,
                    invoice.payment_status,
                    invoice.invoice_date,
                    invoice.due_date,
                    invoice.paid_date,
                    Utc::now(),
                    id.0,
                ],
            )?;
            let updated = fetch_invoice(&tx, id)?.ok_or(RepositoryError::NotFound)?;
            tx.commit()?;
            Ok(updated)
        })
    }

    fn delete(&self, id: InvoiceId) -> Result<bool, RepositoryError> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM invoices WHERE id = ?1", [id.0])?;
            Ok(removed > 0)
        })
    }

    fn record_payment(
        &self,
        invoice_id: InvoiceId,
        payment: &NewPayment,
    ) -> Result<(Payment, Invoice), RepositoryError> {
        let amount_cents = cents("amount", payment.amount)?;

        self.with_conn_mut(|conn| {
            // IMMEDIATE takes the write lock before the read, so no other writer can
            // slip in between reading the balance and incrementing it.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let invoice = fetch_invoice(&tx, invoice_id)?.ok_or(RepositoryError::NotFound)?;
            let next = invoice
                .ledger()
                .apply_payment(payment.amount, payment.payment_date);
            let now = Utc::now();

            tx.execute(
                "INSERT INTO payments
                    (invoice_id, payment_date, amount_cents, payment_method, check_number,
                     notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    invoice_id.0,
                    payment.payment_date,
                    amount_cents,
                    payment.payment_method,
                    payment.check_number,
                    payment.notes,
                    now,
                ],
            )?;
            let payment_id = PaymentId(tx.last_insert_rowid());

            tx.execute(
                "UPDATE invoices
                 SET amount_paid_cents = amount_paid_cents + ?1, payment_status = ?2,
                     paid_date = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    amount_cents,
                    next.payment_status,
                    next.paid_date,
                    now,
                    invoice_id.0
                ],
            )?;

            let stored_payment =
                fetch_payment(&tx, payment_id)?.ok_or(RepositoryError::NotFound)?;
            let stored_invoice =
                fetch_invoice(&tx, invoice_id)?.ok_or(RepositoryError::NotFound)?;
            tx.commit()?;
            Ok((stored_payment, stored_invoice))
        })
    }

    fn payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, RepositoryError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PAYMENT_COLUMNS} FROM payments
                 WHERE invoice_id = ?1
                 ORDER BY payment_date, id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let payments = stmt
                .query_map([invoice_id.0], payment_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(payments)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).expect("valid date")
    }

    fn stored_invoice(store: &SqliteStore) -> Invoice {
        InvoiceRepository::insert(
            store,
            InvoiceDraft {
                user_id: "sub-42".to_string(),
                project_id: None,
                invoice_number: "INV-3100".to_string(),
                description: None,
                amount: Decimal::from(1000),
                retainage_percent: Decimal::ZERO,
                retainage_amount: Decimal::ZERO,
                invoice_date: Some(date(1)),
                due_date: Some(date(30)),
            },
        )
        .expect("invoice stored")
    }

    fn payment(amount: i64) -> NewPayment {
        NewPayment {
            payment_date: date(15),
            amount: Decimal::from(amount),
            payment_method: Some("wire".to_string()),
            check_number: None,
            notes: None,
        }
    }

    #[test]
    fn failed_balance_update_leaves_no_payment_behind() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let invoice = stored_invoice(&store);
        store
            .with_conn(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER freeze_ledger BEFORE UPDATE OF amount_paid_cents ON invoices
                     BEGIN SELECT RAISE(ABORT, 'ledger frozen'); END;",
                )?;
                Ok(())
            })
            .expect("trigger installed");

        let err = store
            .record_payment(invoice.id, &payment(400))
            .expect_err("balance update aborted");

        assert!(matches!(err, RepositoryError::Constraint(_)));
        assert!(store.payments(invoice.id).expect("payments").is_empty());
        let unchanged = InvoiceRepository::fetch(&store, invoice.id)
            .expect("fetch")
            .expect("invoice still stored");
        assert_eq!(unchanged.amount_paid, Decimal::ZERO);
        assert_eq!(unchanged.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn payment_on_missing_invoice_writes_nothing() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");

        let err = store
            .record_payment(InvoiceId(41), &payment(100))
            .expect_err("no invoice");

        assert!(matches!(err, RepositoryError::NotFound));
        assert!(store.payments(InvoiceId(41)).expect("payments").is_empty());
    }
}
