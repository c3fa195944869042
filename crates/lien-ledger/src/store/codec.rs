use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;

use crate::workflows::deadlines::{DeadlineStatus, DeadlineType, Priority, ProjectType, TriggerEvent};
use crate::workflows::invoices::ledger;
use crate::workflows::invoices::PaymentStatus;
use crate::workflows::RepositoryError;

/// Stores a text enum by its wire name.
macro_rules! text_column {
    ($($name:ty),+ $(,)?) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|err| FromSqlError::Other(Box::new(err)))
                }
            }
        )+
    };
}

text_column!(
    DeadlineType,
    ProjectType,
    TriggerEvent,
    DeadlineStatus,
    Priority,
    PaymentStatus,
);

/// Percentages are kept as decimal text so no precision is lost.
pub(super) struct DecimalText(pub Decimal);

impl ToSql for DecimalText {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.normalize().to_string()))
    }
}

impl FromSql for DecimalText {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Decimal::from_str(text)
            .map(DecimalText)
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Converts a currency amount to stored cents.
pub(super) fn cents(field: &str, value: Decimal) -> Result<i64, RepositoryError> {
    ledger::to_cents(value)
        .ok_or_else(|| RepositoryError::Constraint(format!("{field} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn enums_round_trip_through_text_columns() {
        let conn = Connection::open_in_memory().expect("db");
        let stored: String = conn
            .query_row("SELECT ?1", [DeadlineType::PaymentBondClaim], |row| row.get(0))
            .expect("select");
        assert_eq!(stored, "payment_bond_claim");

        let parsed: Priority = conn
            .query_row("SELECT 'critical'", [], |row| row.get(0))
            .expect("select");
        assert_eq!(parsed, Priority::Critical);
    }

    #[test]
    fn unknown_text_is_a_conversion_error() {
        let conn = Connection::open_in_memory().expect("db");
        let result: rusqlite::Result<ProjectType> =
            conn.query_row("SELECT 'municipal'", [], |row| row.get(0));
        assert!(result.is_err());
    }

    #[test]
    fn percentages_keep_their_precision() {
        let conn = Connection::open_in_memory().expect("db");
        let DecimalText(value) = conn
            .query_row("SELECT ?1", [DecimalText(Decimal::new(125, 1))], |row| {
                row.get(0)
            })
            .expect("select");
        assert_eq!(value, Decimal::new(125, 1));
    }
}
