//! Payment application and retainage rules.
//!
//! Everything here is pure. The store runs [`LedgerState::apply_payment`] inside the same
//! write transaction that inserts the payment so the running balance never drifts from
//! the payment history.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use super::domain::PaymentStatus;

/// Currency precision in decimal places.
pub const CURRENCY_SCALE: u32 = 2;

/// Rounds to cents, half away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount × percent / 100`, rounded to cents.
pub fn retainage_amount(amount: Decimal, retainage_percent: Decimal) -> Decimal {
    round_currency(amount * retainage_percent / Decimal::ONE_HUNDRED)
}

/// Whole cents for storage, or `None` when the value does not fit in an `i64`.
pub fn to_cents(value: Decimal) -> Option<i64> {
    let mut rounded = round_currency(value);
    rounded.rescale(CURRENCY_SCALE);
    i64::try_from(rounded.mantissa()).ok()
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, CURRENCY_SCALE)
}

impl PaymentStatus {
    /// Stored status for a paid total against an invoice amount. Never `Overdue`.
    ///
    /// Over-payment counts as paid; nothing is clamped.
    pub fn derive(amount_paid: Decimal, amount: Decimal) -> Self {
        if amount_paid > Decimal::ZERO && amount_paid >= amount {
            PaymentStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

/// The ledger-owned columns of an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerState {
    pub amount: Decimal,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub paid_date: Option<NaiveDate>,
}

impl LedgerState {
    pub fn opening(amount: Decimal) -> Self {
        Self {
            amount,
            amount_paid: Decimal::ZERO,
            payment_status: PaymentStatus::Pending,
            paid_date: None,
        }
    }

    /// State after recording a payment of `amount` on `payment_date`.
    ///
    /// `paid_date` is stamped only on the transition into `paid`.
    pub fn apply_payment(&self, amount: Decimal, payment_date: NaiveDate) -> Self {
        let amount_paid = self.amount_paid + amount;
        let payment_status = PaymentStatus::derive(amount_paid, self.amount);
        let paid_date = if payment_status == PaymentStatus::Paid
            && self.payment_status != PaymentStatus::Paid
        {
            Some(payment_date)
        } else {
            self.paid_date
        };

        Self {
            amount: self.amount,
            amount_paid,
            payment_status,
            paid_date,
        }
    }

    /// State after the invoice total changes to `amount`.
    ///
    /// Entering `paid` stamps `today`; leaving it clears `paid_date`.
    pub fn reprice(&self, amount: Decimal, today: NaiveDate) -> Self {
        let payment_status = PaymentStatus::derive(self.amount_paid, amount);
        let paid_date = match (self.payment_status, payment_status) {
            (PaymentStatus::Paid, PaymentStatus::Paid) => self.paid_date,
            (_, PaymentStatus::Paid) => Some(today),
            _ => None,
        };

        Self {
            amount,
            amount_paid: self.amount_paid,
            payment_status,
            paid_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn money(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn two_payments_walk_pending_partial_paid() {
        let opening = LedgerState::opening(money(1000));

        let first = opening.apply_payment(money(400), date(2025, 5, 1));
        assert_eq!(first.amount_paid, money(400));
        assert_eq!(first.payment_status, PaymentStatus::Partial);
        assert_eq!(first.paid_date, None);

        let second = first.apply_payment(money(600), date(2025, 5, 20));
        assert_eq!(second.amount_paid, money(1000));
        assert_eq!(second.payment_status, PaymentStatus::Paid);
        assert_eq!(second.paid_date, Some(date(2025, 5, 20)));
    }

    #[test]
    fn over_payment_is_paid_and_not_clamped() {
        let state = LedgerState::opening(money(1000)).apply_payment(money(1200), date(2025, 5, 1));

        assert_eq!(state.amount_paid, money(1200));
        assert_eq!(state.payment_status, PaymentStatus::Paid);
        assert_eq!(state.paid_date, Some(date(2025, 5, 1)));
    }

    #[test]
    fn paid_date_is_kept_on_further_payments() {
        let paid = LedgerState::opening(money(1000)).apply_payment(money(1000), date(2025, 5, 1));
        let extra = paid.apply_payment(money(50), date(2025, 6, 1));

        assert_eq!(extra.paid_date, Some(date(2025, 5, 1)));
        assert_eq!(extra.amount_paid, money(1050));
    }

    #[test]
    fn reprice_moves_status_and_paid_date() {
        let partial = LedgerState::opening(money(1000)).apply_payment(money(800), date(2025, 5, 1));

        let lowered = partial.reprice(money(800), date(2025, 6, 1));
        assert_eq!(lowered.payment_status, PaymentStatus::Paid);
        assert_eq!(lowered.paid_date, Some(date(2025, 6, 1)));

        let raised = lowered.reprice(money(1500), date(2025, 6, 2));
        assert_eq!(raised.payment_status, PaymentStatus::Partial);
        assert_eq!(raised.paid_date, None);
    }

    #[test]
    fn zero_paid_is_pending_even_on_zero_amount() {
        assert_eq!(
            PaymentStatus::derive(Decimal::ZERO, Decimal::ZERO),
            PaymentStatus::Pending
        );
    }

    #[test]
    fn retainage_rounds_half_up_to_cents() {
        // 1234.50 × 2.5% = 30.8625
        assert_eq!(
            retainage_amount(Decimal::new(123450, 2), Decimal::new(25, 1)),
            Decimal::new(3086, 2)
        );
        // 10.10 × 5% = 0.505
        assert_eq!(
            retainage_amount(Decimal::new(1010, 2), Decimal::from(5)),
            Decimal::new(51, 2)
        );
        assert_eq!(
            retainage_amount(money(1000), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn cents_conversion_rounds_and_restores() {
        assert_eq!(to_cents(Decimal::new(10005, 3)), Some(1001));
        assert_eq!(to_cents(money(1000)), Some(100_000));
        assert_eq!(from_cents(100_050), Decimal::new(100050, 2));
        assert_eq!(to_cents(Decimal::MAX), None);
    }
}
