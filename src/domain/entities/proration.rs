//! Advisory proration math for plan changes.
//!
//! Estimates only: actual billing uses the provider's own proration. The
//! model is a linear day-fraction split of both plans' prices over the
//! remaining portion of the current billing period.

const SECONDS_PER_DAY: i64 = 86_400;

/// Transient proration estimate for switching plans mid-period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ProrationEstimate {
    pub days_remaining: i64,
    pub days_in_period: i64,
    pub prorated_charge_cents: i64,
    pub is_upgrade: bool,
}

/// Ceiling division of a span of seconds into whole days, clamped at zero.
fn span_days(span_secs: i64) -> i64 {
    if span_secs <= 0 {
        return 0;
    }
    (span_secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}

/// Estimate the prorated charge for moving from `current_price_cents` to
/// `new_price_cents` at `now`, within a period of
/// `[period_start, period_end]` (unix seconds).
///
/// `unused = current * remaining/period`, `new_charge = new * remaining/period`,
/// `charge = max(0, new_charge - unused)`.
pub fn estimate(
    current_price_cents: i64,
    new_price_cents: i64,
    period_start: i64,
    period_end: i64,
    now: i64,
) -> ProrationEstimate {
    let days_remaining = span_days(period_end - now);
    // A degenerate period still divides cleanly
    let days_in_period = span_days(period_end - period_start).max(1);

    let fraction = days_remaining as f64 / days_in_period as f64;
    let unused = current_price_cents as f64 * fraction;
    let new_charge = new_price_cents as f64 * fraction;
    let prorated_charge_cents = (new_charge - unused).max(0.0).round() as i64;

    ProrationEstimate {
        days_remaining,
        days_in_period,
        prorated_charge_cents,
        is_upgrade: new_price_cents > current_price_cents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_mid_period_charges_the_delta() {
        // 30-day period, upgrading on day 10 from $10 to $25:
        // 20 days remain, charge = 25*20/30 - 10*20/30 = $10.00
        let est = estimate(1000, 2500, 0, 2_592_000, 864_000);
        assert_eq!(est.days_remaining, 20);
        assert_eq!(est.days_in_period, 30);
        assert_eq!(est.prorated_charge_cents, 1000);
        assert!(est.is_upgrade);
    }

    #[test]
    fn downgrade_never_goes_negative() {
        let est = estimate(2500, 1000, 0, 2_592_000, 864_000);
        assert_eq!(est.prorated_charge_cents, 0);
        assert!(!est.is_upgrade);
    }

    #[test]
    fn charge_scales_linearly_with_remaining_days() {
        // Same upgrade with half the remaining time costs half as much.
        let full = estimate(1000, 2500, 0, 2_592_000, 0);
        let half = estimate(1000, 2500, 0, 2_592_000, 1_296_000);
        assert_eq!(full.days_remaining, 30);
        assert_eq!(half.days_remaining, 15);
        assert_eq!(half.prorated_charge_cents, full.prorated_charge_cents / 2);
    }

    #[test]
    fn expired_period_charges_nothing() {
        let est = estimate(1000, 2500, 0, 2_592_000, 3_000_000);
        assert_eq!(est.days_remaining, 0);
        assert_eq!(est.prorated_charge_cents, 0);
    }

    #[test]
    fn partial_days_round_up() {
        // 10 days and one second remaining counts as 11 days.
        let est = estimate(1000, 2500, 0, 2_592_000, 2_592_000 - 10 * 86_400 - 1);
        assert_eq!(est.days_remaining, 11);
    }

    #[test]
    fn degenerate_period_does_not_divide_by_zero() {
        let est = estimate(1000, 2500, 100, 100, 100);
        assert_eq!(est.days_in_period, 1);
        assert_eq!(est.prorated_charge_cents, 0);
    }

    #[test]
    fn equal_prices_charge_nothing() {
        let est = estimate(1000, 1000, 0, 2_592_000, 864_000);
        assert_eq!(est.prorated_charge_cents, 0);
        assert!(!est.is_upgrade);
    }
}
