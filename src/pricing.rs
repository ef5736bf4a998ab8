//! Booking fee, discount and period display calculations.
//!
//! Pure functions over decimal amounts; nothing here touches the data store or the
//! mail provider. Every amount leaving this module for a template goes through
//! [`format_currency`].

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Service fee charged on the guest side of a booking.
pub const GUEST_FEE: Decimal = dec!(0.035);

/// Service fee taken from the host payout when the host absorbs the guest fee.
pub const HOST_FEE: Decimal = dec!(0.11);

/// Billing granularity of a listing or booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl PriceType {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceType::Hourly => "hourly",
            PriceType::Daily => "daily",
            PriceType::Weekly => "weekly",
            PriceType::Monthly => "monthly",
        }
    }

    /// Lowercase unit name used for minimum terms ("day", "week", ...)
    pub fn term_unit(self) -> &'static str {
        match self {
            PriceType::Hourly => "hour",
            PriceType::Daily => "day",
            PriceType::Weekly => "week",
            PriceType::Monthly => "month",
        }
    }

    fn period_unit(self) -> &'static str {
        match self {
            PriceType::Hourly => "Hour",
            PriceType::Daily => "Day",
            PriceType::Weekly => "Week",
            PriceType::Monthly => "Month",
        }
    }
}

/// Whose email is being composed; decides which fee applies and how the total reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Guest,
    Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub guest_rate: Decimal,
    pub host_rate: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            guest_rate: GUEST_FEE,
            host_rate: HOST_FEE,
        }
    }
}

/// Raw booking figures the calculator works from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeInput {
    pub base_price: Decimal,
    pub period: u32,
    pub price_type: PriceType,
    pub is_absorved_fee: bool,
    pub voucher_applied: bool,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeBreakdown {
    pub subtotal: Decimal,
    pub service_fee: Decimal,
    /// Only present when a voucher produced a strictly positive reduction
    pub discount: Option<Decimal>,
    pub total: Decimal,
    pub period: String,
}

/// Template-ready strings for a [`FeeBreakdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedFees {
    pub subtotal: String,
    pub service_fee: String,
    pub discount: Option<String>,
    pub total: String,
    pub period: String,
}

/// Round half away from zero to `places` decimals.
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to cents and group thousands: `1234.5` becomes `"1,234.50"`.
pub fn format_currency(amount: Decimal) -> String {
    let mut rounded = round_money(amount, 2);
    rounded.rescale(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = rounded.abs().to_string();
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if negative {
        format!("-{}.{}", grouped, cents)
    } else {
        format!("{}.{}", grouped, cents)
    }
}

/// `"<quantity> <Unit>"`, pluralised above one: `format_period(3, Weekly) == "3 Weeks"`.
pub fn format_period(quantity: u32, price_type: PriceType) -> String {
    let unit = price_type.period_unit();
    if quantity > 1 {
        format!("{} {}s", quantity, unit)
    } else {
        format!("{} {}", quantity, unit)
    }
}

/// Unit name for a listing's minimum term: `format_term(Monthly, 2) == "months"`.
pub fn format_term(booking_period: PriceType, min_term: u32) -> String {
    let unit = booking_period.term_unit();
    if min_term > 1 {
        format!("{}s", unit)
    } else {
        unit.to_string()
    }
}

/// Compute subtotal, service fee, voucher discount and total for one party's email.
///
/// - subtotal is `base_price * period`, rounded to cents
/// - host view: fee rate is the host rate when the fee is absorbed, otherwise the guest
///   rate; total is `subtotal - discount - fee`
/// - guest view: no fee when absorbed, otherwise the guest rate; total is
///   `subtotal + fee - discount`
/// - discount is what the guest was charged before the voucher (`subtotal` plus the guest
///   fee, or `subtotal` alone when the fee is absorbed) minus `total_price`; reported only
///   when a voucher is applied and the result is strictly positive, and never more than
///   that pre-voucher charge
/// - totals never go below zero
pub fn compute_fees(input: &FeeInput, schedule: &FeeSchedule, party: Party) -> FeeBreakdown {
    let subtotal = round_money(input.base_price * Decimal::from(input.period), 2);
    let guest_fee = if input.is_absorved_fee {
        Decimal::ZERO
    } else {
        round_money(subtotal * schedule.guest_rate, 2)
    };
    let guest_charge = subtotal + guest_fee;

    let discount = if input.voucher_applied {
        let raw = round_money(guest_charge - input.total_price, 2);
        if raw > Decimal::ZERO {
            Some(raw.min(guest_charge))
        } else {
            if raw < Decimal::ZERO {
                tracing::warn!(%raw, %subtotal, total_price = %input.total_price, "voucher produced a negative discount, ignoring it");
            }
            None
        }
    } else {
        None
    };
    let applied_discount = discount.unwrap_or(Decimal::ZERO);

    let (service_fee, total) = match party {
        Party::Host => {
            let rate = if input.is_absorved_fee {
                schedule.host_rate
            } else {
                schedule.guest_rate
            };
            let fee = round_money(subtotal * rate, 2);
            (fee, subtotal - applied_discount - fee)
        }
        Party::Guest => (guest_fee, guest_charge - applied_discount),
    };
    let total = total.max(Decimal::ZERO);

    FeeBreakdown {
        subtotal,
        service_fee,
        discount,
        total,
        period: format_period(input.period, input.price_type),
    }
}

impl FeeBreakdown {
    pub fn formatted(&self) -> FormattedFees {
        FormattedFees {
            subtotal: format_currency(self.subtotal),
            service_fee: format_currency(self.service_fee),
            discount: self.discount.map(format_currency),
            total: format_currency(self.total),
            period: self.period.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(base_price: Decimal, period: u32) -> FeeInput {
        FeeInput {
            base_price,
            period,
            price_type: PriceType::Daily,
            is_absorved_fee: false,
            voucher_applied: false,
            total_price: Decimal::ZERO,
        }
    }

    fn is_currency_shaped(s: &str) -> bool {
        let Some((whole, cents)) = s.split_once('.') else {
            return false;
        };
        let groups: Vec<&str> = whole.split(',').collect();
        cents.len() == 2
            && cents.chars().all(|c| c.is_ascii_digit())
            && !groups[0].is_empty()
            && groups[0].len() <= 3
            && groups.iter().all(|g| g.chars().all(|c| c.is_ascii_digit()))
            && groups[1..].iter().all(|g| g.len() == 3)
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(1234.5)), "1,234.50");
        assert_eq!(format_currency(dec!(0)), "0.00");
        assert_eq!(format_currency(dec!(999.999)), "1,000.00");
        assert_eq!(format_currency(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_currency(dec!(10.005)), "10.01");
        assert_eq!(format_currency(dec!(-42.5)), "-42.50");
    }

    #[test]
    fn test_currency_output_shape() {
        for amount in [dec!(0.01), dec!(7), dec!(100), dec!(1000), dec!(65432.1), dec!(1000000)] {
            let formatted = format_currency(amount);
            assert!(is_currency_shaped(&formatted), "{} -> {}", amount, formatted);
        }
    }

    #[test]
    fn test_format_period() {
        assert_eq!(format_period(1, PriceType::Daily), "1 Day");
        assert_eq!(format_period(3, PriceType::Weekly), "3 Weeks");
        assert_eq!(format_period(2, PriceType::Hourly), "2 Hours");
        assert_eq!(format_period(1, PriceType::Monthly), "1 Month");
    }

    #[test]
    fn test_format_term() {
        assert_eq!(format_term(PriceType::Monthly, 1), "month");
        assert_eq!(format_term(PriceType::Monthly, 2), "months");
        assert_eq!(format_term(PriceType::Daily, 1), "day");
        assert_eq!(format_term(PriceType::Hourly, 4), "hours");
    }

    #[test]
    fn test_subtotal_is_rounded_product() {
        let schedule = FeeSchedule::default();
        for (base, period) in [(dec!(0), 1), (dec!(19.995), 3), (dec!(100), 3), (dec!(33.333), 7)] {
            let breakdown = compute_fees(&input(base, period), &schedule, Party::Host);
            assert_eq!(breakdown.subtotal, round_money(base * Decimal::from(period), 2));
        }
    }

    #[test]
    fn test_host_view_without_voucher() {
        let breakdown = compute_fees(&input(dec!(100), 3), &FeeSchedule::default(), Party::Host);
        let formatted = breakdown.formatted();
        assert_eq!(formatted.subtotal, "300.00");
        assert_eq!(formatted.service_fee, "10.50");
        assert_eq!(formatted.total, "289.50");
        assert_eq!(formatted.discount, None);
        assert_eq!(formatted.period, "3 Days");
    }

    #[test]
    fn test_host_absorbs_fee() {
        let mut fees = input(dec!(100), 3);
        fees.is_absorved_fee = true;
        let breakdown = compute_fees(&fees, &FeeSchedule::default(), Party::Host);
        assert_eq!(breakdown.service_fee, dec!(33.00));
        assert_eq!(breakdown.total, dec!(267.00));
    }

    #[test]
    fn test_guest_view() {
        let breakdown = compute_fees(&input(dec!(100), 3), &FeeSchedule::default(), Party::Guest);
        assert_eq!(breakdown.service_fee, dec!(10.50));
        assert_eq!(breakdown.total, dec!(310.50));

        let mut absorbed = input(dec!(100), 3);
        absorbed.is_absorved_fee = true;
        let breakdown = compute_fees(&absorbed, &FeeSchedule::default(), Party::Guest);
        assert_eq!(breakdown.service_fee, Decimal::ZERO);
        assert_eq!(breakdown.total, dec!(300.00));
    }

    #[test]
    fn test_absorbed_fee_voucher_guest_view() {
        let mut fees = input(dec!(100), 3);
        fees.is_absorved_fee = true;
        fees.voucher_applied = true;
        fees.total_price = dec!(270);
        let breakdown = compute_fees(&fees, &FeeSchedule::default(), Party::Guest);
        let formatted = breakdown.formatted();
        assert_eq!(formatted.service_fee, "0.00");
        assert_eq!(formatted.discount.as_deref(), Some("30.00"));
        assert_eq!(formatted.total, "270.00");

        let host = compute_fees(&fees, &FeeSchedule::default(), Party::Host);
        assert_eq!(host.discount, Some(dec!(30.00)));
        assert_eq!(host.service_fee, dec!(33.00));
        assert_eq!(host.total, dec!(237.00));
    }

    #[test]
    fn test_full_voucher_never_goes_negative() {
        for absorbed in [false, true] {
            let mut fees = input(dec!(100), 3);
            fees.is_absorved_fee = absorbed;
            fees.voucher_applied = true;
            fees.total_price = Decimal::ZERO;

            for party in [Party::Host, Party::Guest] {
                let formatted = compute_fees(&fees, &FeeSchedule::default(), party).formatted();
                assert_eq!(formatted.total, "0.00", "absorbed={} party={:?}", absorbed, party);
                assert!(is_currency_shaped(&formatted.total));
                assert!(is_currency_shaped(formatted.discount.as_deref().unwrap()));
            }
        }

        let mut fees = input(dec!(100), 3);
        fees.voucher_applied = true;
        fees.total_price = Decimal::ZERO;
        let guest = compute_fees(&fees, &FeeSchedule::default(), Party::Guest);
        assert_eq!(guest.discount, Some(dec!(310.50)));
    }

    #[test]
    fn test_voucher_discount() {
        let mut fees = input(dec!(100), 3);
        fees.voucher_applied = true;
        fees.total_price = dec!(280.50);
        let breakdown = compute_fees(&fees, &FeeSchedule::default(), Party::Guest);
        assert_eq!(breakdown.discount, Some(dec!(30.00)));
        assert_eq!(breakdown.total, dec!(280.50));

        let host = compute_fees(&fees, &FeeSchedule::default(), Party::Host);
        assert_eq!(host.formatted().discount.as_deref(), Some("30.00"));
        assert_eq!(host.total, dec!(259.50));
    }

    #[test]
    fn test_discount_absent_without_voucher() {
        let mut fees = input(dec!(100), 3);
        fees.total_price = dec!(10);
        let breakdown = compute_fees(&fees, &FeeSchedule::default(), Party::Guest);
        assert_eq!(breakdown.discount, None);
    }

    #[test]
    fn test_non_positive_discount_is_dropped() {
        let mut fees = input(dec!(100), 3);
        fees.voucher_applied = true;
        fees.total_price = dec!(400);
        let breakdown = compute_fees(&fees, &FeeSchedule::default(), Party::Host);
        assert_eq!(breakdown.discount, None);
        assert_eq!(breakdown.total, dec!(289.50));

        fees.total_price = dec!(310.50);
        let breakdown = compute_fees(&fees, &FeeSchedule::default(), Party::Host);
        assert_eq!(breakdown.discount, None);
    }

    #[test]
    fn test_custom_schedule() {
        let schedule = FeeSchedule {
            guest_rate: dec!(0.035),
            host_rate: dec!(0.135),
        };
        let mut fees = input(dec!(200), 1);
        fees.is_absorved_fee = true;
        let breakdown = compute_fees(&fees, &schedule, Party::Host);
        assert_eq!(breakdown.service_fee, dec!(27.00));
    }

    #[test]
    fn test_price_type_serde() {
        let parsed: PriceType = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(parsed, PriceType::Weekly);
        assert_eq!(serde_json::to_string(&PriceType::Hourly).unwrap(), "\"hourly\"");
        assert_eq!(PriceType::Monthly.as_str(), "monthly");
    }
}
