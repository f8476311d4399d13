use crate::error::{Error, Result};
use chrono::{Datelike, Months, NaiveDate};
use log::{info, trace};
use std::fmt;

/// Description of a scheduled payment. `Other` holds free text typed into the
/// description column that is not part of the canonical vocabulary.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum PaymentKind {
    MonthlyPayment,
    YearlyPayment,
    Other(String),
}

impl PaymentKind {
    pub fn label(&self) -> &str {
        match self {
            PaymentKind::MonthlyPayment => "Monthly Payment",
            PaymentKind::YearlyPayment => "Yearly Payment",
            PaymentKind::Other(text) => text,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "Monthly Payment" => PaymentKind::MonthlyPayment,
            "Yearly Payment" => PaymentKind::YearlyPayment,
            _ => PaymentKind::Other(label.to_string()),
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    Other(String),
}

impl PaymentStatus {
    pub fn label(&self) -> &str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Other(text) => text,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "Paid" => PaymentStatus::Paid,
            "Unpaid" => PaymentStatus::Unpaid,
            _ => PaymentStatus::Other(label.to_string()),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct PaymentRecord {
    pub month: u32,
    pub due_date: NaiveDate,
    pub amount: f64,
    pub kind: PaymentKind,
    pub status: PaymentStatus,
}

impl PaymentRecord {
    pub fn new(
        month: u32,
        due_date: NaiveDate,
        amount: f64,
        kind: PaymentKind,
        status: PaymentStatus,
    ) -> Self {
        Self {
            month,
            due_date,
            amount: round(amount, 2.),
            kind,
            status,
        }
    }
}

impl fmt::Display for PaymentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "month {}, date {}, amount {}, {}, {}",
            self.month,
            self.due_date,
            format_amount(self.amount),
            self.kind,
            self.status
        )
    }
}

/// Payment records in generation order: monthly records, with a yearly record
/// following every twelfth month.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Schedule {
    pub records: Vec<PaymentRecord>,
}

impl Schedule {
    pub fn new(records: Vec<PaymentRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PaymentRecord> {
        self.records.iter()
    }

    pub fn of_kind(&self, kind: PaymentKind) -> impl Iterator<Item = &PaymentRecord> + '_ {
        self.records.iter().filter(move |r| r.kind == kind)
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a PaymentRecord;
    type IntoIter = std::slice::Iter<'a, PaymentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Builds the payment schedule for a loan.
///
/// Every month pays `annual_interest_amount`, due on the last day of the
/// month. Each completed twelve-month block is followed by a yearly principal
/// installment of `principal / (duration_months / 12)`, dated like the monthly
/// record closing the block. A trailing partial year gets no installment.
pub fn generate_schedule(
    principal: f64,              // loan amount
    annual_interest_amount: f64, // paid every month
    duration_months: u32,        // length of the loan in months
    start_date: NaiveDate,       // any day of the first month
) -> Result<Schedule> {
    // the last due date bounds every other one
    start_date
        .checked_add_months(Months::new(duration_months.saturating_sub(1)))
        .and_then(end_of_month)
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "{} months from {} runs past the calendar",
                duration_months, start_date
            ))
        })?;

    let mut records = Vec::new();
    let yearly_amount = principal / (duration_months as f64 / 12.);

    for i in 0..duration_months {
        let due_date = start_date
            .checked_add_months(Months::new(i))
            .and_then(end_of_month)
            .ok_or_else(|| {
                Error::InvalidInput(format!("{} plus {} months is out of range", start_date, i))
            })?;
        let month = i + 1;

        records.push(PaymentRecord::new(
            month,
            due_date,
            annual_interest_amount,
            PaymentKind::MonthlyPayment,
            PaymentStatus::Unpaid,
        ));
        trace!("month {}, due {}", month, due_date);

        if month % 12 == 0 {
            records.push(PaymentRecord::new(
                month,
                due_date,
                yearly_amount,
                PaymentKind::YearlyPayment,
                PaymentStatus::Unpaid,
            ));
            trace!("month {}, yearly payment {}", month, yearly_amount);
        }
    }

    info!(
        "generated {} payment records for {} months from {}",
        records.len(),
        duration_months,
        start_date
    );
    Ok(Schedule::new(records))
}

/// Last calendar day of `date`'s month.
pub fn end_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// Rounds to `dec` decimals. Amounts too large to hold that many decimals
/// come back unchanged.
pub fn round(amt: f64, dec: f64) -> f64 {
    let scaled = amt * 10_f64.powf(dec);
    if amt == 0. {
        0.
    } else if !scaled.is_finite() || scaled.abs() >= 2_f64.powi(f64::MANTISSA_DIGITS as i32) {
        amt
    } else {
        scaled.round() / 10_f64.powf(dec)
    }
}

/// Renders an amount with two decimals and comma thousands separators,
/// e.g. `1,200.00`.
pub fn format_amount(amt: f64) -> String {
    let fixed = format!("{:.2}", round(amt, 2.));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{}", sign, grouped, frac)
}

/// Parses an amount cell, ignoring thousands separators.
pub fn parse_amount(text: &str) -> Result<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    match cleaned.parse::<f64>() {
        Ok(amt) if amt.is_finite() => Ok(round(amt, 2.)),
        _ => Err(Error::InvalidAmount(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_end_of_month() {
        assert_eq!(end_of_month(ymd(2024, 1, 1)), Some(ymd(2024, 1, 31)));
        assert_eq!(end_of_month(ymd(2024, 2, 10)), Some(ymd(2024, 2, 29)));
        assert_eq!(end_of_month(ymd(2023, 2, 28)), Some(ymd(2023, 2, 28)));
        assert_eq!(end_of_month(ymd(2023, 12, 15)), Some(ymd(2023, 12, 31)));
        assert_eq!(end_of_month(ymd(2022, 4, 30)), Some(ymd(2022, 4, 30)));
    }

    #[test]
    fn test_one_year_schedule() {
        let schedule = generate_schedule(1200., 10., 12, ymd(2024, 1, 1)).unwrap();

        assert_eq!(schedule.len(), 13);
        let monthly: Vec<_> = schedule.of_kind(PaymentKind::MonthlyPayment).collect();
        assert_eq!(monthly.len(), 12);
        for (i, record) in monthly.iter().enumerate() {
            let month = i as u32 + 1;
            assert_eq!(record.month, month);
            assert_eq!(record.due_date, end_of_month(ymd(2024, month, 1)).unwrap());
            assert_eq!(record.amount, 10.);
            assert_eq!(record.status, PaymentStatus::Unpaid);
        }
        assert_eq!(monthly[0].due_date, ymd(2024, 1, 31));
        assert_eq!(monthly[11].due_date, ymd(2024, 12, 31));

        let yearly = &schedule.records[12];
        assert_eq!(yearly.kind, PaymentKind::YearlyPayment);
        assert_eq!(yearly.due_date, ymd(2024, 12, 31));
        assert_eq!(yearly.amount, 1200.);
        assert_eq!(yearly.month, 12);
    }

    #[test]
    fn test_record_counts() {
        for months in 1..=61 {
            let schedule = generate_schedule(100000., 250.5, months, ymd(2023, 6, 15)).unwrap();
            let monthly = schedule.of_kind(PaymentKind::MonthlyPayment).count();
            let yearly = schedule.of_kind(PaymentKind::YearlyPayment).count();
            assert_eq!(monthly, months as usize);
            assert_eq!(yearly, (months / 12) as usize);
        }
    }

    #[test]
    fn test_yearly_records_close_their_block() {
        let schedule = generate_schedule(90000., 500., 36, ymd(2024, 3, 5)).unwrap();

        for (idx, record) in schedule.records.iter().enumerate() {
            if record.kind == PaymentKind::YearlyPayment {
                let closing = &schedule.records[idx - 1];
                assert_eq!(closing.kind, PaymentKind::MonthlyPayment);
                assert_eq!(closing.due_date, record.due_date);
                assert_eq!(record.month % 12, 0);
                assert_eq!(record.amount, 30000.);
            }
        }
        assert_eq!(schedule.records.last().unwrap().due_date, ymd(2027, 2, 28));
    }

    #[test]
    fn test_partial_year_amount() {
        // 18 months: principal / 1.5, trailing six months get no installment
        let schedule = generate_schedule(1000., 1., 18, ymd(2024, 1, 1)).unwrap();
        let yearly: Vec<_> = schedule.of_kind(PaymentKind::YearlyPayment).collect();
        assert_eq!(yearly.len(), 1);
        assert_eq!(yearly[0].amount, 666.67);
    }

    #[test]
    fn test_short_months_follow_start_day() {
        let schedule = generate_schedule(0., 1., 3, ymd(2024, 1, 31)).unwrap();
        let dates: Vec<_> = schedule.iter().map(|r| r.due_date).collect();
        assert_eq!(dates, vec![ymd(2024, 1, 31), ymd(2024, 2, 29), ymd(2024, 3, 31)]);
    }

    #[test]
    fn test_zero_months_is_empty() {
        let schedule = generate_schedule(1000., 1., 0, ymd(2024, 1, 1)).unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_months_past_the_calendar_are_rejected() {
        assert!(matches!(
            generate_schedule(1000., 1., u32::MAX, ymd(2024, 1, 1)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_huge_amounts_stay_finite() {
        assert_eq!(round(f64::MAX, 2.), f64::MAX);
        assert_eq!(round(1e307, 2.), 1e307);
        assert_eq!(round(1e300, 2.), 1e300);
        assert_eq!(round(12_345.678, 2.), 12_345.68);
        let schedule = generate_schedule(1e307, 1e307, 12, ymd(2024, 1, 1)).unwrap();
        assert!(schedule.iter().all(|r| r.amount.is_finite()));
        assert_eq!(schedule.records[12].amount, 1e307);
        assert!(!format_amount(schedule.records[12].amount).contains("inf"));
    }

    #[test]
    fn test_monthly_amount_rounded() {
        let schedule = generate_schedule(1000., 10.005_1, 1, ymd(2024, 1, 1)).unwrap();
        assert_eq!(schedule.records[0].amount, 10.01);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.), "0.00");
        assert_eq!(format_amount(10.), "10.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1200.), "1,200.00");
        assert_eq!(format_amount(3000000.), "3,000,000.00");
        assert_eq!(format_amount(100000000.), "100,000,000.00");
        assert_eq!(format_amount(-12345.6), "-12,345.60");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,200.00").unwrap(), 1200.);
        assert_eq!(parse_amount(" 8,333,333.33 ").unwrap(), 8333333.33);
        assert_eq!(parse_amount("10.0").unwrap(), 10.);
        assert!(matches!(parse_amount("ten"), Err(Error::InvalidAmount(_))));
        assert!(matches!(parse_amount(""), Err(Error::InvalidAmount(_))));
        assert!(matches!(parse_amount("inf"), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn test_labels() {
        assert_eq!(PaymentKind::from_label("Yearly Payment"), PaymentKind::YearlyPayment);
        assert_eq!(
            PaymentKind::from_label("Bonus"),
            PaymentKind::Other("Bonus".to_string())
        );
        assert_eq!(PaymentStatus::from_label("Paid").to_string(), "Paid");
        assert_eq!(PaymentStatus::Other("Late".to_string()).label(), "Late");
    }

    #[test]
    fn test_record_display() {
        let record = PaymentRecord::new(
            12,
            ymd(2024, 12, 31),
            1200.,
            PaymentKind::YearlyPayment,
            PaymentStatus::Paid,
        );
        assert_eq!(
            record.to_string(),
            "month 12, date 2024-12-31, amount 1,200.00, Yearly Payment, Paid"
        );
    }
}
