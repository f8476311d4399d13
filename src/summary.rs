//! Paid vs. unpaid totals for monthly and for yearly payments, the data behind
//! the two-pane status chart.

use crate::cache::TranslationCache;
use crate::loan::{format_amount, round, PaymentKind, PaymentStatus, Schedule};
use crate::schema::CHART_TITLE;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, PartialEq, Debug)]
pub struct Slice {
    pub status: PaymentStatus,
    pub label: String,
    pub total: f64,
    /// Fraction of the pane total, 0 when the pane is empty.
    pub share: f64,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Pane {
    pub kind: PaymentKind,
    pub title: String,
    pub total: f64,
    pub slices: Vec<Slice>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct PaymentSummary {
    pub title: String,
    pub monthly: Pane,
    pub yearly: Pane,
}

impl PaymentSummary {
    pub fn panes(&self) -> [&Pane; 2] {
        [&self.monthly, &self.yearly]
    }
}

pub fn summarize(
    schedule: &Schedule,
    language: &str,
    cache: &mut TranslationCache,
) -> PaymentSummary {
    let title = cache
        .dictionary(language)
        .get(CHART_TITLE)
        .cloned()
        .unwrap_or_else(|| CHART_TITLE.to_string());

    PaymentSummary {
        title,
        monthly: pane(schedule, PaymentKind::MonthlyPayment, language, cache),
        yearly: pane(schedule, PaymentKind::YearlyPayment, language, cache),
    }
}

fn pane(
    schedule: &Schedule,
    kind: PaymentKind,
    language: &str,
    cache: &mut TranslationCache,
) -> Pane {
    let mut totals: BTreeMap<PaymentStatus, f64> = BTreeMap::new();
    for record in schedule.of_kind(kind.clone()) {
        *totals.entry(record.status.clone()).or_default() += record.amount;
    }
    let total: f64 = totals.values().sum();

    let slices = totals
        .into_iter()
        .map(|(status, amount)| {
            let label = match &status {
                // typed by hand, shown as typed
                PaymentStatus::Other(text) => text.clone(),
                known => cache.resolve(known.label(), language),
            };
            Slice {
                label,
                total: round(amount, 2.),
                share: if total > 0. { amount / total } else { 0. },
                status,
            }
        })
        .collect();

    Pane {
        title: cache
            .dictionary(language)
            .get(kind.label())
            .cloned()
            .unwrap_or_else(|| kind.label().to_string()),
        kind,
        total: round(total, 2.),
        slices,
    }
}

impl fmt::Display for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.title, format_amount(self.total))?;
        if self.slices.is_empty() {
            return writeln!(f, "  -");
        }
        let width = self.slices.iter().map(|s| s.label.chars().count()).max().unwrap_or(0);
        for slice in &self.slices {
            let pad = width - slice.label.chars().count();
            writeln!(
                f,
                "  {}{}  {:>18}  {:>5.1}%",
                slice.label,
                " ".repeat(pad),
                format_amount(slice.total),
                slice.share * 100.
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for PaymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for pane in self.panes() {
            write!(f, "{}", pane)?;
        }
        Ok(())
    }
}
