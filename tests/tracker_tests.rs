//! Session-level tests: load-or-generate, editing and translation enrichment

use chrono::NaiveDate;
use loan_tracker::config::LoanTerms;
use loan_tracker::live::{LiveTranslator, Offline};
use loan_tracker::loan::{PaymentKind, PaymentStatus};
use loan_tracker::store::Store;
use loan_tracker::tracker::{Origin, Tracker};
use loan_tracker::translate::TranslationTable;
use loan_tracker::{Error, Result};
use tempfile::TempDir;
use test_log::test;

struct Echo;

impl LiveTranslator for Echo {
    fn translate(&self, text: &str, target: &str) -> Result<String> {
        Ok(format!("{} ({})", text, target))
    }
}

fn terms(language: &str) -> LoanTerms {
    LoanTerms {
        principal: 1200.,
        annual_interest_amount: 10.,
        duration_months: 12,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        language: language.to_string(),
    }
}

fn setup(live: Box<dyn LiveTranslator>) -> (TempDir, Tracker) {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("data"), dir.path().join("json"));
    let mut table = TranslationTable::new();
    table.insert("vi", "Status", "Trạng thái");
    table.insert("vi", "Paid", "Đã thanh toán");
    table.insert("vi", "Unpaid", "Chưa thanh toán");
    table.insert("vi", "Loan Payment Schedule", "Lịch thanh toán");
    table.insert("vi", "Year", "Năm");
    store.save_table(&table).unwrap();
    let tracker = Tracker::open(store, live).unwrap();
    (dir, tracker)
}

#[test]
fn test_generates_then_loads() {
    let (_dir, tracker) = setup(Box::new(Offline));
    let vi = terms("vi");

    let (schedule, origin) = tracker.load_or_generate(&vi).unwrap();
    assert_eq!(origin, Origin::Generated);
    assert_eq!(schedule.len(), 13);

    let mut view = tracker.view(&schedule, "vi");
    assert_eq!(view.headers[4], "Trạng thái");
    view.set_status(0, "Đã thanh toán").unwrap();
    tracker.save_edited(&view, 12).unwrap();

    let (reloaded, origin) = tracker.load_or_generate(&vi).unwrap();
    assert_eq!(origin, Origin::Loaded);
    assert_eq!(reloaded.records[0].status, PaymentStatus::Paid);

    // the canonical file carries the same edit
    let (english, origin) = tracker.load_or_generate(&terms("en")).unwrap();
    assert_eq!(origin, Origin::Loaded);
    assert_eq!(english, reloaded);
}

#[test]
fn test_invalid_terms_never_reach_generator() {
    let (_dir, tracker) = setup(Box::new(Offline));
    let mut bad = terms("en");
    bad.duration_months = 0;
    assert!(matches!(
        tracker.load_or_generate(&bad),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_heading_and_options() {
    let (_dir, tracker) = setup(Box::new(Offline));
    assert_eq!(tracker.heading("vi", 12), "Lịch thanh toán for 1 Năm");
    assert_eq!(tracker.heading("en", 36), "Loan Payment Schedule for 3 Years");
    assert_eq!(
        tracker.status_options("vi"),
        vec!["Đã thanh toán", "Chưa thanh toán"]
    );
}

#[test]
fn test_terms_fall_back_to_known_language() {
    let (_dir, tracker) = setup(Box::new(Offline));
    let mut saved = terms("fr");
    saved.duration_months = 24;
    tracker.save_terms(&saved).unwrap();

    let loaded = tracker.terms().unwrap();
    assert_eq!(loaded.duration_months, 24);
    assert_eq!(loaded.language, "en");
}

#[test]
fn test_summary_enrichment_is_flushed() {
    let (_dir, mut tracker) = setup(Box::new(Echo));
    let (mut schedule, _) = tracker.load_or_generate(&terms("de")).unwrap();
    schedule.records[0].status = PaymentStatus::Paid;

    let summary = tracker.summary(&schedule, "de");
    assert_eq!(summary.monthly.kind, PaymentKind::MonthlyPayment);
    let labels: Vec<_> = summary.monthly.slices.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Paid (de)", "Unpaid (de)"]);
    assert!(tracker.cache().is_dirty());

    assert!(tracker.flush_translations().unwrap());
    assert!(!tracker.flush_translations().unwrap());

    let saved = tracker.store().load_table().unwrap();
    assert_eq!(saved.dictionary("de").get("Paid").unwrap(), "Paid (de)");
    // entries already present are untouched
    assert_eq!(saved.dictionary("vi").get("Paid").unwrap(), "Đã thanh toán");
}

#[test]
fn test_offline_summary_keeps_labels() {
    let (_dir, mut tracker) = setup(Box::new(Offline));
    let (schedule, _) = tracker.load_or_generate(&terms("vi")).unwrap();
    let summary = tracker.summary(&schedule, "vi");
    assert_eq!(summary.monthly.slices[0].label, "Chưa thanh toán");
    assert_eq!(summary.yearly.slices[0].total, 1200.);
    assert!(!tracker.flush_translations().unwrap());
}
