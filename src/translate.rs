//! Translation table and the forward/reverse schedule translator.
//!
//! The canonical schedule is English. A language's dictionary maps canonical
//! strings (column labels, payment descriptions, statuses, UI labels) to
//! localized strings. Only enumerable columns and headers are translated;
//! month, date and amount cells pass through untouched. Reverse translation
//! uses the inverted dictionary, and anything it cannot map is kept as typed.

use crate::error::{Error, Result};
use crate::loan::{format_amount, parse_amount, PaymentKind, PaymentRecord, PaymentStatus, Schedule};
use crate::schema::{Field, LabelResolver};
use chrono::NaiveDate;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub const CANONICAL_LANGUAGE: &str = "en";

/// Canonical string -> localized string for a single language.
pub type Dictionary = BTreeMap<String, String>;

static EMPTY: Dictionary = BTreeMap::new();

/// Language code -> dictionary, as stored in `translation.json`.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationTable {
    languages: BTreeMap<String, Dictionary>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selectable languages. English is always offered.
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        if !self.languages.contains_key(CANONICAL_LANGUAGE) {
            langs.insert(0, CANONICAL_LANGUAGE);
        }
        langs
    }

    pub fn contains(&self, language: &str) -> bool {
        language == CANONICAL_LANGUAGE || self.languages.contains_key(language)
    }

    /// Dictionary used to display `language`. English is always the identity
    /// and unknown languages display untranslated.
    pub fn dictionary(&self, language: &str) -> &Dictionary {
        if language == CANONICAL_LANGUAGE {
            return &EMPTY;
        }
        self.languages.get(language).unwrap_or(&EMPTY)
    }

    pub fn insert(&mut self, language: &str, canonical: &str, localized: &str) {
        self.languages
            .entry(language.to_string())
            .or_default()
            .insert(canonical.to_string(), localized.to_string());
    }

    /// Localized strings claimed by more than one canonical string, per
    /// language.
    pub fn ambiguities(&self) -> Vec<(String, Collision)> {
        self.languages
            .iter()
            .filter(|(lang, _)| lang.as_str() != CANONICAL_LANGUAGE)
            .flat_map(|(lang, dict)| {
                ReverseDictionary::new(dict)
                    .collisions
                    .into_iter()
                    .map(move |c| (lang.clone(), c))
            })
            .collect()
    }
}

impl<const N: usize> From<[(&str, Dictionary); N]> for TranslationTable {
    fn from(entries: [(&str, Dictionary); N]) -> Self {
        Self {
            languages: entries
                .into_iter()
                .map(|(lang, dict)| (lang.to_string(), dict))
                .collect(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Collision {
    pub localized: String,
    pub kept: String,
    pub dropped: String,
}

/// Localized string -> canonical string. When two canonical strings share a
/// translation, the one that sorts first wins and the other is recorded as a
/// collision.
#[derive(Clone, Debug, Default)]
pub struct ReverseDictionary {
    map: BTreeMap<String, String>,
    collisions: Vec<Collision>,
}

impl ReverseDictionary {
    pub fn new(dict: &Dictionary) -> Self {
        let mut reverse = Self::default();
        for (canonical, localized) in dict {
            match reverse.map.entry(localized.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(canonical.clone());
                }
                Entry::Occupied(slot) => {
                    debug!(
                        "'{}' translates both '{}' and '{}'",
                        localized,
                        slot.get(),
                        canonical
                    );
                    reverse.collisions.push(Collision {
                        localized: localized.clone(),
                        kept: slot.get().clone(),
                        dropped: canonical.clone(),
                    });
                }
            }
        }
        reverse
    }

    /// Canonical form of `localized`, or `localized` itself when unknown.
    pub fn canonical<'s>(&'s self, localized: &'s str) -> &'s str {
        self.map.get(localized).map(String::as_str).unwrap_or(localized)
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }
}

/// One displayed row. Cells of enumerable columns hold display text.
#[derive(Clone, PartialEq, Debug)]
pub struct TranslatedRow {
    pub month: u32,
    pub date: NaiveDate,
    pub amount: String,
    pub description: String,
    pub status: String,
}

impl TranslatedRow {
    pub fn cell(&self, field: Field) -> String {
        match field {
            Field::Month => self.month.to_string(),
            Field::Date => self.date.format("%Y-%m-%d").to_string(),
            Field::Amount => self.amount.clone(),
            Field::Description => self.description.clone(),
            Field::Status => self.status.clone(),
        }
    }

    pub fn cells(&self) -> Vec<String> {
        Field::ALL.into_iter().map(|f| self.cell(f)).collect()
    }
}

/// A schedule as shown in one language: translated headers and rows.
#[derive(Clone, PartialEq, Debug)]
pub struct TranslatedSchedule {
    pub language: String,
    pub headers: Vec<String>,
    pub rows: Vec<TranslatedRow>,
}

impl TranslatedSchedule {
    pub fn header(&self, field: Field) -> &str {
        self.headers
            .get(field.index())
            .map(String::as_str)
            .unwrap_or(field.label())
    }

    pub fn set_status(&mut self, row: usize, status: &str) -> Result<()> {
        self.row_mut(row)?.status = status.trim().to_string();
        Ok(())
    }

    /// Replaces an amount, normalising it to the display format.
    pub fn set_amount(&mut self, row: usize, amount: &str) -> Result<()> {
        let amount = format_amount(parse_amount(amount)?);
        self.row_mut(row)?.amount = amount;
        Ok(())
    }

    pub fn set_description(&mut self, row: usize, description: &str) -> Result<()> {
        self.row_mut(row)?.description = description.trim().to_string();
        Ok(())
    }

    pub fn push_row(&mut self, mut row: TranslatedRow) -> Result<()> {
        row.amount = format_amount(parse_amount(&row.amount)?);
        self.rows.push(row);
        Ok(())
    }

    pub fn remove_row(&mut self, row: usize) -> Result<TranslatedRow> {
        let len = self.rows.len();
        if row >= len {
            return Err(Error::RowOutOfRange { row, len });
        }
        Ok(self.rows.remove(row))
    }

    fn row_mut(&mut self, row: usize) -> Result<&mut TranslatedRow> {
        let len = self.rows.len();
        self.rows
            .get_mut(row)
            .ok_or(Error::RowOutOfRange { row, len })
    }
}

fn lookup<'d>(dict: &'d Dictionary, text: &'d str) -> &'d str {
    match dict.get(text) {
        Some(localized) => localized.as_str(),
        None => {
            trace!("no translation for '{}'", text);
            text
        }
    }
}

/// Translates headers and enumerable cells of a canonical schedule.
pub fn translate_forward(
    schedule: &Schedule,
    language: &str,
    dict: &Dictionary,
) -> TranslatedSchedule {
    let headers = Field::ALL
        .into_iter()
        .map(|f| lookup(dict, f.label()).to_string())
        .collect();
    let rows = schedule
        .iter()
        .map(|record| TranslatedRow {
            month: record.month,
            date: record.due_date,
            amount: format_amount(record.amount),
            description: lookup(dict, record.kind.label()).to_string(),
            status: lookup(dict, record.status.label()).to_string(),
        })
        .collect();

    TranslatedSchedule {
        language: language.to_string(),
        headers,
        rows,
    }
}

/// Recovers the canonical schedule from a translated one. Values missing from
/// the reverse dictionary are kept as typed; only unparseable amounts fail.
pub fn translate_reverse(translated: &TranslatedSchedule, dict: &Dictionary) -> Result<Schedule> {
    let resolver = LabelResolver::new(dict);
    for (field, header) in Field::ALL.into_iter().zip(&translated.headers) {
        if resolver.field_for(header) != Some(field) {
            warn!(
                "column '{}' does not resolve to {} in '{}'",
                header, field, translated.language
            );
        }
    }

    let reverse = ReverseDictionary::new(dict);
    let records = translated
        .rows
        .iter()
        .map(|row| {
            Ok(PaymentRecord::new(
                row.month,
                row.date,
                parse_amount(&row.amount)?,
                PaymentKind::from_label(reverse.canonical(&row.description)),
                PaymentStatus::from_label(reverse.canonical(&row.status)),
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Schedule::new(records))
}

/// Allowed display values for the status column.
pub fn status_options(dict: &Dictionary) -> Vec<String> {
    [PaymentStatus::Paid, PaymentStatus::Unpaid]
        .iter()
        .map(|s| lookup(dict, s.label()).to_string())
        .collect()
}
