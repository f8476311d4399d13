//! Fixed column schema of a payment schedule and the resolver that maps
//! display labels, in any language, back to it.

use crate::translate::{Dictionary, ReverseDictionary};
use std::fmt;

/// Columns of a schedule table, in file order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Field {
    Month,
    Date,
    Amount,
    Description,
    Status,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Month,
        Field::Date,
        Field::Amount,
        Field::Description,
        Field::Status,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Month => "Month",
            Field::Date => "Date",
            Field::Amount => "Amount",
            Field::Description => "Description",
            Field::Status => "Status",
        }
    }

    pub fn from_label(label: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.label() == label)
    }

    /// Whether values in this column come from a closed vocabulary and are
    /// therefore translated.
    pub fn is_enumerable(self) -> bool {
        matches!(self, Field::Description | Field::Status)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ui labels outside the table body
pub const SCHEDULE_TITLE: &str = "Loan Payment Schedule";
pub const YEAR: &str = "Year";
pub const YEARS: &str = "Years";
pub const CHART_TITLE: &str = "Monthly vs Yearly Payments by Status";

/// Resolves labels for one language. Field identity survives label changes:
/// a header is matched against the canonical label, the current translation,
/// and the reverse dictionary.
pub struct LabelResolver<'a> {
    dict: &'a Dictionary,
    reverse: ReverseDictionary,
}

impl<'a> LabelResolver<'a> {
    pub fn new(dict: &'a Dictionary) -> Self {
        Self {
            dict,
            reverse: ReverseDictionary::new(dict),
        }
    }

    /// Display label for a field.
    pub fn header(&self, field: Field) -> &str {
        self.text(field.label())
    }

    /// Display text for any canonical UI string, falling back to the string.
    pub fn text<'s>(&'s self, canonical: &'s str) -> &'s str {
        self.dict.get(canonical).map(String::as_str).unwrap_or(canonical)
    }

    pub fn field_for(&self, label: &str) -> Option<Field> {
        let label = label.trim();
        Field::from_label(label)
            .or_else(|| {
                Field::ALL
                    .into_iter()
                    .find(|f| self.dict.get(f.label()).map(String::as_str) == Some(label))
            })
            .or_else(|| Field::from_label(self.reverse.canonical(label)))
    }

    /// `"<title> for <years> <Year|Years>"`; singular only for exactly twelve
    /// months.
    pub fn heading(&self, duration_months: u32) -> String {
        let unit = if duration_months == 12 { YEAR } else { YEARS };
        format!(
            "{} for {} {}",
            self.text(SCHEDULE_TITLE),
            duration_months / 12,
            self.text(unit)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn vi() -> Dictionary {
        [
            ("Status", "Trạng thái"),
            ("Amount", "Số tiền"),
            ("Loan Payment Schedule", "Lịch thanh toán khoản vay"),
            ("Year", "Năm"),
            ("Years", "Năm"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_field_order_matches_index() {
        for (i, field) in Field::ALL.into_iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(Field::from_label(field.label()), Some(field));
        }
        assert!(Field::Status.is_enumerable());
        assert!(!Field::Amount.is_enumerable());
    }

    #[test]
    fn test_field_for_any_label() {
        let dict = vi();
        let resolver = LabelResolver::new(&dict);
        assert_eq!(resolver.field_for("Trạng thái"), Some(Field::Status));
        assert_eq!(resolver.field_for("Status"), Some(Field::Status));
        assert_eq!(resolver.field_for(" Số tiền "), Some(Field::Amount));
        assert_eq!(resolver.field_for("Date"), Some(Field::Date));
        assert_eq!(resolver.field_for("Notes"), None);
    }

    #[test]
    fn test_heading() {
        let empty = Dictionary::new();
        assert_eq!(
            LabelResolver::new(&empty).heading(12),
            "Loan Payment Schedule for 1 Year"
        );
        assert_eq!(
            LabelResolver::new(&empty).heading(30),
            "Loan Payment Schedule for 2 Years"
        );
        let dict = vi();
        assert_eq!(
            LabelResolver::new(&dict).heading(24),
            "Lịch thanh toán khoản vay for 2 Năm"
        );
    }
}
