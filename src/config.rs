use crate::error::{Error, Result};
use crate::loan::{end_of_month, generate_schedule, Schedule};
use crate::translate::{TranslationTable, CANONICAL_LANGUAGE};
use chrono::{Local, Months, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};

/// Loan inputs, persisted as `saved_inputs.json`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LoanTerms {
    #[serde(rename = "loan_amount")]
    pub principal: f64,
    /// Amount due every month.
    #[serde(rename = "interest_rate")]
    pub annual_interest_amount: f64,
    pub duration_months: u32,
    pub start_date: NaiveDate,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    CANONICAL_LANGUAGE.to_string()
}

impl Default for LoanTerms {
    fn default() -> Self {
        Self {
            principal: 100_000_000.,
            annual_interest_amount: 3_000_000.,
            duration_months: 12,
            start_date: Local::now().date_naive(),
            language: default_language(),
        }
    }
}

impl LoanTerms {
    /// Rejects terms the generator cannot use.
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_finite() || self.principal < 0. {
            return Err(Error::InvalidInput(format!(
                "loan amount must be a non-negative number, got {}",
                self.principal
            )));
        }
        if !self.annual_interest_amount.is_finite() || self.annual_interest_amount < 0. {
            return Err(Error::InvalidInput(format!(
                "interest amount must be a non-negative number, got {}",
                self.annual_interest_amount
            )));
        }
        if self.duration_months < 1 {
            return Err(Error::InvalidInput(
                "duration must be at least one month".to_string(),
            ));
        }
        let last_month = self
            .start_date
            .checked_add_months(Months::new(self.duration_months - 1))
            .and_then(end_of_month);
        if last_month.is_none() {
            return Err(Error::InvalidInput(format!(
                "{} months from {} runs past the calendar",
                self.duration_months, self.start_date
            )));
        }
        Ok(())
    }

    /// Replaces a language the table cannot display with English.
    pub fn with_known_language(mut self, table: &TranslationTable) -> Self {
        if !table.contains(&self.language) {
            warn!(
                "language '{}' is not in the translation table, using '{}'",
                self.language, CANONICAL_LANGUAGE
            );
            self.language = default_language();
        }
        self
    }

    pub fn schedule(&self) -> Result<Schedule> {
        self.validate()?;
        generate_schedule(
            self.principal,
            self.annual_interest_amount,
            self.duration_months,
            self.start_date,
        )
    }
}
