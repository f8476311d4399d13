use crate::cache::TranslationCache;
use crate::config::LoanTerms;
use crate::error::Result;
use crate::live::LiveTranslator;
use crate::loan::Schedule;
use crate::schema::LabelResolver;
use crate::store::Store;
use crate::summary::{summarize, PaymentSummary};
use crate::translate::{status_options, translate_forward, TranslatedSchedule};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Origin {
    Loaded,
    Generated,
}

/// One interactive session: the store, the translation cache, and the
/// operations the presentation layer calls.
pub struct Tracker {
    store: Store,
    cache: TranslationCache,
}

impl Tracker {
    pub fn open(store: Store, live: Box<dyn LiveTranslator>) -> Result<Self> {
        let table = store.load_table()?;
        Ok(Self {
            store,
            cache: TranslationCache::new(table, live),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Saved loan inputs with a language the table can display.
    pub fn terms(&self) -> Result<LoanTerms> {
        Ok(self
            .store
            .load_config()?
            .with_known_language(self.cache.table()))
    }

    /// The saved schedule for the terms' duration and language, or a freshly
    /// generated one when nothing was saved.
    pub fn load_or_generate(&self, terms: &LoanTerms) -> Result<(Schedule, Origin)> {
        terms.validate()?;
        match self
            .store
            .load_schedule(terms.duration_months, &terms.language, self.cache.table())?
        {
            Some(schedule) => Ok((schedule, Origin::Loaded)),
            None => {
                warn!(
                    "no saved schedule for {} months in '{}', generated a new one",
                    terms.duration_months, terms.language
                );
                Ok((terms.schedule()?, Origin::Generated))
            }
        }
    }

    pub fn view(&self, schedule: &Schedule, language: &str) -> TranslatedSchedule {
        translate_forward(schedule, language, self.cache.dictionary(language))
    }

    pub fn heading(&self, language: &str, duration_months: u32) -> String {
        LabelResolver::new(self.cache.dictionary(language)).heading(duration_months)
    }

    pub fn status_options(&self, language: &str) -> Vec<String> {
        status_options(self.cache.dictionary(language))
    }

    pub fn save_edited(
        &self,
        edited: &TranslatedSchedule,
        duration_months: u32,
    ) -> Result<Vec<PathBuf>> {
        self.store
            .save_edited(edited, duration_months, self.cache.table())
    }

    pub fn save_terms(&self, terms: &LoanTerms) -> Result<()> {
        self.store.save_config(terms)?;
        info!("saved loan inputs");
        Ok(())
    }

    pub fn summary(&mut self, schedule: &Schedule, language: &str) -> PaymentSummary {
        summarize(schedule, language, &mut self.cache)
    }

    /// Writes entries learned from the live translator back to the table
    /// file. Returns whether anything was written.
    pub fn flush_translations(&mut self) -> Result<bool> {
        if !self.cache.is_dirty() {
            return Ok(false);
        }
        self.store.save_table(self.cache.table())?;
        self.cache.mark_clean();
        info!("saved new translations");
        Ok(true)
    }
}
