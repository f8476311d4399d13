use crate::live::{LiveTranslator, Offline};
use crate::translate::{Dictionary, TranslationTable, CANONICAL_LANGUAGE};
use log::{info, warn};

/// A session's translation table plus the live fallback that may extend it.
/// Lookups that go through the live translator are written back into the
/// table and the cache becomes dirty until the table is persisted.
pub struct TranslationCache {
    table: TranslationTable,
    live: Box<dyn LiveTranslator>,
    dirty: bool,
}

impl TranslationCache {
    pub fn new(table: TranslationTable, live: Box<dyn LiveTranslator>) -> Self {
        Self {
            table,
            live,
            dirty: false,
        }
    }

    pub fn offline(table: TranslationTable) -> Self {
        Self::new(table, Box::new(Offline))
    }

    pub fn table(&self) -> &TranslationTable {
        &self.table
    }

    pub fn dictionary(&self, language: &str) -> &Dictionary {
        self.table.dictionary(language)
    }

    /// Localized form of `text`. A failed live lookup returns `text`.
    pub fn resolve(&mut self, text: &str, language: &str) -> String {
        if language == CANONICAL_LANGUAGE {
            return text.to_string();
        }
        if let Some(localized) = self.table.dictionary(language).get(text) {
            return localized.clone();
        }

        match self.live.translate(text, language) {
            Ok(localized) => {
                info!("added '{}' -> '{}' for {}", text, localized, language);
                self.table.insert(language, text, &localized);
                self.dirty = true;
                localized
            }
            Err(e) => {
                warn!("keeping '{}' untranslated for {}: {}", text, language, e);
                text.to_string()
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
