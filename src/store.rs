//! Flat-file persistence: schedules as CSV under the data directory, loan
//! inputs and the translation table as JSON under the json directory.

use crate::config::LoanTerms;
use crate::error::{Error, Result};
use crate::loan::{format_amount, parse_amount, Schedule};
use crate::schema::{Field, LabelResolver};
use crate::translate::{
    translate_forward, translate_reverse, TranslatedRow, TranslatedSchedule, TranslationTable,
    CANONICAL_LANGUAGE,
};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const INPUT_FILE: &str = "saved_inputs.json";
pub const TRANSLATION_FILE: &str = "translation.json";
pub const ACCESS_KEY_FILE: &str = "access_key.json";

#[derive(Clone, Debug)]
pub struct Store {
    data_dir: PathBuf,
    json_dir: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct SavedKey {
    access_key: Option<String>,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>, json_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            json_dir: json_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn json_dir(&self) -> &Path {
        &self.json_dir
    }

    /// One file per (duration, language) pair.
    pub fn schedule_path(&self, duration_months: u32, language: &str) -> PathBuf {
        self.data_dir
            .join(format!("edited_schedule_{}m_{}.csv", duration_months, language))
    }

    /// Saved schedule in canonical form, or `None` when nothing was saved for
    /// this key and the caller should generate a fresh one.
    pub fn load_schedule(
        &self,
        duration_months: u32,
        language: &str,
        table: &TranslationTable,
    ) -> Result<Option<Schedule>> {
        match self.load_translated(duration_months, language, table)? {
            Some(translated) => translate_reverse(&translated, table.dictionary(language)).map(Some),
            None => Ok(None),
        }
    }

    /// Saved schedule as it is displayed in `language`.
    pub fn load_translated(
        &self,
        duration_months: u32,
        language: &str,
        table: &TranslationTable,
    ) -> Result<Option<TranslatedSchedule>> {
        let path = self.schedule_path(duration_months, language);
        if !path.exists() {
            debug!(
                "no saved schedule for {} months in '{}' at {}",
                duration_months,
                language,
                path.display()
            );
            return Ok(None);
        }
        let translated = read_csv(&path, language, &LabelResolver::new(table.dictionary(language)))?;
        info!(
            "loaded {} rows from {}",
            translated.rows.len(),
            path.display()
        );
        Ok(Some(translated))
    }

    /// Writes a schedule edited in any language and brings the other language
    /// files up to date. An English edit is translated into every other table
    /// language; an edit in another language is reverse-translated into the
    /// English file. Returns the written paths, edited file first.
    pub fn save_edited(
        &self,
        edited: &TranslatedSchedule,
        duration_months: u32,
        table: &TranslationTable,
    ) -> Result<Vec<PathBuf>> {
        let canonical = translate_reverse(edited, table.dictionary(&edited.language))?;

        let mut written = vec![self.write_translated(edited, duration_months)?];
        if edited.language == CANONICAL_LANGUAGE {
            for language in table.languages() {
                if language == CANONICAL_LANGUAGE {
                    continue;
                }
                let translated = translate_forward(&canonical, language, table.dictionary(language));
                written.push(self.write_translated(&translated, duration_months)?);
            }
        } else {
            let english = translate_forward(
                &canonical,
                CANONICAL_LANGUAGE,
                table.dictionary(CANONICAL_LANGUAGE),
            );
            written.push(self.write_translated(&english, duration_months)?);
        }
        Ok(written)
    }

    /// Saves a canonical schedule under `language`, with the same fan-out as
    /// [`Store::save_edited`].
    pub fn save_schedule(
        &self,
        schedule: &Schedule,
        duration_months: u32,
        language: &str,
        table: &TranslationTable,
    ) -> Result<Vec<PathBuf>> {
        let translated = translate_forward(schedule, language, table.dictionary(language));
        self.save_edited(&translated, duration_months, table)
    }

    fn write_translated(
        &self,
        translated: &TranslatedSchedule,
        duration_months: u32,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.schedule_path(duration_months, &translated.language);
        write_csv(&path, translated)?;
        info!("saved {} rows to {}", translated.rows.len(), path.display());
        Ok(path)
    }

    /// Writes the displayed table to an arbitrary file.
    pub fn export_csv(&self, path: &Path, translated: &TranslatedSchedule) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        write_csv(path, translated)
    }

    /// Deletes every CSV file in the data directory and returns their names.
    pub fn purge_schedules(&self) -> Result<Vec<String>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }
        let mut deleted = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            let is_csv = path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false);
            if is_csv {
                fs::remove_file(&path)?;
                if let Some(name) = path.file_name() {
                    deleted.push(name.to_string_lossy().to_string());
                }
            }
        }
        deleted.sort();
        info!("deleted {} schedule files", deleted.len());
        Ok(deleted)
    }

    /// Saved loan inputs, or the defaults when none were saved.
    pub fn load_config(&self) -> Result<LoanTerms> {
        let path = self.json_dir.join(INPUT_FILE);
        match read_json(&path)? {
            Some(terms) => Ok(terms),
            None => {
                info!("no saved inputs at {}, using defaults", path.display());
                Ok(LoanTerms::default())
            }
        }
    }

    pub fn save_config(&self, terms: &LoanTerms) -> Result<()> {
        terms.validate()?;
        write_json(&self.json_dir.join(INPUT_FILE), terms)
    }

    /// Translation table, empty when the file is missing.
    pub fn load_table(&self) -> Result<TranslationTable> {
        let path = self.json_dir.join(TRANSLATION_FILE);
        let table: TranslationTable = match read_json(&path)? {
            Some(table) => table,
            None => {
                info!("no translation table at {}", path.display());
                TranslationTable::new()
            }
        };
        for (language, collision) in table.ambiguities() {
            warn!(
                "'{}' in '{}' translates both '{}' and '{}'; reading it back gives '{}'",
                collision.localized, language, collision.kept, collision.dropped, collision.kept
            );
        }
        Ok(table)
    }

    pub fn save_table(&self, table: &TranslationTable) -> Result<()> {
        write_json(&self.json_dir.join(TRANSLATION_FILE), table)
    }

    pub fn load_access_key(&self) -> Result<Option<String>> {
        let saved: Option<SavedKey> = read_json(&self.data_dir.join(ACCESS_KEY_FILE))?;
        Ok(saved.and_then(|s| s.access_key))
    }

    pub fn save_access_key(&self, key: &str) -> Result<()> {
        write_json(
            &self.data_dir.join(ACCESS_KEY_FILE),
            &SavedKey {
                access_key: Some(key.to_string()),
            },
        )
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn write_csv(path: &Path, translated: &TranslatedSchedule) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&translated.headers)?;
    for row in &translated.rows {
        writer.write_record(row.cells())?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a schedule file. Columns are matched by label in any language, so
/// their order and the table version they were written with do not matter.
pub fn read_csv(
    path: &Path,
    language: &str,
    resolver: &LabelResolver<'_>,
) -> Result<TranslatedSchedule> {
    let malformed = |reason: String| Error::MalformedSchedule {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path)?;
    let mut columns: [Option<usize>; 5] = [None; 5];
    for (idx, label) in reader.headers()?.iter().enumerate() {
        match resolver.field_for(label) {
            Some(field) if columns[field.index()].is_none() => columns[field.index()] = Some(idx),
            Some(field) => warn!("duplicate {} column '{}' in {}", field, label, path.display()),
            None => warn!("ignoring column '{}' in {}", label, path.display()),
        }
    }

    let mut positions = [0usize; 5];
    for field in Field::ALL {
        positions[field.index()] = columns[field.index()]
            .ok_or_else(|| malformed(format!("no {} column", field)))?;
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |field: Field| record.get(positions[field.index()]).unwrap_or("").trim();

        let month = parse_month(cell(Field::Month))
            .ok_or_else(|| malformed(format!("row {}: bad month '{}'", line + 1, cell(Field::Month))))?;
        let date = parse_date(cell(Field::Date))
            .ok_or_else(|| malformed(format!("row {}: bad date '{}'", line + 1, cell(Field::Date))))?;
        let amount = format_amount(parse_amount(cell(Field::Amount))?);

        rows.push(TranslatedRow {
            month,
            date,
            amount,
            description: cell(Field::Description).to_string(),
            status: cell(Field::Status).to_string(),
        });
    }

    Ok(TranslatedSchedule {
        language: language.to_string(),
        headers: Field::ALL
            .into_iter()
            .map(|f| resolver.header(f).to_string())
            .collect(),
        rows,
    })
}

// tolerates "3" and "3.0"
fn parse_month(text: &str) -> Option<u32> {
    text.parse::<u32>().ok().or_else(|| {
        let value = text.parse::<f64>().ok()?;
        (value >= 0. && value.fract() == 0. && value <= u32::MAX as f64).then_some(value as u32)
    })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y"];
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
