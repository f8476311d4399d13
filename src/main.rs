use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use loan_tracker::access::AccessGate;
use loan_tracker::config::LoanTerms;
use loan_tracker::live::{LiveTranslator, Offline};
use loan_tracker::loan::{PaymentKind, PaymentStatus, Schedule};
use loan_tracker::schema::{Field, LabelResolver};
use loan_tracker::store::Store;
use loan_tracker::tracker::{Origin, Tracker};
use loan_tracker::translate::{TranslatedRow, TranslatedSchedule};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "loan-tracker")]
#[command(version)]
#[command(about = "Loan payment schedule with multi-language editing")]
#[command(long_about = None)]
struct Cli {
    /// Directory for schedule CSV files and the saved access key
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Directory for saved inputs and the translation table
    #[arg(long, default_value = "json", global = true)]
    json_dir: PathBuf,

    /// Access key that unlocks editing (defaults to the saved key)
    #[arg(short, long, global = true)]
    key: Option<String>,

    /// Display language, overriding the saved setting
    #[arg(short, long, global = true)]
    lang: Option<String>,

    /// Loan duration in months, overriding the saved setting
    #[arg(short, long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    months: Option<u32>,

    /// Never call the online translator
    #[arg(long, global = true)]
    offline: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schedule and the paid/unpaid summary
    Show,

    /// Print only the paid/unpaid summary
    Summary,

    /// Save loan inputs (requires the access key)
    Settings {
        /// Loan amount
        #[arg(long)]
        amount: Option<f64>,

        /// Amount due every month
        #[arg(long)]
        interest: Option<f64>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
    },

    /// Edit one row of the displayed schedule and save it
    Edit {
        /// Row number as printed by `show`
        row: usize,

        /// New status, in the display language
        #[arg(short, long)]
        status: Option<String>,

        /// New amount
        #[arg(short, long)]
        amount: Option<String>,

        /// New description, in the display language
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Append a row to the displayed schedule and save it
    AddRow {
        #[arg(long)]
        month: u32,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        amount: String,

        /// Defaults to the monthly payment label
        #[arg(long)]
        description: Option<String>,

        /// Defaults to the unpaid label
        #[arg(long)]
        status: Option<String>,
    },

    /// Remove a row from the displayed schedule and save it
    RemoveRow {
        /// Row number as printed by `show`
        row: usize,
    },

    /// Write the displayed schedule to a CSV file
    Export {
        #[arg(value_name = "FILE", default_value = "loan_schedule.csv")]
        out: PathBuf,
    },

    /// Remember an access key for later commands
    SaveKey { key: String },

    /// Delete every saved schedule CSV (requires the access key)
    Purge,

    /// List translation languages and ambiguous translations
    Languages,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    SimpleLogger::new().with_level(log_level(cli.verbose)).init()?;

    let store = Store::new(&cli.data_dir, &cli.json_dir);
    let live: Box<dyn LiveTranslator> = if cli.offline {
        Box::new(Offline)
    } else {
        live_translator()
    };
    let mut tracker = Tracker::open(store, live)?;

    let mut terms = tracker.terms()?;
    if let Some(lang) = &cli.lang {
        terms.language = lang.clone();
        terms = terms.with_known_language(tracker.cache().table());
    }
    if let Some(months) = cli.months {
        terms.duration_months = months;
    }
    let key = match cli.key.clone() {
        Some(key) => Some(key),
        None => tracker.store().load_access_key()?,
    };
    let gate = AccessGate::from_env();

    match cli.command {
        Commands::Show => {
            let (schedule, _) = load(&tracker, &terms)?;
            let view = tracker.view(&schedule, &terms.language);
            println!("{}\n", tracker.heading(&terms.language, terms.duration_months));
            print_table(&view);
            println!();
            print!("{}", tracker.summary(&schedule, &terms.language));
        }
        Commands::Summary => {
            let (schedule, _) = load(&tracker, &terms)?;
            print!("{}", tracker.summary(&schedule, &terms.language));
        }
        Commands::Settings {
            amount,
            interest,
            start,
        } => {
            gate.require(key.as_deref())?;
            if let Some(amount) = amount {
                terms.principal = amount;
            }
            if let Some(interest) = interest {
                terms.annual_interest_amount = interest;
            }
            if let Some(start) = start {
                terms.start_date = start;
            }
            tracker.save_terms(&terms)?;
            println!("Settings saved successfully!");
        }
        Commands::Edit {
            row,
            status,
            amount,
            description,
        } => {
            gate.require(key.as_deref())?;
            let mut view = load_view(&tracker, &terms)?;
            let idx = row_index(row)?;
            if let Some(status) = status {
                check_status(&tracker, &terms, &status)?;
                view.set_status(idx, &status)?;
            }
            if let Some(amount) = amount {
                view.set_amount(idx, &amount)?;
            }
            if let Some(description) = description {
                view.set_description(idx, &description)?;
            }
            save(&tracker, &view, &terms)?;
        }
        Commands::AddRow {
            month,
            date,
            amount,
            description,
            status,
        } => {
            gate.require(key.as_deref())?;
            let mut view = load_view(&tracker, &terms)?;
            let labels = LabelResolver::new(tracker.cache().dictionary(&terms.language));
            let status = status
                .unwrap_or_else(|| labels.text(PaymentStatus::Unpaid.label()).to_string());
            check_status(&tracker, &terms, &status)?;
            let description = description
                .unwrap_or_else(|| labels.text(PaymentKind::MonthlyPayment.label()).to_string());
            view.push_row(TranslatedRow {
                month,
                date,
                amount,
                description,
                status,
            })?;
            save(&tracker, &view, &terms)?;
        }
        Commands::RemoveRow { row } => {
            gate.require(key.as_deref())?;
            let mut view = load_view(&tracker, &terms)?;
            let removed = view.remove_row(row_index(row)?)?;
            info!("removed row {}: {:?}", row, removed);
            save(&tracker, &view, &terms)?;
        }
        Commands::Export { out } => {
            let view = load_view(&tracker, &terms)?;
            tracker.store().export_csv(&out, &view)?;
            println!("Exported {} rows to {}", view.rows.len(), out.display());
        }
        Commands::SaveKey { key } => {
            tracker.store().save_access_key(&key)?;
            println!("Access key saved successfully!");
        }
        Commands::Purge => {
            gate.require(key.as_deref())?;
            let deleted = tracker.store().purge_schedules()?;
            if deleted.is_empty() {
                println!("No CSV files found to delete.");
            } else {
                println!("Deleted the following files:\n{}", deleted.join(", "));
            }
        }
        Commands::Languages => {
            let table = tracker.cache().table();
            for language in table.languages() {
                println!("{}", language);
            }
            for (language, collision) in table.ambiguities() {
                println!(
                    "{}: '{}' is used for both '{}' and '{}'",
                    language, collision.localized, collision.kept, collision.dropped
                );
            }
        }
    }

    tracker.flush_translations()?;
    Ok(())
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(feature = "live-translate")]
fn live_translator() -> Box<dyn LiveTranslator> {
    match loan_tracker::live::GoogleTranslator::new() {
        Ok(translator) => Box::new(translator),
        Err(e) => {
            log::warn!("online translation unavailable: {}", e);
            Box::new(Offline)
        }
    }
}

#[cfg(not(feature = "live-translate"))]
fn live_translator() -> Box<dyn LiveTranslator> {
    Box::new(Offline)
}

fn load(tracker: &Tracker, terms: &LoanTerms) -> Result<(Schedule, Origin)> {
    let (schedule, origin) = tracker.load_or_generate(terms)?;
    match origin {
        Origin::Loaded => info!(
            "loaded saved schedule {}",
            tracker
                .store()
                .schedule_path(terms.duration_months, &terms.language)
                .display()
        ),
        Origin::Generated => {
            eprintln!("No saved schedule found for this duration and language. Generated a new one.")
        }
    }
    Ok((schedule, origin))
}

fn load_view(tracker: &Tracker, terms: &LoanTerms) -> Result<TranslatedSchedule> {
    let (schedule, _) = load(tracker, terms)?;
    Ok(tracker.view(&schedule, &terms.language))
}

fn save(tracker: &Tracker, view: &TranslatedSchedule, terms: &LoanTerms) -> Result<()> {
    for path in tracker.save_edited(view, terms.duration_months)? {
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn row_index(row: usize) -> Result<usize> {
    if row == 0 {
        bail!("rows are numbered from 1");
    }
    Ok(row - 1)
}

fn check_status(tracker: &Tracker, terms: &LoanTerms, status: &str) -> Result<()> {
    let options = tracker.status_options(&terms.language);
    if !options.iter().any(|o| o == status) {
        bail!("status must be one of: {}", options.join(", "));
    }
    Ok(())
}

fn print_table(view: &TranslatedSchedule) {
    let rows: Vec<Vec<String>> = view.rows.iter().map(|r| r.cells()).collect();
    let mut widths: Vec<usize> = Field::ALL
        .iter()
        .map(|f| view.header(*f).chars().count())
        .collect();
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let num_width = rows.len().to_string().len().max(1);

    let line = |first: &str, cells: &[String]| {
        let mut out = format!("{:>w$}", first, w = num_width);
        for (i, (cell, width)) in cells.iter().zip(&widths).enumerate() {
            let pad = " ".repeat(width - cell.chars().count());
            // numbers right-aligned
            if Field::ALL[i] == Field::Amount || Field::ALL[i] == Field::Month {
                out.push_str(&format!("  {}{}", pad, cell));
            } else {
                out.push_str(&format!("  {}{}", cell, pad));
            }
        }
        println!("{}", out.trim_end());
    };

    line("#", &view.headers);
    for (i, cells) in rows.iter().enumerate() {
        line(&(i + 1).to_string(), cells);
    }
}

// schedule data can be handed across threads
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<loan_tracker::loan::PaymentRecord>();
    is_normal::<Schedule>();
    is_normal::<TranslatedSchedule>();
    is_normal::<loan_tracker::translate::TranslationTable>();
}
