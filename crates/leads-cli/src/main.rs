use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use lead_store::import::{self, ImportColumns, ImportOptions};
use lead_store::{lead, stats, BatchDuplicatePolicy, Database, LeadEdit, LeadStatus, NewLead};

#[derive(Debug, Parser)]
#[command(name = "leads-cli")]
#[command(about = "Manage sales leads: entry, CSV import, edits and KPIs")]
struct Args {
    /// SQLite database URL
    #[arg(long, env = "SQLITE_PATH", default_value = "sqlite:leads.db?mode=rwc")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add one lead, rejecting duplicates by email or phone
    Add {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Import leads from a CSV file
    Import {
        /// Input file path
        file: PathBuf,

        /// Field separator
        #[arg(long, default_value_t = ',')]
        delimiter: char,

        /// Use the French export headers (Nom, Adresse e-mail, Téléphone)
        #[arg(long, conflicts_with_all = ["name_column", "email_column", "phone_column"])]
        french: bool,

        #[arg(long, default_value = "name")]
        name_column: String,

        #[arg(long, default_value = "email")]
        email_column: String,

        #[arg(long, default_value = "phone")]
        phone_column: String,

        /// Handling of rows duplicated inside the file (keep_first, reject_all, insert)
        #[arg(long, env = "LEADS_BATCH_DUPLICATES", default_value_t = BatchDuplicatePolicy::KeepFirst)]
        policy: BatchDuplicatePolicy,

        /// Classify rows without inserting
        #[arg(long)]
        preview: bool,
    },

    /// List the most recent leads
    List {
        #[arg(long, default_value_t = stats::DEFAULT_WINDOW, value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,

        /// List every stored lead in insertion order
        #[arg(long, conflicts_with = "limit")]
        all: bool,
    },

    /// Print the number of stored leads
    Count,

    /// Show KPIs over the most recent leads
    Stats {
        #[arg(long, default_value_t = stats::DEFAULT_WINDOW, value_parser = clap::value_parser!(i64).range(1..))]
        window: i64,
    },

    /// Edit status, attempts or notes of one lead
    Update {
        id: i64,
        #[arg(long)]
        status: Option<LeadStatus>,
        #[arg(long)]
        attempts: Option<i64>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Record a contact attempt
    Contact { id: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    let db = Database::connect(&args.database).await?;
    db.migrate().await?;

    let result = run(&db, args.command).await;
    db.close().await;
    result
}

async fn run(db: &Database, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db.pool();

    match command {
        Command::Add {
            name,
            email,
            phone,
            notes,
        } => {
            let candidate = NewLead {
                name,
                email,
                phone,
                notes,
            };
            let created = lead::create_lead(pool, &candidate).await?;
            print_json(&created)?;
        }
        Command::Import {
            file,
            delimiter,
            french,
            name_column,
            email_column,
            phone_column,
            policy,
            preview,
        } => {
            let columns = if french {
                ImportColumns::french()
            } else {
                ImportColumns {
                    name: name_column,
                    email: email_column,
                    phone: phone_column,
                }
            };
            let options = ImportOptions {
                columns,
                delimiter: delimiter_byte(delimiter)?,
                policy,
            };

            let data = fs::read(&file)?;
            info!(file = %file.display(), bytes = data.len(), "Read import file");

            if preview {
                print_json(&import::preview(pool, &data, &options).await?)?;
            } else {
                print_json(&import::import_leads(pool, &data, &options).await?)?;
            }
        }
        Command::List { limit, all } => {
            let leads = if all {
                lead::list_all(pool).await?
            } else {
                lead::list_recent(pool, limit).await?
            };
            print_json(&leads)?;
        }
        Command::Count => {
            print_json(&serde_json::json!({ "leads": lead::count_leads(pool).await? }))?;
        }
        Command::Stats { window } => {
            print_json(&stats::load(pool, window).await?)?;
        }
        Command::Update {
            id,
            status,
            attempts,
            notes,
        } => {
            let edit = LeadEdit {
                id,
                status,
                contact_attempts: attempts,
                notes,
            };
            if edit.is_empty() {
                return Err("nothing to update (use --status, --attempts or --notes)".into());
            }
            print_json(&lead::update_lead(pool, &edit).await?)?;
        }
        Command::Contact { id } => {
            print_json(&lead::record_contact(pool, id).await?)?;
        }
    }

    Ok(())
}

fn delimiter_byte(delimiter: char) -> Result<u8, String> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(format!("delimiter must be an ASCII character, got {:?}", delimiter))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
