//! # Arbitrage Desk Entry Point
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          arb-desk (binary)                              │
//! │                                                                         │
//! │  main.rs ────► parses arguments, loads config, opens the desk           │
//! │                                                                         │
//! │  arb_desk_lib::commands ──► import, manual, match, ask, channels, ...   │
//! │                                                                         │
//! │  arb_desk_lib::state ─────► DbState, WorkbenchState, DeskConfig         │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SQLite Database                          │  │
//! │  │  desk.db (local file, WAL mode)                                  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Typical Session
//! ```text
//! arb-desk import --channel Poizon --category market-price feb.json mar.json
//! arb-desk import --channel Outlet --category supplier-discount outlet.json
//! arb-desk match list.json --export results.json
//! arb-desk ask list.json --question "Which five SKUs should I buy first?"
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use structopt::StructOpt;
use tracing::info;

use arb_core::{ArbitrageResult, Category};
use arb_desk_lib::commands::{arbitrage, assistant, ingest, mappings, records};
use arb_desk_lib::error::{ApiError, ApiResult};
use arb_desk_lib::prompt::TerminalPrompt;
use arb_desk_lib::sheets::{read_manual_entries, read_sheet};
use arb_desk_lib::state::DeskConfig;
use arb_desk_lib::{init_tracing, Desk};

#[derive(Debug, StructOpt)]
#[structopt(name = "arb-desk", about = "Sneaker resale arbitrage desk")]
struct Opt {
    /// Config file (defaults to $ARB_CONFIG, then the platform config dir)
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[structopt(long)]
    json: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Import decoded sheets into one channel and category
    Import {
        #[structopt(long)]
        channel: String,

        /// market-price | supplier-discount | owned-inventory | in-transit-futures
        #[structopt(long)]
        category: Category,

        /// Ingestion date (defaults to today)
        #[structopt(long)]
        date: Option<NaiveDate>,

        #[structopt(parse(from_os_str), required = true)]
        files: Vec<PathBuf>,
    },

    /// Append hand-typed records from a JSON file
    Manual {
        #[structopt(long)]
        channel: String,

        #[structopt(long)]
        category: Category,

        #[structopt(long)]
        date: Option<NaiveDate>,

        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },

    /// Match a purchase list against the stored records
    Match {
        #[structopt(parse(from_os_str))]
        file: PathBuf,

        /// Write the full export table to this JSON file
        #[structopt(long, parse(from_os_str))]
        export: Option<PathBuf>,

        /// Rows to print
        #[structopt(long, default_value = "50")]
        top: usize,
    },

    /// Discuss a purchase list's results with the narrative assistant
    Ask {
        #[structopt(parse(from_os_str))]
        file: PathBuf,

        /// Ask a single question instead of reading questions from stdin
        #[structopt(long)]
        question: Option<String>,
    },

    /// Manage channel lists
    Channels(ChannelCommand),

    /// Manage remembered column mappings
    Mappings(MappingCommand),

    /// Drop every stored record (channels and mappings are kept)
    Clear {
        #[structopt(long)]
        yes: bool,
    },

    /// Show what the desk holds
    Status,
}

#[derive(Debug, StructOpt)]
enum ChannelCommand {
    List {
        #[structopt(long)]
        category: Option<Category>,
    },
    Add {
        #[structopt(long)]
        category: Category,
        name: String,
    },
    /// Remove a channel and its records in that category
    Remove {
        #[structopt(long)]
        category: Category,
        name: String,
    },
}

#[derive(Debug, StructOpt)]
enum MappingCommand {
    List,
    Forget { signature: String },
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let opt = Opt::from_args();
    let json = opt.json;

    match run(opt).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json {
                let body = serde_json::to_string(&err).unwrap_or_else(|_| err.to_string());
                println!("{}", body);
            } else {
                eprintln!("{}", err);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(opt: Opt) -> ApiResult<()> {
    let config = DeskConfig::load(opt.config)?;
    let desk = Desk::open(config).await?;
    let json = opt.json;
    let today = chrono::Local::now().date_naive();

    match opt.command {
        Command::Import {
            channel,
            category,
            date,
            files,
        } => {
            let mut sheets = Vec::with_capacity(files.len());
            for path in &files {
                sheets.push(read_sheet(path).await?);
            }

            let request = ingest::ImportRequest {
                channel,
                category,
                ingested_on: date.unwrap_or(today),
                sheets,
            };
            let stdin = io::stdin();
            let mut prompt = TerminalPrompt::new(stdin.lock(), io::stderr());
            let report =
                ingest::import_sheets(&desk.db, &desk.workbench, &desk.config, request, &mut prompt)
                    .await?;
            emit(json, &report, || report.to_string())?;
        }

        Command::Manual {
            channel,
            category,
            date,
            file,
        } => {
            let entries = read_manual_entries(&file).await?;
            let report = records::add_manual_entries(
                &desk.db,
                &desk.workbench,
                &channel,
                category,
                date.unwrap_or(today),
                &entries,
            )
            .await?;
            emit(json, &report, || {
                let mut text = format!("added {} records", report.added);
                for problem in &report.problems {
                    text.push_str(&format!("\n{}", problem));
                }
                text
            })?;
        }

        Command::Match { file, export, top } => {
            let list = read_sheet(&file).await?;
            let results = arbitrage::match_sheet(&desk.workbench, &desk.config, &list, today)?;
            if let Some(path) = export {
                let rows = arbitrage::export_results(&results, &path).await?;
                info!(rows, path = %path.display(), "export written");
            }
            emit(json, &results, || render_results(&results, top))?;
        }

        Command::Ask { file, question } => {
            let list = read_sheet(&file).await?;
            let results = arbitrage::match_sheet(&desk.workbench, &desk.config, &list, today)?;
            let chat = assistant::open_chat(&desk.config, &results)?;

            match question {
                Some(question) => {
                    let reply = chat
                        .ask(&question)
                        .await
                        .map_err(|e| ApiError::validation(e.to_string()))?;
                    emit(json, &reply, || reply.text.clone())?;
                }
                None => {
                    let stdin = io::stdin();
                    let mut lines = stdin.lock().lines();
                    loop {
                        eprint!("> ");
                        let _ = io::stderr().flush();
                        let Some(line) = lines.next() else { break };
                        let line = line?;
                        if matches!(line.trim(), "exit" | "quit") {
                            break;
                        }
                        match chat.ask(&line).await {
                            Ok(reply) => println!("{}", reply.text),
                            Err(e) => eprintln!("{}", e),
                        }
                    }
                    if json {
                        emit(true, &chat.transcript(), String::new)?;
                    }
                }
            }
        }

        Command::Channels(ChannelCommand::List { category }) => {
            let listed = records::list_channels(&desk.workbench, category);
            emit(json, &listed, || {
                listed
                    .iter()
                    .map(|(category, channels)| {
                        let names: Vec<String> = channels
                            .iter()
                            .map(|c| format!("{} ({})", c.name, c.records))
                            .collect();
                        format!("{}: {}", category, names.join(", "))
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }

        Command::Channels(ChannelCommand::Add { category, name }) => {
            let added = records::add_channel(&desk.db, &desk.workbench, category, &name).await?;
            emit(json, &added, || {
                if added {
                    format!("added {} to {}", name, category)
                } else {
                    format!("{} is already listed under {}", name, category)
                }
            })?;
        }

        Command::Channels(ChannelCommand::Remove { category, name }) => {
            let removed =
                records::remove_channel(&desk.db, &desk.workbench, category, &name).await?;
            emit(json, &removed, || {
                format!("removed {} from {} ({} records dropped)", name, category, removed)
            })?;
        }

        Command::Mappings(MappingCommand::List) => {
            let entries = mappings::list_mappings(&desk.workbench);
            emit(json, &entries, || {
                entries
                    .iter()
                    .map(|m| format!("{}  (from {})", m.signature, m.label))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }

        Command::Mappings(MappingCommand::Forget { signature }) => {
            mappings::forget_mapping(&desk.db, &desk.workbench, &signature).await?;
            emit(json, &signature, || format!("forgot {}", signature))?;
        }

        Command::Mappings(MappingCommand::Clear) => {
            let count = mappings::clear_mappings(&desk.db, &desk.workbench).await?;
            emit(json, &count, || format!("forgot {} mappings", count))?;
        }

        Command::Clear { yes } => {
            if !yes {
                let count = desk.workbench.with_workbench(|w| w.store.len());
                return Err(ApiError::validation(format!(
                    "this drops {} records; pass --yes to confirm",
                    count
                )));
            }
            let removed = records::clear_records(&desk.db, &desk.workbench).await?;
            emit(json, &removed, || format!("dropped {} records", removed))?;
        }

        Command::Status => {
            let report = records::status(&desk.db, &desk.workbench).await?;
            emit(json, &report, || {
                let mut text = format!(
                    "{} records, {} mappings, migrations {}/{}, database {}",
                    report.records,
                    report.mappings,
                    report.migrations_applied,
                    report.migrations_total,
                    if report.database_ok { "ok" } else { "unreachable" }
                );
                for summary in &report.channels {
                    text.push_str(&format!(
                        "\n  {} / {}: {} records",
                        summary.category, summary.channel, summary.records
                    ));
                }
                text
            })?;
        }
    }

    desk.db.inner().close().await;
    Ok(())
}

/// Prints `value` as JSON, or the text rendering.
fn emit<T, F>(json: bool, value: &T, text: F) -> ApiResult<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        let text = text();
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}

fn render_results(results: &[ArbitrageResult], top: usize) -> String {
    let mut lines = vec![format!(
        "{:>4}  {:<14} {:>10} {:>10} {:>11} {:>8} {:>7}  {}",
        "#", "SKU", "cost", "market", "profit", "ROI", "sales", "source"
    )];
    for (rank, r) in results.iter().take(top).enumerate() {
        lines.push(format!(
            "{:>4}  {:<14} {:>10} {:>10} {:>11} {:>7.1}% {:>7}  {}",
            rank + 1,
            r.sku,
            r.cost_price.to_string(),
            r.market_price.to_string(),
            r.profit.to_string(),
            r.roi * 100.0,
            r.sales_volume,
            r.source_label
        ));
    }
    if results.len() > top {
        lines.push(format!("({} more)", results.len() - top));
    }
    lines.join("\n")
}
