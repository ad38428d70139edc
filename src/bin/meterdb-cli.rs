//! meterdb interactive shell
//!
//! Thin operator front-end over the `meterdb` operations surface. All it
//! does is parse commands, call the library, and print results; every
//! piece of logic lives behind `meterdb::Database`.

use anyhow::{bail, Context};
use chrono::NaiveDate;
use meterdb::{Database, StoreConfig, UpdateOutcome};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config = StoreConfig::from_env();
    match args.len() {
        1 => {}
        2 => match args[1].as_str() {
            "--version" | "-v" => {
                println!("meterdb v{}", VERSION);
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            path => config.db_path = PathBuf::from(path),
        },
        3 => {
            config.db_path = PathBuf::from(&args[1]);
            config.log_dir = PathBuf::from(&args[2]);
        }
        _ => {
            print_help();
            bail!("invalid arguments");
        }
    }

    println!("meterdb v{}", VERSION);
    println!("store: {}", config.db_path.display());
    println!("update logs: {}", config.log_dir.display());
    println!("Type 'help' for commands, 'exit' to quit\n");

    let db = Database::open(config).context("opening store")?;
    interactive(&db)
}

fn print_help() {
    println!(
        r#"
meterdb v{} - meter-reading browse and correction shell

Usage:
  meterdb-cli                     open the store from METERDB_PATH / defaults
  meterdb-cli <db_path>           open the given SQLite file
  meterdb-cli <db_path> <log_dir> also override the update-log directory
  meterdb-cli --version           show version
  meterdb-cli --help              show this help

Commands inside the shell:
  tables
  columns <table>
  meters <table>
  usage <table>
  range <table>
  keys <table>
  sample <table>
  read <table> <from> <to> [column...]
  sum <table> <from> <to> <column>
  cell <table> <date> <clock> <time> <column>
  update <table> <date> <clock> <time> <column> <value|null>
  export <table> <from> <to> <file.xlsx> [column...]
  log <table>
  help | exit

Dates <from>/<to> are YYYY-MM-DD. A point key is given as three tokens:
<date> <clock> <time>, e.g. 2024-01-15 00:00:00 00:00:00.000000
"#,
        VERSION
    );
}

fn interactive(db: &Database) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("meterdb> ");
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }
        let input = buffer.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }
        if input == "help" {
            print_help();
            continue;
        }

        let tokens: Vec<&str> = input.split_whitespace().collect();
        if let Err(e) = dispatch(db, &tokens) {
            eprintln!("error: {e:#}");
        }
    }

    Ok(())
}

fn dispatch(db: &Database, tokens: &[&str]) -> anyhow::Result<()> {
    match tokens {
        ["tables"] => {
            for table in db.list_tables()? {
                println!("{table}");
            }
        }
        ["columns", table] => {
            for column in db.list_columns(table)? {
                println!("{}  {}", column.name, column.declared_type);
            }
        }
        ["meters", table] => {
            for name in db.meter_columns(table)? {
                println!("{name}");
            }
        }
        ["usage", table] => {
            for name in db.usage_columns(table)? {
                println!("{name}");
            }
        }
        ["range", table] => {
            let (min, max) = db.date_range(table)?;
            println!("{min} .. {max}");
        }
        ["keys", table] => {
            let (dates, times) = db.available_keys(table)?;
            println!("dates:");
            for date in dates {
                println!("  {date}");
            }
            println!("times:");
            for time in times {
                println!("  {time}");
            }
        }
        ["sample", table] => {
            let set = db.sample_row(table)?;
            println!("{}", serde_json::to_string_pretty(&set)?);
        }
        ["read", table, from, to, columns @ ..] => {
            let set = db.read_range(table, date(from)?, date(to)?, projection(columns))?;
            println!("{}", serde_json::to_string_pretty(&set)?);
            println!("{} row(s)", set.len());
        }
        ["sum", table, from, to, column] => {
            let total = db.sum_range(table, date(from)?, date(to)?, column)?;
            println!("sum of {column} from {from} to {to}: {total}");
        }
        ["cell", table, date_part, clock, time, column] => {
            let key_date = format!("{date_part} {clock}");
            let values = db.read_cell(table, &key_date, time, column)?;
            if values.is_empty() {
                println!("no match");
            } else {
                for value in values {
                    println!("{value}");
                }
            }
        }
        ["update", table, date_part, clock, time, column, value] => {
            let key_date = format!("{date_part} {clock}");
            let new_value = match value.to_ascii_lowercase().as_str() {
                "null" | "none" => None,
                _ => Some(*value),
            };
            match db.update_cell(table, &key_date, time, column, new_value)? {
                UpdateOutcome::Unchanged(values) => {
                    println!("value already stored, nothing written: {values:?}");
                }
                UpdateOutcome::Applied(values) => {
                    println!("updated; stored value now: {values:?}");
                }
            }
        }
        ["export", table, from, to, file, columns @ ..] => {
            let blob = db.export_range(table, date(from)?, date(to)?, projection(columns))?;
            std::fs::write(file, &blob).with_context(|| format!("writing {file}"))?;
            println!("wrote {} bytes to {file}", blob.len());
        }
        ["log", table] => {
            let content = db.read_audit_log(table)?;
            if content.is_empty() {
                println!("no update logs for {table}");
            } else {
                print!("{content}");
            }
        }
        _ => bail!("unknown command; type 'help' for usage"),
    }
    Ok(())
}

fn date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("bad date: {raw}"))
}

fn projection<'a>(columns: &'a [&'a str]) -> Option<&'a [&'a str]> {
    if columns.is_empty() {
        None
    } else {
        Some(columns)
    }
}
