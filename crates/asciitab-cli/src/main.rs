//! asciitab CLI
//!
//! Console editor for `(key , value)` text tables. Without a subcommand it
//! opens an interactive session on a table file.

mod logging;
mod prompt;
mod session;

use asciitab_core::{
    parse, render_string, EmptyRows, FileStorage, Storage, TableService, DEFAULT_DIR,
};
use clap::{Parser, Subcommand};
use prompt::Prompter;
use session::{select_file, Driver};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "asciitab")]
#[command(about = "Console editor for (key , value) text tables", long_about = None)]
#[command(version)]
struct Cli {
    /// Table file to open (".txt" is appended when missing)
    file: Option<String>,

    /// Folder holding the table files
    #[arg(short, long, default_value = DEFAULT_DIR, global = true)]
    dir: PathBuf,

    /// Skip lines without pairs when loading instead of keeping them as empty rows
    #[arg(long, global = true)]
    drop_empty_rows: bool,

    /// Write the session's change history as JSON to this path on exit
    #[arg(long)]
    history: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the table files in the folder
    List,

    /// Print a table without starting a session
    Export {
        /// Table file to export
        file: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> asciitab_core::Result<()> {
    let empty_rows = if cli.drop_empty_rows {
        EmptyRows::Drop
    } else {
        EmptyRows::Keep
    };
    let storage = FileStorage::new(&cli.dir);

    match cli.command {
        Some(Commands::List) => cmd_list(&storage),
        Some(Commands::Export {
            file,
            format,
            output,
        }) => cmd_export(&storage, &file, &format, output.as_ref(), empty_rows),
        None => cmd_session(storage, cli.file.as_deref(), empty_rows, cli.history.as_ref()),
    }
}

fn cmd_session(
    mut storage: FileStorage,
    file: Option<&str>,
    empty_rows: EmptyRows,
    history_path: Option<&PathBuf>,
) -> asciitab_core::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut prompt = Prompter::new(stdin.lock(), stdout.lock());

    let Some(file_name) = select_file(&mut prompt, &mut storage, file)? else {
        return Ok(());
    };

    let service = TableService::new(storage, file_name).with_empty_rows(empty_rows);
    let mut driver = Driver::new(prompt, service);
    driver.run()?;

    if let Some(path) = history_path {
        driver.service().history().save(path)?;
    }
    Ok(())
}

fn cmd_list(storage: &FileStorage) -> asciitab_core::Result<()> {
    let names = storage.list()?;

    println!("Tables in {} ({}):", storage.dir().display(), names.len());
    for name in &names {
        println!("  {}", name);
    }

    Ok(())
}

fn cmd_export(
    storage: &FileStorage,
    file: &str,
    format: &str,
    output: Option<&PathBuf>,
    empty_rows: EmptyRows,
) -> asciitab_core::Result<()> {
    let name = storage.ensure_extension(file);
    let table = parse(storage.read_lines(&name)?, empty_rows);

    let content = match format.to_lowercase().as_str() {
        "text" => render_string(&table),
        "json" => serde_json::to_string_pretty(&table)?,
        other => {
            return Err(asciitab_core::Error::Validation(format!(
                "unknown format '{}', supported formats: text, json",
                other
            )))
        }
    };

    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writeln!(writer, "{}", content)?;
            writer.flush()?;
            eprintln!("Exported {} rows to {}", table.len(), path.display());
        }
        None => println!("{}", content),
    }

    Ok(())
}
