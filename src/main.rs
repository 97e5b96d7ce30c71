//! qtemplate - resolve query templates against JSON records
//!
//! # Usage
//!
//! ```bash
//! # Resolve a template against one record (JSON object)
//! qtemplate resolve insert.gql --data person.json
//!
//! # Bulk load: a JSON array is resolved record by record
//! qtemplate resolve insert.gql --data people.json --keep-going
//!
//! # Syntax check only, reporting every error at once
//! qtemplate check insert.gql
//!
//! # List registered macros
//! qtemplate macros
//! ```

use clap::{Parser, Subcommand};
use engine::{
    data_from_json_value, logging, DataContext, TemplateConfig, TemplateError, TemplateParser,
};
use parser::{parse_template, ParseOptions};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "qtemplate")]
#[command(version = "0.1.0")]
#[command(about = "Resolve query templates against JSON records", long_about = None)]
struct Cli {
    /// Enable verbose logging (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a template into query text
    Resolve {
        /// Path to the template file
        template: PathBuf,

        /// JSON data: an object is one record, an array is a batch
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Log and skip records that fail instead of stopping
        #[arg(long)]
        keep_going: bool,
    },

    /// Check template syntax without resolving
    Check {
        /// Path to the template file
        template: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Colorize diagnostics
        #[arg(long)]
        color: bool,
    },

    /// List the registered macros
    Macros,
}

fn main() {
    let cli = Cli::parse();

    logging::init_with_level(logging::level_for_verbosity(cli.verbose));

    let result = match cli.command {
        Commands::Resolve {
            template,
            data,
            config,
            keep_going,
        } => resolve_file(&template, data.as_deref(), config.as_deref(), keep_going),
        Commands::Check {
            template,
            config,
            color,
        } => check_file(&template, config.as_deref(), color),
        Commands::Macros => {
            list_macros();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<TemplateConfig, String> {
    match path {
        Some(path) => TemplateConfig::from_file(path),
        None => Ok(TemplateConfig::default()),
    }
}

fn read_template(path: &Path) -> Result<String, String> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

/// Load the records to resolve against. No data file means one empty record.
fn load_records(path: Option<&Path>) -> Result<Vec<DataContext>, String> {
    let Some(path) = path else {
        return Ok(vec![DataContext::new()]);
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("{}: invalid JSON: {}", path.display(), e))?;

    match json {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                data_from_json_value(item).map_err(|e| format!("record {}: {}", i, e))
            })
            .collect(),
        other => Ok(vec![data_from_json_value(other)?]),
    }
}

fn describe(error: &TemplateError) -> String {
    match error.suggestion() {
        Some(help) => format!("{}\n  help: {}", error, help),
        None => error.to_string(),
    }
}

fn resolve_file(
    template_path: &Path,
    data: Option<&Path>,
    config: Option<&Path>,
    keep_going: bool,
) -> Result<(), String> {
    let config = load_config(config)?;
    let template = read_template(template_path)?;
    let records = load_records(data)?;

    log::info!(
        "resolving {} against {} record(s)",
        template_path.display(),
        records.len()
    );

    let parser = TemplateParser::with_config(config);
    let results = parser.resolve_batch(&template, &records).map_err(|e| describe(&e))?;

    let mut failed = 0;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(text) => print!("{}", text),
            Err(e) if keep_going => {
                failed += 1;
                log::warn!("skipping record {}: {}", i, e);
            }
            Err(e) => return Err(format!("record {}: {}", i, describe(&e))),
        }
    }

    if failed > 0 {
        log::info!("{} of {} record(s) skipped", failed, records.len());
    }
    Ok(())
}

fn check_file(template_path: &Path, config: Option<&Path>, color: bool) -> Result<(), String> {
    let config = load_config(config)?;
    let template = read_template(template_path)?;

    let options: ParseOptions = config.parse_options();
    let parsed = parse_template(&template, &options);

    if parsed.has_errors() {
        eprint!("{}", parsed.format_diagnostics(color));
        return Err(format!(
            "{}: {} syntax error(s)",
            template_path.display(),
            parsed.errors.error_count()
        ));
    }

    println!(
        "{}: OK ({} top-level node(s))",
        template_path.display(),
        parsed.program.nodes.len()
    );
    Ok(())
}

fn list_macros() {
    let parser = TemplateParser::create();
    for name in parser.macro_names() {
        println!("@{}", name);
    }
}
