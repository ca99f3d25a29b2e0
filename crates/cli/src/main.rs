// bibsift - classify harvested bibliographic records against a target
// catalog into insert / append / correct / holding-pen batches.

mod exit_codes;
mod writer;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use bibsift_record::xml::parse_collection;
use bibsift_recon::{engine, EngineConfig, RuleIndex, SnapshotCatalog};

use exit_codes::{recon_exit_code, EXIT_CONFIG, EXIT_INPUT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "bibsift")]
#[command(about = "Filter harvested record-interchange files into upload batches")]
#[command(version)]
struct Cli {
    /// Path to the action-rule configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Skip catalog identity resolution; treat every record as new
    #[arg(short = 'n', long = "no-lookup")]
    no_lookup: bool,

    /// Record-interchange snapshot of the target catalog used for
    /// identity lookups and stored-record fetches
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print a machine-readable run summary on stdout
    #[arg(long)]
    json: bool,

    /// Harvested record-interchange file to classify
    input: PathBuf,
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
}

fn fail(code: u8, message: impl Into<String>) -> CliError {
    CliError { code, message: message.into() }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    ExitCode::from(EXIT_SUCCESS)
                }
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::from(e.code)
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bibsift")
        .join("actions.cfg")
}

#[derive(Serialize)]
struct JsonSummary {
    engine_version: String,
    run_at: String,
    inserted: usize,
    appended: usize,
    corrected: usize,
    held: usize,
    outputs: Vec<String>,
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let rule_text = std::fs::read_to_string(&config_path).map_err(|e| {
        fail(EXIT_USAGE, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    let rules = RuleIndex::parse(&rule_text).map_err(|e| fail(EXIT_CONFIG, e.to_string()))?;

    let input_text = std::fs::read_to_string(&cli.input).map_err(|e| {
        fail(EXIT_USAGE, format!("cannot read input {}: {e}", cli.input.display()))
    })?;
    let records = parse_collection(&input_text).map_err(|e| {
        fail(EXIT_INPUT_PARSE, format!("cannot parse {}: {e}", cli.input.display()))
    })?;

    let catalog = match &cli.catalog {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                fail(EXIT_USAGE, format!("cannot read catalog {}: {e}", path.display()))
            })?;
            let snapshot = parse_collection(&text).map_err(|e| {
                fail(EXIT_INPUT_PARSE, format!("cannot parse {}: {e}", path.display()))
            })?;
            SnapshotCatalog::new(snapshot)
        }
        None => SnapshotCatalog::default(),
    };

    let config = EngineConfig {
        skip_identity: cli.no_lookup,
        ..EngineConfig::default()
    };

    let batches = engine::run(records, &rules, &config, &catalog)
        .map_err(|e| fail(recon_exit_code(&e), e.to_string()))?;

    let written = writer::write_batches(&cli.input, &batches)
        .map_err(|e| fail(EXIT_USAGE, format!("cannot write output: {e}")))?;

    let summary = batches.summary();
    if cli.json {
        let json = JsonSummary {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            inserted: summary.inserted,
            appended: summary.appended,
            corrected: summary.corrected,
            held: summary.held,
            outputs: written.iter().map(|p| p.display().to_string()).collect(),
        };
        let json = serde_json::to_string_pretty(&json)
            .map_err(|e| fail(EXIT_USAGE, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    } else {
        println!("inserted:  {}", summary.inserted);
        println!("appended:  {}", summary.appended);
        println!("corrected: {}", summary.corrected);
        println!("held:      {}", summary.held);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const INPUT: &str = concat!(
        "<collection><record>",
        r#"<datafield tag="245" ind1=" " ind2=" ">"#,
        r#"<subfield code="a">A paper</subfield>"#,
        "</datafield></record></collection>",
    );

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn cli(config: PathBuf, input: PathBuf) -> Cli {
        Cli {
            config: Some(config),
            no_lookup: true,
            catalog: None,
            json: false,
            input,
        }
    }

    #[test]
    fn invalid_action_in_rules_exits_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "actions.cfg", "default, c -> foo\n");
        let input = write(dir.path(), "harvest.xml", INPUT);

        let err = run(cli(config, input)).unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG);
        // Rejected before any record is processed: only the two files we
        // wrote exist, no batch output.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn unreadable_config_exits_usage() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "harvest.xml", INPUT);

        let err = run(cli(dir.path().join("missing.cfg"), input)).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }

    #[test]
    fn unparseable_input_exits_input_parse() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "actions.cfg", "default, c -> correct\n");
        let input = write(
            dir.path(),
            "harvest.xml",
            "<collection><record></wrong></collection>",
        );

        let err = run(cli(config, input)).unwrap_err();
        assert_eq!(err.code, EXIT_INPUT_PARSE);
    }

    #[test]
    fn successful_run_writes_the_insert_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "actions.cfg", "default, c -> correct\n");
        let input = write(dir.path(), "harvest.xml", INPUT);

        run(cli(config, input)).unwrap();
        assert!(dir.path().join("harvest.xml.insert.xml").exists());
    }
}
