use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use passbook_ingest::{Institution, StatementParser, detect_institution};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod config;
mod input;
mod render;
mod state;

use config::OutputFormat;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("PASSBOOK_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "passbook", version = VERSION, about = "Bank statement parser")]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a statement (.json page dump, .pdf, or form-feed separated text)
    Parse {
        input: PathBuf,

        /// Institution slug, or `auto` to detect from the header
        #[arg(long, default_value = "auto")]
        bank: String,

        /// Output format (defaults to the config file's `[output] format`)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Config file (default: $PASSBOOK_HOME/config.toml, else ~/.passbook/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List supported institutions
    Banks,

    /// Write the default config file ($PASSBOOK_HOME or ~/.passbook)
    InitConfig,
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Parse {
            input,
            bank,
            format,
            config,
        } => {
            parse_statement(&input, &bank, format, config)?;
        }

        Command::Banks => {
            for institution in Institution::ALL {
                println!("{:<14} {}", institution.slug(), institution.display_name());
            }
        }

        Command::InitConfig => {
            config::init_config()?;
        }
    }

    Ok(())
}

fn parse_statement(
    input: &Path,
    bank: &str,
    format: Option<OutputFormat>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if !input.exists() {
        bail!("input not found: {}", input.display());
    }

    let cfg = config::load_config(config_path.as_deref())?;
    let document = input::read_document(input)?;

    let institution = if bank.eq_ignore_ascii_case("auto") {
        match detect_institution(&document, cfg.pipeline.header_lines)? {
            Some(found) => {
                log::info!("detected institution: {}", found.display_name());
                found
            }
            None => bail!(
                "could not detect the bank in {}; pass --bank (see `passbook banks`)",
                input.display()
            ),
        }
    } else {
        bank.parse::<Institution>()?
    };

    let parser = StatementParser::new(institution, cfg.pipeline.clone())?;
    let parsed = parser
        .parse(&document)
        .with_context(|| format!("parsing {}", input.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format.unwrap_or(cfg.output.format) {
        OutputFormat::Table => render::print_table(&mut out, &parsed, &cfg.output)?,
        OutputFormat::Json => render::print_json(&mut out, &parsed)?,
        OutputFormat::Csv => render::print_csv(&mut out, &parsed)?,
    }
    out.flush()?;

    if !parsed.ledger.is_clean() {
        log::warn!(
            "{} warning(s) while parsing {}",
            parsed.ledger.warnings().len(),
            input.display()
        );
    }

    Ok(())
}
