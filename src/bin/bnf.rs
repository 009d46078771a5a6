//! BNF expander binary entry point
//!
//! Run with: bnf <INPUT> <OUTPUT>
//!
//! Reads the grammar in INPUT and writes the expansion of `S` to OUTPUT.

use std::path::PathBuf;

use clap::Parser;

/// Expand the start symbol of a BNF grammar
#[derive(Parser, Debug)]
#[command(name = "bnf", version = fixture_harness::version::HARNESS_VERSION)]
struct Args {
    /// Grammar file, one `A -> x|y` rule per line
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// File to write the expansion to
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
}

fn main() -> miette::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let args = Args::parse();
    fixture_harness::bnf::expand_file(&args.input, &args.output)?;
    Ok(())
}
