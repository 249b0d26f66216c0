//! Demo harness: bundle a local entry file whose imports reach over
//! HTTP(S), print the result, exit non-zero on failure.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod logging;

use clap::Parser;
use httpfile_core::{Bundler, HttpPlugin};
use miette::{miette, IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "httpfile")]
#[command(author, version, about = "Bundle modules fetched over HTTP(S)", long_about = None)]
struct Cli {
    /// Entry point module (e.g. hello.mjs)
    entry: PathBuf,

    /// Write the bundle here in addition to printing it
    #[arg(short, long, value_name = "PATH")]
    outfile: Option<PathBuf>,

    /// Only write/print the bundle, no summary line
    #[arg(short, long)]
    quiet: bool,

    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut bundler = Bundler::new();
    bundler.add_plugin(Box::new(
        HttpPlugin::new().map_err(|e| miette!("{e}"))?,
    ));

    let output = bundler
        .bundle(&cli.entry)
        .await
        .map_err(|e| miette!("{e}"))?;

    if let Some(outfile) = &cli.outfile {
        std::fs::write(outfile, &output.code).into_diagnostic()?;
    }

    print!("{}", output.code);

    if !cli.quiet {
        eprintln!(
            "bundled {} module{} from {}",
            output.module_count,
            if output.module_count == 1 { "" } else { "s" },
            cli.entry.display()
        );
    }

    Ok(())
}
