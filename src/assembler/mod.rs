// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line driver.
//!
//! Reads each input, runs it through the token engine and writes the
//! listing, either to the `-o` file or to stdout.

pub mod cli;


use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::core::assembler::listing::{expand_source, expand_source_raw, Expansion, ListingWriter};

use cli::{validate_cli, Cli, CliConfig};

// Re-export public types
pub use crate::core::assembler::error::{RunError, RunReport};
pub use cli::VERSION;

/// Expand every input named on the command line.
pub fn run(cli: &Cli) -> Result<Vec<RunReport>, RunError> {
    let config = validate_cli(cli)?;

    match &config.outfile {
        Some(path) => {
            let file = File::create(path).map_err(|source| RunError::Write {
                path: path.clone(),
                source,
            })?;
            let mut writer = ListingWriter::new(BufWriter::new(file));
            let reports = run_inputs(&config, &mut writer, path)?;
            writer.into_inner().flush().map_err(|source| RunError::Write {
                path: path.clone(),
                source,
            })?;
            Ok(reports)
        }
        None => {
            let stdout = io::stdout();
            let mut writer = ListingWriter::new(stdout.lock());
            run_inputs(&config, &mut writer, Path::new("<stdout>"))
        }
    }
}

fn run_inputs<W: Write>(
    config: &CliConfig,
    writer: &mut ListingWriter<W>,
    out_path: &Path,
) -> Result<Vec<RunReport>, RunError> {
    let mut reports = Vec::new();
    for input in &config.infiles {
        let report = run_one(config, input, writer, out_path)?;
        reports.push(report);
    }
    Ok(reports)
}

fn run_one<W: Write>(
    config: &CliConfig,
    input: &Path,
    writer: &mut ListingWriter<W>,
    out_path: &Path,
) -> Result<RunReport, RunError> {
    let source = fs::read_to_string(input).map_err(|source| RunError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let name = input.to_string_lossy().to_string();
    tracing::info!(file = %name, raw = config.raw, "expanding");

    let expansion = if config.raw {
        expand_source_raw(&source, config.limits)
    } else {
        expand_source(&source, config.limits, config.symbols.clone())
    };

    write_listing(writer, &name, &expansion).map_err(|source| RunError::Write {
        path: out_path.to_path_buf(),
        source,
    })?;

    let diagnostics = expansion
        .diagnostics
        .into_vec()
        .into_iter()
        .map(|diag| diag.with_file(Some(name.clone())))
        .collect();
    let source_lines = source.lines().map(str::to_string).collect();
    Ok(RunReport::new(name, diagnostics, source_lines))
}

fn write_listing<W: Write>(
    writer: &mut ListingWriter<W>,
    title: &str,
    expansion: &Expansion,
) -> io::Result<()> {
    writer.header(title)?;
    for line in &expansion.lines {
        writer.write_line(line)?;
    }
    writer.footer(expansion.lines.len(), expansion.diagnostics.len())
}
