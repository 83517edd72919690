// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for tokfn.

use clap::Parser;

use tokfn::assembler::cli::Cli;

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let use_color = std::env::var("NO_COLOR").is_err();
    match tokfn::assembler::run(&cli) {
        Ok(reports) => {
            let mut errors = 0;
            for report in &reports {
                for diag in report.diagnostics() {
                    eprintln!(
                        "{}",
                        diag.format_with_context(Some(report.source_lines()), use_color)
                    );
                }
                errors += report.error_count();
            }
            if errors > 0 {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
