// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::Level;

use crate::core::assembler::error::RunError;
use crate::core::expr::parse_number;
use crate::core::symbol_table::{SymbolTable, SymbolTableResult};
use crate::core::text_utils::{is_ident_char, is_ident_start};
use crate::core::token_stream::FunctionLimits;

pub const VERSION: &str = "0.1";

const LONG_ABOUT: &str = "Expand ca65-style token functions and list the result.

Reads each input, expands .CONCAT, .LEFT, .MID, .RIGHT and .STRING, and writes
one listing row per statement. Bodies of .MACRO blocks are listed unexpanded.
The listing goes to stdout unless -o/--outfile is given; -o is only allowed
with a single input.";

#[derive(Parser, Debug)]
#[command(
    name = "tokfn",
    version = VERSION,
    about = "Token function expander for ca65-style sources",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 'i',
        long = "infile",
        value_name = "FILE",
        action = ArgAction::Append,
        long_help = "Input source file (repeatable)."
    )]
    pub infiles: Vec<PathBuf>,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "FILE",
        long_help = "Write the listing to FILE instead of stdout. Only valid with a single input."
    )]
    pub outfile: Option<PathBuf>,
    #[arg(
        short = 'D',
        long = "define",
        value_name = "NAME[=VAL]",
        action = ArgAction::Append,
        long_help = "Define a constant visible to numeric arguments (repeatable). If VAL is omitted, defaults to 1."
    )]
    pub defines: Vec<String>,
    #[arg(
        long = "max-string-len",
        value_name = "N",
        default_value_t = 255,
        long_help = "Longest string constant or .CONCAT result, in bytes. Defaults to 255."
    )]
    pub max_string_len: usize,
    #[arg(
        long = "arg-limit",
        value_name = "N",
        default_value_t = 100,
        long_help = "Upper bound for the count and start arguments of .LEFT, .MID and .RIGHT. Defaults to 100."
    )]
    pub arg_limit: i64,
    #[arg(
        long = "raw",
        action = ArgAction::SetTrue,
        long_help = "List the input as scanned, without expanding token functions."
    )]
    pub raw: bool,
    #[arg(long = "log-level", value_name = "LEVEL", default_value_t = Level::WARN)]
    pub log_level: Level,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub infiles: Vec<PathBuf>,
    pub outfile: Option<PathBuf>,
    pub limits: FunctionLimits,
    pub symbols: SymbolTable,
    pub raw: bool,
}

/// Split `NAME[=VAL]` into a name and value; the value defaults to 1.
pub fn parse_define(arg: &str) -> Result<(String, i64), RunError> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => {
            let value = parse_number(value)
                .ok_or_else(|| RunError::Cli(format!("Invalid value in -D/--define: {arg}")))?;
            (name, value)
        }
        None => (arg, 1),
    };

    let bytes = name.as_bytes();
    let valid = bytes.first().is_some_and(|&c| is_ident_start(c))
        && bytes.iter().all(|&c| is_ident_char(c));
    if !valid {
        return Err(RunError::Cli(format!(
            "Invalid name in -D/--define: {arg}"
        )));
    }
    Ok((name.to_string(), value))
}

pub fn validate_cli(cli: &Cli) -> Result<CliConfig, RunError> {
    if cli.infiles.is_empty() {
        return Err(RunError::Cli(
            "No input files specified. Use -i/--infile".to_string(),
        ));
    }
    if cli.outfile.is_some() && cli.infiles.len() > 1 {
        return Err(RunError::Cli(
            "-o/--outfile is not allowed with multiple inputs".to_string(),
        ));
    }
    if cli.max_string_len == 0 {
        return Err(RunError::Cli(
            "--max-string-len must be at least 1".to_string(),
        ));
    }
    if cli.arg_limit < 0 {
        return Err(RunError::Cli("--arg-limit must not be negative".to_string()));
    }

    let mut symbols = SymbolTable::new();
    for arg in &cli.defines {
        let (name, value) = parse_define(arg)?;
        if symbols.add(&name, value) == SymbolTableResult::Duplicate {
            return Err(RunError::Cli(format!("Duplicate -D/--define: {name}")));
        }
    }

    Ok(CliConfig {
        infiles: cli.infiles.clone(),
        outfile: cli.outfile.clone(),
        limits: FunctionLimits {
            max_string_len: cli.max_string_len,
            argument_limit: cli.arg_limit,
        },
        symbols,
        raw: cli.raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_parses_inputs_and_options() {
        let cli = Cli::parse_from([
            "tokfn",
            "-i",
            "a.s",
            "-i",
            "b.s",
            "-D",
            "WIDTH=$20",
            "--max-string-len",
            "64",
            "--arg-limit",
            "10",
            "--raw",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.infiles, vec![PathBuf::from("a.s"), PathBuf::from("b.s")]);
        assert_eq!(cli.defines, vec!["WIDTH=$20".to_string()]);
        assert_eq!(cli.max_string_len, 64);
        assert_eq!(cli.arg_limit, 10);
        assert!(cli.raw);
        assert_eq!(cli.log_level, Level::DEBUG);
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["tokfn", "-i", "a.s"]);
        assert_eq!(cli.max_string_len, 255);
        assert_eq!(cli.arg_limit, 100);
        assert_eq!(cli.log_level, Level::WARN);
        assert!(!cli.raw);
        let config = validate_cli(&cli).expect("validate cli");
        assert_eq!(config.limits, FunctionLimits::default());
    }

    #[test]
    fn validate_cli_requires_input() {
        let cli = Cli::parse_from(["tokfn"]);
        let err = validate_cli(&cli).unwrap_err();
        assert_eq!(err.to_string(), "No input files specified. Use -i/--infile");
    }

    #[test]
    fn validate_cli_rejects_outfile_with_multiple_inputs() {
        let cli = Cli::parse_from(["tokfn", "-i", "a.s", "-i", "b.s", "-o", "out.lst"]);
        let err = validate_cli(&cli).unwrap_err();
        assert_eq!(
            err.to_string(),
            "-o/--outfile is not allowed with multiple inputs"
        );
    }

    #[test]
    fn validate_cli_rejects_negative_arg_limit() {
        let cli = Cli::parse_from(["tokfn", "-i", "a.s", "--arg-limit=-1"]);
        assert!(validate_cli(&cli).is_err());
    }

    #[test]
    fn validate_cli_collects_defines() {
        let cli = Cli::parse_from(["tokfn", "-i", "a.s", "-D", "A", "-D", "B=0Fh"]);
        let config = validate_cli(&cli).expect("validate cli");
        assert_eq!(config.symbols.entry("A"), Some(1));
        assert_eq!(config.symbols.entry("B"), Some(15));
    }

    #[test]
    fn validate_cli_rejects_duplicate_define() {
        let cli = Cli::parse_from(["tokfn", "-i", "a.s", "-D", "A", "-D", "A=2"]);
        let err = validate_cli(&cli).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate -D/--define: A");
    }

    #[test]
    fn parse_define_forms() {
        assert_eq!(parse_define("X").unwrap(), ("X".to_string(), 1));
        assert_eq!(parse_define("_x1=%101").unwrap(), ("_x1".to_string(), 5));
        assert_eq!(parse_define("N=-3").unwrap(), ("N".to_string(), -3));
        assert!(parse_define("1X=2").is_err());
        assert!(parse_define("X=zz").is_err());
        assert!(parse_define("=4").is_err());
    }
}
