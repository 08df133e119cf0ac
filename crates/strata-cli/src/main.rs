use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use strata_cli::{run_import, run_lower, ImportOptions, LowerOptions};
use strata_core::{init_tracing, init_tracing_with};

fn cli() -> Command {
    Command::new("strata")
        .version(strata_core::VERSION)
        .about("Staged AST lowering driver")
        .subcommand_required(true)
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("lower")
                .about("Lower a JSON HighIR expression to target source")
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .help("JSON file holding one HighIR expression")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_name("PATH")
                        .help("JSON lowering configuration"),
                )
                .arg(
                    Arg::new("stats")
                        .long("stats")
                        .help("Print per-rule statistics")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Resolve a standard library import")
                .arg(
                    Arg::new("module")
                        .value_name("MODULE")
                        .help("Module path, e.g. IO")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("items")
                        .value_name("ITEM")
                        .help("Names to import")
                        .num_args(0..)
                        .index(2),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .help("Import every exported function")
                        .conflicts_with("items")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("stdlib")
                        .long("stdlib")
                        .value_name("PATH")
                        .help("JSON registry used instead of the builtin modules"),
                )
                .arg(
                    Arg::new("origin")
                        .long("origin")
                        .value_name("NAME")
                        .help("Source name reported for missing items"),
                ),
        )
}

fn lower_options(matches: &ArgMatches) -> LowerOptions {
    LowerOptions {
        file: matches
            .get_one::<String>("file")
            .map(PathBuf::from)
            .unwrap_or_default(),
        config: matches.get_one::<String>("config").map(PathBuf::from),
        stats: matches.get_flag("stats"),
    }
}

fn import_options(matches: &ArgMatches) -> ImportOptions {
    ImportOptions {
        module: matches
            .get_one::<String>("module")
            .cloned()
            .unwrap_or_default(),
        items: matches
            .get_many::<String>("items")
            .map(|items| items.cloned().collect())
            .unwrap_or_default(),
        all: matches.get_flag("all"),
        stdlib: matches.get_one::<String>("stdlib").map(PathBuf::from),
        origin: matches.get_one::<String>("origin").cloned(),
    }
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    // Initialize logging
    if matches.get_flag("debug") {
        init_tracing_with("strata_core=debug,strata_cli=debug");
    } else {
        init_tracing();
    }

    let output = match matches.subcommand() {
        Some(("lower", sub)) => run_lower(&lower_options(sub))?,
        Some(("import", sub)) => run_import(&import_options(sub))?,
        _ => anyhow::bail!("a subcommand is required"),
    };

    println!("{output}");
    Ok(())
}
