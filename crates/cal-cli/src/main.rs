//! Developer CLI: run the analysis core over a C/AL export and print the
//! requested view as text or JSON.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use cal_analysis::{Analysis, AnalysisOptions, SemanticTokensBuilder};

#[derive(Parser)]
#[command(name = "cal-analyzer", version, about = "Analyze C/AL object text exports")]
struct Cli {
    /// C/AL object text file.
    file: PathBuf,

    /// What to print.
    #[arg(long, value_enum, default_value_t = Emit::Diagnostics)]
    emit: Emit,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Permit context underflow from RDLDATA payloads.
    #[arg(long)]
    allow_rdldata_underflow: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Tokens,
    Ast,
    Diagnostics,
    Symbols,
    Folding,
    SemanticTokens,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: cannot read {}: {error}", cli.file.display());
            return ExitCode::FAILURE;
        }
    };

    let analysis = Analysis::with_options(
        &source,
        AnalysisOptions {
            allow_rdldata_underflow: cli.allow_rdldata_underflow,
            max_nesting_depth: None,
        },
    );

    match cli.emit {
        Emit::Tokens => {
            if cli.json {
                print_json(analysis.tokens());
            } else {
                for token in analysis.tokens() {
                    println!(
                        "{:>4}:{:<3} {:?} {:?}",
                        token.position.line, token.position.column, token.kind, token.value
                    );
                }
            }
        }
        Emit::Ast => {
            if cli.json {
                print_json(analysis.document());
            } else {
                println!("{:#?}", analysis.document());
            }
        }
        Emit::Diagnostics => {
            let diagnostics = analysis.diagnostics();
            if cli.json {
                print_json(&diagnostics);
            } else {
                for diagnostic in &diagnostics {
                    println!("{diagnostic}");
                }
                if diagnostics.is_empty() {
                    println!("no diagnostics");
                }
            }
        }
        Emit::Symbols => {
            let table = analysis.symbol_table();
            if cli.json {
                print_json(table.all());
            } else {
                for symbol in table.all() {
                    let type_name = symbol.type_name.as_deref().unwrap_or("-");
                    println!("{:?} {} : {}", symbol.kind, symbol.name, type_name);
                }
            }
        }
        Emit::Folding => {
            let ranges = analysis.folding_ranges();
            if cli.json {
                print_json(&ranges);
            } else {
                for range in &ranges {
                    println!("{}..{} {:?}", range.start_line, range.end_line, range.kind);
                }
            }
        }
        Emit::SemanticTokens => {
            let mut builder = SemanticTokensBuilder::new();
            analysis.semantic_tokens(&mut builder);
            if cli.json {
                print_json(builder.tokens());
            } else {
                for token in builder.tokens() {
                    println!(
                        "{}:{} +{} {:?}",
                        token.line, token.character, token.length, token.token_type
                    );
                }
            }
        }
    }

    if analysis.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(error) => eprintln!("error: serialization failed: {error}"),
    }
}
