use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};

use audiolang::config::Config;
use audiolang::runner::{self, Mode};

fn main() -> ExitCode {
    let matches = Command::new("audiolang")
        .about("Interpreter for a small typed scripting language for audio file management")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("string")
                .short('s')
                .long("string")
                .help("Execute the given source text instead of a file")
                .value_name("SOURCE")
                .conflicts_with("file"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a JSON file overriding the interpreter limits")
                .value_name("CONFIG"),
        )
        .arg(
            Arg::new("lex")
                .short('l')
                .long("lex")
                .help("Stop after lexing and print the token stream")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parse")
                .short('p')
                .long("parse")
                .help("Stop after parsing and print the syntax tree")
                .action(ArgAction::SetTrue)
                .conflicts_with("lex"),
        )
        .arg(
            Arg::new("check")
                .short('t')
                .long("check")
                .help("Stop after type checking")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["lex", "parse"]),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .help("Render diagnostics as annotated source snippets")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => match Config::from_json_file(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let mode = if matches.get_flag("lex") {
        Mode::Tokens
    } else if matches.get_flag("parse") {
        Mode::Ast
    } else if matches.get_flag("check") {
        Mode::Check
    } else {
        Mode::Run
    };
    let pretty = matches.get_flag("pretty");

    let (source, filename) = if let Some(text) = matches.get_one::<String>("string") {
        (text.clone(), None)
    } else if let Some(file_path) = matches.get_one::<String>("file") {
        let path = Path::new(file_path);
        match fs::read_to_string(path) {
            Ok(source) => (source, Some(file_path.clone())),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        eprintln!("Error: no input given (pass a script file or use --string)");
        return ExitCode::FAILURE;
    };

    if runner::run(&source, filename.as_deref(), &config, mode, pretty) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
