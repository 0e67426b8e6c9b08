use clap::{Arg, Command};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use ejs::{repl, runner};

fn main() -> ExitCode {
    let matches = Command::new("ejs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs scripts on the embeddable ejs engine")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let status = match matches.get_one::<String>("file") {
        Some(file_path) => run_file(file_path),
        None => ExitCode::SUCCESS,
    };

    if matches.get_flag("interactive") || matches.get_one::<String>("file").is_none() {
        repl::start();
    }
    status
}

fn run_file(path: &str) -> ExitCode {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        return ExitCode::FAILURE;
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            let filename = path.to_string_lossy();
            match runner::run(&source, Some(&*filename)) {
                Some(result) => {
                    if !result.is_empty() {
                        println!("{}", result);
                    }
                    ExitCode::SUCCESS
                }
                None => ExitCode::FAILURE,
            }
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            ExitCode::FAILURE
        }
    }
}
