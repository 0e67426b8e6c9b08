use std::io::{self, Write};

use crate::engine::Engine;
use crate::runner::install_host_functions;

pub fn start() {
    println!("ejs v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    // One engine for the whole session so declarations persist.
    let mut engine = Engine::new();
    install_host_functions(&mut engine);

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    println!("Goodbye!");
                    break;
                }

                run_repl_command(line, &mut engine);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn run_repl_command(source: &str, engine: &mut Engine) {
    match engine.evaluate(source) {
        Ok(result) => {
            if !result.is_empty() {
                println!("{}", result);
            }
        }
        Err(error) => {
            if error.report(source, None).is_err() {
                eprint!("{}", engine.error().unwrap_or_default());
            }
        }
    }
}
