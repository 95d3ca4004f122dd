//! Command-line runner: evaluate a script file or an inline expression
//! and print the completion value.

use std::process::ExitCode;

use jsrun::Interpreter;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag, source] if flag == "-e" => run(source),
        [path] if path != "-e" => match std::fs::read_to_string(path) {
            Ok(source) => run(&source),
            Err(err) => {
                eprintln!("jsrun: {}: {}", path, err);
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: jsrun <file.js>");
            eprintln!("       jsrun -e <source>");
            ExitCode::FAILURE
        }
    }
}

fn run(source: &str) -> ExitCode {
    let mut interp = Interpreter::new();
    match interp.eval(source) {
        Ok(value) => {
            println!("{:?}", value);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
