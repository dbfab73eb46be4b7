//! `jp`: evaluate a JMESPath expression against a document.
//!
//! Usage:
//!   jp '<expression>'
//!
//! The document is read from stdin. The expression is the first argument.
//! Set `RUST_LOG=debug` to see why a result collapsed to `null`.

use std::io::{self, Read, Write};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let expression = match args.get(1) {
        Some(e) => e.clone(),
        None => {
            eprintln!("First argument must be a JMESPath expression.");
            std::process::exit(1);
        }
    };

    let expr = match jmespath_engine::compile(&expression) {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }
    let data: serde_json::Value = match serde_json::from_str(buf.trim()) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Invalid JSON document: {e}");
            std::process::exit(1);
        }
    };

    let output = expr
        .search(&data)
        .map_err(|e| e.to_string())
        .and_then(|result| serde_json::to_string_pretty(&result).map_err(|e| e.to_string()));
    match output {
        Ok(text) => {
            let mut stdout = io::stdout();
            if let Err(e) = writeln!(stdout, "{text}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
