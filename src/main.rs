use shorthand::json::{map_to_json, JsonStyle};
use shorthand::parse_shorthand;

use std::io::{self, Read};

const USAGE: &str = "usage: shorthand [--compact] [EXPRESSION]";

fn main() {
    let mut style = JsonStyle::Pretty;
    let mut expression = None;
    for arg in std::env::args().skip(1) {
        if arg == "--compact" {
            style = JsonStyle::Compact;
        } else if arg == "-h" || arg == "--help" {
            println!("{}", USAGE);
            return;
        } else if arg.starts_with("--") {
            eprintln!("unknown option {}\n{}", arg, USAGE);
            std::process::exit(2);
        } else if expression.is_some() {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        } else {
            expression = Some(arg);
        }
    }

    let input = match expression {
        Some(expr) => expr,
        None => {
            let mut buf = String::new();
            if let Err(err) = io::stdin().read_to_string(&mut buf) {
                eprintln!("failed to read stdin: {}", err);
                std::process::exit(2);
            }
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    match parse_shorthand(&input) {
        Ok(map) => println!("{}", map_to_json(&map, style)),
        Err(err) => {
            eprintln!("ERROR AT LINE {}:", err.position().line + 1);
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}
