//! Truth Compiler CLI
//!
//! Incremental knowledge-graph compilation.

use truthc::commands::{check_file, explain_fault, parse_file};

fn main() {
    truthc::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: truth check <file.truth>");
                std::process::exit(1);
            }
            check_file(&args[2]);
        }
        "parse" => {
            if args.len() < 3 {
                eprintln!("Usage: truth parse <file.truth>");
                std::process::exit(1);
            }
            parse_file(&args[2]);
        }
        "--explain" | "explain" => {
            if args.len() < 3 {
                eprintln!("Usage: truth --explain <FAULT_CODE>");
                eprintln!("Example: truth --explain T201");
                std::process::exit(1);
            }
            explain_fault(&args[2]);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("Truth Compiler {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            // A bare .truth path means check it.
            if command.ends_with(truth_ir::TRUTH_EXTENSION) {
                check_file(command);
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

fn print_usage() {
    println!("Truth Compiler (incremental knowledge-graph compilation)");
    println!();
    println!("Usage: truth <command> [options]");
    println!();
    println!("Commands:");
    println!("  check <file.truth>   Load, resolve references and verify a document");
    println!("  parse <file.truth>   Parse and display statement structure");
    println!("  --explain <code>     Explain a fault code (e.g. T201)");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Examples:");
    println!("  truth check animals.truth");
    println!("  truth parse animals.truth");
    println!("  truth --explain T201");
    println!();
    println!("Set RUST_LOG=truth_graph=debug for hierarchical trace output.");
}
