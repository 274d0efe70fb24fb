//! The `explain` command: display documentation for fault codes.

use truth_diagnostic::FaultCode;

/// Print the description and severity of a fault code.
pub fn explain_fault(code_str: &str) {
    let Some(code) = FaultCode::parse(code_str) else {
        eprintln!("Unknown fault code: {code_str}");
        eprintln!();
        eprintln!("Codes have the format T### where the first digit is the phase:");
        eprintln!("  T1xx  statement faults");
        eprintln!("  T2xx  pattern faults");
        eprintln!("  T3xx  reference faults");
        std::process::exit(1);
    };

    println!("{code} ({})", code.severity());
    println!("{}", code.description());
}
