use colored::Colorize;

/// Print a success message to stderr with a green checkmark prefix.
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print an error message to stderr with a red cross prefix.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print an informational message to stderr with a blue info prefix.
pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue(), msg);
}

/// Print a bold section title to stdout, for listing commands whose output
/// is data.
pub fn header_stdout(msg: &str) {
    println!("{}", msg.bold());
}
