//! Terminal styling utilities

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("slimip").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("Sparse integer scoring systems as Mixed-Integer Programs").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// One `label: value` line of the configuration card
pub struct ConfigLine {
    pub label: &'static str,
    pub value: String,
}

impl ConfigLine {
    pub fn new(label: &'static str, value: impl ToString) -> Self {
        Self {
            label,
            value: value.to_string(),
        }
    }

    pub fn path(label: &'static str, path: &Path) -> Self {
        Self::new(label, truncate_path(path, 38))
    }
}

/// Print configuration card: input files first, then parameters
pub fn print_config(files: &[ConfigLine], parameters: &[ConfigLine]) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!("    │ {}Configuration{}│", GEAR, " ".repeat(box_width - 18));
    println!("    ├{}┤", line);
    for entry in files {
        println!(
            "    │  {}{:<10} {:<40}│",
            FOLDER,
            format!("{}:", entry.label),
            truncate_string(&entry.value, 38)
        );
    }
    if !parameters.is_empty() {
        println!("    ├{}┤", line);
    }
    for entry in parameters {
        println!(
            "    │  {:<22} {:<29}│",
            format!("{}:", entry.label),
            style(truncate_string(&entry.value, 28)).yellow()
        );
    }
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print a failure message
pub fn print_failure(message: &str) {
    println!("    {} {}", style("✗").red().bold(), style(message).red());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {}{}", INFO, message);
}

/// Print the elapsed time of a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("completed in {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print where an artifact was written
pub fn print_saved(what: &str, path: &Path) {
    println!("    {}{} {}", SAVE, what, style(path.display()).dim());
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {}{}", ROCKET, style(message).green().bold());
    println!();
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
