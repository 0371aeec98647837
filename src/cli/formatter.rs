//! Console output helpers shared by the commands.
use colored::*;

pub fn print_section(title: &str) {
    let line = "─".repeat(60);
    println!("\n{} {}", "▶".cyan(), title.bold());
    println!("{}", line.dimmed());
}

pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green().bold(), message);
}

pub fn print_warning(message: &str) {
    println!(
        "\n{} {}",
        "⚠".yellow(),
        format!("Warning: {}", message).yellow()
    );
}

pub fn print_item(label: &str, value: &str) {
    println!("  {} {}: {}", "•".dimmed(), label, value);
}

/// Print formatted number with thousands separator
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
