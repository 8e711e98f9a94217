//! Terminal rendering: colorized status output, streaming answer text,
//! the in-place reasoning line, and pull progress.
//!
//! All styling goes through `console`, which drops ANSI codes when the
//! output is not a terminal.

use std::io::{self, Write};

use console::style;
use parley_ollama_client::{ModelInfo, PullProgress, ShowResponse};

use crate::session::{TurnError, TurnRenderer};

/// Display width of the in-place reasoning line
const THINKING_DISPLAY_WIDTH: usize = 60;

/// Truncate to a display width on a character boundary
fn truncate_display(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Renders one turn to the terminal as fragments arrive
///
/// Answer text prints incrementally with no buffering. Reasoning text
/// overwrites a single dim line, truncated to a fixed width, and is
/// replaced by a completion marker the moment answer text starts.
#[derive(Default)]
pub struct TerminalRenderer {
    thinking: String,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TurnRenderer for TerminalRenderer {
    fn answer_fragment(&mut self, text: &str) {
        print!("{}", style(text).blue());
        let _ = io::stdout().flush();
    }

    fn thinking_fragment(&mut self, text: &str) {
        self.thinking.push_str(text);
        let condensed = self.thinking.replace('\n', " ");
        let shown = truncate_display(&condensed, THINKING_DISPLAY_WIDTH);
        print!(
            "\r{} {:<width$}",
            style("💭").dim(),
            style(shown).dim().italic(),
            width = THINKING_DISPLAY_WIDTH
        );
        let _ = io::stdout().flush();
    }

    fn thinking_finished(&mut self) {
        // Overwrite the reasoning line with the finalization marker
        println!(
            "\r{:<width$}",
            style("💭 reasoning complete").dim(),
            width = THINKING_DISPLAY_WIDTH + 3
        );
        self.thinking.clear();
    }

    fn turn_finished(&mut self) {
        println!();
    }
}

pub fn print_connecting() {
    println!("{}", style("🔌 Connecting to Ollama...").cyan());
}

pub fn print_connected() {
    println!("{}", style("✅ Connected successfully!").green());
}

/// Styled connection failure banner, written to stderr
pub fn print_connection_failure(url: &str) {
    eprintln!("\n{}", style("❌  OLLAMA CONNECTION FAILED").red().bold());
    eprintln!("────────────────────────────────────");
    eprintln!("📡  Could not reach Ollama at {}", url);
    eprintln!("💡  Tip: Start Ollama with: {}", style("ollama serve").yellow());
    eprintln!("📦  Get Ollama: https://ollama.com/download");
    eprintln!("────────────────────────────────────\n");
}

pub fn print_version(version: &str) {
    println!("{} {}\n", style("📋 Server Version:").yellow(), version);
}

/// Model listing with the default chat model starred
pub fn print_models(models: &[ModelInfo], default_model: &str) {
    println!("{}", style("📦 Available Models:").yellow());
    for (i, model) in models.iter().enumerate() {
        let prefix = if model.name == default_model {
            format!("  {} ", style("★").green())
        } else {
            "    ".to_string()
        };
        println!("{}{}: {}", prefix, i, style(&model.name).cyan());
    }
}

pub fn print_selected_models(default_model: &str, embedding_model: &str) {
    println!(
        "\n{} {}",
        style("💬 Default Chat Model:").yellow(),
        default_model
    );
    println!(
        "{} {}",
        style("🧩 Embedding Model:").yellow(),
        embedding_model
    );
}

pub fn print_capabilities(model: &str, show: &ShowResponse) {
    println!(
        "\n{}",
        style(format!("⚙️  Capabilities of {}:", model)).yellow()
    );
    for capability in &show.capabilities {
        println!("  - {}", capability);
    }
    if let Some(details) = &show.details {
        if let (Some(family), Some(size)) = (&details.family, &details.parameter_size) {
            println!("  ({} / {})", family, size);
        }
    }
}

/// One in-place progress line per pull update
pub fn print_pull_progress(progress: &PullProgress) {
    match (progress.completed, progress.total) {
        (Some(completed), Some(total)) if total > 0 => {
            print!(
                "\r{} {} [{} / {}]          ",
                style("⬇").cyan(),
                progress.status,
                format_bytes(completed),
                format_bytes(total)
            );
        }
        _ => {
            print!("\r{} {:<50}", style("⬇").cyan(), progress.status);
        }
    }
    let _ = io::stdout().flush();
}

pub fn finish_pull(model: &str) {
    println!("\n{} {}", style("✅ Pulled:").green(), model);
}

pub fn print_embedding_result(model: &str, dimensions: usize) {
    println!(
        "{} {} ({} dimensions)",
        style("🧩 Embedding OK:").green(),
        model,
        dimensions
    );
}

pub fn print_chat_banner() {
    println!(
        "\n{}",
        style("🗨️  Start chatting with your AI (type 'exit' to quit)").blue()
    );
}

pub fn print_prompt() {
    print!("\n{} ", style("📝 You:").green());
    let _ = io::stdout().flush();
}

pub fn print_turn_error(error: &TurnError) {
    eprintln!("\n{} {}", style("❌ Generation failed:").red(), error);
}

pub fn print_goodbye() {
    println!("{}", style("👋 Goodbye! Stay safe.").blue());
}

/// Format a byte count with a binary unit suffix
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_display_short_input() {
        assert_eq!(truncate_display("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_display_long_input() {
        let long = "x".repeat(100);
        assert_eq!(truncate_display(&long, 60).chars().count(), 60);
    }

    #[test]
    fn test_truncate_display_multibyte() {
        let text = "日".repeat(80);
        let truncated = truncate_display(&text, 60);
        assert_eq!(truncated.chars().count(), 60);
        // Must cut on a character boundary
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
