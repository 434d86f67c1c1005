//! Log formatting and output with ANSI colors and text wrapping
//!
//! Handles:
//! - Colorized console output with tag and level formatting
//! - Text wrapping at word boundaries
//! - Dual output (console + file)
//! - Broken pipe handling for piped commands

use super::file::write_to_file;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

/// Display configuration
const LOG_SHOW_TIME: bool = true;

/// Log format widths for alignment
const TAG_WIDTH: usize = 8;
const LEVEL_WIDTH: usize = 7;
const BRACKET_SPACE_WIDTH: usize = 3;
const TOTAL_PREFIX_WIDTH: usize = TAG_WIDTH + LEVEL_WIDTH + BRACKET_SPACE_WIDTH * 2;

/// Maximum line length before wrapping
const MAX_LINE_LENGTH: usize = 145;

/// Format and output a log message
pub fn format_and_log(tag: LogTag, level: &str, message: &str) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();

    let prefix = if LOG_SHOW_TIME {
        format!("{} ", time).dimmed().to_string()
    } else {
        String::new()
    };

    let tag_str = format_tag(&tag);
    let level_str = format_level(level);

    // Build the base log line
    let base_line = format!("{}[{}] [{}] ", prefix, tag_str, level_str);

    let base_length = strip_ansi_codes(&base_line)
        .len()
        .max(TOTAL_PREFIX_WIDTH + strip_ansi_codes(&prefix).len());
    let available_space = if MAX_LINE_LENGTH > base_length {
        MAX_LINE_LENGTH - base_length
    } else {
        50
    };

    // Split message into chunks that fit
    let message_chunks = wrap_text(message, available_space);

    // Print first line
    let console_line = format!("{}{}", base_line, message_chunks[0]);
    print_stdout_safe(&console_line);

    // Write to file
    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let tag_clean = tag.to_plain_string();
    let file_line = format!("{} [{}] [{}] {}", timestamp, tag_clean, level, message_chunks[0]);
    write_to_file(&file_line);

    // Print continuation lines
    if message_chunks.len() > 1 {
        let continuation_prefix = format!(
            "{}{}",
            " ".repeat(strip_ansi_codes(&prefix).len()),
            " ".repeat(TOTAL_PREFIX_WIDTH)
        );
        for chunk in &message_chunks[1..] {
            let console_continuation = format!("{}{}", continuation_prefix, chunk);
            print_stdout_safe(&console_continuation);

            let file_continuation = format!("{} [{}] [{}] {}", timestamp, tag_clean, level, chunk);
            write_to_file(&file_continuation);
        }
    }
}

/// Format a tag with appropriate color
fn format_tag(tag: &LogTag) -> ColoredString {
    let padded = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::Fleet => padded.bright_green().bold(),
        LogTag::Funding => padded.bright_magenta().bold(),
        LogTag::Worker => padded.bright_cyan().bold(),
        LogTag::Pool => padded.bright_blue().bold(),
        LogTag::Quote => padded.bright_white().bold(),
        LogTag::Wallet => padded.magenta().bold(),
        LogTag::Ledger => padded.cyan().bold(),
        LogTag::System => padded.bright_yellow().bold(),
    }
}

/// Format a log level with appropriate color
fn format_level(level: &str) -> ColoredString {
    let padded = format!("{:<width$}", level, width = LEVEL_WIDTH);
    match level {
        "ERROR" => padded.bright_red().bold(),
        "WARNING" => padded.yellow(),
        "DEBUG" => padded.bright_black(),
        "VERBOSE" => padded.dimmed(),
        _ => padded.normal(),
    }
}

/// Wrap text at word boundaries to fit the available width
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.len() <= max_width {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        // A single word longer than the width goes on its own line, unwrapped
        if word.len() > max_width {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.push(word.to_string());
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }

    chunks
}

/// Remove ANSI escape sequences for width calculations
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip until the terminating letter of the escape sequence
            for e in chars.by_ref() {
                if e.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Print to stdout, tolerating broken pipes (e.g. `swarmbot | head`)
fn print_stdout_safe(line: &str) {
    let mut out = stdout();
    if let Err(e) = writeln!(out, "{}", line) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_text_preserves_short_lines() {
        let chunks = wrap_text("short message", 50);
        assert_eq!(chunks, vec!["short message".to_string()]);
    }

    #[test]
    fn wrap_text_splits_at_word_boundaries() {
        let chunks = wrap_text("alpha beta gamma delta", 11);
        assert!(chunks.iter().all(|c| c.len() <= 11));
        assert_eq!(chunks.join(" "), "alpha beta gamma delta");
    }

    #[test]
    fn strip_ansi_removes_color_codes() {
        let colored = "\x1b[1;32mFLEET\x1b[0m";
        assert_eq!(strip_ansi_codes(colored), "FLEET");
    }
}
