// Multi-line record template shared by the console and file handlers.
//
// The console variant wraps the same text in an ANSI color picked by level.
// File output is never colored.

use chrono::{DateTime, Local};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::Level;

const MESSAGE_HEADER: &str = "--------------------- Message ---------------------";
const MESSAGE_FOOTER: &str = "----------------------------------------------------";

const BLUE: &str = "\x1b[34;20m";
const GREY: &str = "\x1b[38;20m";
const YELLOW: &str = "\x1b[33;20m";
const RED: &str = "\x1b[31;20m";
const RESET: &str = "\x1b[0m";

/// Everything the template needs from a single tracing event.
pub struct LogRecord<'a> {
    pub level: Level,
    pub timestamp: DateTime<Local>,
    pub module: &'a str,
    pub function: &'a str,
    pub line: Option<u32>,
    pub message: String,
}

impl LogRecord<'_> {
    pub fn render(&self) -> String {
        let line = self
            .line
            .map(|line| line.to_string())
            .unwrap_or_else(|| "?".to_string());

        format!(
            "\n[{}] at {}\nModule: {}\nFunction:{}:{}\n{}\n{}\n{}\n",
            level_name(self.level),
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.module,
            self.function,
            line,
            MESSAGE_HEADER,
            self.message,
            MESSAGE_FOOTER,
        )
    }

    pub fn render_colored(&self) -> String {
        format!("{}{}{}", level_color(self.level), self.render(), RESET)
    }
}

pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::TRACE | Level::DEBUG => BLUE,
        Level::INFO => GREY,
        Level::WARN => YELLOW,
        Level::ERROR => RED,
    }
}

/// Collects the `message` field plus any structured fields as `key=value`.
#[derive(Default)]
pub struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    pub fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }

        let fields = self.fields.join(" ");
        if self.message.is_empty() {
            fields
        } else {
            format!("{} {}", self.message, fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
