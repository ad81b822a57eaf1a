use std::{
    fmt::Display,
    io::{self, Stderr, Stdout, Write},
    str::FromStr,
};

use chrono::{Local, SecondsFormat};

use crate::config::ConfigError;

pub const DEFAULT_PREFIX: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Could not write to the output")]
    Io(#[from] io::Error),
    #[error("The output is closed")]
    Closed,
}

/// Output the device writes its codes to.
///
/// `write` receives codes that are comfortably valid, `warn` receives codes
/// about to expire (and load-time warnings), `error` receives failures.
pub trait OutputSink {
    fn write(&mut self, text: &str) -> Result<(), SinkError>;
    fn warn(&mut self, text: &str) -> Result<(), SinkError>;
    fn error(&mut self, text: &str) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalColor {
    Red,
    Green,
    Yellow,
    Blue,
    Purple,
    Cyan,
    Gray,
    White,
}

impl TerminalColor {
    pub const ALL: [Self; 8] = [
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Blue,
        Self::Purple,
        Self::Cyan,
        Self::Gray,
        Self::White,
    ];

    pub fn escape_code(&self) -> &'static str {
        match self {
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Blue => "\x1b[34m",
            Self::Purple => "\x1b[35m",
            Self::Cyan => "\x1b[36m",
            Self::Gray => "\x1b[37m",
            Self::White => "\x1b[97m",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Cyan => "cyan",
            Self::Gray => "gray",
            Self::White => "white",
        }
    }
}

impl Display for TerminalColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.escape_code())
    }
}

impl FromStr for TerminalColor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();

        Self::ALL
            .into_iter()
            .find(|color| color.name() == normalized)
            .ok_or_else(|| ConfigError::UnknownColor(s.to_string()))
    }
}

/// Writes each line over the previous one, color-coded by severity.
///
/// Lines look like `\r<color><prefix> [<RFC 3339 time>] <text>`.
#[derive(Debug)]
pub struct Terminal<O = Stdout, E = Stderr> {
    prefix: String,
    default_color: TerminalColor,
    warning_color: TerminalColor,
    error_color: TerminalColor,
    out: O,
    err: E,
}

impl Terminal {
    /// Creates a terminal on stdout/stderr with green, cyan and red output.
    pub fn new() -> Self {
        Self::with_writers(io::stdout(), io::stderr())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write, E: Write> Terminal<O, E> {
    pub fn with_writers(out: O, err: E) -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            default_color: TerminalColor::Green,
            warning_color: TerminalColor::Cyan,
            error_color: TerminalColor::Red,
            out,
            err,
        }
    }

    /// Sets the prefix that identifies this device. Empty prefixes are ignored.
    pub fn with_prefix(&mut self, prefix: &str) -> &mut Self {
        if !prefix.is_empty() {
            self.prefix = prefix.to_string();
        }

        self
    }

    pub fn with_default_color(&mut self, color: TerminalColor) -> &mut Self {
        self.default_color = color;

        self
    }

    pub fn with_warning_color(&mut self, color: TerminalColor) -> &mut Self {
        self.warning_color = color;

        self
    }

    pub fn with_error_color(&mut self, color: TerminalColor) -> &mut Self {
        self.error_color = color;

        self
    }

    pub fn out(&self) -> &O {
        &self.out
    }

    pub fn err(&self) -> &E {
        &self.err
    }

    fn render<W: Write>(
        writer: &mut W,
        color: TerminalColor,
        prefix: &str,
        text: &str,
    ) -> Result<(), SinkError> {
        let now = Local::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        write!(writer, "\r{color}{prefix} [{now}] {text}")?;
        writer.flush()?;

        Ok(())
    }
}

impl<O: Write, E: Write> OutputSink for Terminal<O, E> {
    fn write(&mut self, text: &str) -> Result<(), SinkError> {
        Self::render(&mut self.out, self.default_color, &self.prefix, text)
    }

    fn warn(&mut self, text: &str) -> Result<(), SinkError> {
        Self::render(&mut self.out, self.warning_color, &self.prefix, text)
    }

    fn error(&mut self, text: &str) -> Result<(), SinkError> {
        Self::render(&mut self.err, self.error_color, &self.prefix, text)
    }
}
