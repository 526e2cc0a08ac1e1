//! Shared colored output utilities for CLI commands.
//!
//! Uses `termcolor` for cross-platform colored terminal output.
//! Respects `NO_COLOR` environment variable and `--color` flag.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: &str) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        "always" => ColorChoice::Always,
        "never" => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled status writer. Status lines go to stderr so bundle text on stdout
/// stays clean for redirection.
pub struct StyledOutput {
    stderr: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stderr: StandardStream::stderr(choice),
        }
    }

    fn write_styled(&mut self, text: &str, color: Color, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(color)).set_bold(bold);
        let _ = self.stderr.set_color(&spec);
        let _ = write!(self.stderr, "{}", text);
        let _ = self.stderr.reset();
    }

    /// Yellow bold label.
    pub fn warning(&mut self, text: &str) {
        self.write_styled(text, Color::Yellow, true);
    }

    /// Green bold label.
    pub fn success(&mut self, text: &str) {
        self.write_styled(text, Color::Green, true);
    }

    /// Unstyled text.
    pub fn plain(&mut self, text: &str) {
        let _ = write!(self.stderr, "{}", text);
    }
}
