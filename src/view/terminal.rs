use std::io::Write;
use std::sync::Mutex;

use crate::auth::credentials::Field;
use crate::controller::FormState;
use crate::view::FormView;

/// Line-oriented view for running the sign-in flow in a terminal
pub struct TerminalView<W: Write + Send> {
    out: Mutex<W>,
    /// Last error line printed, so re-renders don't repeat it
    last_error: Mutex<Option<String>>,
}

impl TerminalView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            last_error: Mutex::new(None),
        }
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut out) = self.out.lock() {
            // Terminal output is best effort
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }

    /// Consume the view and return the writer
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> FormView for TerminalView<W> {
    fn render(&self, state: &FormState) {
        if state.loading {
            self.write_line("Signing in...");
        }

        if let Some(validation) = &state.validation {
            self.write_line(&format!("{}: {}", validation.field, validation.message));
        }

        let Ok(mut last_error) = self.last_error.lock() else {
            return;
        };
        if *last_error != state.error_message {
            if let Some(error) = &state.error_message {
                self.write_line(error);
            }
            *last_error = state.error_message.clone();
        }
    }

    fn focus(&self, field: Field) {
        if let Ok(mut out) = self.out.lock() {
            let _ = write!(out, "{}: ", field);
            let _ = out.flush();
        }
    }

    fn notify_success(&self, message: &str) {
        self.write_line(message);
    }
}
