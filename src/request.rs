//! Execution request describing a single command run.

use std::time::Duration;

/// Default command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Prompt used when the template is empty.
pub const DEFAULT_PROMPT_FORMAT: &str = "$";

/// Immutable description of one command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    /// Command line handed to `bash -lc`.
    pub command: String,
    /// Upper bound on the command's runtime.
    pub timeout: Duration,
    /// Treat hitting the timeout as the expected, successful outcome.
    pub expect_timeout: bool,
    /// Prepend a synthesized `<prompt> <command>` line to the result.
    pub show_prompt: bool,
    /// Prompt template with `[user]`, `[hostname]` and `[wd]` placeholders.
    pub prompt_format: String,
}

impl ExecRequest {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: DEFAULT_TIMEOUT,
            expect_timeout: false,
            show_prompt: false,
            prompt_format: DEFAULT_PROMPT_FORMAT.to_string(),
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn expect_timeout(mut self, expect: bool) -> Self {
        self.expect_timeout = expect;
        self
    }

    #[must_use]
    pub fn show_prompt(mut self, show: bool) -> Self {
        self.show_prompt = show;
        self
    }

    #[must_use]
    pub fn prompt_format(mut self, format: impl Into<String>) -> Self {
        self.prompt_format = format.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let request = ExecRequest::new("ls")
            .timeout(Duration::from_millis(500))
            .expect_timeout(true)
            .show_prompt(true)
            .prompt_format("[user]>");

        assert_eq!(request.command, "ls");
        assert_eq!(request.timeout, Duration::from_millis(500));
        assert!(request.expect_timeout);
        assert!(request.show_prompt);
        assert_eq!(request.prompt_format, "[user]>");
    }

    #[test]
    fn defaults() {
        let request = ExecRequest::new("true");
        assert_eq!(request.timeout, DEFAULT_TIMEOUT);
        assert!(!request.expect_timeout);
        assert!(!request.show_prompt);
        assert_eq!(request.prompt_format, DEFAULT_PROMPT_FORMAT);
    }
}
