use std::io::Write;
use std::time::Duration;

use clap::Parser;
use ptyexec::{execute_command, ExecRequest};

use crate::args::CliArgs;
use crate::config::{load_config, ExecConfig};
use crate::logging::init_logging;

/// Run the CLI and return the process exit code.
pub async fn run() -> anyhow::Result<i32> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.clone())?;
    let _logger = init_logging(&loaded.config.logging, &loaded.paths)?;

    let request = build_request(&args, &loaded.config.exec);
    log::info!(
        "running {:?} (timeout {}ms, expect_timeout {})",
        request.command,
        request.timeout.as_millis(),
        request.expect_timeout
    );

    let result = execute_command(&request).await;
    let mut stdout = std::io::stdout();
    match result {
        Ok(output) => {
            if args.print {
                writeln!(stdout, "\r\n---\r\n{}", output.replace('\n', "\r\n"))?;
            }
            stdout.flush()?;
            Ok(0)
        }
        Err(failure) => {
            log::warn!("{failure}");
            stdout.flush()?;
            eprintln!(
                "\r\nptyexec: {failure} ({} bytes of output captured)",
                failure.output.len()
            );
            Ok(1)
        }
    }
}

/// Merge command-line flags over the configured defaults.
fn build_request(args: &CliArgs, config: &ExecConfig) -> ExecRequest {
    ExecRequest::new(args.command_line())
        .timeout(Duration::from_millis(args.timeout.unwrap_or(config.timeout_ms)))
        .expect_timeout(args.expect_timeout || config.expect_timeout)
        .show_prompt(args.show_prompt || config.show_prompt)
        .prompt_format(
            args.prompt_format
                .clone()
                .unwrap_or_else(|| config.prompt_format.clone()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = CliArgs::parse_from(["ptyexec", "--timeout", "20", "--prompt-format", ">", "ls"]);
        let config = ExecConfig {
            timeout_ms: 5_000,
            expect_timeout: true,
            show_prompt: true,
            prompt_format: "[user]$".to_string(),
        };

        let request = build_request(&args, &config);
        assert_eq!(request.command, "ls");
        assert_eq!(request.timeout, Duration::from_millis(20));
        assert!(request.expect_timeout);
        assert!(request.show_prompt);
        assert_eq!(request.prompt_format, ">");
    }

    #[test]
    fn config_fills_missing_flags() {
        let args = CliArgs::parse_from(["ptyexec", "true"]);
        let request = build_request(&args, &ExecConfig::default());
        assert_eq!(request.timeout, Duration::from_millis(10_000));
        assert!(!request.show_prompt);
        assert_eq!(request.prompt_format, "$");
    }
}
