use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ptyexec",
    about = "Run a command in a pseudo-terminal, showing it live and capturing its output"
)]
pub struct CliArgs {
    /// Command line passed to `bash -lc`.
    #[arg(
        index = 1,
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
    /// Timeout in milliseconds.
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,
    /// Treat reaching the timeout as success.
    #[arg(long)]
    pub expect_timeout: bool,
    /// Prepend a synthesized prompt line to the captured output.
    #[arg(long)]
    pub show_prompt: bool,
    /// Prompt template; supports [user], [hostname] and [wd].
    #[arg(long)]
    pub prompt_format: Option<String>,
    /// Print the captured result after the command finishes.
    #[arg(long)]
    pub print: bool,
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}
