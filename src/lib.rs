//! Run a shell command inside a pseudo-terminal, mirror its output to the
//! invoking terminal as it happens and capture it as a string.
//!
//! ```no_run
//! use std::time::Duration;
//! use ptyexec::{execute_command, ExecRequest};
//!
//! # async fn demo() {
//! let request = ExecRequest::new("ls --color=always")
//!     .timeout(Duration::from_secs(5))
//!     .show_prompt(true)
//!     .prompt_format("[user]@[hostname]:[wd]$");
//!
//! match execute_command(&request).await {
//!     Ok(output) => println!("captured {} bytes", output.len()),
//!     Err(failure) => eprintln!("{failure} ({} bytes before failing)", failure.output.len()),
//! }
//! # }
//! ```

pub mod drain;
pub mod env;
pub mod error;
pub mod executor;
pub mod output;
pub mod prompt;
pub mod pty;
pub mod pump;
pub mod request;
pub mod supervisor;
pub mod terminal;

pub use error::{ExecError, ExecFailure};
pub use executor::{execute_command, execute_with, ExecStreams};
pub use request::ExecRequest;
