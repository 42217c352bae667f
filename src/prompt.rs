//! Synthesized shell prompt line.

use std::path::Path;

use crate::request::DEFAULT_PROMPT_FORMAT;

const FALLBACK_USER: &str = "user";
const FALLBACK_HOST: &str = "host";
const FALLBACK_WD: &str = "~";

/// Values substituted into a prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub user: String,
    pub hostname: String,
    pub working_dir: String,
}

impl PromptContext {
    /// Collect user, host name and working directory from the running
    /// process, falling back to fixed placeholders.
    pub fn from_process() -> Self {
        let user = std::env::var("USER")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| FALLBACK_USER.to_string());

        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| FALLBACK_HOST.to_string());

        let working_dir = match std::env::current_dir() {
            Ok(dir) => {
                let home = std::env::var("HOME").ok();
                home_relative(&dir, home.as_deref())
            }
            Err(_) => FALLBACK_WD.to_string(),
        };

        Self {
            user,
            hostname,
            working_dir,
        }
    }

    /// Substitute `[user]`, `[hostname]` and `[wd]` into `template`.
    pub fn render(&self, template: &str) -> String {
        let template = if template.is_empty() {
            DEFAULT_PROMPT_FORMAT
        } else {
            template
        };
        template
            .replace("[user]", &self.user)
            .replace("[hostname]", &self.hostname)
            .replace("[wd]", &self.working_dir)
    }

    /// `"<prompt> <command>\n"`.
    pub fn prompt_line(&self, template: &str, command: &str) -> String {
        format!("{} {command}\n", self.render(template))
    }
}

/// Replace a leading `home` with `~` when `dir` is home or lies below it.
pub fn home_relative(dir: &Path, home: Option<&str>) -> String {
    let dir = dir.to_string_lossy();
    let Some(home) = home.filter(|h| !h.is_empty()) else {
        return dir.into_owned();
    };
    match dir.strip_prefix(home) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("~{rest}"),
        _ => dir.into_owned(),
    }
}
