//! Child process environment.

use std::ffi::{OsStr, OsString};

/// Value that makes `sudo -A` fail instead of prompting on the terminal.
pub const SUDO_ASKPASS_VALUE: &str = "/bin/false";

/// Terminal type advertised to the child.
pub const CHILD_TERM: &str = "xterm-256color";

/// Build the environment for the child from the current process
/// environment.
///
/// Names and values are carried as `OsString`, so entries that are not
/// valid UTF-8 pass through untouched. `SUDO_ASKPASS` is forced so
/// privilege prompts fail non-interactively. An existing `TERM` is
/// overwritten in place; otherwise `TERM` and `COLORTERM=truecolor` are
/// appended.
pub fn build_child_env<I, K, V>(current: I) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let mut env: Vec<(OsString, OsString)> = current
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();

    set_or_append(&mut env, "SUDO_ASKPASS", SUDO_ASKPASS_VALUE);

    match position(&env, "TERM") {
        Some(index) => env[index].1 = CHILD_TERM.into(),
        None => {
            env.push(("TERM".into(), CHILD_TERM.into()));
            env.push(("COLORTERM".into(), "truecolor".into()));
        }
    }

    env
}

/// Environment of the current process, built into a child environment.
pub fn child_env_from_process() -> Vec<(OsString, OsString)> {
    build_child_env(std::env::vars_os())
}

fn position(env: &[(OsString, OsString)], key: &str) -> Option<usize> {
    env.iter().position(|(k, _)| k.as_os_str() == OsStr::new(key))
}

fn set_or_append(env: &mut Vec<(OsString, OsString)>, key: &str, value: &str) {
    match position(env, key) {
        Some(index) => env[index].1 = value.into(),
        None => env.push((key.into(), value.into())),
    }
}
