use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::error::ImportError;
use crate::model::credentials::{Credentials, Secret};

const CONFIRM_PROMPT: &str = "Do you want to proceed with creating these Jira tickets? (yes/no): ";
const AFFIRMATIVE: &str = "yes";

/// Environment variables consulted for the login name, in order.
const USER_ENV_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

/// Ask once whether to proceed. Only "yes" (any case) proceeds; anything else, including
/// end of input, declines without re-prompting.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<bool> {
    write!(out, "{CONFIRM_PROMPT}")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(AFFIRMATIVE)
}

/// Collect the username (configured or from the OS) and prompt for the password without echo.
pub fn collect_credentials(username: Option<&str>) -> Result<Credentials, ImportError> {
    let username = match username {
        Some(name) => name.to_string(),
        None => os_username().ok_or_else(|| {
            ImportError::Input("cannot determine the current user name; set jira.username".into())
        })?,
    };

    let mut stdout = io::stdout();
    write!(stdout, "Jira Password for {username}: ").map_err(input_error)?;
    stdout.flush().map_err(input_error)?;

    let stdin = io::stdin();
    let secret = if stdin.is_terminal() {
        read_secret_from_terminal()?
    } else {
        read_secret_line(&mut stdin.lock())?
    };

    tracing::debug!(%username, "collected credentials");
    Ok(Credentials { username, secret })
}

/// Read a secret as one line, for when stdin is a pipe rather than a terminal.
pub fn read_secret_line<R: BufRead>(input: &mut R) -> Result<Secret, ImportError> {
    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(input_error)?;
    if read == 0 {
        return Err(ImportError::Input("input closed before a password was entered".into()));
    }
    Ok(Secret::new(line.trim_end_matches(['\r', '\n'])))
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn read_secret_from_terminal() -> Result<Secret, ImportError> {
    let mut secret = String::new();
    let entered = {
        let _raw = RawModeGuard::enable().map_err(input_error)?;
        loop {
            let key = match event::read().map_err(input_error)? {
                Event::Key(key) if key.kind != KeyEventKind::Release => key,
                _ => continue,
            };
            match secret_key_action(&key) {
                SecretKey::Submit => break true,
                SecretKey::Abort => break false,
                SecretKey::Erase => {
                    secret.pop();
                }
                SecretKey::Push(c) => secret.push(c),
                SecretKey::Ignore => {}
            }
        }
    };
    println!();

    if entered {
        Ok(Secret::new(secret))
    } else {
        Err(ImportError::Input("password entry aborted".into()))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SecretKey {
    Submit,
    Abort,
    Erase,
    Push(char),
    Ignore,
}

fn secret_key_action(key: &KeyEvent) -> SecretKey {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => SecretKey::Abort,
            _ => SecretKey::Ignore,
        };
    }
    match key.code {
        KeyCode::Enter => SecretKey::Submit,
        KeyCode::Esc => SecretKey::Abort,
        KeyCode::Backspace => SecretKey::Erase,
        KeyCode::Char(c) => SecretKey::Push(c),
        _ => SecretKey::Ignore,
    }
}

/// Login name of the current user: environment first, then the password database.
pub fn os_username() -> Option<String> {
    username_from_env(|var| std::env::var(var).ok()).or_else(passwd_username)
}

fn username_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    USER_ENV_VARS
        .iter()
        .filter_map(|&var| lookup(var))
        .find(|name| !name.is_empty())
}

#[cfg(unix)]
fn passwd_username() -> Option<String> {
    let mut buf = vec![0 as libc::c_char; 4096];
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let rc = unsafe {
        libc::getpwuid_r(
            libc::getuid(),
            &mut pwd,
            buf.as_mut_ptr(),
            buf.len(),
            &mut result,
        )
    };
    if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
        return None;
    }
    let name = unsafe { std::ffi::CStr::from_ptr(pwd.pw_name) };
    Some(name.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn passwd_username() -> Option<String> {
    None
}

fn input_error(e: io::Error) -> ImportError {
    ImportError::Input(e.to_string())
}
