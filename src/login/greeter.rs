//! Login Greeter
//!
//! Prompts for credentials on the console and hands them to a connect
//! callback, retrying on authentication failure up to a fixed number of
//! attempts. The username may carry a `DOMAIN\user` prefix; the desired
//! session size is entered as `WIDTHxHEIGHT` or left empty.

use crate::login::editor::{EchoMode, LineEditor};
use crate::login::error::{LoginError, Result};
use std::io::{Read, Write};
use tracing::{info, warn};

/// Default number of login attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Desired size of the session desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Let the session side pick
    #[default]
    Unspecified,
    /// An explicit size in pixels
    Fixed {
        /// Width in pixels
        width: u16,
        /// Height in pixels
        height: u16,
    },
}

/// Parse a `WIDTHxHEIGHT` resolution entry. Zero dimensions and anything
/// malformed are rejected.
pub fn parse_resolution(entry: &str) -> Option<Resolution> {
    let (width, height) = entry.trim().split_once(['x', 'X'])?;
    let width: u16 = width.parse().ok()?;
    let height: u16 = height.parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Resolution::Fixed { width, height })
}

/// Credentials gathered from one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Domain prefix, when the username was entered as `DOMAIN\user`
    pub domain: Option<String>,
    /// Username without the domain prefix
    pub username: String,
    /// Password as entered
    pub password: String,
    /// Requested session size
    pub size: Resolution,
}

/// The interactive login prompt.
#[derive(Debug, Clone)]
pub struct Greeter {
    banner: String,
    max_attempts: u32,
}

impl Greeter {
    /// Create a greeter with the given banner line.
    pub fn new(banner: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            banner: banner.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run the prompt loop until `connect` succeeds or the attempts are
    /// exhausted.
    ///
    /// `connect` receives the gathered credentials and returns the
    /// established session on success, `None` on authentication failure.
    /// Transport errors on the console abort immediately.
    pub fn run<R: Read, W: Write, T>(
        &self,
        reader: R,
        writer: W,
        mut connect: impl FnMut(&Credentials) -> Option<T>,
    ) -> Result<T> {
        let mut editor = LineEditor::new(reader, writer);
        editor.write_line(&self.banner)?;
        editor.write_line("")?;

        for attempt in 1..=self.max_attempts {
            let entered = editor.read_line("Username: ", EchoMode::Plain)?;
            let entered = entered.trim();
            if entered.is_empty() {
                continue;
            }
            let password = editor.read_line("Password: ", EchoMode::Masked)?;

            let size_entry = editor.read_line(
                "Resolution (WIDTHxHEIGHT, empty for automatic): ",
                EchoMode::Plain,
            )?;
            let size = if size_entry.trim().is_empty() {
                Resolution::Unspecified
            } else {
                match parse_resolution(&size_entry) {
                    Some(size) => size,
                    None => {
                        editor.write_line("Invalid resolution, using automatic.")?;
                        Resolution::Unspecified
                    }
                }
            };

            let (domain, username) = match entered.split_once('\\') {
                Some((domain, user)) => (Some(domain.to_string()), user.to_string()),
                None => (None, entered.to_string()),
            };
            let credentials = Credentials {
                domain,
                username,
                password,
                size,
            };

            info!(attempt, user = %credentials.username, "attempting login");
            editor.write_line("Connecting...")?;
            match connect(&credentials) {
                Some(session) => return Ok(session),
                None => {
                    warn!(attempt, user = %credentials.username, "login failed");
                    editor.write_line("Login failed.")?;
                    editor.write_line("")?;
                }
            }
        }
        Err(LoginError::AttemptsExhausted(self.max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn input(lines: &[&str]) -> Cursor<Vec<u8>> {
        let mut bytes = Vec::new();
        for line in lines {
            bytes.extend_from_slice(line.as_bytes());
            bytes.push(b'\r');
        }
        Cursor::new(bytes)
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(
            parse_resolution("1024x768"),
            Some(Resolution::Fixed { width: 1024, height: 768 })
        );
        assert_eq!(
            parse_resolution(" 800X600 "),
            Some(Resolution::Fixed { width: 800, height: 600 })
        );
        assert_eq!(parse_resolution("0x600"), None);
        assert_eq!(parse_resolution("800x0"), None);
        assert_eq!(parse_resolution("800"), None);
        assert_eq!(parse_resolution("wide x tall"), None);
        assert_eq!(parse_resolution("-1x600"), None);
    }

    #[test]
    fn test_successful_login() {
        let greeter = Greeter::new("Welcome", 5);
        let creds = greeter
            .run(input(&["alice", "secret", "1280x720"]), Vec::new(), |c| {
                Some(c.clone())
            })
            .unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.domain, None);
        assert_eq!(creds.password, "secret");
        assert_eq!(creds.size, Resolution::Fixed { width: 1280, height: 720 });
    }

    #[test]
    fn test_domain_split() {
        let greeter = Greeter::new("Welcome", 5);
        let creds = greeter
            .run(input(&["CORP\\bob", "pw", ""]), Vec::new(), |c| Some(c.clone()))
            .unwrap();
        assert_eq!(creds.domain.as_deref(), Some("CORP"));
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.size, Resolution::Unspecified);
    }

    #[test]
    fn test_invalid_resolution_falls_back() {
        let greeter = Greeter::new("Welcome", 5);
        let creds = greeter
            .run(input(&["u", "p", "huge"]), Vec::new(), |c| Some(c.clone()))
            .unwrap();
        assert_eq!(creds.size, Resolution::Unspecified);
    }

    #[test]
    fn test_retry_until_success() {
        let greeter = Greeter::new("Welcome", 5);
        let mut calls = 0;
        let creds = greeter
            .run(
                input(&["u", "wrong", "", "u", "right", ""]),
                Vec::new(),
                |c| {
                    calls += 1;
                    (c.password == "right").then(|| c.clone())
                },
            )
            .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(creds.password, "right");
    }

    #[test]
    fn test_attempts_exhausted() {
        let greeter = Greeter::new("Welcome", 2);
        let result = greeter.run(
            input(&["u", "p", "", "u", "p", ""]),
            Vec::new(),
            |_| None::<()>,
        );
        assert!(matches!(result, Err(LoginError::AttemptsExhausted(2))));
    }

    #[test]
    fn test_empty_username_reprompts_without_burning_connect() {
        let greeter = Greeter::new("Welcome", 2);
        let mut calls = 0;
        let result = greeter.run(input(&["", "u", "p", ""]), Vec::new(), |_| {
            calls += 1;
            Some(())
        });
        // The empty entry consumed an attempt but not a connect call
        assert!(result.is_ok());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_transport_error_aborts() {
        let greeter = Greeter::new("Welcome", 5);
        // Input ends mid-prompt
        let result = greeter.run(Cursor::new(b"ali".to_vec()), Vec::new(), |_| Some(()));
        assert!(matches!(result, Err(LoginError::Io(_))));
    }
}
