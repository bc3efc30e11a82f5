//! Typed client commands.
//!
//! Parsing is total: every line maps to some [`Command`]. Argument checks
//! that depend on session state (is the nickname valid, is the sender
//! registered) are left to the caller, so the parser never rejects a
//! nickname on its own.

use std::fmt;

const REGISTER: &str = "/register";
const CHANGE_NICK: &str = "/change_nick";
const QUIT: &str = "/quit";
const SHUTDOWN: &str = "/shutdown";

/// A command whose argument was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// `/register` without a nickname.
    Register,
    /// `/change_nick` without a nickname.
    ChangeNick,
}

impl Usage {
    /// The command name, without the leading slash.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::ChangeNick => "change_nick",
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed client line, borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `/register <nick>`
    Register(&'a str),
    /// `/change_nick <nick>`
    ChangeNick(&'a str),
    /// `/quit`
    Quit,
    /// `/shutdown`
    Shutdown,
    /// `<to> <body>`
    DirectMessage {
        /// Recipient nickname.
        to: &'a str,
        /// Everything after the first space.
        body: &'a str,
    },
    /// A known command missing its argument.
    Usage(Usage),
    /// Anything else: no space and not a known command.
    Unrecognized,
}

impl<'a> Command<'a> {
    /// Parse a raw line. Surrounding whitespace is ignored.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();

        if line.starts_with(REGISTER) {
            return match argument(line) {
                Some(nick) => Command::Register(nick),
                None => Command::Usage(Usage::Register),
            };
        }
        if line.starts_with(CHANGE_NICK) {
            return match argument(line) {
                Some(nick) => Command::ChangeNick(nick),
                None => Command::Usage(Usage::ChangeNick),
            };
        }
        if line == QUIT {
            return Command::Quit;
        }
        if line == SHUTDOWN {
            return Command::Shutdown;
        }

        match line.split_once(' ') {
            Some((to, body)) => Command::DirectMessage { to, body },
            None => Command::Unrecognized,
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Register(_) => "register",
            Command::ChangeNick(_) => "change_nick",
            Command::Quit => "quit",
            Command::Shutdown => "shutdown",
            Command::DirectMessage { .. } => "message",
            Command::Usage(_) => "usage",
            Command::Unrecognized => "unrecognized",
        }
    }
}

/// Everything after the first whitespace run, trimmed.
fn argument(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}
