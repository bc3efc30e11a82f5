//! Server-to-client lines.
//!
//! Every text the daemon writes to a client lives here so the client-facing
//! wording is defined in one place. Lines carry no terminator; the codec
//! appends `\n`.

#![allow(missing_docs)]

/// Sent once on connect.
pub const WELCOME: &str = "\
Welcome to the chat!
Commands:
/register <nickname>        Register with a nickname
/change_nick <new_nickname> Change your nickname
/quit                       Quit the chat
/shutdown                   Shutdown the server (admin only)
To send a message, use the format: <recipient_nickname> <message>";

pub const REGISTER_USAGE: &str = "Usage: /register <nickname>";
pub const CHANGE_NICK_USAGE: &str = "Usage: /change_nick <new_nickname>";
pub const ALREADY_REGISTERED: &str =
    "You are already registered. Use /change_nick <new_nickname> to change your nickname.";
pub const NICK_HAS_SPACES: &str = "Nickname cannot contain spaces.";
pub const NICK_TAKEN_ON_REGISTER: &str =
    "This nickname is already taken. Please choose another one.";
pub const NICK_TAKEN_ON_CHANGE: &str = "This nickname is already taken.";
pub const REGISTER_FIRST: &str = "You need to register first using /register <nickname>";
pub const GOODBYE: &str = "Goodbye!";
pub const SHUTTING_DOWN: &str = "Shutting down server...";
pub const SHUTDOWN_NOTICE: &str = "Server is shutting down...";
pub const SHUTDOWN_DENIED: &str = "You do not have permission to shut down the server.";
pub const MESSAGE_REGISTER_FIRST: &str = "Please register first using /register <nickname>";
pub const INVALID_FORMAT: &str = "Invalid format. Use <recipient_nickname> <message>";
pub const MESSAGE_SENT: &str = "Message sent successfully.";
pub const USER_NOT_FOUND: &str = "User not found";

/// `You are registered as <nick>`
pub fn registered(nick: &str) -> String {
    format!("You are registered as {nick}")
}

/// `You changed your nickname to <nick>`
pub fn nick_changed(nick: &str) -> String {
    format!("You changed your nickname to {nick}")
}

/// The line a recipient sees: `<from> says: <body>`
pub fn says(from: &str, body: &str) -> String {
    format!("{from} says: {body}")
}

/// `Line too long (max <n> bytes).`
pub fn line_too_long(limit: usize) -> String {
    format!("Line too long (max {limit} bytes).")
}
