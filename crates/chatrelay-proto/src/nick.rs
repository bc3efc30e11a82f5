//! Nickname validation.
//!
//! A nickname is any non-empty string without whitespace. Comparison is
//! exact: `Alice` and `alice` are different users.

/// The only nickname allowed to shut the server down.
pub const ADMIN_NICK: &str = "admin";

/// Extension trait for checking if a string is a usable nickname.
pub trait NickExt {
    /// `true` when non-empty and free of any Unicode whitespace.
    ///
    /// ```
    /// use chatrelay_proto::NickExt;
    ///
    /// assert!("alice".is_valid_nick());
    /// assert!("Ålice_42!".is_valid_nick());
    /// assert!(!"".is_valid_nick());
    /// assert!(!"al ice".is_valid_nick());
    /// assert!(!"al\tice".is_valid_nick());
    /// ```
    fn is_valid_nick(&self) -> bool;

    /// `true` for the administrator identity.
    fn is_admin_nick(&self) -> bool;
}

impl NickExt for str {
    fn is_valid_nick(&self) -> bool {
        !self.is_empty() && !self.chars().any(char::is_whitespace)
    }

    fn is_admin_nick(&self) -> bool {
        self == ADMIN_NICK
    }
}
