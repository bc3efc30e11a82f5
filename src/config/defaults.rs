//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_port() -> u16 {
    12345
}

pub fn default_buffer_size() -> usize {
    1024
}

pub fn default_log_level() -> String {
    "INFO".to_string()
}
