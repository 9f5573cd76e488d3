//! Tunables shared by the library and the reference host.

/// Target process identification.
pub mod process {
    /// Executable name without the `.exe` suffix.
    pub const PROCESS_NAME: &str = "Bug Fables";
}

/// Host polling cadence.
///
/// LiveSplit-style hosts poll at roughly 60 Hz; each tick performs at most
/// one hook and one decision query.
pub mod polling {
    use std::time::Duration;

    /// Default delay (in ms) between ticks.
    pub const DEFAULT_INTERVAL_MS: u64 = 16;

    /// Smallest accepted tick delay (in ms).
    pub const MIN_INTERVAL_MS: u64 = 1;

    /// Delay between attempts while no process is bound.
    pub const UNBOUND_RETRY: Duration = Duration::from_secs(1);
}

/// Diagnostic log file.
pub mod log {
    /// Default file name, created next to the working directory.
    pub const DEFAULT_FILE_NAME: &str = "fables-splitter-log.txt";

    /// A log whose header is older than this is truncated on open.
    pub const MAX_AGE_DAYS: i64 = 30;

    /// Timestamp format used for entries and the header.
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// First line of every log file, followed by the creation timestamp.
    pub const HEADER_PREFIX: &str = "# fables-splitter log created ";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polling_constants() {
        assert!(polling::DEFAULT_INTERVAL_MS >= polling::MIN_INTERVAL_MS);
        assert_eq!(polling::UNBOUND_RETRY.as_secs(), 1);
    }

    #[test]
    fn test_log_constants() {
        assert_eq!(log::MAX_AGE_DAYS, 30);
        assert!(log::HEADER_PREFIX.starts_with('#'));
    }
}
