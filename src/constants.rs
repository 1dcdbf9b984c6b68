use std::time::Duration;

/// How often the scheduler runs a celebration pass
pub const SCAN_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// How long a member keeps the birthday role after being celebrated
pub const BIRTHDAY_ROLE_HOURS: i64 = 24;

/// Earliest accepted birth year
pub const MIN_BIRTH_YEAR: i32 = 1900;

/// Default number of entries shown by `/birthday upcoming`
pub const DEFAULT_UPCOMING_LIMIT: usize = 10;

/// Default location of the birthday data file
pub const DEFAULT_DATA_FILE: &str = "data/birthdays.json";

/// Default timezone used to decide what "today" is
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Audit log reason attached to role grants and removals
pub const ROLE_AUDIT_REASON: &str = "Birthday celebration";

/// Log directive for the application
pub const LOG_DIRECTIVE: &str = "birthday_bot=info";
