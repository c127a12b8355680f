/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Ceiling on total active segment time per user per local calendar day.
pub const DAILY_CAP_MINUTES: i64 = 480;
