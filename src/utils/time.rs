use chrono::Utc;

/// Wall-clock milliseconds since the epoch, used for record timestamps and ids.
pub fn time_millis() -> i64 {
    Utc::now().timestamp_millis()
}
