use std::time::SystemTime;

pub(crate) trait UnixTimestampExt {
    fn to_unix_timestamp(&self) -> i64;
}

impl UnixTimestampExt for SystemTime {
    /// Seconds since the unix epoch; instants before the epoch go negative
    #[allow(clippy::cast_possible_wrap)]
    fn to_unix_timestamp(&self) -> i64 {
        match self.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(duration) => duration.as_secs() as i64,
            Err(err) => -(err.duration().as_secs() as i64),
        }
    }
}
