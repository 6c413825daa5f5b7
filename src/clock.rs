use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use time::{OffsetDateTime, UtcOffset};

use crate::db::unix_millis;

pub type SharedClock = Arc<dyn Clock>;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;

    fn now_millis(&self) -> i64 {
        unix_millis(self.now())
    }
}

impl<C: Clock> Clock for Arc<C> {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }

    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Wall clock at a fixed offset. `time` can only look up the local offset
/// while the process is single-threaded, so `local` must run before the
/// runtime starts; later calls fall back to UTC.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> SystemClock {
        SystemClock { offset }
    }

    pub fn local() -> SystemClock {
        SystemClock::new(UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new(UtcOffset::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(millis: i64) -> ManualClock {
        ManualClock { millis: AtomicI64::new(millis) }
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        let nanos = self.millis.load(Ordering::SeqCst) as i128 * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_millis(), 1_000);
        assert_eq!(unix_millis(clock.now()), 1_000);

        clock.advance(Duration::from_secs(10));
        assert_eq!(clock.now_millis(), 11_000);

        clock.set(5);
        assert_eq!(clock.now_millis(), 5);
    }

    #[test]
    fn system_clock_reports_in_its_offset() {
        let offset = UtcOffset::from_hms(-3, 0, 0).unwrap();
        let now = SystemClock::new(offset).now();

        assert_eq!(now.offset(), offset);
        assert_eq!(SystemClock::default().now().offset(), UtcOffset::UTC);
    }
}
