//! # Bill Numbers
//!
//! Human-facing bill ids of the form `BILL-<epoch millis>-<device code>`.
//!
//! ```text
//!   BILL-1760512345678-01
//!   ──── ───────────── ──
//!    │         │        └─ device / till code (config)
//!    │         └─ milliseconds since epoch, strictly increasing per process
//!    └─ prefix (config)
//! ```
//!
//! Two checkouts in the same millisecond on one till get consecutive
//! numbers; distinct tills are kept apart by the device code.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Default bill number prefix.
pub const DEFAULT_BILL_PREFIX: &str = "BILL";

/// Generates sortable, process-unique bill ids.
#[derive(Debug)]
pub struct BillIdGenerator {
    prefix: String,
    device_code: String,
    last_millis: AtomicI64,
}

impl BillIdGenerator {
    pub fn new(prefix: impl Into<String>, device_code: impl Into<String>) -> Self {
        BillIdGenerator {
            prefix: prefix.into(),
            device_code: device_code.into(),
            last_millis: AtomicI64::new(0),
        }
    }

    /// Next bill id for a bill dated `now`.
    ///
    /// ```rust
    /// use billbook_core::BillIdGenerator;
    /// use chrono::Utc;
    ///
    /// let ids = BillIdGenerator::new("BILL", "01");
    /// let now = Utc::now();
    /// let a = ids.next(now);
    /// let b = ids.next(now);
    /// assert!(a.starts_with("BILL-") && a.ends_with("-01"));
    /// assert!(b > a);
    /// ```
    pub fn next(&self, now: DateTime<Utc>) -> String {
        let wanted = now.timestamp_millis();
        let mut last = self.last_millis.load(Ordering::Relaxed);
        let stamp = loop {
            let candidate = wanted.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break candidate,
                Err(actual) => last = actual,
            }
        };
        format!("{}-{}-{}", self.prefix, stamp, self.device_code)
    }
}

impl Default for BillIdGenerator {
    fn default() -> Self {
        BillIdGenerator::new(DEFAULT_BILL_PREFIX, "01")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_format() {
        let ids = BillIdGenerator::new("BILL", "07");
        let at = DateTime::from_timestamp_millis(1_760_512_345_678).unwrap();
        assert_eq!(ids.next(at), "BILL-1760512345678-07");
    }

    #[test]
    fn test_same_millisecond_is_still_increasing() {
        let ids = BillIdGenerator::default();
        let at = Utc::now();
        let mut previous = ids.next(at);
        for _ in 0..100 {
            let next = ids.next(at);
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_clock_going_backwards_does_not_repeat() {
        let ids = BillIdGenerator::default();
        let later = DateTime::from_timestamp_millis(2_000_000_000_000).unwrap();
        let earlier = DateTime::from_timestamp_millis(1_000_000_000_000).unwrap();
        let a = ids.next(later);
        let b = ids.next(earlier);
        assert!(b > a);
    }

    #[test]
    fn test_unique_across_threads() {
        let ids = Arc::new(BillIdGenerator::default());
        let at = Utc::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next(at)).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
