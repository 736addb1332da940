//! Rolling windows for readings and alerts.
//!
//! Both the chart history and the alert log are fixed-capacity FIFO
//! windows; they differ only in capacity and presentation order.

use crate::core::{Alert, Reading};
use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Readings kept for charting (20 retained + the newly appended one)
pub const HISTORY_CAPACITY: usize = 21;

/// Most recent alerts shown to the operator
pub const ALERT_LOG_CAPACITY: usize = 5;

/// Capacity-bounded ordered buffer. Oldest entries are evicted first.
#[derive(Debug, Clone)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be non-zero");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, returning the evicted oldest entry when full
    pub fn push(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        }
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Chart history in insertion order
#[derive(Debug, Clone)]
pub struct History {
    readings: BoundedBuffer<Reading>,
}

impl History {
    pub fn new() -> Self {
        Self {
            readings: BoundedBuffer::new(HISTORY_CAPACITY),
        }
    }

    pub fn push(&mut self, reading: Reading) -> Option<Reading> {
        self.readings.push(reading)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Reading> + ExactSizeIterator {
        self.readings.iter()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.latest()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }

    pub fn to_vec(&self) -> Vec<Reading> {
        self.readings.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for History {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Alert log, presented newest-first
#[derive(Debug, Clone)]
pub struct AlertLog {
    alerts: BoundedBuffer<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self {
            alerts: BoundedBuffer::new(ALERT_LOG_CAPACITY),
        }
    }

    pub fn push(&mut self, alert: Alert) -> Option<Alert> {
        self.alerts.push(alert)
    }

    pub fn extend(&mut self, alerts: impl IntoIterator<Item = Alert>) {
        for alert in alerts {
            self.push(alert);
        }
    }

    /// Newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }

    pub fn to_vec(&self) -> Vec<Alert> {
        self.iter().cloned().collect()
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for AlertLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn alert(n: u32) -> Alert {
        Alert {
            id: Uuid::from_u128(n as u128),
            severity: Severity::Warning,
            message: format!("alert {}", n),
            timestamp: Utc.timestamp_opt(n as i64, 0).unwrap(),
        }
    }

    fn reading(n: u32) -> Reading {
        Reading {
            timestamp: Utc.timestamp_opt(n as i64, 0).unwrap(),
            overlay_accuracy: 1.0,
            focus_stability: 5.0,
            throughput_rate: n,
            temperature_variation: 0.3,
            vibration_level: 0.5,
            vacuum_quality: 1e-6,
        }
    }

    #[test]
    fn test_bounded_buffer_evicts_oldest() {
        let mut buf = BoundedBuffer::new(3);
        assert_eq!(buf.push(1), None);
        assert_eq!(buf.push(2), None);
        assert_eq!(buf.push(3), None);
        assert_eq!(buf.push(4), Some(1));
        assert_eq!(buf.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(buf.latest(), Some(&4));
        assert_eq!(buf.len(), buf.capacity());
    }

    #[test]
    fn test_history_bounded_to_capacity() {
        let mut history = History::new();
        for n in 0..50 {
            history.push(reading(n));
            assert!(history.len() <= HISTORY_CAPACITY);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        // Oldest surviving entry is the 30th pushed
        let rates: Vec<u32> = history.iter().map(|r| r.throughput_rate).collect();
        assert_eq!(rates.first(), Some(&29));
        assert_eq!(rates.last(), Some(&49));
    }

    #[test]
    fn test_alert_log_newest_first() {
        let mut log = AlertLog::new();
        log.extend((0..8).map(alert));

        assert_eq!(log.len(), ALERT_LOG_CAPACITY);
        let messages: Vec<&str> = log.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["alert 7", "alert 6", "alert 5", "alert 4", "alert 3"]
        );
    }

    #[test]
    fn test_alert_log_serializes_newest_first() {
        let mut log = AlertLog::new();
        log.push(alert(1));
        log.push(alert(2));
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json[0]["message"], "alert 2");
        assert_eq!(json[1]["message"], "alert 1");
    }

    #[test]
    fn test_history_serializes_oldest_first() {
        let mut history = History::new();
        history.push(reading(1));
        history.push(reading(2));
        let json = serde_json::to_value(&history).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["throughputRate"], 1);
        assert_eq!(entries[1]["throughputRate"], 2);
        assert_eq!(entries[0]["overlayAccuracy"], 1.0);
        assert!(entries[0].get("vacuumQuality").is_some());
        assert!(entries[0].get("overlay_accuracy").is_none());
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.push(reading(1));
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}
