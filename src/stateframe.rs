//! Telemetry snapshots handed to the external stateframe serializer.
//!
//! A [`Stateframe`] is a nested mapping: top-level device keys (`AXIS1`,
//! `LNAS`, ...) holding records of register readings. It is rebuilt on every
//! poll and never cached. Decode failures are tolerated (the reading
//! defaults to zero) but counted in [`Stateframe::decode_failures`] so a
//! consumer can tell a genuine zero from a swallowed parse error.

use std::collections::BTreeMap;

/// One value in a telemetry snapshot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Reading {
    /// Status bit or integer register.
    Int(i64),
    /// Scaled position, current, voltage or integrator term.
    Float(f64),
    /// Named sub-record.
    Record(Record),
    /// Ordered list (e.g. one record per amplifier).
    List(Vec<Reading>),
}

/// A named set of readings.
pub type Record = BTreeMap<String, Reading>;

impl Reading {
    /// Integer value, if this is an integer reading.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value, if this is a float reading.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Sub-record, if this reading is one.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// List elements, if this reading is a list.
    pub fn as_list(&self) -> Option<&[Reading]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }
}

/// Snapshot produced by a single telemetry poll.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Stateframe {
    /// Top-level entries keyed by device section. Serialized inline, so
    /// `AXIS1`, `LNAS` and friends sit at the top level of the JSON object.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub entries: Record,
    /// Register replies that failed to decode and were defaulted to zero.
    pub decode_failures: usize,
}

impl Stateframe {
    /// Empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a top-level entry.
    pub fn insert(&mut self, key: impl Into<String>, reading: Reading) {
        self.entries.insert(key.into(), reading);
    }

    /// Look up a top-level entry.
    pub fn get(&self, key: &str) -> Option<&Reading> {
        self.entries.get(key)
    }

    /// Fold another snapshot into this one. Keys from `other` win.
    pub fn merge(&mut self, other: Stateframe) {
        self.entries.extend(other.entries);
        self.decode_failures += other.decode_failures;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_failures() {
        let mut a = Stateframe::new();
        a.insert("AXIS1", Reading::Record(Record::new()));
        a.decode_failures = 2;

        let mut b = Stateframe::new();
        b.insert("LNAS", Reading::List(vec![]));
        b.decode_failures = 1;

        a.merge(b);
        assert_eq!(a.decode_failures, 3);
        assert!(a.get("AXIS1").is_some());
        assert!(a.get("LNAS").is_some());
    }

    #[test]
    fn accessors() {
        assert_eq!(Reading::Int(1).as_int(), Some(1));
        assert_eq!(Reading::Int(1).as_float(), None);
        assert_eq!(Reading::Float(0.5).as_float(), Some(0.5));
        assert!(Reading::List(vec![]).as_list().is_some());
        assert!(Reading::Record(Record::new()).as_record().is_some());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_plain_nested_json() {
        let mut axis = Record::new();
        axis.insert("INPOS".into(), Reading::Int(1));
        axis.insert("ACTUALMPOS".into(), Reading::Float(2.5));
        let mut frame = Stateframe::new();
        frame.insert("AXIS1", Reading::Record(axis));

        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(
            json,
            r#"{"AXIS1":{"ACTUALMPOS":2.5,"INPOS":1},"decode_failures":0}"#
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn device_keys_are_top_level() {
        let mut frame = Stateframe::new();
        frame.insert("AXIS1", Reading::Record(Record::new()));
        frame.insert("LNAS", Reading::List(vec![Reading::Float(0.5)]));
        frame.decode_failures = 2;

        let json = serde_json::to_value(&frame).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.get("AXIS1").unwrap().is_object());
        assert_eq!(object["LNAS"], serde_json::json!([0.5]));
        assert_eq!(object["decode_failures"], 2);
        assert!(object.get("entries").is_none());
    }
}
