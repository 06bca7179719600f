//! Chronological, day-grouped view of all records.
//!
//! Ordering is deterministic: days descending, records within a day by
//! timestamp descending, ties broken by id descending. Days are local
//! calendar days derived from each record's timestamp.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::Record;

/// One calendar day's records, newest-first
#[derive(Debug, Clone, Serialize)]
pub struct TimelineDay {
    pub day: NaiveDate,
    pub records: Vec<Record>,
}

/// The full day-grouped timeline, newest day first
#[derive(Debug, Clone, Default, Serialize)]
pub struct Timeline {
    pub days: Vec<TimelineDay>,
}

impl Timeline {
    /// Build from a store snapshot; every record lands in exactly one day
    pub fn build(mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });

        let mut days: Vec<TimelineDay> = Vec::new();
        for record in records {
            let day = record.day();
            match days.last_mut() {
                Some(current) if current.day == day => current.records.push(record),
                _ => days.push(TimelineDay {
                    day,
                    records: vec![record],
                }),
            }
        }

        Self { days }
    }

    /// Total number of records across all days
    pub fn len(&self) -> usize {
        self.days.iter().map(|d| d.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use crate::domain::Stage;

    use super::*;

    fn record_at(timestamp: DateTime<Utc>) -> Record {
        Record {
            id: Uuid::new_v4(),
            timestamp,
            duration_seconds: 5,
            audio_ref: PathBuf::from("/tmp/a.wav"),
            transcript: Some("text".to_string()),
            summary: None,
            category: None,
            stage: Stage::Filed,
        }
    }

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_newest_first_within_day() {
        let early = record_at(ts("2026-08-27T08:00:00Z"));
        let late = record_at(ts("2026-08-27T15:00:00Z"));

        let timeline = Timeline::build(vec![early.clone(), late.clone()]);

        assert_eq!(timeline.days.len(), 1);
        assert_eq!(timeline.days[0].records[0].id, late.id);
        assert_eq!(timeline.days[0].records[1].id, early.id);
    }

    #[test]
    fn test_days_descending() {
        let monday = record_at(ts("2026-08-24T12:00:00Z"));
        let wednesday = record_at(ts("2026-08-26T12:00:00Z"));

        let timeline = Timeline::build(vec![monday.clone(), wednesday.clone()]);

        assert_eq!(timeline.days.len(), 2);
        assert!(timeline.days[0].day > timeline.days[1].day);
        assert_eq!(timeline.days[0].records[0].id, wednesday.id);
    }

    #[test]
    fn test_every_record_in_exactly_one_group() {
        let records: Vec<Record> = (0..10)
            .map(|i| record_at(ts("2026-08-20T00:00:00Z") + chrono::Duration::hours(i * 7)))
            .collect();

        let timeline = Timeline::build(records.clone());

        assert_eq!(timeline.len(), records.len());
        for day in &timeline.days {
            for record in &day.records {
                assert_eq!(record.day(), day.day);
            }
        }
    }

    #[test]
    fn test_same_second_ties_broken_by_id() {
        let t = ts("2026-08-27T10:00:00Z");
        let a = record_at(t);
        let b = record_at(t);

        let timeline = Timeline::build(vec![a.clone(), b.clone()]);
        let ids: Vec<Uuid> = timeline.days[0].records.iter().map(|r| r.id).collect();

        let mut expected = vec![a.id, b.id];
        expected.sort();
        expected.reverse();
        assert_eq!(ids, expected);
    }
}
