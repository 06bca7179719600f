//! The four-bucket PARA view.
//!
//! Records are partitioned by category; uncategorized records appear in no
//! bucket but stay visible through the store and the timeline.

use serde::Serialize;

use crate::domain::{Category, Record};

/// Classified records partitioned into the four PARA buckets, each
/// newest-first
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParaFolders {
    pub projects: Vec<Record>,
    pub areas: Vec<Record>,
    pub resources: Vec<Record>,
    pub archives: Vec<Record>,
}

impl ParaFolders {
    /// Build from a store snapshot
    pub fn build(mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });

        let mut folders = Self::default();
        for record in records {
            match record.category {
                Some(Category::Projects) => folders.projects.push(record),
                Some(Category::Areas) => folders.areas.push(record),
                Some(Category::Resources) => folders.resources.push(record),
                Some(Category::Archives) => folders.archives.push(record),
                None => {}
            }
        }

        folders
    }

    /// Records in one bucket
    pub fn bucket(&self, category: Category) -> &[Record] {
        match category {
            Category::Projects => &self.projects,
            Category::Areas => &self.areas,
            Category::Resources => &self.resources,
            Category::Archives => &self.archives,
        }
    }

    /// Total classified records across all buckets
    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.bucket(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::Stage;

    use super::*;

    fn record_with(category: Option<Category>) -> Record {
        Record {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            duration_seconds: 5,
            audio_ref: PathBuf::from("/tmp/a.wav"),
            transcript: Some("text".to_string()),
            summary: None,
            category,
            stage: Stage::Filed,
        }
    }

    #[test]
    fn test_record_in_exactly_one_bucket() {
        let record = record_with(Some(Category::Projects));
        let folders = ParaFolders::build(vec![record.clone()]);

        assert_eq!(folders.projects.len(), 1);
        assert_eq!(folders.projects[0].id, record.id);
        for category in [Category::Areas, Category::Resources, Category::Archives] {
            assert!(folders.bucket(category).is_empty());
        }
    }

    #[test]
    fn test_uncategorized_in_no_bucket() {
        let folders = ParaFolders::build(vec![record_with(None)]);
        assert!(folders.is_empty());
    }

    #[test]
    fn test_partition_covers_all_buckets() {
        let records: Vec<Record> = Category::ALL
            .iter()
            .map(|c| record_with(Some(*c)))
            .collect();

        let folders = ParaFolders::build(records);

        for category in Category::ALL {
            assert_eq!(folders.bucket(category).len(), 1);
        }
        assert_eq!(folders.len(), 4);
    }
}
