//! Placeholder digest provider.
//!
//! Digest generation is an external concern; this provider returns canned
//! content so the query path is wired end to end. Same date, same payload.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::domain::{DailyDigest, Highlight};

use super::DigestProvider;

/// Deterministic stand-in for a real digest collaborator
pub struct PlaceholderDigest;

#[async_trait]
impl DigestProvider for PlaceholderDigest {
    async fn digest_for(&self, date: NaiveDate) -> Result<DailyDigest> {
        Ok(DailyDigest {
            date,
            narrative: format!(
                "No digest backend is configured. Recordings for {} are \
                 available in the timeline.",
                date
            ),
            highlights: vec![Highlight {
                time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
                text: "Digest generation is not configured".to_string(),
            }],
            action_items: vec!["Configure a digest provider".to_string()],
        })
    }
}
