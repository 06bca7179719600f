//! Date-scoped digest payload.
//!
//! The digest is produced by an external collaborator; memoflow only
//! defines the payload shape and the request contract (see
//! `adapters::DigestProvider`).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A narrative summary of one calendar day's records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDigest {
    /// The day this digest covers
    pub date: NaiveDate,

    /// Narrative summary text
    pub narrative: String,

    /// Time-ordered highlights
    pub highlights: Vec<Highlight>,

    /// Action items extracted for the day
    pub action_items: Vec<String>,
}

/// A single (time, text) highlight within a digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub time: NaiveTime,
    pub text: String,
}
