//! Per-identifier loading and result state of a poll run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::Classification;

/// What the view should show for one identifier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "lowercase")]
pub enum RowStatus {
    /// Request not answered yet (or never will be, after an abort)
    Loading,
    /// Classification text
    Resolved(String),
}

/// One display row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// The identifier
    pub identifier: String,
    /// Its status
    pub status: RowStatus,
}

/// Snapshot of a poll run
///
/// Rebuilt from scratch when a run starts. Between runs it keeps whatever the
/// last run left behind, including identifiers stuck loading after an abort.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    /// Offering the run is checking
    pub target: String,
    /// Identifiers in request order
    pub identifiers: Vec<String>,
    /// Loading flag per identifier
    pub loading: HashMap<String, bool>,
    /// Classification text per resolved identifier
    pub classifications: HashMap<String, String>,
    /// Whether the results table is shown
    pub table_visible: bool,
    /// When the current run started
    pub started_at: Option<DateTime<Utc>>,
}

impl PollState {
    /// Fresh state for a run: everything loading, nothing classified
    pub(crate) fn start(identifiers: &[String], target: &str, now: DateTime<Utc>) -> Self {
        Self {
            target: target.to_string(),
            identifiers: identifiers.to_vec(),
            loading: identifiers.iter().map(|id| (id.clone(), true)).collect(),
            classifications: HashMap::with_capacity(identifiers.len()),
            table_visible: true,
            started_at: Some(now),
        }
    }

    pub(crate) fn resolve(&mut self, identifier: &str, classification: &Classification) {
        self.classifications
            .insert(identifier.to_string(), classification.to_string());
        self.loading.insert(identifier.to_string(), false);
    }

    /// Whether `identifier` is still waiting; unknown identifiers are not loading
    pub fn is_loading(&self, identifier: &str) -> bool {
        self.loading.get(identifier).copied().unwrap_or(false)
    }

    /// Classification text for `identifier`, once resolved
    pub fn classification(&self, identifier: &str) -> Option<&str> {
        self.classifications.get(identifier).map(String::as_str)
    }

    /// Identifiers still loading, in request order
    pub fn pending(&self) -> Vec<&str> {
        self.identifiers
            .iter()
            .filter(|id| self.is_loading(id))
            .map(String::as_str)
            .collect()
    }

    /// True once every identifier of the run has a classification
    pub fn is_complete(&self) -> bool {
        self.identifiers
            .iter()
            .all(|id| !self.is_loading(id) && self.classifications.contains_key(id))
    }

    /// Rows in request order
    pub fn rows(&self) -> Vec<Row> {
        self.identifiers
            .iter()
            .map(|id| Row {
                identifier: id.clone(),
                status: match (self.is_loading(id), self.classification(id)) {
                    (false, Some(text)) => RowStatus::Resolved(text.to_string()),
                    _ => RowStatus::Loading,
                },
            })
            .collect()
    }
}
