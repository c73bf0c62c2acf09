use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::Timeline;
use crate::error::EditResult;

/// A saved timeline with the time it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDocument {
    pub timeline: Timeline,
    pub saved_at: DateTime<Utc>,
}

impl Timeline {
    // =========================================================================
    // Serialization
    // =========================================================================

    pub fn to_json(&self) -> EditResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a timeline and repair any referential damage
    pub fn from_json(json: &str) -> EditResult<Self> {
        let mut timeline: Timeline = serde_json::from_str(json)?;
        let fixes = timeline.repair();
        if fixes > 0 {
            tracing::warn!(fixes, "repaired loaded timeline");
        }
        Ok(timeline)
    }

    // =========================================================================
    // Save/Load
    // =========================================================================

    /// Save the timeline to a file, creating parent folders as needed
    pub fn save_to(&self, path: &Path) -> EditResult<DateTime<Utc>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let document = TimelineDocument {
            timeline: self.clone(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "saved timeline");
        Ok(document.saved_at)
    }

    /// Load a timeline saved with [`Timeline::save_to`]
    pub fn load(path: &Path) -> EditResult<TimelineDocument> {
        let json = fs::read_to_string(path)?;
        let mut document: TimelineDocument = serde_json::from_str(&json)?;
        let fixes = document.timeline.repair();
        tracing::info!(
            path = %path.display(),
            clips = document.timeline.clip_count(),
            fixes,
            "loaded timeline"
        );
        Ok(document)
    }
}
