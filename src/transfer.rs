//! Whole-workspace backup and restore as a single JSON document.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::models::{
    CalendarEvent, DailyTodo, JournalEntry, MoodPreset, Project, ProjectLog, TagPreset,
};
use crate::utils::parse_date;
use crate::workspace::Workspace;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid backup document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported backup version {0}")]
    UnsupportedVersion(u32),
    #[error("Journal has more than one entry for {0}")]
    DuplicateJournalDate(String),
    #[error("Invalid date '{date}' in {collection}")]
    InvalidDate { collection: &'static str, date: String },
    #[error("Import cancelled")]
    NotConfirmed,
}

fn default_mood_presets() -> Vec<MoodPreset> {
    MoodPreset::defaults()
}

fn default_tag_presets() -> Vec<TagPreset> {
    TagPreset::defaults()
}

/// Every collection at one point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub exported_at: i64,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub logs: Vec<ProjectLog>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub todos: Vec<DailyTodo>,
    #[serde(default)]
    pub journal: Vec<JournalEntry>,
    #[serde(default = "default_mood_presets")]
    pub mood_presets: Vec<MoodPreset>,
    #[serde(default = "default_tag_presets")]
    pub tag_presets: Vec<TagPreset>,
}

/// Counts reported after a restore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub projects: usize,
    pub logs: usize,
    pub events: usize,
    pub todos: usize,
    pub journal: usize,
}

fn check_date(collection: &'static str, date: &str) -> Result<(), TransferError> {
    parse_date(date).map(|_| ()).map_err(|_| TransferError::InvalidDate {
        collection,
        date: date.to_string(),
    })
}

impl Snapshot {
    pub fn capture(workspace: &Workspace, now: i64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: now,
            projects: workspace.projects.clone(),
            logs: workspace.logs.clone(),
            events: workspace.events.clone(),
            todos: workspace.todos.clone(),
            journal: workspace.journal.clone(),
            mood_presets: workspace.mood_presets.clone(),
            tag_presets: workspace.tag_presets.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, TransferError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a backup document
    pub fn from_json(json: &str) -> Result<Self, TransferError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), TransferError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "workspace exported");
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, TransferError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), TransferError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(TransferError::UnsupportedVersion(self.version));
        }

        for project in &self.projects {
            for subtask in &project.sub_tasks {
                check_date("subtasks", &subtask.start_date)?;
                if let Some(end) = &subtask.end_date {
                    check_date("subtasks", end)?;
                }
            }
        }
        for log in &self.logs {
            check_date("logs", &log.date)?;
        }
        for event in &self.events {
            check_date("events", &event.date)?;
        }
        for todo in &self.todos {
            check_date("todos", &todo.date)?;
        }

        let mut seen = HashSet::new();
        for entry in &self.journal {
            check_date("journal", &entry.date)?;
            if !seen.insert(entry.date.as_str()) {
                return Err(TransferError::DuplicateJournalDate(entry.date.clone()));
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            projects: self.projects.len(),
            logs: self.logs.len(),
            events: self.events.len(),
            todos: self.todos.len(),
            journal: self.journal.len(),
        }
    }

    /// Replace every collection in `workspace` and mark them all dirty
    pub fn restore_into(self, workspace: &mut Workspace) -> ImportSummary {
        let summary = self.summary();
        workspace.projects = self.projects;
        workspace.logs = self.logs;
        workspace.events = self.events;
        workspace.todos = self.todos;
        workspace.journal = self.journal;
        workspace.mood_presets = self.mood_presets;
        workspace.tag_presets = self.tag_presets;
        workspace.mark_all();
        tracing::info!(?summary, "workspace restored from backup");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Workspace {
        let mut ws = Workspace::default();
        let pid = ws.create_project("Course", "algebra", "#3B82F6", 10).unwrap();
        ws.add_subtask(&pid, "Record", Some("2024-03-01"), "2024-03-01").unwrap();
        ws.add_log(&pid, None, "2024-03-02", "notes").unwrap();
        ws.save_journal("2024-03-02", "Happy", "good day", 20).unwrap();
        ws
    }

    #[test]
    fn snapshot_uses_stored_field_names() {
        let json = Snapshot::capture(&sample(), 99).to_json().unwrap();
        assert!(json.contains("\"exportedAt\": 99"));
        assert!(json.contains("\"subTasks\""));
        assert!(json.contains("\"moodPresets\""));
    }

    #[test]
    fn restore_replaces_everything_and_marks_dirty() {
        let snapshot = Snapshot::from_json(&Snapshot::capture(&sample(), 1).to_json().unwrap()).unwrap();
        let mut target = Workspace::default();
        target.add_todo("2024-01-01", "stale").unwrap();
        target.take_dirty();

        let summary = snapshot.restore_into(&mut target);
        assert_eq!(summary.projects, 1);
        assert_eq!(summary.todos, 0);
        assert!(target.todos().is_empty());
        assert_eq!(target.projects()[0].title, "Course");
        assert_eq!(target.dirty().count(), 7);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = Snapshot::from_json(r#"{"version": 7, "exportedAt": 0}"#).unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedVersion(7)));
    }

    #[test]
    fn missing_collections_default() {
        let snapshot = Snapshot::from_json(r#"{"version": 1, "exportedAt": 0}"#).unwrap();
        assert!(snapshot.projects.is_empty());
        assert_eq!(snapshot.mood_presets.len(), 6);
        assert_eq!(snapshot.tag_presets.len(), 4);
    }

    #[test]
    fn rejects_duplicate_journal_dates() {
        let mut snapshot = Snapshot::capture(&sample(), 0);
        let mut twin = snapshot.journal[0].clone();
        twin.id = "other".into();
        snapshot.journal.push(twin);
        assert!(matches!(
            snapshot.validate(),
            Err(TransferError::DuplicateJournalDate(d)) if d == "2024-03-02"
        ));
    }

    #[test]
    fn rejects_malformed_dates() {
        let mut snapshot = Snapshot::capture(&sample(), 0);
        snapshot.logs[0].date = "03/02/2024".into();
        assert!(matches!(
            snapshot.validate(),
            Err(TransferError::InvalidDate { collection: "logs", .. })
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup").join("studio.json");
        Snapshot::capture(&sample(), 5).write_to(&path).unwrap();
        let read = Snapshot::read_from(&path).unwrap();
        assert_eq!(read.exported_at, 5);
        assert_eq!(read.journal.len(), 1);
    }
}
