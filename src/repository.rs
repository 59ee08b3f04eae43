use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::models::{
    CalendarEvent, DailyTodo, JournalEntry, MoodPreset, Project, ProjectLog, TagPreset,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
    #[error("Failed to encode {0}: {1}")]
    Encode(CollectionKind, serde_json::Error),
}

/// The independently persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectionKind {
    Projects,
    Logs,
    Events,
    Todos,
    Journal,
    MoodPresets,
    TagPresets,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 7] = [
        CollectionKind::Projects,
        CollectionKind::Logs,
        CollectionKind::Events,
        CollectionKind::Todos,
        CollectionKind::Journal,
        CollectionKind::MoodPresets,
        CollectionKind::TagPresets,
    ];
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionKind::Projects => "projects",
            CollectionKind::Logs => "project logs",
            CollectionKind::Events => "calendar events",
            CollectionKind::Todos => "daily todos",
            CollectionKind::Journal => "journal entries",
            CollectionKind::MoodPresets => "mood presets",
            CollectionKind::TagPresets => "tag presets",
        };
        f.write_str(name)
    }
}

/// An entity type stored as one JSON array under its own key
pub trait Collection: Serialize + DeserializeOwned + Sized {
    const KEY: &'static str;
    const KIND: CollectionKind;

    /// Contents used when nothing usable is stored
    fn default_collection() -> Vec<Self> {
        Vec::new()
    }
}

impl Collection for Project {
    const KEY: &'static str = "cs_projects";
    const KIND: CollectionKind = CollectionKind::Projects;
}

impl Collection for ProjectLog {
    const KEY: &'static str = "cs_logs";
    const KIND: CollectionKind = CollectionKind::Logs;
}

impl Collection for CalendarEvent {
    const KEY: &'static str = "cs_events";
    const KIND: CollectionKind = CollectionKind::Events;
}

impl Collection for DailyTodo {
    const KEY: &'static str = "cs_todos";
    const KIND: CollectionKind = CollectionKind::Todos;
}

impl Collection for JournalEntry {
    const KEY: &'static str = "cs_entries";
    const KIND: CollectionKind = CollectionKind::Journal;
}

impl Collection for MoodPreset {
    const KEY: &'static str = "cs_mood_presets";
    const KIND: CollectionKind = CollectionKind::MoodPresets;

    fn default_collection() -> Vec<Self> {
        MoodPreset::defaults()
    }
}

impl Collection for TagPreset {
    const KEY: &'static str = "cs_tag_presets";
    const KIND: CollectionKind = CollectionKind::TagPresets;

    fn default_collection() -> Vec<Self> {
        TagPreset::defaults()
    }
}

/// Load/save boundary for a single collection
pub struct Repository<'db, T: Collection> {
    db: &'db Database,
    _marker: PhantomData<T>,
}

impl<'db, T: Collection> Repository<'db, T> {
    pub fn new(db: &'db Database) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    /// Load the stored collection. Missing, unreadable or corrupt data yields
    /// the default collection instead of an error.
    pub fn load(&self) -> Vec<T> {
        let raw = match self.db.get(T::KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default_collection(),
            Err(e) => {
                tracing::warn!(key = T::KEY, error = %e, "failed to read {}, using defaults", T::KIND);
                return T::default_collection();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key = T::KEY, error = %e, "stored {} are corrupt, using defaults", T::KIND);
                T::default_collection()
            }
        }
    }

    /// Serialize and store the whole collection
    pub fn save(&self, items: &[T]) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(items).map_err(|e| RepositoryError::Encode(T::KIND, e))?;
        self.db.put(T::KEY, &raw)?;
        tracing::debug!(key = T::KEY, count = items.len(), bytes = raw.len(), "saved {}", T::KIND);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyTodo;

    fn todo(text: &str) -> DailyTodo {
        DailyTodo {
            id: crate::models::new_id(),
            date: "2024-03-01".to_string(),
            text: text.to_string(),
            completed: false,
        }
    }

    #[test]
    fn missing_key_loads_default() {
        let db = Database::open_in_memory().unwrap();
        assert!(Repository::<DailyTodo>::new(&db).load().is_empty());
        assert_eq!(Repository::<MoodPreset>::new(&db).load().len(), 6);
    }

    #[test]
    fn corrupt_blob_falls_back_to_empty() {
        let db = Database::open_in_memory().unwrap();
        db.put(Project::KEY, "{not json").unwrap();
        assert!(Repository::<Project>::new(&db).load().is_empty());
    }

    #[test]
    fn saved_collection_loads_back() {
        let db = Database::open_in_memory().unwrap();
        let repo = Repository::<DailyTodo>::new(&db);
        repo.save(&[todo("buy film"), todo("charge batteries")]).unwrap();

        let loaded = repo.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].text, "charge batteries");
    }

    #[test]
    fn empty_preset_list_is_kept_once_saved() {
        let db = Database::open_in_memory().unwrap();
        let repo = Repository::<TagPreset>::new(&db);
        repo.save(&[]).unwrap();
        assert!(repo.load().is_empty());
    }

    #[test]
    fn keys_are_distinct_per_collection() {
        let mut keys = vec![
            Project::KEY,
            ProjectLog::KEY,
            CalendarEvent::KEY,
            DailyTodo::KEY,
            JournalEntry::KEY,
            MoodPreset::KEY,
            TagPreset::KEY,
        ];
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), CollectionKind::ALL.len());
    }
}
