use std::path::Path;

use crate::database::Database;
use crate::models::{
    CalendarEvent, DailyTodo, JournalEntry, MoodPreset, Project, ProjectLog, TagPreset,
};
use crate::repository::{CollectionKind, Repository, RepositoryError};
use crate::suggest::{GeneratingSet, SubtaskSuggester, SuggestError, Suggestions};
use crate::transfer::{ImportSummary, Snapshot, TransferError};
use crate::workspace::Workspace;

/// Asks the user to approve a destructive action
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Outcome of persisting the dirty collections
#[derive(Debug, Default)]
pub struct CommitReport {
    pub saved: Vec<CollectionKind>,
    pub failed: Vec<(CollectionKind, RepositoryError)>,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A suggestion request that has been started but not yet applied. It
/// carries the project's title and description as they were when it began,
/// so generation can run without borrowing the studio.
#[derive(Debug, Clone)]
pub struct PendingSuggestion {
    project_id: String,
    title: String,
    description: String,
}

impl PendingSuggestion {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn generate(&self, suggester: &SubtaskSuggester) -> Suggestions {
        suggester.generate(&self.title, &self.description)
    }
}

/// Result of a suggestion run for one project
#[derive(Debug)]
pub struct SuggestOutcome {
    pub suggested: Vec<String>,
    pub added: usize,
    /// The project was deleted while generating; nothing was applied
    pub dropped: bool,
    /// Set when the service failed and the canned list was used instead
    pub error: Option<SuggestError>,
}

/// The open application: storage plus the in-memory workspace
pub struct Studio {
    database: Database,
    workspace: Workspace,
    generating: GeneratingSet,
}

impl Studio {
    /// Load every collection from `database`
    pub fn open(database: Database) -> Self {
        let workspace = Workspace::load(&database);
        Self {
            database,
            workspace,
            generating: GeneratingSet::default(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    fn save_kind(&self, kind: CollectionKind) -> Result<(), RepositoryError> {
        let db = &self.database;
        let ws = &self.workspace;
        match kind {
            CollectionKind::Projects => Repository::<Project>::new(db).save(&ws.projects),
            CollectionKind::Logs => Repository::<ProjectLog>::new(db).save(&ws.logs),
            CollectionKind::Events => Repository::<CalendarEvent>::new(db).save(&ws.events),
            CollectionKind::Todos => Repository::<DailyTodo>::new(db).save(&ws.todos),
            CollectionKind::Journal => Repository::<JournalEntry>::new(db).save(&ws.journal),
            CollectionKind::MoodPresets => Repository::<MoodPreset>::new(db).save(&ws.mood_presets),
            CollectionKind::TagPresets => Repository::<TagPreset>::new(db).save(&ws.tag_presets),
        }
    }

    /// Save every dirty collection on its own. A failed save leaves the
    /// in-memory data as is and keeps the collection dirty; the others are
    /// still written.
    pub fn commit(&mut self) -> CommitReport {
        let mut report = CommitReport::default();
        for kind in self.workspace.take_dirty() {
            match self.save_kind(kind) {
                Ok(()) => report.saved.push(kind),
                Err(e) => {
                    tracing::warn!(collection = %kind, error = %e, "failed to save collection");
                    self.workspace.mark(kind);
                    report.failed.push((kind, e));
                }
            }
        }
        report
    }

    /// Delete a project and its logs after confirmation
    pub fn delete_project(&mut self, id: &str, confirm: &impl Confirm) -> bool {
        let Some(project) = self.workspace.project(id) else {
            return false;
        };
        let logs = self.workspace.logs().iter().filter(|l| l.project_id == id).count();
        let prompt = format!(
            "Delete project \"{}\" and its {} log(s)? This cannot be undone.",
            project.title, logs
        );
        if !confirm.confirm(&prompt) {
            return false;
        }
        self.workspace.delete_project(id)
    }

    pub fn delete_log(&mut self, id: &str, confirm: &impl Confirm) -> bool {
        let Some(log) = self.workspace.log(id) else {
            return false;
        };
        let prompt = format!("Delete the log from {}?", log.date);
        if !confirm.confirm(&prompt) {
            return false;
        }
        self.workspace.delete_log(id)
    }

    /// Delete the journal entry (mood and note) for `date`
    pub fn delete_journal(&mut self, date: &str, confirm: &impl Confirm) -> bool {
        let Some(entry) = self.workspace.journal_for(date) else {
            return false;
        };
        let prompt = format!("Delete the {} entry for {}?", describe(entry), date);
        if !confirm.confirm(&prompt) {
            return false;
        }
        self.workspace.delete_journal(date)
    }

    pub fn export(&self, path: &Path, now: i64) -> Result<Snapshot, TransferError> {
        let snapshot = Snapshot::capture(&self.workspace, now);
        snapshot.write_to(path)?;
        Ok(snapshot)
    }

    /// Overwrite every collection from a backup file. The document is
    /// validated before the user is asked.
    pub fn import(&mut self, path: &Path, confirm: &impl Confirm) -> Result<ImportSummary, TransferError> {
        let snapshot = Snapshot::read_from(path)?;
        let summary = snapshot.summary();
        let prompt = format!(
            "Replace all data with {} project(s), {} log(s), {} event(s), {} todo(s) and {} journal entries?",
            summary.projects, summary.logs, summary.events, summary.todos, summary.journal
        );
        if !confirm.confirm(&prompt) {
            return Err(TransferError::NotConfirmed);
        }
        Ok(snapshot.restore_into(&mut self.workspace))
    }

    /// Mark `project_id` as generating and snapshot what the request needs.
    /// `None` when the project is unknown or already generating.
    pub fn begin_suggestion(&mut self, project_id: &str) -> Option<PendingSuggestion> {
        let project = self.workspace.project(project_id)?;
        let pending = PendingSuggestion {
            project_id: project.id.clone(),
            title: project.title.clone(),
            description: project.description.clone(),
        };
        if !self.generating.begin(project_id) {
            tracing::debug!(project = project_id, "suggestions already in flight");
            return None;
        }
        Some(pending)
    }

    /// Clear the generating marker and append the suggested subtasks that
    /// are new. A project deleted in the meantime gets nothing.
    pub fn complete_suggestion(
        &mut self,
        pending: PendingSuggestion,
        suggestions: Suggestions,
        today: &str,
    ) -> SuggestOutcome {
        self.generating.finish(&pending.project_id);
        let dropped = self.workspace.project(&pending.project_id).is_none();
        let added = self
            .workspace
            .apply_suggestions(&pending.project_id, &suggestions.tasks, today);
        SuggestOutcome {
            suggested: suggestions.tasks,
            added,
            dropped,
            error: suggestions.error,
        }
    }

    /// Begin, generate and complete in one blocking call
    pub fn suggest_subtasks(
        &mut self,
        suggester: &SubtaskSuggester,
        project_id: &str,
        today: &str,
    ) -> Option<SuggestOutcome> {
        let pending = self.begin_suggestion(project_id)?;
        let suggestions = pending.generate(suggester);
        Some(self.complete_suggestion(pending, suggestions, today))
    }

    pub fn is_generating(&self, project_id: &str) -> bool {
        self.generating.is_generating(project_id)
    }
}

fn describe(entry: &JournalEntry) -> &'static str {
    match (entry.mood.is_empty(), entry.content.trim().is_empty()) {
        (false, true) => "mood",
        (true, false) => "note",
        _ => "journal",
    }
}

impl Drop for Studio {
    fn drop(&mut self) {
        if self.workspace.is_dirty() {
            let pending: Vec<String> = self.workspace.dirty().map(|k| k.to_string()).collect();
            tracing::warn!(?pending, "closing with unsaved collections");
        }
    }
}
