use std::collections::{BTreeSet, HashSet};

use crate::database::Database;
use crate::models::{
    CalendarEvent, DailyTodo, EventType, JournalEntry, MoodPreset, Project, ProjectLog, SubTask,
    TagPreset, TaskStatus, new_id,
};
use crate::repository::{CollectionKind, Repository};
use crate::utils::{parse_date, parse_time};

/// Fields accepted when editing a project; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ProjectEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Input for creating or updating a calendar event
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: String,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub tag: Option<String>,
    pub color: Option<String>,
    pub event_type: EventType,
}

/// Outcome of a journal save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalSave {
    Created,
    Updated,
}

/// In-memory copy of every collection, plus the set of collections touched
/// since the last commit. Validation failures are silent no-ops: the
/// mutation returns `None`/`false` and nothing is marked dirty.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub(crate) projects: Vec<Project>,
    pub(crate) logs: Vec<ProjectLog>,
    pub(crate) events: Vec<CalendarEvent>,
    pub(crate) todos: Vec<DailyTodo>,
    pub(crate) journal: Vec<JournalEntry>,
    pub(crate) mood_presets: Vec<MoodPreset>,
    pub(crate) tag_presets: Vec<TagPreset>,
    dirty: BTreeSet<CollectionKind>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            logs: Vec::new(),
            events: Vec::new(),
            todos: Vec::new(),
            journal: Vec::new(),
            mood_presets: MoodPreset::defaults(),
            tag_presets: TagPreset::defaults(),
            dirty: BTreeSet::new(),
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn valid_date(date: &str) -> bool {
    parse_date(date).is_ok()
}

/// Empty strings count as "no time"; anything else must be `HH:mm`
fn normalize_time(time: Option<String>) -> Result<Option<String>, ()> {
    match time {
        None => Ok(None),
        Some(t) if t.trim().is_empty() => Ok(None),
        Some(t) => parse_time(t.trim()).map(|_| Some(t.trim().to_string())).map_err(|_| ()),
    }
}

impl Workspace {
    /// Load every collection from storage
    pub fn load(db: &Database) -> Self {
        let workspace = Self {
            projects: Repository::new(db).load(),
            logs: Repository::new(db).load(),
            events: Repository::new(db).load(),
            todos: Repository::new(db).load(),
            journal: Repository::new(db).load(),
            mood_presets: Repository::new(db).load(),
            tag_presets: Repository::new(db).load(),
            dirty: BTreeSet::new(),
        };
        tracing::info!(
            projects = workspace.projects.len(),
            logs = workspace.logs.len(),
            events = workspace.events.len(),
            todos = workspace.todos.len(),
            journal = workspace.journal.len(),
            "workspace loaded"
        );
        workspace
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn logs(&self) -> &[ProjectLog] {
        &self.logs
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn todos(&self) -> &[DailyTodo] {
        &self.todos
    }

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn mood_presets(&self) -> &[MoodPreset] {
        &self.mood_presets
    }

    pub fn tag_presets(&self) -> &[TagPreset] {
        &self.tag_presets
    }

    pub(crate) fn mark(&mut self, kind: CollectionKind) {
        self.dirty.insert(kind);
    }

    pub(crate) fn mark_all(&mut self) {
        self.dirty.extend(CollectionKind::ALL);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty(&self) -> impl Iterator<Item = CollectionKind> + '_ {
        self.dirty.iter().copied()
    }

    /// Drain the dirty set
    pub fn take_dirty(&mut self) -> Vec<CollectionKind> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    // --- Projects ---

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Create a project; newest projects come first
    pub fn create_project(
        &mut self,
        title: &str,
        description: &str,
        color: &str,
        now: i64,
    ) -> Option<String> {
        let title = non_empty(title)?;
        let project = Project::new(title, description.trim().to_string(), color.to_string(), now);
        let id = project.id.clone();
        self.projects.insert(0, project);
        self.mark(CollectionKind::Projects);
        Some(id)
    }

    pub fn edit_project(&mut self, id: &str, edit: ProjectEdit) -> bool {
        let title = match edit.title {
            Some(title) => match non_empty(&title) {
                Some(title) => Some(title),
                None => return false,
            },
            None => None,
        };
        let Some(project) = self.project_mut(id) else {
            return false;
        };
        if let Some(title) = title {
            project.title = title;
        }
        if let Some(description) = edit.description {
            project.description = description.trim().to_string();
        }
        if let Some(color) = edit.color {
            project.color = color;
        }
        self.mark(CollectionKind::Projects);
        true
    }

    /// Remove a project together with every log that references it
    pub fn delete_project(&mut self, id: &str) -> bool {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return false;
        }
        self.mark(CollectionKind::Projects);

        let logs_before = self.logs.len();
        self.logs.retain(|l| l.project_id != id);
        let dropped = logs_before - self.logs.len();
        if dropped > 0 {
            self.mark(CollectionKind::Logs);
        }
        tracing::info!(project = id, logs = dropped, "project deleted");
        true
    }

    pub fn add_tag(&mut self, project_id: &str, tag: &str) -> bool {
        let Some(tag) = non_empty(tag) else {
            return false;
        };
        let Some(project) = self.project_mut(project_id) else {
            return false;
        };
        if project.tags.contains(&tag) {
            return false;
        }
        project.tags.push(tag);
        self.mark(CollectionKind::Projects);
        true
    }

    pub fn remove_tag(&mut self, project_id: &str, tag: &str) -> bool {
        let Some(project) = self.project_mut(project_id) else {
            return false;
        };
        let before = project.tags.len();
        project.tags.retain(|t| t != tag);
        if project.tags.len() == before {
            return false;
        }
        self.mark(CollectionKind::Projects);
        true
    }

    /// Every tag used by any project, sorted and unique
    pub fn all_tags(&self) -> Vec<String> {
        self.projects
            .iter()
            .flat_map(|p| p.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Projects whose title or description contains `query` (case-insensitive),
    /// optionally restricted to those carrying `tag`
    pub fn filter_projects(&self, query: &str, tag: Option<&str>) -> Vec<&Project> {
        let query = query.to_lowercase();
        self.projects
            .iter()
            .filter(|p| {
                p.title.to_lowercase().contains(&query)
                    || p.description.to_lowercase().contains(&query)
            })
            .filter(|p| tag.is_none_or(|tag| p.tags.iter().any(|t| t == tag)))
            .collect()
    }

    // --- Subtasks ---

    pub fn add_subtask(
        &mut self,
        project_id: &str,
        title: &str,
        start_date: Option<&str>,
        today: &str,
    ) -> Option<String> {
        let title = non_empty(title)?;
        let start_date = start_date
            .and_then(non_empty)
            .unwrap_or_else(|| today.to_string());
        if !valid_date(&start_date) {
            return None;
        }
        let project = self.project_mut(project_id)?;
        let subtask = SubTask::new(title, start_date);
        let id = subtask.id.clone();
        project.sub_tasks.push(subtask);
        project.refresh_status();
        self.mark(CollectionKind::Projects);
        Some(id)
    }

    /// Flip a subtask's completion, stamping or clearing `completed_at`, and
    /// return the project's re-derived status
    pub fn toggle_subtask(
        &mut self,
        project_id: &str,
        subtask_id: &str,
        now: i64,
    ) -> Option<TaskStatus> {
        let project = self.project_mut(project_id)?;
        let subtask = project.sub_tasks.iter_mut().find(|st| st.id == subtask_id)?;
        subtask.is_completed = !subtask.is_completed;
        subtask.completed_at = subtask.is_completed.then_some(now);
        project.refresh_status();
        let status = project.status;
        self.mark(CollectionKind::Projects);
        Some(status)
    }

    pub fn rename_subtask(&mut self, project_id: &str, subtask_id: &str, title: &str) -> bool {
        let Some(title) = non_empty(title) else {
            return false;
        };
        let Some(subtask) = self
            .project_mut(project_id)
            .and_then(|p| p.sub_tasks.iter_mut().find(|st| st.id == subtask_id))
        else {
            return false;
        };
        subtask.title = title;
        self.mark(CollectionKind::Projects);
        true
    }

    /// Replace a subtask's explicit start/end dates; an end before the start is rejected
    pub fn set_subtask_dates(
        &mut self,
        project_id: &str,
        subtask_id: &str,
        start_date: &str,
        end_date: Option<&str>,
    ) -> bool {
        if !valid_date(start_date) {
            return false;
        }
        if let Some(end) = end_date {
            if !valid_date(end) || end < start_date {
                return false;
            }
        }
        let Some(subtask) = self
            .project_mut(project_id)
            .and_then(|p| p.sub_tasks.iter_mut().find(|st| st.id == subtask_id))
        else {
            return false;
        };
        subtask.start_date = start_date.to_string();
        subtask.end_date = end_date.map(str::to_string);
        self.mark(CollectionKind::Projects);
        true
    }

    /// Remove a subtask and the logs attached to it
    pub fn delete_subtask(&mut self, project_id: &str, subtask_id: &str) -> bool {
        let Some(project) = self.project_mut(project_id) else {
            return false;
        };
        let before = project.sub_tasks.len();
        project.sub_tasks.retain(|st| st.id != subtask_id);
        if project.sub_tasks.len() == before {
            return false;
        }
        project.refresh_status();
        self.mark(CollectionKind::Projects);

        let logs_before = self.logs.len();
        self.logs.retain(|l| {
            !(l.project_id == project_id && l.sub_task_id.as_deref() == Some(subtask_id))
        });
        if self.logs.len() != logs_before {
            self.mark(CollectionKind::Logs);
        }
        true
    }

    /// Append suggested subtasks whose titles the project does not have yet.
    /// Suggestions for a project that no longer exists are dropped.
    pub fn apply_suggestions(&mut self, project_id: &str, titles: &[String], today: &str) -> usize {
        let Some(project) = self.project_mut(project_id) else {
            tracing::debug!(project = project_id, "suggestions dropped, project is gone");
            return 0;
        };
        let mut existing: HashSet<String> =
            project.sub_tasks.iter().map(|st| st.title.clone()).collect();
        let mut added = 0;
        for title in titles {
            let Some(title) = non_empty(title) else {
                continue;
            };
            if !existing.insert(title.clone()) {
                continue;
            }
            project.sub_tasks.push(SubTask::new(title, today.to_string()));
            added += 1;
        }
        if added > 0 {
            project.refresh_status();
            self.mark(CollectionKind::Projects);
        }
        added
    }

    // --- Logs ---

    pub fn log(&self, id: &str) -> Option<&ProjectLog> {
        self.logs.iter().find(|l| l.id == id)
    }

    pub fn add_log(
        &mut self,
        project_id: &str,
        subtask_id: Option<&str>,
        date: &str,
        content: &str,
    ) -> Option<String> {
        let content = non_empty(content)?;
        if !valid_date(date) {
            return None;
        }
        let project = self.project(project_id)?;
        if let Some(subtask_id) = subtask_id {
            project.subtask(subtask_id)?;
        }
        let id = new_id();
        self.logs.push(ProjectLog {
            id: id.clone(),
            project_id: project_id.to_string(),
            sub_task_id: subtask_id.map(str::to_string),
            date: date.to_string(),
            content,
        });
        self.mark(CollectionKind::Logs);
        Some(id)
    }

    pub fn edit_log(&mut self, id: &str, content: &str) -> bool {
        let Some(content) = non_empty(content) else {
            return false;
        };
        let Some(log) = self.logs.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        log.content = content;
        self.mark(CollectionKind::Logs);
        true
    }

    pub fn delete_log(&mut self, id: &str) -> bool {
        let before = self.logs.len();
        self.logs.retain(|l| l.id != id);
        if self.logs.len() == before {
            return false;
        }
        self.mark(CollectionKind::Logs);
        true
    }

    /// A project's logs, newest date first
    pub fn logs_for_project(&self, project_id: &str) -> Vec<&ProjectLog> {
        let mut logs: Vec<&ProjectLog> = self
            .logs
            .iter()
            .filter(|l| l.project_id == project_id)
            .collect();
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        logs
    }

    // --- Calendar events ---

    pub fn event(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Resolve a draft into event fields; the tag preset's color is copied in
    /// when no explicit color is given
    fn resolve_event(&self, draft: EventDraft) -> Option<CalendarEvent> {
        let title = non_empty(&draft.title)?;
        if !valid_date(&draft.date) {
            return None;
        }
        let start_time = normalize_time(draft.start_time).ok()?;
        let end_time = normalize_time(draft.end_time).ok()?;
        let tag = draft.tag.as_deref().and_then(non_empty);
        let color = draft.color.as_deref().and_then(non_empty).or_else(|| {
            tag.as_ref()
                .and_then(|tag| self.tag_preset(tag))
                .map(|preset| preset.color.clone())
        });
        Some(CalendarEvent {
            id: new_id(),
            title,
            date: draft.date,
            event_type: draft.event_type,
            tag,
            color,
            start_time,
            end_time,
        })
    }

    pub fn add_event(&mut self, draft: EventDraft) -> Option<String> {
        let event = self.resolve_event(draft)?;
        let id = event.id.clone();
        self.events.push(event);
        self.mark(CollectionKind::Events);
        Some(id)
    }

    pub fn update_event(&mut self, id: &str, draft: EventDraft) -> bool {
        let Some(mut resolved) = self.resolve_event(draft) else {
            return false;
        };
        let Some(event) = self.events.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        resolved.id = event.id.clone();
        *event = resolved;
        self.mark(CollectionKind::Events);
        true
    }

    pub fn delete_event(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() == before {
            return false;
        }
        self.mark(CollectionKind::Events);
        true
    }

    // --- Daily todos ---

    pub fn add_todo(&mut self, date: &str, text: &str) -> Option<String> {
        let text = non_empty(text)?;
        if !valid_date(date) {
            return None;
        }
        let id = new_id();
        self.todos.push(DailyTodo {
            id: id.clone(),
            date: date.to_string(),
            text,
            completed: false,
        });
        self.mark(CollectionKind::Todos);
        Some(id)
    }

    /// Flip a todo and return its new completion flag
    pub fn toggle_todo(&mut self, id: &str) -> Option<bool> {
        let todo = self.todos.iter_mut().find(|t| t.id == id)?;
        todo.completed = !todo.completed;
        let completed = todo.completed;
        self.mark(CollectionKind::Todos);
        Some(completed)
    }

    pub fn delete_todo(&mut self, id: &str) -> bool {
        let before = self.todos.len();
        self.todos.retain(|t| t.id != id);
        if self.todos.len() == before {
            return false;
        }
        self.mark(CollectionKind::Todos);
        true
    }

    pub fn todos_for(&self, date: &str) -> Vec<&DailyTodo> {
        self.todos.iter().filter(|t| t.date == date).collect()
    }

    // --- Journal ---

    pub fn journal_for(&self, date: &str) -> Option<&JournalEntry> {
        self.journal.iter().find(|e| e.date == date)
    }

    /// Create the entry for `date`, or update it in place if one exists.
    /// The mood preset's color is copied onto the entry.
    pub fn save_journal(
        &mut self,
        date: &str,
        mood: &str,
        content: &str,
        now: i64,
    ) -> Option<JournalSave> {
        if !valid_date(date) {
            return None;
        }
        let mood = mood.trim().to_string();
        if mood.is_empty() && content.trim().is_empty() {
            return None;
        }
        let mood_color = self.mood_preset(&mood).map(|preset| preset.color.clone());

        let outcome = match self.journal.iter_mut().find(|e| e.date == date) {
            Some(entry) => {
                entry.mood = mood;
                entry.mood_color = mood_color;
                entry.content = content.to_string();
                entry.last_updated = now;
                JournalSave::Updated
            }
            None => {
                self.journal.push(JournalEntry {
                    id: new_id(),
                    date: date.to_string(),
                    mood,
                    mood_color,
                    content: content.to_string(),
                    last_updated: now,
                });
                JournalSave::Created
            }
        };
        self.mark(CollectionKind::Journal);
        Some(outcome)
    }

    pub fn delete_journal(&mut self, date: &str) -> bool {
        let before = self.journal.len();
        self.journal.retain(|e| e.date != date);
        if self.journal.len() == before {
            return false;
        }
        self.mark(CollectionKind::Journal);
        true
    }

    // --- Presets ---

    pub fn mood_preset(&self, label: &str) -> Option<&MoodPreset> {
        self.mood_presets.iter().find(|m| m.label == label)
    }

    pub fn tag_preset(&self, name: &str) -> Option<&TagPreset> {
        self.tag_presets.iter().find(|t| t.name == name)
    }

    pub fn add_mood_preset(&mut self, label: &str, emoji: Option<&str>, color: &str) -> Option<String> {
        let label = non_empty(label)?;
        if self.mood_preset(&label).is_some() {
            return None;
        }
        let preset = MoodPreset::new(&label, emoji.and_then(non_empty).as_deref(), color);
        let id = preset.id.clone();
        self.mood_presets.push(preset);
        self.mark(CollectionKind::MoodPresets);
        Some(id)
    }

    /// Edit a mood preset; journal entries saved earlier keep their colors
    pub fn update_mood_preset(
        &mut self,
        id: &str,
        label: &str,
        emoji: Option<&str>,
        color: &str,
    ) -> bool {
        let Some(label) = non_empty(label) else {
            return false;
        };
        if self.mood_presets.iter().any(|m| m.label == label && m.id != id) {
            return false;
        }
        let Some(preset) = self.mood_presets.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        preset.label = label;
        preset.emoji = emoji.and_then(non_empty);
        preset.color = color.to_string();
        self.mark(CollectionKind::MoodPresets);
        true
    }

    pub fn delete_mood_preset(&mut self, id: &str) -> bool {
        let before = self.mood_presets.len();
        self.mood_presets.retain(|m| m.id != id);
        if self.mood_presets.len() == before {
            return false;
        }
        self.mark(CollectionKind::MoodPresets);
        true
    }

    pub fn add_tag_preset(&mut self, name: &str, color: &str) -> Option<String> {
        let name = non_empty(name)?;
        if self.tag_preset(&name).is_some() {
            return None;
        }
        let preset = TagPreset::new(&name, color);
        let id = preset.id.clone();
        self.tag_presets.push(preset);
        self.mark(CollectionKind::TagPresets);
        Some(id)
    }

    /// Edit a tag preset; events saved earlier keep their colors
    pub fn update_tag_preset(&mut self, id: &str, name: &str, color: &str) -> bool {
        let Some(name) = non_empty(name) else {
            return false;
        };
        if self.tag_presets.iter().any(|t| t.name == name && t.id != id) {
            return false;
        }
        let Some(preset) = self.tag_presets.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        preset.name = name;
        preset.color = color.to_string();
        self.mark(CollectionKind::TagPresets);
        true
    }

    pub fn delete_tag_preset(&mut self, id: &str) -> bool {
        let before = self.tag_presets.len();
        self.tag_presets.retain(|t| t.id != id);
        if self.tag_presets.len() == before {
            return false;
        }
        self.mark(CollectionKind::TagPresets);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODAY: &str = "2024-03-01";

    fn workspace_with_project() -> (Workspace, String) {
        let mut ws = Workspace::default();
        let id = ws
            .create_project("Lesson 4", "Fractions video", "#3B82F6", 1)
            .unwrap();
        ws.take_dirty();
        (ws, id)
    }

    #[test]
    fn empty_title_is_a_no_op() {
        let mut ws = Workspace::default();
        assert_eq!(ws.create_project("   ", "", "#000000", 1), None);
        assert!(ws.projects().is_empty());
        assert!(!ws.is_dirty());
    }

    #[test]
    fn new_projects_are_listed_first() {
        let mut ws = Workspace::default();
        ws.create_project("First", "", "#000000", 1).unwrap();
        ws.create_project("Second", "", "#000000", 2).unwrap();
        assert_eq!(ws.projects()[0].title, "Second");
    }

    #[test]
    fn status_tracks_every_toggle() {
        let (mut ws, pid) = workspace_with_project();
        let a = ws.add_subtask(&pid, "Script", None, TODAY).unwrap();
        let b = ws.add_subtask(&pid, "Record", None, TODAY).unwrap();

        assert_eq!(ws.toggle_subtask(&pid, &a, 10), Some(TaskStatus::InProgress));
        assert_eq!(ws.toggle_subtask(&pid, &b, 11), Some(TaskStatus::Done));
        assert_eq!(ws.toggle_subtask(&pid, &a, 12), Some(TaskStatus::InProgress));
        assert_eq!(ws.toggle_subtask(&pid, &b, 13), Some(TaskStatus::Todo));

        let project = ws.project(&pid).unwrap();
        assert!(project.sub_tasks.iter().all(|st| st.completed_at.is_none()));
    }

    #[test]
    fn completion_timestamp_only_while_completed() {
        let (mut ws, pid) = workspace_with_project();
        let st = ws.add_subtask(&pid, "Edit", Some("2024-02-20"), TODAY).unwrap();
        ws.toggle_subtask(&pid, &st, 99);
        let subtask = ws.project(&pid).unwrap().subtask(&st).unwrap();
        assert!(subtask.is_completed);
        assert_eq!(subtask.completed_at, Some(99));
        assert_eq!(subtask.start_date, "2024-02-20");
    }

    #[test]
    fn adding_subtask_to_done_project_reopens_it() {
        let (mut ws, pid) = workspace_with_project();
        let a = ws.add_subtask(&pid, "Script", None, TODAY).unwrap();
        ws.toggle_subtask(&pid, &a, 1);
        assert_eq!(ws.project(&pid).unwrap().status, TaskStatus::Done);
        ws.add_subtask(&pid, "Publish", None, TODAY).unwrap();
        assert_eq!(ws.project(&pid).unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn deleting_project_cascades_to_logs() {
        let (mut ws, pid) = workspace_with_project();
        let other = ws.create_project("Other", "", "#000000", 2).unwrap();
        let st = ws.add_subtask(&pid, "Script", None, TODAY).unwrap();
        ws.add_log(&pid, Some(st.as_str()), "2024-03-02", "outline done").unwrap();
        ws.add_log(&other, None, "2024-03-02", "kept").unwrap();
        ws.take_dirty();

        assert!(ws.delete_project(&pid));
        assert_eq!(ws.logs().len(), 1);
        assert_eq!(ws.logs()[0].content, "kept");
        assert_eq!(
            ws.take_dirty(),
            vec![CollectionKind::Projects, CollectionKind::Logs]
        );
    }

    #[test]
    fn deleting_subtask_drops_its_logs() {
        let (mut ws, pid) = workspace_with_project();
        let a = ws.add_subtask(&pid, "Script", None, TODAY).unwrap();
        let b = ws.add_subtask(&pid, "Record", None, TODAY).unwrap();
        ws.add_log(&pid, Some(a.as_str()), "2024-03-02", "draft").unwrap();
        ws.add_log(&pid, Some(b.as_str()), "2024-03-03", "take one").unwrap();

        assert!(ws.delete_subtask(&pid, &a));
        assert_eq!(ws.logs().len(), 1);
        assert_eq!(ws.logs()[0].sub_task_id.as_deref(), Some(b.as_str()));
    }

    #[test]
    fn logs_require_known_parent_and_content() {
        let (mut ws, pid) = workspace_with_project();
        assert_eq!(ws.add_log("missing", None, "2024-03-02", "x"), None);
        assert_eq!(ws.add_log(&pid, Some("missing"), "2024-03-02", "x"), None);
        assert_eq!(ws.add_log(&pid, None, "2024-03-02", "  "), None);
        assert_eq!(ws.add_log(&pid, None, "03/02/2024", "x"), None);
        assert!(ws.logs().is_empty());
    }

    #[test]
    fn project_logs_sorted_newest_first() {
        let (mut ws, pid) = workspace_with_project();
        ws.add_log(&pid, None, "2024-03-02", "a").unwrap();
        ws.add_log(&pid, None, "2024-03-09", "b").unwrap();
        ws.add_log(&pid, None, "2024-03-05", "c").unwrap();
        let dates: Vec<&str> = ws
            .logs_for_project(&pid)
            .iter()
            .map(|l| l.date.as_str())
            .collect();
        assert_eq!(dates, vec!["2024-03-09", "2024-03-05", "2024-03-02"]);
    }

    #[test]
    fn journal_upsert_keeps_one_entry_per_date() {
        let mut ws = Workspace::default();
        assert_eq!(
            ws.save_journal("2024-03-01", "Happy", "good day", 1),
            Some(JournalSave::Created)
        );
        assert_eq!(
            ws.save_journal("2024-03-01", "Tired", "long day", 2),
            Some(JournalSave::Updated)
        );
        assert_eq!(ws.journal().len(), 1);
        assert_eq!(ws.journal_for("2024-03-01").unwrap().mood, "Tired");

        ws.save_journal("2024-03-02", "Neutral", "", 3).unwrap();
        assert_eq!(ws.journal().len(), 2);
    }

    #[test]
    fn preset_edits_do_not_rewrite_history() {
        let mut ws = Workspace::default();
        ws.save_journal("2024-03-01", "Happy", "", 1).unwrap();
        let happy = ws.mood_preset("Happy").unwrap().id.clone();
        assert!(ws.update_mood_preset(&happy, "Happy", Some("😊"), "#000000"));

        let entry = ws.journal_for("2024-03-01").unwrap();
        assert_eq!(entry.mood_color.as_deref(), Some("#10B981"));

        ws.save_journal("2024-03-02", "Happy", "", 2).unwrap();
        assert_eq!(
            ws.journal_for("2024-03-02").unwrap().mood_color.as_deref(),
            Some("#000000")
        );
    }

    #[test]
    fn event_color_comes_from_tag_preset_at_save_time() {
        let mut ws = Workspace::default();
        let id = ws
            .add_event(EventDraft {
                title: "Algebra class".into(),
                date: "2024-03-04".into(),
                start_time: Some("09:00".into()),
                tag: Some("Class".into()),
                ..Default::default()
            })
            .unwrap();
        let class = ws.tag_preset("Class").unwrap().id.clone();
        ws.update_tag_preset(&class, "Class", "#111111");

        let event = ws.event(&id).unwrap();
        assert_eq!(event.color.as_deref(), Some("#3B82F6"));
        assert_eq!(event.event_type, EventType::Other);
    }

    #[test]
    fn event_rejects_malformed_time() {
        let mut ws = Workspace::default();
        let draft = EventDraft {
            title: "Call".into(),
            date: "2024-03-04".into(),
            start_time: Some("nine".into()),
            ..Default::default()
        };
        assert_eq!(ws.add_event(draft), None);
    }

    #[test]
    fn update_event_keeps_id() {
        let mut ws = Workspace::default();
        let id = ws
            .add_event(EventDraft {
                title: "Call".into(),
                date: "2024-03-04".into(),
                ..Default::default()
            })
            .unwrap();
        assert!(ws.update_event(
            &id,
            EventDraft {
                title: "Call with editor".into(),
                date: "2024-03-05".into(),
                start_time: Some(String::new()),
                ..Default::default()
            }
        ));
        let event = ws.event(&id).unwrap();
        assert_eq!(event.title, "Call with editor");
        assert_eq!(event.date, "2024-03-05");
        assert_eq!(event.start_time, None);
    }

    #[test]
    fn todos_toggle_and_delete() {
        let mut ws = Workspace::default();
        let id = ws.add_todo("2024-03-01", "Buy chalk").unwrap();
        assert_eq!(ws.toggle_todo(&id), Some(true));
        assert_eq!(ws.toggle_todo(&id), Some(false));
        assert_eq!(ws.todos_for("2024-03-01").len(), 1);
        assert!(ws.delete_todo(&id));
        assert!(ws.todos().is_empty());
    }

    #[test]
    fn tags_are_trimmed_and_unique() {
        let (mut ws, pid) = workspace_with_project();
        assert!(ws.add_tag(&pid, " math "));
        assert!(!ws.add_tag(&pid, "math"));
        assert!(!ws.add_tag(&pid, ""));
        ws.create_project("Other", "", "#000000", 2).unwrap();
        let other = ws.projects()[0].id.clone();
        ws.add_tag(&other, "art");
        assert_eq!(ws.all_tags(), vec!["art".to_string(), "math".to_string()]);
        assert_eq!(ws.filter_projects("", Some("math")).len(), 1);
        assert_eq!(ws.filter_projects("FRACTIONS", None).len(), 1);
        assert!(ws.remove_tag(&pid, "math"));
    }

    #[test]
    fn suggestions_skip_existing_titles() {
        let (mut ws, pid) = workspace_with_project();
        ws.add_subtask(&pid, "Editing", None, TODAY).unwrap();
        let titles: Vec<String> = ["Scripting", "Editing", "Scripting", "Publishing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(ws.apply_suggestions(&pid, &titles, TODAY), 2);
        assert_eq!(ws.project(&pid).unwrap().sub_tasks.len(), 3);
        assert_eq!(ws.apply_suggestions("gone", &titles, TODAY), 0);
    }

    #[test]
    fn subtask_end_before_start_is_rejected() {
        let (mut ws, pid) = workspace_with_project();
        let st = ws.add_subtask(&pid, "Edit", Some("2024-03-05"), TODAY).unwrap();
        assert!(!ws.set_subtask_dates(&pid, &st, "2024-03-05", Some("2024-03-01")));
        assert!(ws.set_subtask_dates(&pid, &st, "2024-03-02", Some("2024-03-08")));
        let subtask = ws.project(&pid).unwrap().subtask(&st).unwrap();
        assert_eq!(subtask.end_date.as_deref(), Some("2024-03-08"));
    }
}
