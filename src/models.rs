use serde::{Deserialize, Serialize};

/// Project progress, derived from subtask completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Derive a status from the completion flags of a subtask list
    pub fn derive(subtasks: &[SubTask]) -> Self {
        let completed = subtasks.iter().filter(|st| st.is_completed).count();
        if completed == 0 {
            TaskStatus::Todo
        } else if completed == subtasks.len() {
            TaskStatus::Done
        } else {
            TaskStatus::InProgress
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
    pub start_date: String, // YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>, // YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>, // ms since epoch, set iff is_completed
}

impl SubTask {
    pub fn new(title: String, start_date: String) -> Self {
        Self {
            id: new_id(),
            title,
            is_completed: false,
            start_date,
            end_date: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub color: String, // hex, e.g. #3B82F6
    pub created_at: i64,
}

impl Project {
    pub fn new(title: String, description: String, color: String, created_at: i64) -> Self {
        Self {
            id: new_id(),
            title,
            description,
            status: TaskStatus::Todo,
            sub_tasks: Vec::new(),
            tags: Vec::new(),
            color,
            created_at,
        }
    }

    pub fn subtask(&self, id: &str) -> Option<&SubTask> {
        self.sub_tasks.iter().find(|st| st.id == id)
    }

    /// Recompute `status` from the current subtasks
    pub fn refresh_status(&mut self) {
        self.status = TaskStatus::derive(&self.sub_tasks);
    }

    /// Percentage of completed subtasks, rounded; 0 for a project without subtasks
    pub fn progress(&self) -> u8 {
        if self.sub_tasks.is_empty() {
            return 0;
        }
        let completed = self.sub_tasks.iter().filter(|st| st.is_completed).count();
        ((completed as f64 / self.sub_tasks.len() as f64) * 100.0).round() as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLog {
    pub id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_task_id: Option<String>,
    pub date: String, // YYYY-MM-DD
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Class,
    Deadline,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: String, // YYYY-MM-DD
    #[serde(default, rename = "type")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>, // HH:mm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>, // HH:mm
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTodo {
    pub id: String,
    pub date: String, // YYYY-MM-DD
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub date: String, // YYYY-MM-DD, unique across entries
    #[serde(default)]
    pub mood: String,
    /// Copied from the mood preset when the entry was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_color: Option<String>,
    #[serde(default)]
    pub content: String,
    pub last_updated: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodPreset {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub color: String,
}

impl MoodPreset {
    pub fn new(label: &str, emoji: Option<&str>, color: &str) -> Self {
        Self {
            id: new_id(),
            label: label.to_string(),
            emoji: emoji.map(str::to_string),
            color: color.to_string(),
        }
    }

    /// Built-in mood catalog used until the user edits their own
    pub fn defaults() -> Vec<MoodPreset> {
        vec![
            MoodPreset::new("Happy", Some("😊"), "#10B981"),
            MoodPreset::new("Productive", Some("🌟"), "#F59E0B"),
            MoodPreset::new("Neutral", Some("😐"), "#3B82F6"),
            MoodPreset::new("Stressed", Some("🌧️"), "#6B7280"),
            MoodPreset::new("Tired", Some("😴"), "#6366F1"),
            MoodPreset::new("Nothing", Some("⚪"), "#E5E7EB"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPreset {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl TagPreset {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }

    /// Built-in event tag catalog
    pub fn defaults() -> Vec<TagPreset> {
        vec![
            TagPreset::new("Class", "#3B82F6"),
            TagPreset::new("Deadline", "#EF4444"),
            TagPreset::new("Meeting", "#10B981"),
            TagPreset::new("Personal", "#8B5CF6"),
        ]
    }
}

/// Colors offered when creating a project or an event
pub const PRESET_COLORS: [&str; 8] = [
    "#3B82F6", "#EF4444", "#10B981", "#F59E0B", "#8B5CF6", "#EC4899", "#64748B", "#000000",
];

/// Generate a fresh entity id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
