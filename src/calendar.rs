//! Month grid and per-day content: events, task span bars, todos and the
//! journal note.

use chrono::{Datelike, Months, NaiveDate};

use crate::models::{CalendarEvent, DailyTodo, JournalEntry, Project, ProjectLog, SubTask};
use crate::range::Direction;
use crate::utils::format_date;
use crate::workspace::Workspace;

/// Inclusive `YYYY-MM-DD` bounds during which a subtask is active.
/// String order on this format is chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpan {
    pub start: String,
    pub end: String,
}

impl TaskSpan {
    pub fn covers(&self, day: &str) -> bool {
        self.start.as_str() <= day && day <= self.end.as_str()
    }
}

/// Span of a subtask, computed live from its own dates and the dates of the
/// logs attached to it. A log dated before the start pulls the start back;
/// one dated after the end pushes the end forward. The subtask itself is
/// never modified.
pub fn task_span(project_id: &str, subtask: &SubTask, logs: &[ProjectLog]) -> TaskSpan {
    let mut start = subtask.start_date.clone();
    let mut end = subtask
        .end_date
        .clone()
        .filter(|end| *end >= subtask.start_date)
        .unwrap_or_else(|| subtask.start_date.clone());

    for log in logs
        .iter()
        .filter(|l| l.project_id == project_id && l.sub_task_id.as_deref() == Some(subtask.id.as_str()))
    {
        if log.date < start {
            start = log.date.clone();
        }
        if log.date > end {
            end = log.date.clone();
        }
    }

    TaskSpan { start, end }
}

/// One day's slice of a task span bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBar {
    pub project_id: String,
    pub project_title: String,
    pub color: String,
    pub subtask_id: String,
    pub task_title: String,
    pub is_start: bool,
    pub is_end: bool,
}

impl TaskBar {
    /// Text drawn on the bar; only the first day carries it
    pub fn label(&self) -> Option<String> {
        self.is_start
            .then(|| format!("{}: {}", self.project_title, self.task_title))
    }
}

struct ActiveSpan<'a> {
    project: &'a Project,
    subtask: &'a SubTask,
    span: TaskSpan,
}

fn active_spans<'a>(projects: &'a [Project], logs: &[ProjectLog]) -> Vec<ActiveSpan<'a>> {
    projects
        .iter()
        .flat_map(|project| {
            project.sub_tasks.iter().map(move |subtask| ActiveSpan {
                project,
                subtask,
                span: task_span(&project.id, subtask, logs),
            })
        })
        .collect()
}

fn bars_for(spans: &[ActiveSpan<'_>], day: &str) -> Vec<TaskBar> {
    spans
        .iter()
        .filter(|s| s.span.covers(day))
        .map(|s| TaskBar {
            project_id: s.project.id.clone(),
            project_title: s.project.title.clone(),
            color: s.project.color.clone(),
            subtask_id: s.subtask.id.clone(),
            task_title: s.subtask.title.clone(),
            is_start: s.span.start == day,
            is_end: s.span.end == day,
        })
        .collect()
}

/// Everything shown for one calendar day
#[derive(Debug, Clone)]
pub struct DayContents<'a> {
    pub date: NaiveDate,
    /// Ordered by start time; events without one come first
    pub events: Vec<&'a CalendarEvent>,
    pub bars: Vec<TaskBar>,
    pub todos: Vec<&'a DailyTodo>,
    pub logs: Vec<&'a ProjectLog>,
    pub journal: Option<&'a JournalEntry>,
    /// Color the journal note is tinted with
    pub note_tint: Option<String>,
}

impl<'a> DayContents<'a> {
    fn assemble(workspace: &'a Workspace, spans: &[ActiveSpan<'_>], date: NaiveDate) -> Self {
        let key = format_date(date);

        let mut events: Vec<&CalendarEvent> =
            workspace.events().iter().filter(|e| e.date == key).collect();
        events.sort_by(|a, b| {
            a.start_time
                .as_deref()
                .unwrap_or("")
                .cmp(b.start_time.as_deref().unwrap_or(""))
        });

        let journal = workspace.journal_for(&key);
        let note_tint = journal.and_then(|entry| {
            entry.mood_color.clone().or_else(|| {
                workspace
                    .mood_preset(&entry.mood)
                    .map(|preset| preset.color.clone())
            })
        });

        Self {
            date,
            events,
            bars: bars_for(spans, &key),
            todos: workspace.todos_for(&key),
            logs: workspace.logs().iter().filter(|l| l.date == key).collect(),
            journal,
            note_tint,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.bars.is_empty()
            && self.todos.is_empty()
            && self.logs.is_empty()
            && self.journal.is_none()
    }
}

/// Contents of a single day
pub fn day_contents(workspace: &Workspace, date: NaiveDate) -> DayContents<'_> {
    let spans = active_spans(workspace.projects(), workspace.logs());
    DayContents::assemble(workspace, &spans, date)
}

/// A Sunday-first month grid
#[derive(Debug, Clone)]
pub struct MonthGrid<'a> {
    pub first: NaiveDate,
    /// Blank cells before the 1st (Sunday = 0)
    pub leading_blanks: usize,
    pub days: Vec<DayContents<'a>>,
}

impl<'a> MonthGrid<'a> {
    pub fn build(workspace: &'a Workspace, year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let spans = active_spans(workspace.projects(), workspace.logs());
        let days = first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(|d| DayContents::assemble(workspace, &spans, d))
            .collect();

        Some(Self {
            first,
            leading_blanks: first.weekday().num_days_from_sunday() as usize,
            days,
        })
    }

    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    pub fn day(&self, day: u32) -> Option<&DayContents<'a>> {
        self.days.get(day.checked_sub(1)? as usize)
    }

    /// Rows of seven cells; `None` pads before the 1st and after the last day
    pub fn weeks(&self) -> Vec<Vec<Option<&DayContents<'a>>>> {
        let mut cells: Vec<Option<&DayContents<'a>>> = vec![None; self.leading_blanks];
        cells.extend(self.days.iter().map(Some));
        while cells.len() % 7 != 0 {
            cells.push(None);
        }
        cells.chunks(7).map(|row| row.to_vec()).collect()
    }
}

/// First day of the month before or after `current`
pub fn shift_month(current: NaiveDate, direction: Direction) -> NaiveDate {
    let first = current.with_day(1).unwrap_or(current);
    let shifted = match direction {
        Direction::Next => first.checked_add_months(Months::new(1)),
        Direction::Prev => first.checked_sub_months(Months::new(1)),
    };
    shifted.unwrap_or(first)
}
