//! Statistics for a resolved date range: completed tasks, activity buckets,
//! mood distribution and topic frequency. Everything is recomputed from the
//! collections on each call.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

use crate::models::{JournalEntry, MoodPreset, Project, ProjectLog, SubTask};
use crate::range::{DateRange, Granularity, RangeCursor};
use crate::topics::{TOPIC_LIMIT, Topic, top_topics};
use crate::utils::{local_datetime, parse_date};
use crate::workspace::Workspace;

/// Minimum vertical scale of the activity chart
pub const CHART_FLOOR: usize = 5;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy)]
pub struct CompletedTask<'a> {
    pub project: &'a Project,
    pub subtask: &'a SubTask,
    /// Local wall-clock completion time
    pub completed_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityBucket {
    pub label: String,
    pub tasks: usize,
    pub logs: usize,
}

impl ActivityBucket {
    pub fn total(&self) -> usize {
        self.tasks + self.logs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoodShare {
    pub mood: String,
    pub count: usize,
    pub percent: f64,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthMoods {
    pub label: &'static str,
    pub shares: Vec<MoodShare>,
    /// False for months without any entry; such months render as "no data"
    pub has_data: bool,
}

/// Completed subtasks whose completion timestamp falls inside `range`
pub fn completed_tasks<'a>(projects: &'a [Project], range: &DateRange) -> Vec<CompletedTask<'a>> {
    projects
        .iter()
        .flat_map(|project| project.sub_tasks.iter().map(move |st| (project, st)))
        .filter(|(_, st)| st.is_completed)
        .filter_map(|(project, subtask)| {
            let completed_at = local_datetime(subtask.completed_at?)?;
            range.contains(completed_at).then_some(CompletedTask {
                project,
                subtask,
                completed_at,
            })
        })
        .collect()
}

fn entry_date(date: &str) -> Option<NaiveDate> {
    parse_date(date).ok()
}

pub fn logs_in_range<'a>(logs: &'a [ProjectLog], range: &DateRange) -> Vec<&'a ProjectLog> {
    logs.iter()
        .filter(|l| entry_date(&l.date).is_some_and(|d| range.contains_date(d)))
        .collect()
}

pub fn moods_in_range<'a>(journal: &'a [JournalEntry], range: &DateRange) -> Vec<&'a JournalEntry> {
    journal
        .iter()
        .filter(|e| entry_date(&e.date).is_some_and(|d| range.contains_date(d)))
        .collect()
}

/// One bucket per day for WEEK and MONTH, one per month for YEAR
pub fn activity_series(
    granularity: Granularity,
    range: &DateRange,
    completed: &[CompletedTask<'_>],
    logs: &[&ProjectLog],
) -> Vec<ActivityBucket> {
    match granularity {
        Granularity::Week | Granularity::Month => {
            let mut task_days: HashMap<NaiveDate, usize> = HashMap::new();
            for task in completed {
                *task_days.entry(task.completed_at.date()).or_default() += 1;
            }
            let mut log_days: HashMap<NaiveDate, usize> = HashMap::new();
            for log in logs {
                if let Some(day) = entry_date(&log.date) {
                    *log_days.entry(day).or_default() += 1;
                }
            }

            range
                .days()
                .map(|day| ActivityBucket {
                    label: match granularity {
                        Granularity::Week => day.format("%a").to_string(),
                        _ => day.day().to_string(),
                    },
                    tasks: task_days.get(&day).copied().unwrap_or(0),
                    logs: log_days.get(&day).copied().unwrap_or(0),
                })
                .collect()
        }
        Granularity::Year => {
            let mut buckets: Vec<ActivityBucket> = MONTH_LABELS
                .iter()
                .map(|label| ActivityBucket {
                    label: label.to_string(),
                    tasks: 0,
                    logs: 0,
                })
                .collect();
            for task in completed {
                buckets[task.completed_at.month0() as usize].tasks += 1;
            }
            for log in logs {
                if let Some(day) = entry_date(&log.date) {
                    buckets[day.month0() as usize].logs += 1;
                }
            }
            buckets
        }
    }
}

/// Denominator for bar heights: the largest bucket total, never below `CHART_FLOOR`
pub fn chart_scale(buckets: &[ActivityBucket]) -> usize {
    buckets
        .iter()
        .map(ActivityBucket::total)
        .max()
        .unwrap_or(0)
        .max(CHART_FLOOR)
}

fn mood_color(entry: &JournalEntry, presets: &[MoodPreset]) -> Option<String> {
    entry.mood_color.clone().or_else(|| {
        presets
            .iter()
            .find(|p| p.label == entry.mood)
            .map(|p| p.color.clone())
    })
}

/// Mood label frequencies as percentages of `moods`, most frequent first.
/// Empty input gives an empty distribution.
pub fn mood_distribution(moods: &[&JournalEntry], presets: &[MoodPreset]) -> Vec<MoodShare> {
    let total = moods.len();
    if total == 0 {
        return Vec::new();
    }

    let mut counts: Vec<(String, usize, Option<String>)> = Vec::new();
    for entry in moods {
        match counts.iter_mut().find(|(mood, _, _)| *mood == entry.mood) {
            Some((_, count, _)) => *count += 1,
            None => counts.push((entry.mood.clone(), 1, mood_color(entry, presets))),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    counts
        .into_iter()
        .map(|(mood, count, color)| MoodShare {
            percent: count as f64 * 100.0 / total as f64,
            mood,
            count,
            color,
        })
        .collect()
}

/// Per-month mood distributions for a year, each relative to its own month
pub fn monthly_moods(moods: &[&JournalEntry], presets: &[MoodPreset]) -> Vec<MonthMoods> {
    let mut by_month: Vec<Vec<&JournalEntry>> = vec![Vec::new(); 12];
    for entry in moods {
        if let Some(day) = entry_date(&entry.date) {
            by_month[day.month0() as usize].push(entry);
        }
    }

    by_month
        .iter()
        .zip(MONTH_LABELS)
        .map(|(entries, label)| MonthMoods {
            label,
            shares: mood_distribution(entries, presets),
            has_data: !entries.is_empty(),
        })
        .collect()
}

/// Topic frequency over the content of in-range journal entries and logs
pub fn topics(moods: &[&JournalEntry], logs: &[&ProjectLog]) -> Vec<Topic> {
    let texts = moods
        .iter()
        .map(|e| e.content.as_str())
        .chain(logs.iter().map(|l| l.content.as_str()));
    top_topics(texts, TOPIC_LIMIT)
}

/// Everything the statistics view shows for one period
#[derive(Debug, Clone)]
pub struct StatsReport<'a> {
    pub cursor: RangeCursor,
    pub range: DateRange,
    pub completed: Vec<CompletedTask<'a>>,
    pub logs: Vec<&'a ProjectLog>,
    pub moods: Vec<&'a JournalEntry>,
    pub activity: Vec<ActivityBucket>,
    pub scale: usize,
    pub mood_distribution: Vec<MoodShare>,
    /// Only filled for YEAR
    pub monthly_moods: Vec<MonthMoods>,
    pub topics: Vec<Topic>,
}

impl<'a> StatsReport<'a> {
    pub fn build(workspace: &'a Workspace, cursor: RangeCursor) -> Self {
        let range = cursor.range();
        let completed = completed_tasks(workspace.projects(), &range);
        let logs = logs_in_range(workspace.logs(), &range);
        let moods = moods_in_range(workspace.journal(), &range);
        let activity = activity_series(cursor.granularity, &range, &completed, &logs);
        let scale = chart_scale(&activity);
        let mood_distribution = mood_distribution(&moods, workspace.mood_presets());
        let monthly_moods = match cursor.granularity {
            Granularity::Year => monthly_moods(&moods, workspace.mood_presets()),
            _ => Vec::new(),
        };
        let topics = topics(&moods, &logs);

        tracing::debug!(
            range = %cursor.granularity,
            completed = completed.len(),
            logs = logs.len(),
            moods = moods.len(),
            "stats computed"
        );

        Self {
            cursor,
            range,
            completed,
            logs,
            moods,
            activity,
            scale,
            mood_distribution,
            monthly_moods,
            topics,
        }
    }
}
