use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::calendar::{DayContents, MonthGrid, day_contents, shift_month, task_span};
use crate::database::DatabaseError;
use crate::models::{EventType, PRESET_COLORS};
use crate::range::{Direction, Granularity, RangeCursor};
use crate::stats::StatsReport;
use crate::studio::{Confirm, Studio};
use crate::suggest::{SubtaskSuggester, SuggestConfig};
use crate::topics::topic_weight;
use crate::transfer::TransferError;
use crate::utils::{format_date, parse_date};
use crate::workspace::{EventDraft, JournalSave, ProjectEdit};

#[derive(Parser)]
#[command(name = "cstudio")]
#[command(about = "Creator Studio - projects, calendar, mood journal and stats for creators")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage content projects
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Manage a project's subtasks
    #[command(subcommand)]
    Subtask(SubtaskCommand),
    /// Daily progress logs against projects
    #[command(subcommand)]
    Log(LogCommand),
    /// Calendar events
    #[command(subcommand)]
    Event(EventCommand),
    /// Per-day todo items
    #[command(subcommand)]
    Todo(TodoCommand),
    /// Mood journal
    #[command(subcommand)]
    Journal(JournalCommand),
    /// Mood presets
    #[command(subcommand)]
    Mood(MoodCommand),
    /// Event tag presets
    #[command(subcommand)]
    Tag(TagCommand),
    /// Show statistics for a week, month or year
    Stats {
        #[arg(long, value_enum, default_value_t = Granularity::Week)]
        range: Granularity,
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Go back N periods
        #[arg(long, conflicts_with = "next")]
        prev: Option<u32>,
        /// Go forward N periods
        #[arg(long)]
        next: Option<u32>,
    },
    /// Show the month grid, or one day in detail
    Calendar {
        /// Month to show (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        /// Show one day (YYYY-MM-DD)
        #[arg(long, conflicts_with = "month")]
        day: Option<String>,
        /// Show the month before
        #[arg(long, conflicts_with_all = ["next", "day"])]
        prev: bool,
        /// Show the month after
        #[arg(long, conflicts_with = "day")]
        next: bool,
    },
    /// Generate subtask suggestions for a project
    Suggest {
        /// Project id or id prefix
        project: String,
    },
    /// Write every collection to a JSON backup
    Export { path: PathBuf },
    /// Replace every collection from a JSON backup
    Import { path: PathBuf },
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// List projects, optionally filtered
    List {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long)]
        tag: Option<String>,
    },
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Hex color, e.g. #3B82F6
        #[arg(long)]
        color: Option<String>,
    },
    Show { project: String },
    Edit {
        project: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a project and all of its logs
    Delete { project: String },
    /// Add a tag to a project
    Tag { project: String, tag: String },
    /// Remove a tag from a project
    Untag { project: String, tag: String },
    /// Every tag in use
    Tags,
}

#[derive(Subcommand)]
pub enum SubtaskCommand {
    Add {
        project: String,
        title: String,
        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<String>,
    },
    /// Mark done or not done
    Toggle { project: String, subtask: String },
    Rename {
        project: String,
        subtask: String,
        title: String,
    },
    /// Set explicit start and end dates
    Dates {
        project: String,
        subtask: String,
        start: String,
        #[arg(long)]
        end: Option<String>,
    },
    /// Delete a subtask and its logs
    Delete { project: String, subtask: String },
}

#[derive(Subcommand)]
pub enum LogCommand {
    Add {
        project: String,
        content: String,
        /// Subtask id or id prefix
        #[arg(long)]
        subtask: Option<String>,
        /// Defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    Edit { id: String, content: String },
    Delete { id: String },
    /// A project's logs, newest first
    List { project: String },
}

#[derive(Args)]
pub struct EventFields {
    #[arg(long)]
    pub title: Option<String>,
    /// Date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// Start time (HH:mm)
    #[arg(long)]
    pub start: Option<String>,
    /// End time (HH:mm)
    #[arg(long)]
    pub end: Option<String>,
    /// Tag preset name; its color is used unless --color is given
    #[arg(long)]
    pub tag: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    /// class, deadline or other
    #[arg(long = "type", value_parser = parse_event_type)]
    pub event_type: Option<EventType>,
}

#[derive(Subcommand)]
pub enum EventCommand {
    Add(EventFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: EventFields,
    },
    Delete { id: String },
    List {
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TodoCommand {
    Add {
        text: String,
        #[arg(long)]
        date: Option<String>,
    },
    Toggle { id: String },
    Delete { id: String },
    List {
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum JournalCommand {
    /// Create or update the entry for a day
    Write {
        #[arg(long)]
        date: Option<String>,
        /// Mood preset label
        #[arg(long, default_value = "")]
        mood: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    Show {
        #[arg(long)]
        date: Option<String>,
    },
    Delete {
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MoodCommand {
    List,
    Add {
        label: String,
        #[arg(long)]
        emoji: Option<String>,
        #[arg(long, default_value = PRESET_COLORS[0])]
        color: String,
    },
    Edit {
        id: String,
        label: String,
        #[arg(long)]
        emoji: Option<String>,
        #[arg(long, default_value = PRESET_COLORS[0])]
        color: String,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum TagCommand {
    List,
    Add {
        name: String,
        #[arg(long, default_value = PRESET_COLORS[0])]
        color: String,
    },
    Edit {
        id: String,
        name: String,
        #[arg(long, default_value = PRESET_COLORS[0])]
        color: String,
    },
    Delete { id: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("{0}")]
    TransferError(#[from] TransferError),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("No {kind} matches '{key}'")]
    NotFound { kind: &'static str, key: String },
    #[error("'{key}' matches more than one {kind}, use a longer id")]
    Ambiguous { kind: &'static str, key: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Per-invocation values the handlers need
pub struct RunContext {
    pub today: NaiveDate,
    pub now: i64,
    pub assume_yes: bool,
    pub suggestions: SuggestConfig,
}

/// Confirmation on the terminal, skipped with `--yes`
pub struct PromptConfirm {
    pub assume_yes: bool,
}

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

fn parse_event_type(value: &str) -> Result<EventType, String> {
    match value.to_ascii_lowercase().as_str() {
        "class" => Ok(EventType::Class),
        "deadline" => Ok(EventType::Deadline),
        "other" => Ok(EventType::Other),
        other => Err(format!("unknown event type '{}', expected class, deadline or other", other)),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn checked_date(date: Option<String>, ctx: &RunContext) -> Result<String, CliError> {
    match date {
        Some(date) => {
            parse_date(&date)
                .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", date, e)))?;
            Ok(date)
        }
        None => Ok(format_date(ctx.today)),
    }
}

/// Find the one id equal to `key`, or the only id starting with it
fn resolve_id<'a>(
    ids: impl Iterator<Item = &'a str>,
    key: &str,
    kind: &'static str,
) -> Result<String, CliError> {
    let mut matches = Vec::new();
    for id in ids {
        if id == key {
            return Ok(id.to_string());
        }
        if id.starts_with(key) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => Err(CliError::NotFound {
            kind,
            key: key.to_string(),
        }),
        _ => Err(CliError::Ambiguous {
            kind,
            key: key.to_string(),
        }),
    }
}

fn project_id(studio: &Studio, key: &str) -> Result<String, CliError> {
    resolve_id(
        studio.workspace().projects().iter().map(|p| p.id.as_str()),
        key,
        "project",
    )
}

fn subtask_id(studio: &Studio, project_id: &str, key: &str) -> Result<String, CliError> {
    let project = studio.workspace().project(project_id).ok_or_else(|| CliError::NotFound {
        kind: "project",
        key: project_id.to_string(),
    })?;
    resolve_id(project.sub_tasks.iter().map(|st| st.id.as_str()), key, "subtask")
}

fn rejected(what: &str) -> CliError {
    CliError::InvalidArgument(format!("{} was not accepted, check the values", what))
}

/// Dispatch one command against the open studio
pub fn run(command: Option<Commands>, studio: &mut Studio, ctx: &RunContext) -> Result<(), CliError> {
    let confirm = PromptConfirm {
        assume_yes: ctx.assume_yes,
    };
    match command {
        None => {
            print_day(&day_contents(studio.workspace(), ctx.today));
            Ok(())
        }
        Some(Commands::Project(cmd)) => handle_project(cmd, studio, ctx, &confirm),
        Some(Commands::Subtask(cmd)) => handle_subtask(cmd, studio, ctx),
        Some(Commands::Log(cmd)) => handle_log(cmd, studio, ctx, &confirm),
        Some(Commands::Event(cmd)) => handle_event(cmd, studio, ctx),
        Some(Commands::Todo(cmd)) => handle_todo(cmd, studio, ctx),
        Some(Commands::Journal(cmd)) => handle_journal(cmd, studio, ctx, &confirm),
        Some(Commands::Mood(cmd)) => handle_mood(cmd, studio),
        Some(Commands::Tag(cmd)) => handle_tag(cmd, studio),
        Some(Commands::Stats {
            range,
            date,
            prev,
            next,
        }) => handle_stats(range, date, prev, next, studio, ctx),
        Some(Commands::Calendar {
            month,
            day,
            prev,
            next,
        }) => {
            let shift = match (prev, next) {
                (true, _) => Some(Direction::Prev),
                (_, true) => Some(Direction::Next),
                _ => None,
            };
            handle_calendar(month, day, shift, studio, ctx)
        }
        Some(Commands::Suggest { project }) => handle_suggest(&project, studio, ctx),
        Some(Commands::Export { path }) => {
            let snapshot = studio.export(&path, ctx.now)?;
            println!(
                "Exported {} projects, {} logs and {} journal entries to {}",
                snapshot.projects.len(),
                snapshot.logs.len(),
                snapshot.journal.len(),
                path.display()
            );
            Ok(())
        }
        Some(Commands::Import { path }) => match studio.import(&path, &confirm) {
            Ok(summary) => {
                println!(
                    "Imported {} projects, {} logs, {} events, {} todos and {} journal entries",
                    summary.projects, summary.logs, summary.events, summary.todos, summary.journal
                );
                Ok(())
            }
            Err(TransferError::NotConfirmed) => {
                println!("Import cancelled, nothing changed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
    }
}

/// Handle `project` subcommands
pub fn handle_project(
    cmd: ProjectCommand,
    studio: &mut Studio,
    ctx: &RunContext,
    confirm: &impl Confirm,
) -> Result<(), CliError> {
    match cmd {
        ProjectCommand::List { query, tag } => {
            let projects = studio.workspace().filter_projects(&query, tag.as_deref());
            if projects.is_empty() {
                println!("No projects");
            }
            for p in projects {
                println!(
                    "{}  {:<11} {:>3}%  {}{}",
                    short_id(&p.id),
                    p.status.label(),
                    p.progress(),
                    p.title,
                    if p.tags.is_empty() {
                        String::new()
                    } else {
                        format!("  [{}]", p.tags.join(", "))
                    }
                );
            }
        }
        ProjectCommand::Add {
            title,
            description,
            color,
        } => {
            let color = color.unwrap_or_else(|| PRESET_COLORS[0].to_string());
            let id = studio
                .workspace_mut()
                .create_project(&title, &description, &color, ctx.now)
                .ok_or_else(|| CliError::InvalidArgument("project title cannot be empty".into()))?;
            println!("Project created successfully (ID: {})", id);
        }
        ProjectCommand::Show { project } => {
            let id = project_id(studio, &project)?;
            print_project(studio, &id);
        }
        ProjectCommand::Edit {
            project,
            title,
            description,
            color,
        } => {
            let id = project_id(studio, &project)?;
            let edit = ProjectEdit {
                title,
                description,
                color,
            };
            if !studio.workspace_mut().edit_project(&id, edit) {
                return Err(rejected("project edit"));
            }
            println!("Project updated");
        }
        ProjectCommand::Delete { project } => {
            let id = project_id(studio, &project)?;
            if studio.delete_project(&id, confirm) {
                println!("Project deleted");
            } else {
                println!("Nothing deleted");
            }
        }
        ProjectCommand::Tag { project, tag } => {
            let id = project_id(studio, &project)?;
            if !studio.workspace_mut().add_tag(&id, &tag) {
                return Err(rejected("tag"));
            }
            println!("Tag added");
        }
        ProjectCommand::Untag { project, tag } => {
            let id = project_id(studio, &project)?;
            if !studio.workspace_mut().remove_tag(&id, &tag) {
                return Err(CliError::NotFound { kind: "tag", key: tag });
            }
            println!("Tag removed");
        }
        ProjectCommand::Tags => {
            for tag in studio.workspace().all_tags() {
                println!("{}", tag);
            }
        }
    }
    Ok(())
}

fn print_project(studio: &Studio, id: &str) {
    let ws = studio.workspace();
    let Some(project) = ws.project(id) else {
        return;
    };
    println!("{} ({})", project.title, project.id);
    if !project.description.is_empty() {
        println!("{}", project.description);
    }
    println!(
        "Status: {}  Progress: {}%  Color: {}",
        project.status.label(),
        project.progress(),
        project.color
    );
    if !project.tags.is_empty() {
        println!("Tags: {}", project.tags.join(", "));
    }
    println!("Subtasks:");
    for st in &project.sub_tasks {
        let span = task_span(&project.id, st, ws.logs());
        println!(
            "  [{}] {}  {}  {} .. {}",
            if st.is_completed { "x" } else { " " },
            short_id(&st.id),
            st.title,
            span.start,
            span.end
        );
    }
    let logs = ws.logs_for_project(&project.id);
    if !logs.is_empty() {
        println!("Logs:");
        for log in logs {
            println!("  {}  {}  {}", log.date, short_id(&log.id), log.content);
        }
    }
}

/// Handle `subtask` subcommands
pub fn handle_subtask(cmd: SubtaskCommand, studio: &mut Studio, ctx: &RunContext) -> Result<(), CliError> {
    let today = format_date(ctx.today);
    match cmd {
        SubtaskCommand::Add {
            project,
            title,
            start,
        } => {
            let pid = project_id(studio, &project)?;
            let id = studio
                .workspace_mut()
                .add_subtask(&pid, &title, start.as_deref(), &today)
                .ok_or_else(|| rejected("subtask"))?;
            println!("Subtask created successfully (ID: {})", id);
        }
        SubtaskCommand::Toggle { project, subtask } => {
            let pid = project_id(studio, &project)?;
            let sid = subtask_id(studio, &pid, &subtask)?;
            let status = studio
                .workspace_mut()
                .toggle_subtask(&pid, &sid, ctx.now)
                .ok_or_else(|| rejected("toggle"))?;
            println!("Project is now {}", status.label());
        }
        SubtaskCommand::Rename {
            project,
            subtask,
            title,
        } => {
            let pid = project_id(studio, &project)?;
            let sid = subtask_id(studio, &pid, &subtask)?;
            if !studio.workspace_mut().rename_subtask(&pid, &sid, &title) {
                return Err(rejected("subtask title"));
            }
            println!("Subtask renamed");
        }
        SubtaskCommand::Dates {
            project,
            subtask,
            start,
            end,
        } => {
            let pid = project_id(studio, &project)?;
            let sid = subtask_id(studio, &pid, &subtask)?;
            if !studio
                .workspace_mut()
                .set_subtask_dates(&pid, &sid, &start, end.as_deref())
            {
                return Err(rejected("date range"));
            }
            println!("Subtask dates updated");
        }
        SubtaskCommand::Delete { project, subtask } => {
            let pid = project_id(studio, &project)?;
            let sid = subtask_id(studio, &pid, &subtask)?;
            studio.workspace_mut().delete_subtask(&pid, &sid);
            println!("Subtask deleted");
        }
    }
    Ok(())
}

/// Handle `log` subcommands
pub fn handle_log(
    cmd: LogCommand,
    studio: &mut Studio,
    ctx: &RunContext,
    confirm: &impl Confirm,
) -> Result<(), CliError> {
    let log_id = |studio: &Studio, key: &str| {
        resolve_id(studio.workspace().logs().iter().map(|l| l.id.as_str()), key, "log")
    };
    match cmd {
        LogCommand::Add {
            project,
            content,
            subtask,
            date,
        } => {
            let pid = project_id(studio, &project)?;
            let sid = subtask.map(|key| subtask_id(studio, &pid, &key)).transpose()?;
            let date = checked_date(date, ctx)?;
            let id = studio
                .workspace_mut()
                .add_log(&pid, sid.as_deref(), &date, &content)
                .ok_or_else(|| CliError::InvalidArgument("log content cannot be empty".into()))?;
            println!("Log created successfully (ID: {})", id);
        }
        LogCommand::Edit { id, content } => {
            let id = log_id(&*studio, &id)?;
            if !studio.workspace_mut().edit_log(&id, &content) {
                return Err(CliError::InvalidArgument("log content cannot be empty".into()));
            }
            println!("Log updated");
        }
        LogCommand::Delete { id } => {
            let id = log_id(&*studio, &id)?;
            if studio.delete_log(&id, confirm) {
                println!("Log deleted");
            } else {
                println!("Nothing deleted");
            }
        }
        LogCommand::List { project } => {
            let pid = project_id(studio, &project)?;
            for log in studio.workspace().logs_for_project(&pid) {
                println!("{}  {}  {}", log.date, short_id(&log.id), log.content);
            }
        }
    }
    Ok(())
}

fn event_draft(fields: EventFields, base: EventDraft) -> EventDraft {
    EventDraft {
        title: fields.title.unwrap_or(base.title),
        date: fields.date.unwrap_or(base.date),
        start_time: fields.start.or(base.start_time),
        end_time: fields.end.or(base.end_time),
        tag: fields.tag.or(base.tag),
        color: fields.color.or(base.color),
        event_type: fields.event_type.unwrap_or(base.event_type),
    }
}

/// Handle `event` subcommands
pub fn handle_event(cmd: EventCommand, studio: &mut Studio, ctx: &RunContext) -> Result<(), CliError> {
    match cmd {
        EventCommand::Add(fields) => {
            let base = EventDraft {
                date: format_date(ctx.today),
                ..Default::default()
            };
            let id = studio
                .workspace_mut()
                .add_event(event_draft(fields, base))
                .ok_or_else(|| rejected("event"))?;
            println!("Event created successfully (ID: {})", id);
        }
        EventCommand::Update { id, fields } => {
            let id = resolve_id(
                studio.workspace().events().iter().map(|e| e.id.as_str()),
                &id,
                "event",
            )?;
            let base = studio
                .workspace()
                .event(&id)
                .map(|e| EventDraft {
                    title: e.title.clone(),
                    date: e.date.clone(),
                    start_time: e.start_time.clone(),
                    end_time: e.end_time.clone(),
                    tag: e.tag.clone(),
                    color: e.color.clone(),
                    event_type: e.event_type,
                })
                .unwrap_or_default();
            if !studio.workspace_mut().update_event(&id, event_draft(fields, base)) {
                return Err(rejected("event"));
            }
            println!("Event updated");
        }
        EventCommand::Delete { id } => {
            let id = resolve_id(
                studio.workspace().events().iter().map(|e| e.id.as_str()),
                &id,
                "event",
            )?;
            studio.workspace_mut().delete_event(&id);
            println!("Event deleted");
        }
        EventCommand::List { date } => {
            let date = checked_date(date, ctx)?;
            let day = day_contents(studio.workspace(), parse_date(&date).unwrap_or(ctx.today));
            print_events(&day);
        }
    }
    Ok(())
}

/// Handle `todo` subcommands
pub fn handle_todo(cmd: TodoCommand, studio: &mut Studio, ctx: &RunContext) -> Result<(), CliError> {
    let todo_id = |studio: &Studio, key: &str| {
        resolve_id(studio.workspace().todos().iter().map(|t| t.id.as_str()), key, "todo")
    };
    match cmd {
        TodoCommand::Add { text, date } => {
            let date = checked_date(date, ctx)?;
            let id = studio
                .workspace_mut()
                .add_todo(&date, &text)
                .ok_or_else(|| CliError::InvalidArgument("todo text cannot be empty".into()))?;
            println!("Todo created successfully (ID: {})", id);
        }
        TodoCommand::Toggle { id } => {
            let id = todo_id(&*studio, &id)?;
            match studio.workspace_mut().toggle_todo(&id) {
                Some(true) => println!("Todo done"),
                _ => println!("Todo reopened"),
            }
        }
        TodoCommand::Delete { id } => {
            let id = todo_id(&*studio, &id)?;
            studio.workspace_mut().delete_todo(&id);
            println!("Todo deleted");
        }
        TodoCommand::List { date } => {
            let date = checked_date(date, ctx)?;
            for todo in studio.workspace().todos_for(&date) {
                println!(
                    "[{}] {}  {}",
                    if todo.completed { "x" } else { " " },
                    short_id(&todo.id),
                    todo.text
                );
            }
        }
    }
    Ok(())
}

/// Handle `journal` subcommands
pub fn handle_journal(
    cmd: JournalCommand,
    studio: &mut Studio,
    ctx: &RunContext,
    confirm: &impl Confirm,
) -> Result<(), CliError> {
    match cmd {
        JournalCommand::Write {
            date,
            mood,
            content,
        } => {
            let date = checked_date(date, ctx)?;
            match studio.workspace_mut().save_journal(&date, &mood, &content, ctx.now) {
                Some(JournalSave::Created) => println!("Journal entry saved for {}", date),
                Some(JournalSave::Updated) => println!("Journal entry updated for {}", date),
                None => println!("Nothing to save, give a mood or some content"),
            }
        }
        JournalCommand::Show { date } => {
            let date = checked_date(date, ctx)?;
            match studio.workspace().journal_for(&date) {
                Some(entry) => {
                    println!("{}  {}", entry.date, entry.mood);
                    if !entry.content.is_empty() {
                        println!("{}", entry.content);
                    }
                }
                None => println!("No entry for {}", date),
            }
        }
        JournalCommand::Delete { date } => {
            let date = checked_date(date, ctx)?;
            if studio.delete_journal(&date, confirm) {
                println!("Journal entry deleted");
            } else {
                println!("Nothing deleted");
            }
        }
    }
    Ok(())
}

/// Handle `mood` subcommands
pub fn handle_mood(cmd: MoodCommand, studio: &mut Studio) -> Result<(), CliError> {
    let mood_id = |studio: &Studio, key: &str| {
        resolve_id(
            studio.workspace().mood_presets().iter().map(|m| m.id.as_str()),
            key,
            "mood preset",
        )
    };
    match cmd {
        MoodCommand::List => {
            for m in studio.workspace().mood_presets() {
                println!(
                    "{}  {} {}  {}",
                    short_id(&m.id),
                    m.emoji.as_deref().unwrap_or(" "),
                    m.label,
                    m.color
                );
            }
        }
        MoodCommand::Add { label, emoji, color } => {
            let id = studio
                .workspace_mut()
                .add_mood_preset(&label, emoji.as_deref(), &color)
                .ok_or_else(|| rejected("mood preset"))?;
            println!("Mood preset created successfully (ID: {})", id);
        }
        MoodCommand::Edit {
            id,
            label,
            emoji,
            color,
        } => {
            let id = mood_id(&*studio, &id)?;
            if !studio
                .workspace_mut()
                .update_mood_preset(&id, &label, emoji.as_deref(), &color)
            {
                return Err(rejected("mood preset"));
            }
            println!("Mood preset updated");
        }
        MoodCommand::Delete { id } => {
            let id = mood_id(&*studio, &id)?;
            studio.workspace_mut().delete_mood_preset(&id);
            println!("Mood preset deleted");
        }
    }
    Ok(())
}

/// Handle `tag` subcommands
pub fn handle_tag(cmd: TagCommand, studio: &mut Studio) -> Result<(), CliError> {
    let tag_id = |studio: &Studio, key: &str| {
        resolve_id(
            studio.workspace().tag_presets().iter().map(|t| t.id.as_str()),
            key,
            "tag preset",
        )
    };
    match cmd {
        TagCommand::List => {
            for t in studio.workspace().tag_presets() {
                println!("{}  {}  {}", short_id(&t.id), t.name, t.color);
            }
        }
        TagCommand::Add { name, color } => {
            let id = studio
                .workspace_mut()
                .add_tag_preset(&name, &color)
                .ok_or_else(|| rejected("tag preset"))?;
            println!("Tag preset created successfully (ID: {})", id);
        }
        TagCommand::Edit { id, name, color } => {
            let id = tag_id(&*studio, &id)?;
            if !studio.workspace_mut().update_tag_preset(&id, &name, &color) {
                return Err(rejected("tag preset"));
            }
            println!("Tag preset updated");
        }
        TagCommand::Delete { id } => {
            let id = tag_id(&*studio, &id)?;
            studio.workspace_mut().delete_tag_preset(&id);
            println!("Tag preset deleted");
        }
    }
    Ok(())
}

const CHART_WIDTH: usize = 30;

/// Most `*` marks a topic gets in the stats listing
const TOPIC_MARKS: f64 = 5.0;

/// Handle the `stats` command
pub fn handle_stats(
    range: Granularity,
    date: Option<String>,
    prev: Option<u32>,
    next: Option<u32>,
    studio: &Studio,
    ctx: &RunContext,
) -> Result<(), CliError> {
    let reference = match date {
        Some(date) => parse_date(&date)
            .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", date, e)))?,
        None => ctx.today,
    };
    let mut cursor = RangeCursor::new(range, reference);
    for _ in 0..prev.unwrap_or(0) {
        cursor.step(Direction::Prev);
    }
    for _ in 0..next.unwrap_or(0) {
        cursor.step(Direction::Next);
    }

    let report = StatsReport::build(studio.workspace(), cursor);
    println!("{} ({})", cursor.title(), range);
    println!(
        "Completed tasks: {}  Logs: {}  Journal entries: {}",
        report.completed.len(),
        report.logs.len(),
        report.moods.len()
    );

    println!("\nActivity");
    for bucket in &report.activity {
        let width = bucket.total() * CHART_WIDTH / report.scale.max(1);
        println!(
            "  {:>3} {:<width$} {} tasks, {} logs",
            bucket.label,
            "#".repeat(width),
            bucket.tasks,
            bucket.logs,
            width = CHART_WIDTH
        );
    }

    println!("\nMoods");
    if report.mood_distribution.is_empty() {
        println!("  no entries");
    }
    for share in &report.mood_distribution {
        println!("  {:<12} {:>5.1}%  ({})", share.mood, share.percent, share.count);
    }

    if !report.monthly_moods.is_empty() {
        println!("\nMoods by month");
        for month in &report.monthly_moods {
            if !month.has_data {
                println!("  {}  no data", month.label);
                continue;
            }
            let shares: Vec<String> = month
                .shares
                .iter()
                .map(|s| format!("{} {:.0}%", s.mood, s.percent))
                .collect();
            println!("  {}  {}", month.label, shares.join(", "));
        }
    }

    if let Some(top) = report.topics.first() {
        println!("\nTopics");
        for topic in &report.topics {
            let weight = topic_weight(topic.count, top.count, 1.0, TOPIC_MARKS);
            println!(
                "  {:<16} {:<marks$} ({})",
                topic.word,
                "*".repeat(weight.round() as usize),
                topic.count,
                marks = TOPIC_MARKS as usize
            );
        }
    }
    Ok(())
}

/// Handle the `calendar` command
pub fn handle_calendar(
    month: Option<String>,
    day: Option<String>,
    shift: Option<Direction>,
    studio: &Studio,
    ctx: &RunContext,
) -> Result<(), CliError> {
    if let Some(day) = day {
        let date = parse_date(&day)
            .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", day, e)))?;
        print_day(&day_contents(studio.workspace(), date));
        return Ok(());
    }

    let first = match month {
        Some(month) => parse_date(&format!("{}-01", month)).map_err(|e| {
            CliError::DateParseError(format!("Invalid month '{}', expected YYYY-MM: {}", month, e))
        })?,
        None => ctx.today,
    };
    let first = match shift {
        Some(direction) => shift_month(first, direction),
        None => first,
    };
    let grid = MonthGrid::build(studio.workspace(), first.year(), first.month())
        .ok_or_else(|| CliError::InvalidArgument("month out of range".into()))?;

    println!("{:^28}", grid.title());
    println!("  Su  Mo  Tu  We  Th  Fr  Sa");
    for week in grid.weeks() {
        let row: Vec<String> = week
            .iter()
            .map(|cell| match cell {
                Some(day) => {
                    let marker = if day.is_empty() { ' ' } else { '*' };
                    format!("{:>3}{}", day.date.day(), marker)
                }
                None => "    ".to_string(),
            })
            .collect();
        println!("{}", row.join(""));
    }
    for day in grid.days.iter().filter(|d| !d.is_empty()) {
        let mut parts = Vec::new();
        if !day.events.is_empty() {
            parts.push(format!("{} event(s)", day.events.len()));
        }
        if !day.bars.is_empty() {
            parts.push(format!("{} task(s)", day.bars.len()));
        }
        if !day.todos.is_empty() {
            parts.push(format!("{} todo(s)", day.todos.len()));
        }
        if !day.logs.is_empty() {
            parts.push(format!("{} log(s)", day.logs.len()));
        }
        if let Some(entry) = day.journal {
            parts.push(format!("mood: {}", entry.mood));
        }
        println!("{}  {}", day.date.format("%b %d"), parts.join(", "));
    }
    Ok(())
}

fn print_events(day: &DayContents<'_>) {
    for event in &day.events {
        let time = match (&event.start_time, &event.end_time) {
            (Some(start), Some(end)) => format!("{}-{}", start, end),
            (Some(start), None) => start.clone(),
            _ => "all day".to_string(),
        };
        println!(
            "  {:<11} {}{}  {}",
            time,
            event.title,
            event.tag.as_deref().map(|t| format!(" [{}]", t)).unwrap_or_default(),
            short_id(&event.id)
        );
    }
}

fn print_day(day: &DayContents<'_>) {
    println!("{}", day.date.format("%A, %B %-d %Y"));
    if day.is_empty() {
        println!("  nothing planned");
        return;
    }
    if !day.events.is_empty() {
        println!("Events");
        print_events(day);
    }
    if !day.bars.is_empty() {
        println!("Tasks");
        for bar in &day.bars {
            let edge = match (bar.is_start, bar.is_end) {
                (true, true) => "",
                (true, false) => "  (starts)",
                (false, true) => "  (ends)",
                (false, false) => "  (continues)",
            };
            println!("  {}: {}{}", bar.project_title, bar.task_title, edge);
        }
    }
    if !day.todos.is_empty() {
        println!("Todos");
        for todo in &day.todos {
            println!("  [{}] {}", if todo.completed { "x" } else { " " }, todo.text);
        }
    }
    if !day.logs.is_empty() {
        println!("Logs");
        for log in &day.logs {
            println!("  {}", log.content);
        }
    }
    if let Some(entry) = day.journal {
        println!("Journal: {}", if entry.mood.is_empty() { "-" } else { entry.mood.as_str() });
        if !entry.content.is_empty() {
            println!("  {}", entry.content);
        }
    }
}

/// Handle the `suggest` command
pub fn handle_suggest(project: &str, studio: &mut Studio, ctx: &RunContext) -> Result<(), CliError> {
    let pid = project_id(studio, project)?;
    let suggester = SubtaskSuggester::new(ctx.suggestions.clone());
    let Some(outcome) = studio.suggest_subtasks(&suggester, &pid, &format_date(ctx.today)) else {
        println!("Suggestions are already being generated for this project");
        return Ok(());
    };
    if outcome.dropped {
        println!("The project was deleted, suggestions dropped");
        return Ok(());
    }
    if let Some(err) = &outcome.error {
        eprintln!("Could not reach the suggestion service ({}), using a default list", err);
    }
    for title in &outcome.suggested {
        println!("  - {}", title);
    }
    println!("Added {} new subtask(s)", outcome.added);
    Ok(())
}
