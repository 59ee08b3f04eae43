pub mod calendar;
pub mod cli;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod range;
pub mod repository;
pub mod stats;
pub mod studio;
pub mod suggest;
pub mod topics;
pub mod transfer;
pub mod utils;
pub mod workspace;

pub use config::Config;
pub use database::Database;
pub use models::{CalendarEvent, DailyTodo, JournalEntry, Project, ProjectLog, SubTask, TaskStatus};
pub use range::{DateRange, Granularity, RangeCursor};
pub use studio::{Confirm, Studio};
pub use utils::Profile;
pub use workspace::Workspace;
