use clap::Parser;
use color_eyre::Result;
use creator_studio::cli::{self, Cli, RunContext};
use creator_studio::{Config, Database, Profile, Studio, logging, utils};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from(&utils::expand_path(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    let _logging = logging::init_logging(&config.get_log_dir(), &config.log_level)?;

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?
    .with_limit(config.storage_limit_bytes);

    let mut studio = Studio::open(db);
    let ctx = RunContext {
        today: utils::today(),
        now: utils::now_millis(),
        assume_yes: cli.yes,
        suggestions: config.resolved_suggestions(),
    };

    let outcome = cli::run(cli.command, &mut studio, &ctx);

    // Persist whatever changed, even when the command itself failed part way
    let report = studio.commit();
    for (kind, err) in &report.failed {
        eprintln!("Warning: could not save {}: {}", kind, err);
    }

    outcome?;
    Ok(())
}
