use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use zen_core::garden::garden_rows;
use zen_core::ledger::{self, MAX_GARDEN_LEVEL};
use zen_core::*;

#[derive(Parser)]
#[command(name = "zen")]
#[command(about = "Meditation timer with a garden that grows with you", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show meditation totals, streak and garden (default)
    Status {
        /// Print the progress record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a meditation session with a breathing guide
    Meditate {
        /// Session length in minutes (1-120)
        #[arg(long, short, conflicts_with = "preset")]
        minutes: Option<String>,

        /// Quick-pick length from the configured presets (default 5, 10, 15, 20)
        #[arg(long, short)]
        preset: Option<u32>,

        /// Breathing technique id (see `zen techniques`)
        #[arg(long, short)]
        technique: Option<String>,

        /// Auto-complete (for testing) - credit the full session without waiting
        #[arg(long)]
        auto_complete: bool,
    },

    /// Record a session done away from the timer
    Log {
        /// Minutes meditated (1-120)
        #[arg(long, short)]
        minutes: String,

        /// Day the session happened (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List breathing techniques
    Techniques,

    /// Draw the garden for the current level
    Garden,
}

struct Context {
    config: Config,
    data_dir: PathBuf,
}

impl Context {
    fn ledger(&self) -> ProgressLedger<FileStore> {
        let store = FileStore::new(Config::storage_path(&self.data_dir));
        ProgressLedger::new(store, &self.config.storage.key_prefix)
    }

    fn today(&self) -> NaiveDate {
        ledger::today(self.config.streak.day_boundary)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    zen_core::logging::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Technique catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    let ctx = Context { config, data_dir };

    match cli.command {
        Some(Commands::Status { json }) => cmd_status(&ctx, json),
        Some(Commands::Meditate {
            minutes,
            preset,
            technique,
            auto_complete,
        }) => cmd_meditate(&ctx, minutes, preset, technique, auto_complete).await,
        Some(Commands::Log { minutes, date }) => cmd_log(&ctx, &minutes, date),
        Some(Commands::Techniques) => cmd_techniques(&ctx),
        Some(Commands::Garden) => cmd_garden(&ctx),
        None => cmd_status(&ctx, false),
    }
}

fn cmd_status(ctx: &Context, json: bool) -> Result<()> {
    let record = ctx.ledger().load();

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    display_progress(&record);
    println!();
    display_garden(record.garden_level);
    Ok(())
}

async fn cmd_meditate(
    ctx: &Context,
    minutes: Option<String>,
    preset: Option<u32>,
    technique: Option<String>,
    auto_complete: bool,
) -> Result<()> {
    let minutes = match (minutes, preset) {
        (Some(minutes), _) => minutes,
        (None, Some(preset)) => ctx.config.session.preset(preset)?.to_string(),
        (None, None) => ctx.config.session.default_minutes.to_string(),
    };
    let technique =
        technique.unwrap_or_else(|| ctx.config.session.default_technique.clone());
    let session_config = SessionConfig::parse(&minutes, technique)?;

    let catalog = get_default_catalog();
    let technique = catalog.require(session_config.technique_id())?;

    println!();
    println!(
        "  🧘 {} min · {} ({})",
        session_config.minutes(),
        technique.name,
        technique.description
    );

    let outcome = if auto_complete {
        SessionOutcome {
            minutes_credited: session_config.minutes(),
            completed: true,
        }
    } else {
        println!("  Ctrl-C ends the session early.");
        println!();
        run_live_session(session_config, catalog).await?
    };

    let record = ctx.ledger().apply_outcome(&outcome, ctx.today())?;

    println!();
    let plural = if outcome.minutes_credited == 1 { "" } else { "s" };
    if outcome.completed {
        println!(
            "✓ Session complete: {} minute{} of peace",
            outcome.minutes_credited, plural
        );
    } else {
        println!(
            "✓ Session ended early: {} minute{} credited",
            outcome.minutes_credited, plural
        );
    }
    println!(
        "  Your garden has grown. Total: {}m · Streak: {}d",
        record.total_minutes, record.streak_days
    );
    Ok(())
}

async fn run_live_session(
    config: SessionConfig,
    catalog: &TechniqueCatalog,
) -> Result<SessionOutcome> {
    let mut session = ActiveSession::start(config, catalog)?;
    let mut redraw = tokio::time::interval(Duration::from_millis(200));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(SessionEvent::Tick { .. }) => draw_session_line(&session)?,
                Some(SessionEvent::Completed { .. }) | None => break,
            },
            _ = redraw.tick() => draw_session_line(&session)?,
            _ = &mut ctrl_c => break,
        }
    }

    println!();
    Ok(session.end())
}

fn draw_session_line(session: &ActiveSession) -> Result<()> {
    let breath = session.breath();
    let width = (breath.scale * 10.0).round() as usize;
    print!(
        "\r  {}   {:<12} {:<14}",
        session.countdown_label(),
        breath.label,
        "●".repeat(width.saturating_sub(9))
    );
    io::stdout().flush()?;
    Ok(())
}

fn cmd_log(ctx: &Context, minutes: &str, date: Option<NaiveDate>) -> Result<()> {
    let session_config = SessionConfig::parse(minutes, ctx.config.session.default_technique.clone())?;
    let date = date.unwrap_or_else(|| ctx.today());

    let record = ctx
        .ledger()
        .apply_session(session_config.minutes(), date)?;

    println!(
        "✓ Logged {} minutes on {}",
        session_config.minutes(),
        date
    );
    println!(
        "  Total: {}m · Streak: {}d · Garden: Lv. {}",
        record.total_minutes, record.streak_days, record.garden_level
    );
    Ok(())
}

fn cmd_techniques(ctx: &Context) -> Result<()> {
    for technique in get_default_catalog().iter() {
        let marker = if technique.id == ctx.config.session.default_technique {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<6} {:<6} {:<26} {}s cycle",
            marker,
            technique.id,
            technique.name,
            technique.description,
            technique.cycle_seconds()
        );
    }
    Ok(())
}

fn cmd_garden(ctx: &Context) -> Result<()> {
    let record = ctx.ledger().load();
    display_garden(record.garden_level);
    Ok(())
}

fn display_progress(record: &ProgressRecord) {
    println!("  🧘 Total:   {}m", record.total_minutes);
    println!("  🔥 Streak:  {}d", record.streak_days);
    println!(
        "  🌿 Garden:  Lv. {} · {}",
        record.garden_level,
        level_label(record.garden_level)
    );
    match level_progress(record.garden_level, record.total_minutes) {
        Some(pct) => println!("     Next level: {}%", pct),
        None => println!("     Max level ✦"),
    }
    if let Some(day) = record.last_meditation_day {
        println!("     Last sat: {}", day);
    }
}

fn display_garden(level: u8) {
    let cells = render_garden(level.min(MAX_GARDEN_LEVEL), &mut rand::thread_rng());
    println!("  Zen Garden · Level {}", level);
    for row in garden_rows(&cells) {
        println!("  {}", row);
    }
}
