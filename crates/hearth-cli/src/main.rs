use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use hearth_core::{
    Audience, DedupKey, NewReminder, Person, RecurrenceType, ReminderRule, Snapshot,
    dedup, format_date, format_time, parse_date, parse_time,
};
use hearth_store::{Config, ReminderStore, Store, default_base_dir};

#[derive(Parser)]
#[command(name = "hearth", about = "Shared family reminders: calendar, agenda and list views")]
struct Cli {
    /// Family scope to read and write (overrides config.toml)
    #[arg(long, global = true)]
    scope: Option<String>,

    /// Storage directory (default: $HEARTH_DATA_DIR or ~/.hearth)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a reminder, one per audience
    Add {
        description: String,

        /// Anchor date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,

        /// Time of day (HH:MM)
        #[arg(long, value_parser = parse_time_arg)]
        time: Option<NaiveTime>,

        /// none, daily, weekly or monthly
        #[arg(long, default_value = "none", value_parser = parse_recurrence_arg)]
        repeat: RecurrenceType,

        /// Day of month for monthly reminders (1-31)
        #[arg(long)]
        day: Option<u32>,

        /// Audiences, comma separated (elder, family)
        #[arg(long = "for", value_delimiter = ',', default_value = "elder", value_parser = parse_audience_arg)]
        audiences: Vec<Audience>,
    },

    /// Register or rename a person reminders can be assigned to
    Person {
        id: String,
        name: String,

        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// List reminders without duplicates
    List {
        #[arg(long, value_parser = parse_audience_arg)]
        audience: Option<Audience>,
    },

    /// Show the reminders of one calendar day
    Day {
        /// Date (YYYY-MM-DD), default today
        #[arg(value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        #[arg(long, value_parser = parse_audience_arg)]
        audience: Option<Audience>,
    },

    /// Show a month as a calendar grid
    Month {
        /// Month (YYYY-MM), default the current month
        #[arg(value_parser = parse_month_arg)]
        month: Option<NaiveDate>,

        #[arg(long, value_parser = parse_audience_arg)]
        audience: Option<Audience>,
    },

    /// Today, tomorrow and the rest of the week
    Agenda {
        /// Reference date (YYYY-MM-DD), default today
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        #[arg(long, default_value = "elder", value_parser = parse_audience_arg)]
        audience: Audience,
    },

    /// Assign a reminder to a registered person
    Assign { id: Uuid, person: String },

    /// Mark a reminder as acknowledged
    Ack { id: Uuid },

    /// Delete a reminder
    Delete {
        id: Uuid,

        /// Delete every reminder of the same recurring group
        #[arg(long)]
        all: bool,
    },

    /// Import reminders from a JSON file
    Import { path: PathBuf },

    /// Export reminders to a JSON file
    Export { path: PathBuf },
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("expected YYYY-MM-DD, got '{s}'"))
}

fn parse_month_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(&format!("{}-01", s.trim())).ok_or_else(|| format!("expected YYYY-MM, got '{s}'"))
}

fn parse_time_arg(s: &str) -> std::result::Result<NaiveTime, String> {
    parse_time(s).ok_or_else(|| format!("expected HH:MM, got '{s}'"))
}

fn parse_recurrence_arg(s: &str) -> std::result::Result<RecurrenceType, String> {
    s.parse().map_err(|e: hearth_core::RuleError| e.to_string())
}

fn parse_audience_arg(s: &str) -> std::result::Result<Audience, String> {
    s.parse().map_err(|e: hearth_core::RuleError| e.to_string())
}

struct Session {
    store: Store,
    config: Config,
}

fn base_dir(cli: &Cli) -> PathBuf {
    cli.data_dir
        .clone()
        .or_else(|| std::env::var("HEARTH_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(default_base_dir)
}

fn open_session(cli: &Cli) -> Result<Session> {
    let base = base_dir(cli);
    std::fs::create_dir_all(&base)
        .with_context(|| format!("failed to create {}", base.display()))?;

    let mut config = Config::load(&base).context("failed to load config")?;
    if let Some(scope) = &cli.scope {
        config.scope = scope.clone();
    }

    let store = Store::open(&config.db_path()).context("failed to open reminder store")?;
    store.subscribe(|event| {
        tracing::debug!(
            "scope '{}' changed ({:?}), revision {}",
            event.scope,
            event.kind,
            event.revision
        );
    });
    Ok(Session { store, config })
}

impl Session {
    fn snapshot(&self) -> Result<Snapshot> {
        self.config
            .retry
            .run(|| self.store.snapshot(&self.config.scope))
            .context("failed to load reminders")
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Add {
            description,
            date,
            time,
            repeat,
            day,
            audiences,
        } => {
            let mut draft = NewReminder::new(description, *date);
            draft.time = *time;
            draft.recurrence_type = *repeat;
            draft.recurrence_day = *day;
            draft.audiences = audiences.clone();
            cmd_add(&cli, &draft)
        }
        Commands::Person {
            id,
            name,
            avatar_url,
        } => cmd_person(&cli, id, name, avatar_url.as_deref()),
        Commands::List { audience } => cmd_list(&cli, *audience),
        Commands::Day { date, audience } => cmd_day(&cli, date.unwrap_or_else(today), *audience),
        Commands::Month { month, audience } => {
            cmd_month(&cli, month.unwrap_or_else(today), *audience)
        }
        Commands::Agenda { date, audience } => {
            cmd_agenda(&cli, date.unwrap_or_else(today), *audience)
        }
        Commands::Assign { id, person } => cmd_assign(&cli, *id, person),
        Commands::Ack { id } => cmd_ack(&cli, *id),
        Commands::Delete { id, all } => cmd_delete(&cli, *id, *all),
        Commands::Import { path } => cmd_import(&cli, path),
        Commands::Export { path } => cmd_export(&cli, path),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_rule(rule: &ReminderRule) -> String {
    let time = rule.time.map_or_else(|| "--:--".to_string(), format_time);
    let mut line = format!("{time}  {}", rule.description);
    if rule.recurrence_type.is_recurring() {
        line.push_str(&format!(" [{}]", rule.recurrence_type.as_str().to_lowercase()));
    }
    if let Some(person) = &rule.assigned_to {
        line.push_str(&format!(" @{}", person.name));
    }
    if rule.is_acknowledged {
        line.push_str(" (ack)");
    }
    line
}

fn print_rules(rules: &[&ReminderRule], empty: &str) {
    if rules.is_empty() {
        println!("  {empty}");
    }
    for rule in rules {
        println!("  {}", render_rule(rule));
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_add(cli: &Cli, draft: &NewReminder) -> Result<()> {
    let session = open_session(cli)?;
    let scope = &session.config.scope;
    let ids = session
        .config
        .retry
        .run(|| session.store.create(scope, draft))
        .context("failed to create reminder")?;

    for id in ids {
        println!("created {id}");
    }
    Ok(())
}

fn cmd_person(cli: &Cli, id: &str, name: &str, avatar_url: Option<&str>) -> Result<()> {
    let session = open_session(cli)?;
    let person = Person {
        id: id.to_string(),
        name: name.to_string(),
        avatar_url: avatar_url.map(str::to_string),
    };
    session
        .config
        .retry
        .run(|| session.store.upsert_person(&person))
        .context("failed to save person")?;
    println!("saved person {id} ({name})");
    Ok(())
}

fn cmd_list(cli: &Cli, audience: Option<Audience>) -> Result<()> {
    let session = open_session(cli)?;
    let snapshot = session.snapshot()?;

    let rules = match audience {
        Some(audience) => snapshot.list(audience),
        None => dedup(snapshot.rules().iter().filter(|r| !r.deleted), DedupKey::Exact),
    };
    if rules.is_empty() {
        println!("(no reminders)");
    }
    for rule in rules {
        println!("{}  {}  {}", rule.id, format_date(rule.date), render_rule(rule));
    }
    Ok(())
}

fn cmd_day(cli: &Cli, date: NaiveDate, audience: Option<Audience>) -> Result<()> {
    let session = open_session(cli)?;
    let snapshot = session.snapshot()?;

    println!("{}", date.format("%A %Y-%m-%d"));
    print_rules(&snapshot.calendar_day(date, date, audience), "(nothing)");
    Ok(())
}

fn cmd_month(cli: &Cli, month: NaiveDate, audience: Option<Audience>) -> Result<()> {
    let session = open_session(cli)?;
    let snapshot = session.snapshot()?;

    println!("{}", month.format("%B %Y"));
    for cell in snapshot.month_grid(month, audience) {
        if cell.reminders.is_empty() {
            continue;
        }
        println!("{}", format_date(cell.date));
        print_rules(&cell.reminders, "");
    }
    Ok(())
}

fn cmd_agenda(cli: &Cli, now: NaiveDate, audience: Audience) -> Result<()> {
    let session = open_session(cli)?;
    let snapshot = session.snapshot()?;
    let agenda = snapshot.agenda(now, audience, session.config.week_start);

    println!("Today");
    print_rules(&agenda.today, "(nothing)");
    println!("Tomorrow");
    print_rules(&agenda.tomorrow, "(nothing)");
    println!("Later this week");
    print_rules(&agenda.upcoming, "(nothing)");
    Ok(())
}

fn cmd_assign(cli: &Cli, id: Uuid, person: &str) -> Result<()> {
    let session = open_session(cli)?;
    session
        .config
        .retry
        .run(|| {
            session.store.ensure_in_scope(&session.config.scope, id)?;
            session.store.assign(id, person)
        })
        .context("failed to assign reminder")?;
    println!("assigned {id} to {person}");
    Ok(())
}

fn cmd_ack(cli: &Cli, id: Uuid) -> Result<()> {
    let session = open_session(cli)?;
    session
        .config
        .retry
        .run(|| {
            session.store.ensure_in_scope(&session.config.scope, id)?;
            session.store.acknowledge(id)
        })
        .context("failed to acknowledge reminder")?;
    println!("acknowledged {id}");
    Ok(())
}

fn cmd_delete(cli: &Cli, id: Uuid, all: bool) -> Result<()> {
    let session = open_session(cli)?;
    let mode = session.config.delete_mode;
    let retry = session.config.retry;

    retry
        .run(|| session.store.ensure_in_scope(&session.config.scope, id))
        .context("failed to load reminder")?;

    if all {
        let removed = retry
            .run(|| session.store.delete_group_of(id, mode))
            .context("failed to delete reminder group")?;
        println!("deleted {removed} reminder(s)");
    } else {
        retry
            .run(|| session.store.delete(id, mode))
            .context("failed to delete reminder")?;
        println!("deleted {id}");
    }
    Ok(())
}

fn cmd_import(cli: &Cli, path: &Path) -> Result<()> {
    let session = open_session(cli)?;
    let summary = session
        .config
        .retry
        .run(|| session.store.import_json_file(&session.config.scope, path))
        .context("failed to import JSON")?;

    println!(
        "imported {} reminder(s) from {} ({} skipped)",
        summary.imported,
        path.display(),
        summary.skipped
    );
    Ok(())
}

fn cmd_export(cli: &Cli, path: &Path) -> Result<()> {
    let session = open_session(cli)?;
    let count = session
        .config
        .retry
        .run(|| session.store.export_json_file(&session.config.scope, path))
        .context("failed to export JSON")?;

    println!("exported {count} reminder(s) to {}", path.display());
    Ok(())
}
