use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "habitkit-cli", version, about = "Habitkit CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Habits scheduled for a date
    Today {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// User id, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },
    /// Log a completion
    Complete {
        /// Habit id
        habit_id: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Completed amount; omitted means the full target
        #[arg(long)]
        amount: Option<u32>,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
    },
    /// Per-date overrides
    Override {
        #[command(subcommand)]
        action: commands::overrides::OverrideAction,
    },
    /// Dashboard summary
    Dashboard {
        /// User id, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },
    /// Achievement catalog and unlocks
    Achievements {
        #[command(subcommand)]
        action: commands::achievements::AchievementsAction,
    },
    /// Batch worker
    Batch {
        #[command(subcommand)]
        action: commands::batch::BatchAction,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Today { date, user } => commands::today::run(date, user),
        Commands::Complete {
            habit_id,
            date,
            amount,
            note,
        } => commands::complete::run(habit_id, date, amount, note),
        Commands::Override { action } => commands::overrides::run(action),
        Commands::Dashboard { user } => commands::dashboard::run(user),
        Commands::Achievements { action } => commands::achievements::run(action),
        Commands::Batch { action } => commands::batch::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
