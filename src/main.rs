use clap::{Parser, Subcommand};

mod auth;
mod backend;
mod cli;
mod config;
mod db;
mod error;
mod recorder;
mod scoring;
mod store;
mod types;
mod workspace;

use cli::contacts::ProfileArgs;

#[derive(Parser)]
#[command(name = "circle")]
#[command(version)]
#[command(about = "Keep track of the people in your life")]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a .circle directory
    Init {
        /// Directory to initialize .circle in
        #[arg(short, long, default_value = ".")]
        path: String,
    },

    /// Create an account and log in
    Signup {
        email: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in
    Login {
        email: String,

        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log out
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Change your display name
    Rename { name: String },

    /// Add a contact
    Add {
        /// Full name
        name: String,

        /// close_friend, friend, work, family or acquaintance
        #[arg(short, long)]
        relationship: Option<String>,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Edit a contact
    Edit {
        /// Contact ID (or unique prefix)
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New relationship
        #[arg(short, long)]
        relationship: Option<String>,

        /// Override the engagement score (0-100)
        #[arg(long)]
        score: Option<u8>,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Show a contact and its engagement history
    Show {
        /// Contact ID (or unique prefix)
        id: String,
    },

    /// List contacts
    List {
        /// Case-insensitive name search
        #[arg(short, long)]
        search: Option<String>,

        /// Relationship to filter by, or "all"
        #[arg(short, long)]
        relationship: Option<String>,
    },

    /// Log an engagement with a contact
    Log {
        /// Contact ID (or unique prefix)
        id: String,

        /// in-person, video-call, online-message or text
        #[arg(value_parser = ["in-person", "video-call", "online-message", "text"])]
        category: String,

        /// What happened
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Upcoming birthdays and contacts needing attention
    Dashboard,

    /// Export contacts to stdout
    Export {
        /// Output format
        #[arg(short, long, default_value = "json", value_parser = ["json", "md"])]
        format: String,
    },

    /// View or set configuration
    Config {
        /// Config key
        key: Option<String>,

        /// Config value
        value: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Init { path } => cli::contacts::run_init(&path),
        Commands::Signup {
            email,
            name,
            password,
        } => cli::auth::run_signup(&email, name.as_deref(), password),
        Commands::Login { email, password } => cli::auth::run_login(&email, password),
        Commands::Logout => cli::auth::run_logout(),
        Commands::Whoami => cli::auth::run_whoami(),
        Commands::Rename { name } => cli::auth::run_rename(&name),
        Commands::Add {
            name,
            relationship,
            profile,
        } => cli::contacts::run_add(&name, relationship.as_deref(), profile),
        Commands::Edit {
            id,
            name,
            relationship,
            score,
            profile,
        } => cli::contacts::run_edit(&id, name, relationship.as_deref(), score, profile),
        Commands::Show { id } => cli::contacts::run_show(&id),
        Commands::List {
            search,
            relationship,
        } => cli::contacts::run_list(search.as_deref(), relationship.as_deref()),
        Commands::Log { id, category, note } => {
            cli::contacts::run_log(&id, &category, note.as_deref())
        }
        Commands::Dashboard => cli::dashboard::run_dashboard(),
        Commands::Export { format } => cli::contacts::run_export(&format),
        Commands::Config { key, value } => cli::config::run_config(key.as_deref(), value.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
