use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod admin;
mod config;
mod db;
mod error;
mod metrics;
mod models;
mod pages;
mod render;
mod search;
mod session;
mod stats;
#[cfg(test)]
mod testing;

use crate::admin::CourseForm;
use crate::config::Config;
use crate::db::{CatalogStore, PgStore};
use crate::error::CatalogError;
use crate::models::CourseLevel;
use crate::render::OutputFormat;
use crate::session::SessionStore;

#[derive(Parser)]
#[command(name = "learnsphere")]
#[command(about = "Course catalog, enrollment dashboard and admin tools for LearnSphere", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a small demo catalog
    Seed,
    /// Show featured published courses
    Featured {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Browse published courses
    Courses {
        /// Case-insensitive match on title or short description
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show one course
    Course {
        id: Uuid,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Progress overview for the signed-in student
    Dashboard {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Sign in, sign out, or show the current user
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Course administration
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    SignIn {
        #[arg(long)]
        email: String,
    },
    SignOut,
    Whoami,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List every course, newest first
    List,
    /// Create a new course owned by the signed-in user
    Create {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        short_description: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        price: String,
        #[arg(long, default_value = "1", allow_hyphen_values = true)]
        duration_hours: String,
        #[arg(long, value_enum, default_value_t = CourseLevel::Beginner)]
        level: CourseLevel,
        #[arg(long)]
        publish: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = failure_message(&err);
            eprintln!("error: {message}");
            match err.downcast_ref::<CatalogError>() {
                Some(catalog_err) => tracing::error!(error = %catalog_err, "{message}"),
                None => tracing::error!("{message}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// What the user sees on stderr regardless of the log filter.
fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<CatalogError>() {
        Some(catalog_err) => catalog_err.notification(),
        None => format!("{err:#}"),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let sessions = SessionStore::new(cli.config.session_path());

    match cli.command {
        Commands::InitDb => {
            let pool = cli.config.connect().await?;
            db::init_db(&pool).await.context("failed to run migrations")?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = cli.config.connect().await?;
            db::seed(&pool).await.context("failed to seed catalog")?;
            println!("Seed data inserted.");
        }
        Commands::Featured { format } => {
            let store = PgStore::new(cli.config.connect().await?);
            let mut metrics = cli.config.metrics_provider();
            let courses = pages::load_featured(&store, &mut metrics).await?;
            match format {
                OutputFormat::Text => print!("{}", render::render_featured(&courses)),
                OutputFormat::Json => println!("{}", render::to_json(&courses)?),
                OutputFormat::Csv => print!("{}", render::to_csv(&courses)?),
            }
        }
        Commands::Courses { search, format } => {
            let store = PgStore::new(cli.config.connect().await?);
            let mut metrics = cli.config.metrics_provider();
            let view = pages::load_listing(&store, &mut metrics, &search).await?;
            match format {
                OutputFormat::Text => print!("{}", render::render_listing(&view)),
                OutputFormat::Json => println!("{}", render::to_json(&view.courses)?),
                OutputFormat::Csv => print!("{}", render::to_csv(&view.courses)?),
            }
        }
        Commands::Course { id, format } => {
            let store = PgStore::new(cli.config.connect().await?);
            let mut metrics = cli.config.metrics_provider();
            let view = pages::load_detail(&store, &mut metrics, id).await?;
            print!("{}", render::detail_output(&view, format)?);
        }
        Commands::Dashboard { format } => {
            let session = sessions.load()?;
            let store = PgStore::new(cli.config.connect().await?);
            let view = pages::load_dashboard(&store, session.as_ref()).await?;
            print!("{}", render::dashboard_output(&view, format)?);
        }
        Commands::Auth { command } => match command {
            AuthCommands::SignIn { email } => {
                let store = PgStore::new(cli.config.connect().await?);
                let user = store.find_user_by_email(&email).await?.ok_or_else(|| {
                    CatalogError::NotAuthenticated(format!("No account found for {}.", email.trim()))
                })?;
                let session = sessions.establish(user)?;
                println!("Signed in as {}.", session.email());
            }
            AuthCommands::SignOut => {
                if sessions.clear()? {
                    println!("Signed out.");
                } else {
                    println!("No active session.");
                }
            }
            AuthCommands::Whoami => match sessions.load()? {
                Some(session) => println!("{} ({})", session.email(), session.user_id()),
                None => println!("Not signed in."),
            },
        },
        Commands::Admin { command } => {
            let store = PgStore::new(cli.config.connect().await?);
            match command {
                AdminCommands::List => {
                    let rows = admin::list_courses(&store).await?;
                    print!("{}", render::render_admin_listing(&rows));
                }
                AdminCommands::Create {
                    title,
                    short_description,
                    description,
                    price,
                    duration_hours,
                    level,
                    publish,
                } => {
                    let session = sessions.load()?;
                    let mut form = CourseForm {
                        title,
                        short_description,
                        description,
                        price,
                        duration_hours,
                        level,
                        is_published: publish,
                    };
                    let created = admin::create_course(&store, session.as_ref(), &mut form).await?;
                    println!("Course created successfully ({}).", created.course.id);
                    match &created.listing {
                        Ok(rows) => {
                            println!();
                            print!("{}", render::render_admin_listing(rows));
                        }
                        Err(err) => eprintln!(
                            "error: could not refresh course list: {}",
                            err.notification()
                        ),
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_submission_message_is_the_notification() {
        let err = anyhow::Error::from(CatalogError::validation(
            "Invalid Price",
            "Price must be a non-negative number.",
        ));
        assert_eq!(failure_message(&err), "Price must be a non-negative number.");

        let err = anyhow::Error::from(CatalogError::NotAuthenticated(
            "You must be logged in to create a course.".to_string(),
        ));
        assert_eq!(failure_message(&err), "You must be logged in to create a course.");
    }

    #[test]
    fn other_errors_keep_their_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("failed to seed catalog");
        assert_eq!(failure_message(&err), "failed to seed catalog: connection refused");
    }
}
