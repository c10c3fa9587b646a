mod config;
mod content;
mod db;
mod error;
mod models;
mod progress;
mod scoring;
mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::Config;
use content::ContentStore;
use db::{Database, NewUser};
use error::AppError;
use models::{JsonOutput, Role};

#[derive(Parser)]
#[command(name = "lms")]
#[command(about = "A learning-management backend: courses, lessons, graded tests and progress")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// SQLite database path (overrides LMS_DB)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Content storage root (overrides LMS_STORAGE)
    #[arg(long, global = true, value_name = "DIR")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and content storage
    Init,

    /// Insert demo users, a course, modules and lessons
    Seed,

    /// Run the HTTP API
    Serve {
        /// Bind address (overrides LMS_ADDR)
        #[arg(long, short)]
        addr: Option<String>,
    },

    /// Manage users
    #[command(subcommand)]
    User(UserCommands),

    /// List active courses and their modules
    Courses,

    /// Show a user's progress across all active modules
    Progress {
        /// User email
        email: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Add a user
    Add {
        /// Email address (must be unique)
        email: String,

        /// Password
        #[arg(long, short)]
        password: String,

        /// Full name
        #[arg(long, short)]
        name: Option<String>,

        /// Role: student/creator/hr
        #[arg(long, short, default_value = "student")]
        role: String,

        /// Grant superuser rights
        #[arg(long)]
        superuser: bool,
    },

    /// List all users
    List,

    /// Deactivate a user; their requests are rejected from then on
    Deactivate {
        /// User email
        email: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = Config::from_env()?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(storage) = &cli.storage {
        config.storage_path = storage.clone();
    }
    if let Commands::Serve {
        addr: Some(addr), ..
    } = &cli.command
    {
        config.bind_addr = config::parse_addr(addr)?;
    }
    Ok(config)
}

fn open_database(config: &Config) -> Result<Database, Box<dyn std::error::Error>> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.db_path)?;
    db.init()?;
    Ok(db)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&cli)?;
    let db = open_database(&config)?;

    match cli.command {
        Commands::Init => {
            ContentStore::open(&config.storage_path, config.max_video_bytes)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", config.db_path.display());
                println!("Content storage at: {}", config.storage_path.display());
            }
        }

        Commands::Seed => {
            let summary = db.seed_demo()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&summary))?);
            } else {
                for email in &summary.users_created {
                    println!("Created user {}", email);
                }
                if summary.course_created {
                    println!(
                        "Created demo course with {} modules and {} lessons.",
                        summary.modules_created, summary.lessons_created
                    );
                } else {
                    println!("Demo course already present.");
                }
            }
        }

        Commands::Serve { .. } => {
            let content = ContentStore::open(&config.storage_path, config.max_video_bytes)?;
            tracing::info!(
                db = %config.db_path.display(),
                storage = %config.storage_path.display(),
                max_video_bytes = config.max_video_bytes,
                "Starting server"
            );
            let state = server::AppState::new(db, content);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(state, config.bind_addr))?;
        }

        Commands::User(user_cmd) => match user_cmd {
            UserCommands::Add {
                email,
                password,
                name,
                role,
                superuser,
            } => {
                let role = Role::from_str(&role)
                    .ok_or_else(|| AppError::Validation(format!("Invalid role '{}'. Use student/creator/hr", role)))?;
                if db.get_user_by_email(&email)?.is_some() {
                    return Err(AppError::Validation(format!("User {} already exists", email)).into());
                }

                let user = db.create_user(&NewUser {
                    email: &email,
                    password: &password,
                    full_name: name.as_deref(),
                    role,
                    is_superuser: superuser,
                })?;

                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&user))?);
                } else {
                    println!("Added {} '{}' with ID: {}", user.role.as_str(), user.email, user.id);
                }
            }

            UserCommands::List => {
                let users = db.list_users()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&users))?);
                } else if users.is_empty() {
                    println!("No users found.");
                } else {
                    println!("{:<38} {:<30} {:<8} ACTIVE", "ID", "EMAIL", "ROLE");
                    println!("{}", "-".repeat(85));
                    for user in users {
                        let role = if user.is_superuser {
                            format!("{}*", user.role.as_str())
                        } else {
                            user.role.as_str().to_string()
                        };
                        println!(
                            "{:<38} {:<30} {:<8} {}",
                            user.id,
                            truncate(&user.email, 28),
                            role,
                            if user.is_active { "yes" } else { "no" }
                        );
                    }
                }
            }

            UserCommands::Deactivate { email } => {
                let user = db.get_user_by_email(&email)?;
                match user {
                    Some(user) => {
                        db.set_user_active(&user.id, false)?;
                        if cli.json {
                            println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                        } else {
                            println!("User {} deactivated.", email);
                        }
                    }
                    None if cli.json => {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::<()>::err("User not found"))?
                        );
                    }
                    None => println!("User not found."),
                }
            }
        },

        Commands::Courses => {
            let courses = db.list_active_courses()?;
            let mut listing = Vec::with_capacity(courses.len());
            for course in courses {
                let modules = db.list_course_modules(&course.id)?;
                listing.push((course, modules));
            }

            if cli.json {
                let data: Vec<_> = listing
                    .iter()
                    .map(|(course, modules)| {
                        serde_json::json!({
                            "course": course,
                            "modules": modules
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
            } else if listing.is_empty() {
                println!("No courses found. Run `lms seed` to add demo content.");
            } else {
                for (course, modules) in listing {
                    println!("{} ({})", course.title, course.id);
                    for module in modules {
                        println!(
                            "  {:<20} {:<40} {} lessons",
                            module.id,
                            truncate(&module.title, 38),
                            module.total_lessons
                        );
                    }
                }
            }
        }

        Commands::Progress { email } => {
            let Some(user) = db.get_user_by_email(&email)? else {
                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("User not found"))?
                    );
                } else {
                    println!("User not found.");
                }
                return Ok(());
            };

            let report = progress::user_report(&db, &user.id)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&report))?);
            } else {
                println!("=== Progress for {} ===", user.email);
                println!("{:<20} {:>9} {:>8} {:>6} ATTEMPTS", "MODULE", "LESSONS", "DONE", "TEST");
                println!("{}", "-".repeat(60));
                for module in report.modules {
                    println!(
                        "{:<20} {:>4}/{:<4} {:>7.0}% {:>6} {}",
                        module.module_id,
                        module.completed_lessons,
                        module.total_lessons,
                        module.progress_percentage,
                        if module.test_passed { "passed" } else { "-" },
                        module.test_attempts
                    );
                }
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
