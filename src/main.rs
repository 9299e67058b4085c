//! LevelFit - Fitness Gamification Backend
//!
//! Main entry point for the command-line client.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use levelfit::advice::{workout_prompt, AdviceClient, AdviceError};
use levelfit::progression::{
    Attribute, BodyType, PlayerProfile, ProgressionError, ProgressionEvent, ProgressionTracker,
    WorkoutSession,
};
use levelfit::routines::library::{self, MuscleGroup};
use levelfit::storage::config::{load_config, save_config, AppConfig};
use levelfit::storage::database::Database;

#[derive(Parser)]
#[command(name = "levelfit")]
#[command(author, version, about = "Self-hosted fitness gamification backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a player profile and make it active
    Init {
        /// Display name
        name: String,
    },

    /// Show the player status dashboard
    Status,

    /// Run a workout session and log it
    Workout,

    /// Record weight and height, deriving body type from BMI
    Biometrics {
        /// Weight in kilograms (e.g. "75.5")
        weight: String,

        /// Height in meters (e.g. "1.75")
        height: String,

        /// Override the derived body type
        #[arg(long)]
        body_type: Option<BodyType>,
    },

    /// Spend one attribute point
    Spend {
        /// Attribute to raise (strength, intelligence, resilience)
        attribute: Attribute,
    },

    /// Manage custom routines
    Routine {
        #[command(subcommand)]
        command: RoutineCommands,
    },

    /// Browse the built-in exercise library
    Library {
        /// Muscle group to list (all groups when omitted)
        group: Option<MuscleGroup>,
    },

    /// Ask the AI trainer for workout advice
    Advise,

    /// Watch the profile and run progression checks on every change
    Watch,
}

#[derive(Subcommand)]
enum RoutineCommands {
    /// Create a routine from named exercises
    Create {
        /// Routine name
        name: String,

        /// Exercise names (repeatable)
        #[arg(short = 'e', long = "exercise", required = true)]
        exercises: Vec<String>,
    },

    /// List saved routines
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = load_config()?;
    let db = Arc::new(Database::open(&config.database_path())?);

    if let Commands::Init { name } = &cli.command {
        let profile = db.create_profile(name).await?;
        config.profile_id = Some(profile.id);
        save_config(&config)?;
        println!("Profile created: {} ({})", profile.name, profile.id);
        println!("Level {} | {}", profile.level, profile.rank);
        return Ok(());
    }

    let profile_id = config
        .profile_id
        .context("no active profile; run `levelfit init <name>` first")?;
    let tracker = ProgressionTracker::new(Arc::clone(&db), profile_id);

    match cli.command {
        Commands::Init { .. } => {}

        Commands::Status => {
            let profile = tracker.profile().await?;
            print_status(&profile);
        }

        Commands::Workout => {
            run_workout(&tracker).await?;
        }

        Commands::Biometrics {
            weight,
            height,
            body_type,
        } => match tracker.set_biometrics(&weight, &height, body_type).await {
            Ok(body_type) => {
                println!("Biometrics updated. Body type: {body_type}");
                println!("  {}", body_type.description());
            }
            Err(ProgressionError::Validation(msg)) => println!("Not saved: {msg}"),
            Err(e) => return Err(e.into()),
        },

        Commands::Spend { attribute } => {
            let before = tracker.profile().await?;
            tracker.spend_point(attribute).await?;
            let after = tracker.profile().await?;

            if after.points < before.points {
                println!(
                    "{} raised to {} ({} points left)",
                    attribute,
                    after.attribute(attribute),
                    after.points
                );
            } else {
                println!("No points available to spend.");
            }
        }

        Commands::Routine { command } => match command {
            RoutineCommands::Create { name, exercises } => {
                match tracker.create_routine(&name, exercises).await {
                    Ok(routine) => println!(
                        "Routine saved: {} [{}] with {} exercises",
                        routine.name,
                        routine.tier(),
                        routine.exercises.len()
                    ),
                    Err(ProgressionError::Validation(msg)) => println!("Not saved: {msg}"),
                    Err(e) => return Err(e.into()),
                }
            }
            RoutineCommands::List => {
                let profile = tracker.profile().await?;
                if profile.routines.is_empty() {
                    println!("No routines yet. Create one with `levelfit routine create`.");
                }
                for routine in &profile.routines {
                    println!(
                        "[{}] {} ({} exercises)",
                        routine.tier(),
                        routine.name,
                        routine.exercises.len()
                    );
                    for (index, exercise) in routine.exercises.iter().enumerate() {
                        println!("  {}. {}", index + 1, exercise);
                    }
                }
            }
        },

        Commands::Library { group } => {
            let groups: Vec<MuscleGroup> = match group {
                Some(group) => vec![group],
                None => MuscleGroup::ALL.to_vec(),
            };
            for group in groups {
                println!("{group}");
                for (index, exercise) in library::exercises_for(group).iter().enumerate() {
                    println!("  {}. {}", index + 1, exercise);
                }
            }
        }

        Commands::Advise => {
            run_advise(&config, &tracker).await?;
        }

        Commands::Watch => {
            run_watch(&tracker).await?;
        }
    }

    Ok(())
}

/// Print the status dashboard.
fn print_status(profile: &PlayerProfile) {
    println!(
        "{} | Level {} | {}",
        profile.name.to_uppercase(),
        profile.level,
        profile.current_rank()
    );
    println!(
        "XP: {}/{} ({}%)",
        profile.xp,
        profile.xp_required(),
        profile.xp_percent()
    );
    println!("Coins: {} | Streak: {} days", profile.coins, profile.streak);

    println!("Attribute points: {}", profile.points);
    for attribute in Attribute::ALL {
        println!("  {}: {}", attribute, profile.attribute(attribute));
    }

    match (profile.weight_kg, profile.height_m) {
        (Some(weight), Some(height)) => {
            let body_type = profile
                .body_type
                .map(|b| b.display_name())
                .unwrap_or("not set");
            println!("Biometrics: {weight} kg, {height} m, {body_type}");
        }
        _ => println!("Biometrics not recorded yet. Run `levelfit biometrics`."),
    }

    if !profile.routines.is_empty() {
        println!("Routines:");
        for routine in &profile.routines {
            println!(
                "  [{}] {} ({} exercises)",
                routine.tier(),
                routine.name,
                routine.exercises.len()
            );
        }
    }
}

/// Run an interactive workout session and log the result.
async fn run_workout(tracker: &ProgressionTracker<Database>) -> Result<()> {
    let session = WorkoutSession::start();
    println!("Session started. Press Enter to finish.");

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    let elapsed = session.elapsed();
    println!("Active time: {}", session.format_elapsed());

    match tracker.complete_workout(elapsed, Utc::now().date_naive()).await {
        Ok(reward) => {
            println!("Mission complete! +{} XP, +{} coins", reward.xp, reward.coins);
            if reward.streak_extended {
                println!("Streak extended to {} days.", reward.streak);
            }

            // Surface a level advance right away instead of waiting for a
            // watcher to pick it up
            let profile = tracker.profile().await?;
            if let Some(level_up) = tracker.check_level_up(&profile).await? {
                println!("LEVEL UP! You reached level {} ({}).", level_up.level, level_up.rank);
            }
        }
        Err(ProgressionError::Validation(msg)) => println!("Not logged: {msg}"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Request AI workout advice for the active profile.
async fn run_advise(config: &AppConfig, tracker: &ProgressionTracker<Database>) -> Result<()> {
    let profile = tracker.profile().await?;
    let api_key = std::env::var(&config.advice.api_key_env).unwrap_or_default();
    let client = AdviceClient::new(&config.advice, api_key);

    println!("Consulting the trainer...");
    match client.generate(&workout_prompt(&profile)).await {
        Ok(text) => println!("{text}"),
        Err(AdviceError::Unavailable) => println!("The trainer is offline. Try again later."),
        Err(e) => println!("No advice available: {e}"),
    }

    Ok(())
}

/// Observe the profile until interrupted, printing progression events.
async fn run_watch(tracker: &ProgressionTracker<Database>) -> Result<()> {
    let mut events = tracker.events();
    println!("Watching profile. Ctrl-C to stop.");

    tokio::select! {
        result = tracker.observe() => result?,
        _ = async {
            while let Ok(event) = events.recv().await {
                match event {
                    ProgressionEvent::LevelUp { level, rank } => {
                        println!("LEVEL UP! Level {level} ({rank})");
                    }
                }
            }
        } => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nStopped.");
        }
    }

    Ok(())
}
