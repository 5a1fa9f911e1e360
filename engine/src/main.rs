//! Adaptive Nutrition Engine CLI
//!
//! Reads a JSON request file, runs one engine operation and prints the JSON
//! result to stdout.
//!
//! ## Architecture
//!
//! The engine follows a layered architecture:
//! - CLI: request decoding and output
//! - Services: trend analysis, metabolism, optimization, adaptation
//! - Shared crate: domain types and formulas

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nutrition_engine::config::EngineConfig;
use nutrition_engine::error::EngineResult;
use nutrition_engine::services::{InsightsRequest, MealPlanRequest, MealPlanService, TrendsRequest};
use nutrition_engine::state::EngineState;
use nutrition_engine_shared::types::FailureResponse;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nutrition-engine")]
#[command(about = "Adaptive meal planning from biometric trends", long_about = None)]
struct Cli {
    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an adapted meal plan
    Plan {
        /// Path to a meal plan request (JSON)
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Report metabolic and nutrition insights for a profile
    Insights {
        /// Path to an insights request (JSON)
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Summarize biometric trends
    Trends {
        /// Path to a trends request (JSON)
        #[arg(short, long)]
        request: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    let cli = Cli::parse();

    // Load configuration
    let config = EngineConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if EngineConfig::is_production() { "production" } else { "development" },
        "Starting Adaptive Nutrition Engine"
    );

    let state = EngineState::new(config);
    let now = chrono::Utc::now();

    let succeeded = match &cli.command {
        Commands::Plan { request } => {
            let request: MealPlanRequest = read_request(request)?;
            emit(MealPlanService::generate_at(&state, &request, now), cli.pretty)?
        }
        Commands::Insights { request } => {
            let request: InsightsRequest = read_request(request)?;
            emit(MealPlanService::insights_at(&state, &request, now), cli.pretty)?
        }
        Commands::Trends { request } => {
            let request: TrendsRequest = read_request(request)?;
            emit(MealPlanService::trends_at(&state, &request, now), cli.pretty)?
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid request JSON in {}", path.display()))
}

/// Print the result or its failure shape; returns whether it succeeded
fn emit<T: Serialize>(result: EngineResult<T>, pretty: bool) -> Result<bool> {
    let (value, succeeded) = match result {
        Ok(response) => (serde_json::to_value(&response)?, true),
        Err(err) => {
            error!(code = err.code(), error = %err, "Engine operation failed");
            (serde_json::to_value(FailureResponse::from(&err))?, false)
        }
    };

    let output = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{}", output);
    Ok(succeeded)
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if EngineConfig::is_production() {
            "nutrition_engine=info".into()
        } else {
            "nutrition_engine=debug".into()
        }
    });

    // Logs go to stderr so stdout stays machine-readable
    let subscriber = tracing_subscriber::registry().with(env_filter);

    if EngineConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}
