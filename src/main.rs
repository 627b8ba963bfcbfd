use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use leanwave::config::Config;
use leanwave::models::{Mode, PLACEHOLDER_PROJECT_ID};
use leanwave::planner::{sequence, synthesize};
use leanwave::{api, db, mcp, planner_from_config};

#[derive(Parser)]
#[command(name = "leanwave")]
#[command(about = "Turn product ideas into risk-scored features, delivery waves and agent prompts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Start MCP server via stdio
    Mcp,
    /// Analyze an idea and propose features
    Analyze {
        /// Free-text product idea
        idea: String,
        /// Project that will own the features (omit for a dry run)
        #[arg(short, long)]
        project: Option<Uuid>,
        /// Use grounded search and AI extraction
        #[arg(long)]
        ai: bool,
        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the delivery waves of a project
    Waves {
        /// Project id
        project: Uuid,
    },
    /// Print the generated prompt for one feature
    Prompt {
        /// Project id
        project: Uuid,
        /// Feature id
        feature: String,
        /// Tech stack (defaults to the project's)
        #[arg(short, long)]
        stack: Option<String>,
    },
    /// One-sentence feasibility check of an idea
    Insight {
        /// Free-text product idea
        idea: String,
    },
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "leanwave=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // MCP and CLI output use stdout, keep logs out of it
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(config: &Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting leanwave server on port {}", port);

    let db = db::Database::open_configured(config.database_path.clone())?;
    db.migrate()?;

    let planner = planner_from_config(config, &db)?;
    let app = api::create_router(db, planner);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("leanwave server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, Some(Commands::Serve { .. }) | None);
    init_tracing(use_stderr);

    let config = Config::from_env();

    match cli.command {
        Some(Commands::Serve { port }) => serve(&config, port).await?,
        None => serve(&config, 3000).await?,
        Some(Commands::Mcp) => {
            let db = db::Database::open_configured(config.database_path.clone())?;
            db.migrate()?;

            let planner = planner_from_config(&config, &db)?;
            mcp::run_stdio_server(db, planner).await?;
        }
        Some(Commands::Analyze {
            idea,
            project,
            ai,
            json,
        }) => {
            let db = db::Database::open_configured(config.database_path.clone())?;
            db.migrate()?;

            let project_id = project
                .map(|id| id.to_string())
                .unwrap_or_else(|| PLACEHOLDER_PROJECT_ID.to_string());
            let planner = planner_from_config(&config, &db)?;
            let outcome = planner
                .run_analysis(&idea, &project_id, Mode::from_use_ai(ai))
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                if outcome.features.is_empty() {
                    println!("No features found.");
                }
                for feature in &outcome.features {
                    println!(
                        "{}  {} [{}] risk {} value {}",
                        feature.id,
                        feature.title,
                        feature.size.as_str(),
                        feature.risk.as_str(),
                        feature.business_value
                    );
                }
                for (i, source) in outcome.sources.iter().enumerate() {
                    println!("[{}] {} <{}>", i + 1, source.title, source.uri);
                }
                println!();
                print!("{}", mcp::wave_render::render_plan(&sequence(outcome.features)));
            }
        }
        Some(Commands::Waves { project }) => {
            let db = db::Database::open_configured(config.database_path.clone())?;
            db.migrate()?;

            db.get_project(project)?
                .ok_or_else(|| anyhow::anyhow!("Project not found"))?;
            let backlog = db.get_features_by_project(&project.to_string())?;
            print!("{}", mcp::wave_render::render_plan(&sequence(backlog)));
        }
        Some(Commands::Prompt {
            project,
            feature,
            stack,
        }) => {
            let db = db::Database::open_configured(config.database_path.clone())?;
            db.migrate()?;

            let project = db
                .get_project(project)?
                .ok_or_else(|| anyhow::anyhow!("Project not found"))?;
            let feature = db
                .get_feature(&feature)?
                .filter(|f| f.project_id == project.id.to_string())
                .ok_or_else(|| anyhow::anyhow!("Feature not found"))?;

            let stack = stack.or(project.tech_stack).unwrap_or_default();
            print!("{}", synthesize(&feature, &stack).render());
        }
        Some(Commands::Insight { idea }) => {
            let db = db::Database::open_memory()?;
            let planner = planner_from_config(&config, &db)?;
            println!("{}", planner.quick_insight(&idea).await);
        }
    }

    Ok(())
}
