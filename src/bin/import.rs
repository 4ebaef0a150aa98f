use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use foodgram::{app::init_tracing, importer};

#[derive(Parser)]
#[command(name = "foodgram-import")]
#[command(about = "Load ingredients or tags from a headerless CSV file")]
#[command(after_help = "Environment:\n  DATABASE_URL   Postgres connection string")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rows of `name,measurement_unit`.
    Ingredients {
        #[arg(long, default_value = "data/ingredients.csv")]
        path: PathBuf,
    },
    /// Rows of `name,slug,color`.
    Tags {
        #[arg(long, default_value = "data/tags.csv")]
        path: PathBuf,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .context("connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    let (what, path, result) = match cli.command {
        Commands::Ingredients { path } => {
            let r = importer::import_ingredients(&db, &path).await;
            ("ingredients", path, r)
        }
        Commands::Tags { path } => {
            let r = importer::import_tags(&db, &path).await;
            ("tags", path, r)
        }
    };
    let summary = result.with_context(|| format!("import {what} from {}", path.display()))?;
    println!(
        "Successfully loaded {what} from {}: {summary}",
        path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing("foodgram=info,sqlx=warn");

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
