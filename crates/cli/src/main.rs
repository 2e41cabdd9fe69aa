mod client;
mod commands;
mod view;

use clap::{Parser, Subcommand};
use commands::*;
use std::path::PathBuf;

const DEFAULT_SERVER: &str = "http://localhost:8000";

#[derive(Parser)]
#[command(name = "docex")]
#[command(about = "Document information extraction client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a document and show the extracted fields
    Extract {
        /// PDF or image to extract from
        file: PathBuf,

        /// Base URL of the extraction service
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,

        /// Print the dashboard view as JSON
        #[arg(long)]
        json: bool,

        /// Only show the regions located for this JSON tag
        #[arg(long)]
        field: Option<String>,
    },

    /// Check that the extraction service is up
    Health {
        /// Base URL of the extraction service
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },

    /// List the fields of a mapping catalog
    Fields {
        /// Catalog JSON file (builtin catalog when omitted)
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Mapping within the catalog
        #[arg(long, default_value = docex_extract::DEFAULT_MAPPING)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            file,
            server,
            json,
            field,
        } => {
            extract::run(&file, &server, json, field.as_deref()).await?;
        }
        Commands::Health { server } => {
            health::run(&server).await?;
        }
        Commands::Fields { mapping, name } => {
            fields::run(mapping.as_deref(), &name)?;
        }
    }

    Ok(())
}
