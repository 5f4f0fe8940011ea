//! RegoSlice CLI - index policy tables and generate Rego snippets
//!
//! # Commands
//!
//! ```bash
//! # Build the vector index + metadata pair from a CSV policy table
//! regoslice index slice_policies.csv
//!
//! # Retrieve the closest rows and render a Rego policy
//! regoslice generate "Nokia LNBTS param1" -k 2
//!
//! # Same, but print the raw retrieved records as JSON
//! regoslice generate "Nokia LNBTS param1" --records
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use regoslice_lib::{
    embed::MiniLmEmbedder,
    indexer::{ArtifactPaths, Indexer},
    render::RenderConfig,
    retrieve::{Retriever, DEFAULT_K},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regoslice")]
#[command(about = "Generate Rego policy snippets from an indexed policy table")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the vector index and metadata store from a CSV table
    Index {
        /// Policy table to index
        table: String,

        /// Output path for the vector index artifact
        #[arg(long, default_value = "policies.index")]
        index: String,

        /// Output path for the metadata artifact
        #[arg(long, default_value = "policies.json")]
        metadata: String,
    },

    /// Retrieve the rows closest to a query and render a Rego policy
    Generate {
        /// Free-text query describing the wanted policy
        query: String,

        /// Number of rows to retrieve
        #[arg(short, default_value_t = DEFAULT_K)]
        k: usize,

        /// Path of the vector index artifact
        #[arg(long, default_value = "policies.index")]
        index: String,

        /// Path of the metadata artifact
        #[arg(long, default_value = "policies.json")]
        metadata: String,

        /// TOML render config; defaults to binding every stored column
        #[arg(long)]
        config: Option<String>,

        /// Print retrieved records as JSON instead of rendered Rego
        #[arg(long)]
        records: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            table,
            index,
            metadata,
        } => {
            let artifacts = ArtifactPaths::new(index, metadata);

            println!("Loading MiniLM model (first run downloads ~90MB)...");
            let embedder = MiniLmEmbedder::new()?;

            let summary = Indexer::new(embedder).build(&table, &artifacts)?;
            println!(
                "Indexed {} rows ({}-dimensional) from '{table}'",
                summary.rows, summary.dimension
            );
            println!(
                "Wrote '{}' and '{}'",
                artifacts.index.display(),
                artifacts.metadata.display()
            );
        }

        Commands::Generate {
            query,
            k,
            index,
            metadata,
            config,
            records,
        } => {
            let artifacts = ArtifactPaths::new(index, metadata);

            println!("Loading MiniLM model (first run downloads ~90MB)...");
            let embedder = MiniLmEmbedder::new()?;

            let mut retriever = match config {
                Some(path) => {
                    let render_config = RenderConfig::from_toml_file(path)?;
                    Retriever::open_with_config(&artifacts, embedder, render_config)?
                }
                None => Retriever::open(&artifacts, embedder)?,
            };

            if records {
                let retrieved = retriever.retrieve(&query, k)?;
                println!("{}", serde_json::to_string_pretty(&retrieved)?);
            } else {
                let policy = retriever.generate(&query, k)?;
                println!("\nGenerated Rego Policy:\n");
                println!("{policy}");
            }
        }
    }

    Ok(())
}
