use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use forge_api::generator::DocGenerator;
use forge_api::packaging::ArtifactPackager;
use forge_api::web;

#[derive(Parser)]
#[command(name = "forge-api")]
#[command(about = "Generate API documentation from code files with the Gemini API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the documentation generation service
    Serve {
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
    /// Generate a documentation archive from a local file
    Generate {
        /// Source file to document
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forge_api=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            println!("Starting web server on port {}...", port);
            web::run_server(port).await?;
        }
        Commands::Generate { input, output } => {
            println!("Generating documentation for: {}", input.display());
            let generator = DocGenerator::new();
            let documentation = generator.generate_from_file(&input).await?;

            let scratch = tempfile::tempdir()?;
            let packager = ArtifactPackager::new();
            let archive = packager.package(&documentation, scratch.path())?;

            let output_path = output.unwrap_or_else(|| PathBuf::from("api-documentation.zip"));
            std::fs::copy(&archive, &output_path)?;
            println!("Documentation archive saved to: {}", output_path.display());
        }
    }

    Ok(())
}
