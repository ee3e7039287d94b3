use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rostro_core::types::BestMatchScanner;
use rostro_engine::{Outcome, StaticSource, Verifier};
use rostro_store::{EnrollmentStore, ProfileDirectory, SqliteStore};
use std::path::PathBuf;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "rostro", about = "Rostro face verification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a photo under an identity key
    Enroll {
        /// Identity key (e.g., an email address)
        #[arg(short, long)]
        key: String,
        /// Path to the photo
        image: PathBuf,
    },
    /// Verify a photo against one enrolled identity (1:1)
    Verify {
        #[arg(short, long)]
        key: String,
        image: PathBuf,
    },
    /// Identify a photo against the whole roster (1:N)
    Identify {
        image: PathBuf,
        /// Scan the whole roster for the strongest match instead of
        /// stopping at the first one clearing the threshold
        #[arg(long)]
        best: bool,
    },
    /// List enrolled identities
    List,
    /// Remove an enrollment
    Remove {
        #[arg(short, long)]
        key: String,
    },
    /// Show engine configuration and roster size
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    tracing::debug!(db = %config.db_path.display(), "opening enrollment db");
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("opening enrollment db at {}", config.db_path.display()))?;
    let mut verifier = Verifier::with_settings(store, config.settings);

    match cli.command {
        Commands::Enroll { key, image } => {
            let mut source = StaticSource::new(read_image(&image)?);
            match verifier.register_from_source(&key, &mut source).await? {
                Outcome::Completed(descriptor) => {
                    println!("enrolled {key} ({} descriptor values)", descriptor.len());
                }
                Outcome::Cancelled => println!("capture cancelled, nothing enrolled"),
            }
        }
        Commands::Verify { key, image } => {
            let mut source = StaticSource::new(read_image(&image)?);
            match verifier.verify_from_source(&key, &mut source).await? {
                Outcome::Completed(result) => {
                    println!(
                        "{}: similarity {:.3} — {}",
                        key,
                        result.similarity,
                        if result.accepted { "MATCH" } else { "no match" }
                    );
                }
                Outcome::Cancelled => println!("capture cancelled"),
            }
        }
        Commands::Identify { image, best } => {
            let payload = read_image(&image)?;
            let result = if best {
                verifier.identify_with(&payload, &BestMatchScanner::default())?
            } else {
                verifier.identify(&payload)?
            };
            match &result.identity_key {
                Some(key) => {
                    let name = verifier
                        .store()
                        .profile(key)?
                        .and_then(|p| p.display_name)
                        .unwrap_or_default();
                    if name.is_empty() {
                        println!("identified {key} (similarity {:.3})", result.similarity);
                    } else {
                        println!(
                            "identified {key} — {name} (similarity {:.3})",
                            result.similarity
                        );
                    }
                }
                None => println!(
                    "no match (best similarity {:.3})",
                    result.similarity
                ),
            }
        }
        Commands::List => {
            let records = verifier.store().list_all()?;
            if records.is_empty() {
                println!("no identities enrolled");
            }
            for record in records {
                println!(
                    "{}\tenrolled {}\t{} values",
                    record.identity_key,
                    record.enrolled_at.to_rfc3339(),
                    record.descriptor.len()
                );
            }
        }
        Commands::Remove { key } => {
            if verifier.store_mut().remove(&key)? {
                println!("removed {key}");
            } else {
                println!("{key} was not enrolled");
            }
        }
        Commands::Status => {
            let settings = verifier.settings();
            println!(
                "{}",
                serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "db_path": config.db_path.display().to_string(),
                    "enrolled": verifier.store().count()?,
                    "sample_side": settings.sample_side,
                    "block_side": settings.block_side,
                    "max_distance": settings.max_distance,
                    "threshold": settings.threshold,
                })
            );
        }
    }

    Ok(())
}

fn read_image(path: &PathBuf) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading image at {}", path.display()))
}
