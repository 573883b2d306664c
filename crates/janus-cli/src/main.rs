use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use janus_core::codec::inspect_template;
use janus_core::{CosineEngine, Janus, SearchResult, SubjectId};
use std::path::{Path, PathBuf};

mod config;
mod features;

use config::Config;

#[derive(Parser)]
#[command(name = "janus", about = "Janus biometric template tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a flat template from feature files, one file per detection pass
    Template {
        /// Feature files, in augmentation order
        #[arg(required = true)]
        features: Vec<PathBuf>,
        /// Where to write the flat template
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a chunk summary of a flat template
    Inspect {
        template: PathBuf,
    },
    /// Enroll flat templates into a gallery under a subject id
    Enroll {
        /// Subject id
        #[arg(short, long, allow_negative_numbers = true)]
        id: SubjectId,
        /// Flat templates to enroll
        #[arg(required = true)]
        templates: Vec<PathBuf>,
        /// Gallery file (default: $JANUS_GALLERY_PATH)
        #[arg(short, long)]
        gallery: Option<PathBuf>,
    },
    /// Compare two flat templates
    Verify {
        a: PathBuf,
        b: PathBuf,
    },
    /// Rank gallery subjects against a flat probe template
    Search {
        probe: PathBuf,
        /// Number of candidates (default: $JANUS_SEARCH_LIMIT)
        #[arg(short)]
        k: Option<usize>,
        /// Gallery file (default: $JANUS_GALLERY_PATH)
        #[arg(short, long)]
        gallery: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let engine = CosineEngine::initialize(&config.sdk_path)
        .with_context(|| format!("initializing engine from {}", config.sdk_path.display()))?;
    let janus = Janus::new(engine);

    match cli.command {
        Commands::Template { features, output } => {
            let bytes = build_template(&janus, &features, &output)?;
            println!("wrote {bytes} bytes to {}", output.display());
        }
        Commands::Inspect { template } => {
            let flat = read(&template)?;
            let summary = inspect_template(janus.engine(), &flat)
                .with_context(|| format!("decoding {}", template.display()))?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Enroll {
            id,
            templates,
            gallery,
        } => {
            let gallery = gallery.unwrap_or_else(|| config.gallery_path.clone());
            let added = enroll_templates(&janus, id, &templates, &gallery)?;
            println!("enrolled {added} signatures for subject {id}");
        }
        Commands::Verify { a, b } => {
            let score = janus.verify(&read(&a)?, &read(&b)?)?;
            println!("{score}");
        }
        Commands::Search { probe, k, gallery } => {
            let gallery = gallery.unwrap_or_else(|| config.gallery_path.clone());
            let result = search(&janus, &probe, &gallery, k.unwrap_or(config.search_limit))?;
            for line in format_result(&result) {
                println!("{line}");
            }
        }
    }

    janus.finalize()?;
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

fn build_template(
    janus: &Janus<CosineEngine>,
    features: &[PathBuf],
    output: &Path,
) -> Result<usize> {
    let mut template = janus.allocate_template();
    for path in features {
        template.push(features::load_record_set(path)?);
    }
    let flat = janus.flatten_template(&template)?;
    write(output, &flat)?;
    Ok(flat.len())
}

/// Face ids come from this process's context and restart at 0 on every run,
/// so they are unique only within one invocation.
fn enroll_templates(
    janus: &Janus<CosineEngine>,
    id: SubjectId,
    templates: &[PathBuf],
    gallery_path: &Path,
) -> Result<usize> {
    let mut gallery = if gallery_path.exists() {
        janus
            .unflatten_gallery(&read(gallery_path)?)
            .with_context(|| format!("decoding gallery {}", gallery_path.display()))?
    } else {
        janus.allocate_gallery()?
    };

    let mut added = 0;
    for path in templates {
        let template = janus
            .unflatten_template(&read(path)?)
            .with_context(|| format!("decoding template {}", path.display()))?;
        added += janus.enroll(&template, id, &mut gallery)?;
    }

    write(gallery_path, &janus.flatten_gallery(&gallery)?)?;
    Ok(added)
}

fn search(
    janus: &Janus<CosineEngine>,
    probe: &Path,
    gallery: &Path,
    k: usize,
) -> Result<SearchResult> {
    let result = janus.search(&read(probe)?, &read(gallery)?, k)?;
    Ok(result)
}

fn format_result(result: &SearchResult) -> Vec<String> {
    result
        .ids()
        .into_iter()
        .zip(result.scores())
        .map(|(id, score)| match score {
            Some(s) => format!("{id}\t{s:.6}"),
            None => format!("{id}\t-"),
        })
        .collect()
}
