use std::path::Path;
use std::process::ExitCode;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use image_pipeline::state::params::RawTransformForm;
use image_pipeline::{Config, Pipeline};

mod cli;

use cli::{Cli, Commands};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult {
    // Artifacts must outlive the process so `delete` and later reads see them
    let config = Config::load(cli.config.as_deref())?.with_persistent_artifacts();
    tracing::info!(
        corpus = %config.corpus_dir.display(),
        artifacts = ?config.artifact_dir,
        models = ?config.models,
        "configuration loaded"
    );
    let pipeline = Pipeline::new(config)?;

    match cli.command {
        Commands::Info => print_json(&pipeline.info().await?),
        Commands::Enhance {
            image_id,
            color,
            brightness,
            contrast,
            sharpness,
            out,
        } => {
            let form = RawTransformForm {
                image_id: Some(image_id),
                color,
                brightness,
                contrast,
                sharpness,
            };
            let outcome = pipeline.enhance_request(form).await?;
            if let Some(out) = out {
                let served = pipeline.serve_artifact(&outcome.artifact.name).await?;
                write_file(&out, &served.bytes)?;
            }
            print_json(&outcome)
        }
        Commands::Classify {
            model,
            image_id,
            report,
            out_dir,
        } => {
            let result = pipeline.classify_request(&model, &image_id).await?;
            if report {
                let artifacts = pipeline.build_report_artifacts(&image_id, &result).await?;
                if let Some(dir) = out_dir {
                    std::fs::create_dir_all(&dir)?;
                    for name in [&artifacts.json.name, &artifacts.chart.name] {
                        let served = pipeline.serve_artifact(name).await?;
                        write_file(&dir.join(&served.name), &served.bytes)?;
                    }
                }
                print_json(&serde_json::json!({ "result": result, "reports": artifacts }))
            } else {
                print_json(&result)
            }
        }
        Commands::Upload { model, file } => {
            let bytes = std::fs::read(&file)?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string());
            print_json(&pipeline.classify_upload(&model, &file_name, bytes).await?)
        }
        Commands::Histogram { image_id, out } => {
            let result = pipeline.histogram_request(&image_id).await?;
            if let Some(out) = out {
                write_file(&out, &STANDARD.decode(&result.encoded_plot)?)?;
            }
            print_json(&result)
        }
        Commands::Delete { name } => {
            pipeline.delete_artifact(&name)?;
            print_json(&serde_json::json!({ "deleted": name }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> CliResult {
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), size = bytes.len(), "wrote file");
    Ok(())
}
