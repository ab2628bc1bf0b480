/// Request-level pipeline
///
/// Each public operation is one unit of work for one request. Steps inside
/// a request run strictly in sequence on the blocking pool; separate
/// requests share only the read-only corpus and the write-once artifact
/// area, so they need no locking.
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::namer::sanitized_extension;
use crate::artifact::{ArtifactKind, ArtifactRef, ArtifactStore, ServedArtifact};
use crate::classify::{Classifier, ModelRegistry};
use crate::config::Config;
use crate::error::{ArtifactError, ClassificationError, ImageError, PipelineError, Result};
use crate::imaging::{enhance, histogram};
use crate::render;
use crate::report;
use crate::state::corpus::{decode_bytes, output_format_for, ImageStore};
use crate::state::data::ClassificationResult;
use crate::state::params::RawTransformForm;

/// Models and selectable images, for populating a request form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub models: Vec<String>,
    pub images: Vec<String>,
}

/// A transformed image ready to be served next to its source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhanceOutcome {
    pub image_id: String,
    pub artifact: ArtifactRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportArtifacts {
    pub json: ArtifactRef,
    pub chart: ArtifactRef,
}

/// Histogram counts plus the base64 PNG plot. Never written to storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramResult {
    pub image_id: String,
    pub channels: Vec<histogram::ChannelHistogram>,
    pub encoded_plot: String,
}

struct Inner {
    config: Arc<Config>,
    images: ImageStore,
    artifacts: ArtifactStore,
    models: ModelRegistry,
}

/// Cheap to clone; clones share the same stores
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

impl Pipeline {
    /// Pipeline with the built-in model backends
    pub fn new(config: Config) -> Result<Self> {
        let models = ModelRegistry::with_builtin(&config);
        Self::with_registry(config, models)
    }

    /// Fails when the artifact area overlaps the corpus
    pub fn with_registry(config: Config, models: ModelRegistry) -> Result<Self> {
        config.check_artifact_area()?;
        let config = Arc::new(config);
        let artifacts = ArtifactStore::open(&config)?;
        let images = ImageStore::new(Arc::clone(&config));

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                images,
                artifacts,
                models,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub async fn info(&self) -> Result<Info> {
        Ok(Info {
            models: self.inner.config.models.clone(),
            images: self.list_available().await?,
        })
    }

    /// Identifiers currently in the corpus. Generated artifacts never appear here.
    pub async fn list_available(&self) -> Result<Vec<String>> {
        let this = self.clone();
        Ok(tokio::task::spawn_blocking(move || this.inner.images.list_available()).await??)
    }

    /// Validate the form, enhance the image and persist the result
    pub async fn enhance_request(&self, form: RawTransformForm) -> Result<EnhanceOutcome> {
        let (image_id, params) = form.validate()?;
        info!(image_id = %image_id, ?params, "enhancement requested");

        let this = self.clone();
        let outcome = tokio::task::spawn_blocking(move || -> Result<EnhanceOutcome> {
            let source = this.inner.images.resolve(&image_id)?;
            let enhanced = enhance::enhance(&source.pixels, &params);

            let format = output_format_for(source.format);
            let bytes = render::canvas::encode(&enhanced, format)?;
            let extension = format.extensions_str().first().copied().unwrap_or("png");

            let guard = this
                .inner
                .artifacts
                .write(ArtifactKind::TransformedImage, extension, &bytes)?;

            Ok(EnhanceOutcome {
                image_id,
                artifact: guard.commit(),
            })
        })
        .await??;

        info!(artifact = %outcome.artifact.name, "enhanced image stored");
        Ok(outcome)
    }

    /// Classify a corpus image with a recognized model.
    ///
    /// The model is checked before any file is read or any backend runs.
    pub async fn classify_request(&self, model_id: &str, image_id: &str) -> Result<ClassificationResult> {
        let backend = self.backend_for(model_id)?;
        info!(model = model_id, image_id, "classification requested");

        let this = self.clone();
        let image_id = image_id.to_string();
        let result = tokio::task::spawn_blocking(move || -> Result<ClassificationResult> {
            let source = this.inner.images.resolve(&image_id)?;
            run_classifier(backend.as_ref(), &source.pixels)
        })
        .await??;

        Ok(result)
    }

    /// Classify caller-submitted bytes.
    ///
    /// The upload is written to the artifact area under a unique name (never
    /// into the corpus), classified, and removed on every exit path.
    pub async fn classify_upload(
        &self,
        model_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ClassificationResult> {
        let backend = self.backend_for(model_id)?;
        info!(model = model_id, file_name, size = bytes.len(), "upload classification requested");

        let this = self.clone();
        let file_name = file_name.to_string();
        let result = tokio::task::spawn_blocking(move || -> Result<ClassificationResult> {
            let upload = this.inner.artifacts.write(
                ArtifactKind::Upload,
                &sanitized_extension(&file_name),
                &bytes,
            )?;

            let stored = std::fs::read(upload.path()).map_err(ArtifactError::Io)?;
            let outcome = decode_bytes(&file_name, &stored)
                .map_err(PipelineError::from)
                .and_then(|image| run_classifier(backend.as_ref(), &image.pixels));

            if let Err(e) = upload.discard() {
                warn!(error = %e, "failed to remove transient upload");
            }
            outcome
        })
        .await??;

        Ok(result)
    }

    /// Write the JSON report and bar chart as two uniquely named artifacts.
    /// If either step fails, neither artifact survives.
    pub async fn build_report_artifacts(
        &self,
        image_id: &str,
        result: &ClassificationResult,
    ) -> Result<ReportArtifacts> {
        let this = self.clone();
        let image_id = image_id.to_string();
        let result = result.clone();

        let artifacts = tokio::task::spawn_blocking(move || {
            write_reports(&this.inner.artifacts, &image_id, &result, report::to_chart)
        })
        .await??;

        info!(json = %artifacts.json.name, chart = %artifacts.chart.name, "report artifacts stored");
        Ok(artifacts)
    }

    /// Per-channel distribution of a corpus image, decoded straight from
    /// its location, returned as counts and an encoded plot
    pub async fn histogram_request(&self, image_id: &str) -> Result<HistogramResult> {
        let this = self.clone();
        let image_id = image_id.to_string();

        Ok(tokio::task::spawn_blocking(move || -> Result<HistogramResult> {
            let path = this.inner.images.path_for(&image_id)?;
            let bytes = std::fs::read(&path).map_err(|source| ImageError::Io {
                path: path.clone(),
                source,
            })?;
            let image = decode_bytes(&image_id, &bytes)?;

            let channels = histogram::compute(&image.pixels);
            let encoded_plot = render::histogram::render_base64(&channels)?;

            Ok(HistogramResult {
                image_id,
                channels,
                encoded_plot,
            })
        })
        .await??)
    }

    /// Serve an artifact by explicit reference. Reports are deleted once
    /// read; transformed images stay until `delete_artifact`.
    pub async fn serve_artifact(&self, name: &str) -> Result<ServedArtifact> {
        let kind = ArtifactKind::from_name(name)
            .filter(|kind| *kind != ArtifactKind::Upload)
            .ok_or_else(|| ArtifactError::NotFound(name.to_string()))?;

        let this = self.clone();
        let name = name.to_string();
        Ok(tokio::task::spawn_blocking(move || {
            if kind.serve_once() {
                this.inner.artifacts.take(&name)
            } else {
                this.inner.artifacts.read(&name)
            }
        })
        .await??)
    }

    /// Idempotent delete; only fails for names outside the artifact area
    pub fn delete_artifact(&self, name: &str) -> Result<(), ArtifactError> {
        self.inner.artifacts.delete(name)
    }

    fn backend_for(&self, model_id: &str) -> Result<Arc<dyn Classifier>, ClassificationError> {
        if !self.inner.config.is_known_model(model_id) {
            warn!(model = model_id, "unknown model requested");
            return Err(ClassificationError::UnknownModel(model_id.to_string()));
        }
        self.inner.models.backend(model_id)
    }
}

/// Both report artifacts or neither. The JSON guard removes its file if
/// the chart step fails.
fn write_reports<F>(
    store: &ArtifactStore,
    image_id: &str,
    result: &ClassificationResult,
    render_chart: F,
) -> Result<ReportArtifacts, ArtifactError>
where
    F: FnOnce(&str, &ClassificationResult) -> Result<Vec<u8>, ArtifactError>,
{
    let json = report::to_json(image_id, result)?;
    let json = store.write(ArtifactKind::ReportJson, "json", &json)?;

    let chart = render_chart(image_id, result)?;
    let chart = store.write(ArtifactKind::ReportChart, "png", &chart)?;

    Ok(ReportArtifacts {
        json: json.commit(),
        chart: chart.commit(),
    })
}

fn run_classifier(
    backend: &dyn Classifier,
    image: &image::DynamicImage,
) -> Result<ClassificationResult> {
    let scores = backend.classify(image)?;
    Ok(ClassificationResult::ranked(scores))
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("corpus", &self.inner.images.root())
            .field("artifacts", &self.inner.artifacts.root())
            .field("models", &self.inner.models)
            .finish()
    }
}
