use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use image_pipeline::classify::{Classifier, ModelRegistry};
use image_pipeline::error::{ArtifactError, ClassificationError, PipelineError};
use image_pipeline::state::data::{ClassificationResult, Score};
use image_pipeline::state::params::RawTransformForm;
use image_pipeline::{Config, Pipeline};

/// Backend that counts calls and always answers the same ranking
#[derive(Default)]
struct CountingClassifier {
    calls: AtomicUsize,
}

impl Classifier for CountingClassifier {
    fn classify(&self, _image: &DynamicImage) -> Result<Vec<Score>, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            Score::new("tabby", 20.0),
            Score::new("tiger cat", 70.0),
            Score::new("lynx", 10.0),
        ])
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _image: &DynamicImage) -> Result<Vec<Score>, ClassificationError> {
        Err(ClassificationError::Failure("model crashed".to_string()))
    }
}

struct Fixture {
    dir: TempDir,
    pipeline: Pipeline,
    counter: Arc<CountingClassifier>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();

        RgbImage::from_fn(16, 12, |x, y| Rgb([(x * 15) as u8, (y * 20) as u8, 120]))
            .save_with_format(corpus.join("cat.JPEG"), ImageFormat::Jpeg)
            .unwrap();
        RgbImage::from_pixel(8, 8, Rgb([30, 60, 200]))
            .save_with_format(corpus.join("dog.JPEG"), ImageFormat::Jpeg)
            .unwrap();
        std::fs::write(corpus.join("readme.txt"), b"not an image").unwrap();

        let mut config = Config::with_corpus(&corpus);
        config.artifact_dir = Some(dir.path().join("artifacts"));
        config.models = vec!["resnet18".to_string(), "broken".to_string()];

        let counter = Arc::new(CountingClassifier::default());
        let mut registry = ModelRegistry::new();
        registry.register("resnet18", counter.clone());
        registry.register("broken", Arc::new(FailingClassifier));

        let pipeline = Pipeline::with_registry(config, registry).unwrap();
        Self {
            dir,
            pipeline,
            counter,
        }
    }

    fn artifact_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("artifacts")
    }

    fn artifact_count(&self) -> usize {
        std::fs::read_dir(self.artifact_dir()).unwrap().count()
    }
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

fn file_exists(dir: &Path, name: &str) -> bool {
    dir.join(name).is_file()
}

#[tokio::test]
async fn enhance_creates_artifact_without_touching_corpus() {
    let fx = Fixture::new();
    let before = sorted(fx.pipeline.list_available().await.unwrap());

    let form = RawTransformForm {
        image_id: Some("cat.JPEG".into()),
        color: Some("1.0".into()),
        brightness: Some("1.2".into()),
        contrast: Some("1.0".into()),
        sharpness: Some("1.0".into()),
    };
    let outcome = fx.pipeline.enhance_request(form).await.unwrap();

    assert_eq!(outcome.image_id, "cat.JPEG");
    assert!(file_exists(&fx.artifact_dir(), &outcome.artifact.name));
    assert_eq!(before, vec!["cat.JPEG".to_string(), "dog.JPEG".to_string()]);
    assert_eq!(sorted(fx.pipeline.list_available().await.unwrap()), before);

    let served = fx.pipeline.serve_artifact(&outcome.artifact.name).await.unwrap();
    let decoded = image::load_from_memory(&served.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 12));
}

#[tokio::test]
async fn unknown_model_never_reaches_backend() {
    let fx = Fixture::new();

    let result = fx.pipeline.classify_request("not-a-real-model", "cat.JPEG").await;

    assert!(matches!(
        result,
        Err(PipelineError::Classification(ClassificationError::UnknownModel(_)))
    ));
    assert_eq!(fx.counter.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.artifact_count(), 0);
}

#[tokio::test]
async fn classification_is_ranked() {
    let fx = Fixture::new();
    let result = fx.pipeline.classify_request("resnet18", "cat.JPEG").await.unwrap();

    let labels: Vec<_> = result.scores().iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["tiger cat", "tabby", "lynx"]);
    assert_eq!(fx.counter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn classification_of_missing_image_is_not_found() {
    let fx = Fixture::new();
    let result = fx.pipeline.classify_request("resnet18", "ghost.JPEG").await;
    assert!(matches!(
        result,
        Err(PipelineError::Image(image_pipeline::error::ImageError::NotFound(_)))
    ));
    assert_eq!(fx.counter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_upload_classification_leaves_no_files() {
    let fx = Fixture::new();
    let bytes = std::fs::read(fx.dir.path().join("corpus/dog.JPEG")).unwrap();

    let result = fx.pipeline.classify_upload("broken", "dog.JPEG", bytes).await;

    assert!(matches!(
        result,
        Err(PipelineError::Classification(ClassificationError::Failure(_)))
    ));
    assert_eq!(fx.artifact_count(), 0);
    assert_eq!(fx.pipeline.list_available().await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reports_get_distinct_names() {
    let fx = Fixture::new();
    let result = ClassificationResult::ranked(vec![Score::new("tiger cat", 90.0)]);

    let (a, b) = tokio::join!(
        fx.pipeline.build_report_artifacts("cat.JPEG", &result),
        fx.pipeline.build_report_artifacts("cat.JPEG", &result),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let names: HashSet<_> = [&a.json.name, &a.chart.name, &b.json.name, &b.chart.name]
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(names.len(), 4);
    for name in &names {
        assert!(file_exists(&fx.artifact_dir(), name));
    }
    assert_eq!(a.json.media_type, "application/json");
    assert_eq!(a.chart.media_type, "image/png");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_enhancements_do_not_overwrite() {
    let fx = Fixture::new();
    let form = RawTransformForm {
        image_id: Some("dog.JPEG".into()),
        color: Some("1".into()),
        brightness: Some("1".into()),
        contrast: Some("1".into()),
        sharpness: Some("1".into()),
    };

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let pipeline = fx.pipeline.clone();
            let form = form.clone();
            tokio::spawn(async move { pipeline.enhance_request(form).await })
        })
        .collect();

    let mut names = HashSet::new();
    for task in tasks {
        names.insert(task.await.unwrap().unwrap().artifact.name);
    }
    assert_eq!(names.len(), 6);
    assert_eq!(fx.artifact_count(), 6);
}

#[tokio::test]
async fn delete_artifact_is_idempotent_and_confined() {
    let fx = Fixture::new();

    assert!(fx.pipeline.delete_artifact("transformed_doesnotexist.jpg").is_ok());

    let outside = fx.dir.path().join("keep.txt");
    std::fs::write(&outside, b"keep").unwrap();
    let result = fx.pipeline.delete_artifact("../keep.txt");
    assert!(matches!(result, Err(ArtifactError::InvalidName(_))));
    assert!(outside.exists());

    assert!(matches!(
        fx.pipeline.delete_artifact("../../etc/passwd"),
        Err(ArtifactError::InvalidName(_))
    ));
}

#[tokio::test]
async fn histogram_of_rgb_image_has_three_channels() {
    let fx = Fixture::new();
    let result = fx.pipeline.histogram_request("dog.JPEG").await.unwrap();

    assert_eq!(result.channels.len(), 3);
    assert!(result.channels.iter().all(|c| c.total() == 64));
    assert_eq!(fx.artifact_count(), 0);
}

#[test]
fn artifact_area_overlapping_corpus_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    std::fs::create_dir(&corpus).unwrap();
    RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]))
        .save_with_format(corpus.join("cat.JPEG"), ImageFormat::Jpeg)
        .unwrap();

    for artifact_dir in [corpus.clone(), corpus.join("generated"), dir.path().to_path_buf()] {
        let mut config = Config::with_corpus(&corpus);
        config.artifact_dir = Some(artifact_dir.clone());
        let result = Pipeline::new(config);
        assert!(
            matches!(result, Err(PipelineError::Config(_))),
            "accepted {}",
            artifact_dir.display()
        );
    }

    assert!(file_exists(&corpus, "cat.JPEG"));
    assert!(!corpus.join("generated").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_report_downloads_serve_once() {
    let fx = Fixture::new();
    let result = fx.pipeline.classify_request("resnet18", "cat.JPEG").await.unwrap();
    let reports = fx.pipeline.build_report_artifacts("cat.JPEG", &result).await.unwrap();

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let pipeline = fx.pipeline.clone();
            let name = reports.json.name.clone();
            tokio::spawn(async move { pipeline.serve_artifact(&name).await })
        })
        .collect();

    let mut served = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => served += 1,
            Err(PipelineError::Artifact(ArtifactError::NotFound(_))) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(served, 1);
}
