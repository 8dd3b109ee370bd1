//! Score every image in a directory, one file at a time.
//!
//! A file that fails to load, preprocess or classify is logged and skipped,
//! the remaining files are still processed.

use crate::config::{Config, OutputFormat};
use crate::errors::*;
use crate::loader;
use crate::model::Classifier;
use crate::preprocess::{self, Mode};
use crate::score::{self, Prediction};
use log::*;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A successfully scored file
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub path: PathBuf,
    pub prediction: Prediction,
}

/// A file that produced no score
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of a batch run, in processing order
#[derive(Debug, Default)]
pub struct Report {
    pub scored: Vec<ScoreResult>,
    pub failed: Vec<Failure>,
}

impl Report {
    #[inline]
    pub fn total(&self) -> usize {
        self.scored.len() + self.failed.len()
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    file: &'a str,
    #[serde(flatten)]
    prediction: &'a Prediction,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_else(|| path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn has_accepted_extension(path: &Path, config: &Config) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| config.accepts_extension(ext))
        .unwrap_or(false)
}

/// List the image files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. Entries that can't be inspected
/// are skipped with a warning.
pub fn list_images<P: AsRef<Path>>(dir: P, config: &Config) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|cause| Error::Io {
        path: dir.to_path_buf(),
        cause,
    })?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry in {:?}: {}", dir, err);
                continue;
            }
        };

        let path = entry.path();
        if !has_accepted_extension(&path, config) {
            trace!("ignoring {:?}", path);
            continue;
        }
        if !path.is_file() {
            debug!("ignoring {:?}, not a file", path);
            continue;
        }
        images.push(path);
    }

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Load, preprocess, classify and score a single file
pub fn score_file<C>(path: &Path, classifier: &C, mode: Mode) -> Result<Prediction>
where
    C: Classifier + ?Sized,
{
    let image = loader::load(path)?;
    let tensor = preprocess::preprocess(&image, mode)?;
    drop(image);
    let output = classifier.classify(&tensor)?;
    score::predict(&output)
}

fn write_result<W: Write>(out: &mut W, result: &ScoreResult, format: OutputFormat) -> io::Result<()> {
    let name = file_name(&result.path);
    match format {
        OutputFormat::Text => writeln!(out, "{} - NSFW Score: {:.4}", name, result.prediction.nsfw),
        OutputFormat::Json => {
            let line = JsonLine {
                file: &name,
                prediction: &result.prediction,
            };
            serde_json::to_writer(&mut *out, &line)?;
            writeln!(out)
        }
    }
}

/// Score every image in `dir` and write one line per scored file to `out`.
///
/// Per-file errors are logged and collected in the [`Report`]; only failing
/// to list `dir` or to write to `out` aborts the run.
pub fn run<C, W>(dir: &Path, classifier: &C, config: &Config, out: &mut W) -> Result<Report>
where
    C: Classifier + ?Sized,
    W: Write,
{
    let images = list_images(dir, config)?;
    info!("scoring {} images in {:?}", images.len(), dir);

    let mut report = Report::default();
    for path in images {
        debug!("processing {:?}", path);
        match score_file(&path, classifier, config.mode) {
            Ok(prediction) => {
                let result = ScoreResult { path, prediction };
                write_result(out, &result, config.format).map_err(|cause| Error::Io {
                    path: result.path.clone(),
                    cause,
                })?;
                report.scored.push(result);
            }
            Err(error) => {
                error!("error processing {}: {}", file_name(&path), error);
                report.failed.push(Failure { path, error });
            }
        }
    }

    info!(
        "scored {} of {} images, {} failed",
        report.scored.len(),
        report.total(),
        report.failed.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelOutput;
    use image::{ImageBuffer, Rgb, RgbImage};
    use tract_onnx::prelude::tract_ndarray::Array4;

    fn write_image(dir: &Path, name: &str) {
        let img: RgbImage = ImageBuffer::from_fn(40, 30, |x, y| Rgb([x as u8, y as u8, 128]));
        img.save(dir.join(name)).unwrap();
    }

    fn constant(score: f32) -> impl Fn(&Array4<f32>) -> Result<ModelOutput> {
        move |_: &Array4<f32>| -> Result<ModelOutput> {
            Ok(ModelOutput::from_scores(&[1.0 - score, score]))
        }
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["c.png", "a.jpg", "b.JPG", "notes.txt", "d.jpeg", "noext"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("sub.png")).unwrap();

        let images = list_images(dir.path(), &Config::default()).unwrap();
        let names = images.iter().map(|p| file_name(p)).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.jpg", "c.png"]);
    }

    #[test]
    fn test_list_images_ignore_case() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["b.JPG", "a.Png", "c.gif"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let config = Config {
            ignore_case: true,
            ..Default::default()
        };

        let images = list_images(dir.path(), &config).unwrap();
        let names = images.iter().map(|p| file_name(p)).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.Png", "b.JPG"]);
    }

    #[test]
    fn test_list_images_missing_dir() {
        let err = list_images("does/not/exist", &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(!err.is_per_file());
    }

    #[test]
    fn test_score_file() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "a.png");

        let path = dir.path().join("a.png");
        let prediction = score_file(&path, &constant(0.8), Mode::Simple).unwrap();
        assert_eq!(prediction.nsfw, 0.8);
    }

    #[test]
    fn test_score_file_shape_error() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "a.png");

        let classifier =
            |_: &Array4<f32>| -> Result<ModelOutput> { Ok(ModelOutput::from_scores(&[0.4])) };
        let err = score_file(&dir.path().join("a.png"), &classifier, Mode::Simple).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn test_corrupt_file_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"garbage").unwrap();
        write_image(dir.path(), "b.png");

        let mut out = Vec::new();
        let report = run(dir.path(), &constant(0.25), &Config::default(), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "b.png - NSFW Score: 0.2500\n");
        assert_eq!(report.scored.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, dir.path().join("a.jpg"));
        assert!(matches!(report.failed[0].error, Error::Decode { .. }));
    }

    #[test]
    fn test_model_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "a.png");
        write_image(dir.path(), "b.png");

        let calls = std::cell::Cell::new(0);
        let flaky = |_: &Array4<f32>| -> Result<ModelOutput> {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(Error::ModelInvocation("boom".into()))
            } else {
                Ok(ModelOutput::from_scores(&[0.5, 0.5]))
            }
        };

        let mut out = Vec::new();
        let report = run(dir.path(), &flaky, &Config::default(), &mut out).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), "b.png - NSFW Score: 0.5000\n");
        assert_eq!(report.failed.len(), 1);
    }

    #[test]
    fn test_json_output() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "a.png");
        let config = Config {
            format: OutputFormat::Json,
            ..Default::default()
        };

        let mut out = Vec::new();
        run(dir.path(), &constant(0.5), &config, &mut out).unwrap();
        let line: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(line["file"], "a.png");
        assert_eq!(line["nsfw"], 0.5);
        assert_eq!(line["sfw"], 0.5);
    }

    #[test]
    fn test_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let report = run(dir.path(), &constant(0.5), &Config::default(), &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(report.total(), 0);
    }
}
