use crate::preprocess::Mode;
use std::path::PathBuf;

/// Where the model artifact is looked up by default
pub const DEFAULT_MODEL_PATH: &str = "model/nsfw_model.onnx";
/// Directory scanned when none is given
pub const DEFAULT_IMAGE_DIR: &str = "model_test";
/// File extensions picked up by the batch driver
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "png"];

/// How scored files are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `<filename> - NSFW Score: <score>`
    Text,
    /// One JSON object per line
    Json,
}

impl Default for OutputFormat {
    fn default() -> OutputFormat {
        OutputFormat::Text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub model_path: PathBuf,
    /// Extensions without the leading dot
    pub extensions: Vec<String>,
    /// Match extensions case-insensitively, `.JPG` is skipped otherwise
    pub ignore_case: bool,
    pub mode: Mode,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignore_case: false,
            mode: Mode::default(),
            format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Whether a file with this extension should be scored
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| {
            if self.ignore_case {
                e.eq_ignore_ascii_case(ext)
            } else {
                e == ext
            }
        })
    }
}
