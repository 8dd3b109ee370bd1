//! Score images for NSFW content with a pretrained classifier.
//!
//! ```rust,no_run
//! use opennsfw::{Classifier, Mode, OnnxModel};
//!
//! let model = OnnxModel::load("model/nsfw_model.onnx").expect("failed to load model");
//! let img = opennsfw::load("model_test/test2.jpg").expect("failed to open");
//! let tensor = opennsfw::preprocess(&img, Mode::Simple).expect("failed to preprocess");
//! let output = model.classify(&tensor).expect("failed to classify");
//! println!("nsfw={:?}", opennsfw::nsfw_score(&output));
//! ```
//!
//! To score a whole directory use [`batch::run`], which keeps going when
//! individual files fail.

pub mod batch;
pub mod config;
pub mod errors;
pub mod loader;
pub mod model;
pub mod preprocess;
pub mod score;

pub use crate::batch::{Report, ScoreResult};
pub use crate::config::{Config, OutputFormat};
pub use crate::errors::{Error, Result};
pub use crate::loader::load;
pub use crate::model::{Classifier, ModelOutput, OnnxModel};
pub use crate::preprocess::{preprocess, Mode};
pub use crate::score::{nsfw_score, predict, Prediction};
pub use tract_onnx::prelude::tract_ndarray;
