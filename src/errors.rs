use failure::Fail;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while scoring images
#[derive(Debug, Fail)]
pub enum Error {
    /// The file could not be opened or decoded as an image
    #[fail(display = "failed to decode {:?}: {}", path, cause)]
    Decode {
        path: PathBuf,
        #[cause]
        cause: image::ImageError,
    },
    #[fail(display = "failed to preprocess image: {}", _0)]
    Preprocess(String),
    /// The model emitted something that isn't a `[1, N]` tensor with `N >= 2`
    #[fail(display = "unexpected model output: {}", _0)]
    Shape(String),
    #[fail(display = "model invocation failed: {}", _0)]
    ModelInvocation(String),
    #[fail(display = "failed to load model from {:?}: {}", path, reason)]
    ModelLoad { path: PathBuf, reason: String },
    #[fail(display = "failed to read {:?}: {}", path, cause)]
    Io {
        path: PathBuf,
        #[cause]
        cause: io::Error,
    },
}

impl Error {
    /// Whether this error only affects a single file of a batch
    pub fn is_per_file(&self) -> bool {
        match self {
            Error::Decode { .. }
            | Error::Preprocess(_)
            | Error::Shape(_)
            | Error::ModelInvocation(_) => true,
            Error::ModelLoad { .. } | Error::Io { .. } => false,
        }
    }
}
