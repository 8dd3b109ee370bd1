use crate::errors::*;
use crate::model::{ModelOutput, PRIMARY_OUTPUT};
use serde::Serialize;

/// Index of the NSFW class in the model's output
pub const NSFW_CLASS: usize = 1;

/// The classification of a single image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// Score of the NSFW class, as emitted by the model
    pub nsfw: f32,
    /// `1.0 - nsfw`
    pub sfw: f32,
}

impl Prediction {
    pub fn new(nsfw: f32) -> Prediction {
        Prediction {
            nsfw,
            sfw: 1.0 - nsfw,
        }
    }

    /// ```
    /// # use opennsfw::Prediction;
    /// let prediction = Prediction::new(0.25);
    /// assert_eq!(prediction.nsfw_percent(), 25.0);
    /// assert_eq!(prediction.sfw_percent(), 75.0);
    /// ```
    #[inline]
    pub fn nsfw_percent(&self) -> f32 {
        self.nsfw * 100.0
    }

    #[inline]
    pub fn sfw_percent(&self) -> f32 {
        self.sfw * 100.0
    }
}

/// Extract the NSFW score from the model output.
///
/// The primary tensor must have shape `[B, N]` with `B >= 1` and `N >= 2`;
/// the value at `[0, 1]` is returned untouched, no clamping or softmax.
pub fn nsfw_score(output: &ModelOutput) -> Result<f32> {
    let tensor = output.primary().ok_or_else(|| {
        Error::Shape(format!(
            "no {:?} tensor among outputs {:?}",
            PRIMARY_OUTPUT,
            output.names().collect::<Vec<_>>()
        ))
    })?;

    let shape = tensor.shape();
    if shape.len() != 2 {
        return Err(Error::Shape(format!(
            "expected [1, N] scores, got shape {:?}",
            shape
        )));
    }
    if shape[0] < 1 || shape[1] <= NSFW_CLASS {
        return Err(Error::Shape(format!(
            "expected at least 2 classes, got shape {:?}",
            shape
        )));
    }

    Ok(tensor[[0, NSFW_CLASS]])
}

/// Like [`nsfw_score`], wrapped into a [`Prediction`]
#[inline]
pub fn predict(output: &ModelOutput) -> Result<Prediction> {
    nsfw_score(output).map(Prediction::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tract_onnx::prelude::tract_ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_nsfw_score() {
        let output = ModelOutput::from_scores(&[0.1, 0.9]);
        assert_eq!(nsfw_score(&output).unwrap(), 0.9);
    }

    #[test]
    fn test_more_than_two_classes() {
        let output = ModelOutput::from_scores(&[0.1, 0.6, 0.3]);
        assert_eq!(nsfw_score(&output).unwrap(), 0.6);
    }

    #[test]
    fn test_no_clamping() {
        let output = ModelOutput::from_scores(&[-3.5, 7.25]);
        assert_eq!(nsfw_score(&output).unwrap(), 7.25);
    }

    #[test]
    fn test_single_class() {
        let output = ModelOutput::from_scores(&[0.5]);
        assert!(matches!(nsfw_score(&output), Err(Error::Shape(_))));
    }

    #[test]
    fn test_wrong_rank() {
        let mut output = ModelOutput::new();
        output.insert(PRIMARY_OUTPUT, ArrayD::from_elem(IxDyn(&[2]), 0.5));
        assert!(matches!(nsfw_score(&output), Err(Error::Shape(_))));
    }

    #[test]
    fn test_empty_batch() {
        let mut output = ModelOutput::new();
        output.insert(PRIMARY_OUTPUT, ArrayD::zeros(IxDyn(&[0, 2])));
        assert!(matches!(nsfw_score(&output), Err(Error::Shape(_))));
    }

    #[test]
    fn test_missing_primary() {
        let mut output = ModelOutput::new();
        output.insert("a", ArrayD::zeros(IxDyn(&[1, 2])));
        output.insert("b", ArrayD::zeros(IxDyn(&[1, 2])));
        let err = nsfw_score(&output).unwrap_err();
        assert!(err.to_string().contains("\"output_0\""), "{}", err);
    }

    #[test]
    fn test_predict() {
        let prediction = predict(&ModelOutput::from_scores(&[0.95, 0.05])).unwrap();
        assert_eq!(prediction.nsfw, 0.05);
        assert_eq!(prediction.sfw, 1.0 - 0.05);
    }
}
