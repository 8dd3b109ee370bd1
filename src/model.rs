//! The pretrained classifier, treated as a black box.
//!
//! Anything that turns a `[1, 224, 224, 3]` tensor into named output
//! tensors can act as a [`Classifier`]. [`OnnxModel`] runs an ONNX export of
//! the network with tract, closures are handy as stand-ins.

use crate::errors::*;
use crate::preprocess::CROP;
use log::*;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::tract_ndarray::{Array1, Array4, ArrayD, Axis};
use tract_onnx::prelude::*;

/// Name of the tensor carrying the class scores
pub const PRIMARY_OUTPUT: &str = "output_0";

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Named tensors returned by a model, in the order the model emitted them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    tensors: Vec<(String, ArrayD<f32>)>,
}

impl ModelOutput {
    pub fn new() -> ModelOutput {
        ModelOutput::default()
    }

    /// A single `output_0` tensor of shape `[1, N]`
    ///
    /// ```
    /// let out = opennsfw::ModelOutput::from_scores(&[0.1, 0.9]);
    /// assert_eq!(out.get("output_0").unwrap().shape(), &[1, 2]);
    /// ```
    pub fn from_scores(scores: &[f32]) -> ModelOutput {
        let array = Array1::from(scores.to_vec())
            .insert_axis(Axis(0))
            .into_dyn();
        let mut out = ModelOutput::new();
        out.insert(PRIMARY_OUTPUT, array);
        out
    }

    /// Add a tensor, replacing any previous one with the same name
    pub fn insert<S: Into<String>>(&mut self, name: S, tensor: ArrayD<f32>) {
        let name = name.into();
        if let Some(slot) = self.tensors.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = tensor;
        } else {
            self.tensors.push((name, tensor));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.tensors
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.iter().map(|(n, _)| n.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// The score tensor: `output_0`, or the only tensor if there is just one
    pub fn primary(&self) -> Option<&ArrayD<f32>> {
        match self.get(PRIMARY_OUTPUT) {
            Some(tensor) => Some(tensor),
            None if self.tensors.len() == 1 => Some(&self.tensors[0].1),
            None => None,
        }
    }
}

/// A model taking a preprocessed `[1, 224, 224, 3]` BGR tensor
pub trait Classifier {
    fn classify(&self, input: &Array4<f32>) -> Result<ModelOutput>;
}

impl<F> Classifier for F
where
    F: Fn(&Array4<f32>) -> Result<ModelOutput>,
{
    #[inline]
    fn classify(&self, input: &Array4<f32>) -> Result<ModelOutput> {
        self(input)
    }
}

impl Classifier for Box<dyn Classifier> {
    #[inline]
    fn classify(&self, input: &Array4<f32>) -> Result<ModelOutput> {
        (**self).classify(input)
    }
}

/// An ONNX model executed with tract
pub struct OnnxModel {
    plan: Plan,
    path: PathBuf,
}

impl OnnxModel {
    /// Load, type and optimize the model at `path`.
    ///
    /// The input is pinned to `f32 [1, 224, 224, 3]`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<OnnxModel> {
        let path = path.as_ref();
        info!("loading model from {:?}", path);

        let plan = build_plan(path).map_err(|err| Error::ModelLoad {
            path: path.to_path_buf(),
            reason: format!("{:#}", err),
        })?;
        if let Ok(outlets) = plan.model().output_outlets() {
            debug!("model has {} outputs", outlets.len());
        }

        Ok(OnnxModel {
            plan,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn build_plan(path: &Path) -> TractResult<Plan> {
    let side = CROP as usize;
    tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, f32::fact([1, side, side, 3]).into())?
        .into_optimized()?
        .into_runnable()
}

impl Classifier for OnnxModel {
    fn classify(&self, input: &Array4<f32>) -> Result<ModelOutput> {
        let tensor: Tensor = input.clone().into();
        let results = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|err| Error::ModelInvocation(format!("{:#}", err)))?;

        let mut output = ModelOutput::new();
        for (i, value) in results.iter().enumerate() {
            let array = value
                .to_array_view::<f32>()
                .map_err(|err| Error::ModelInvocation(format!("output {}: {:#}", i, err)))?
                .to_owned();
            trace!("output_{} has shape {:?}", i, array.shape());
            output.insert(format!("output_{}", i), array);
        }
        Ok(output)
    }
}
