//! ONNX classifier backend on `tract`.
//!
//! The model is loaded, shape-pinned and optimized once.  Every call then
//! runs the same plan over a `[1, N, H, W, C]` f32 tensor built from the
//! window snapshot.

use log::{info, warn};
use tract_onnx::prelude::*;

use crate::actuator::CHANNEL_COUNT;
use crate::config::PlayerConfig;
use crate::error::{ConfigError, Error, Result};
use crate::predictor::InferenceEngine;
use crate::window::WindowTensor;

type Plan = TypedRunnableModel<TypedModel>;

pub struct TractEngine {
    plan: Plan,
}

impl TractEngine {
    /// Load `config.model_path` and pin its input to the configured window.
    ///
    /// Fails with [`ConfigError::ModelNotFound`] when the file is absent,
    /// [`Error::ModelLoad`] when tract rejects it, and
    /// [`ConfigError::ModelOutputShape`] when the output is statically known
    /// to hold something other than one score per channel.
    pub fn load(config: &PlayerConfig) -> Result<Self> {
        let path = &config.model_path;
        if !path.is_file() {
            return Err(ConfigError::ModelNotFound(path.clone()).into());
        }

        let [n, h, w, c] = config.model_input_dims();
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, n, h, w, c]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| Error::ModelLoad(format!("{e:#}")))?;

        let fact = plan
            .model()
            .output_fact(0)
            .map_err(|e| Error::ModelLoad(format!("{e:#}")))?;
        match fact.shape.as_concrete() {
            Some(dims) => {
                let actual: usize = dims.iter().product();
                if actual != CHANNEL_COUNT {
                    return Err(ConfigError::ModelOutputShape {
                        expected: CHANNEL_COUNT,
                        actual,
                    }
                    .into());
                }
            }
            None => warn!("MODEL | output shape is symbolic, checked per call"),
        }

        info!(
            "MODEL | loaded {} | input=[1, {n}, {h}, {w}, {c}]",
            path.display()
        );
        Ok(Self { plan })
    }
}

impl InferenceEngine for TractEngine {
    fn run(&self, input: &WindowTensor) -> anyhow::Result<Vec<f32>> {
        let tensor = Tensor::from_shape(&input.batched_dims(), &input.to_vec())?;
        let outputs = self.plan.run(tvec!(tensor.into()))?;
        let scores = outputs[0].to_array_view::<f32>()?;
        Ok(scores.iter().copied().collect())
    }
}
