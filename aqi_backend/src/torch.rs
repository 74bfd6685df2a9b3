use std::path::Path;

use tch::{kind::Kind, CModule, Device, Tensor};

use crate::error::{EstimatorError, ModelError};
use crate::estimator::Estimator;
use crate::features::{FeatureVector, FEATURE_COUNT};

/// TorchScript regressor: `[1, 7]` float input, one scalar out.
pub struct TorchEstimator {
    module: CModule,
    device: Device,
}

impl TorchEstimator {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let device = Device::Cpu;
        let module = CModule::load_on_device(path, device)
            .map_err(|e| ModelError::TorchScript(format!("{}: {e}", path.display())))?;
        let est = Self { module, device };

        // Probe with a dummy forward so a wrong output shape fails at load.
        est.forward(&[0.0; FEATURE_COUNT])
            .map_err(|e| ModelError::TorchScript(e.to_string()))?;
        Ok(est)
    }

    fn forward(&self, x: &[f64]) -> Result<f64, EstimatorError> {
        let xs: Vec<f32> = x.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_slice(&xs)
            .reshape([1, FEATURE_COUNT as i64])
            .to_device(self.device);
        let out = self
            .module
            .forward_ts(&[input])
            .map_err(|e| EstimatorError::Backend(e.to_string()))?;
        let sz = out.size();
        if sz.iter().product::<i64>() != 1 {
            return Err(EstimatorError::Backend(format!(
                "unexpected model output size: {sz:?}"
            )));
        }
        Ok(out.to_kind(Kind::Double).flatten(0, -1).double_value(&[0]))
    }
}

impl Estimator for TorchEstimator {
    fn predict(&self, x: &FeatureVector) -> Result<f64, EstimatorError> {
        let v = self.forward(x.as_slice())?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(EstimatorError::NonFinite(v))
        }
    }

    fn kind(&self) -> &'static str {
        "torchscript"
    }
}
