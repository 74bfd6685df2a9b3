use serde_json::Value;
use std::{fs, path::Path, sync::Arc};

use crate::error::ModelError;
use crate::estimator::{Estimator, EstimatorSpec};
use crate::features::FEATURE_NAMES;
use crate::store::Location;

/// Keys probed, in order, when an artifact is a mapping that wraps the
/// estimator together with training metadata.
pub const CANDIDATE_KEYS: [&str; 5] = [
    "model",
    "best_estimator",
    "estimator",
    "trained_model",
    "final_model",
];

/// Load one estimator artifact from disk.
pub fn load_estimator(path: &Path) -> Result<Box<dyn Estimator>, ModelError> {
    if path.extension().is_some_and(|ext| ext == "pt") {
        return load_torchscript(path);
    }

    let txt = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&txt).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(_) => estimator_from_value(value),
        _ => Err(ModelError::Unsupported(path.to_path_buf())),
    }
}

#[cfg(feature = "torchscript")]
fn load_torchscript(path: &Path) -> Result<Box<dyn Estimator>, ModelError> {
    Ok(Box::new(crate::torch::TorchEstimator::load(path)?))
}

#[cfg(not(feature = "torchscript"))]
fn load_torchscript(path: &Path) -> Result<Box<dyn Estimator>, ModelError> {
    Err(ModelError::TorchScript(format!(
        "{} needs the `torchscript` feature",
        path.display()
    )))
}

/// Accept either a direct estimator or a mapping holding one under a
/// candidate key.
pub fn estimator_from_value(value: Value) -> Result<Box<dyn Estimator>, ModelError> {
    let Value::Object(mut map) = value else {
        return Err(ModelError::Invalid("artifact is not a JSON object".into()));
    };

    if map.contains_key("kind") {
        let spec: EstimatorSpec = serde_json::from_value(Value::Object(map))
            .map_err(|e| ModelError::Invalid(e.to_string()))?;
        return spec.build();
    }

    if let Some(names) = map.get("feature_names").and_then(Value::as_array) {
        let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
        if names != FEATURE_NAMES {
            tracing::warn!(
                "artifact was trained on {:?}; inputs are built as {:?}",
                names,
                FEATURE_NAMES
            );
        }
    }

    for key in CANDIDATE_KEYS {
        let Some(inner) = map.remove(key) else {
            continue;
        };
        let built = serde_json::from_value::<EstimatorSpec>(inner)
            .map_err(|e| ModelError::Invalid(e.to_string()))
            .and_then(EstimatorSpec::build);
        match built {
            Ok(est) => {
                tracing::info!(key, kind = est.kind(), "found estimator in mapping");
                return Ok(est);
            }
            Err(e) => tracing::debug!(key, error = %e, "candidate key is not an estimator"),
        }
    }

    Err(ModelError::NotFound {
        candidates: CANDIDATE_KEYS.to_vec(),
        present: map.keys().cloned().collect(),
    })
}

/// The indoor and outdoor estimators. Either slot may be empty.
#[derive(Clone, Default)]
pub struct Models {
    indoor: Option<Arc<dyn Estimator>>,
    outdoor: Option<Arc<dyn Estimator>>,
}

impl Models {
    pub fn new(indoor: Option<Arc<dyn Estimator>>, outdoor: Option<Arc<dyn Estimator>>) -> Self {
        Self { indoor, outdoor }
    }

    /// Load both artifacts. A failure empties that slot and is logged; it
    /// never stops startup.
    pub fn load(indoor_path: &Path, outdoor_path: &Path) -> Self {
        Self {
            indoor: load_slot(Location::Indoor, indoor_path),
            outdoor: load_slot(Location::Outdoor, outdoor_path),
        }
    }

    pub fn for_location(&self, location: Location) -> Option<&dyn Estimator> {
        match location {
            Location::Indoor => self.indoor.as_deref(),
            Location::Outdoor => self.outdoor.as_deref(),
        }
    }

    pub fn is_loaded(&self, location: Location) -> bool {
        self.for_location(location).is_some()
    }

    pub fn all_loaded(&self) -> bool {
        self.indoor.is_some() && self.outdoor.is_some()
    }

    pub fn any_loaded(&self) -> bool {
        self.indoor.is_some() || self.outdoor.is_some()
    }
}

fn load_slot(location: Location, path: &Path) -> Option<Arc<dyn Estimator>> {
    match load_estimator(path) {
        Ok(est) => {
            tracing::info!(%location, path = %path.display(), kind = est.kind(), "model ready");
            Some(Arc::from(est))
        }
        Err(e) => {
            tracing::warn!(%location, path = %path.display(), "model unavailable: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use serde_json::json;
    use std::path::PathBuf;

    fn linear(intercept: f64) -> Value {
        let coef = [0.0; 7];
        json!({ "kind": "linear", "coef": coef, "intercept": intercept })
    }

    fn tmp_file(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("aqi_backend_{}_{name}", std::process::id()));
        fs::write(&path, body).unwrap();
        path
    }

    fn score(est: &dyn Estimator) -> f64 {
        est.predict(&FeatureVector::new(25.0, 60.0, 35.0, 400.0, 35.0, 0.0))
            .unwrap()
    }

    #[test]
    fn direct_estimator_is_used_as_is() {
        let est = estimator_from_value(linear(61.0)).unwrap();
        assert_eq!(score(est.as_ref()), 61.0);
    }

    #[test]
    fn mapping_probes_keys_in_priority_order() {
        let wrapped = json!({
            "feature_names": ["temp_c"],
            "final_model": linear(5.0),
            "estimator": linear(3.0),
            "model": "not an estimator"
        });
        // "model" fails, "best_estimator" is absent, "estimator" wins over "final_model"
        let est = estimator_from_value(wrapped).unwrap();
        assert_eq!(score(est.as_ref()), 3.0);
    }

    #[test]
    fn mapping_without_estimator_reports_keys() {
        let err = estimator_from_value(json!({ "scaler": {}, "metrics": {"r2": 0.9} }))
            .err()
            .unwrap();
        match err {
            ModelError::NotFound { candidates, present } => {
                assert_eq!(candidates[0], "model");
                assert_eq!(present.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_from_disk() {
        let path = tmp_file("direct.json", &linear(42.0).to_string());
        let est = load_estimator(&path).unwrap();
        assert_eq!(score(est.as_ref()), 42.0);
        fs::remove_file(path).ok();
    }

    #[test]
    fn load_failures_leave_slot_empty() {
        let garbage = tmp_file("garbage.json", "\u{80}not json");
        let missing = PathBuf::from("/definitely/not/here/aqi_model_outdoor.json");
        let models = Models::load(&garbage, &missing);
        assert!(!models.any_loaded());
        assert!(!models.is_loaded(Location::Indoor));
        fs::remove_file(garbage).ok();
    }

    #[test]
    fn one_slot_loaded() {
        let path = tmp_file("indoor_only.json", &json!({ "model": linear(70.0) }).to_string());
        let models = Models::load(&path, Path::new("/nope/outdoor.json"));
        assert!(models.any_loaded());
        assert!(!models.all_loaded());
        assert!(models.for_location(Location::Outdoor).is_none());
        let est = models.for_location(Location::Indoor).unwrap();
        assert_eq!(score(est), 70.0);
        fs::remove_file(path).ok();
    }

    #[cfg(not(feature = "torchscript"))]
    #[test]
    fn torchscript_needs_feature() {
        let err = load_estimator(Path::new("model.pt")).err().unwrap();
        assert!(matches!(err, ModelError::TorchScript(_)));
    }
}
