//! Hyperparameters loaded from a JSON config file.
//!
//! Nested JSON objects become nested [`HParams`] scopes; everything else is
//! kept as a plain JSON value. Lookups are explicit (`get`, `get_path`,
//! `contains`) instead of attribute-style access.

use crate::error::{TrainingError, TrainingResult};
use crate::layout::CheckpointLayout;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "./configs/config.json";

#[derive(Debug, Clone, PartialEq)]
pub enum HValue {
    Scope(HParams),
    Value(Value),
}

impl HValue {
    #[must_use]
    pub fn as_scope(&self) -> Option<&HParams> {
        match self {
            Self::Scope(scope) => Some(scope),
            Self::Value(_) => None,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Scope(_) => None,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Scope(scope) => scope.to_json(),
            Self::Value(value) => value.clone(),
        }
    }
}

impl From<Value> for HValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Scope(HParams::from_map(map)),
            other => Self::Value(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HParams {
    entries: BTreeMap<String, HValue>,
}

impl HParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn from_map(map: Map<String, Value>) -> Self {
        Self { entries: map.into_iter().map(|(k, v)| (k, HValue::from(v))).collect() }
    }

    pub fn from_json_value(value: Value) -> TrainingResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(TrainingError::Config(format!("config root must be a JSON object, got {other}"))),
        }
    }

    pub fn from_json_str(text: &str) -> TrainingResult<Self> {
        Self::from_json_value(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> TrainingResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TrainingError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Loads `<model_dir>/config.json` and records `model_dir` in the result.
    pub fn from_dir(model_dir: &Path) -> TrainingResult<Self> {
        let mut hparams = Self::from_file(&CheckpointLayout::new(model_dir).config_path())?;
        hparams.insert("model_dir", Value::String(model_dir.to_string_lossy().into_owned()));
        Ok(hparams)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&HValue> {
        self.entries.get(key)
    }

    /// Dotted lookup through nested scopes, e.g. `train.batch_size`.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&HValue> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = current.as_scope()?.get(part)?;
        }
        Some(current)
    }

    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> TrainingResult<T> {
        let value = self
            .get_path(path)
            .ok_or_else(|| TrainingError::Config(format!("missing config key: {path}")))?;
        serde_json::from_value(value.to_json())
            .map_err(|e| TrainingError::Config(format!("config key {path} has the wrong type: {e}")))
    }

    #[must_use]
    pub fn scope(&self, key: &str) -> Option<&Self> {
        self.get(key).and_then(HValue::as_scope)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<HValue>) -> Option<HValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &HValue> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}

impl From<HParams> for HValue {
    fn from(scope: HParams) -> Self {
        Self::Scope(scope)
    }
}

impl std::fmt::Display for HParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for HParams {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HParams {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json_value(value).map_err(serde::de::Error::custom)
    }
}

/// Training stage; selects which checkpoint directory the config points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    One,
    Two,
}

impl Stage {
    #[must_use]
    pub fn ckpt_dir_key(self) -> &'static str {
        match self {
            Self::One => "s1_ckpt_dir",
            Self::Two => "s2_ckpt_dir",
        }
    }
}

impl TryFrom<u8> for Stage {
    type Error = TrainingError;

    fn try_from(stage: u8) -> TrainingResult<Self> {
        match stage {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(TrainingError::Config(format!("unknown training stage: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HParamsOptions {
    pub config: PathBuf,
    pub pretrain: Option<String>,
    pub resume_step: Option<u64>,
    pub stage: Stage,
}

impl Default for HParamsOptions {
    fn default() -> Self {
        Self { config: PathBuf::from(DEFAULT_CONFIG_PATH), pretrain: None, resume_step: None, stage: Stage::One }
    }
}

/// Loads the training config and prepares the stage's model directory.
///
/// The config text is copied unchanged to `<model_dir>/config.json` so a run
/// can later be reloaded with [`HParams::from_dir`].
pub fn load_training_hparams(options: &HParamsOptions) -> TrainingResult<HParams> {
    let text = std::fs::read_to_string(&options.config)
        .map_err(|e| TrainingError::Config(format!("failed to read {}: {e}", options.config.display())))?;
    let mut hparams = HParams::from_json_str(&text)?;

    hparams.insert("pretrain", options.pretrain.clone().map_or(Value::Null, Value::String));
    hparams.insert("resume_step", options.resume_step.map_or(Value::Null, Value::from));

    let key = options.stage.ckpt_dir_key();
    let model_dir: String = hparams.get_as(key)?;
    let layout = CheckpointLayout::new(&model_dir);
    layout.ensure_dir()?;
    std::fs::write(layout.config_path(), &text)?;

    tracing::debug!(model_dir = %model_dir, "prepared model directory");
    Ok(hparams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "train": {"batch_size": 8, "learning_rate": 0.0002, "betas": [0.8, 0.99]},
        "data": {"sampling_rate": 32000, "filter_length": 2048},
        "model": {"inter_channels": 192, "upsample_rates": [10, 8, 2, 2, 2]},
        "s1_ckpt_dir": "S1_DIR",
        "s2_ckpt_dir": "S2_DIR"
    }"#;

    fn write_config(temp: &TempDir) -> PathBuf {
        let s1 = temp.path().join("logs_s1");
        let s2 = temp.path().join("logs_s2");
        let text = CONFIG
            .replace("S1_DIR", &s1.to_string_lossy())
            .replace("S2_DIR", &s2.to_string_lossy());
        let path = temp.path().join("config.json");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_nested_objects_become_scopes() {
        let hparams = HParams::from_json_str(CONFIG).unwrap();

        assert_eq!(hparams.len(), 5);
        assert!(hparams.contains("train"));
        assert!(!hparams.contains("eval"));
        assert!(hparams.scope("train").is_some());
        assert!(hparams.scope("s1_ckpt_dir").is_none());
        assert_eq!(hparams.get_as::<u32>("train.batch_size").unwrap(), 8);
        assert_eq!(hparams.get_as::<Vec<u32>>("model.upsample_rates").unwrap(), vec![10, 8, 2, 2, 2]);
        assert!(hparams.get_path("train.batch_size.extra").is_none());

        let keys: Vec<&str> = hparams.scope("data").unwrap().keys().collect();
        assert_eq!(keys, vec!["filter_length", "sampling_rate"]);
    }

    #[test]
    fn test_wrong_type_is_config_error() {
        let hparams = HParams::from_json_str(CONFIG).unwrap();
        let err = hparams.get_as::<String>("train.batch_size").unwrap_err();
        assert!(matches!(err, TrainingError::Config(_)));
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(HParams::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_json_round_trip_preserves_structure() {
        let hparams = HParams::from_json_str(CONFIG).unwrap();
        let original: Value = serde_json::from_str(CONFIG).unwrap();
        assert_eq!(hparams.to_json(), original);

        let text = serde_json::to_string(&hparams).unwrap();
        let back: HParams = serde_json::from_str(&text).unwrap();
        assert_eq!(back, hparams);
    }

    #[test]
    fn test_load_training_hparams_prepares_stage_dir() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let options = HParamsOptions {
            config: config.clone(),
            pretrain: Some("pretrained/s2G.pth".to_string()),
            resume_step: Some(1200),
            stage: Stage::Two,
        };

        let hparams = load_training_hparams(&options).unwrap();

        let saved = temp.path().join("logs_s2").join("config.json");
        assert!(saved.exists());
        assert_eq!(std::fs::read_to_string(saved).unwrap(), std::fs::read_to_string(config).unwrap());
        assert!(!temp.path().join("logs_s1").exists());
        assert_eq!(hparams.get("pretrain").unwrap().to_json(), json!("pretrained/s2G.pth"));
        assert_eq!(hparams.get_as::<u64>("resume_step").unwrap(), 1200);
    }

    #[test]
    fn test_absent_cli_overrides_are_null() {
        let temp = TempDir::new().unwrap();
        let options = HParamsOptions { config: write_config(&temp), ..Default::default() };

        let hparams = load_training_hparams(&options).unwrap();

        assert!(temp.path().join("logs_s1").join("config.json").exists());
        assert_eq!(hparams.get("pretrain").unwrap().to_json(), Value::Null);
        assert_eq!(hparams.get_as::<Option<u64>>("resume_step").unwrap(), None);
    }

    #[test]
    fn test_missing_stage_dir_key_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"train": {}}"#).unwrap();
        let options = HParamsOptions { config: path, ..Default::default() };

        let err = load_training_hparams(&options).unwrap_err();
        assert!(matches!(err, TrainingError::Config(msg) if msg.contains("s1_ckpt_dir")));
    }

    #[test]
    fn test_from_dir_sets_model_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.json"), CONFIG).unwrap();

        let hparams = HParams::from_dir(temp.path()).unwrap();

        assert_eq!(hparams.get_as::<String>("model_dir").unwrap(), temp.path().to_string_lossy());
        assert_eq!(hparams.len(), 6);
    }

    #[test]
    fn test_stage_from_number() {
        assert_eq!(Stage::try_from(2).unwrap(), Stage::Two);
        assert!(Stage::try_from(3).is_err());
    }
}
