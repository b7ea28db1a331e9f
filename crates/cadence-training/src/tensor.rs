use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dense `f32` tensor in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTensor")]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Deserialize)]
struct RawTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TryFrom<RawTensor> for Tensor {
    type Error = TrainingError;

    fn try_from(raw: RawTensor) -> TrainingResult<Self> {
        Self::new(raw.shape, raw.data)
    }
}

fn element_count(shape: &[usize]) -> TrainingResult<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| TrainingError::InvalidTensor(format!("shape {shape:?} overflows the element count")))
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> TrainingResult<Self> {
        let expected = element_count(&shape)?;
        if expected != data.len() {
            return Err(TrainingError::InvalidTensor(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn full(shape: &[usize], value: f32) -> TrainingResult<Self> {
        let len = element_count(shape)?;
        Ok(Self { shape: shape.to_vec(), data: vec![value; len] })
    }

    pub fn zeros(shape: &[usize]) -> TrainingResult<Self> {
        Self::full(shape, 0.0)
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[must_use]
    pub fn numel(&self) -> usize {
        self.data.len()
    }
}

/// Named parameters of a model, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    params: BTreeMap<String, Tensor>,
}

impl ParameterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) -> Option<Tensor> {
        self.params.insert(name.into(), tensor)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.params.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn shapes(&self) -> BTreeMap<String, Vec<usize>> {
        self.params.iter().map(|(k, v)| (k.clone(), v.shape.clone())).collect()
    }

    /// Total number of scalar values across all parameters.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.params.values().map(Tensor::numel).sum()
    }
}

impl FromIterator<(String, Tensor)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, Tensor)>>(iter: I) -> Self {
        Self { params: iter.into_iter().collect() }
    }
}

impl IntoIterator for ParameterSet {
    type Item = (String, Tensor);
    type IntoIter = std::collections::btree_map::IntoIter<String, Tensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.into_iter()
    }
}
