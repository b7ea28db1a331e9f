//! Merging a loaded parameter snapshot into a model's parameter layout.
//!
//! The target layout is authoritative: the result holds exactly the target's
//! names, each with the snapshot value when the shapes agree and the target's
//! own value otherwise.

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::error::TrainingResult;
use crate::tensor::{ParameterSet, Tensor};
use serde::Serialize;

/// Model seam: anything that can hand out and accept its named parameters.
pub trait StateDict {
    fn state_dict(&self) -> ParameterSet;

    fn load_state_dict(&mut self, params: ParameterSet) -> TrainingResult<()>;
}

impl StateDict for ParameterSet {
    fn state_dict(&self) -> ParameterSet {
        self.clone()
    }

    fn load_state_dict(&mut self, params: ParameterSet) -> TrainingResult<()> {
        *self = params;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum KeyOutcome {
    Loaded,
    ShapeMismatch { expected: Vec<usize>, found: Vec<usize> },
    Missing,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub outcomes: Vec<(String, KeyOutcome)>,
    /// Snapshot names the target does not have; they are dropped.
    pub unexpected: Vec<String>,
}

impl ReconcileReport {
    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == KeyOutcome::Loaded)
            .map(|(k, _)| k.as_str())
    }

    pub fn fallbacks(&self) -> impl Iterator<Item = (&str, &KeyOutcome)> {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o != KeyOutcome::Loaded)
            .map(|(k, o)| (k.as_str(), o))
    }

    /// True when every target parameter came from the snapshot.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.fallbacks().next().is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub parameters: ParameterSet,
    pub report: ReconcileReport,
}

fn classify(expected: &Tensor, candidate: Option<&Tensor>) -> KeyOutcome {
    match candidate {
        None => KeyOutcome::Missing,
        Some(found) if found.shape() != expected.shape() => KeyOutcome::ShapeMismatch {
            expected: expected.shape().to_vec(),
            found: found.shape().to_vec(),
        },
        Some(_) => KeyOutcome::Loaded,
    }
}

pub fn reconcile(target: &ParameterSet, source: &ParameterSet, sink: &dyn DiagnosticSink) -> Reconciliation {
    let mut parameters = ParameterSet::new();
    let mut report = ReconcileReport::default();

    for (name, current) in target.iter() {
        let candidate = source.get(name);
        let outcome = classify(current, candidate);

        let value = match (&outcome, candidate) {
            (KeyOutcome::Loaded, Some(loaded)) => loaded.clone(),
            (KeyOutcome::ShapeMismatch { expected, found }, _) => {
                sink.emit(DiagnosticEvent::warning(format!(
                    "shape mismatch for {name}: checkpoint has {found:?}, model expects {expected:?}; keeping model value"
                )));
                current.clone()
            }
            _ => {
                sink.emit(DiagnosticEvent::warning(format!("{name} is not in the checkpoint; keeping model value")));
                current.clone()
            }
        };

        parameters.insert(name, value);
        report.outcomes.push((name.to_string(), outcome));
    }

    report.unexpected = source.names().filter(|n| !target.contains(n)).map(str::to_string).collect();

    Reconciliation { parameters, report }
}

/// Loads `saved` into `model`, keeping the model's own values wherever the
/// snapshot is missing a parameter or disagrees on its shape.
pub fn copy_state_dict(
    model: &mut dyn StateDict,
    saved: &ParameterSet,
    sink: &dyn DiagnosticSink,
) -> TrainingResult<ReconcileReport> {
    let current = model.state_dict();
    let Reconciliation { parameters, report } = reconcile(&current, saved, sink);
    model.load_state_dict(parameters)?;
    Ok(report)
}
