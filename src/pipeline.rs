//! The pipeline contract the scheduler drives, and the step-based pipeline
//! that block programs are built from.

use crate::env::Environment;
use crate::step::{PipelineError, Step};

/// Family tag for persisted pipelines.
pub const FAMILY: &str = "@pipeline";

/// A named, runnable unit of work scheduled by a [`Program`](crate::Program).
///
/// `requires` lists the result names that must be present in the
/// environment before `run` is called. `run` publishes its output by
/// writing into `environment.results`.
pub trait Pipeline {
    type Error: std::error::Error + 'static;

    /// Result names this pipeline needs, in declaration order, without
    /// duplicates.
    fn requires(&self) -> Vec<String>;

    fn run(&mut self, env: &mut Environment) -> Result<(), Self::Error>;

    /// Make any random streams the pipeline owns deterministic.
    fn reseed(&mut self, _seed: u64) {}
}

/// A pipeline built from a sequence of [`Step`]s.
///
/// # Examples
///
/// ```
/// use tidyblocks::{Environment, Pipeline, Step, StepPipeline};
///
/// let mut pipeline = StepPipeline::new(vec![
///     Step::Sequence { column: "n".into(), count: 3 },
///     Step::SaveAs { label: "numbers".into() },
/// ]);
/// let mut env = Environment::new();
/// pipeline.run(&mut env).unwrap();
/// assert_eq!(env.result("numbers").unwrap().row_count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepPipeline {
    pub steps: Vec<Step>,
}

impl StepPipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        StepPipeline { steps }
    }

    /// Result labels this pipeline saves, in step order.
    pub fn produces(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for step in &self.steps {
            if let Step::SaveAs { label } = step {
                if !out.contains(label) {
                    out.push(label.clone());
                }
            }
        }
        out
    }
}

impl Pipeline for StepPipeline {
    type Error = PipelineError;

    fn requires(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for step in &self.steps {
            if let Step::Read { label } = step {
                if !out.contains(label) {
                    out.push(label.clone());
                }
            }
        }
        out
    }

    fn run(&mut self, env: &mut Environment) -> Result<(), PipelineError> {
        let mut data = None;
        for step in &mut self.steps {
            data = step.run(env, data)?;
        }
        Ok(())
    }

    fn reseed(&mut self, seed: u64) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            if let Some(value) = step.value_mut() {
                value.reseed(derive_seed(seed, i));
            }
        }
    }
}

/// Spread a base seed across numbered children so sibling streams differ.
pub fn derive_seed(base: u64, index: usize) -> u64 {
    base ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
