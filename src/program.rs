//! Dependency-driven scheduler for a set of pipelines.
//!
//! Pipelines declare the result names they need rather than the pipelines
//! that produce them, so there is no graph to sort up front. Instead the
//! scheduler keeps a FIFO of ready pipelines and a waiting set keyed by
//! unmet names, and promotes waiting pipelines as each run publishes new
//! results.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt;

use crate::env::{Environment, Severity};
use crate::pipeline::{Pipeline, derive_seed};
use crate::StepPipeline;

/// Family tag for persisted programs.
pub const FAMILY: &str = "@program";

/// Errors raised directly by scheduling operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// `notify` was called with an empty result name
    EmptyLabel,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::EmptyLabel => write!(f, "Cannot notify with empty label"),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// What happened during one call to [`Program::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Indices of pipelines that ran to completion, in run order
    pub ran: Vec<usize>,
    /// Indices of pipelines still blocked when the run ended
    pub waiting: Vec<usize>,
    /// True if a pipeline failed and the rest of the queue was skipped
    pub aborted: bool,
}

/// A runnable collection of pipelines.
///
/// # Examples
///
/// ```
/// use tidyblocks::{Environment, Program, Step, StepPipeline};
///
/// let mut program = Program::new();
/// program.register(StepPipeline::new(vec![
///     Step::Read { label: "n".into() },
///     Step::SaveAs { label: "copy".into() },
/// ]));
/// program.register(StepPipeline::new(vec![
///     Step::Sequence { column: "x".into(), count: 2 },
///     Step::SaveAs { label: "n".into() },
/// ]));
///
/// let summary = program.run(Environment::new());
/// assert_eq!(summary.ran, vec![1, 0]);
/// assert!(program.environment().unwrap().has_result("copy"));
/// ```
#[derive(Debug)]
pub struct Program<P = StepPipeline> {
    pipelines: Vec<P>,
    queue: VecDeque<usize>,
    waiting: BTreeMap<usize, HashSet<String>>,
    environment: Option<Environment>,
}

impl<P> Default for Program<P> {
    fn default() -> Self {
        Program {
            pipelines: Vec::new(),
            queue: VecDeque::new(),
            waiting: BTreeMap::new(),
            environment: None,
        }
    }
}

impl<P: Pipeline> Program<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a program and register each pipeline in order.
    pub fn with_pipelines(pipelines: impl IntoIterator<Item = P>) -> Self {
        let mut program = Self::new();
        for pipeline in pipelines {
            program.register(pipeline);
        }
        program
    }

    /// Add a pipeline, queueing it if it needs nothing and parking it in
    /// the waiting set otherwise.
    pub fn register(&mut self, pipeline: P) {
        self.pipelines.push(pipeline);
        self.route(self.pipelines.len() - 1);
    }

    fn route(&mut self, index: usize) {
        let requires = self.pipelines[index].requires();
        if requires.is_empty() {
            self.queue.push_back(index);
        } else {
            self.waiting.insert(index, requires.into_iter().collect());
        }
    }

    /// Record that `label` is now available.
    ///
    /// Every waiting pipeline whose last unmet requirement was `label` moves
    /// to the back of the ready queue, in registration order.
    pub fn notify(&mut self, label: &str) -> Result<(), ScheduleError> {
        if label.is_empty() {
            return Err(ScheduleError::EmptyLabel);
        }

        // Collect first, remove after: the waiting map is not touched
        // structurally while it is being scanned.
        let mut ready = Vec::new();
        for (index, dependencies) in self.waiting.iter_mut() {
            dependencies.remove(label);
            if dependencies.is_empty() {
                ready.push(*index);
            }
        }
        for index in ready {
            self.waiting.remove(&index);
            tracing::debug!(pipeline = index, label, "pipeline ready");
            self.queue.push_back(index);
        }
        Ok(())
    }

    /// Run every reachable pipeline against `environment`.
    ///
    /// This never fails. A pipeline error stops the run and is recorded as
    /// one error entry in the environment's log; pipelines whose
    /// requirements are never produced are reported as one warning entry.
    /// The environment stays available through [`Program::environment`].
    pub fn run(&mut self, environment: Environment) -> RunSummary {
        let mut env = environment;
        let mut summary = RunSummary::default();

        if let Err(message) = self.drain(&mut env, &mut summary.ran) {
            env.append_error(message);
            summary.aborted = true;
        } else if !self.waiting.is_empty() {
            let blocked: BTreeSet<&str> = self
                .waiting
                .values()
                .flat_map(|deps| deps.iter().map(String::as_str))
                .collect();
            let names: Vec<&str> = blocked.into_iter().collect();
            env.append_log(
                Severity::Warning,
                format!(
                    "{} pipeline(s) never ran; still waiting for: {}",
                    self.waiting.len(),
                    names.join(", ")
                ),
            );
        }

        summary.waiting = self.waiting.keys().copied().collect();
        self.environment = Some(env);
        summary
    }

    fn drain(&mut self, env: &mut Environment, ran: &mut Vec<usize>) -> Result<(), String> {
        while let Some(index) = self.queue.pop_front() {
            let before: HashSet<String> = env.results.keys().cloned().collect();

            tracing::debug!(pipeline = index, "running pipeline");
            self.pipelines[index]
                .run(env)
                .map_err(|e| format!("pipeline {} failed: {}", index, error_chain(&e)))?;
            ran.push(index);

            let mut fresh: Vec<String> = env
                .results
                .keys()
                .filter(|k| !before.contains(*k))
                .cloned()
                .collect();
            fresh.sort();
            tracing::debug!(pipeline = index, produced = ?fresh, "pipeline finished");

            for label in fresh {
                self.notify(&label)
                    .map_err(|e| format!("pipeline {} failed: {}", index, error_chain(&e)))?;
            }
        }
        Ok(())
    }

    /// Rebuild the ready queue and waiting set so the program can run again.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.waiting.clear();
        self.environment = None;
        for index in 0..self.pipelines.len() {
            self.route(index);
        }
    }

    /// Reseed every random stream, giving each pipeline its own sub-seed.
    pub fn reseed(&mut self, seed: u64) {
        for (i, pipeline) in self.pipelines.iter_mut().enumerate() {
            pipeline.reseed(derive_seed(seed, i));
        }
    }
}

impl<P> Program<P> {
    pub fn pipelines(&self) -> &[P] {
        &self.pipelines
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Indices of ready pipelines, front of the queue first.
    pub fn queued(&self) -> Vec<usize> {
        self.queue.iter().copied().collect()
    }

    /// Unmet requirements of a waiting pipeline.
    pub fn waiting_on(&self, index: usize) -> Option<&HashSet<String>> {
        self.waiting.get(&index)
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    /// The environment of the last run, `None` before the first.
    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn take_environment(&mut self) -> Option<Environment> {
        self.environment.take()
    }
}

impl<P: PartialEq> PartialEq for Program<P> {
    fn eq(&self, other: &Self) -> bool {
        self.pipelines.len() == other.pipelines.len()
            && self
                .pipelines
                .iter()
                .zip(&other.pipelines)
                .all(|(a, b)| a == b)
    }
}

/// Render an error and its sources as `outer: inner: innermost`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
