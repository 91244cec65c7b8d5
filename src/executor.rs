//! Fan-out/fan-in execution of independent branches.
//!
//! A pipeline stage hands the executor a list of branches; the executor runs
//! them (sequentially or on a worker pool) and returns their outputs in
//! submission order. The first failing branch aborts the call and no partial
//! output is returned.
//!
//! Branch outputs are a closed set of variants ([`BranchOutput`]). Each stage
//! extracts the variant it submitted with a typed accessor on
//! [`BranchOutputs`], so a mismatched output is an error rather than a
//! silent reinterpretation.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{ConfigError, MapperError};
use crate::types::Matrix;

/// One unit of work.
pub type Branch<'a> = Box<dyn FnOnce() -> Result<BranchOutput, MapperError> + Send + 'a>;

/// Output of a single branch.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchOutput {
    /// Lens block produced by one filter.
    Lens(Matrix),
    /// Cluster labels of one cover set's members, in member order.
    Labels(Vec<usize>),
}

impl BranchOutput {
    /// Variant name, for error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lens(_) => "lens",
            Self::Labels(_) => "labels",
        }
    }
}

/// Ordered outputs of one fan-out, index `i` belonging to branch `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchOutputs {
    outputs: Vec<BranchOutput>,
}

impl BranchOutputs {
    /// Wrap outputs already in submission order.
    pub fn new(outputs: Vec<BranchOutput>) -> Self {
        Self { outputs }
    }

    /// Explicit empty container.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of outputs.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether no branch was run.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Iterate in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &BranchOutput> {
        self.outputs.iter()
    }

    /// Extract lens blocks; every output must be [`BranchOutput::Lens`].
    pub fn into_lens_blocks(self) -> Result<Vec<Matrix>, MapperError> {
        self.outputs
            .into_iter()
            .enumerate()
            .map(|(index, output)| match output {
                BranchOutput::Lens(m) => Ok(m),
                other => Err(mismatch(index, "lens", &other)),
            })
            .collect()
    }

    /// Extract label vectors; every output must be [`BranchOutput::Labels`].
    pub fn into_labels(self) -> Result<Vec<Vec<usize>>, MapperError> {
        self.outputs
            .into_iter()
            .enumerate()
            .map(|(index, output)| match output {
                BranchOutput::Labels(l) => Ok(l),
                other => Err(mismatch(index, "labels", &other)),
            })
            .collect()
    }
}

fn mismatch(index: usize, expected: &'static str, found: &BranchOutput) -> MapperError {
    MapperError::UnexpectedBranchOutput {
        index,
        expected,
        found: found.kind(),
    }
}

/// Runs branches and collects their outputs in submission order.
pub trait BranchExecutor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run every branch. Returns the first error encountered, if any.
    fn run<'a>(&self, branches: Vec<Branch<'a>>) -> Result<BranchOutputs, MapperError>;
}

/// Runs branches one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl BranchExecutor for SequentialExecutor {
    fn name(&self) -> &str {
        "sequential"
    }

    fn run<'a>(&self, branches: Vec<Branch<'a>>) -> Result<BranchOutputs, MapperError> {
        if branches.is_empty() {
            return Ok(BranchOutputs::empty());
        }
        let outputs = branches
            .into_iter()
            .map(|branch| branch())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BranchOutputs::new(outputs))
    }
}

/// Runs branches on a rayon pool.
///
/// Without a dedicated pool the global rayon pool is used.
#[derive(Debug, Default)]
pub struct RayonExecutor {
    pool: Option<ThreadPool>,
}

impl RayonExecutor {
    /// Use the global rayon pool.
    pub fn global() -> Self {
        Self { pool: None }
    }

    /// Build a dedicated pool with `n_threads` workers.
    pub fn with_threads(n_threads: usize) -> Result<Self, ConfigError> {
        if n_threads == 0 {
            return Err(ConfigError::invalid("n_jobs", "must be at least 1"));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("mapper-worker-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    /// Worker count of the pool in use.
    pub fn n_threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, ThreadPool::current_num_threads)
    }
}

impl BranchExecutor for RayonExecutor {
    fn name(&self) -> &str {
        "rayon"
    }

    fn run<'a>(&self, branches: Vec<Branch<'a>>) -> Result<BranchOutputs, MapperError> {
        if branches.is_empty() {
            return Ok(BranchOutputs::empty());
        }
        debug!(branches = branches.len(), threads = self.n_threads(), "fan-out");

        let fan_out = move || {
            branches
                .into_par_iter()
                .map(|branch| branch())
                .collect::<Result<Vec<_>, _>>()
        };
        let outputs = match &self.pool {
            Some(pool) => pool.install(fan_out),
            None => fan_out(),
        }?;
        Ok(BranchOutputs::new(outputs))
    }
}

/// Executor for an `n_jobs` setting: `Some(1)` runs sequentially, `Some(n)`
/// builds a pool of `n` threads and `None` uses the global pool.
pub fn executor_for(n_jobs: Option<usize>) -> Result<Box<dyn BranchExecutor>, ConfigError> {
    match n_jobs {
        Some(1) => Ok(Box::new(SequentialExecutor)),
        Some(n) => Ok(Box::new(RayonExecutor::with_threads(n)?)),
        None => Ok(Box::new(RayonExecutor::global())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn label_branches<'a>(n: usize) -> Vec<Branch<'a>> {
        (0..n)
            .map(|i| Box::new(move || Ok(BranchOutput::Labels(vec![i]))) as Branch<'a>)
            .collect()
    }

    fn executors() -> Vec<Box<dyn BranchExecutor>> {
        vec![
            Box::new(SequentialExecutor),
            Box::new(RayonExecutor::global()),
            Box::new(RayonExecutor::with_threads(3).unwrap()),
        ]
    }

    #[test]
    fn test_outputs_keep_submission_order() {
        for executor in executors() {
            let labels = executor.run(label_branches(64)).unwrap().into_labels().unwrap();
            let expected: Vec<Vec<usize>> = (0..64).map(|i| vec![i]).collect();
            assert_eq!(labels, expected, "executor {}", executor.name());
        }
    }

    #[test]
    fn test_empty_fan_out() {
        for executor in executors() {
            let outputs = executor.run(Vec::new()).unwrap();
            assert!(outputs.is_empty());
            assert!(outputs.into_lens_blocks().unwrap().is_empty());
        }
    }

    #[test]
    fn test_failure_aborts_the_call() {
        for executor in executors() {
            let mut branches = label_branches(8);
            branches.insert(
                3,
                Box::new(|| Err(MapperError::Clustering { cover_set: 3, reason: "boom".into() })),
            );
            let err = executor.run(branches).unwrap_err();
            assert!(matches!(err, MapperError::Clustering { cover_set: 3, .. }));
        }
    }

    #[test]
    fn test_sequential_stops_at_first_failure() {
        let ran = AtomicUsize::new(0);
        let ran_ref = &ran;
        let branches: Vec<Branch<'_>> = (0..5)
            .map(|i| {
                Box::new(move || {
                    ran_ref.fetch_add(1, Ordering::SeqCst);
                    if i == 1 {
                        Err(MapperError::NotFitted)
                    } else {
                        Ok(BranchOutput::Labels(vec![]))
                    }
                }) as Branch<'_>
            })
            .collect();

        assert!(SequentialExecutor.run(branches).is_err());
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_branches_borrow_shared_data() {
        let data = Matrix::from_rows(vec![vec![1.0], vec![2.0]]).unwrap();
        let shared = &data;
        let branches: Vec<Branch<'_>> = (0..4)
            .map(|_| Box::new(move || Ok(BranchOutput::Lens(shared.clone()))) as Branch<'_>)
            .collect();

        let blocks = RayonExecutor::global().run(branches).unwrap().into_lens_blocks().unwrap();
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|b| *b == data));
    }

    #[test]
    fn test_mismatched_variant_is_an_error() {
        let outputs = BranchOutputs::new(vec![
            BranchOutput::Labels(vec![0]),
            BranchOutput::Lens(Matrix::from_rows(vec![vec![0.0]]).unwrap()),
        ]);
        let err = outputs.into_labels().unwrap_err();
        assert!(matches!(
            err,
            MapperError::UnexpectedBranchOutput { index: 1, expected: "labels", found: "lens" }
        ));
    }

    #[test]
    fn test_executor_for_n_jobs() {
        assert_eq!(executor_for(Some(1)).unwrap().name(), "sequential");
        assert_eq!(executor_for(Some(2)).unwrap().name(), "rayon");
        assert_eq!(executor_for(None).unwrap().name(), "rayon");
        assert!(executor_for(Some(0)).is_err());
    }
}
