//! Mapper pipeline: lens -> cover -> local clustering -> nerve.
//!
//! ## Stages
//!
//! ```text
//! Configured -> FittingLens -> FittingCover -> FittingClusters -> Assembled
//! ```
//!
//! `fit` walks every stage and keeps the fitted state ([`FittedMapper`]):
//! cover bounds, clusterer parameters and the input and lens widths.
//! `transform` replays lens, cover (with the fitted bounds), clustering and
//! assembly on new data without touching that state, so a fitted pipeline
//! can serve concurrent transforms. A failed `fit` returns the pipeline to
//! `Configured` with no fitted state.
//!
//! A dataset with no rows is valid whatever its width: `fit` learns an empty
//! cover and both `fit` and `transform` return an empty graph.
//!
//! Filters and cover sets are fanned out through the configured
//! [`BranchExecutor`]; results are gathered in submission order, so the
//! graph is identical whatever the executor.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::canonical::canonical_hash_hex;
use crate::cluster::{Clusterer, LocalClusterer};
use crate::cover::{Cover, FittedCover};
use crate::error::{ConfigError, MapperError};
use crate::executor::{executor_for, Branch, BranchExecutor, BranchOutput};
use crate::filter::{compute_lens, Filter, FilterFunction};
use crate::nerve::{clusters_of, Nerve};
use crate::types::{Cluster, CoverSet, Dataset, MapperGraph, Matrix};
use crate::MAPPER_SCHEMA_VERSION;

fn default_min_intersection() -> usize {
    1
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Filter functions; their outputs are concatenated in this order.
    pub filters: Vec<FilterFunction>,
    /// Cover of the lens space.
    #[serde(default)]
    pub cover: Cover,
    /// Clusterer run inside each cover set.
    #[serde(default)]
    pub clusterer: Clusterer,
    /// Worker count; `None` uses the global pool, `Some(1)` runs sequentially.
    #[serde(default)]
    pub n_jobs: Option<usize>,
    /// Minimum shared points for an edge.
    #[serde(default = "default_min_intersection")]
    pub min_intersection: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            filters: vec![FilterFunction::default()],
            cover: Cover::default(),
            clusterer: Clusterer::default(),
            n_jobs: None,
            min_intersection: default_min_intersection(),
        }
    }
}

impl MapperConfig {
    /// Replace the filter list.
    pub fn with_filters(mut self, filters: Vec<FilterFunction>) -> Self {
        self.filters = filters;
        self
    }

    /// Replace the cover.
    pub fn with_cover(mut self, cover: impl Into<Cover>) -> Self {
        self.cover = cover.into();
        self
    }

    /// Replace the clusterer.
    pub fn with_clusterer(mut self, clusterer: impl Into<Clusterer>) -> Self {
        self.clusterer = clusterer.into();
        self
    }

    /// Set the worker count.
    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Set the minimum shared-point count for edges.
    pub fn with_min_intersection(mut self, min_intersection: usize) -> Self {
        self.min_intersection = min_intersection;
        self
    }

    /// Check every parameter that does not depend on the data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filters.is_empty() {
            return Err(ConfigError::EmptyFilterList);
        }
        for filter in &self.filters {
            filter.validate_params()?;
        }
        self.cover.validate()?;
        self.clusterer.validate()?;
        Nerve::with_min_intersection(self.min_intersection).validate()?;
        if self.n_jobs == Some(0) {
            return Err(ConfigError::invalid("n_jobs", "must be at least 1"));
        }
        Ok(())
    }
}

/// Where a pipeline is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Configured, not fitted.
    Configured,
    /// Computing lens values.
    FittingLens,
    /// Fitting and applying the cover.
    FittingCover,
    /// Clustering inside cover sets.
    FittingClusters,
    /// Graph assembled; fitted state available.
    Assembled,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configured => "configured",
            Self::FittingLens => "fitting_lens",
            Self::FittingCover => "fitting_cover",
            Self::FittingClusters => "fitting_clusters",
            Self::Assembled => "assembled",
        };
        f.write_str(name)
    }
}

/// State learned by `fit`, sufficient to replay `transform`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedMapper {
    /// Schema version of this record.
    pub schema_version: String,
    /// Fitted cover bounds.
    pub cover: FittedCover,
    /// Clusterer used for every cover set.
    pub clusterer: Clusterer,
    /// Input width seen at fit time.
    pub n_features: usize,
    /// Lens width seen at fit time.
    pub lens_dims: usize,
    /// Minimum shared points for an edge.
    pub min_intersection: usize,
    /// When the state was fitted. Not part of [`FittedMapper::params_hash`].
    pub fitted_at: DateTime<Utc>,
}

impl FittedMapper {
    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, MapperError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, MapperError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Content hash of the fitted parameters, floats quantized.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&(
            self.cover.quantized(),
            self.clusterer.quantized(),
            self.n_features,
            self.lens_dims,
            self.min_intersection,
        ))
    }
}

/// Mapper pipeline: configuration, executor and fitted state.
#[derive(Clone)]
pub struct MapperPipeline {
    config: MapperConfig,
    executor: Arc<dyn BranchExecutor>,
    stage: PipelineStage,
    fitted: Option<FittedMapper>,
}

impl fmt::Debug for MapperPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperPipeline")
            .field("config", &self.config)
            .field("executor", &self.executor.name())
            .field("stage", &self.stage)
            .field("fitted", &self.fitted.is_some())
            .finish()
    }
}

impl MapperPipeline {
    /// Validate `config` and build the executor its `n_jobs` asks for.
    pub fn new(config: MapperConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let executor: Arc<dyn BranchExecutor> = Arc::from(executor_for(config.n_jobs)?);
        Ok(Self::from_parts(config, executor, None))
    }

    /// Validate `config` and use a caller-provided executor.
    pub fn with_executor(config: MapperConfig, executor: Arc<dyn BranchExecutor>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(config, executor, None))
    }

    /// Rebuild a fitted pipeline from persisted state.
    ///
    /// Filters come from `config`; cover bounds, clusterer and edge
    /// threshold come from `fitted`.
    pub fn from_fitted(config: MapperConfig, fitted: FittedMapper) -> Result<Self, ConfigError> {
        config.validate()?;
        fitted.clusterer.validate()?;
        Nerve::with_min_intersection(fitted.min_intersection).validate()?;
        let executor: Arc<dyn BranchExecutor> = Arc::from(executor_for(config.n_jobs)?);
        Ok(Self::from_parts(config, executor, Some(fitted)))
    }

    fn from_parts(config: MapperConfig, executor: Arc<dyn BranchExecutor>, fitted: Option<FittedMapper>) -> Self {
        let stage = if fitted.is_some() {
            PipelineStage::Assembled
        } else {
            PipelineStage::Configured
        };
        Self {
            config,
            executor,
            stage,
            fitted,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Fitted state, if `fit` succeeded.
    pub fn fitted(&self) -> Option<&FittedMapper> {
        self.fitted.as_ref()
    }

    /// Name of the executor in use.
    pub fn executor_name(&self) -> &str {
        self.executor.name()
    }

    /// Fit every stage on `data`.
    pub fn fit(&mut self, data: &Dataset) -> Result<&FittedMapper, MapperError> {
        self.fit_transform(data)?;
        self.fitted.as_ref().ok_or(MapperError::NotFitted)
    }

    /// Fit on `data` and return its graph.
    pub fn fit_transform(&mut self, data: &Dataset) -> Result<MapperGraph, MapperError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("mapper_run", %run_id, op = "fit", n_points = data.n_rows());
        let _guard = span.enter();

        self.fitted = None;
        match self.run_fit(data) {
            Ok((fitted, graph)) => {
                info!(
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    params_hash = %fitted.params_hash(),
                    graph_hash = %graph.graph_hash,
                    "mapper fitted"
                );
                self.fitted = Some(fitted);
                self.stage = PipelineStage::Assembled;
                Ok(graph)
            }
            Err(e) => {
                warn!(error = %e, stage = %self.stage, "fit failed");
                self.stage = PipelineStage::Configured;
                Err(e)
            }
        }
    }

    fn run_fit(&mut self, data: &Dataset) -> Result<(FittedMapper, MapperGraph), MapperError> {
        self.check_input(data)?;
        if self.config.cover.overlap_frac() == 0.0 {
            warn!("overlap_frac is 0: cover sets are disjoint and the graph has no edges between them");
        }
        if data.is_empty() {
            info!(n_features = data.n_cols(), "empty dataset: nothing to cover");
            let fitted = FittedMapper {
                schema_version: MAPPER_SCHEMA_VERSION.to_string(),
                cover: FittedCover::new(Vec::new()),
                clusterer: self.config.clusterer.clone(),
                n_features: data.n_cols(),
                lens_dims: 0,
                min_intersection: self.config.min_intersection,
                fitted_at: Utc::now(),
            };
            return Ok((fitted, MapperGraph::empty(self.config.min_intersection)));
        }

        self.stage = PipelineStage::FittingLens;
        let lens = self.lens(data)?;

        self.stage = PipelineStage::FittingCover;
        let (cover, cover_sets) = {
            let _span = info_span!("cover", lens_dims = lens.n_cols()).entered();
            let cover = self.config.cover.fit(&lens)?;
            let sets = cover.transform(&lens)?;
            info!(cover_sets = sets.len(), cells = cover.n_cells(), "cover fitted");
            (cover, sets)
        };

        self.stage = PipelineStage::FittingClusters;
        let labels = self.cluster_labels(data, &cover_sets, &self.config.clusterer)?;

        let fitted = FittedMapper {
            schema_version: MAPPER_SCHEMA_VERSION.to_string(),
            cover,
            clusterer: self.config.clusterer.clone(),
            n_features: data.n_cols(),
            lens_dims: lens.n_cols(),
            min_intersection: self.config.min_intersection,
            fitted_at: Utc::now(),
        };
        let graph = assemble_graph(fitted.min_intersection, &cover_sets, &labels)?;
        Ok((fitted, graph))
    }

    /// Graph of `data` under the fitted state.
    pub fn transform(&self, data: &Dataset) -> Result<MapperGraph, MapperError> {
        let fitted = self.fitted.as_ref().ok_or(MapperError::NotFitted)?;
        let run_id = Uuid::new_v4();
        let span = info_span!("mapper_run", %run_id, op = "transform", n_points = data.n_rows());
        let _guard = span.enter();

        let (cover_sets, labels) = self.replay(fitted, data)?;
        let graph = assemble_graph(fitted.min_intersection, &cover_sets, &labels)?;
        info!(nodes = graph.node_count(), edges = graph.edge_count(), "mapper transformed");
        Ok(graph)
    }

    /// Local clusters of `data` under the fitted state, without building
    /// the graph.
    pub fn transform_clusters(&self, data: &Dataset) -> Result<Vec<Cluster>, MapperError> {
        let fitted = self.fitted.as_ref().ok_or(MapperError::NotFitted)?;
        let run_id = Uuid::new_v4();
        let span = info_span!("mapper_run", %run_id, op = "transform_clusters", n_points = data.n_rows());
        let _guard = span.enter();

        let (cover_sets, labels) = self.replay(fitted, data)?;
        clusters_of(&cover_sets, &labels)
    }

    fn replay(&self, fitted: &FittedMapper, data: &Dataset) -> Result<(Vec<CoverSet>, Vec<Vec<usize>>), MapperError> {
        self.check_input(data)?;
        if data.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        if data.n_cols() != fitted.n_features {
            return Err(MapperError::DimensionMismatch {
                what: "input features",
                expected: fitted.n_features,
                found: data.n_cols(),
            });
        }

        let lens = self.lens(data)?;
        if lens.n_cols() != fitted.lens_dims {
            return Err(MapperError::DimensionMismatch {
                what: "lens columns",
                expected: fitted.lens_dims,
                found: lens.n_cols(),
            });
        }

        let cover_sets = {
            let _span = info_span!("cover", lens_dims = lens.n_cols()).entered();
            fitted.cover.transform(&lens)?
        };
        let labels = self.cluster_labels(data, &cover_sets, &fitted.clusterer)?;
        Ok((cover_sets, labels))
    }

    /// A dataset with no rows has no width to check against the filters.
    fn check_input(&self, data: &Dataset) -> Result<(), ConfigError> {
        data.validate()?;
        if data.is_empty() {
            return Ok(());
        }
        for filter in &self.config.filters {
            filter.validate_input(data.n_cols())?;
        }
        Ok(())
    }

    /// Fan out one branch per filter and concatenate their lens blocks.
    fn lens(&self, data: &Dataset) -> Result<Matrix, MapperError> {
        let _span = info_span!("lens", filters = self.config.filters.len()).entered();

        let branches: Vec<Branch<'_>> = self
            .config
            .filters
            .iter()
            .map(|filter| {
                Box::new(move || {
                    debug!(filter = filter.name(), "computing lens");
                    compute_lens(filter, data).map(BranchOutput::Lens)
                }) as Branch<'_>
            })
            .collect();

        let blocks = self.executor.run(branches)?.into_lens_blocks()?;
        let lens = Matrix::hstack(&blocks, data.n_rows())?;
        debug!(lens_dims = lens.n_cols(), "lens computed");
        Ok(lens)
    }

    /// Fan out one branch per cover set and collect member labels.
    fn cluster_labels(
        &self,
        data: &Dataset,
        cover_sets: &[CoverSet],
        clusterer: &Clusterer,
    ) -> Result<Vec<Vec<usize>>, MapperError> {
        let _span = info_span!("clusters", cover_sets = cover_sets.len(), clusterer = clusterer.name()).entered();

        let branches: Vec<Branch<'_>> = cover_sets
            .iter()
            .map(|set| {
                Box::new(move || -> Result<BranchOutput, MapperError> {
                    let points = data.select_rows(&set.members);
                    let labels = clusterer
                        .fit_predict(&points)
                        .map_err(|e| MapperError::Clustering {
                            cover_set: set.index,
                            reason: e.to_string(),
                        })?;
                    debug!(
                        cover_set = set.index,
                        members = set.len(),
                        clusters = labels.iter().max().map_or(0, |m| m + 1),
                        "cover set clustered"
                    );
                    Ok(BranchOutput::Labels(labels))
                }) as Branch<'_>
            })
            .collect();

        self.executor.run(branches)?.into_labels()
    }
}

fn assemble_graph(min_intersection: usize, cover_sets: &[CoverSet], labels: &[Vec<usize>]) -> Result<MapperGraph, MapperError> {
    let _span = info_span!("nerve", cover_sets = cover_sets.len()).entered();
    let graph = Nerve::with_min_intersection(min_intersection).assemble(cover_sets, labels)?;
    info!(nodes = graph.node_count(), edges = graph.edge_count(), "graph assembled");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::OneDimensionalCover;
    use crate::filter::CallableFilter;

    fn line(n: usize) -> Dataset {
        Matrix::column_vector((0..n).map(|i| i as f64).collect()).unwrap()
    }

    fn nine_point_config() -> MapperConfig {
        MapperConfig::default()
            .with_cover(OneDimensionalCover::new(3, 0.2))
            .with_n_jobs(Some(1))
    }

    #[test]
    fn test_stage_lifecycle() {
        let mut pipeline = MapperPipeline::new(nine_point_config()).unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::Configured);
        assert!(pipeline.fitted().is_none());

        pipeline.fit(&line(9)).unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::Assembled);
        assert_eq!(pipeline.fitted().unwrap().n_features, 1);
    }

    #[test]
    fn test_failed_fit_resets_to_configured() {
        let failing = CallableFilter::new("bad", false, |rows: &[&[f64]]| vec![vec![f64::NAN]; rows.len()]);
        let config = nine_point_config().with_filters(vec![failing.into()]);
        let mut pipeline = MapperPipeline::new(config).unwrap();

        let err = pipeline.fit(&line(9)).unwrap_err();
        assert!(matches!(err, MapperError::NonFiniteLens { .. }));
        assert_eq!(pipeline.stage(), PipelineStage::Configured);
        assert!(pipeline.fitted().is_none());
    }

    #[test]
    fn test_transform_requires_fit() {
        let pipeline = MapperPipeline::new(nine_point_config()).unwrap();
        assert!(matches!(pipeline.transform(&line(9)), Err(MapperError::NotFitted)));
        assert!(matches!(pipeline.transform_clusters(&line(9)), Err(MapperError::NotFitted)));
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            MapperConfig::default().with_filters(vec![]).validate(),
            Err(ConfigError::EmptyFilterList)
        );
        assert!(MapperConfig::default().with_min_intersection(0).validate().is_err());
        assert!(MapperConfig::default().with_n_jobs(Some(0)).validate().is_err());
        assert!(MapperPipeline::new(MapperConfig::default().with_cover(OneDimensionalCover::new(0, 0.1))).is_err());
    }

    #[test]
    fn test_config_json_defaults() {
        let config: MapperConfig = serde_json::from_str(
            r#"{"filters":[{"kind":"projection","columns":[0]}]}"#,
        )
        .unwrap();
        assert_eq!(config.min_intersection, 1);
        assert_eq!(config.cover, Cover::default());
        assert_eq!(config.clusterer, Clusterer::default());
    }

    #[test]
    fn test_params_hash_ignores_fit_time() {
        let mut pipeline = MapperPipeline::new(nine_point_config()).unwrap();
        let first = pipeline.fit(&line(9)).unwrap().clone();
        let mut second = first.clone();
        second.fitted_at = first.fitted_at + chrono::Duration::seconds(60);

        assert_eq!(first.params_hash(), second.params_hash());
        assert_eq!(first.params_hash().len(), 16);
    }

    #[test]
    fn test_fitted_json_roundtrip() {
        let mut pipeline = MapperPipeline::new(nine_point_config()).unwrap();
        let fitted = pipeline.fit(&line(9)).unwrap().clone();

        let restored = FittedMapper::from_json(&fitted.to_json().unwrap()).unwrap();
        assert_eq!(restored, fitted);
        assert_eq!(restored.schema_version, MAPPER_SCHEMA_VERSION);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::FittingClusters.to_string(), "fitting_clusters");
    }
}
