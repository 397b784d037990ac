//! Shared analysis pipeline used by the `analyze` and `demo` commands.
//!
//! Per sample: clean -> (smooth) -> detect linear region, and aggregate the
//! curve-wide properties from the cleaned curve. Samples are independent, so
//! they can be computed on a rayon pool; rows are still appended to the
//! results table by a single writer in input order.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{AnalysisConfig, LinearRegion, MechanicalProperties, Sample, UnitSystem};
use crate::error::AnalysisError;
use crate::fit::LinearRegionDetector;
use crate::properties::PropertyAggregator;
use crate::results::ResultsStore;
use crate::smooth::CurveSmoother;
use crate::streamline::DataStreamliner;

/// Everything computed for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub name: String,
    pub cleaned_points: usize,
    pub processed_points: usize,
    pub region: Option<LinearRegion>,
    pub properties: Option<MechanicalProperties>,
    /// Recoverable errors, in the order they occurred.
    pub errors: Vec<AnalysisError>,
}

impl SampleOutcome {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cleaned_points: 0,
            processed_points: 0,
            region: None,
            properties: None,
            errors: Vec::new(),
        }
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub store: ResultsStore,
    pub outcomes: Vec<SampleOutcome>,
}

impl RunOutput {
    pub fn failed_samples(&self) -> impl Iterator<Item = &SampleOutcome> {
        self.outcomes.iter().filter(|o| !o.errors.is_empty())
    }
}

/// Configured pipeline. Building one validates the whole configuration, so a
/// bad unit or smoothing parameter fails before any sample is touched.
#[derive(Debug, Clone)]
pub struct TensileAnalysis {
    units: UnitSystem,
    streamliner: DataStreamliner,
    smoother: Option<CurveSmoother>,
    detector: LinearRegionDetector,
    aggregator: PropertyAggregator,
    keep_traces: bool,
    parallel: bool,
}

impl TensileAnalysis {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let units = UnitSystem::new(&config.strain_unit, &config.stress_unit)?;
        let streamliner = DataStreamliner::new(&units, config.preload)?;
        let smoother = if config.smoothing {
            Some(CurveSmoother::new(
                config.smoothing_window,
                config.poly_order,
                config.data_points,
            )?)
        } else {
            None
        };
        let detector = LinearRegionDetector::new(
            config.r_squared_threshold,
            config.lower_strain_limit,
            config.upper_strain_limit,
            &units,
            config.limit_rule,
        )?;
        let aggregator = PropertyAggregator::new(&units);

        Ok(Self {
            units,
            streamliner,
            smoother,
            detector,
            aggregator,
            keep_traces: config.keep_traces,
            parallel: config.parallel,
        })
    }

    pub fn units(&self) -> &UnitSystem {
        &self.units
    }

    /// Replace the streamliner (e.g. with a custom derivative collaborator).
    pub fn with_streamliner(mut self, streamliner: DataStreamliner) -> Self {
        self.streamliner = streamliner;
        self
    }

    /// Replace the smoother. `None` disables smoothing.
    pub fn with_smoother(mut self, smoother: Option<CurveSmoother>) -> Self {
        self.smoother = smoother;
        self
    }

    /// Run every stage for one sample. Never fails: errors end up in the outcome.
    pub fn analyze_sample(&self, sample: &Sample) -> SampleOutcome {
        let mut outcome = SampleOutcome::new(&sample.name);

        let cleaned = match self.streamliner.clean(sample) {
            Ok(c) => c,
            Err(err) => {
                outcome.errors.push(err);
                return outcome;
            }
        };
        outcome.cleaned_points = cleaned.len();
        outcome.properties = Some(self.aggregator.aggregate(&cleaned));

        let processed = match &self.smoother {
            Some(smoother) => smoother.process(&cleaned),
            None => Ok(crate::domain::ProcessedCurve::passthrough(&cleaned)),
        };
        let processed = match processed {
            Ok(p) => p,
            Err(err) => {
                outcome.errors.push(err);
                return outcome;
            }
        };
        outcome.processed_points = processed.len();

        let region = if self.keep_traces {
            self.detector.detect(&processed)
        } else {
            self.detector.locate(&processed)
        };
        match region {
            Ok(r) => outcome.region = Some(r),
            Err(err) => outcome.errors.push(err),
        }

        outcome
    }

    /// Analyze all samples and collect one results row per sample, in input order.
    pub fn run(&self, samples: &[Sample]) -> RunOutput {
        info!(samples = samples.len(), parallel = self.parallel, "analysis started");

        let outcomes: Vec<SampleOutcome> = if self.parallel {
            samples.par_iter().map(|s| self.analyze_sample(s)).collect()
        } else {
            samples.iter().map(|s| self.analyze_sample(s)).collect()
        };

        let mut store = ResultsStore::new(self.units.clone());
        for outcome in &outcomes {
            let row = store.append(outcome.name.clone());
            if let Some(properties) = &outcome.properties {
                store.record_properties(row, properties);
            }
            if let Some(region) = &outcome.region {
                store.record_region(row, region);
            }
            for err in &outcome.errors {
                warn!(sample = %outcome.name, "{err}");
            }
        }

        info!(
            samples = store.len(),
            usable = store.usable_rows(),
            failed = outcomes.iter().filter(|o| !o.errors.is_empty()).count(),
            "analysis finished"
        );
        RunOutput { store, outcomes }
    }
}
