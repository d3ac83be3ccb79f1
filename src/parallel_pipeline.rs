// THEORY:
// The parallel pipeline produces exactly the same `AnalysisResult` as the
// sequential one, but cuts the bitmap into horizontal bands and tallies each band
// on a tokio blocking worker. A pixel's category never depends on another pixel,
// so band tallies can be summed in any order once every band has finished.
//
// No partial census is ever returned: the result is assembled only after all band
// tasks join successfully. Dropping the future abandons the outstanding bands and
// their counts are discarded.

use crate::core_modules::band::band::{Band, plan_rows};
use crate::core_modules::policy::{ClassificationPolicy, RuleSet};
use crate::core_modules::tally::Tally;
use crate::error::{ClassifyError, Result};
use crate::pipeline::{AnalysisResult, Bitmap, ClassificationPipeline};
use futures::future::try_join_all;
use std::sync::Arc;

const MIN_ROWS_PER_BAND: usize = 64;

/// Tuning for the parallel pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on the number of bands classified concurrently.
    pub worker_count: usize,
    /// Bands are not cut thinner than this many rows.
    pub min_rows_per_band: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            min_rows_per_band: MIN_ROWS_PER_BAND,
        }
    }
}

/// An owned, shareable RGBA frame for work that outlives the caller's borrow.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let frame = Self {
            width,
            height,
            data: data.into(),
        };
        frame.as_bitmap().validate()?;
        Ok(frame)
    }

    pub fn as_bitmap(&self) -> Bitmap<'_> {
        Bitmap {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

/// A band task that panicked or was cancelled.
fn worker_failure(error: tokio::task::JoinError) -> ClassifyError {
    ClassifyError::Worker(error.to_string())
}

pub struct ParallelPipeline {
    config: PipelineConfig,
    rules: Arc<RuleSet>,
}

impl ParallelPipeline {
    pub fn new(policy: &ClassificationPolicy, config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            config,
            rules: Arc::new(RuleSet::compile(policy)?),
        })
    }

    pub fn from_pipeline(pipeline: &ClassificationPipeline, config: PipelineConfig) -> Self {
        Self {
            config,
            rules: Arc::new(pipeline.rules().clone()),
        }
    }

    /// Banded census of `frame`. Identical to `ClassificationPipeline::classify`.
    ///
    /// A band task that panics or is cancelled surfaces its `JoinError` as
    /// `ClassifyError::Worker`; the partial tallies of the other bands are dropped.
    pub async fn classify(&self, frame: &FrameBuffer) -> Result<AnalysisResult> {
        let bitmap = frame.as_bitmap();
        bitmap.validate()?;

        let stride = bitmap.stride();
        let plan = plan_rows(
            frame.height as usize,
            self.config.worker_count,
            self.config.min_rows_per_band,
        );
        tracing::debug!(
            width = frame.width,
            height = frame.height,
            bands = plan.len(),
            "classifying bitmap in parallel"
        );

        let handles = plan.into_iter().map(|rows| {
            let data = Arc::clone(&frame.data);
            let rules = Arc::clone(&self.rules);
            tokio::task::spawn_blocking(move || {
                let bytes = &data[rows.start * stride..rows.end * stride];
                Band::new(bytes).tally(&rules)
            })
        });

        let partials = try_join_all(handles)
            .await
            .map_err(worker_failure)?;

        let mut tally = Tally::new(self.rules.categories().len());
        for partial in &partials {
            tally += partial;
        }

        Ok(AnalysisResult::assemble(&bitmap, &self.rules, &tally))
    }
}
