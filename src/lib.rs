// THEORY:
// This file is the main entry point for the `pixel_census` library crate.
// It exposes the census engine: hand it a decoded RGBA bitmap and a colour
// classification policy, and it returns how the non-background pixels split
// across the policy's categories.
//
// The public surface is the `pipeline` module (`ClassificationPipeline`,
// `Bitmap`, `AnalysisResult`), the banded `parallel_pipeline`, and the policy
// types. The per-pixel machinery lives in `core_modules`.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::policy::{
    BorderRule, CategoryDefinition, CategoryRule, ClassificationPolicy, ExclusionRule, HsvBand,
    Matcher,
};
pub use error::{AppError, ClassifyError};
pub use parallel_pipeline::{FrameBuffer, ParallelPipeline, PipelineConfig};
pub use pipeline::{AnalysisResult, Bitmap, CategoryStat, ClassificationPipeline, classify};
