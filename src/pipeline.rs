// THEORY:
// The `pipeline` module is the top-level API of the census engine. It takes a
// decoded RGBA bitmap and a classification policy and produces an `AnalysisResult`:
// how many pixels were excluded as background and what share of the remaining
// pixels falls into each category.
//
// Stages, in order:
// 1. Validation: the policy is compiled once when the pipeline is built; the
//    buffer length is checked against `width * height * 4` before any counting.
// 2. Census: every pixel is classified exactly once and counted into a `Tally`.
// 3. Report: counts become percentages of the processed (non-excluded) pixels,
//    listed in the policy's report order.

use crate::core_modules::band::band::Band;
use crate::core_modules::pixel::pixel::CHANNELS;
use crate::core_modules::policy::{ClassificationPolicy, RuleSet};
use crate::core_modules::tally::Tally;
use crate::error::{ClassifyError, Result};
use serde::{Deserialize, Serialize};

// Re-export key data structures for the public API.
pub use crate::core_modules::pixel::pixel::{Hsv, Pixel, Rgb};
pub use crate::core_modules::policy::{ExclusionReason, Verdict};
pub use crate::core_modules::tally::ExclusionBreakdown;

/// An immutable, borrowed view of a decoded RGBA8 image in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct Bitmap<'a> {
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
}

impl<'a> Bitmap<'a> {
    /// Wraps a buffer after checking that it holds exactly `width * height` samples.
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        let bitmap = Self {
            width,
            height,
            data,
        };
        bitmap.validate()?;
        Ok(bitmap)
    }

    pub fn total_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Fails with `MalformedInput` unless `data.len() == width * height * 4`.
    pub fn validate(&self) -> Result<()> {
        let expected = self.width as u128 * self.height as u128 * CHANNELS as u128;
        if expected != self.data.len() as u128 {
            return Err(ClassifyError::MalformedInput {
                width: self.width,
                height: self.height,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Bytes in one row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }
}

/// Count and share of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub id: String,
    pub name: String,
    pub display_color: String,
    pub count: u64,
    /// `100 * count / max(processed_pixels, 1)`.
    pub percentage: f64,
}

/// The census of one bitmap. Holds no reference to the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub width: u32,
    pub height: u32,
    pub total_pixels: u64,
    pub excluded_pixels: u64,
    pub processed_pixels: u64,
    pub exclusions: ExclusionBreakdown,
    /// Categories in the policy's report order.
    pub categories: Vec<CategoryStat>,
}

impl AnalysisResult {
    pub(crate) fn assemble(bitmap: &Bitmap<'_>, rules: &RuleSet, tally: &Tally) -> Self {
        let total_pixels = bitmap.total_pixels();
        let excluded_pixels = tally.excluded();
        let processed_pixels = total_pixels - excluded_pixels;
        debug_assert_eq!(tally.classified(), processed_pixels);

        let denominator = processed_pixels.max(1) as f64;
        let categories = rules
            .categories()
            .iter()
            .zip(tally.counts())
            .map(|(category, &count)| CategoryStat {
                id: category.id.clone(),
                name: category.name.clone(),
                display_color: category.display_color.clone(),
                count,
                percentage: 100.0 * count as f64 / denominator,
            })
            .collect();

        Self {
            width: bitmap.width,
            height: bitmap.height,
            total_pixels,
            excluded_pixels,
            processed_pixels,
            exclusions: tally.exclusions(),
            categories,
        }
    }

    /// Looks a category up by id.
    pub fn category(&self, id: &str) -> Option<&CategoryStat> {
        self.categories.iter().find(|stat| stat.id == id)
    }
}

/// A validated policy ready to classify any number of bitmaps.
#[derive(Debug, Clone)]
pub struct ClassificationPipeline {
    rules: RuleSet,
}

impl ClassificationPipeline {
    pub fn new(policy: &ClassificationPolicy) -> Result<Self> {
        Ok(Self {
            rules: RuleSet::compile(policy)?,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classifies a single sample.
    pub fn classify_pixel(&self, pixel: &Pixel) -> Verdict {
        self.rules.classify_pixel(pixel)
    }

    /// Single-pass census of a bitmap.
    pub fn classify(&self, bitmap: &Bitmap<'_>) -> Result<AnalysisResult> {
        bitmap.validate()?;
        tracing::debug!(
            width = bitmap.width,
            height = bitmap.height,
            "classifying bitmap"
        );

        let tally = Band::new(bitmap.data).tally(&self.rules);
        Ok(AnalysisResult::assemble(bitmap, &self.rules, &tally))
    }
}

impl Default for ClassificationPipeline {
    fn default() -> Self {
        Self {
            // The built-in policy always compiles.
            rules: RuleSet::compile(&ClassificationPolicy::default())
                .unwrap_or_else(|error| unreachable!("default policy rejected: {error}")),
        }
    }
}

/// One-shot census: validates `policy`, then classifies `bitmap`.
pub fn classify(bitmap: &Bitmap<'_>, policy: &ClassificationPolicy) -> Result<AnalysisResult> {
    ClassificationPipeline::new(policy)?.classify(bitmap)
}
