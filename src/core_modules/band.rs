// THEORY:
// The `Band` module represents a spatial grouping of pixels: a contiguous run of
// whole rows. It is the unit of work for the census. The sequential pipeline
// tallies the whole image as a single band; the parallel pipeline cuts the image
// into several bands, tallies each on its own worker and sums the results.
//
// Key architectural principles:
// 1.  **Borrowed data**: A `Band` is a view over the caller's RGBA buffer. It never
//     copies or mutates pixel bytes.
// 2.  **Single pass**: `tally` walks every sample exactly once, in memory order,
//     with no state carried between pixels.
// 3.  **Disjoint cover**: `plan_rows` splits `0..height` into contiguous,
//     non-overlapping ranges that cover every row exactly once, so summing band
//     tallies counts every pixel exactly once.

pub mod band {
    use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};
    use crate::core_modules::policy::RuleSet;
    use crate::core_modules::tally::Tally;
    use std::ops::Range;

    /// A borrowed run of whole rows from an RGBA buffer.
    pub struct Band<'a> {
        /// Raw RGBA bytes for the covered rows; length is a multiple of 4.
        pub bytes: &'a [u8],
    }

    impl<'a> Band<'a> {
        pub fn new(bytes: &'a [u8]) -> Self {
            Self { bytes }
        }

        /// Classifies every pixel in the band and counts the verdicts.
        pub fn tally(&self, rules: &RuleSet) -> Tally {
            let mut tally = Tally::new(rules.categories().len());
            let (samples, _) = self.bytes.as_chunks::<CHANNELS>();
            for sample in samples {
                tally.record(rules.classify_pixel(&Pixel::from_rgba(sample)));
            }
            tally
        }
    }

    /// Splits `0..height` into at most `band_count` contiguous row ranges. The
    /// count is also capped at `ceil(height / min_rows)` so short images are not
    /// cut into slivers. Earlier bands take the remainder rows.
    pub fn plan_rows(height: usize, band_count: usize, min_rows: usize) -> Vec<Range<usize>> {
        if height == 0 {
            return Vec::new();
        }
        let min_rows = min_rows.max(1);
        let band_count = band_count.clamp(1, height.div_ceil(min_rows).max(1));

        let base = height / band_count;
        let remainder = height % band_count;
        let mut ranges = Vec::with_capacity(band_count);
        let mut start = 0;
        for index in 0..band_count {
            let rows = base + usize::from(index < remainder);
            ranges.push(start..start + rows);
            start += rows;
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::band::*;
    use crate::core_modules::policy::{ClassificationPolicy, RuleSet};

    #[test]
    fn tallies_every_sample() {
        let rules = RuleSet::compile(&ClassificationPolicy::default()).unwrap();
        let bytes = [
            0, 146, 69, 255, // dark green
            255, 0, 255, 255, // magenta
            10, 10, 10, 255, // other
        ];
        let tally = Band::new(&bytes).tally(&rules);

        assert_eq!(tally.classified() + tally.excluded(), 3);
        assert_eq!(tally.excluded(), 1);
        // Report order: warm, dark_green, blue, neon_green, grey, other.
        assert_eq!(tally.counts(), &[0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn empty_band_is_all_zero() {
        let rules = RuleSet::compile(&ClassificationPolicy::default()).unwrap();
        let tally = Band::new(&[]).tally(&rules);
        assert_eq!(tally.classified(), 0);
        assert_eq!(tally.excluded(), 0);
    }

    #[test]
    fn plan_covers_every_row_once() {
        for height in [1usize, 2, 7, 64, 100, 1023] {
            for bands in [1usize, 2, 3, 8, 200] {
                let plan = plan_rows(height, bands, 1);
                assert!(plan.len() <= bands);
                assert_eq!(plan.first().map(|r| r.start), Some(0));
                assert_eq!(plan.last().map(|r| r.end), Some(height));
                for pair in plan.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }
                assert!(plan.iter().all(|r| !r.is_empty()));
            }
        }
    }

    #[test]
    fn plan_respects_minimum_rows() {
        let plan = plan_rows(100, 16, 30);
        assert_eq!(plan.len(), 4);
        assert!(plan.iter().all(|r| r.len() >= 25));

        assert_eq!(plan_rows(10, 8, 64), vec![0..10]);
    }

    #[test]
    fn plan_for_empty_image_is_empty() {
        assert!(plan_rows(0, 4, 1).is_empty());
    }
}
