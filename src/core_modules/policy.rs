// THEORY:
// The `policy` module turns a colour-classification policy into data. A policy is
// an exclusion rule, a list of category definitions in the order they are reported,
// and a separate list of rules in the order they are *evaluated*. Keeping the two
// orders apart lets the report stay stable ("Warm" first) while evaluation stays
// first-match-wins with exact colours ahead of the HSV band.
//
// Key architectural principles:
// 1.  **Policy is data**: `ClassificationPolicy` is plain, serialisable configuration.
//     Callers can load an alternative palette from JSON without touching the engine.
// 2.  **Validate once, classify many**: `RuleSet::compile` checks the policy and
//     resolves every category id to an index. The per-pixel path never looks up a
//     string.
// 3.  **Ordered evaluation**: `RuleSet::classify_pixel` walks opacity, exclusion
//     colours, the border test and then each rule top to bottom, returning on the
//     first hit. Anything left over lands in the fallback category.

use crate::core_modules::pixel::pixel::{Hsv, Pixel, Rgb};
use crate::error::{ClassifyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type CategoryIndex = usize;

/// The "border" heuristic: a pinkish-purple frame colour with strong red and blue
/// and weak green. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderRule {
    pub red_above: u8,
    pub blue_above: u8,
    pub green_below: u8,
}

impl BorderRule {
    #[inline]
    pub fn matches(&self, pixel: &Pixel) -> bool {
        pixel.red > self.red_above && pixel.blue > self.blue_above && pixel.green < self.green_below
    }
}

/// Decides which pixels are background and never reach the category rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// Treat any pixel with alpha below 255 as background.
    pub exclude_translucent: bool,
    /// Exact background colours (e.g. magenta key colour).
    #[serde(default)]
    pub background_colors: Vec<Rgb>,
    #[serde(default)]
    pub border: Option<BorderRule>,
}

/// A hue/saturation/value window. Hue bounds are inclusive and do not wrap
/// around 360°.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvBand {
    pub hue_min: f64,
    pub hue_max: f64,
    pub saturation_min: f64,
    pub value_min: f64,
}

impl HsvBand {
    #[inline]
    pub fn contains(&self, hsv: &Hsv) -> bool {
        hsv.hue >= self.hue_min
            && hsv.hue <= self.hue_max
            && hsv.saturation >= self.saturation_min
            && hsv.value >= self.value_min
    }

    fn validate(&self) -> Result<()> {
        let hue_range = 0.0..360.0;
        if !hue_range.contains(&self.hue_min) || !hue_range.contains(&self.hue_max) {
            return Err(ClassifyError::InvalidPolicy(format!(
                "hue bounds [{}, {}] must lie in [0, 360)",
                self.hue_min, self.hue_max
            )));
        }
        if self.hue_min > self.hue_max {
            return Err(ClassifyError::InvalidPolicy(format!(
                "hue_min {} is greater than hue_max {}",
                self.hue_min, self.hue_max
            )));
        }
        for (label, threshold) in [
            ("saturation_min", self.saturation_min),
            ("value_min", self.value_min),
        ] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ClassifyError::InvalidPolicy(format!(
                    "{label} {threshold} must lie in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// The predicate half of a category rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Matcher {
    /// Bit-exact RGB equality.
    Exact(Rgb),
    /// HSV threshold window.
    Hsv(HsvBand),
}

impl Matcher {
    #[inline]
    fn matches(&self, pixel: &Pixel, hsv: &mut Option<Hsv>) -> bool {
        match self {
            Matcher::Exact(color) => pixel.rgb() == *color,
            // HSV is computed lazily and at most once per pixel.
            Matcher::Hsv(band) => band.contains(hsv.get_or_insert_with(|| pixel.hsv())),
        }
    }
}

/// One entry of the priority-ordered rule list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Id of the category this rule reports into.
    pub category: String,
    #[serde(flatten)]
    pub matcher: Matcher,
}

/// Static metadata for one reported category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub id: String,
    pub name: String,
    /// Display hint for consumers (`#RRGGBB`); unrelated to classification.
    pub display_color: String,
}

impl CategoryDefinition {
    pub fn new(id: &str, name: &str, display_color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            display_color: display_color.to_string(),
        }
    }
}

/// Caller-supplied classification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    pub exclusion: ExclusionRule,
    /// Categories in report order.
    pub categories: Vec<CategoryDefinition>,
    /// Rules in evaluation order; first match wins.
    pub rules: Vec<CategoryRule>,
    /// Category id for pixels no rule matched.
    pub fallback: String,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        let dark_green = Rgb::new(0, 146, 69);
        let blue = Rgb::new(0, 0, 255);
        let neon_green = Rgb::new(0, 255, 0);
        let grey = Rgb::new(77, 77, 77);
        let exact = |category: &str, color: Rgb| CategoryRule {
            category: category.to_string(),
            matcher: Matcher::Exact(color),
        };

        Self {
            exclusion: ExclusionRule {
                exclude_translucent: true,
                background_colors: vec![Rgb::new(255, 0, 255)],
                border: Some(BorderRule {
                    red_above: 150,
                    blue_above: 150,
                    green_below: 60,
                }),
            },
            categories: vec![
                CategoryDefinition::new("warm", "Warm", "#FF8C00"),
                CategoryDefinition::new("dark_green", "Dark Green", &dark_green.to_hex()),
                CategoryDefinition::new("blue", "Blue", &blue.to_hex()),
                CategoryDefinition::new("neon_green", "Neon Green", &neon_green.to_hex()),
                CategoryDefinition::new("grey", "Grey", &grey.to_hex()),
                CategoryDefinition::new("other", "Other", "#C8C8C8"),
            ],
            rules: vec![
                exact("dark_green", dark_green),
                exact("blue", blue),
                exact("neon_green", neon_green),
                exact("grey", grey),
                CategoryRule {
                    category: "warm".to_string(),
                    matcher: Matcher::Hsv(HsvBand {
                        hue_min: 0.0,
                        hue_max: 75.0,
                        saturation_min: 0.55,
                        value_min: 0.35,
                    }),
                },
            ],
            fallback: "other".to_string(),
        }
    }
}

impl ClassificationPolicy {
    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Checks the policy without keeping the compiled form.
    pub fn validate(&self) -> Result<()> {
        RuleSet::compile(self).map(|_| ())
    }
}

/// Why a pixel was left out of the census.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusionReason {
    /// Alpha below 255.
    Translucent,
    /// Exact match to a background key colour.
    Background,
    /// Matched the border heuristic.
    Border,
}

/// Outcome of classifying one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Excluded(ExclusionReason),
    /// Index into the policy's category list (report order).
    Category(CategoryIndex),
}

#[derive(Debug, Clone)]
struct CompiledRule {
    matcher: Matcher,
    category: CategoryIndex,
}

/// A validated policy with category ids resolved to indices.
#[derive(Debug, Clone)]
pub struct RuleSet {
    exclusion: ExclusionRule,
    categories: Vec<CategoryDefinition>,
    rules: Vec<CompiledRule>,
    fallback: CategoryIndex,
}

impl RuleSet {
    pub fn compile(policy: &ClassificationPolicy) -> Result<Self> {
        let mut index_by_id = HashMap::with_capacity(policy.categories.len());
        for (index, category) in policy.categories.iter().enumerate() {
            if index_by_id.insert(category.id.as_str(), index).is_some() {
                return Err(ClassifyError::InvalidPolicy(format!(
                    "duplicate category id '{}'",
                    category.id
                )));
            }
        }

        let resolve = |id: &str| {
            index_by_id.get(id).copied().ok_or_else(|| {
                ClassifyError::InvalidPolicy(format!("unknown category id '{id}'"))
            })
        };

        let fallback = resolve(&policy.fallback)?;
        let mut rules = Vec::with_capacity(policy.rules.len());
        for rule in &policy.rules {
            if let Matcher::Hsv(band) = &rule.matcher {
                band.validate()?;
            }
            rules.push(CompiledRule {
                matcher: rule.matcher.clone(),
                category: resolve(&rule.category)?,
            });
        }

        Ok(Self {
            exclusion: policy.exclusion.clone(),
            categories: policy.categories.clone(),
            rules,
            fallback,
        })
    }

    pub fn categories(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    pub fn fallback(&self) -> CategoryIndex {
        self.fallback
    }

    /// Classifies one pixel. Total over every RGBA value.
    #[inline]
    pub fn classify_pixel(&self, pixel: &Pixel) -> Verdict {
        if let Some(reason) = self.exclusion_reason(pixel) {
            return Verdict::Excluded(reason);
        }

        let mut hsv = None;
        for rule in &self.rules {
            if rule.matcher.matches(pixel, &mut hsv) {
                return Verdict::Category(rule.category);
            }
        }
        Verdict::Category(self.fallback)
    }

    #[inline]
    fn exclusion_reason(&self, pixel: &Pixel) -> Option<ExclusionReason> {
        if self.exclusion.exclude_translucent && !pixel.is_opaque() {
            return Some(ExclusionReason::Translucent);
        }
        let rgb = pixel.rgb();
        if self.exclusion.background_colors.contains(&rgb) {
            return Some(ExclusionReason::Background);
        }
        match &self.exclusion.border {
            Some(border) if border.matches(pixel) => Some(ExclusionReason::Border),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_rules() -> RuleSet {
        RuleSet::compile(&ClassificationPolicy::default()).expect("default policy is valid")
    }

    fn category_of(rules: &RuleSet, pixel: Pixel) -> &str {
        match rules.classify_pixel(&pixel) {
            Verdict::Category(index) => rules.categories()[index].id.as_str(),
            Verdict::Excluded(reason) => {
                panic!("pixel {pixel:?} unexpectedly excluded: {reason:?}")
            }
        }
    }

    #[test]
    fn opacity_is_checked_before_anything_else() {
        let rules = default_rules();
        // Would be Dark Green if opaque.
        assert_eq!(
            rules.classify_pixel(&Pixel::new(0, 146, 69, 254)),
            Verdict::Excluded(ExclusionReason::Translucent)
        );
        // Would be magenta if opaque; still reported as translucent.
        assert_eq!(
            rules.classify_pixel(&Pixel::new(255, 0, 255, 0)),
            Verdict::Excluded(ExclusionReason::Translucent)
        );
    }

    #[test]
    fn magenta_and_border_are_excluded() {
        let rules = default_rules();
        assert_eq!(
            rules.classify_pixel(&Pixel::new(255, 0, 255, 255)),
            Verdict::Excluded(ExclusionReason::Background)
        );
        assert_eq!(
            rules.classify_pixel(&Pixel::new(200, 10, 200, 255)),
            Verdict::Excluded(ExclusionReason::Border)
        );
    }

    #[test]
    fn border_comparisons_are_strict() {
        let rules = default_rules();
        // R == 150 is not above 150.
        assert_eq!(category_of(&rules, Pixel::new(150, 10, 200, 255)), "other");
        // G == 60 is not below 60.
        assert_eq!(category_of(&rules, Pixel::new(200, 60, 200, 255)), "other");
        assert_eq!(
            rules.classify_pixel(&Pixel::new(151, 59, 151, 255)),
            Verdict::Excluded(ExclusionReason::Border)
        );
    }

    #[test]
    fn exact_matches() {
        let rules = default_rules();
        assert_eq!(category_of(&rules, Pixel::new(0, 146, 69, 255)), "dark_green");
        assert_eq!(category_of(&rules, Pixel::new(0, 0, 255, 255)), "blue");
        assert_eq!(category_of(&rules, Pixel::new(0, 255, 0, 255)), "neon_green");
        assert_eq!(category_of(&rules, Pixel::new(77, 77, 77, 255)), "grey");
        // One step off any exact colour falls through.
        assert_eq!(category_of(&rules, Pixel::new(0, 146, 70, 255)), "other");
        assert_eq!(category_of(&rules, Pixel::new(78, 77, 77, 255)), "other");
    }

    #[test]
    fn warm_band() {
        let rules = default_rules();
        assert_eq!(category_of(&rules, Pixel::new(200, 30, 30, 255)), "warm");
        assert_eq!(category_of(&rules, Pixel::new(255, 140, 0, 255)), "warm");
        assert_eq!(category_of(&rules, Pixel::new(10, 10, 10, 255)), "other");
        // Dim red: S is high but V < 0.35.
        assert_eq!(category_of(&rules, Pixel::new(80, 0, 0, 255)), "other");
        // Pale red: V is high but S < 0.55.
        assert_eq!(category_of(&rules, Pixel::new(255, 200, 200, 255)), "other");
    }

    #[test]
    fn warm_hue_range_does_not_wrap() {
        let rules = default_rules();
        // Hue ~358°: red to the eye, outside [0, 75].
        let pixel = Pixel::new(255, 0, 8, 255);
        assert!(pixel.hsv().hue > 355.0);
        assert_eq!(category_of(&rules, pixel), "other");
    }

    #[test]
    fn warm_hue_stops_at_75_degrees() {
        let rules = default_rules();
        let edge = Pixel::new(150, 200, 0, 255);
        assert_eq!(edge.hsv().hue, 75.0);
        assert_eq!(category_of(&rules, edge), "warm");

        let past_edge = Pixel::new(140, 200, 0, 255);
        assert!(past_edge.hsv().hue > 75.0);
        assert_eq!(category_of(&rules, past_edge), "other");
    }

    #[test]
    fn exact_categories_display_their_own_colour() {
        let policy = ClassificationPolicy::default();
        for rule in &policy.rules {
            if let Matcher::Exact(color) = &rule.matcher {
                let category = policy
                    .categories
                    .iter()
                    .find(|category| category.id == rule.category)
                    .unwrap();
                assert_eq!(category.display_color, color.to_hex());
            }
        }
        assert_eq!(policy.categories[1].display_color, "#009245");
    }

    #[test]
    fn warm_hue_upper_bound_is_inclusive() {
        let mut policy = ClassificationPolicy::default();
        // Pure yellow sits at exactly 60°; pull the bound down onto it.
        if let Matcher::Hsv(band) = &mut policy.rules[4].matcher {
            band.hue_max = 60.0;
        }
        let rules = RuleSet::compile(&policy).unwrap();
        assert_eq!(category_of(&rules, Pixel::new(255, 255, 0, 255)), "warm");
        // Slightly greener than yellow is past the bound.
        assert_eq!(category_of(&rules, Pixel::new(250, 255, 0, 255)), "other");
    }

    #[test]
    fn earlier_rule_wins_over_warm_band() {
        let mut policy = ClassificationPolicy::default();
        // An exact rule whose colour also lies inside the warm band.
        policy.rules.insert(
            0,
            CategoryRule {
                category: "dark_green".to_string(),
                matcher: Matcher::Exact(Rgb::new(200, 30, 30)),
            },
        );
        let rules = RuleSet::compile(&policy).unwrap();
        let pixel = Pixel::new(200, 30, 30, 255);
        assert!(matches!(
            policy.rules[5].matcher,
            Matcher::Hsv(band) if band.contains(&pixel.hsv())
        ));
        assert_eq!(category_of(&rules, pixel), "dark_green");
    }

    #[test]
    fn translucent_pixels_kept_when_opacity_rule_is_off() {
        let mut policy = ClassificationPolicy::default();
        policy.exclusion.exclude_translucent = false;
        let rules = RuleSet::compile(&policy).unwrap();
        assert_eq!(category_of(&rules, Pixel::new(0, 0, 255, 10)), "blue");
    }

    #[test]
    fn rejects_unknown_fallback() {
        let mut policy = ClassificationPolicy::default();
        policy.fallback = "missing".to_string();
        assert!(matches!(policy.validate(), Err(ClassifyError::InvalidPolicy(_))));
    }

    #[test]
    fn rejects_rule_with_unknown_category() {
        let mut policy = ClassificationPolicy::default();
        policy.rules[0].category = "teal".to_string();
        assert!(matches!(policy.validate(), Err(ClassifyError::InvalidPolicy(_))));
    }

    #[test]
    fn rejects_duplicate_category_ids() {
        let mut policy = ClassificationPolicy::default();
        policy
            .categories
            .push(CategoryDefinition::new("blue", "Blue Again", "#0000FF"));
        assert!(matches!(policy.validate(), Err(ClassifyError::InvalidPolicy(_))));
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let cases: [fn(&mut HsvBand); 4] = [
            |band: &mut HsvBand| band.hue_max = 360.0,
            |band: &mut HsvBand| band.hue_min = -1.0,
            |band: &mut HsvBand| band.saturation_min = 1.5,
            |band: &mut HsvBand| band.value_min = -0.1,
        ];
        for mutate in cases {
            let mut policy = ClassificationPolicy::default();
            if let Matcher::Hsv(band) = &mut policy.rules[4].matcher {
                mutate(band);
            }
            assert!(matches!(policy.validate(), Err(ClassifyError::InvalidPolicy(_))));
        }
    }

    #[test]
    fn rejects_inverted_hue_range() {
        let mut policy = ClassificationPolicy::default();
        if let Matcher::Hsv(band) = &mut policy.rules[4].matcher {
            band.hue_min = 80.0;
            band.hue_max = 10.0;
        }
        assert!(matches!(policy.validate(), Err(ClassifyError::InvalidPolicy(_))));
    }

    #[test]
    fn default_policy_survives_json() {
        let policy = ClassificationPolicy::default();
        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(ClassificationPolicy::from_json_str(&json).unwrap(), policy);
    }

    #[test]
    fn parses_hand_written_policy() {
        let json = r##"{
            "exclusion": { "exclude_translucent": true },
            "categories": [
                { "id": "sea", "name": "Sea", "display_color": "#0000FF" },
                { "id": "rest", "name": "Rest", "display_color": "#808080" }
            ],
            "rules": [
                { "category": "sea", "kind": "exact", "red": 0, "green": 0, "blue": 255 }
            ],
            "fallback": "rest"
        }"##;
        let policy = ClassificationPolicy::from_json_str(json).unwrap();
        let rules = RuleSet::compile(&policy).unwrap();
        assert_eq!(category_of(&rules, Pixel::new(0, 0, 255, 255)), "sea");
        assert_eq!(category_of(&rules, Pixel::new(255, 0, 255, 255)), "rest");
    }
}
