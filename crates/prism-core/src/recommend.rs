//! Filter recommendation scoring.
//!
//! Every catalog filter starts at a neutral score and is nudged up or
//! down by additive rules keyed on the analysis signals. Scores are
//! clamped to `[0, 100]`, weak matches are dropped, and the remainder is
//! returned best-first.

use serde::{Deserialize, Serialize};

use crate::catalog::{AestheticCatalog, FilterCategory, FilterDefinition};
use crate::types::AnalysisResult;

/// Starting score for every filter.
pub const BASE_SCORE: f64 = 50.0;

/// Filters scoring below this are not recommended.
pub const MIN_SCORE: f64 = 40.0;

/// Maximum number of recommendations returned.
pub const MAX_RECOMMENDATIONS: usize = 8;

/// A scored filter suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRecommendation {
    pub filter_id: String,
    pub name: String,
    pub category: FilterCategory,
    /// Suitability in `[0, 100]`
    pub score: f64,
    /// Rules that moved the score, in evaluation order
    pub reasons: Vec<String>,
}

/// Scores catalog filters against an analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterRecommender {
    catalog: AestheticCatalog,
}

/// Lowercased view of the analysis fields the rules look at.
struct Signals<'a> {
    analysis: &'a AnalysisResult,
    image_type: String,
    mood: String,
    improvements: Vec<String>,
}

impl<'a> Signals<'a> {
    fn new(analysis: &'a AnalysisResult) -> Self {
        Self {
            analysis,
            image_type: analysis.image_type.to_lowercase(),
            mood: analysis.mood.to_lowercase(),
            improvements: analysis
                .suggested_improvements
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
        }
    }

    fn mood_in(&self, moods: &[&str]) -> bool {
        moods.contains(&self.mood.as_str())
    }

    fn type_or_subject(&self, types: &[&str], subjects: &[&str]) -> bool {
        types.contains(&self.image_type.as_str())
            || subjects.iter().any(|s| self.analysis.has_subject(s))
    }

    fn improvement_mentions(&self, words: &[&str]) -> bool {
        self.improvements
            .iter()
            .any(|i| words.iter().any(|w| i.contains(w)))
    }
}

/// Accumulates a filter's score and the reasons behind it.
struct Score {
    value: f64,
    reasons: Vec<String>,
}

impl Score {
    fn adjust(&mut self, delta: f64, reason: &str) {
        self.value += delta;
        self.reasons.push(reason.to_string());
    }
}

fn id_has(filter: &FilterDefinition, needles: &[&str]) -> bool {
    needles.iter().any(|n| filter.id.contains(n))
}

fn score_filter(filter: &FilterDefinition, s: &Signals<'_>) -> Score {
    let mut score = Score {
        value: BASE_SCORE,
        reasons: Vec::new(),
    };
    let overall = s.analysis.technical_quality.overall;
    let correction = filter.category == FilterCategory::Correction;

    if overall < 0.5 {
        if correction {
            score.adjust(20.0, "low technical quality benefits from correction");
        }
        if id_has(filter, &["soft"]) {
            score.adjust(15.0, "soft rendering hides technical flaws");
        }
    } else if overall > 0.8 && correction {
        score.adjust(-15.0, "already technically strong");
    }

    if s.type_or_subject(&["portrait"], &["person", "face"])
        && id_has(filter, &["portrait", "soft", "golden"])
    {
        score.adjust(20.0, "flattering for people");
    }
    if s.type_or_subject(&["landscape", "nature"], &["tree", "mountain", "sky", "forest"])
        && id_has(filter, &["vivid", "nature"])
    {
        score.adjust(20.0, "enhances natural scenery");
    }
    if s.type_or_subject(&["food"], &["food"]) && id_has(filter, &["vivid", "golden"]) {
        score.adjust(15.0, "makes food look appetizing");
    }
    if s.type_or_subject(&["urban", "architecture", "street", "city"], &["building"])
        && id_has(filter, &["teal", "noir", "dramatic"])
    {
        score.adjust(15.0, "suits urban scenes");
    }
    if s.type_or_subject(&["night"], &["neon", "city lights"]) && id_has(filter, &["neon", "noir"])
    {
        score.adjust(15.0, "suits night scenes");
    }

    if s.mood_in(&["warm", "happy", "joyful", "cheerful", "romantic"]) {
        if id_has(filter, &["golden", "warm"]) {
            score.adjust(15.0, "matches warm mood");
        }
        if id_has(filter, &["cool", "noir"]) {
            score.adjust(-10.0, "clashes with warm mood");
        }
    } else if s.mood_in(&["calm", "neutral", "peaceful", "serene"]) {
        if id_has(filter, &["soft", "fade", "pastel"]) {
            score.adjust(10.0, "keeps a calm mood gentle");
        }
    } else if s.mood_in(&["dark", "moody", "mysterious", "sad", "dramatic", "melancholic"]) {
        if id_has(filter, &["noir", "dramatic", "moody"]) {
            score.adjust(20.0, "reinforces dark mood");
        }
        if id_has(filter, &["bright", "pastel"]) {
            score.adjust(-10.0, "fights dark mood");
        }
    } else if s.mood_in(&["energetic", "vibrant", "exciting"]) {
        if id_has(filter, &["vivid", "neon", "pop"]) {
            score.adjust(15.0, "amplifies energetic mood");
        }
    } else if s.mood_in(&["nostalgic", "vintage", "retro"]) && id_has(filter, &["vintage", "fade"])
    {
        score.adjust(20.0, "matches nostalgic mood");
    }

    if s.mood == "neutral" && filter.category == FilterCategory::Mood {
        score.adjust(-5.0, "no strong mood to emphasize");
    }

    if s.analysis.confidence < 0.5 && filter.category == FilterCategory::Creative {
        score.adjust(-10.0, "low classification confidence");
    }

    if s.improvement_mentions(&["bright", "exposure", "dark", "underexposed"])
        && id_has(filter, &["exposure", "shadow"])
    {
        score.adjust(15.0, "addresses suggested exposure fix");
    }
    if s.improvement_mentions(&["contrast"]) && id_has(filter, &["clarity", "contrast"]) {
        score.adjust(10.0, "addresses suggested contrast fix");
    }
    if s.improvement_mentions(&["color", "colour", "white balance"])
        && id_has(filter, &["color_balance", "auto_fix"])
    {
        score.adjust(10.0, "addresses suggested color fix");
    }

    score.value = score.value.clamp(0.0, 100.0);
    score
}

impl FilterRecommender {
    pub fn new(catalog: AestheticCatalog) -> Self {
        Self { catalog }
    }

    /// Score every filter and return the best matches, highest first.
    ///
    /// Ties keep catalog order. Pure: the same analysis always yields the
    /// same list.
    pub fn recommend(&self, analysis: &AnalysisResult) -> Vec<FilterRecommendation> {
        let signals = Signals::new(analysis);
        let mut recs: Vec<FilterRecommendation> = self
            .catalog
            .filters()
            .iter()
            .filter_map(|filter| {
                let score = score_filter(filter, &signals);
                (score.value >= MIN_SCORE).then(|| FilterRecommendation {
                    filter_id: filter.id.to_string(),
                    name: filter.name.to_string(),
                    category: filter.category,
                    score: score.value,
                    reasons: score.reasons,
                })
            })
            .collect();

        // sort_by is stable, so equal scores keep catalog order
        recs.sort_by(|a, b| b.score.total_cmp(&a.score));
        recs.truncate(MAX_RECOMMENDATIONS);
        recs
    }
}

/// Recommend filters from the builtin catalog.
pub fn recommend_filters(analysis: &AnalysisResult) -> Vec<FilterRecommendation> {
    FilterRecommender::default().recommend(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::analysis;
    use crate::types::{EditingIntensity, TechnicalQuality};
    use proptest::prelude::*;

    #[test]
    fn test_low_quality_portrait_prefers_soft() {
        let mut a = analysis("portrait", "neutral", &[]);
        a.technical_quality.overall = 0.3;
        let recs = recommend_filters(&a);
        assert!(!recs.is_empty());
        assert!(recs[0].filter_id.contains("soft"), "top was {}", recs[0].filter_id);
        assert_eq!(recs[0].filter_id, "soft_portrait");
        assert_eq!(recs[0].score, 95.0);
    }

    #[test]
    fn test_high_quality_demotes_correction() {
        let mut a = analysis("landscape", "calm", &["mountain"]);
        a.technical_quality.overall = 0.9;
        let recs = recommend_filters(&a);
        assert!(recs.iter().all(|r| r.category != FilterCategory::Correction));
        assert_eq!(recs[0].filter_id, "vivid_nature");
    }

    #[test]
    fn test_dark_mood_boosts_noir() {
        let a = analysis("urban", "moody", &["building"]);
        let recs = recommend_filters(&a);
        assert_eq!(recs[0].filter_id, "noir");
        assert!(recs[0].reasons.iter().any(|r| r.contains("dark mood")));
    }

    #[test]
    fn test_improvements_drive_correction() {
        let mut a = analysis("general", "calm", &[]);
        a.suggested_improvements = vec!["Increase brightness".to_string()];
        let recs = recommend_filters(&a);
        let exposure = recs.iter().find(|r| r.filter_id == "exposure_fix").unwrap();
        assert_eq!(exposure.score, 65.0);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let a = analysis("general", "calm", &[]);
        let recs = recommend_filters(&a);
        let order: Vec<usize> = recs
            .iter()
            .filter(|r| r.score == BASE_SCORE)
            .map(|r| {
                AestheticCatalog::builtin()
                    .filters()
                    .iter()
                    .position(|f| f.id == r.filter_id)
                    .unwrap()
            })
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    fn arb_analysis() -> impl Strategy<Value = AnalysisResult> {
        let types = prop::sample::select(vec![
            "portrait", "landscape", "food", "urban", "night", "product", "general",
        ]);
        let moods = prop::sample::select(vec![
            "warm", "neutral", "calm", "dark", "energetic", "nostalgic", "odd",
        ]);
        let subjects = prop::collection::vec(
            prop::sample::select(vec!["person", "tree", "building", "neon", "food", "cat"]),
            0..4,
        );
        (types, moods, subjects, 0.0..=1.0f64, 0.0..=1.0f64).prop_map(
            |(t, m, subj, overall, confidence)| AnalysisResult {
                image_type: t.to_string(),
                confidence,
                technical_quality: TechnicalQuality {
                    overall,
                    ..Default::default()
                },
                detected_objects: subj.into_iter().map(String::from).collect(),
                mood: m.to_string(),
                suggested_improvements: vec![],
                editing_intensity: EditingIntensity::Medium,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_recommendations_sorted_and_bounded(a in arb_analysis()) {
            let recs = recommend_filters(&a);
            prop_assert!(recs.len() <= MAX_RECOMMENDATIONS);
            for r in &recs {
                prop_assert!((MIN_SCORE..=100.0).contains(&r.score));
            }
            for w in recs.windows(2) {
                prop_assert!(w[0].score >= w[1].score);
            }
            prop_assert_eq!(recs.clone(), recommend_filters(&a));
        }
    }
}
