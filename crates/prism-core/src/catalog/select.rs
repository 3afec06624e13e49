//! Content-driven preset selection.
//!
//! An ordered decision table: the first rule whose predicate matches the
//! analysis signals picks the preset. Matching is case-insensitive and
//! subject checks are substring matches, so "Person" and "young person"
//! both count as a person subject.

use super::presets::DEFAULT_PRESET_ID;

const PERSON_SUBJECTS: &[&str] = &["person", "face", "portrait"];
const WARM_MOODS: &[&str] = &["warm", "happy", "joyful", "romantic", "cheerful"];
const DARK_MOODS: &[&str] = &["dark", "moody", "mysterious", "sad", "dramatic", "melancholic"];
const NIGHT_SUBJECTS: &[&str] = &["neon", "city lights"];
const NATURE_SUBJECTS: &[&str] = &[
    "nature", "tree", "mountain", "sky", "forest", "ocean", "flower", "beach", "sunset",
];
const URBAN_TYPES: &[&str] = &["urban", "architecture", "street", "city"];
const BUILDING_SUBJECTS: &[&str] = &["building", "skyscraper", "bridge"];
const NOSTALGIC_MOODS: &[&str] = &["nostalgic", "vintage", "retro"];
const MINIMAL_TYPES: &[&str] = &["product", "minimal", "document"];

struct Signals {
    image_type: String,
    mood: String,
    subjects: Vec<String>,
}

impl Signals {
    fn any_subject(&self, needles: &[&str]) -> bool {
        self.subjects
            .iter()
            .any(|s| needles.iter().any(|n| s.contains(n)))
    }

    fn mood_in(&self, moods: &[&str]) -> bool {
        moods.contains(&self.mood.as_str())
    }

    fn type_in(&self, types: &[&str]) -> bool {
        types.contains(&self.image_type.as_str())
    }
}

/// Pick a preset id for the given analysis signals. Total and deterministic.
pub fn select_aesthetic_for_content<S: AsRef<str>>(
    image_type: &str,
    mood: &str,
    subjects: &[S],
) -> &'static str {
    let signals = Signals {
        image_type: image_type.trim().to_lowercase(),
        mood: mood.trim().to_lowercase(),
        subjects: subjects
            .iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .collect(),
    };

    let has_person = signals.any_subject(PERSON_SUBJECTS);

    if has_person && signals.mood_in(WARM_MOODS) {
        "golden_hour"
    } else if has_person || signals.image_type == "portrait" {
        "film_portrait"
    } else if signals.mood_in(DARK_MOODS) {
        "moody_dark"
    } else if signals.image_type == "night" || signals.any_subject(NIGHT_SUBJECTS) {
        "night_neon"
    } else if signals.image_type == "landscape" || signals.any_subject(NATURE_SUBJECTS) {
        "nature_vivid"
    } else if signals.image_type == "food" || signals.any_subject(&["food"]) {
        "food_fresh"
    } else if signals.type_in(URBAN_TYPES) || signals.any_subject(BUILDING_SUBJECTS) {
        "urban_teal"
    } else if signals.mood_in(NOSTALGIC_MOODS) {
        "vintage_fade"
    } else if signals.type_in(MINIMAL_TYPES) {
        "clean_minimal"
    } else {
        DEFAULT_PRESET_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_warm_person_beats_portrait() {
        assert_eq!(
            select_aesthetic_for_content("portrait", "Happy", &["Person"]),
            "golden_hour"
        );
    }

    #[test]
    fn test_portrait_without_subjects() {
        assert_eq!(
            select_aesthetic_for_content("portrait", "neutral", NONE),
            "film_portrait"
        );
    }

    #[test]
    fn test_person_outranks_dark_mood() {
        assert_eq!(
            select_aesthetic_for_content("general", "moody", &["face"]),
            "film_portrait"
        );
    }

    #[test]
    fn test_dark_mood_outranks_landscape() {
        assert_eq!(
            select_aesthetic_for_content("landscape", "dramatic", &["mountain"]),
            "moody_dark"
        );
    }

    #[test]
    fn test_night_subjects() {
        assert_eq!(
            select_aesthetic_for_content("general", "energetic", &["Neon sign"]),
            "night_neon"
        );
        assert_eq!(
            select_aesthetic_for_content("night", "calm", NONE),
            "night_neon"
        );
    }

    #[test]
    fn test_remaining_rules_in_order() {
        assert_eq!(
            select_aesthetic_for_content("general", "calm", &["tree"]),
            "nature_vivid"
        );
        assert_eq!(
            select_aesthetic_for_content("food", "warm", NONE),
            "food_fresh"
        );
        assert_eq!(
            select_aesthetic_for_content("architecture", "neutral", NONE),
            "urban_teal"
        );
        assert_eq!(
            select_aesthetic_for_content("general", "Nostalgic", NONE),
            "vintage_fade"
        );
        assert_eq!(
            select_aesthetic_for_content("product", "neutral", NONE),
            "clean_minimal"
        );
    }

    #[test]
    fn test_fallback_is_default() {
        assert_eq!(
            select_aesthetic_for_content("", "", NONE),
            DEFAULT_PRESET_ID
        );
    }

    proptest! {
        #[test]
        fn prop_selection_is_deterministic(
            image_type in "[a-z]{0,10}",
            mood in "[a-z]{0,10}",
            subjects in proptest::collection::vec("[a-z ]{0,12}", 0..5),
        ) {
            let a = select_aesthetic_for_content(&image_type, &mood, &subjects);
            let b = select_aesthetic_for_content(&image_type, &mood, &subjects);
            prop_assert_eq!(a, b);
            prop_assert!(super::super::presets::PRESETS.iter().any(|p| p.id == a));
        }
    }
}
