//! Marketing title and description generation.
//!
//! Text is assembled from fixed vocabularies keyed by a confidence band. All
//! randomness comes from an injected [`StdRng`], so a fixed seed reproduces a
//! run's copy exactly.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 150;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Vocabulary tier picked from the classification confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    /// ≥ 0.9
    Exquisite,
    /// ≥ 0.7
    Stylish,
    /// ≥ 0.5
    Classic,
    /// Everything below, including NaN.
    Unique,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.9 {
            Self::Exquisite
        } else if confidence >= 0.7 {
            Self::Stylish
        } else if confidence >= 0.5 {
            Self::Classic
        } else {
            Self::Unique
        }
    }

    fn adjectives(self) -> &'static [&'static str] {
        match self {
            Self::Exquisite => &[
                "Exquisite",
                "Magnificent",
                "Breathtaking",
                "Gorgeous",
                "Stunning",
                "Elegant",
                "Beautiful",
            ],
            Self::Stylish => &[
                "Stylish",
                "Fashionable",
                "Chic",
                "Modern",
                "Sophisticated",
                "Trendy",
                "Contemporary",
            ],
            Self::Classic => &[
                "Classic",
                "Timeless",
                "Versatile",
                "Refined",
                "Elegant",
                "Traditional",
                "Sophisticated",
            ],
            Self::Unique => &[
                "Unique",
                "Distinctive",
                "Special",
                "Notable",
                "Remarkable",
                "Unusual",
                "Extraordinary",
            ],
        }
    }

    fn style_phrases(self) -> &'static [&'static str] {
        match self {
            Self::Exquisite => &[
                "exquisitely crafted",
                "masterfully designed",
                "breathtakingly beautiful",
                "artistically rendered",
                "professionally tailored",
                "luxuriously styled",
            ],
            Self::Stylish => &[
                "beautifully designed",
                "elegantly crafted",
                "sophisticatedly styled",
                "professionally made",
                "artistically created",
                "carefully tailored",
            ],
            Self::Classic => &[
                "well-crafted",
                "carefully designed",
                "thoughtfully styled",
                "skillfully made",
                "attractively created",
                "nicely tailored",
            ],
            Self::Unique => &[
                "uniquely styled",
                "distinctively crafted",
                "specially designed",
                "unusually made",
                "notably created",
                "remarkably tailored",
            ],
        }
    }

    fn appeal_phrases(self) -> &'static [&'static str] {
        match self {
            Self::Exquisite => &[
                "A true masterpiece that celebrates rich heritage.",
                "This piece showcases the finest in ethnic fashion.",
                "A stunning example of contemporary elegance.",
            ],
            Self::Stylish => &[
                "Perfectly balances traditional charm with modern sophistication.",
                "A stunning example of contemporary Indian fashion.",
                "Offers the perfect blend of cultural heritage and style.",
            ],
            Self::Classic => &[
                "Captures the essence of traditional Indian fashion beautifully.",
                "Showcases the timeless appeal of ethnic wear.",
                "Offers a wonderful introduction to authentic fashion.",
            ],
            Self::Unique => &[
                "Offers a distinctive take on traditional fashion.",
                "Stands out in the world of ethnic wear.",
                "Brings a fresh perspective to classic fashion.",
            ],
        }
    }
}

/// Title shapes: adjective before the category, or after a dash.
#[derive(Clone, Copy)]
enum TitleTemplate {
    /// `{adjective} {category}[ {suffix}]`
    Leading(&'static str),
    /// `{category} - {adjective} {suffix}`
    Trailing(&'static str),
}

impl TitleTemplate {
    fn render(self, adjective: &str, category: &str) -> String {
        match self {
            Self::Leading("") => format!("{adjective} {category}"),
            Self::Leading(suffix) => format!("{adjective} {category} {suffix}"),
            Self::Trailing(suffix) => format!("{category} - {adjective} {suffix}"),
        }
    }
}

const TITLE_TEMPLATES: [TitleTemplate; 15] = [
    TitleTemplate::Leading(""),
    TitleTemplate::Trailing("Design"),
    TitleTemplate::Leading("Collection"),
    TitleTemplate::Trailing("Style"),
    TitleTemplate::Leading("Ensemble"),
    TitleTemplate::Trailing("Piece"),
    TitleTemplate::Leading("Attire"),
    TitleTemplate::Trailing("Look"),
    TitleTemplate::Leading("Outfit"),
    TitleTemplate::Trailing("Fashion"),
    TitleTemplate::Leading("Wear"),
    TitleTemplate::Trailing("Choice"),
    TitleTemplate::Leading("Selection"),
    TitleTemplate::Trailing("Creation"),
    TitleTemplate::Leading("Masterpiece"),
];

/// Fallback descriptions, tried in order when the main one is too long.
const SHORT_DESCRIPTIONS: [(&str, &str); 5] = [
    ("Beautiful", "with elegant design."),
    ("Stylish", "for modern women."),
    ("Elegant", "with traditional charm."),
    ("Sophisticated", "for special occasions."),
    ("Chic", "with contemporary appeal."),
];

/// A generated title and description pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub description: String,
}

/// Template-driven copy generator.
pub struct ContentGenerator {
    rng: StdRng,
}

impl ContentGenerator {
    /// Generator with a fixed seed, or OS entropy when `seed` is `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(rng)
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Title then description, drawn from the same random stream.
    pub fn generate(&mut self, broad_category: &str, confidence: f32) -> GeneratedContent {
        let title = self.title(broad_category, confidence);
        let description = self.description(broad_category, confidence);
        GeneratedContent { title, description }
    }

    /// A title of at most [`MAX_TITLE_CHARS`] characters.
    pub fn title(&mut self, broad_category: &str, confidence: f32) -> String {
        let category = readable_category(broad_category);
        let band = ConfidenceBand::from_confidence(confidence);
        let adjective = band
            .adjectives()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default();

        let mut templates = TITLE_TEMPLATES;
        templates.shuffle(&mut self.rng);

        templates
            .iter()
            .map(|t| t.render(adjective, &category))
            .find(|title| title.chars().count() <= MAX_TITLE_CHARS)
            .unwrap_or_else(|| truncate_chars(&category, MAX_TITLE_CHARS))
    }

    /// A description of at most [`MAX_DESCRIPTION_CHARS`] characters.
    pub fn description(&mut self, broad_category: &str, confidence: f32) -> String {
        let category = readable_category(broad_category).to_lowercase();
        let band = ConfidenceBand::from_confidence(confidence);
        let style = band
            .style_phrases()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default();
        let appeal = band
            .appeal_phrases()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default();

        let description = format!("A {style} {category}. {appeal}");
        if description.chars().count() <= MAX_DESCRIPTION_CHARS {
            return description;
        }

        SHORT_DESCRIPTIONS
            .iter()
            .map(|(lead, tail)| format!("{lead} {category} {tail}"))
            .find(|d| d.chars().count() <= MAX_DESCRIPTION_CHARS)
            .unwrap_or_else(|| truncate_chars(&format!("Beautiful {category}."), MAX_DESCRIPTION_CHARS))
    }
}

/// `"salwar_kameez"` → `"Salwar Kameez"`.
pub fn readable_category(broad_category: &str) -> String {
    title_case(&broad_category.replace('_', " "))
}

/// Upper-case the first letter of every alphabetic run and lower-case the rest.
///
/// A run restarts after any non-letter, so `"indo-western"` becomes
/// `"Indo-Western"` and `"a+b"` becomes `"A+B"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAND_SAMPLES: [f32; 4] = [0.95, 0.75, 0.55, 0.1];

    #[test]
    fn test_band_boundaries() {
        assert_eq!(ConfidenceBand::from_confidence(0.9), ConfidenceBand::Exquisite);
        assert_eq!(ConfidenceBand::from_confidence(0.8999), ConfidenceBand::Stylish);
        assert_eq!(ConfidenceBand::from_confidence(0.7), ConfidenceBand::Stylish);
        assert_eq!(ConfidenceBand::from_confidence(0.5), ConfidenceBand::Classic);
        assert_eq!(ConfidenceBand::from_confidence(0.49), ConfidenceBand::Unique);
        assert_eq!(ConfidenceBand::from_confidence(f32::NAN), ConfidenceBand::Unique);
    }

    #[test]
    fn test_vocabulary_sizes() {
        for c in BAND_SAMPLES {
            let band = ConfidenceBand::from_confidence(c);
            assert_eq!(band.adjectives().len(), 7);
            assert_eq!(band.style_phrases().len(), 6);
            assert_eq!(band.appeal_phrases().len(), 3);
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("salwar kameez"), "Salwar Kameez");
        assert_eq!(title_case("LEHENGA"), "Lehenga");
        assert_eq!(title_case("indo-western gown"), "Indo-Western Gown");
        assert_eq!(title_case("saree (generic)"), "Saree (Generic)");
        assert_eq!(readable_category("Salwar_Kameez"), "Salwar Kameez");
    }

    #[test]
    fn test_lengths_bounded_for_every_band() {
        let mut generator = ContentGenerator::new(Some(7));
        for category in ["Lehenga", "Salwar_Kameez", "Others", "Bralette_+_Lehenga_Set"] {
            for c in BAND_SAMPLES {
                for _ in 0..25 {
                    let content = generator.generate(category, c);
                    assert!(content.title.chars().count() <= MAX_TITLE_CHARS);
                    assert!(content.description.chars().count() <= MAX_DESCRIPTION_CHARS);
                    assert!(!content.title.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_title_uses_band_vocabulary() {
        let mut generator = ContentGenerator::new(Some(1));
        for _ in 0..20 {
            let title = generator.title("Saree", 0.95);
            assert!(title.contains("Saree"));
            assert!(ConfidenceBand::Exquisite
                .adjectives()
                .iter()
                .any(|a| title.contains(a)));
        }
    }

    #[test]
    fn test_description_shape() {
        let mut generator = ContentGenerator::new(Some(3));
        let description = generator.description("Salwar_Kameez", 0.6);
        assert!(description.starts_with("A "));
        assert!(description.contains(" salwar kameez. "));
        assert!(ConfidenceBand::Classic
            .appeal_phrases()
            .iter()
            .any(|p| description.ends_with(p)));
    }

    #[test]
    fn test_same_seed_same_output() {
        let mut a = ContentGenerator::new(Some(42));
        let mut b = ContentGenerator::new(Some(42));
        for c in BAND_SAMPLES {
            assert_eq!(a.generate("Kurti", c), b.generate("Kurti", c));
        }
    }

    #[test]
    fn test_oversized_category_falls_back() {
        let long = "x".repeat(400);
        let mut generator = ContentGenerator::new(Some(9));
        let content = generator.generate(&long, 0.95);

        let expected_title: String = title_case(&long).chars().take(MAX_TITLE_CHARS).collect();
        assert_eq!(content.title, expected_title);
        assert_eq!(content.description.chars().count(), MAX_DESCRIPTION_CHARS);
        assert!(content.description.starts_with("Beautiful xxx"));
    }

    #[test]
    fn test_short_description_used_when_main_too_long() {
        // Long enough to overflow the main template, short enough for the first fallback.
        let category = "y".repeat(160);
        let mut generator = ContentGenerator::new(Some(5));
        let description = generator.description(&category, 0.2);
        assert_eq!(description, format!("Beautiful {category} with elegant design."));
    }

    #[test]
    fn test_lengths_counted_in_chars() {
        // 100 two-byte characters: 200 bytes but fits comfortably as a title.
        let category = "é".repeat(100);
        let mut generator = ContentGenerator::new(Some(11));
        let title = generator.title(&category, 0.95);
        assert!(title.chars().count() <= MAX_TITLE_CHARS);
        assert!(title.contains(&title_case(&category)));
    }
}
