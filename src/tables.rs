//! Fixed lookup tables shared by every analysis.
//!
//! These are plain statics: built into the binary, never mutated.

use crate::diagnosis::Level;
use crate::metrics::MetricKey;

/// Placeholder substituted with the display name in diagnosis templates.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Everything attached to one level: threshold, wording, color and templates.
#[derive(Debug)]
pub struct LevelEntry {
    pub level: Level,
    /// Inclusive lower bound on the total score.
    pub min_total: u32,
    pub description: &'static str,
    pub color: &'static str,
    pub templates: [&'static str; 3],
}

/// Highest level first; classification takes the first entry whose threshold is met.
pub static LEVELS: [LevelEntry; 5] = [
    LevelEntry {
        level: Level::S,
        min_total: 450,
        description: "Professional level",
        color: "gold",
        templates: [
            "{name}'s voice is remarkably polished! It has reached a professional standard and keeps every metric in excellent balance.",
            "An astonishing voice! {name} has the ability to work as a professional.",
            "{name}'s voice is extremely refined. The overall balance is superb, truly professional-grade.",
        ],
    },
    LevelEntry {
        level: Level::A,
        min_total: 400,
        description: "Excellent",
        color: "blue",
        templates: [
            "{name}'s voice is excellent. With a little more practice it has what it takes to reach a professional level.",
            "A wonderful voice! {name}'s voice is highly polished and still has room to grow.",
            "{name}'s voice is in very good shape. Keep your current form and keep refining it.",
        ],
    },
    LevelEntry {
        level: Level::B,
        min_total: 350,
        description: "Good",
        color: "green",
        templates: [
            "{name}'s voice is in good condition. Working on a few points will bring further improvement.",
            "You have a good voice! {name}'s voice still has headroom and can improve a lot with practice.",
            "{name}'s voice has the fundamentals in place. Focused practice on specific areas can lead to a big leap.",
        ],
    },
    LevelEntry {
        level: Level::C,
        min_total: 300,
        description: "Average",
        color: "orange",
        templates: [
            "{name}'s voice is at a standard level. Solid practice of the basics will bring steady progress.",
            "{name}'s voice is currently average, but the right training can improve it considerably.",
            "{name}'s voice has room to improve. Build up from the basics without rushing and you will grow steadily.",
        ],
    },
    LevelEntry {
        level: Level::D,
        min_total: 0,
        description: "Room for improvement",
        color: "red",
        templates: [
            "{name}'s voice still has many points to work on, which means there is a lot of potential to grow. Start with basic exercises.",
            "{name}'s voice is still developing. Guidance from a professional coach will help you progress efficiently.",
            "{name}'s voice has plenty of room to improve. Practice the right way and you will certainly get better.",
        ],
    },
];

/// Display label per metric, in canonical order.
pub static METRIC_LABELS: [(MetricKey, &str); 6] = [
    (MetricKey::Volume, "Volume"),
    (MetricKey::Clarity, "Clarity"),
    (MetricKey::PitchStability, "Pitch Stability"),
    (MetricKey::Rhythm, "Rhythm & Tempo"),
    (MetricKey::Expression, "Expressiveness"),
    (MetricKey::Resonance, "Resonance"),
];

/// One improvement hint per metric, in canonical order.
pub static METRIC_HINTS: [(MetricKey, &str); 6] = [
    (MetricKey::Volume, "Practice abdominal breathing so your voice is fully supported by your breath"),
    (MetricKey::Clarity, "Improve articulation by paying attention to how you open your mouth and where your tongue sits"),
    (MetricKey::PitchStability, "Add long-tone exercises to stabilise your pitch"),
    (MetricKey::Rhythm, "Practice with a metronome to build your sense of rhythm"),
    (MetricKey::Expression, "Read aloud with emotion to develop your expressiveness"),
    (MetricKey::Resonance, "Practice vocalising with attention to your resonance cavities to enrich your tone"),
];

pub fn level_entry(level: Level) -> &'static LevelEntry {
    // LEVELS covers every variant
    LEVELS
        .iter()
        .find(|entry| entry.level == level)
        .unwrap_or(&LEVELS[LEVELS.len() - 1])
}

pub fn metric_label(key: MetricKey) -> &'static str {
    METRIC_LABELS[key.index()].1
}

pub fn metric_hint(key: MetricKey) -> &'static str {
    METRIC_HINTS[key.index()].1
}
