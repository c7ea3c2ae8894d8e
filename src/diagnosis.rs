use crate::metrics::{MetricKey, MetricSet, Purpose};
use crate::tables::{self, NAME_PLACEHOLDER};
use log::debug;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores strictly below this count as a weakness and earn a hint.
pub const WEAKNESS_THRESHOLD: u32 = 60;

/// Weaknesses named in the summary clause.
const MAX_NAMED_WEAKNESSES: usize = 2;

pub const HINT_BULLET: &str = "• ";
pub const HINTS_HEADING: &str = "[Tips for improvement]";

/// Five-tier grade derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    S,
    A,
    B,
    C,
    D,
}

impl Level {
    /// Pure step function over the total score.
    pub fn from_total(total: u32) -> Level {
        tables::LEVELS
            .iter()
            .find(|entry| total >= entry.min_total)
            .map(|entry| entry.level)
            .unwrap_or(Level::D)
    }

    pub fn description(&self) -> &'static str {
        tables::level_entry(*self).description
    }

    /// Display color used by the share card.
    pub fn color(&self) -> &'static str {
        tables::level_entry(*self).color
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::S => "S",
            Level::A => "A",
            Level::B => "B",
            Level::C => "C",
            Level::D => "D",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chooses which of several templates to use.
///
/// Any `rand` generator works; [`FixedSelector`] pins the choice in tests.
pub trait TemplateSelector {
    /// Index in `0..count`. `count` is never zero.
    fn select(&mut self, count: usize) -> usize;
}

impl<R: RngCore> TemplateSelector for R {
    fn select(&mut self, count: usize) -> usize {
        self.gen_range(0..count)
    }
}

/// Always picks the same template index (wrapped into range).
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector(pub usize);

impl TemplateSelector for FixedSelector {
    fn select(&mut self, count: usize) -> usize {
        self.0 % count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Weakness {
    pub metric: MetricKey,
    pub label: &'static str,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    /// Full text: paragraphs separated by blank lines.
    pub text: String,
    pub total_score: u32,
    pub level: Level,
    pub level_description: &'static str,
    /// Every metric under the threshold, lowest first.
    pub weaknesses: Vec<Weakness>,
    /// Hint lines without the bullet, in canonical metric order.
    pub hints: Vec<&'static str>,
}

pub struct DiagnosisClassifier;

impl DiagnosisClassifier {
    pub fn classify<S: TemplateSelector>(
        metrics: &MetricSet,
        purpose: Purpose,
        name: &str,
        selector: &mut S,
    ) -> Diagnosis {
        let total_score = metrics.total();
        let level = Level::from_total(total_score);
        let entry = tables::level_entry(level);

        let index = selector.select(entry.templates.len());
        let mut text = entry.templates[index].replace(NAME_PLACEHOLDER, name);

        let weaknesses = weaknesses(metrics);
        if let Some(clause) = weakness_clause(&weaknesses) {
            text.push_str("\n\n");
            text.push_str(&clause);
        }

        let hints = hints(metrics);
        if !hints.is_empty() {
            text.push_str("\n\n");
            text.push_str(HINTS_HEADING);
            for hint in &hints {
                text.push_str("\n\n");
                text.push_str(HINT_BULLET);
                text.push_str(hint);
            }
        }

        debug!(
            "Diagnosis for {} ({}): total {}, level {}, template {}, {} weaknesses",
            name,
            purpose,
            total_score,
            level,
            index,
            weaknesses.len()
        );

        Diagnosis {
            text,
            total_score,
            level,
            level_description: entry.description,
            weaknesses,
            hints,
        }
    }
}

/// Metrics under the threshold, ascending by score. Ties keep canonical order.
pub fn weaknesses(metrics: &MetricSet) -> Vec<Weakness> {
    let mut weak: Vec<Weakness> = metrics
        .iter()
        .filter(|&(_, score)| score < WEAKNESS_THRESHOLD)
        .map(|(metric, score)| Weakness {
            metric,
            label: metric.label(),
            score,
        })
        .collect();
    weak.sort_by_key(|w| w.score);
    weak
}

fn weakness_clause(weaknesses: &[Weakness]) -> Option<String> {
    let named: Vec<String> = weaknesses
        .iter()
        .take(MAX_NAMED_WEAKNESSES)
        .map(|w| format!("\"{}\" ({} pts)", w.label, w.score))
        .collect();

    if named.is_empty() {
        return None;
    }
    Some(format!(
        "We especially recommend focusing on improving {}.",
        named.join(" and ")
    ))
}

pub fn hints(metrics: &MetricSet) -> Vec<&'static str> {
    metrics
        .iter()
        .filter(|&(_, score)| score < WEAKNESS_THRESHOLD)
        .map(|(metric, _)| tables::metric_hint(metric))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_metrics() -> MetricSet {
        MetricSet::new(40, 70, 55, 80, 90, 30)
    }

    #[test]
    fn test_level_boundaries() {
        let cases = [
            (594, Level::S),
            (450, Level::S),
            (449, Level::A),
            (400, Level::A),
            (399, Level::B),
            (350, Level::B),
            (349, Level::C),
            (300, Level::C),
            (299, Level::D),
            (60, Level::D),
            (0, Level::D),
        ];
        for (total, expected) in cases {
            assert_eq!(Level::from_total(total), expected, "total {}", total);
        }
    }

    #[test]
    fn test_level_tables() {
        assert_eq!(Level::S.color(), "gold");
        assert_eq!(Level::A.color(), "blue");
        assert_eq!(Level::B.color(), "green");
        assert_eq!(Level::C.color(), "orange");
        assert_eq!(Level::D.color(), "red");
        assert_eq!(Level::S.description(), "Professional level");
        assert_eq!(Level::D.description(), "Room for improvement");
    }

    #[test]
    fn test_weaknesses_sorted_ascending() {
        let weak = weaknesses(&sample_metrics());
        let order: Vec<(MetricKey, u32)> = weak.iter().map(|w| (w.metric, w.score)).collect();
        assert_eq!(
            order,
            [
                (MetricKey::Resonance, 30),
                (MetricKey::Volume, 40),
                (MetricKey::PitchStability, 55)
            ]
        );
    }

    #[test]
    fn test_clause_names_only_two_lowest() {
        let diagnosis =
            DiagnosisClassifier::classify(&sample_metrics(), Purpose::Speaking, "Alex", &mut FixedSelector(0));

        assert!(diagnosis
            .text
            .contains("improving \"Resonance\" (30 pts) and \"Volume\" (40 pts)."));
        assert!(!diagnosis.text.contains("\"Pitch Stability\" (55 pts)"));
    }

    #[test]
    fn test_single_weakness_clause() {
        let metrics = MetricSet::new(80, 80, 80, 59, 80, 80);
        let diagnosis = DiagnosisClassifier::classify(&metrics, Purpose::Singing, "Sam", &mut FixedSelector(1));
        assert!(diagnosis
            .text
            .contains("We especially recommend focusing on improving \"Rhythm & Tempo\" (59 pts)."));
        assert_eq!(diagnosis.hints.len(), 1);
    }

    #[test]
    fn test_hints_only_for_weak_metrics() {
        let metrics = sample_metrics();
        let expected = vec![
            tables::metric_hint(MetricKey::Volume),
            tables::metric_hint(MetricKey::PitchStability),
            tables::metric_hint(MetricKey::Resonance),
        ];
        assert_eq!(hints(&metrics), expected);

        let diagnosis = DiagnosisClassifier::classify(&metrics, Purpose::Presentation, "Alex", &mut FixedSelector(0));
        for hint in &expected {
            assert!(diagnosis.text.contains(&format!("{}{}", HINT_BULLET, hint)));
        }
        for key in [MetricKey::Clarity, MetricKey::Rhythm, MetricKey::Expression] {
            assert!(!diagnosis.text.contains(tables::metric_hint(key)));
        }
    }

    #[test]
    fn test_strong_metrics_have_no_clause_or_hints() {
        let metrics = MetricSet::new(90, 90, 90, 90, 90, 90);
        let diagnosis = DiagnosisClassifier::classify(&metrics, Purpose::Singing, "Kim", &mut FixedSelector(2));

        assert_eq!(diagnosis.level, Level::S);
        assert_eq!(diagnosis.total_score, 540);
        assert!(diagnosis.weaknesses.is_empty());
        assert!(diagnosis.hints.is_empty());
        assert_eq!(
            diagnosis.text,
            tables::level_entry(Level::S).templates[2].replace(NAME_PLACEHOLDER, "Kim")
        );
    }

    #[test]
    fn test_fixed_selector_is_reproducible() {
        let metrics = sample_metrics();
        let first = DiagnosisClassifier::classify(&metrics, Purpose::Speaking, "Alex", &mut FixedSelector(1));
        let second = DiagnosisClassifier::classify(&metrics, Purpose::Speaking, "Alex", &mut FixedSelector(1));
        assert_eq!(first.text, second.text);
        assert!(first.text.starts_with(&tables::level_entry(Level::B).templates[1].replace(NAME_PLACEHOLDER, "Alex")));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let metrics = MetricSet::new(70, 70, 70, 70, 70, 70);
        let a = DiagnosisClassifier::classify(&metrics, Purpose::Speaking, "Jo", &mut StdRng::seed_from_u64(7));
        let b = DiagnosisClassifier::classify(&metrics, Purpose::Speaking, "Jo", &mut StdRng::seed_from_u64(7));
        assert_eq!(a.text, b.text);
        assert_eq!(a.level, Level::A);
    }

    #[test]
    fn test_text_layout() {
        let diagnosis =
            DiagnosisClassifier::classify(&sample_metrics(), Purpose::Speaking, "Alex", &mut FixedSelector(0));
        let paragraphs: Vec<&str> = diagnosis.text.split("\n\n").collect();

        // template, clause, heading, three hints
        assert_eq!(paragraphs.len(), 6);
        assert_eq!(paragraphs[2], HINTS_HEADING);
        assert!(paragraphs[3..].iter().all(|p| p.starts_with(HINT_BULLET)));
    }
}
