//! Layout of the portrait share image.
//!
//! Only the content and geometry are computed here; rasterising and JPEG
//! encoding belong to whatever front end draws the card.

use crate::metrics::SCORE_MAX;
use crate::pipeline::AnalysisReport;
use chrono::NaiveDate;
use serde::Serialize;

pub const CARD_WIDTH: u32 = 1080;
pub const CARD_HEIGHT: u32 = 1920;
pub const JPEG_QUALITY: u8 = 95;
pub const WRAP_WIDTH: usize = 25;

/// Full width of a score bar in pixels; a score of 100 would fill it.
pub const BAR_WIDTH: u32 = 300;

const TITLE: &str = "Voice Analysis Result";
const FOOTER: &str = "© Voice Analysis AI";

#[derive(Debug, Clone, Serialize)]
pub struct ScoreBar {
    pub label: &'static str,
    pub score: u32,
    pub fill_width: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareCard {
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
    pub title: &'static str,
    pub subtitle: String,
    pub total_label: String,
    pub level_label: String,
    pub level_color: &'static str,
    pub bars: Vec<ScoreBar>,
    /// Wrapped diagnosis; empty strings are blank lines.
    pub diagnosis_lines: Vec<String>,
    pub footer: &'static str,
}

impl ShareCard {
    pub fn from_report(report: &AnalysisReport, date: NaiveDate) -> Self {
        let diagnosis = &report.diagnosis;
        let max_total = SCORE_MAX * report.metrics.iter().count() as u32;

        let bars = report
            .metrics
            .iter()
            .map(|(key, score)| ScoreBar {
                label: key.label(),
                score,
                fill_width: BAR_WIDTH * score / 100,
            })
            .collect();

        Self {
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
            jpeg_quality: JPEG_QUALITY,
            title: TITLE,
            subtitle: format!("{} - {}", report.name, date.format("%Y-%m-%d")),
            total_label: format!("Total score: {}/{}", diagnosis.total_score, max_total),
            level_label: format!("Level: {} - {}", diagnosis.level, diagnosis.level_description),
            level_color: diagnosis.level.color(),
            bars,
            diagnosis_lines: wrap_text(&diagnosis.text, WRAP_WIDTH),
            footer: FOOTER,
        }
    }
}

/// Break `text` every `width` characters; each newline ends the current line
/// and also emits one blank line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        if ch == '\n' {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                count = 0;
            }
            lines.push(String::new());
        } else {
            current.push(ch);
            count += 1;
            if count >= width {
                lines.push(std::mem::take(&mut current));
                count = 0;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
