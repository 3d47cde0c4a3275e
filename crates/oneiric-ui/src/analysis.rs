//! Terminal rendering of a structured dream analysis.

use std::path::{Path, PathBuf};

use console::style;

use oneiric_core::DreamEmotions;
use oneiric_session::{AnalysisEntry, ImageStatus};

use crate::bars::render_meter;

pub const IMAGE_PLACEHOLDER: &str = "Генерация визуализации...";
pub const RADAR_FULL_MARK: f64 = 100.0;

const METER_WIDTH: usize = 20;

/// One axis of the emotion radar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarAxis {
    pub label: &'static str,
    pub value: f64,
    pub full_mark: f64,
}

/// The six radar axes in display order.
pub fn radar_axes(emotions: &DreamEmotions) -> [RadarAxis; 6] {
    let axis = |label: &'static str, value: f64| RadarAxis {
        label,
        value,
        full_mark: RADAR_FULL_MARK,
    };
    [
        axis("Страх", emotions.fear),
        axis("Радость", emotions.joy),
        axis("Смущение", emotions.confusion),
        axis("Покой", emotions.peace),
        axis("Тревога", emotions.urgency),
        axis("Озарение", emotions.insight),
    ]
}

/// View over one published analysis.
#[derive(Debug, Clone)]
pub struct AnalysisView<'a> {
    entry: &'a AnalysisEntry,
    image_path: Option<PathBuf>,
}

impl<'a> AnalysisView<'a> {
    pub fn new(entry: &'a AnalysisEntry) -> Self {
        Self {
            entry,
            image_path: None,
        }
    }

    /// Where the illustration was written, once saved.
    pub fn with_image_path(mut self, path: &Path) -> Self {
        self.image_path = Some(path.to_path_buf());
        self
    }

    fn image_line(&self) -> Option<String> {
        match (&self.entry.image, &self.image_path) {
            (ImageStatus::Ready(_), Some(path)) => {
                Some(format!("Визуализация: {}", path.display()))
            }
            (ImageStatus::Ready(image), None) => Some(format!(
                "Визуализация готова ({} байт)",
                image.bytes.len()
            )),
            (ImageStatus::Pending | ImageStatus::Unavailable, _) => {
                Some(style(IMAGE_PLACEHOLDER).dim().to_string())
            }
            (ImageStatus::Skipped, _) => None,
        }
    }

    pub fn render(&self, width: usize) -> String {
        let width = width.max(30);
        let analysis = &self.entry.analysis;
        let mut out = String::new();

        if let Some(line) = self.image_line() {
            out.push_str(&line);
            out.push_str("\n\n");
        }

        out.push_str(&format!("{}\n", style(&analysis.title).bold()));
        if !analysis.summary.is_empty() {
            for line in textwrap::wrap(&analysis.summary, width) {
                out.push_str(&format!("{}\n", style(line).italic()));
            }
        }

        section(&mut out, "Толкование");
        wrap_into(&mut out, &analysis.interpretation, width);

        section(&mut out, "Транскрипция");
        let quoted = format!("\"{}\"", analysis.transcription);
        for line in textwrap::wrap(&quoted, width) {
            out.push_str(&format!("{}\n", style(line).dim()));
        }

        section(&mut out, "Эмоциональный фон");
        for axis in radar_axes(&analysis.emotions) {
            out.push_str(&format!(
                "{:<9} {} {:>3}\n",
                axis.label,
                render_meter(axis.value, axis.full_mark, METER_WIDTH),
                axis.value.round() as i64
            ));
        }

        section(&mut out, "Архетипы");
        for symbol in &analysis.key_symbols {
            out.push_str(&format!("{}\n", style(&symbol.symbol).bold()));
            for line in textwrap::wrap(&symbol.meaning, width.saturating_sub(2)) {
                out.push_str(&format!("  {}\n", line));
            }
        }
        out
    }
}

fn section(out: &mut String, title: &str) {
    out.push_str(&format!("\n{}\n", style(title.to_uppercase()).cyan().bold()));
}

fn wrap_into(out: &mut String, text: &str, width: usize) {
    for paragraph in text.split('\n') {
        for line in textwrap::wrap(paragraph, width) {
            out.push_str(&line);
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneiric_core::{DreamAnalysis, GeneratedImage, KeySymbol};

    fn entry(image: ImageStatus) -> AnalysisEntry {
        AnalysisEntry {
            analysis: DreamAnalysis {
                transcription: "Я летел над морем".into(),
                title: "Полёт над морем".into(),
                summary: "Сон о свободе".into(),
                interpretation: "Море означает народы.\nПолёт означает подъём.".into(),
                key_symbols: vec![
                    KeySymbol {
                        symbol: "Море".into(),
                        meaning: "Народы".into(),
                    },
                    KeySymbol {
                        symbol: "Полёт".into(),
                        meaning: "Духовный подъём".into(),
                    },
                ],
                emotions: fear_only(),
                image_prompt: "sea".into(),
            },
            image,
        }
    }

    fn fear_only() -> DreamEmotions {
        DreamEmotions {
            fear: 10.0,
            ..Default::default()
        }
    }

    fn plain(s: &str) -> String {
        console::strip_ansi_codes(s).to_string()
    }

    #[test]
    fn test_radar_missing_axes_are_zero() {
        let axes = radar_axes(&fear_only());
        assert_eq!(axes[0].label, "Страх");
        assert_eq!(axes[0].value, 10.0);
        assert!(axes[1..].iter().all(|a| a.value == 0.0));
        assert!(axes.iter().all(|a| a.full_mark == 100.0));
    }

    #[test]
    fn test_radar_axis_order() {
        let labels: Vec<_> = radar_axes(&DreamEmotions::default())
            .iter()
            .map(|a| a.label)
            .collect();
        assert_eq!(
            labels,
            vec!["Страх", "Радость", "Смущение", "Покой", "Тревога", "Озарение"]
        );
    }

    #[test]
    fn test_pending_image_shows_placeholder() {
        let e = entry(ImageStatus::Pending);
        let out = plain(&AnalysisView::new(&e).render(60));
        assert!(out.starts_with(IMAGE_PLACEHOLDER));
        assert!(out.contains("Полёт над морем"));
        assert!(out.contains("\"Я летел над морем\""));
    }

    #[test]
    fn test_ready_image_shows_saved_path() {
        let e = entry(ImageStatus::Ready(GeneratedImage {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".into(),
        }));
        let out = plain(
            &AnalysisView::new(&e)
                .with_image_path(Path::new("/tmp/dream.png"))
                .render(60),
        );
        assert!(out.contains("/tmp/dream.png"));
        assert!(!out.contains(IMAGE_PLACEHOLDER));
    }

    #[test]
    fn test_skipped_image_has_no_line() {
        let e = entry(ImageStatus::Skipped);
        let out = plain(&AnalysisView::new(&e).render(60));
        assert!(!out.contains(IMAGE_PLACEHOLDER));
        assert!(out.starts_with("Полёт над морем"));
    }

    #[test]
    fn test_symbols_keep_order() {
        let e = entry(ImageStatus::Skipped);
        let out = plain(&AnalysisView::new(&e).render(60));
        let sea = out.find("Море\n").unwrap();
        let flight = out.find("Полёт\n").unwrap();
        assert!(sea < flight);
        assert!(out.contains("ТОЛКОВАНИЕ"));
        assert!(out.contains("АРХЕТИПЫ"));
    }

    #[test]
    fn test_emotion_meters_rendered() {
        let e = entry(ImageStatus::Skipped);
        let out = plain(&AnalysisView::new(&e).render(60));
        let fear = out.lines().find(|l| l.starts_with("Страх")).unwrap();
        assert!(fear.contains("██░░"));
        assert!(fear.trim_end().ends_with("10"));
    }
}
