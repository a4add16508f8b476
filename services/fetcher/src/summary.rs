//! Human-readable and JSON summaries of retrieved grids.

use chrono::{DateTime, Utc};
use retrieval::{AnalysisDataset, ExtendedRange, NdfdRetrieval, NormalizedGrid, RtmaRetrieval};
use serde::Serialize;

/// One line of output: a variable of a dataset, or an unavailable slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSummary {
    pub label: String,
    pub time: Option<DateTime<Utc>>,
    /// (ny, nx); `None` when the dataset is unavailable
    pub shape: Option<(usize, usize)>,
    pub steps: usize,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl GridSummary {
    fn unavailable(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            time: None,
            shape: None,
            steps: 0,
            min: None,
            max: None,
        }
    }
}

pub fn rtma_summary(retrieval: &RtmaRetrieval) -> Vec<GridSummary> {
    let mut lines = analysis_lines("current", &retrieval.current, retrieval.current_time);
    lines.extend(analysis_lines("prior", &retrieval.prior, retrieval.prior_time));
    lines
}

fn analysis_lines(member: &str, dataset: &AnalysisDataset, time: DateTime<Utc>) -> Vec<GridSummary> {
    dataset
        .variables
        .iter()
        .map(|(name, values)| {
            let range = finite_range(values);
            GridSummary {
                label: format!("{} {}", member, name),
                time: Some(time),
                shape: Some(dataset.shape()),
                steps: 1,
                min: range.map(|r| r.0),
                max: range.map(|r| r.1),
            }
        })
        .collect()
}

pub fn ndfd_summary(retrieval: &NdfdRetrieval) -> Vec<GridSummary> {
    let mut lines = vec![grid_line("short", &retrieval.short)];
    lines.push(match &retrieval.extended {
        ExtendedRange::Available(grid) => grid_line("extended", grid),
        ExtendedRange::Unavailable => GridSummary::unavailable("extended"),
    });
    lines
}

fn grid_line(label: &str, grid: &NormalizedGrid) -> GridSummary {
    let range = grid.value_range();
    GridSummary {
        label: label.to_string(),
        time: grid.valid_times().first().copied(),
        shape: Some(grid.shape()),
        steps: grid.len(),
        min: range.map(|r| r.0),
        max: range.map(|r| r.1),
    }
}

/// Render summaries as aligned text, one line each.
pub fn render_text(lines: &[GridSummary]) -> String {
    let width = lines.iter().map(|l| l.label.len()).max().unwrap_or(0);

    let mut out = String::new();
    for line in lines {
        let detail = match line.shape {
            None => "unavailable".to_string(),
            Some((ny, nx)) => {
                let time = line
                    .time
                    .map(|t| t.format("%Y-%m-%dT%H:%MZ").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let range = match (line.min, line.max) {
                    (Some(min), Some(max)) => format!("{:.2} .. {:.2}", min, max),
                    _ => "all missing".to_string(),
                };
                format!(
                    "{}  {}x{}  steps={}  range={}",
                    time, ny, nx, line.steps, range
                )
            }
        };
        out.push_str(&format!("{:<width$}  {}\n", line.label, detail, width = width));
    }
    out
}

fn finite_range(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_text() {
        let time = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let lines = vec![
            GridSummary {
                label: "short".to_string(),
                time: Some(time),
                shape: Some((4, 6)),
                steps: 2,
                min: Some(12.5),
                max: Some(98.0),
            },
            GridSummary::unavailable("extended"),
        ];

        assert_eq!(
            render_text(&lines),
            "short     2024-01-15T09:00Z  4x6  steps=2  range=12.50 .. 98.00\n\
             extended  unavailable\n"
        );
    }

    #[test]
    fn test_finite_range_skips_missing() {
        assert_eq!(finite_range(&[f32::NAN, 3.0, -1.0]), Some((-1.0, 3.0)));
        assert_eq!(finite_range(&[f32::NAN]), None);
    }
}
