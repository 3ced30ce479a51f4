//! Text rendering of a directional response.

use std::fmt::Write as _;

use dasloc_core::ScanResult;

/// Width of the bar for the peak.
const BAR_WIDTH: usize = 50;

/// Floor of the chart relative to the peak.
const FLOOR_DB: f64 = -40.0;

/// Horizontal bar chart of the response normalised to its peak.
///
/// One row per angle, labelled with the angle and the level relative to the
/// peak. Levels below [`FLOOR_DB`] get an empty bar.
pub fn render_chart(result: &ScanResult) -> String {
    let peak = result.peak().map(|p| p.angle_deg);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} response, ±{}° (0 dB = peak)",
        result.model,
        result.angle_bound()
    );
    for p in result.normalized() {
        let fill = ((p.level_db - FLOOR_DB) / -FLOOR_DB).clamp(0.0, 1.0);
        let bar = "#".repeat((fill * BAR_WIDTH as f64).round() as usize);
        let marker = if Some(p.angle_deg) == peak { " <" } else { "" };
        let _ = writeln!(
            out,
            "{:>4}° {:>7.2} dB |{}{}",
            p.angle_deg, p.level_db, bar, marker
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dasloc_core::{PropagationModel, ScanPoint};

    fn result(levels: &[(i32, f64)]) -> ScanResult {
        ScanResult {
            model: PropagationModel::Plane,
            points: levels
                .iter()
                .map(|&(angle_deg, level_db)| ScanPoint { angle_deg, level_db })
                .collect(),
        }
    }

    #[test]
    fn test_chart_marks_peak() {
        let chart = render_chart(&result(&[(-1, -10.0), (0, 5.0), (1, -60.0)]));
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("plane response, ±1°"));
        assert!(lines[2].ends_with(" <"));
        assert!(lines[2].contains(&"#".repeat(BAR_WIDTH)));
        assert!(lines[2].contains("0.00 dB"));
        // Below the floor
        assert!(lines[3].ends_with('|'));
    }

    #[test]
    fn test_empty_result() {
        let chart = render_chart(&result(&[]));
        assert_eq!(chart.lines().count(), 1);
    }
}
