//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use recallkit_core::report::ParticipantReport;

use crate::overview::{ExperimentOverview, StudyOverview};
use crate::summary::{pct, signed_pct};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a study overview.
pub fn generate_html(overview: &StudyOverview) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>recallkit study report</title>\n");
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>recallkit study report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} experiments | {} participants | {} reports | {}</p>\n",
        overview.experiments.len(),
        overview.participants.len(),
        overview.report_count(),
        overview.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Experiment</th><th>Participants</th><th>Mean accuracy</th><th>Mean effect</th><th>Mean capacity</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for exp in overview.experiments.values() {
        html.push_str(&format!(
            "<tr><td>{}. {}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            exp.experiment.number(),
            html_escape(&exp.title),
            exp.participants.len(),
            pct(exp.mean_accuracy),
            exp.mean_accuracy_effect
                .map(signed_pct)
                .unwrap_or_else(|| "-".into()),
            exp.mean_capacity
                .map(|c| format!("{c:.1}"))
                .unwrap_or_else(|| "-".into()),
        ));
    }
    html.push_str("</tbody></table>\n");

    if !overview.experiments.is_empty() {
        html.push_str(&generate_bar_chart(overview.experiments.values()));
    }
    html.push_str("</section>\n");

    // Per-experiment condition means and participant rows
    for exp in overview.experiments.values() {
        html.push_str(&experiment_section(
            exp,
            overview.reports(exp.experiment),
        ));
    }

    // Completion matrix
    html.push_str("<section class=\"completion\">\n");
    html.push_str("<h2>Completion</h2>\n");
    html.push_str("<table>\n<thead><tr><th>Participant</th>");
    for kind in overview.experiments.keys() {
        html.push_str(&format!("<th>Exp {}</th>", kind.number()));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for (name, row) in overview.completion_matrix() {
        html.push_str(&format!("<tr><td>{}</td>", html_escape(name)));
        for done in row {
            if done {
                html.push_str("<td class=\"pass\">&#10003;</td>");
            } else {
                html.push_str("<td class=\"fail\">&#10007;</td>");
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(overview)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

fn experiment_section(exp: &ExperimentOverview, reports: &[ParticipantReport]) -> String {
    let table_id = format!("exp{}", exp.experiment.number());
    let mut html = format!(
        "<section class=\"results\">\n<h2>Experiment {}: {}</h2>\n",
        exp.experiment.number(),
        html_escape(&exp.title)
    );

    if !exp.condition_means.is_empty() {
        html.push_str("<p class=\"meta\">");
        let means: Vec<String> = exp
            .condition_means
            .iter()
            .map(|(c, m)| format!("{}: {}", html_escape(c.as_str()), pct(*m)))
            .collect();
        html.push_str(&means.join(" | "));
        html.push_str("</p>\n");
    }

    html.push_str(&format!(
        "<table class=\"results-table\" id=\"{table_id}\">\n<thead><tr>\
<th onclick=\"sortTable('{table_id}', 0)\">Participant</th>\
<th onclick=\"sortTable('{table_id}', 1)\">Trials</th>\
<th onclick=\"sortTable('{table_id}', 2)\">Accuracy</th>\
<th onclick=\"sortTable('{table_id}', 3)\">Effect</th>\
<th onclick=\"sortTable('{table_id}', 4)\">Span</th></tr></thead>\n<tbody>\n"
    ));
    for r in reports {
        let class = if r.summary.overall_accuracy >= 0.5 {
            "pass"
        } else {
            "fail"
        };
        let effect = r
            .summary
            .effect
            .as_ref()
            .map(|e| signed_pct(e.accuracy_effect))
            .unwrap_or_else(|| "-".into());
        let span = r
            .summary
            .mean_span
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "-".into());
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"{class}\">{}</td><td>{effect}</td><td>{span}</td></tr>\n",
            html_escape(&r.participant),
            r.summary.trial_count,
            pct(r.summary.overall_accuracy),
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(overview: &StudyOverview, path: &Path) -> Result<()> {
    let html = generate_html(overview);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn generate_bar_chart<'a>(experiments: impl Iterator<Item = &'a ExperimentOverview>) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 240;

    let rows: Vec<(String, f64)> = experiments
        .map(|e| (format!("{}. {}", e.experiment.number(), e.title), e.mean_accuracy))
        .collect();

    let total_height = rows.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (label, score)) in rows.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (score.clamp(0.0, 1.0) * max_width as f64) as usize;

        let color = if *score >= 0.8 {
            "#22c55e"
        } else if *score >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            pct(*score)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(id, col) {
  const table = document.getElementById(id);
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overview::tests::study;

    #[test]
    fn html_report_contains_required_elements() {
        let overview = StudyOverview::build(study());
        let html = generate_html(&overview);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Experiment 8: Finger Tapping"));
        assert!(html.contains("<svg"));
        assert!(html.contains("id=\"exp6\""));
        assert!(html.contains(">Bo<"));
    }

    #[test]
    fn html_escapes_participant_names() {
        let mut reports = study();
        if let Some(group) = reports.get_mut(&recallkit_core::model::ExperimentKind::FingerTapping) {
            group[0].participant = "<script>".into();
        }
        let html = generate_html(&StudyOverview::build(reports));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<td><script>"));
    }

    #[test]
    fn html_report_write_to_file() {
        let overview = StudyOverview::build(study());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&overview, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
