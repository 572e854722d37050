use chrono::{DateTime, Utc};

use crate::models::{Report, Scan};
use crate::reports::Diagnosis;

const STYLESHEET: &str = r#"
    :root {
      --primary: #0070f3; --primary-light: #e1f0ff;
      --success: #10b981; --success-light: #d1fae5;
      --warning: #f59e0b; --warning-light: #fef3c7;
      --danger: #ef4444; --danger-light: #fee2e2;
      --gray-50: #f9fafb; --gray-200: #e5e7eb; --gray-500: #6b7280;
      --gray-600: #4b5563; --gray-800: #1f2937; --gray-900: #111827;
    }
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
           line-height: 1.6; color: var(--gray-800); background-color: var(--gray-50); }
    .container { max-width: 900px; margin: 2rem auto; padding: 2rem; background: white;
                 border-radius: 8px; box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1); }
    .header { display: flex; justify-content: space-between; align-items: center;
              margin-bottom: 2rem; padding-bottom: 1rem; border-bottom: 1px solid var(--gray-200); }
    .logo { font-size: 1.5rem; font-weight: 700; color: var(--primary); }
    h1 { font-size: 1.75rem; color: var(--gray-900); margin-bottom: 1.5rem; }
    .report-meta { display: grid; grid-template-columns: repeat(2, 1fr); gap: 1.5rem;
                   margin-bottom: 2rem; padding: 1.5rem; background: var(--gray-50); border-radius: 8px; }
    .meta-group { display: flex; flex-direction: column; gap: 0.5rem; }
    .meta-label { font-size: 0.875rem; color: var(--gray-500); }
    .meta-value { font-weight: 600; }
    .diagnosis-card { padding: 1.5rem; border-radius: 8px; margin-bottom: 2rem; }
    .diagnosis-card.normal { background: var(--success-light); border-left: 4px solid var(--success); }
    .diagnosis-card.osteopenia { background: var(--warning-light); border-left: 4px solid var(--warning); }
    .diagnosis-card.osteoporosis { background: var(--danger-light); border-left: 4px solid var(--danger); }
    .diagnosis-card.unclassified { background: var(--gray-50); border-left: 4px solid var(--gray-500); }
    .diagnosis-title { font-size: 1.25rem; font-weight: 600; }
    .diagnosis-card.normal .diagnosis-title { color: var(--success); }
    .diagnosis-card.osteopenia .diagnosis-title { color: var(--warning); }
    .diagnosis-card.osteoporosis .diagnosis-title { color: var(--danger); }
    .probabilities { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; margin-bottom: 2rem; }
    .probability-card { padding: 1rem; border: 1px solid var(--gray-200); border-radius: 8px; text-align: center; }
    .probability-value { font-size: 1.5rem; font-weight: 700; margin-bottom: 0.5rem; }
    .probability-label { font-size: 0.875rem; color: var(--gray-600); }
    .normal-prob .probability-value { color: var(--success); }
    .osteopenia-prob .probability-value { color: var(--warning); }
    .osteoporosis-prob .probability-value { color: var(--danger); }
    .section-title { font-size: 1.25rem; font-weight: 600; margin-bottom: 1rem; }
    .summary-section, .recommendations { margin-bottom: 2rem; }
    .summary-content { padding: 1.5rem; background: var(--gray-50); border-radius: 8px; }
    .recommendation-list { list-style-type: none; }
    .recommendation-item { display: flex; gap: 0.75rem; margin-bottom: 1rem; padding: 1rem;
                           border: 1px solid var(--gray-200); border-radius: 8px; }
    .recommendation-icon { width: 24px; height: 24px; flex-shrink: 0; display: flex;
                           align-items: center; justify-content: center; border-radius: 50%;
                           background: var(--primary-light); color: var(--primary); font-weight: bold; }
    .footer { margin-top: 3rem; padding-top: 1.5rem; border-top: 1px solid var(--gray-200);
              font-size: 0.875rem; color: var(--gray-500); }
    .disclaimer { margin-top: 1rem; font-style: italic; }
    .print-button { padding: 0.5rem 1rem; background: var(--primary); color: white; border: none;
                    border-radius: 4px; cursor: pointer; font-weight: 500; }
    @media print {
      body { background: white; }
      .container { box-shadow: none; margin: 0; padding: 1rem; max-width: 100%; }
      .print-button { display: none; }
    }
"#;

/// Escapes text for interpolation into element content or quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn meta_group(label: &str, value: &str) -> String {
    format!(
        r#"<div class="meta-group"><span class="meta-label">{}</span><span class="meta-value">{}</span></div>"#,
        label,
        escape_html(value)
    )
}

/// Printable report page. `scan` adds the original file name when the
/// owning scan could be loaded.
pub fn render_html(report: &Report, scan: Option<&Scan>, generated_at: DateTime<Utc>) -> String {
    let diagnosis = Diagnosis::from_label(&report.predicted_class);

    let mut meta = vec![
        meta_group("Patient ID", &report.user_id.to_string()),
        meta_group("Report ID", &report.id.to_string()),
        meta_group("Date", &report.created_at.format("%Y-%m-%d").to_string()),
        meta_group("Time", &report.created_at.format("%H:%M:%S UTC").to_string()),
    ];
    if let Some(scan) = scan {
        meta.push(meta_group("Image", &scan.original_name));
    }

    let probabilities: String = Diagnosis::KNOWN
        .into_iter()
        .map(|known| {
            let label = known.label().unwrap_or_default();
            format!(
                r#"<div class="probability-card {}-prob"><div class="probability-value">{:.2}%</div><div class="probability-label">{}</div></div>"#,
                known.css_class(),
                report.probability(label).unwrap_or(0.0),
                label
            )
        })
        .collect();

    let recommendations: String = diagnosis
        .recommendations()
        .into_iter()
        .map(|recommendation| {
            format!(
                r#"<li class="recommendation-item"><div class="recommendation-icon">&#10003;</div><div>{}</div></li>"#,
                recommendation
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>OsteoScan Bone Health Analysis Report</title>
  <style>{stylesheet}</style>
</head>
<body>
<div class="container">
  <div class="header">
    <div class="logo">OsteoScan</div>
    <button class="print-button" onclick="window.print()">Print Report</button>
  </div>
  <h1>Bone Health Analysis Report</h1>
  <div class="report-meta">{meta}</div>
  <div class="diagnosis-card {css_class}">
    <div class="diagnosis-title">Diagnosis: {label}</div>
    <div class="diagnosis-confidence">Confidence: {confidence:.2}%</div>
  </div>
  <div class="probabilities">{probabilities}</div>
  <div class="summary-section">
    <h2 class="section-title">Summary</h2>
    <div class="summary-content"><p>{summary}</p></div>
  </div>
  <div class="recommendations">
    <h2 class="section-title">Recommendations</h2>
    <ul class="recommendation-list">{recommendations}</ul>
  </div>
  <div class="footer">
    <p>This report was generated on {generated} by the OsteoScan Bone Health Analysis System.</p>
    <p class="disclaimer">Disclaimer: This report was generated automatically by the OsteoScan Bone Health Analysis System. The results should be interpreted by a qualified healthcare professional. This tool is not intended to replace professional medical advice, diagnosis, or treatment.</p>
  </div>
</div>
</body>
</html>
"#,
        stylesheet = STYLESHEET,
        meta = meta.concat(),
        css_class = diagnosis.css_class(),
        label = escape_html(&report.predicted_class),
        confidence = report.confidence,
        probabilities = probabilities,
        summary = diagnosis.summary(),
        recommendations = recommendations,
        generated = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
