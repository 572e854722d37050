use crate::models::Report;
use crate::reports::Diagnosis;

pub fn render_text(report: &Report) -> String {
    let diagnosis = Diagnosis::from_label(&report.predicted_class);

    format!(
        "BONE HEALTH ANALYSIS REPORT
===========================

Date: {date}
Time: {time}

DIAGNOSIS: {label}
CONFIDENCE: {confidence:.2}%

SUMMARY:
{summary}

This report was generated automatically by the Bone Health Analysis System.
Please consult with a healthcare professional for proper medical advice.
",
        date = report.created_at.format("%Y-%m-%d"),
        time = report.created_at.format("%H:%M:%S UTC"),
        label = report.predicted_class,
        confidence = report.confidence,
        summary = diagnosis.summary(),
    )
}

pub fn attachment_file_name(report: &Report) -> String {
    format!("report-{}.txt", report.id)
}
