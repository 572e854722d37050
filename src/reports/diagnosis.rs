use std::fmt;

/// Recommendations that apply to every result.
pub const COMMON_RECOMMENDATIONS: [&str; 3] = [
    "Schedule a follow-up appointment with your healthcare provider to discuss these results.",
    "Maintain a balanced diet rich in calcium and vitamin D.",
    "Engage in regular weight-bearing exercises as appropriate for your condition.",
];

/// The closed set of labels the inference service produces, plus a catch-all
/// for anything else it might return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    Normal,
    Osteopenia,
    Osteoporosis,
    Unrecognized,
}

impl Diagnosis {
    /// Every label with specific wording, in display order.
    pub const KNOWN: [Diagnosis; 3] = [
        Diagnosis::Normal,
        Diagnosis::Osteopenia,
        Diagnosis::Osteoporosis,
    ];

    /// Labels are matched exactly.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Normal" => Diagnosis::Normal,
            "Osteopenia" => Diagnosis::Osteopenia,
            "Osteoporosis" => Diagnosis::Osteoporosis,
            _ => Diagnosis::Unrecognized,
        }
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            Diagnosis::Normal => Some("Normal"),
            Diagnosis::Osteopenia => Some("Osteopenia"),
            Diagnosis::Osteoporosis => Some("Osteoporosis"),
            Diagnosis::Unrecognized => None,
        }
    }

    /// CSS class of the diagnosis card in the HTML report.
    pub fn css_class(self) -> &'static str {
        match self {
            Diagnosis::Normal => "normal",
            Diagnosis::Osteopenia => "osteopenia",
            Diagnosis::Osteoporosis => "osteoporosis",
            Diagnosis::Unrecognized => "unclassified",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Diagnosis::Normal => {
                "Your bone density appears to be within normal range. Continue with regular \
                 check-ups as recommended by your healthcare provider."
            }
            Diagnosis::Osteopenia => {
                "Your bone density is lower than normal. This condition may lead to osteoporosis \
                 if not addressed. Please consult with your healthcare provider for appropriate \
                 interventions."
            }
            Diagnosis::Osteoporosis => {
                "Your bone density is significantly reduced, indicating osteoporosis. This \
                 condition increases your risk of fractures. Please consult with your healthcare \
                 provider immediately for treatment options."
            }
            Diagnosis::Unrecognized => {
                "Analysis complete. Please consult with your healthcare provider to discuss \
                 these results."
            }
        }
    }

    fn specific_recommendations(self) -> &'static [&'static str] {
        match self {
            Diagnosis::Normal => &[
                "Continue with regular bone density screenings as recommended by your healthcare provider.",
                "Maintain a healthy lifestyle to preserve bone health.",
            ],
            Diagnosis::Osteopenia => &[
                "Discuss calcium and vitamin D supplementation with your healthcare provider.",
                "Consider lifestyle modifications to reduce risk of progression to osteoporosis.",
                "Schedule more frequent bone density screenings to monitor your condition.",
            ],
            Diagnosis::Osteoporosis => &[
                "Discuss medication options with your healthcare provider.",
                "Implement fall prevention strategies in your home and daily activities.",
                "Consider physical therapy for safe exercise recommendations.",
                "Schedule regular bone density screenings to monitor treatment effectiveness.",
            ],
            Diagnosis::Unrecognized => &[],
        }
    }

    /// The common recommendations followed by the diagnosis-specific ones.
    pub fn recommendations(self) -> Vec<&'static str> {
        COMMON_RECOMMENDATIONS
            .iter()
            .chain(self.specific_recommendations())
            .copied()
            .collect()
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().unwrap_or("Unrecognized"))
    }
}
