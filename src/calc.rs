use serde::Serialize;

use crate::store::Assessment;

/// Letter bands evaluated highest cutoff first; first match wins.
const GRADE_BANDS: [(f64, &str); 7] = [
    (80.0, "A"),
    (75.0, "B+"),
    (70.0, "B"),
    (65.0, "C+"),
    (60.0, "C"),
    (55.0, "D+"),
    (50.0, "D"),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinalGrade {
    pub grade: &'static str,
    pub score: f64,
}

/// Final mark over the whole collection: each assessment contributes
/// `score * weightage / 100`, summed as-is. Weightages are not required to
/// sum to 100, so the result is a raw weighted sum, not a normalized average.
pub fn final_grade(assessments: &[Assessment]) -> FinalGrade {
    let score: f64 = assessments
        .iter()
        .map(|a| a.score * (a.weightage / 100.0))
        .sum();
    FinalGrade {
        grade: letter_for(score),
        score,
    }
}

fn letter_for(score: f64) -> &'static str {
    for (cutoff, letter) in GRADE_BANDS {
        if score >= cutoff {
            return letter;
        }
    }
    "F"
}
