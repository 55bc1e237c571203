//! Defense evaluation record and its input checks.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Grades are on the French 0-20 scale.
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 20.0;

/// Minimum length of the jury's written comments.
pub const MIN_EVALUATION_COMMENT_LENGTH: u64 = 20;

/// Attached once to a validated or modified defense; never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseEvaluation {
    pub presentation_quality: f64,
    pub subject_mastery: f64,
    pub question_answers: f64,
    pub time_respect: f64,
    /// Entered by the jury, not derived from the sub-scores.
    pub final_grade: f64,
    pub comments: String,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub evaluated_at: Timestamp,
    pub evaluated_by: DbId,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSubmission {
    #[validate(range(min = 0.0, max = 20.0, message = "score must be between 0 and 20"))]
    pub presentation_quality: f64,
    #[validate(range(min = 0.0, max = 20.0, message = "score must be between 0 and 20"))]
    pub subject_mastery: f64,
    #[validate(range(min = 0.0, max = 20.0, message = "score must be between 0 and 20"))]
    pub question_answers: f64,
    #[validate(range(min = 0.0, max = 20.0, message = "score must be between 0 and 20"))]
    pub time_respect: f64,
    #[validate(range(min = 0.0, max = 20.0, message = "grade must be between 0 and 20"))]
    pub final_grade: f64,
    #[validate(length(min = 20, message = "comments must be at least 20 characters"))]
    pub comments: String,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
}

impl EvaluationSubmission {
    /// Field checks, plus a NaN guard the range validator lets through.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;
        let scores = [
            ("presentation_quality", self.presentation_quality),
            ("subject_mastery", self.subject_mastery),
            ("question_answers", self.question_answers),
            ("time_respect", self.time_respect),
            ("final_grade", self.final_grade),
        ];
        for (field, value) in scores {
            if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(CoreError::field(field, "score must be between 0 and 20"));
            }
        }
        if (self.comments.trim().chars().count() as u64) < MIN_EVALUATION_COMMENT_LENGTH {
            return Err(CoreError::field(
                "comments",
                "comments must be at least 20 characters",
            ));
        }
        Ok(())
    }

    pub fn into_evaluation(self, evaluated_by: DbId, now: Timestamp) -> DefenseEvaluation {
        DefenseEvaluation {
            presentation_quality: self.presentation_quality,
            subject_mastery: self.subject_mastery,
            question_answers: self.question_answers,
            time_respect: self.time_respect,
            final_grade: self.final_grade,
            comments: self.comments.trim().to_string(),
            strengths: self.strengths.filter(|s| !s.trim().is_empty()),
            improvements: self.improvements.filter(|s| !s.trim().is_empty()),
            evaluated_at: now,
            evaluated_by,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    pub(crate) fn sample() -> EvaluationSubmission {
        EvaluationSubmission {
            presentation_quality: 16.0,
            subject_mastery: 15.5,
            question_answers: 14.0,
            time_respect: 17.0,
            final_grade: 16.0,
            comments: "Travail solide, bonne maitrise du sujet.".into(),
            strengths: Some("Architecture claire".into()),
            improvements: None,
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(sample().check().is_ok());
    }

    #[test]
    fn test_score_out_of_range() {
        let mut s = sample();
        s.question_answers = 21.0;
        assert_matches!(s.check(), Err(CoreError::InvalidFields(ref f)) if f.contains_key("question_answers"));

        let mut s = sample();
        s.final_grade = -0.5;
        assert!(s.check().is_err());
    }

    #[test]
    fn test_nan_rejected() {
        let mut s = sample();
        s.subject_mastery = f64::NAN;
        assert!(s.check().is_err());
    }

    #[test]
    fn test_short_comments_rejected() {
        let mut s = sample();
        s.comments = "Bien.".into();
        assert_matches!(s.check(), Err(CoreError::InvalidFields(ref f)) if f.contains_key("comments"));

        // Padding with spaces does not count.
        s.comments = format!("Bien.{}", " ".repeat(30));
        assert!(s.check().is_err());
    }

    #[test]
    fn test_submission_reads_jury_form_keys() {
        let body = r#"{
            "presentationQuality": 15,
            "subjectMastery": 17,
            "questionAnswers": 14,
            "timeRespect": 19,
            "finalGrade": 16,
            "comments": "Soutenance claire et bien rythmee."
        }"#;
        let s: EvaluationSubmission = serde_json::from_str(body).unwrap();
        assert_eq!(s.time_respect, 19.0);
        assert_eq!(s.subject_mastery, 17.0);
        assert!(s.check().is_ok());

        let e = s.into_evaluation(7, Utc::now());
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["timeRespect"], 19.0);
        assert_eq!(json["questionAnswers"], 14.0);
        assert!(json.get("reportScore").is_none());
    }

    #[test]
    fn test_final_grade_is_not_derived() {
        let mut s = sample();
        s.final_grade = 5.0;
        let e = s.into_evaluation(21, Utc::now());
        assert_eq!(e.final_grade, 5.0);
        assert_eq!(e.evaluated_by, 21);
    }
}
