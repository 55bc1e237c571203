//! Defense jury composition.
//!
//! The supervising professor presides every jury and is never stored with
//! the defense. Proposals carry exactly two examiners.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{CoreError, FieldErrors};
use crate::types::{DbId, IdSequence};

/// Number of examiners a proposal must name, besides the president.
pub const REQUIRED_EXAMINERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JuryRole {
    #[serde(rename = "PRESIDENT")]
    President,
    #[serde(rename = "EXAMINATEUR")]
    Examiner,
}

impl JuryRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            JuryRole::President => "PRESIDENT",
            JuryRole::Examiner => "EXAMINATEUR",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "PRESIDENT" => Ok(JuryRole::President),
            "EXAMINATEUR" => Ok(JuryRole::Examiner),
            other => Err(CoreError::Validation(format!("Invalid jury role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JuryMember {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub role: JuryRole,
    pub professor_id: Option<DbId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JuryMemberInput {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[serde(default = "examiner")]
    pub role: JuryRole,
    #[serde(default)]
    pub professor_id: Option<DbId>,
}

fn examiner() -> JuryRole {
    JuryRole::Examiner
}

impl JuryMemberInput {
    pub fn examiner(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            role: JuryRole::Examiner,
            professor_id: None,
        }
    }
}

/// Check a submitted jury: exactly two members, all examiners, each with a
/// non-blank name and a valid email.
pub fn validate_examiners(members: &[JuryMemberInput]) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();

    if members.len() != REQUIRED_EXAMINERS {
        errors.entry("jury_members".into()).or_default().push(format!(
            "exactly {REQUIRED_EXAMINERS} examiners are required, got {}",
            members.len()
        ));
    }

    for (index, member) in members.iter().enumerate() {
        if let Err(e) = member.validate() {
            if let CoreError::InvalidFields(fields) = CoreError::from(e) {
                for (field, messages) in fields {
                    errors
                        .entry(format!("jury_members[{index}].{field}"))
                        .or_default()
                        .extend(messages);
                }
            }
        }
        // Empty names are already reported by the length check.
        if !member.name.is_empty() && member.name.trim().is_empty() {
            errors
                .entry(format!("jury_members[{index}].name"))
                .or_default()
                .push("name is required".into());
        }
        if member.role != JuryRole::Examiner {
            errors
                .entry(format!("jury_members[{index}].role"))
                .or_default()
                .push("the supervising professor presides; submit examiners only".into());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidFields(errors))
    }
}

/// Materialize validated inputs into stored members, drawing ids from `ids`.
pub fn build_members(members: &[JuryMemberInput], ids: &mut IdSequence) -> Vec<JuryMember> {
    members
        .iter()
        .map(|m| JuryMember {
            id: ids.next_id(),
            name: m.name.trim().to_string(),
            email: Some(m.email.trim().to_string()),
            role: m.role,
            professor_id: m.professor_id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn pair() -> Vec<JuryMemberInput> {
        vec![
            JuryMemberInput::examiner("Dr. Amrani", "amrani@univ.ma"),
            JuryMemberInput::examiner("Dr. Bennani", "bennani@univ.ma"),
        ]
    }

    #[test]
    fn two_examiners_accepted() {
        assert!(validate_examiners(&pair()).is_ok());
    }

    #[test]
    fn wrong_count_rejected() {
        let mut members = pair();
        members.pop();
        let err = validate_examiners(&members).unwrap_err();
        assert_matches!(err, CoreError::InvalidFields(ref f) if f.contains_key("jury_members"));

        let mut members = pair();
        members.push(JuryMemberInput::examiner("Dr. Chraibi", "c@univ.ma"));
        assert!(validate_examiners(&members).is_err());
    }

    #[test]
    fn missing_email_reported_per_member() {
        let mut members = pair();
        members[1].email = String::new();
        let err = validate_examiners(&members).unwrap_err();
        let CoreError::InvalidFields(fields) = err else {
            panic!("expected field errors");
        };
        assert!(fields.contains_key("jury_members[1].email"));
        assert!(!fields.contains_key("jury_members[0].email"));
    }

    #[test]
    fn blank_name_rejected() {
        let mut members = pair();
        members[0].name = "   ".into();
        let err = validate_examiners(&members).unwrap_err();
        assert!(err.to_string().contains("jury_members[0].name"));
    }

    #[test]
    fn president_cannot_be_submitted() {
        let mut members = pair();
        members[0].role = JuryRole::President;
        assert!(validate_examiners(&members).is_err());
    }

    #[test]
    fn built_members_get_fresh_ids() {
        let mut ids = IdSequence::new();
        let built = build_members(&pair(), &mut ids);
        assert_eq!(built.len(), 2);
        assert_ne!(built[0].id, built[1].id);
        assert_eq!(built[0].email.as_deref(), Some("amrani@univ.ma"));
    }

    #[test]
    fn role_defaults_to_examiner_on_the_wire() {
        let input: JuryMemberInput =
            serde_json::from_str(r#"{"name":"Dr. X","email":"x@univ.ma"}"#).unwrap();
        assert_eq!(input.role, JuryRole::Examiner);
    }
}
