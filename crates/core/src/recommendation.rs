//! Assignment recommender: ranks candidate professors for a project that
//! awaits assignment.
//!
//! Scoring is pluggable through [`ScoringStrategy`]. The output is advisory;
//! the admin may assign any professor with spare capacity.

use serde::{Deserialize, Serialize};

use crate::project::Project;
use crate::types::DbId;
use crate::users::User;

/// Number of recommendations returned when no limit is configured.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

/// What the recommender knows about the project being placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProfile {
    pub project_id: DbId,
    pub keywords: Vec<String>,
    pub department_id: Option<DbId>,
    pub specialization_id: Option<DbId>,
}

impl ProjectProfile {
    /// Department and specialization come from the project's student.
    pub fn new(project: &Project, student: &User) -> Self {
        Self {
            project_id: project.id,
            keywords: project.keywords.clone(),
            department_id: student.department_id,
            specialization_id: student.specialization_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    /// 0..=100.
    pub match_percentage: u32,
    pub expertise_overlap: Vec<String>,
    pub reason: String,
}

pub trait ScoringStrategy: Send + Sync {
    fn score(&self, project: &ProjectProfile, professor: &User) -> Score;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub project_id: DbId,
    pub professor_id: DbId,
    pub professor_name: String,
    pub professor_email: String,
    pub match_percentage: u32,
    pub current_workload: u32,
    pub max_workload: u32,
    pub expertise: Vec<String>,
    pub expertise_overlap: Vec<String>,
    pub at_capacity: bool,
    pub reason: String,
}

/// Weighted rules: same specialization, same department, keyword/expertise
/// matches and a light-load bonus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedScoring {
    pub same_specialization: u32,
    pub same_department: u32,
    pub per_keyword: u32,
    /// Ceiling applied after keyword matches, before the load bonus.
    pub expertise_cap: u32,
    pub light_load: u32,
}

impl Default for WeightedScoring {
    fn default() -> Self {
        Self {
            same_specialization: 40,
            same_department: 20,
            per_keyword: 10,
            expertise_cap: 90,
            light_load: 10,
        }
    }
}

fn same(a: Option<DbId>, b: Option<DbId>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Case-insensitive substring match in either direction.
fn tags_match(keyword: &str, tag: &str) -> bool {
    let keyword = keyword.trim().to_lowercase();
    let tag = tag.trim().to_lowercase();
    if keyword.is_empty() || tag.is_empty() {
        return false;
    }
    keyword.contains(&tag) || tag.contains(&keyword)
}

impl ScoringStrategy for WeightedScoring {
    fn score(&self, project: &ProjectProfile, professor: &User) -> Score {
        let mut score = 0u32;
        let same_specialization = same(project.specialization_id, professor.specialization_id);

        if same_specialization {
            score += self.same_specialization;
        }
        if same(project.department_id, professor.department_id) {
            score += self.same_department;
        }

        let expertise = professor.expertise();
        let mut overlap = Vec::new();
        if !project.keywords.is_empty() && !expertise.is_empty() {
            for keyword in &project.keywords {
                if let Some(tag) = expertise.iter().find(|tag| tags_match(keyword, tag)) {
                    score += self.per_keyword;
                    if !overlap.contains(tag) {
                        overlap.push(tag.clone());
                    }
                }
            }
            score = score.min(self.expertise_cap);
        }

        let (current, max) = professor.workload().unwrap_or((0, 0));
        if current < max / 2 {
            score += self.light_load;
        }
        let score = score.min(100);

        let mut reason = String::new();
        if same_specialization {
            reason.push_str("Même spécialisation. ");
        }
        if score >= 70 {
            reason.push_str("Excellente correspondance avec l'expertise. ");
        } else if score >= 50 {
            reason.push_str("Bonne correspondance. ");
        }
        reason.push_str(&format!("Charge: {current}/{max}"));

        Score {
            match_percentage: score,
            expertise_overlap: overlap,
            reason,
        }
    }
}

/// Rank active professors for `project`: highest match first, professors at
/// capacity after everyone else (and flagged), truncated to `limit`.
pub fn recommend(
    strategy: &dyn ScoringStrategy,
    project: &ProjectProfile,
    candidates: &[User],
    limit: usize,
) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = candidates
        .iter()
        .filter(|u| u.is_active)
        .filter_map(|professor| {
            let (current, max) = professor.workload()?;
            let score = strategy.score(project, professor);
            Some(Recommendation {
                project_id: project.project_id,
                professor_id: professor.id,
                professor_name: professor.full_name(),
                professor_email: professor.email.clone(),
                match_percentage: score.match_percentage,
                current_workload: current,
                max_workload: max,
                expertise: professor.expertise().to_vec(),
                expertise_overlap: score.expertise_overlap,
                at_capacity: current >= max,
                reason: score.reason,
            })
        })
        .collect();

    // Stable: ties keep candidate order.
    ranked.sort_by(|a, b| {
        a.at_capacity
            .cmp(&b.at_capacity)
            .then(b.match_percentage.cmp(&a.match_percentage))
    });
    ranked.truncate(limit);
    ranked
}
