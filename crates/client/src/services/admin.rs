//! Admin reference data, the dashboard and account management.

use pfehub_core::academic::{
    AcademicYear, AcademicYearInput, Department, DepartmentInput, Specialization,
    SpecializationInput,
};
use pfehub_core::stats::DashboardStats;
use pfehub_core::types::DbId;
use pfehub_core::users::User;
use serde::Serialize;
use validator::Validate;

use crate::api::ApiClient;
use crate::error::ClientResult;

/// Fields common to every new account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub department_id: Option<DbId>,
    pub specialization_id: Option<DbId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    #[serde(flatten)]
    pub account: NewAccount,
    pub student_number: String,
    pub promotion: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfessor {
    #[serde(flatten)]
    pub account: NewAccount,
    pub expertise: Vec<String>,
    pub max_project_capacity: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct AdminService {
    api: ApiClient,
}

impl AdminService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn dashboard(&self) -> ClientResult<DashboardStats> {
        self.api.get("/admin/dashboard", &[]).await
    }

    // ---- departments & specializations ----

    pub async fn departments(&self) -> ClientResult<Vec<Department>> {
        self.api.get("/admin/departments", &[]).await
    }

    pub async fn create_department(&self, input: &DepartmentInput) -> ClientResult<Department> {
        input.validate()?;
        self.api.post("/admin/departments", input).await
    }

    pub async fn specializations(
        &self,
        department_id: Option<DbId>,
    ) -> ClientResult<Vec<Specialization>> {
        let query: Vec<(&str, String)> = department_id
            .map(|id| vec![("departmentId", id.to_string())])
            .unwrap_or_default();
        self.api.get("/admin/specializations", &query).await
    }

    pub async fn department_specializations(
        &self,
        department_id: DbId,
    ) -> ClientResult<Vec<Specialization>> {
        self.api
            .get(
                &format!("/admin/departments/{department_id}/specializations"),
                &[],
            )
            .await
    }

    pub async fn create_specialization(
        &self,
        input: &SpecializationInput,
    ) -> ClientResult<Specialization> {
        input.validate()?;
        self.api.post("/admin/specializations", input).await
    }

    // ---- academic years ----

    pub async fn academic_years(&self) -> ClientResult<Vec<AcademicYear>> {
        self.api.get("/admin/academic-years", &[]).await
    }

    pub async fn create_academic_year(
        &self,
        input: &AcademicYearInput,
    ) -> ClientResult<AcademicYear> {
        input.check()?;
        self.api.post("/admin/academic-years", input).await
    }

    /// `None` while no year is active.
    pub async fn current_academic_year(&self) -> ClientResult<Option<AcademicYear>> {
        self.api
            .get_optional("/admin/academic-years/current", &[])
            .await
    }

    pub async fn activate_academic_year(&self, id: DbId) -> ClientResult<AcademicYear> {
        self.api
            .put(&format!("/admin/academic-years/{id}/activate"), &())
            .await
    }

    // ---- accounts ----

    pub async fn students(&self) -> ClientResult<Vec<User>> {
        self.api.get("/users/students", &[]).await
    }

    /// Professors with their live workload.
    pub async fn professors(&self) -> ClientResult<Vec<User>> {
        self.api.get("/users/professors", &[]).await
    }

    pub async fn create_student(&self, input: &NewStudent) -> ClientResult<User> {
        self.api.post("/users/students", input).await
    }

    pub async fn create_professor(&self, input: &NewProfessor) -> ClientResult<User> {
        self.api.post("/users/professors", input).await
    }
}
