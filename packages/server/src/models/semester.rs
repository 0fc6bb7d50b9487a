use common::Term;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSemesterRequest {
    #[schema(example = 2024)]
    pub year: i32,
    pub term: Term,
}

pub fn validate_create_semester(req: &CreateSemesterRequest) -> Result<(), AppError> {
    if !(2000..=2200).contains(&req.year) {
        return Err(AppError::Validation(
            "Year must be between 2000 and 2200".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SemesterResponse {
    pub id: i32,
    pub year: i32,
    pub term: Term,
}

impl From<crate::entity::semester::Model> for SemesterResponse {
    fn from(m: crate::entity::semester::Model) -> Self {
        Self {
            id: m.id,
            year: m.year,
            term: m.term,
        }
    }
}
