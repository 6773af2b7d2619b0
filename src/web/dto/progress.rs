use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct EnrollBody {
    pub course_id: Uuid,
    /// Admins may enrol someone else
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ProgressBody {
    pub course_id: Uuid,
    pub progress: i64,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CurrentCourseBody {
    pub course_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CurrentCourseResponse {
    pub course_id: Uuid,
}
