use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{CourseCreate, LessonDraft};
use crate::web::dto::quiz::QuestionBody;

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateCourseBody {
    pub name: String,
    pub description: String,
    pub estimated_hours: i64,
    #[serde(default)]
    pub certificate_text: String,
    pub quiz_id: Option<Uuid>,
    #[serde(default)]
    pub lessons: Vec<LessonDraft>,
    #[serde(default)]
    pub questions: Vec<QuestionBody>,
}

impl CreateCourseBody {
    pub fn course(&self) -> CourseCreate {
        CourseCreate {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            estimated_hours: self.estimated_hours,
            certificate_text: self.certificate_text.clone(),
            quiz_id: self.quiz_id,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct VideoUrlBody {
    pub class_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct VideoUrlResponse {
    pub class_id: Uuid,
    pub video_url: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CertificateQuery {
    pub course_id: Uuid,
}
