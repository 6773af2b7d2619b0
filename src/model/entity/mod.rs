mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod course;
pub use course::{Course, CourseCreate};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonDraft};

mod question;
pub use question::{AnswerLetter, Question, QuestionCreate};

mod quiz;
pub use quiz::{QuestionBankEntry, Quiz, QuizCreate};

mod course_progress;
pub use course_progress::{CourseProgress, CourseProgressRow, PROGRESS_MAX};

mod quiz_result;
pub use quiz_result::QuizResult;

mod subscription;
pub use subscription::{Plan, Subscription};
