use std::io::{Error as IoError, ErrorKind};

use clap::{Parser, Subcommand};
use tina::Config;
use tina::model::entity::{
    AnswerLetter, Course, CourseCreate, Lesson, LessonCreate, Question, QuestionCreate, UserEntity,
    UserEntityCreateUpdate,
};
use tina::model::{CrudRepository, DbConnection, ModelManager};
use tina::utils::cpf;
use tina::web::{AuthenticatedUser, UserRole};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the Tina database", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage bank questions
    Question {
        #[command(subcommand)]
        action: QuestionCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        cpf: Option<String>,
        #[arg(long, default_value_t = false)]
        admin: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = 0)]
        hours: i64,
        #[arg(long, default_value = "")]
        certificate_text: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Course name to attach the lesson to
        #[arg(long)]
        course_name: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        video_url: String,
        #[arg(long)]
        order_index: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum QuestionCommands {
    Add {
        /// Course name, leave out for a course-less bank question
        #[arg(long)]
        course_name: Option<String>,
        #[arg(long)]
        statement: String,
        #[arg(long)]
        a: String,
        #[arg(long)]
        b: String,
        #[arg(long)]
        c: String,
        #[arg(long)]
        d: String,
        #[arg(long)]
        e: Option<String>,
        /// Letter of the correct option
        #[arg(long)]
        answer: String,
    },
}

fn invalid_input(message: String) -> tina::error::AppError {
    IoError::new(ErrorKind::InvalidInput, message).into()
}

async fn course_by_name(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    name: &str,
) -> tina::error::AppResult<Course> {
    Course::find_by_name(mm, actor, name)
        .await?
        .ok_or_else(|| invalid_input(format!("no course named {name:?}")))
}

#[tokio::main]
async fn main() -> tina::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_uri = match std::env::var("DATABASE_URL") {
        Ok(uri) => uri,
        Err(_) => Config::get_or_init(false).await.app().database_uri().to_string(),
    };
    let mm = ModelManager::new(DbConnection::connect(&database_uri)?);
    mm.migrate().await?;
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                email,
                password,
                full_name,
                cpf: raw_cpf,
                admin,
            } => {
                let cpf = match raw_cpf {
                    Some(raw) if cpf::validate(&raw) => Some(cpf::normalize(&raw)),
                    Some(raw) => return Err(invalid_input(format!("invalid CPF {raw:?}"))),
                    None => None,
                };
                let role = if admin { UserRole::Admin } else { UserRole::User };
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        email: email.trim().to_lowercase(),
                        cpf,
                        password_hash: Some(tina::auth::hash_password(&password)?),
                        full_name,
                        birth_date: None,
                        tina_client: false,
                        google_linked: false,
                        role: role.to_string(),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add {
                name,
                description,
                hours,
                certificate_text,
            } => {
                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        name,
                        description,
                        estimated_hours: hours,
                        certificate_text,
                        quiz_id: None,
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add {
                course_name,
                title,
                description,
                video_url,
                order_index,
            } => {
                let course = course_by_name(&mm, &actor, &course_name).await?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        course_id: course.id(),
                        title,
                        description,
                        video_url,
                        order_index,
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },

        Commands::Question { action } => match action {
            QuestionCommands::Add {
                course_name,
                statement,
                a,
                b,
                c,
                d,
                e,
                answer,
            } => {
                let course_id = match course_name {
                    Some(name) => Some(course_by_name(&mm, &actor, &name).await?.id()),
                    None => None,
                };
                let correct_answer: AnswerLetter = answer
                    .parse()
                    .map_err(|_| invalid_input(format!("answer must be A to E, got {answer:?}")))?;

                let create = QuestionCreate {
                    course_id,
                    statement,
                    option_a: a,
                    option_b: b,
                    option_c: c,
                    option_d: d,
                    option_e: e,
                    correct_answer,
                };
                if !create.is_consistent() {
                    return Err(invalid_input("answer points to a missing option".into()));
                }

                let question = Question::create(&mm, &actor, create).await?;
                println!("Question created: {:?}", question);
            }
        },
    }

    Ok(())
}
