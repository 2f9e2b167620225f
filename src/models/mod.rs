pub mod attempt;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod module;
pub mod quiz;
pub mod user;
pub mod view;

pub use attempt::{Attempt, NewAttemptRequest};
pub use course::{Course, NewCourseRequest, UpdateCourseRequest};
pub use enrollment::{CancelAction, Enrollment, EnrollmentStatus, NewEnrollmentRequest};
pub use lesson::{Lesson, LessonType, NewLessonRequest, UpdateLessonRequest};
pub use module::{Module, NewModuleRequest, UpdateModuleRequest};
pub use quiz::{NewQuizRequest, Question, Quiz, UpdateQuizRequest};
pub use user::{AuthContext, Role, User};
pub use view::{
    CourseSummary, CourseView, EnrolledCourse, EnrollmentView, LessonView, ModuleView, QuizView,
    UserSummary,
};
