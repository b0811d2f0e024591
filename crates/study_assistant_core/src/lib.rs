pub mod domain;
pub mod metrics;
pub mod pipeline;
pub mod ports;
pub mod scoring;

pub use domain::{
    AnsweredQuestion, Difficulty, Feedback, FeedbackTone, GeneratedQuiz, NewQuiz,
    NewQuizAttempt, PasswordReset, Question, QuestionFeedback, QuestionKind, Quiz, QuizAttempt,
    Summary, User, UserCredentials,
};
pub use pipeline::{attach_images, Orchestration, QuizPipeline};
pub use ports::{
    ContentService, DatabaseService, FeedbackRequest, FeedbackService, ImageGenerationService,
    PasswordResetNotifier, PortError, PortResult, QuizGenerationService, QuizRequest,
    StudyPlanRequest, StudyPlanService,
};
