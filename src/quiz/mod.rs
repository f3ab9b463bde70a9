pub mod backend;
pub mod difficulty;
pub mod error;
pub mod evaluation;
pub mod extract;
pub mod question;
pub mod service;
pub mod session;

pub use backend::{AdaptiveQuizClient, LocalQuizBackend, QuizBackend};
pub use difficulty::{classify, Difficulty, MasteryLabel};
pub use error::{EvaluationFailure, GenerationFailure, PersistenceWarning};
pub use evaluation::Evaluation;
pub use question::{GeneratedQuestion, Question};
pub use service::{AdaptiveQuiz, AnswerOutcome, AnswerSubmission};
pub use session::{Advance, QuizSession, SessionError, SessionState, TopicRef};
