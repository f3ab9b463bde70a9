//! Client-held quiz session: five question/answer/evaluation rounds for one
//! topic, with difficulty recomputed from the mastery returned after each
//! round.
//!
//! Nothing is retried automatically. A failed question request leaves the
//! session waiting for the learner to ask again, and a failed evaluation is
//! replaced by [`Evaluation::fallback`] so the learner can always move on.

use std::fmt;

use thiserror::Error;

use super::backend::QuizBackend;
use super::difficulty::{classify, Difficulty};
use super::error::GenerationFailure;
use super::evaluation::Evaluation;
use super::question::Question;
use super::service::AnswerSubmission;

pub const ROUNDS_PER_SESSION: usize = 5;

pub type CompletionCallback = Box<dyn FnOnce(f64) + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRef {
    pub user_id: String,
    pub topic_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub question: Question,
    pub level: Difficulty,
    pub answer: String,
    pub evaluation: Evaluation,
    pub mastery_after: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    AwaitingQuestion,
    QuestionDisplayed { question: Question, level: Difficulty },
    AwaitingEvaluation { question: Question, level: Difficulty, answer: String },
    ResultDisplayed,
    Complete { final_mastery: f64 },
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::AwaitingQuestion => "AwaitingQuestion",
            SessionState::QuestionDisplayed { .. } => "QuestionDisplayed",
            SessionState::AwaitingEvaluation { .. } => "AwaitingEvaluation",
            SessionState::ResultDisplayed => "ResultDisplayed",
            SessionState::Complete { .. } => "SessionComplete",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: &'static str },
    #[error("{0:?} is not one of the displayed options")]
    UnknownOption(String),
    #[error("question generation failed: {0}")]
    Generation(#[from] GenerationFailure),
}

/// Where the session stands after the learner advances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    NextRound { round: usize, mastery: f64 },
    Completed { final_mastery: f64 },
}

pub struct QuizSession<B: QuizBackend> {
    backend: B,
    topic: TopicRef,
    state: SessionState,
    rounds: Vec<Round>,
    mastery: f64,
    on_complete: Option<CompletionCallback>,
}

impl<B: QuizBackend> fmt::Debug for QuizSession<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("topic", &self.topic)
            .field("state", &self.state)
            .field("rounds", &self.rounds.len())
            .field("mastery", &self.mastery)
            .finish()
    }
}

impl<B: QuizBackend> QuizSession<B> {
    /// Reads mastery once; a missing record or a failed read starts at 0.0.
    pub async fn start(backend: B, topic: TopicRef, on_complete: CompletionCallback) -> Self {
        let mastery = match backend.fetch_mastery(&topic.user_id, &topic.topic_id).await {
            Ok(Some(level)) => level,
            Ok(None) => 0.0,
            Err(warning) => {
                tracing::warn!(topic_id = %topic.topic_id, error = %warning, "mastery fetch failed, starting at 0");
                0.0
            }
        };
        Self::with_mastery(backend, topic, mastery, on_complete)
    }

    pub fn with_mastery(
        backend: B,
        topic: TopicRef,
        mastery: f64,
        on_complete: CompletionCallback,
    ) -> Self {
        Self {
            backend,
            topic,
            state: SessionState::AwaitingQuestion,
            rounds: Vec::with_capacity(ROUNDS_PER_SESSION),
            mastery,
            on_complete: Some(on_complete),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mastery(&self) -> f64 {
        self.mastery
    }

    /// Difficulty the next question will be requested at.
    pub fn next_level(&self) -> Difficulty {
        classify(self.mastery)
    }

    pub fn completed_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Complete { .. })
    }

    /// On failure the session stays in `AwaitingQuestion` and may be asked again.
    pub async fn request_question(&mut self) -> Result<Question, SessionError> {
        self.expect_state("request a question", |s| matches!(s, SessionState::AwaitingQuestion))?;

        let generated = self
            .backend
            .generate_question(&self.topic.title, self.mastery)
            .await
            .map_err(|err| {
                tracing::warn!(topic = %self.topic.title, round = self.rounds.len() + 1, error = %err, "question generation failed");
                err
            })?;

        tracing::debug!(topic = %self.topic.title, level = %generated.level, "question displayed");
        self.state = SessionState::QuestionDisplayed {
            question: generated.question.clone(),
            level: generated.level,
        };
        Ok(generated.question)
    }

    /// Submits the selected option. Also accepted from `AwaitingEvaluation`
    /// when an earlier submission was abandoned mid-flight.
    pub async fn submit_answer(&mut self, selected: &str) -> Result<Round, SessionError> {
        let (question, level) = match &self.state {
            SessionState::QuestionDisplayed { question, level }
            | SessionState::AwaitingEvaluation { question, level, .. } => (question.clone(), *level),
            other => {
                return Err(SessionError::InvalidTransition {
                    action: "submit an answer",
                    state: other.name(),
                })
            }
        };

        let answer = question
            .options
            .iter()
            .find(|option| option.trim() == selected.trim())
            .cloned()
            .ok_or_else(|| SessionError::UnknownOption(selected.to_string()))?;

        self.state = SessionState::AwaitingEvaluation {
            question: question.clone(),
            level,
            answer: answer.clone(),
        };

        let submission = AnswerSubmission {
            question: question.question.clone(),
            answer: answer.clone(),
            topic: self.topic.title.clone(),
            user_id: self.topic.user_id.clone(),
            topic_id: self.topic.topic_id.clone(),
            previous_mastery: Some(self.mastery),
        };

        let (evaluation, new_mastery) = match self.backend.evaluate_answer(&submission).await {
            Ok(outcome) => (outcome.evaluation, outcome.new_mastery),
            Err(err) => {
                tracing::warn!(topic = %self.topic.title, error = %err, "evaluation failed, using fallback");
                (Evaluation::fallback(), None)
            }
        };

        if let Some(level) = new_mastery {
            self.mastery = level;
        }

        let round = Round {
            question,
            level,
            answer,
            evaluation,
            mastery_after: self.mastery,
        };
        self.rounds.push(round.clone());
        self.state = SessionState::ResultDisplayed;

        Ok(round)
    }

    /// Moves past a displayed result. The fifth completed round ends the
    /// session and hands the final mastery to the completion callback.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        self.expect_state("advance", |s| matches!(s, SessionState::ResultDisplayed))?;

        if self.rounds.len() >= ROUNDS_PER_SESSION {
            let final_mastery = self.mastery;
            self.state = SessionState::Complete { final_mastery };
            tracing::info!(topic = %self.topic.title, final_mastery, "quiz session complete");
            if let Some(callback) = self.on_complete.take() {
                callback(final_mastery);
            }
            return Ok(Advance::Completed { final_mastery });
        }

        self.state = SessionState::AwaitingQuestion;
        Ok(Advance::NextRound {
            round: self.rounds.len() + 1,
            mastery: self.mastery,
        })
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: impl Fn(&SessionState) -> bool,
    ) -> Result<(), SessionError> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }
}
