use serde::{Deserialize, Serialize};

/// Fewest and most answer options per question.
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;
/// Score needed to pass, in percent.
pub const PASS_PERCENT: u32 = 80;

/// A multiple-choice question with its answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingQuestion {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestion {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
}

/// A question as served in a quiz, without the answer key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub question: String,
    pub options: Vec<String>,
}

impl From<TrainingQuestion> for QuizQuestion {
    fn from(q: TrainingQuestion) -> Self {
        Self {
            id: q.id,
            category: q.category,
            question: q.question,
            options: q.options,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrawQuiz {
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub category: Option<String>,
}

/// The question set drawn for one staff member, answerable once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnQuiz {
    pub id: String,
    pub staff_id: String,
    pub question_ids: Vec<String>,
    pub submitted: bool,
    pub created_at: String,
}

/// A drawn quiz as served to the staff member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question_id: String,
    pub choice: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuiz {
    pub quiz_id: String,
    pub answers: Vec<QuizAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    pub question_id: String,
    /// `None` when the question was left unanswered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<usize>,
    pub correct_index: usize,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub total: usize,
    pub correct: usize,
    pub score_percent: f64,
    pub passed: bool,
    pub details: Vec<AnswerDetail>,
}

impl QuizResult {
    pub fn from_details(details: Vec<AnswerDetail>) -> Self {
        let total = details.len();
        let correct = details.iter().filter(|d| d.correct).count();
        let score_percent = if total == 0 { 0.0 } else { correct as f64 * 100.0 / total as f64 };
        Self {
            total,
            correct,
            score_percent,
            passed: total > 0 && correct * 100 >= total * PASS_PERCENT as usize,
            details,
        }
    }
}

/// A graded quiz, kept for the staff member's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: String,
    pub staff_id: String,
    #[serde(flatten)]
    pub result: QuizResult,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptQuery {
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}
