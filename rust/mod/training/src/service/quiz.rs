use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use tracing::info;

use clinic_core::{new_id, now_rfc3339, transaction, Filter, ListResult, Principal, ServiceError};
use clinic_sql::Value;

use crate::model::{
    AnswerDetail, AttemptQuery, DrawQuiz, DrawnQuiz, Quiz, QuizAttempt, QuizQuestion, QuizResult, SubmitQuiz,
    TrainingQuestion,
};
use crate::service::{is_editor, page, TrainingService, ATTEMPTS, QUESTIONS, QUIZZES};

const DEFAULT_QUIZ_SIZE: usize = 10;
const MAX_QUIZ_SIZE: usize = 50;

fn quiz_indexes(q: &DrawnQuiz) -> Vec<(&'static str, Value)> {
    vec![
        ("staff_id", Value::from(q.staff_id.as_str())),
        ("submitted", Value::from(q.submitted)),
    ]
}

impl TrainingService {
    /// Draw random questions for the caller, served without their answers.
    /// The draw is kept so the submission can be checked against it.
    pub fn draw_quiz(&self, caller: &Principal, query: &DrawQuiz) -> Result<Quiz, ServiceError> {
        let count = query.count.unwrap_or(DEFAULT_QUIZ_SIZE).clamp(1, MAX_QUIZ_SIZE);
        let filter = Filter::new().eq_opt("category", query.category.clone());
        let mut bank: Vec<TrainingQuestion> = QUESTIONS.select(self.sql.as_ref(), &filter, "id")?;
        if bank.is_empty() {
            return Err(ServiceError::NotFound("no training questions to draw from".into()));
        }
        bank.shuffle(&mut rand::thread_rng());
        bank.truncate(count);

        let drawn = DrawnQuiz {
            id: new_id(),
            staff_id: caller.staff_id.clone(),
            question_ids: bank.iter().map(|q| q.id.clone()).collect(),
            submitted: false,
            created_at: now_rfc3339(),
        };
        let mut idx = quiz_indexes(&drawn);
        idx.push(("created_at", Value::from(drawn.created_at.as_str())));
        QUIZZES.insert(self.sql.as_ref(), &drawn.id, &drawn, &idx)?;
        Ok(Quiz {
            id: drawn.id,
            questions: bank.into_iter().map(QuizQuestion::from).collect(),
        })
    }

    /// Grade a drawn quiz and keep the attempt. Every drawn question
    /// counts; unanswered ones are wrong. A quiz is graded once.
    pub fn submit_quiz(&self, caller: &Principal, input: SubmitQuiz) -> Result<QuizResult, ServiceError> {
        if input.answers.is_empty() {
            return Err(ServiceError::Validation("no answers submitted".into()));
        }
        let mut choices = HashMap::with_capacity(input.answers.len());
        for answer in &input.answers {
            if choices.insert(answer.question_id.as_str(), answer.choice).is_some() {
                return Err(ServiceError::Validation(format!(
                    "question '{}' answered twice",
                    answer.question_id
                )));
            }
        }

        let attempt = transaction(self.sql.as_ref(), |tx| {
            let mut quiz = QUIZZES
                .find::<_, DrawnQuiz>(tx, &input.quiz_id)?
                .filter(|q| q.staff_id == caller.staff_id)
                .ok_or_else(|| ServiceError::NotFound(format!("quiz '{}' not found", input.quiz_id)))?;
            if quiz.submitted {
                return Err(ServiceError::Conflict(format!("quiz '{}' was already submitted", quiz.id)));
            }
            let drawn: HashSet<&str> = quiz.question_ids.iter().map(String::as_str).collect();
            if let Some(stray) = choices.keys().find(|id| !drawn.contains(*id)) {
                return Err(ServiceError::Validation(format!("question '{stray}' is not part of this quiz")));
            }

            let mut details = Vec::with_capacity(quiz.question_ids.len());
            for id in &quiz.question_ids {
                // Questions deleted since the draw are not graded.
                let Some(question) = QUESTIONS.find::<_, TrainingQuestion>(tx, id)? else {
                    continue;
                };
                let choice = choices.get(id.as_str()).copied();
                if choice.is_some_and(|c| c >= question.options.len()) {
                    return Err(ServiceError::Validation(format!(
                        "choice {} is out of range for question '{}'",
                        choice.unwrap_or_default(),
                        question.id
                    )));
                }
                details.push(AnswerDetail {
                    correct: choice == Some(question.correct_index),
                    question_id: question.id,
                    choice,
                    correct_index: question.correct_index,
                    explanation: question.explanation,
                });
            }

            quiz.submitted = true;
            QUIZZES.update(tx, &quiz.id, &quiz, &quiz_indexes(&quiz))?;
            let attempt = QuizAttempt {
                id: new_id(),
                quiz_id: quiz.id,
                staff_id: caller.staff_id.clone(),
                result: QuizResult::from_details(details),
                created_at: now_rfc3339(),
            };
            ATTEMPTS.insert(
                tx,
                &attempt.id,
                &attempt,
                &[
                    ("staff_id", Value::from(attempt.staff_id.as_str())),
                    ("passed", Value::from(attempt.result.passed)),
                    ("created_at", Value::from(attempt.created_at.as_str())),
                ],
            )?;
            Ok(attempt)
        })?;
        info!(
            staff = %caller.staff_id,
            quiz = %attempt.quiz_id,
            score = attempt.result.score_percent,
            passed = attempt.result.passed,
            "quiz submitted"
        );
        Ok(attempt.result)
    }

    /// Staff see their own attempts; managers and HR see everyone's.
    pub fn list_attempts(
        &self,
        caller: &Principal,
        query: &AttemptQuery,
    ) -> Result<ListResult<QuizAttempt>, ServiceError> {
        let staff_id = if caller.is_management() || is_editor(caller) {
            query.staff_id.clone()
        } else {
            Some(caller.staff_id.clone())
        };
        let filter = Filter::new().eq_opt("staff_id", staff_id);
        let (limit, offset) = page(query.limit, query.offset);
        ATTEMPTS.list(self.sql.as_ref(), &filter, "created_at DESC, id", limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateQuestion, QuizAnswer};
    use crate::service::testing::{hr, service, who};
    use clinic_core::Role;

    fn bank(svc: &TrainingService, n: usize, category: &str) -> Vec<TrainingQuestion> {
        (0..n)
            .map(|i| {
                svc.create_question(
                    &hr(),
                    CreateQuestion {
                        document_id: None,
                        category: Some(category.into()),
                        question: format!("Question {i}?"),
                        options: vec!["yes".into(), "no".into(), "maybe".into()],
                        correct_index: i % 3,
                        explanation: Some("see the manual".into()),
                    },
                )
                .unwrap()
            })
            .collect()
    }

    fn answer(q: &TrainingQuestion, right: bool) -> QuizAnswer {
        let choice = if right { q.correct_index } else { (q.correct_index + 1) % q.options.len() };
        QuizAnswer { question_id: q.id.clone(), choice }
    }

    /// The bank questions in the order they were drawn.
    fn drawn(qs: &[TrainingQuestion], quiz: &Quiz) -> Vec<TrainingQuestion> {
        quiz.questions
            .iter()
            .filter_map(|served| qs.iter().find(|q| q.id == served.id).cloned())
            .collect()
    }

    #[test]
    fn draw_hides_answers_and_respects_category() {
        let svc = service();
        bank(&svc, 6, "Peels");
        bank(&svc, 3, "Laser");
        let staff = who("t1", Role::Telesale);

        let quiz = svc.draw_quiz(&staff, &DrawQuiz { count: Some(4), category: Some("Peels".into()) }).unwrap();
        assert_eq!(quiz.questions.len(), 4);
        assert!(quiz.questions.iter().all(|q| q.category.as_deref() == Some("Peels")));
        let ids: HashSet<_> = quiz.questions.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 4);

        let json = serde_json::to_value(&quiz.questions[0]).unwrap();
        assert!(json.get("correctIndex").is_none());

        let all = svc.draw_quiz(&staff, &DrawQuiz { count: Some(100), category: None }).unwrap();
        assert_eq!(all.questions.len(), 9);
        assert!(matches!(
            svc.draw_quiz(&staff, &DrawQuiz { count: None, category: Some("Botox".into()) }),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn submit_grades_and_records() {
        let svc = service();
        let qs = bank(&svc, 5, "Peels");
        let staff = who("t1", Role::Telesale);

        let quiz = svc.draw_quiz(&staff, &DrawQuiz { count: Some(5), category: None }).unwrap();
        let order = drawn(&qs, &quiz);
        let answers: Vec<_> = order.iter().enumerate().map(|(i, q)| answer(q, i != 0)).collect();
        let result = svc.submit_quiz(&staff, SubmitQuiz { quiz_id: quiz.id.clone(), answers }).unwrap();
        assert_eq!((result.total, result.correct), (5, 4));
        assert!(result.passed);
        assert!(!result.details[0].correct);
        assert_eq!(result.details[0].explanation.as_deref(), Some("see the manual"));

        let again = vec![answer(&order[0], true)];
        assert!(matches!(
            svc.submit_quiz(&staff, SubmitQuiz { quiz_id: quiz.id.clone(), answers: again }),
            Err(ServiceError::Conflict(_))
        ));

        let other = who("t2", Role::Telesale);
        let quiz = svc.draw_quiz(&other, &DrawQuiz { count: Some(2), category: None }).unwrap();
        let order = drawn(&qs, &quiz);
        let answers = vec![answer(&order[0], true), answer(&order[1], false)];
        let failed = svc.submit_quiz(&other, SubmitQuiz { quiz_id: quiz.id, answers }).unwrap();
        assert_eq!(failed.score_percent, 50.0);
        assert!(!failed.passed);

        assert_eq!(svc.list_attempts(&staff, &AttemptQuery::default()).unwrap().total, 1);
        assert_eq!(svc.list_attempts(&who("m", Role::Manager), &AttemptQuery::default()).unwrap().total, 2);
        let mine = svc
            .list_attempts(&staff, &AttemptQuery { staff_id: Some("t2".into()), ..Default::default() })
            .unwrap();
        assert_eq!(mine.items[0].staff_id, "t1");
    }

    #[test]
    fn answering_one_question_does_not_pass_the_quiz() {
        let svc = service();
        let qs = bank(&svc, 5, "Peels");
        let staff = who("t1", Role::Telesale);

        let quiz = svc.draw_quiz(&staff, &DrawQuiz { count: Some(5), category: None }).unwrap();
        let order = drawn(&qs, &quiz);
        let result = svc
            .submit_quiz(&staff, SubmitQuiz { quiz_id: quiz.id, answers: vec![answer(&order[0], true)] })
            .unwrap();
        assert_eq!((result.total, result.correct), (5, 1));
        assert!(!result.passed);
        assert_eq!(result.details.iter().filter(|d| d.choice.is_none()).count(), 4);
    }

    #[test]
    fn bad_submissions() {
        let svc = service();
        let qs = bank(&svc, 3, "Peels");
        let staff = who("t1", Role::Telesale);
        let quiz = svc.draw_quiz(&staff, &DrawQuiz { count: Some(2), category: None }).unwrap();
        let order = drawn(&qs, &quiz);
        let outside = qs.iter().find(|q| !order.contains(q)).unwrap();
        let submit = |answers: Vec<QuizAnswer>| SubmitQuiz { quiz_id: quiz.id.clone(), answers };

        let unknown = vec![QuizAnswer { question_id: "ghost".into(), choice: 0 }];
        assert!(matches!(svc.submit_quiz(&staff, submit(unknown)), Err(ServiceError::Validation(_))));
        let not_drawn = vec![answer(outside, true)];
        assert!(matches!(svc.submit_quiz(&staff, submit(not_drawn)), Err(ServiceError::Validation(_))));
        let twice = vec![answer(&order[0], true), answer(&order[0], true)];
        assert!(matches!(svc.submit_quiz(&staff, submit(twice)), Err(ServiceError::Validation(_))));
        let out_of_range = vec![QuizAnswer { question_id: order[1].id.clone(), choice: 9 }];
        assert!(matches!(svc.submit_quiz(&staff, submit(out_of_range)), Err(ServiceError::Validation(_))));
        assert!(matches!(svc.submit_quiz(&staff, submit(vec![])), Err(ServiceError::Validation(_))));
        assert!(matches!(
            svc.submit_quiz(&who("t2", Role::Telesale), submit(vec![answer(&order[0], true)])),
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(svc.list_attempts(&staff, &AttemptQuery::default()).unwrap().total, 0);

        // Rejected submissions leave the quiz open.
        let answers = order.iter().map(|q| answer(q, true)).collect();
        assert!(svc.submit_quiz(&staff, submit(answers)).unwrap().passed);
    }
}
