use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use quest_core::model::{CHOICE_COUNT, Employee, Question, QuestionError, TemplateSet};

/// Builds multiple-choice questions for roster positions.
///
/// The template decides which attribute is asked about; choosing distractors and
/// shuffling are the same for every template.
#[derive(Debug, Clone, Default)]
pub struct QuestionGenerator {
    templates: TemplateSet,
}

impl QuestionGenerator {
    #[must_use]
    pub fn new(templates: TemplateSet) -> Self {
        Self { templates }
    }

    /// Build the question for `roster[position]`.
    ///
    /// Offers `min(CHOICE_COUNT, distinct values in the roster)` choices, so a
    /// small roster gets fewer choices instead of an endless distractor search.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyRoster` or `QuestionError::PositionOutOfRange`
    /// when the preconditions do not hold.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        roster: &[Employee],
        position: usize,
        rng: &mut R,
    ) -> Result<Question, QuestionError> {
        if roster.is_empty() {
            return Err(QuestionError::EmptyRoster);
        }
        let Some(employee) = roster.get(position) else {
            return Err(QuestionError::PositionOutOfRange {
                position,
                len: roster.len(),
            });
        };

        let candidates = self.templates.applicable_to(employee);
        let template = candidates.pick(rng.random_range(0..candidates.total_weight()));
        let correct = template.value_of(employee);

        let distinct: HashSet<&str> = roster
            .iter()
            .map(|e| template.value_of(e))
            .filter(|value| !value.trim().is_empty())
            .collect();
        let target = CHOICE_COUNT.min(distinct.len());

        let mut choices: Vec<String> = Vec::with_capacity(target);
        choices.push(correct.to_owned());
        // Terminates: `target` never exceeds the distinct values on offer.
        while choices.len() < target {
            let drawn = template.value_of(&roster[rng.random_range(0..roster.len())]);
            if drawn.trim().is_empty() || choices.iter().any(|c| c == drawn) {
                continue;
            }
            choices.push(drawn.to_owned());
        }

        choices.shuffle(rng);
        let answer_index = choices
            .iter()
            .position(|choice| choice == correct)
            .ok_or(QuestionError::AnswerOutOfRange {
                index: choices.len(),
                len: choices.len(),
            })?;

        Question::new(employee.id(), template, choices, answer_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::model::{CompanyId, DepartmentId, EmployeeId, PromptTemplate};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_employee(id: u64, name: &str, title: &str) -> Employee {
        Employee::new(
            EmployeeId::new(id),
            name,
            title,
            "Ops",
            DepartmentId::new(1),
            CompanyId::new(1),
            "photo",
        )
        .unwrap()
    }

    fn roster(n: u64) -> Vec<Employee> {
        (1..=n)
            .map(|id| build_employee(id, &format!("Name {id}"), &format!("Title {id}")))
            .collect()
    }

    #[test]
    fn correct_name_sits_at_answer_index() {
        let generator = QuestionGenerator::default();
        let roster = roster(10);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let position = (seed % 10) as usize;
            let question = generator.generate(&roster, position, &mut rng).unwrap();

            assert_eq!(question.prompt(), "Who is this?");
            assert_eq!(question.choices().len(), CHOICE_COUNT);
            assert_eq!(question.correct_choice(), roster[position].name());
            assert_eq!(question.employee_id(), roster[position].id());

            let unique: HashSet<_> = question.choices().iter().collect();
            assert_eq!(unique.len(), question.choices().len());
        }
    }

    #[test]
    fn small_roster_caps_choice_count() {
        let generator = QuestionGenerator::default();
        let mut rng = StdRng::seed_from_u64(9);

        let single = roster(1);
        let question = generator.generate(&single, 0, &mut rng).unwrap();
        assert_eq!(question.choices(), &["Name 1".to_string()]);
        assert_eq!(question.answer_index(), 0);

        let three = roster(3);
        let question = generator.generate(&three, 2, &mut rng).unwrap();
        assert_eq!(question.choices().len(), 3);
        assert_eq!(question.correct_choice(), "Name 3");
    }

    #[test]
    fn namesakes_count_once() {
        let generator = QuestionGenerator::default();
        let roster = vec![
            build_employee(1, "Sam", ""),
            build_employee(2, "Sam", ""),
            build_employee(3, "Alex", ""),
            build_employee(4, "Sam", ""),
            build_employee(5, "Alex", ""),
        ];
        let mut rng = StdRng::seed_from_u64(11);
        let question = generator.generate(&roster, 1, &mut rng).unwrap();
        assert_eq!(question.choices().len(), 2);
        assert_eq!(question.correct_choice(), "Sam");
    }

    #[test]
    fn answer_index_tracks_the_asked_value_after_shuffle() {
        let generator = QuestionGenerator::new(TemplateSet::with_job_titles());
        let roster = vec![
            build_employee(1, "Ana", "Engineer"),
            build_employee(2, "Ben", "Engineer"),
            build_employee(3, "Cleo", "Designer"),
            build_employee(4, "Dov", ""),
            build_employee(5, "Eli", "Engineer"),
        ];
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let position = (seed % 5) as usize;
            let question = generator.generate(&roster, position, &mut rng).unwrap();
            let expected = question.template().value_of(&roster[position]);
            assert_eq!(question.choices()[question.answer_index()], expected);
        }
    }

    #[test]
    fn preconditions_are_reported() {
        let generator = QuestionGenerator::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generator.generate(&[], 0, &mut rng).unwrap_err(),
            QuestionError::EmptyRoster
        );
        assert_eq!(
            generator.generate(&roster(2), 2, &mut rng).unwrap_err(),
            QuestionError::PositionOutOfRange { position: 2, len: 2 }
        );
    }

    #[test]
    fn job_title_template_uses_titles_for_distractors() {
        let templates = TemplateSet::new([(PromptTemplate::JobTitle, 1)]).unwrap();
        let generator = QuestionGenerator::new(templates);
        let roster = roster(6);
        let mut rng = StdRng::seed_from_u64(5);
        let question = generator.generate(&roster, 4, &mut rng).unwrap();

        assert_eq!(question.template(), PromptTemplate::JobTitle);
        assert_eq!(question.prompt(), "What is their job title?");
        assert_eq!(question.correct_choice(), "Title 5");
        assert!(question.choices().iter().all(|c| c.starts_with("Title ")));
    }

    #[test]
    fn blank_title_falls_back_to_name() {
        let templates = TemplateSet::new([(PromptTemplate::JobTitle, 1)]).unwrap();
        let generator = QuestionGenerator::new(templates);
        let mut roster = roster(4);
        roster[0] = build_employee(1, "Name 1", "");
        let mut rng = StdRng::seed_from_u64(2);
        let question = generator.generate(&roster, 0, &mut rng).unwrap();
        assert_eq!(question.template(), PromptTemplate::Name);
        assert_eq!(question.correct_choice(), "Name 1");
    }

    #[test]
    fn blank_titles_never_become_distractors() {
        let templates = TemplateSet::new([(PromptTemplate::JobTitle, 1)]).unwrap();
        let generator = QuestionGenerator::new(templates);
        let roster = vec![
            build_employee(1, "A", "CEO"),
            build_employee(2, "B", ""),
            build_employee(3, "C", "CTO"),
        ];
        let mut rng = StdRng::seed_from_u64(8);
        let question = generator.generate(&roster, 0, &mut rng).unwrap();
        assert_eq!(question.choices().len(), 2);
        assert!(question.choices().iter().all(|c| !c.is_empty()));
    }
}
