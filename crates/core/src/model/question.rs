use std::collections::HashSet;

use thiserror::Error;

use crate::model::employee::Employee;
use crate::model::ids::EmployeeId;

/// Number of choices offered when the roster has enough distinct values.
pub const CHOICE_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("cannot build a question from an empty roster")]
    EmptyRoster,

    #[error("position {position} is outside a roster of {len}")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("answer index {index} is outside {len} choices")]
    AnswerOutOfRange { index: usize, len: usize },

    #[error("duplicate choice: {0}")]
    DuplicateChoice(String),

    #[error("template weights must not all be zero")]
    NoActiveTemplate,
}

//
// ─── PROMPT TEMPLATES ──────────────────────────────────────────────────────────
//

/// What a question asks about an employee.
///
/// Each template yields the prompt text and the attribute value that counts as
/// the correct answer; distractors are drawn from the same attribute across the
/// roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptTemplate {
    /// "Who is this?" answered with the employee's name.
    Name,
    /// "What is their job title?" answered with the job title.
    JobTitle,
}

impl PromptTemplate {
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            PromptTemplate::Name => "Who is this?",
            PromptTemplate::JobTitle => "What is their job title?",
        }
    }

    /// The attribute value this template asks about.
    #[must_use]
    pub fn value_of(self, employee: &Employee) -> &str {
        match self {
            PromptTemplate::Name => employee.name(),
            PromptTemplate::JobTitle => employee.job_title(),
        }
    }

    /// Returns true when the employee has a usable value for this template.
    #[must_use]
    pub fn applies_to(self, employee: &Employee) -> bool {
        !self.value_of(employee).trim().is_empty()
    }
}

/// Weighted set of prompt templates a question type is drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    entries: Vec<(PromptTemplate, u32)>,
}

impl Default for TemplateSet {
    /// Name recognition only.
    fn default() -> Self {
        Self {
            entries: vec![(PromptTemplate::Name, 1)],
        }
    }
}

impl TemplateSet {
    /// Build a set from `(template, weight)` pairs. Zero-weight entries are dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoActiveTemplate` if every weight is zero.
    pub fn new(
        entries: impl IntoIterator<Item = (PromptTemplate, u32)>,
    ) -> Result<Self, QuestionError> {
        let entries: Vec<_> = entries.into_iter().filter(|(_, w)| *w > 0).collect();
        if entries.is_empty() {
            return Err(QuestionError::NoActiveTemplate);
        }
        Ok(Self { entries })
    }

    /// Name and job-title questions with equal weight.
    #[must_use]
    pub fn with_job_titles() -> Self {
        Self {
            entries: vec![(PromptTemplate::Name, 1), (PromptTemplate::JobTitle, 1)],
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[(PromptTemplate, u32)] {
        &self.entries
    }

    /// Keep only the templates that apply to `employee`.
    ///
    /// Falls back to name recognition when nothing else applies, since every
    /// employee has a name.
    #[must_use]
    pub fn applicable_to(&self, employee: &Employee) -> Self {
        let entries: Vec<_> = self
            .entries
            .iter()
            .copied()
            .filter(|(template, _)| template.applies_to(employee))
            .collect();
        if entries.is_empty() {
            return Self::default();
        }
        Self { entries }
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|(_, w)| u64::from(*w)).sum()
    }

    /// Resolve a roll in `0..total_weight()` to a template.
    ///
    /// Rolls past the end resolve to the last entry.
    #[must_use]
    pub fn pick(&self, roll: u64) -> PromptTemplate {
        let mut acc = 0_u64;
        for (template, weight) in &self.entries {
            acc += u64::from(*weight);
            if roll < acc {
                return *template;
            }
        }
        self.entries
            .last()
            .map_or(PromptTemplate::Name, |(template, _)| *template)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question about one roster position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    employee_id: EmployeeId,
    template: PromptTemplate,
    choices: Vec<String>,
    answer_index: usize,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError::AnswerOutOfRange` if `answer_index` does not point
    /// into `choices`, or `QuestionError::DuplicateChoice` if a value repeats.
    pub fn new(
        employee_id: EmployeeId,
        template: PromptTemplate,
        choices: Vec<String>,
        answer_index: usize,
    ) -> Result<Self, QuestionError> {
        if answer_index >= choices.len() {
            return Err(QuestionError::AnswerOutOfRange {
                index: answer_index,
                len: choices.len(),
            });
        }
        let mut seen = HashSet::with_capacity(choices.len());
        for choice in &choices {
            if !seen.insert(choice.as_str()) {
                return Err(QuestionError::DuplicateChoice(choice.clone()));
            }
        }

        Ok(Self {
            employee_id,
            template,
            choices,
            answer_index,
        })
    }

    #[must_use]
    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    #[must_use]
    pub fn template(&self) -> PromptTemplate {
        self.template
    }

    #[must_use]
    pub fn prompt(&self) -> &'static str {
        self.template.prompt()
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    #[must_use]
    pub fn correct_choice(&self) -> &str {
        &self.choices[self.answer_index]
    }

    #[must_use]
    pub fn is_correct(&self, choice_index: usize) -> bool {
        choice_index == self.answer_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{CompanyId, DepartmentId};

    fn employee(title: &str) -> Employee {
        Employee::new(
            EmployeeId::new(1),
            "Grace",
            title,
            "Ops",
            DepartmentId::new(1),
            CompanyId::new(1),
            "photo",
        )
        .unwrap()
    }

    #[test]
    fn question_rejects_duplicate_choices() {
        let err = Question::new(
            EmployeeId::new(1),
            PromptTemplate::Name,
            vec!["A".into(), "B".into(), "A".into()],
            0,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::DuplicateChoice("A".into()));
    }

    #[test]
    fn question_rejects_answer_past_end() {
        let err = Question::new(EmployeeId::new(1), PromptTemplate::Name, vec!["A".into()], 1)
            .unwrap_err();
        assert!(matches!(err, QuestionError::AnswerOutOfRange { index: 1, len: 1 }));
    }

    #[test]
    fn pick_walks_cumulative_weights() {
        let set = TemplateSet::new([(PromptTemplate::Name, 3), (PromptTemplate::JobTitle, 1)])
            .unwrap();
        assert_eq!(set.total_weight(), 4);
        assert_eq!(set.pick(0), PromptTemplate::Name);
        assert_eq!(set.pick(2), PromptTemplate::Name);
        assert_eq!(set.pick(3), PromptTemplate::JobTitle);
        assert_eq!(set.pick(99), PromptTemplate::JobTitle);
    }

    #[test]
    fn all_zero_weights_are_rejected() {
        let err = TemplateSet::new([(PromptTemplate::Name, 0)]).unwrap_err();
        assert_eq!(err, QuestionError::NoActiveTemplate);
    }

    #[test]
    fn job_title_template_skipped_for_blank_titles() {
        let set = TemplateSet::with_job_titles();
        let narrowed = set.applicable_to(&employee(""));
        assert_eq!(narrowed.entries(), &[(PromptTemplate::Name, 1)]);

        let kept = set.applicable_to(&employee("CTO"));
        assert_eq!(kept.entries().len(), 2);
    }
}
