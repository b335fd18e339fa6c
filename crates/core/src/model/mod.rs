mod employee;
mod ids;
mod question;
mod score;
mod session;

pub use ids::{CompanyId, DepartmentId, EmployeeId, ParseIdError};

pub use employee::{Company, Department, Employee, EmployeeError};
pub use question::{CHOICE_COUNT, PromptTemplate, Question, QuestionError, TemplateSet};
pub use score::{
    ScoreBand, ScoreError, ScoreRecord, Scoreboard, SessionContext, average_of, round2,
};
pub use session::{SessionPhase, SessionState, SessionToken};
