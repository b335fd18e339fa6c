use thiserror::Error;

use crate::model::ids::{CompanyId, DepartmentId, EmployeeId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EmployeeError {
    #[error("employee name cannot be empty")]
    EmptyName,

    #[error("employee {0} has no usable photo")]
    MissingPhoto(EmployeeId),
}

//
// ─── EMPLOYEE ──────────────────────────────────────────────────────────────────
//

/// An employee record as supplied by the HR directory.
///
/// Immutable once fetched. The quiz engine only ever reads it: the name and job
/// title feed question templates, the photo and department are shown alongside
/// the question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    id: EmployeeId,
    name: String,
    job_title: String,
    department_name: String,
    department_id: DepartmentId,
    company_id: CompanyId,
    photo_url: String,
}

impl Employee {
    /// Build a validated employee record.
    ///
    /// # Errors
    ///
    /// Returns `EmployeeError::EmptyName` if the trimmed name is empty and
    /// `EmployeeError::MissingPhoto` if no photo reference is provided.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EmployeeId,
        name: impl Into<String>,
        job_title: impl Into<String>,
        department_name: impl Into<String>,
        department_id: DepartmentId,
        company_id: CompanyId,
        photo_url: impl Into<String>,
    ) -> Result<Self, EmployeeError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(EmployeeError::EmptyName);
        }
        let photo_url = photo_url.into().trim().to_owned();
        if photo_url.is_empty() {
            return Err(EmployeeError::MissingPhoto(id));
        }

        Ok(Self {
            id,
            name,
            job_title: job_title.into().trim().to_owned(),
            department_name: department_name.into().trim().to_owned(),
            department_id,
            company_id,
            photo_url,
        })
    }

    #[must_use]
    pub fn id(&self) -> EmployeeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Job title as recorded in the directory; may be empty.
    #[must_use]
    pub fn job_title(&self) -> &str {
        &self.job_title
    }

    #[must_use]
    pub fn department_name(&self) -> &str {
        &self.department_name
    }

    #[must_use]
    pub fn department_id(&self) -> DepartmentId {
        self.department_id
    }

    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    #[must_use]
    pub fn photo_url(&self) -> &str {
        &self.photo_url
    }
}

//
// ─── DIRECTORY ENTRIES ─────────────────────────────────────────────────────────
//

/// A company the quiz can be played against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
}

/// A top-level department the quiz can be played against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}
