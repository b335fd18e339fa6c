use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use quest_core::model::{
    Company, CompanyId, Department, DepartmentId, Employee, EmployeeError, EmployeeId,
};

use super::DirectoryProvider;
use crate::error::DirectoryError;

/// Directory held in memory, for tests and offline play from a roster file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    companies: Vec<Company>,
    departments: Vec<Department>,
    parents: HashMap<DepartmentId, DepartmentId>,
    employees: Vec<Employee>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_company(mut self, id: CompanyId, name: impl Into<String>) -> Self {
        self.companies.push(Company {
            id,
            name: name.into(),
        });
        self
    }

    /// Add a department; `parent` nests it under another one.
    #[must_use]
    pub fn with_department(
        mut self,
        id: DepartmentId,
        name: impl Into<String>,
        parent: Option<DepartmentId>,
    ) -> Self {
        self.departments.push(Department {
            id,
            name: name.into(),
        });
        if let Some(parent) = parent {
            self.parents.insert(id, parent);
        }
        self
    }

    #[must_use]
    pub fn with_employees(mut self, employees: impl IntoIterator<Item = Employee>) -> Self {
        self.employees.extend(employees);
        self
    }

    /// Load a JSON roster file of the shape
    /// `{ "companies": [...], "departments": [...], "employees": [...] }`.
    /// `employees` is required; the other lists may be left out.
    ///
    /// Employees without a photo are skipped, the same way a live directory
    /// filters them.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::RosterFile` if the file cannot be read,
    /// `DirectoryError::RosterFormat` if it is not valid JSON of that shape, and
    /// `DirectoryError::Employee` for an employee with a blank name.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse the roster file format from a string.
    ///
    /// # Errors
    ///
    /// See [`InMemoryDirectory::from_file`].
    pub fn from_json(raw: &str) -> Result<Self, DirectoryError> {
        let file: RosterFile = serde_json::from_str(raw)?;

        let mut directory = Self::new();
        for company in file.companies {
            directory = directory.with_company(company.id, company.name);
        }
        let names: HashMap<DepartmentId, String> = file
            .departments
            .iter()
            .map(|d| (d.id, d.name.clone()))
            .collect();
        for department in file.departments {
            directory = directory.with_department(department.id, department.name, department.parent_id);
        }

        for entry in file.employees {
            let department_name = entry
                .department_name
                .or_else(|| names.get(&entry.department_id).cloned())
                .unwrap_or_default();
            match Employee::new(
                entry.id,
                entry.name,
                entry.job_title.unwrap_or_default(),
                department_name,
                entry.department_id,
                entry.company_id,
                entry.photo_url.unwrap_or_default(),
            ) {
                Ok(employee) => directory.employees.push(employee),
                Err(EmployeeError::MissingPhoto(id)) => {
                    tracing::debug!(employee = %id, "skipping employee without photo");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(directory)
    }

    fn in_subtree(&self, department: DepartmentId, root: DepartmentId) -> bool {
        let mut current = department;
        let mut visited = HashSet::new();
        loop {
            if current == root {
                return true;
            }
            if !visited.insert(current) {
                return false;
            }
            match self.parents.get(&current) {
                Some(parent) => current = *parent,
                None => return false,
            }
        }
    }
}

#[async_trait]
impl DirectoryProvider for InMemoryDirectory {
    async fn companies(&self) -> Result<Vec<Company>, DirectoryError> {
        Ok(self.companies.clone())
    }

    async fn departments(&self) -> Result<Vec<Department>, DirectoryError> {
        Ok(self
            .departments
            .iter()
            .filter(|d| !self.parents.contains_key(&d.id))
            .cloned()
            .collect())
    }

    async fn fetch_employees(
        &self,
        company: CompanyId,
        department: DepartmentId,
        _count: usize,
    ) -> Result<Vec<Employee>, DirectoryError> {
        Ok(self
            .employees
            .iter()
            .filter(|e| e.company_id() == company && self.in_subtree(e.department_id(), department))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    companies: Vec<CompanyEntry>,
    #[serde(default)]
    departments: Vec<DepartmentEntry>,
    employees: Vec<EmployeeEntry>,
}

#[derive(Debug, Deserialize)]
struct CompanyEntry {
    id: CompanyId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DepartmentEntry {
    id: DepartmentId,
    name: String,
    #[serde(default)]
    parent_id: Option<DepartmentId>,
}

#[derive(Debug, Deserialize)]
struct EmployeeEntry {
    id: EmployeeId,
    name: String,
    #[serde(default)]
    job_title: Option<String>,
    department_id: DepartmentId,
    #[serde(default)]
    department_name: Option<String>,
    company_id: CompanyId,
    #[serde(default)]
    photo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"{
        "companies": [{ "id": 1, "name": "Acme" }, { "id": 2, "name": "Globex" }],
        "departments": [
            { "id": 10, "name": "R&D" },
            { "id": 11, "name": "Frontend", "parent_id": 10 },
            { "id": 20, "name": "Sales" }
        ],
        "employees": [
            { "id": 1, "name": "Ada", "job_title": "Engineer", "department_id": 10, "company_id": 1, "photo_url": "a.png" },
            { "id": 2, "name": "Brian", "department_id": 11, "company_id": 1, "photo_url": "b.png" },
            { "id": 3, "name": "Cleo", "department_id": 20, "company_id": 1, "photo_url": "c.png" },
            { "id": 4, "name": "Dev", "department_id": 10, "company_id": 2, "photo_url": "d.png" },
            { "id": 5, "name": "Eve", "department_id": 10, "company_id": 1 }
        ]
    }"#;

    #[tokio::test]
    async fn filters_by_company_and_department_subtree() {
        let directory = InMemoryDirectory::from_json(ROSTER).unwrap();
        let employees = directory
            .fetch_employees(CompanyId::new(1), DepartmentId::new(10), 10)
            .await
            .unwrap();
        let mut ids: Vec<u64> = employees.iter().map(|e| e.id().value()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn employees_without_photo_are_dropped() {
        let directory = InMemoryDirectory::from_json(ROSTER).unwrap();
        let all = directory
            .fetch_employees(CompanyId::new(1), DepartmentId::new(10), 10)
            .await
            .unwrap();
        assert!(all.iter().all(|e| e.name() != "Eve"));
    }

    #[tokio::test]
    async fn department_names_are_filled_from_the_department_list() {
        let directory = InMemoryDirectory::from_json(ROSTER).unwrap();
        let employees = directory
            .fetch_employees(CompanyId::new(1), DepartmentId::new(11), 10)
            .await
            .unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].department_name(), "Frontend");
        assert_eq!(employees[0].job_title(), "");
    }

    #[tokio::test]
    async fn only_top_level_departments_are_listed() {
        let directory = InMemoryDirectory::from_json(ROSTER).unwrap();
        let names: Vec<String> = directory
            .departments()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["R&D".to_string(), "Sales".to_string()]);
        assert_eq!(directory.companies().await.unwrap().len(), 2);
    }

    #[test]
    fn blank_names_are_rejected() {
        let raw = r#"{ "employees": [
            { "id": 1, "name": " ", "department_id": 1, "company_id": 1, "photo_url": "x" }
        ] }"#;
        assert!(matches!(
            InMemoryDirectory::from_json(raw),
            Err(DirectoryError::Employee(EmployeeError::EmptyName))
        ));
    }

    #[test]
    fn invalid_json_is_a_format_error() {
        assert!(matches!(
            InMemoryDirectory::from_json("[]"),
            Err(DirectoryError::RosterFormat(_))
        ));
    }

    #[test]
    fn roster_without_employees_is_a_format_error() {
        assert!(matches!(
            InMemoryDirectory::from_json("{}"),
            Err(DirectoryError::RosterFormat(_))
        ));
        assert!(matches!(
            InMemoryDirectory::from_json(r#"{ "companies": [{ "id": 1, "name": "Acme" }] }"#),
            Err(DirectoryError::RosterFormat(_))
        ));
    }

    #[test]
    fn explicit_empty_employee_list_is_accepted() {
        let directory = InMemoryDirectory::from_json(r#"{ "employees": [] }"#).unwrap();
        assert!(directory.employees.is_empty());
    }
}
