//! HR directory access: the read-only source of employees for a session.

mod memory;
mod odoo;

use async_trait::async_trait;

use quest_core::model::{Company, CompanyId, Department, DepartmentId, Employee};

use crate::error::DirectoryError;

pub use memory::InMemoryDirectory;
pub use odoo::{OdooConfig, OdooDirectory};

/// Read-only query contract over an HR directory.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// Companies a quiz can be played against.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` when the directory cannot be queried.
    async fn companies(&self) -> Result<Vec<Company>, DirectoryError>;

    /// Top-level departments a quiz can be played against.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` when the directory cannot be queried.
    async fn departments(&self) -> Result<Vec<Department>, DirectoryError>;

    /// Employees of `company` working in `department` or any of its
    /// sub-departments. Employees without a usable photo are left out.
    ///
    /// `count` is a hint; providers may return fewer or more and the session
    /// sampler applies the real limit.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` when the directory cannot be queried. No partial
    /// result is returned on failure.
    async fn fetch_employees(
        &self,
        company: CompanyId,
        department: DepartmentId,
        count: usize,
    ) -> Result<Vec<Employee>, DirectoryError>;
}
