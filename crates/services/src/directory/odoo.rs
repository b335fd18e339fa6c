use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use quest_core::model::{
    Company, CompanyId, Department, DepartmentId, Employee, EmployeeError, EmployeeId,
};

use super::DirectoryProvider;
use crate::error::DirectoryError;

const EMPLOYEE_MODEL: &str = "hr.employee.public";

#[derive(Clone, Debug)]
pub struct OdooConfig {
    pub base_url: String,
    /// Value of the `session_id` cookie of an already logged-in browser session.
    pub session_id: Option<String>,
}

impl Default for OdooConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.odoo.com".into(),
            session_id: None,
        }
    }
}

impl OdooConfig {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    fn avatar_url(&self, id: EmployeeId) -> String {
        format!("{}/web/image/{EMPLOYEE_MODEL}/{id}/avatar_128", self.base())
    }
}

/// Directory backed by Odoo's JSON-RPC `search_read` endpoints.
#[derive(Clone)]
pub struct OdooDirectory {
    client: Client,
    config: OdooConfig,
}

impl OdooDirectory {
    #[must_use]
    pub fn new(config: OdooConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn search_read<T: DeserializeOwned>(
        &self,
        model: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Vec<T>, DirectoryError> {
        let url = format!(
            "{}/web/dataset/call_kw/{model}/search_read",
            self.config.base()
        );
        let payload = RpcRequest {
            id: 1,
            jsonrpc: "2.0",
            method: "call_kw",
            params: RpcParams {
                model,
                method: "search_read",
                args,
                kwargs,
            },
        };

        let mut request = self.client.post(url).json(&payload);
        if let Some(session_id) = &self.config.session_id {
            request = request.header(COOKIE, format!("session_id={session_id}"));
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(DirectoryError::HttpStatus(response.status()));
        }

        let body: RpcResponse<Vec<T>> = response.json().await?;
        body.into_result()
    }
}

#[async_trait]
impl DirectoryProvider for OdooDirectory {
    async fn companies(&self) -> Result<Vec<Company>, DirectoryError> {
        let rows: Vec<NamedRecord> = self
            .search_read("res.company", json!([[]]), json!({ "fields": ["name"] }))
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| Company {
                id: CompanyId::new(row.id),
                name: row.name,
            })
            .collect())
    }

    async fn departments(&self) -> Result<Vec<Department>, DirectoryError> {
        let rows: Vec<NamedRecord> = self
            .search_read(
                "hr.department",
                json!([[["parent_id", "=", false]]]),
                json!({ "fields": ["name"] }),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| Department {
                id: DepartmentId::new(row.id),
                name: row.name,
            })
            .collect())
    }

    async fn fetch_employees(
        &self,
        company: CompanyId,
        department: DepartmentId,
        count: usize,
    ) -> Result<Vec<Employee>, DirectoryError> {
        let rows: Vec<EmployeeRow> = self
            .search_read(
                EMPLOYEE_MODEL,
                json!([]),
                json!({
                    "domain": [
                        ["company_id", "in", [company.value()]],
                        ["department_id", "child_of", department.value()],
                        ["image_128", "!=", false],
                    ],
                    "fields": ["name", "user_id", "department_id", "company_id", "job_title"],
                }),
            )
            .await?;

        let mut employees = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(employee) = row.into_employee(&self.config)? {
                employees.push(employee);
            }
        }
        tracing::debug!(
            %company,
            %department,
            requested = count,
            fetched = employees.len(),
            "employees fetched"
        );
        Ok(employees)
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    id: u32,
    jsonrpc: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
}

#[derive(Debug, Serialize)]
struct RpcParams<'a> {
    model: &'a str,
    method: &'static str,
    args: Value,
    kwargs: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    message: Option<String>,
}

impl<T> RpcResponse<T> {
    fn into_result(self) -> Result<T, DirectoryError> {
        if let Some(error) = self.error {
            let detail = error
                .data
                .and_then(|data| data.message)
                .filter(|message| !message.is_empty());
            let message = match detail {
                Some(detail) => format!("{}: {detail}", error.message),
                None => error.message,
            };
            return Err(DirectoryError::Rpc(message));
        }
        self.result.ok_or(DirectoryError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct NamedRecord {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct EmployeeRow {
    id: u64,
    name: String,
    #[serde(default)]
    job_title: Value,
    #[serde(default)]
    department_id: Value,
    #[serde(default)]
    company_id: Value,
}

impl EmployeeRow {
    /// `Ok(None)` for rows that cannot be placed in a department or company.
    fn into_employee(self, config: &OdooConfig) -> Result<Option<Employee>, DirectoryError> {
        let id = EmployeeId::new(self.id);
        let (Some((department_id, department_name)), Some((company_id, _))) =
            (many2one(&self.department_id), many2one(&self.company_id))
        else {
            tracing::warn!(employee = %id, "skipping employee without department or company");
            return Ok(None);
        };

        match Employee::new(
            id,
            self.name,
            self.job_title.as_str().unwrap_or_default(),
            department_name,
            DepartmentId::new(department_id),
            CompanyId::new(company_id),
            config.avatar_url(id),
        ) {
            Ok(employee) => Ok(Some(employee)),
            Err(EmployeeError::EmptyName) => {
                tracing::warn!(employee = %id, "skipping employee with blank name");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Decode an Odoo many2one value: `[id, "display name"]` or `false`.
fn many2one(value: &Value) -> Option<(u64, String)> {
    let pair = value.as_array()?;
    let id = pair.first()?.as_u64()?;
    let name = pair.get(1).and_then(Value::as_str).unwrap_or_default();
    Some((id, name.to_owned()))
}
