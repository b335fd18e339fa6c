use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an id from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// Directory ids are plain integers on the HR side; the newtypes keep a company
// id from being passed where a department id is expected.
macro_rules! directory_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self::new)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
            }
        }
    };
}

directory_id!(
    /// Identifier of an employee record in the HR directory.
    EmployeeId
);
directory_id!(
    /// Identifier of a company in the HR directory.
    CompanyId
);
directory_id!(
    /// Identifier of a department in the HR directory.
    DepartmentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_id_display_and_parse() {
        let id: EmployeeId = "123".parse().unwrap();
        assert_eq!(id, EmployeeId::new(123));
        assert_eq!(id.to_string(), "123");
        assert_eq!(format!("{id:?}"), "EmployeeId(123)");
    }

    #[test]
    fn company_id_rejects_garbage() {
        let err = "acme".parse::<CompanyId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse CompanyId from string");
    }

    #[test]
    fn department_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&DepartmentId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: DepartmentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value(), 7);
    }
}
