//! Employee record and its identifier.

use serde::{Deserialize, Serialize};

/// Caller-assigned identifier of an employee.
///
/// Uniqueness is not enforced anywhere; the roster treats the first
/// record carrying an id as the one that id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub u64);

impl EmployeeId {
    /// Get the raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for EmployeeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A single employee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Identifier
    pub id: EmployeeId,

    /// Full name
    pub name: String,

    /// Age in years
    pub age: u32,

    /// Salary (non-negative by convention, not checked)
    pub salary: f64,
}

impl Employee {
    /// Create a new employee record.
    pub fn new(id: u64, name: impl Into<String>, age: u32, salary: f64) -> Self {
        Self {
            id: EmployeeId(id),
            name: name.into(),
            age,
            salary,
        }
    }
}

impl std::fmt::Display for Employee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ID:{} Name:{} Age:{} Salary:{}}}",
            self.id, self.name, self.age, self.salary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_new() {
        let employee = Employee::new(7, "Carol", 41, 88000.0);
        assert_eq!(employee.id, EmployeeId(7));
        assert_eq!(employee.name, "Carol");
        assert_eq!(employee.age, 41);
        assert_eq!(employee.salary, 88000.0);
    }

    #[test]
    fn test_employee_display() {
        let employee = Employee::new(2, "Bob", 25, 65000.0);
        assert_eq!(employee.to_string(), "{ID:2 Name:Bob Age:25 Salary:65000}");
    }

    #[test]
    fn test_employee_id_serializes_as_number() {
        let employee = Employee::new(1, "Alice", 30, 70000.5);
        let json = serde_json::to_value(&employee).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["salary"], 70000.5);

        let back: Employee = serde_json::from_value(json).unwrap();
        assert_eq!(back, employee);
    }
}
