//! Roster manager.

use crate::{Employee, EmployeeId};
use tracing::debug;

/// Owns the employee records in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Manager {
    employees: Vec<Employee>,
}

impl Manager {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an employee. Duplicate ids are accepted.
    pub fn add_employee(&mut self, employee: Employee) {
        debug!(employee_id = %employee.id, name = %employee.name, "Adding employee");
        self.employees.push(employee);
    }

    /// Remove the first employee with the given id.
    ///
    /// The remaining records keep their relative order. Removing an id
    /// that is not present is a no-op and returns `None`.
    pub fn remove_employee(&mut self, id: EmployeeId) -> Option<Employee> {
        let idx = self.employees.iter().position(|e| e.id == id)?;
        debug!(employee_id = %id, "Removing employee");
        Some(self.employees.remove(idx))
    }

    /// Arithmetic mean of all salaries, or `0.0` for an empty roster.
    pub fn average_salary(&self) -> f64 {
        if self.employees.is_empty() {
            return 0.0;
        }

        let total: f64 = self.employees.iter().map(|e| e.salary).sum();
        total / self.employees.len() as f64
    }

    /// Find the first employee with the given id.
    pub fn find_employee_by_id(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    /// All employees in insertion order.
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Number of employees.
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}
