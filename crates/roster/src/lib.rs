//! Employee roster.
//!
//! An in-memory list of employee records with insert, delete-by-id,
//! average salary and lookup-by-id.

#![warn(missing_docs)]

mod employee;
mod manager;

pub use employee::{Employee, EmployeeId};
pub use manager::Manager;
