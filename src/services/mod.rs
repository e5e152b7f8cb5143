//! Business logic services
//!
//! Controllers stay thin; everything that touches more than one table or
//! carries an invariant lives here.

pub mod catalog;
pub mod composition;
pub mod enrollments;
pub mod materials;
pub mod paths;
pub mod users;
pub mod workspaces;
