//! Construction projects owning deadlines and invoices.
//!
//! Projects are weak parents: deleting one detaches its deadlines and invoices rather
//! than removing them.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{NewProject, Project, ProjectId};
pub use repository::ProjectRepository;
pub use router::project_router;
pub use service::{ProjectService, ProjectServiceError};
