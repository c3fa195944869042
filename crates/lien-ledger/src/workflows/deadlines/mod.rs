//! Lien deadline rules, calculation, auto-generation, and read-time prioritization.
//!
//! The calculator, generator, and priority deriver are pure functions over the
//! [`LienRuleTable`] and an injected "today"; only [`DeadlineService`] touches storage.

pub mod calculator;
pub mod domain;
pub mod generator;
pub mod priority;
pub mod repository;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use calculator::{calculate, CalculationError, DeadlineCalculation};
pub use domain::{
    AutoCreateRequest, CalculationRequest, Deadline, DeadlineId, DeadlinePatch, DeadlineQuery,
    DeadlineStatus, DeadlineType, DeadlineView, NewDeadline, Priority, ProjectType, TriggerEvent,
};
pub use generator::{plan_project_deadlines, DeadlinePlan};
pub use priority::{derive, DerivedPriority};
pub use repository::DeadlineRepository;
pub use router::deadline_router;
pub use rules::{LienRule, LienRuleTable};
pub use service::{DeadlineService, DeadlineServiceError};
