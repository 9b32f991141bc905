//! `ticket-engine` crate: approval workflow templates, template validation,
//! and the ticket approval engine.

pub mod models;
pub mod error;
pub mod validator;
pub mod strategy;
pub mod approval;
pub mod builder;

pub use models::{Disposal, NextStep, SignType, Step, Template, Ticket, TicketStatus};
pub use error::{ApprovalError, EngineError, TemplateError};
pub use validator::{validate_template, ValidatedTemplate, Validator, ValidatorConfig};
pub use approval::{advance, AdvanceRequest};
pub use builder::{load_template, StepBuilder, TemplateBuilder, TicketBuilder};
