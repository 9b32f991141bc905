//! Approval engine: advances a ticket by one edge.
//!
//! [`advance`] authorises the actor, finds the requested edge leaving the
//! ticket's current step, and hands off to the sign strategy of that step.
//! It assumes the step map comes from a validated template.
//!
//! The engine holds no state.  Calls for different tickets may run
//! concurrently; calls for the same ticket must be serialised by the caller,
//! who also persists the returned ticket.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::models::{Step, Ticket, TicketStatus};
use crate::strategy::SignContext;
use crate::{ApprovalError, ValidatedTemplate};

/// One requested transition.
#[derive(Debug, Clone, Copy)]
pub struct AdvanceRequest<'a> {
    /// Target step of the edge to follow.
    pub next_step: &'a str,
    /// Operation label of the edge to follow.
    pub operation: &'a str,
    pub actor: &'a str,
    /// Admins may act without being on the operator list.
    pub is_admin: bool,
    pub end_steps: &'a HashSet<String>,
    pub ticket: &'a Ticket,
    pub steps: &'a HashMap<String, Step>,
}

/// Advance the ticket along the requested edge and return its new value.
///
/// The input ticket is never modified.
///
/// # Errors
/// - [`ApprovalError::BadArguments`] if the step, operation or actor is empty.
/// - [`ApprovalError::AlreadyApproved`] if the ticket is not running or the
///   actor already acted on the current step.
/// - [`ApprovalError::InvalidStep`] if the current step is unknown or has no
///   edge matching `(next_step, operation)`.
/// - [`ApprovalError::OperatorNotInOperatorList`] if a non-admin actor is
///   not entitled to act.
#[instrument(
    skip_all,
    fields(ticket = %req.ticket.uid, step = %req.ticket.step, actor = %req.actor)
)]
pub fn advance(req: AdvanceRequest<'_>) -> Result<Ticket, ApprovalError> {
    if req.next_step.is_empty() {
        return Err(ApprovalError::BadArguments("next step"));
    }
    if req.operation.is_empty() {
        return Err(ApprovalError::BadArguments("operation"));
    }
    if req.actor.is_empty() {
        return Err(ApprovalError::BadArguments("actor"));
    }

    let ticket = req.ticket;
    if !ticket.is_running() {
        debug!("ticket already {}", ticket.status);
        return Err(ApprovalError::AlreadyApproved);
    }

    let current = req
        .steps
        .get(&ticket.step)
        .ok_or_else(|| ApprovalError::InvalidStep(ticket.step.clone()))?;

    if ticket.has_operated(req.actor) {
        return Err(ApprovalError::AlreadyApproved);
    }
    if !(req.is_admin || ticket.is_operator(req.actor)) {
        return Err(ApprovalError::OperatorNotInOperatorList(req.actor.to_owned()));
    }

    // Duplicate (step, operation) edges are interchangeable; the first wins.
    let edge = current
        .next
        .iter()
        .find(|e| e.step == req.next_step && e.operation == req.operation)
        .ok_or_else(|| ApprovalError::InvalidStep(req.next_step.to_owned()))?;

    let target = req
        .steps
        .get(&edge.step)
        .ok_or_else(|| ApprovalError::InvalidStep(edge.step.clone()))?;

    let sign_type = current
        .disposal
        .kind()
        .ok_or_else(|| ApprovalError::InvalidStep(current.step.clone()))?;

    let updated = sign_type.apply(
        ticket.clone(),
        SignContext {
            actor: req.actor,
            joint_sign_rate: current.disposal.joint_sign_rate,
            target,
            end_steps: req.end_steps,
        },
    );

    if updated.step != ticket.step || updated.status != TicketStatus::Running {
        info!(
            "ticket '{}' moved '{}' -> '{}' via '{}' ({})",
            updated.uid, ticket.step, updated.step, req.operation, updated.status
        );
    } else {
        debug!("'{}' recorded on step '{}' ({})", req.actor, ticket.step, sign_type);
    }

    Ok(updated)
}

impl ValidatedTemplate {
    /// Start a new ticket at the template's start step.
    pub fn open_ticket(&self, order_num: impl Into<String>, name: impl Into<String>) -> Ticket {
        let start = self.start_step();
        let operator = self
            .step(start)
            .map(|s| s.operator.clone())
            .unwrap_or_default();

        Ticket {
            order_num: order_num.into(),
            name: name.into(),
            status: TicketStatus::Running,
            uid: Uuid::new_v4().to_string(),
            step: start.to_owned(),
            operator,
            operated_user: Vec::new(),
            memo: String::new(),
        }
    }

    /// Advance `ticket` using this template's steps and end steps.
    pub fn advance(
        &self,
        ticket: &Ticket,
        next_step: &str,
        operation: &str,
        actor: &str,
        is_admin: bool,
    ) -> Result<Ticket, ApprovalError> {
        advance(AdvanceRequest {
            next_step,
            operation,
            actor,
            is_admin,
            end_steps: self.end_steps(),
            ticket,
            steps: self.steps(),
        })
    }
}
