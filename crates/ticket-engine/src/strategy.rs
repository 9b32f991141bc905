//! Sign strategies: how one accepted action updates a ticket.
//!
//! Each strategy either completes the current step (moving the ticket along
//! the chosen edge) or records the actor's participation and leaves the step
//! open.  All of them work on an owned copy of the ticket.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{SignType, Step, Ticket, TicketStatus};

/// Inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct SignContext<'a> {
    pub actor: &'a str,
    /// Required share of the roster, only read by [`SignType::JointlySign`].
    pub joint_sign_rate: f32,
    pub target: &'a Step,
    pub end_steps: &'a HashSet<String>,
}

impl SignType {
    /// Apply this discipline to `ticket`.
    pub fn apply(self, ticket: Ticket, ctx: SignContext<'_>) -> Ticket {
        match self {
            Self::AnyoneSign  => anyone_sign(ticket, ctx),
            Self::SerialSign  => serial_sign(ticket, ctx),
            Self::JointlySign => jointly_sign(ticket, ctx),
        }
    }
}

fn anyone_sign(ticket: Ticket, ctx: SignContext<'_>) -> Ticket {
    complete_step(ticket, ctx.target, ctx.end_steps)
}

fn serial_sign(mut ticket: Ticket, ctx: SignContext<'_>) -> Ticket {
    ticket.operator.retain(|u| u != ctx.actor);
    if ticket.operator.is_empty() {
        return complete_step(ticket, ctx.target, ctx.end_steps);
    }

    debug!("serial sign: '{}' signed, {} remaining", ctx.actor, ticket.operator.len());
    ticket.operated_user.push(ctx.actor.to_owned());
    ticket
}

fn jointly_sign(mut ticket: Ticket, ctx: SignContext<'_>) -> Ticket {
    let roster: HashSet<&str> = ticket
        .operator
        .iter()
        .chain(&ticket.operated_user)
        .map(String::as_str)
        .collect();

    // An empty roster means nobody else can vote, so the actor decides.
    let pass_rate = if roster.is_empty() {
        1.0
    } else {
        (1 + ticket.operated_user.len()) as f32 / roster.len() as f32
    };

    if pass_rate >= ctx.joint_sign_rate {
        return complete_step(ticket, ctx.target, ctx.end_steps);
    }

    debug!(
        "jointly sign: '{}' voted, pass rate {:.3} below {:.3}",
        ctx.actor, pass_rate, ctx.joint_sign_rate
    );
    ticket.operator.retain(|u| u != ctx.actor);
    ticket.operated_user.push(ctx.actor.to_owned());
    ticket
}

/// Move the ticket onto `target`.  Reaching an end step passes the ticket;
/// otherwise the roster resets to the target's default operators.
pub fn complete_step(mut ticket: Ticket, target: &Step, end_steps: &HashSet<String>) -> Ticket {
    ticket.step = target.step.clone();
    ticket.operated_user.clear();

    if end_steps.contains(&target.step) {
        ticket.operator.clear();
        ticket.status = TicketStatus::Passed;
    } else {
        ticket.operator = target.operator.clone();
    }
    ticket
}
