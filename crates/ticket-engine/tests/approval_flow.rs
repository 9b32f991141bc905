//! End-to-end tests through the public API: load a stored JSON template,
//! open a ticket, and drive it to completion.

use serde_json::json;

use ticket_engine::{
    load_template, EngineError, TemplateError, Ticket, TicketStatus, ValidatedTemplate,
};

/// Purchase order: manager sign-off (anyone), finance quorum (2/3),
/// then the CFO.
fn purchase_order_json() -> serde_json::Value {
    json!({
        "uid": "purchase-order",
        "name": "Purchase order",
        "start_step": "manager",
        "end_step": ["ordered", "refused"],
        "builtin": true,
        "config": [
            {
                "step": "manager",
                "state": "pending",
                "operator": ["mia", "max"],
                "next": [
                    { "step": "finance", "operation": "approve" },
                    { "step": "refused", "operation": "reject" }
                ],
                "disposal": { "sign_type": "anyone_sign" }
            },
            {
                "step": "finance",
                "state": "pending",
                "operator": ["fay", "fin", "flo"],
                "next": [
                    { "step": "cfo", "operation": "approve" },
                    { "step": "refused", "operation": "reject" }
                ],
                "disposal": { "sign_type": "jointly_sign", "joint_sign_rate": 0.66 }
            },
            {
                "step": "cfo",
                "state": "pending",
                "operator": ["cleo"],
                "next": [
                    { "step": "ordered", "operation": "approve" },
                    { "step": "refused", "operation": "reject" }
                ],
                "disposal": { "sign_type": "serial_sign" }
            },
            { "step": "ordered", "state": "done", "disposal": { "sign_type": "anyone_sign" } },
            { "step": "refused", "state": "done", "disposal": { "sign_type": "anyone_sign" } }
        ]
    })
}

fn load(value: serde_json::Value) -> Result<ValidatedTemplate, EngineError> {
    load_template(&value.to_string())
}

#[test]
fn purchase_order_is_approved_end_to_end() {
    let flow = load(purchase_order_json()).expect("template should load");
    assert!(flow.template().builtin);

    let ticket = flow.open_ticket("PO-7", "Laptops");
    assert_eq!(ticket.operator, vec!["mia", "max"]);

    let ticket = flow.advance(&ticket, "finance", "approve", "max", false).unwrap();
    assert_eq!(ticket.step, "finance");
    assert_eq!(ticket.operator, vec!["fay", "fin", "flo"]);

    // 1/3 < 0.66, then 2/3 >= 0.66.
    let ticket = flow.advance(&ticket, "cfo", "approve", "fin", false).unwrap();
    assert_eq!(ticket.step, "finance");
    assert_eq!(ticket.operated_user, vec!["fin"]);

    let ticket = flow.advance(&ticket, "cfo", "approve", "flo", false).unwrap();
    assert_eq!(ticket.step, "cfo");
    assert_eq!(ticket.operator, vec!["cleo"]);
    assert!(ticket.operated_user.is_empty());

    let ticket = flow.advance(&ticket, "ordered", "approve", "cleo", false).unwrap();
    assert_eq!(ticket.step, "ordered");
    assert_eq!(ticket.status, TicketStatus::Passed);
    assert!(ticket.operator.is_empty());
    assert!(ticket.operated_user.is_empty());
}

#[test]
fn stored_ticket_round_trips_through_json() {
    let flow = load(purchase_order_json()).unwrap();
    let ticket = flow.open_ticket("PO-8", "Desks");
    let ticket = flow.advance(&ticket, "finance", "approve", "mia", false).unwrap();
    let ticket = flow.advance(&ticket, "cfo", "approve", "fay", false).unwrap();

    let stored = serde_json::to_string(&ticket).unwrap();
    let restored: Ticket = serde_json::from_str(&stored).unwrap();
    assert_eq!(restored, ticket);

    // A replayed vote on the restored copy is still refused.
    assert!(matches!(
        flow.advance(&restored, "cfo", "approve", "fay", false),
        Err(ticket_engine::ApprovalError::AlreadyApproved)
    ));
}

#[test]
fn template_with_unknown_sign_type_is_refused_on_load() {
    let mut value = purchase_order_json();
    value["config"][2]["disposal"]["sign_type"] = json!("majority_sign");
    assert!(matches!(
        load(value),
        Err(EngineError::Template(TemplateError::BadSignType { step, .. })) if step == "cfo"
    ));
}

#[test]
fn template_with_dangling_edge_is_refused_on_load() {
    let mut value = purchase_order_json();
    value["config"][1]["next"][0]["step"] = json!("treasury");
    assert!(matches!(
        load(value),
        Err(EngineError::Template(TemplateError::UnreachableSteps(ids))) if ids == vec!["treasury"]
    ));
}

#[test]
fn missing_start_step_is_a_structural_error() {
    let value = json!({
        "uid": "x",
        "end_step": ["a"],
        "config": [{ "step": "a", "disposal": { "sign_type": "anyone_sign" } }]
    });
    assert!(matches!(
        load(value),
        Err(EngineError::Template(TemplateError::StartStepEmpty))
    ));
}

#[test]
fn edge_without_target_is_a_structural_error() {
    let value = json!({
        "uid": "x",
        "start_step": "a",
        "end_step": ["b"],
        "config": [
            { "step": "a", "next": [{ "operation": "approve" }],
              "disposal": { "sign_type": "anyone_sign" } },
            { "step": "b", "disposal": { "sign_type": "anyone_sign" } }
        ]
    });
    assert!(matches!(
        load(value),
        Err(EngineError::Template(TemplateError::BadNextStep(step))) if step == "a"
    ));
}

#[test]
fn step_without_identifier_is_a_structural_error() {
    let mut value = purchase_order_json();
    value["config"][2]
        .as_object_mut()
        .expect("step is an object")
        .remove("step");
    assert!(matches!(
        load(value),
        Err(EngineError::Template(TemplateError::BadStepConfig))
    ));
}
