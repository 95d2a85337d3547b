/**
 * Display State and Alert Formatting
 *
 * Human-readable names are not stored anywhere except in the log itself.
 * They are rebuilt by replaying the relevant operations in `created_at`
 * order, the last write for an entity winning.
 */
use std::collections::HashMap;
use uuid::Uuid;

use crate::backend::notifications::Alert;
use crate::shared::operations::{Operation, OperationPayload};

pub const UNKNOWN_AUTHOR: &str = "Someone";
pub const UNKNOWN_GROUP: &str = "a group";

/// Current display name per user
pub fn current_display_names(operations: &[Operation]) -> HashMap<Uuid, String> {
    let mut ordered: Vec<&Operation> = operations.iter().collect();
    ordered.sort_by_key(|op| (op.created_at, op.operation_id));

    let mut names = HashMap::new();
    for operation in ordered {
        match &operation.payload {
            OperationPayload::CreateUser(p) => {
                names.insert(p.user_id, p.display_name.clone());
            }
            OperationPayload::UpdateDisplayName(p) => {
                names.insert(p.user_id, p.display_name.clone());
            }
            _ => {}
        }
    }
    names
}

/// Names of spending groups that have not been deleted
pub fn current_group_names(operations: &[Operation]) -> HashMap<Uuid, String> {
    let mut ordered: Vec<&Operation> = operations.iter().collect();
    ordered.sort_by_key(|op| (op.created_at, op.operation_id));

    let mut names = HashMap::new();
    for operation in ordered {
        match &operation.payload {
            OperationPayload::CreateSpendingGroup(p) => {
                names.insert(p.group_id, p.name.clone());
            }
            OperationPayload::DeleteSpendingGroup(p) => {
                names.remove(&p.group_id);
            }
            _ => {}
        }
    }
    names
}

/// Alert for the operations that warrant one. `author_name` and
/// `group_name` come from replay and may be unknown.
pub fn format_alert(
    operation: &Operation,
    author_name: Option<&str>,
    group_name: Option<&str>,
) -> Option<Alert> {
    let author = author_name.unwrap_or(UNKNOWN_AUTHOR);
    let payload = serde_json::json!({
        "operationId": operation.operation_id,
        "type": operation.payload.payload_type().as_str(),
    });

    match &operation.payload {
        OperationPayload::CreateSpendingGroup(p) => Some(Alert {
            title: "New group".to_string(),
            subtitle: p.name.clone(),
            body: format!("{} added you to {}", author, p.name),
            payload,
        }),
        OperationPayload::CreateSpending(p) => {
            let group = group_name.unwrap_or(UNKNOWN_GROUP);
            Some(Alert {
                title: group.to_string(),
                subtitle: p.name.clone(),
                body: format!("{} added {}", author, p.name),
                payload,
            })
        }
        _ => None,
    }
}

/// Whether pushing this operation sends alerts to watchers
pub fn wants_alert(operation: &Operation) -> bool {
    matches!(
        operation.payload,
        OperationPayload::CreateSpendingGroup(_) | OperationPayload::CreateSpending(_)
    )
}
