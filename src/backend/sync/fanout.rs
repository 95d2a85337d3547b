/**
 * Fan-out Resolver
 *
 * Maps an incoming operation to the watcher bindings it creates. A binding
 * is "user U tracks entity E": once written, every later operation about E
 * becomes pullable by U.
 *
 * Bindings are write-once at creation time, so only creation-type operations
 * produce any. Everything else rides on the bindings made when its entity
 * was created.
 *
 * Creation ids are taken as given: a create for an entity that already
 * exists still binds its author.
 */
use std::collections::HashSet;
use uuid::Uuid;

use crate::shared::operations::{Operation, OperationPayload, TrackedEntity};

/// Users that must be able to pull future operations about `entity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBindAction {
    pub entity: TrackedEntity,
    pub watchers: Vec<Uuid>,
}

impl EntityBindAction {
    pub fn new(entity: TrackedEntity, watchers: Vec<Uuid>) -> Self {
        Self { entity, watchers }
    }

    /// (watcher, entity) rows to materialize
    pub fn bindings(&self) -> impl Iterator<Item = (Uuid, TrackedEntity)> + '_ {
        self.watchers.iter().map(move |watcher| (*watcher, self.entity))
    }
}

/// Compute the bindings an operation creates
pub fn resolve_bind_actions(operation: &Operation) -> Vec<EntityBindAction> {
    match &operation.payload {
        OperationPayload::CreateUser(payload) => vec![EntityBindAction::new(
            TrackedEntity::user(payload.user_id),
            vec![operation.author_id],
        )],
        OperationPayload::CreateSpendingGroup(payload) => {
            let participants = dedup_watchers(payload.participants.iter().copied());
            let members = dedup_watchers(
                std::iter::once(operation.author_id).chain(participants.iter().copied()),
            );

            let mut actions = Vec::with_capacity(participants.len() + 1);
            actions.push(EntityBindAction::new(
                TrackedEntity::spending_group(payload.group_id),
                members.clone(),
            ));

            // Every member can see every other member's profile timeline
            for participant in &participants {
                let watchers: Vec<Uuid> = members
                    .iter()
                    .copied()
                    .filter(|member| member != participant)
                    .collect();
                if !watchers.is_empty() {
                    actions.push(EntityBindAction::new(TrackedEntity::user(*participant), watchers));
                }
            }

            actions
        }
        _ => Vec::new(),
    }
}

/// Drop repeated ids, keeping first-seen order
pub fn dedup_watchers(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::operations::payload::{
        CreateSpending, CreateSpendingGroup, CreateUser, UpdateDisplayName,
    };
    use pretty_assertions::assert_eq;

    fn operation(author: Uuid, payload: OperationPayload) -> Operation {
        Operation::new(Uuid::new_v4(), 1_700_000_000_000, author, payload)
    }

    fn group_operation(author: Uuid, group: Uuid, participants: Vec<Uuid>) -> Operation {
        operation(
            author,
            OperationPayload::CreateSpendingGroup(CreateSpendingGroup {
                group_id: group,
                name: "Trip".to_string(),
                participants,
            }),
        )
    }

    fn sorted(mut ids: Vec<Uuid>) -> Vec<Uuid> {
        ids.sort();
        ids
    }

    #[test]
    fn test_create_user_binds_author() {
        let author = Uuid::new_v4();
        let op = operation(
            author,
            OperationPayload::CreateUser(CreateUser {
                user_id: author,
                display_name: "Alice".to_string(),
            }),
        );

        let actions = resolve_bind_actions(&op);
        assert_eq!(
            actions,
            vec![EntityBindAction::new(TrackedEntity::user(author), vec![author])]
        );
    }

    #[test]
    fn test_create_spending_group_binds_members() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let group = Uuid::new_v4();
        let actions = resolve_bind_actions(&group_operation(a, group, vec![a, b, c]));

        let group_action = actions
            .iter()
            .find(|action| action.entity == TrackedEntity::spending_group(group))
            .unwrap();
        assert_eq!(sorted(group_action.watchers.clone()), sorted(vec![a, b, c]));

        let a_action = actions
            .iter()
            .find(|action| action.entity == TrackedEntity::user(a))
            .unwrap();
        assert_eq!(sorted(a_action.watchers.clone()), sorted(vec![b, c]));

        let b_action = actions
            .iter()
            .find(|action| action.entity == TrackedEntity::user(b))
            .unwrap();
        assert_eq!(sorted(b_action.watchers.clone()), sorted(vec![a, c]));
    }

    #[test]
    fn test_author_outside_participants_watches_group() {
        let (author, b) = (Uuid::new_v4(), Uuid::new_v4());
        let group = Uuid::new_v4();
        let actions = resolve_bind_actions(&group_operation(author, group, vec![b]));

        assert_eq!(actions.len(), 2);
        assert_eq!(sorted(actions[0].watchers.clone()), sorted(vec![author, b]));
        assert_eq!(actions[1], EntityBindAction::new(TrackedEntity::user(b), vec![author]));
    }

    #[test]
    fn test_repeated_participants_are_deduplicated() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let group = Uuid::new_v4();
        let actions = resolve_bind_actions(&group_operation(a, group, vec![b, b, a, b]));

        // one group action plus one per distinct participant
        assert_eq!(actions.len(), 3);
        for action in &actions {
            let unique: HashSet<Uuid> = action.watchers.iter().copied().collect();
            assert_eq!(unique.len(), action.watchers.len());
        }

        let rows: Vec<(Uuid, TrackedEntity)> = actions.iter().flat_map(|a| a.bindings()).collect();
        let unique_rows: HashSet<(Uuid, TrackedEntity)> = rows.iter().copied().collect();
        assert_eq!(rows.len(), unique_rows.len());
    }

    #[test]
    fn test_other_kinds_bind_nothing() {
        let author = Uuid::new_v4();
        let spending = operation(
            author,
            OperationPayload::CreateSpending(CreateSpending {
                spending_id: Uuid::new_v4(),
                group_id: Uuid::new_v4(),
                name: "Dinner".to_string(),
                amount: 4200,
                currency: "EUR".to_string(),
                payer_id: author,
                participants: vec![author],
            }),
        );
        let rename = operation(
            author,
            OperationPayload::UpdateDisplayName(UpdateDisplayName {
                user_id: author,
                display_name: "Al".to_string(),
            }),
        );

        assert!(resolve_bind_actions(&spending).is_empty());
        assert!(resolve_bind_actions(&rename).is_empty());
    }

    #[test]
    fn test_dedup_watchers_keeps_order() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(dedup_watchers(vec![c, a, c, b, a]), vec![c, a, b]);
    }
}
