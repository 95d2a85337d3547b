//! Behaviour every `OperationStore` must share
//!
//! Each check uses fresh ids so the suite can run against a shared database.

use pretty_assertions::assert_eq;
use uuid::Uuid;

use splitsync::backend::storage::{StoreError, UnitOfWork};
use splitsync::backend::sync::store::{decode_all, OperationRecord, OperationStore, PushOperation};
use splitsync::shared::operations::{
    BindUser, CreateSpending, CreateSpendingGroup, CreateUser, DeleteSpending, DeleteSpendingGroup,
    Operation, OperationPayload, OperationPayloadType, OperationType, TrackedEntity, UpdateAvatar,
    UpdateDisplayName, UpdateEmail, UploadImage, VerifyEmail,
};

pub fn create_user(user_id: Uuid, name: &str, created_at: i64) -> PushOperation {
    PushOperation::resolve(Operation::new(
        Uuid::new_v4(),
        created_at,
        user_id,
        OperationPayload::CreateUser(CreateUser {
            user_id,
            display_name: name.to_string(),
        }),
    ))
}

pub fn create_group(author: Uuid, group_id: Uuid, participants: Vec<Uuid>, created_at: i64) -> PushOperation {
    PushOperation::resolve(Operation::new(
        Uuid::new_v4(),
        created_at,
        author,
        OperationPayload::CreateSpendingGroup(CreateSpendingGroup {
            group_id,
            name: "Trip".to_string(),
            participants,
        }),
    ))
}

pub fn create_spending(author: Uuid, group_id: Uuid, created_at: i64) -> PushOperation {
    PushOperation::resolve(Operation::new(
        Uuid::new_v4(),
        created_at,
        author,
        OperationPayload::CreateSpending(CreateSpending {
            spending_id: Uuid::new_v4(),
            group_id,
            name: "Dinner".to_string(),
            amount: 4200,
            currency: "EUR".to_string(),
            payer_id: author,
            participants: Vec::new(),
        }),
    ))
}

fn ids(records: &[OperationRecord]) -> Vec<Uuid> {
    records.iter().map(|record| record.operation_id).collect()
}

/// Push, pull on another device, confirm, pull again
pub async fn push_pull_confirm(store: &dyn OperationStore) {
    let alice = Uuid::new_v4();
    let signup = create_user(alice, "Alice", 1);
    let signup_id = signup.operation.operation_id;

    store.push(vec![signup], alice, "phone", true).perform().await.unwrap();

    assert!(store.pull(alice, "phone", OperationType::Regular).await.unwrap().is_empty());
    let laptop = store.pull(alice, "laptop", OperationType::Regular).await.unwrap();
    assert_eq!(ids(&laptop), vec![signup_id]);

    let decoded = decode_all(&laptop).unwrap();
    assert_eq!(decoded[0].author_id, alice);

    store.confirm(&[signup_id], alice, "laptop").await.perform().await.unwrap();
    assert!(store.pull(alice, "laptop", OperationType::Regular).await.unwrap().is_empty());
}

/// Group creation binds every member; later spendings reach all of them
pub async fn group_fan_out(store: &dyn OperationStore) {
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let outsider = Uuid::new_v4();
    let group_id = Uuid::new_v4();

    store
        .push(
            vec![create_user(alice, "Alice", 1), create_user(bob, "Bob", 2), create_user(outsider, "Olive", 3)],
            alice,
            "phone",
            false,
        )
        .perform()
        .await
        .unwrap();

    let group = create_group(alice, group_id, vec![alice, bob], 10);
    let spending = create_spending(bob, group_id, 20);
    let (group_op, spending_op) = (group.operation.operation_id, spending.operation.operation_id);
    store.push(vec![group, spending], alice, "phone", false).perform().await.unwrap();

    let mut watchers = store.get_users(&[TrackedEntity::spending_group(group_id)]).await.unwrap();
    watchers.sort();
    let mut expected = vec![alice, bob];
    expected.sort();
    assert_eq!(watchers, expected);

    let bob_view = ids(&store.pull(bob, "bob-phone", OperationType::Regular).await.unwrap());
    assert!(bob_view.contains(&group_op));
    assert!(bob_view.contains(&spending_op));

    let outsider_view = ids(&store.pull(outsider, "o-phone", OperationType::Regular).await.unwrap());
    assert!(!outsider_view.contains(&group_op));
    assert!(!outsider_view.contains(&spending_op));

    let history = ids(&store.get(&[TrackedEntity::spending_group(group_id)]).await.unwrap());
    assert_eq!(history, vec![group_op, spending_op]);
}

/// A conflicting id anywhere in the batch leaves nothing behind
pub async fn conflicting_batch_is_atomic(store: &dyn OperationStore) {
    let alice = Uuid::new_v4();
    let first = create_user(alice, "Alice", 1);
    let replay = first.clone();
    store.push(vec![first], alice, "phone", false).perform().await.unwrap();

    let group_id = Uuid::new_v4();
    let group = create_group(alice, group_id, vec![alice], 2);
    let result = store.push(vec![group, replay], alice, "phone", false).perform().await;
    assert!(matches!(result, Err(StoreError::Conflict { .. })));

    assert!(store.get(&[TrackedEntity::spending_group(group_id)]).await.unwrap().is_empty());
    assert!(store.get_users(&[TrackedEntity::spending_group(group_id)]).await.unwrap().is_empty());
}

/// Rollback removes exactly what the push added
pub async fn push_rollback(store: &dyn OperationStore) {
    let alice = Uuid::new_v4();
    store.push(vec![create_user(alice, "Alice", 1)], alice, "phone", true).perform().await.unwrap();

    let rename = PushOperation::resolve(Operation::new(
        Uuid::new_v4(),
        2,
        alice,
        OperationPayload::UpdateDisplayName(UpdateDisplayName {
            user_id: alice,
            display_name: "Ally".to_string(),
        }),
    ));
    let unit = store.push(vec![rename], alice, "phone", true);
    unit.perform().await.unwrap();
    assert_eq!(store.get(&[TrackedEntity::user(alice)]).await.unwrap().len(), 2);

    unit.rollback().await.unwrap();
    let history = store.get(&[TrackedEntity::user(alice)]).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].payload_type, OperationPayloadType::CreateUser);
    assert_eq!(store.get_users(&[TrackedEntity::user(alice)]).await.unwrap(), vec![alice]);
}

/// Confirm rollback only forgets confirmations it made
pub async fn confirm_rollback(store: &dyn OperationStore) {
    let alice = Uuid::new_v4();
    let first = create_user(alice, "Alice", 1);
    let first_id = first.operation.operation_id;
    store.push(vec![first], alice, "phone", false).perform().await.unwrap();

    store.confirm(&[first_id], alice, "phone").await.perform().await.unwrap();

    let unit = store.confirm(&[first_id, Uuid::new_v4()], alice, "phone").await;
    unit.perform().await.unwrap();
    unit.rollback().await.unwrap();

    assert!(store.pull(alice, "phone", OperationType::Regular).await.unwrap().is_empty());
}

/// Rolling back a unit that never ran leaves later confirmations alone
pub async fn abandoned_confirm_rollback(store: &dyn OperationStore) {
    let alice = Uuid::new_v4();
    let signup = create_user(alice, "Alice", 1);
    let signup_id = signup.operation.operation_id;
    store.push(vec![signup], alice, "phone", true).perform().await.unwrap();

    let abandoned = store.confirm(&[signup_id], alice, "laptop").await;
    store.confirm(&[signup_id], alice, "laptop").await.perform().await.unwrap();
    abandoned.rollback().await.unwrap();

    assert!(store.pull(alice, "laptop", OperationType::Regular).await.unwrap().is_empty());
}

/// One payload of every kind, all about fresh entities
pub fn every_payload_kind(alice: Uuid) -> Vec<OperationPayload> {
    let (group_id, spending_id, image_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    vec![
        OperationPayload::CreateUser(CreateUser {
            user_id: alice,
            display_name: "Alice".to_string(),
        }),
        OperationPayload::UpdateDisplayName(UpdateDisplayName {
            user_id: alice,
            display_name: "Ally".to_string(),
        }),
        OperationPayload::UploadImage(UploadImage {
            image_id,
            content_type: "image/png".to_string(),
            data: "aGk=".to_string(),
        }),
        OperationPayload::BindUser(BindUser {
            old_id: Uuid::new_v4(),
            new_id: alice,
        }),
        OperationPayload::UpdateAvatar(UpdateAvatar { user_id: alice, image_id }),
        OperationPayload::CreateSpendingGroup(CreateSpendingGroup {
            group_id,
            name: "Trip".to_string(),
            participants: vec![alice],
        }),
        OperationPayload::CreateSpending(CreateSpending {
            spending_id,
            group_id,
            name: "Café".to_string(),
            amount: -350,
            currency: "EUR".to_string(),
            payer_id: alice,
            participants: vec![alice],
        }),
        OperationPayload::DeleteSpending(DeleteSpending { spending_id, group_id }),
        OperationPayload::DeleteSpendingGroup(DeleteSpendingGroup { group_id }),
        OperationPayload::UpdateEmail(UpdateEmail {
            user_id: alice,
            email: "alice@example.com".to_string(),
        }),
        OperationPayload::VerifyEmail(VerifyEmail {
            user_id: alice,
            email: "alice@example.com".to_string(),
        }),
    ]
}

/// Stored bytes come back exactly as serialized, for every payload kind
pub async fn stored_data_is_verbatim(store: &dyn OperationStore) {
    let alice = Uuid::new_v4();
    let operations: Vec<Operation> = every_payload_kind(alice)
        .into_iter()
        .enumerate()
        .map(|(i, payload)| Operation::new(Uuid::new_v4(), i as i64 + 1, alice, payload))
        .collect();
    let pushes = operations.iter().cloned().map(PushOperation::resolve).collect();
    store.push(pushes, alice, "phone", false).perform().await.unwrap();

    for operation in &operations {
        let expected = OperationRecord::from_operation(operation).unwrap();
        let stored = store.get(&operation.tracked_entities()).await.unwrap();
        let record = stored
            .iter()
            .find(|record| record.operation_id == operation.operation_id)
            .unwrap_or_else(|| panic!("{} not stored", expected.payload_type));

        assert_eq!(record.data, expected.data, "{}", expected.payload_type);
        assert_eq!(record.payload_type, expected.payload_type);
        assert_eq!(record.is_large, expected.is_large);
        assert_eq!(record.decode().unwrap(), *operation);
    }
}

/// Large payloads only travel on the large channel
pub async fn large_channel(store: &dyn OperationStore) {
    let alice = Uuid::new_v4();
    let image_id = Uuid::new_v4();
    store.push(vec![create_user(alice, "Alice", 1)], alice, "phone", false).perform().await.unwrap();

    let upload = PushOperation::new(
        Operation::new(
            Uuid::new_v4(),
            2,
            alice,
            OperationPayload::UploadImage(UploadImage {
                image_id,
                content_type: "image/png".to_string(),
                data: "aGk=".to_string(),
            }),
        ),
        vec![splitsync::backend::sync::EntityBindAction::new(
            TrackedEntity::image(image_id),
            vec![alice],
        )],
    );
    let upload_id = upload.operation.operation_id;
    store.push(vec![upload], alice, "phone", false).perform().await.unwrap();

    let regular = ids(&store.pull(alice, "phone", OperationType::Regular).await.unwrap());
    let large = ids(&store.pull(alice, "phone", OperationType::Large).await.unwrap());
    assert!(!regular.contains(&upload_id));
    assert_eq!(large, vec![upload_id]);
}

/// Search is a case-insensitive substring match within one payload kind
pub async fn search_by_hint(store: &dyn OperationStore) {
    let alice = Uuid::new_v4();
    let marker = Uuid::new_v4().simple().to_string();
    let name = format!("Alice{}", marker);
    store.push(vec![create_user(alice, &name, 1)], alice, "phone", false).perform().await.unwrap();

    let hits = store
        .search(OperationPayloadType::CreateUser, &marker.to_uppercase())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].search_hint.as_deref(), Some(name.as_str()));

    assert!(store
        .search(OperationPayloadType::CreateUser, &format!("Bob{}", marker))
        .await
        .unwrap()
        .is_empty());
    assert!(store
        .search(OperationPayloadType::UpdateDisplayName, &marker)
        .await
        .unwrap()
        .is_empty());
}

/// Members watch the group and each other, never their own profile via the group
pub async fn group_watchers_exact(store: &dyn OperationStore) {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let group_id = Uuid::new_v4();
    store
        .push(vec![create_group(a, group_id, vec![a, b, c, b], 1)], a, "phone", true)
        .perform()
        .await
        .unwrap();

    let sorted = |mut users: Vec<Uuid>| {
        users.sort();
        users
    };
    assert_eq!(
        sorted(store.get_users(&[TrackedEntity::spending_group(group_id)]).await.unwrap()),
        sorted(vec![a, b, c])
    );
    assert_eq!(
        sorted(store.get_users(&[TrackedEntity::user(a)]).await.unwrap()),
        sorted(vec![b, c])
    );
}
