//! Integration tests for the store port contract, driven against the
//! in-memory adapter. These pin down the cross-cutting behaviors every
//! `StoreService` implementation must share: ownership scoping, the
//! ledger invariant, sharing visibility, and cascade semantics.

use api_lib::adapters::MemoryStore;
use studyhub_core::domain::{
    NewAccount, NewExpense, NewHomework, NewNote, NewStudySession, NewTodo, Polarity,
    ShareAction,
};
use studyhub_core::ports::{PortError, StoreService};
use uuid::Uuid;

async fn signup(store: &MemoryStore, username: &str) -> Uuid {
    store
        .create_account(
            NewAccount {
                username: username.to_string(),
                password: "correct horse".to_string(),
            },
            "$argon2id$stub",
        )
        .await
        .expect("account creation should succeed")
        .id
}

fn sample_note() -> NewNote {
    NewNote {
        title: "Mitosis".to_string(),
        body: "Prophase, metaphase, anaphase, telophase.".to_string(),
    }
}

fn sample_homework() -> NewHomework {
    NewHomework {
        subject: "Biology".to_string(),
        title: "Chapter 4 questions".to_string(),
        description: String::new(),
        due_at: chrono::Utc::now(),
    }
}

//=========================================================================================
// Ownership scoping
//=========================================================================================

#[tokio::test]
async fn entities_of_other_accounts_read_as_not_found() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let bob = signup(&store, "bob").await;

    let note = store.create_note(alice, sample_note()).await.unwrap();
    let hw = store.create_homework(alice, sample_homework()).await.unwrap();
    let todo = store
        .create_todo(
            alice,
            NewTodo {
                title: "buy pens".to_string(),
            },
        )
        .await
        .unwrap();
    let session = store
        .create_study_session(
            alice,
            NewStudySession {
                subject: "Math".to_string(),
                duration_minutes: 25,
            },
        )
        .await
        .unwrap();

    // Reads and mutations through the wrong account are uniformly NotFound,
    // never a permission error that would disclose existence.
    assert!(matches!(
        store.get_note(bob, note.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        store.delete_note(bob, note.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        store.toggle_homework(bob, hw.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        store.toggle_todo(bob, todo.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        store.complete_study_session(bob, session.id).await,
        Err(PortError::NotFound(_))
    ));

    // Listings never leak across accounts.
    assert!(store.list_notes(bob).await.unwrap().is_empty());
    assert!(store.list_homework(bob).await.unwrap().is_empty());

    // And nothing above disturbed the owner's view.
    assert_eq!(store.list_notes(alice).await.unwrap().len(), 1);
    assert!(!store.get_note(alice, note.id).await.unwrap().title.is_empty());
}

#[tokio::test]
async fn duplicate_usernames_are_rejected() {
    let store = MemoryStore::new();
    signup(&store, "alice").await;

    let err = store
        .create_account(
            NewAccount {
                username: "alice".to_string(),
                password: "another pass".to_string(),
            },
            "$argon2id$stub",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Validation { field: "username", .. }));
}

//=========================================================================================
// Wallet ledger
//=========================================================================================

#[tokio::test]
async fn wallet_totals_track_the_ledger() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    // The profile is created lazily at zero.
    let fresh = store.get_or_create_wallet(alice).await.unwrap();
    assert_eq!(fresh.income, 0.0);
    assert_eq!(fresh.expenses, 0.0);
    assert_eq!(fresh.balance, 0.0);

    store
        .record_expense(
            alice,
            NewExpense {
                name: "Books".to_string(),
                amount: 100.0,
                polarity: Polarity::Negative,
            },
        )
        .await
        .unwrap();
    let (_, profile) = store
        .record_expense(
            alice,
            NewExpense {
                name: "Refund".to_string(),
                amount: 30.0,
                polarity: Polarity::Positive,
            },
        )
        .await
        .unwrap();

    assert_eq!(profile.income, 30.0);
    assert_eq!(profile.expenses, 100.0);
    assert_eq!(profile.balance, -70.0);
    assert_eq!(profile.balance, profile.income - profile.expenses);

    // Two entries in the ledger, newest first.
    let entries = store.list_expenses(alice).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Refund");
}

#[tokio::test]
async fn invalid_expense_leaves_no_trace() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    let err = store
        .record_expense(
            alice,
            NewExpense {
                name: "Bad".to_string(),
                amount: -5.0,
                polarity: Polarity::Negative,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Validation { field: "amount", .. }));

    assert!(store.list_expenses(alice).await.unwrap().is_empty());
    let profile = store.get_or_create_wallet(alice).await.unwrap();
    assert_eq!(profile.balance, 0.0);
}

//=========================================================================================
// Toggles
//=========================================================================================

#[tokio::test]
async fn toggle_is_its_own_inverse() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    let hw = store.create_homework(alice, sample_homework()).await.unwrap();
    assert!(!hw.is_finished);

    let once = store.toggle_homework(alice, hw.id).await.unwrap();
    assert!(once.is_finished);
    let twice = store.toggle_homework(alice, hw.id).await.unwrap();
    assert!(!twice.is_finished);

    let todo = store
        .create_todo(
            alice,
            NewTodo {
                title: "laundry".to_string(),
            },
        )
        .await
        .unwrap();
    let once = store.toggle_todo(alice, todo.id).await.unwrap();
    let twice = store.toggle_todo(alice, todo.id).await.unwrap();
    assert!(once.is_finished);
    assert!(!twice.is_finished);
}

//=========================================================================================
// Study sessions
//=========================================================================================

#[tokio::test]
async fn completing_a_session_is_idempotent() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    let session = store
        .create_study_session(
            alice,
            NewStudySession {
                subject: "Chemistry".to_string(),
                duration_minutes: 45,
            },
        )
        .await
        .unwrap();
    assert!(!session.completed);
    assert!(session.ended_at.is_none());

    let first = store.complete_study_session(alice, session.id).await.unwrap();
    assert!(first.completed);
    let stamp = first.ended_at.expect("completion stamps ended_at");

    // The second completion is a no-op and keeps the original stamp.
    let second = store.complete_study_session(alice, session.id).await.unwrap();
    assert!(second.completed);
    assert_eq!(second.ended_at, Some(stamp));
}

//=========================================================================================
// Sharing graph
//=========================================================================================

#[tokio::test]
async fn grants_are_visible_only_to_the_grantee() {
    let store = MemoryStore::new();
    let u = signup(&store, "ursula").await;
    let v = signup(&store, "victor").await;
    let w = signup(&store, "wanda").await;

    let note = store.create_note(u, sample_note()).await.unwrap();
    store
        .share_note(u, note.id, ShareAction::GrantTo("victor".to_string()))
        .await
        .unwrap();

    // The grantee can read the note and sees it in the shared view.
    assert!(store.get_note(v, note.id).await.is_ok());
    assert_eq!(store.shared_with_me(v).await.unwrap().len(), 1);

    // A third account sees nothing.
    assert!(matches!(
        store.get_note(w, note.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(store.shared_with_me(w).await.unwrap().is_empty());

    // The sharer's own view lists the share, not shared_with_me.
    assert_eq!(store.my_shared_notes(u).await.unwrap().len(), 1);
    assert!(store.shared_with_me(u).await.unwrap().is_empty());
}

#[tokio::test]
async fn publishing_opens_the_note_and_is_monotonic() {
    let store = MemoryStore::new();
    let u = signup(&store, "ursula").await;
    let w = signup(&store, "wanda").await;

    let note = store.create_note(u, sample_note()).await.unwrap();
    let share = store
        .share_note(u, note.id, ShareAction::MakePublic)
        .await
        .unwrap();
    assert!(share.is_public);

    assert!(store.get_note(w, note.id).await.is_ok());
    assert_eq!(store.shared_with_me(w).await.unwrap().len(), 1);

    // A later grant reuses the same share row and leaves is_public set.
    let again = store
        .share_note(u, note.id, ShareAction::GrantTo("wanda".to_string()))
        .await
        .unwrap();
    assert_eq!(again.id, share.id);
    assert!(again.is_public);
}

#[tokio::test]
async fn regranting_and_self_granting_do_not_grow_the_grant_set() {
    let store = MemoryStore::new();
    let u = signup(&store, "ursula").await;
    signup(&store, "victor").await;

    let note = store.create_note(u, sample_note()).await.unwrap();
    store
        .share_note(u, note.id, ShareAction::GrantTo("victor".to_string()))
        .await
        .unwrap();
    let repeated = store
        .share_note(u, note.id, ShareAction::GrantTo("victor".to_string()))
        .await
        .unwrap();
    assert_eq!(repeated.shared_with.len(), 1);

    // Sharing with yourself is accepted but grants nothing.
    let selfie = store
        .share_note(u, note.id, ShareAction::GrantTo("ursula".to_string()))
        .await
        .unwrap();
    assert_eq!(selfie.shared_with.len(), 1);
}

#[tokio::test]
async fn sharing_requires_ownership_and_a_real_grantee() {
    let store = MemoryStore::new();
    let u = signup(&store, "ursula").await;
    let v = signup(&store, "victor").await;

    let note = store.create_note(u, sample_note()).await.unwrap();

    assert!(matches!(
        store
            .share_note(v, note.id, ShareAction::MakePublic)
            .await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        store
            .share_note(u, note.id, ShareAction::GrantTo("nobody".to_string()))
            .await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_a_note_hides_its_share_rows() {
    let store = MemoryStore::new();
    let u = signup(&store, "ursula").await;
    let v = signup(&store, "victor").await;

    let note = store.create_note(u, sample_note()).await.unwrap();
    store
        .share_note(u, note.id, ShareAction::GrantTo("victor".to_string()))
        .await
        .unwrap();
    assert_eq!(store.shared_with_me(v).await.unwrap().len(), 1);

    store.delete_note(u, note.id).await.unwrap();

    // The dangling share row is never materialized into either view.
    assert!(store.shared_with_me(v).await.unwrap().is_empty());
    assert!(store.my_shared_notes(u).await.unwrap().is_empty());
    assert!(matches!(
        store.get_note(v, note.id).await,
        Err(PortError::NotFound(_))
    ));
}

//=========================================================================================
// Account deletion
//=========================================================================================

#[tokio::test]
async fn deleting_an_account_cascades_to_everything_it_owns() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let bob = signup(&store, "bob").await;

    let note = store.create_note(alice, sample_note()).await.unwrap();
    store.create_homework(alice, sample_homework()).await.unwrap();
    store
        .record_expense(
            alice,
            NewExpense {
                name: "Lunch".to_string(),
                amount: 12.5,
                polarity: Polarity::Negative,
            },
        )
        .await
        .unwrap();
    store
        .share_note(alice, note.id, ShareAction::GrantTo("bob".to_string()))
        .await
        .unwrap();

    // Bob grants Alice access to one of his notes; that note must survive.
    let bobs_note = store.create_note(bob, sample_note()).await.unwrap();
    store
        .share_note(bob, bobs_note.id, ShareAction::GrantTo("alice".to_string()))
        .await
        .unwrap();

    store.delete_account(alice).await.unwrap();

    assert!(matches!(
        store.get_account_by_username("alice").await,
        Err(PortError::NotFound(_))
    ));
    assert!(store.shared_with_me(bob).await.unwrap().is_empty());
    assert!(store.get_note(bob, bobs_note.id).await.is_ok());

    // Bob's share row survives, but Alice's revoked grant means the note is
    // no longer listed for anyone.
    let bob_shares = store.my_shared_notes(bob).await.unwrap();
    assert_eq!(bob_shares.len(), 1);
}
