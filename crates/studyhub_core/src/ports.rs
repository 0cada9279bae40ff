//! crates/studyhub_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Account, AccountCredentials, BookResult, ChatEntry, DictionaryEntry, EncyclopediaPage,
    Expense, Homework, NewAccount, NewExpense, NewHomework, NewNote, NewStudySession, NewTodo,
    Note, ShareAction, SharedNote, SharedNoteView, StudySession, Todo, WalletProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The entity is absent or not visible to the requester. Used uniformly
    /// so that ownership of other accounts' records is never disclosed.
    #[error("Item not found: {0}")]
    NotFound(String),
    /// Malformed or out-of-range input, naming the offending field.
    #[error("Invalid value for {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("Unauthorized")]
    Unauthorized,
    /// A third-party dependency failed, timed out, or returned an
    /// unparseable payload. Never fatal to the request.
    #[error("External service error: {0}")]
    External(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        PortError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Entity Store Port
//=========================================================================================

/// The entity store: owner-scoped CRUD over every entity plus the
/// cross-entity writes (ledger, sharing) that must apply atomically.
///
/// Every method that reads or mutates an owned entity takes the acting
/// account id and intersects with it; entities outside the caller's
/// visibility fail with `PortError::NotFound`.
#[async_trait]
pub trait StoreService: Send + Sync {
    // --- Accounts & Auth ---
    async fn create_account(&self, account: NewAccount, hashed_password: &str)
        -> PortResult<Account>;

    async fn get_account_by_username(&self, username: &str) -> PortResult<AccountCredentials>;

    /// Deletes the account and cascades to everything it owns. Notes merely
    /// shared *with* the account survive; only its grant entries go away.
    async fn delete_account(&self, account_id: Uuid) -> PortResult<()>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        account_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Notes ---
    async fn create_note(&self, owner: Uuid, note: NewNote) -> PortResult<Note>;

    async fn list_notes(&self, owner: Uuid) -> PortResult<Vec<Note>>;

    /// Fetches a single note. Admits the owner, accounts in the note's grant
    /// set, and anyone if a share row marks the note public.
    async fn get_note(&self, requester: Uuid, note_id: Uuid) -> PortResult<Note>;

    async fn delete_note(&self, owner: Uuid, note_id: Uuid) -> PortResult<()>;

    // --- Homework ---
    async fn create_homework(&self, owner: Uuid, homework: NewHomework) -> PortResult<Homework>;

    /// Ordered by due date, soonest first.
    async fn list_homework(&self, owner: Uuid) -> PortResult<Vec<Homework>>;

    async fn toggle_homework(&self, owner: Uuid, homework_id: Uuid) -> PortResult<Homework>;

    async fn delete_homework(&self, owner: Uuid, homework_id: Uuid) -> PortResult<()>;

    // --- Todos ---
    async fn create_todo(&self, owner: Uuid, todo: NewTodo) -> PortResult<Todo>;

    async fn list_todos(&self, owner: Uuid) -> PortResult<Vec<Todo>>;

    async fn toggle_todo(&self, owner: Uuid, todo_id: Uuid) -> PortResult<Todo>;

    async fn delete_todo(&self, owner: Uuid, todo_id: Uuid) -> PortResult<()>;

    // --- Wallet Ledger ---
    /// Idempotent get-or-create: a missing profile is created with all
    /// totals at zero.
    async fn get_or_create_wallet(&self, owner: Uuid) -> PortResult<WalletProfile>;

    /// Appends the expense row and folds it into the wallet profile as a
    /// single atomic unit; if the profile update cannot complete, the
    /// expense insertion is rolled back.
    async fn record_expense(
        &self,
        owner: Uuid,
        entry: NewExpense,
    ) -> PortResult<(Expense, WalletProfile)>;

    async fn list_expenses(&self, owner: Uuid) -> PortResult<Vec<Expense>>;

    // --- Chat History ---
    async fn append_chat_entry(
        &self,
        owner: Uuid,
        prompt: &str,
        response: &str,
    ) -> PortResult<ChatEntry>;

    /// Newest first.
    async fn list_chat_entries(&self, owner: Uuid, limit: usize) -> PortResult<Vec<ChatEntry>>;

    async fn clear_chat_entries(&self, owner: Uuid) -> PortResult<()>;

    // --- Study Sessions ---
    async fn create_study_session(
        &self,
        owner: Uuid,
        session: NewStudySession,
    ) -> PortResult<StudySession>;

    /// Newest first.
    async fn list_study_sessions(&self, owner: Uuid) -> PortResult<Vec<StudySession>>;

    /// One-way transition to `completed = true`, stamping `ended_at`.
    /// Completing an already-completed session is a no-op that leaves the
    /// original `ended_at` in place.
    async fn complete_study_session(
        &self,
        owner: Uuid,
        session_id: Uuid,
    ) -> PortResult<StudySession>;

    async fn delete_study_session(&self, owner: Uuid, session_id: Uuid) -> PortResult<()>;

    // --- Sharing Graph ---
    /// Upserts the (note, sharer) share row and applies the action. Fails
    /// with `NotFound` if the sharer does not own the note or the grantee
    /// username does not resolve; granting to oneself is a no-op.
    async fn share_note(
        &self,
        sharer: Uuid,
        note_id: Uuid,
        action: ShareAction,
    ) -> PortResult<SharedNote>;

    /// Notes shared with the account (granted or public), excluding its own
    /// shares and any share row whose note no longer exists.
    async fn shared_with_me(&self, account_id: Uuid) -> PortResult<Vec<SharedNoteView>>;

    /// The account's own share rows, regardless of public/private state.
    async fn my_shared_notes(&self, account_id: Uuid) -> PortResult<Vec<SharedNoteView>>;

    // --- Health ---
    async fn ping(&self) -> PortResult<()>;
}

//=========================================================================================
// External Service Ports
//=========================================================================================

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Sends a student question to the generative-language model and returns
    /// the reply text.
    async fn reply(&self, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait DictionaryService: Send + Sync {
    async fn define(&self, word: &str) -> PortResult<DictionaryEntry>;
}

#[async_trait]
pub trait EncyclopediaService: Send + Sync {
    async fn summarize(&self, query: &str) -> PortResult<EncyclopediaPage>;
}

#[async_trait]
pub trait BookSearchService: Send + Sync {
    async fn search(&self, query: &str) -> PortResult<Vec<BookResult>>;
}

/// Renders a note into a downloadable document.
pub trait NoteExportService: Send + Sync {
    fn render(&self, note: &Note) -> PortResult<Vec<u8>>;
    fn content_type(&self) -> &'static str;
    fn file_extension(&self) -> &'static str;
}
