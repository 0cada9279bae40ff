//! crates/studyhub_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::{PortError, PortResult};

//=========================================================================================
// Accounts and Authentication
//=========================================================================================

/// An authenticated principal. Every other entity is owned by exactly one account.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
}

// Only used internally for login/signup - contains sensitive data.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub account_id: Uuid,
    pub username: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie).
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub account_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Signup input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
}

impl NewAccount {
    pub fn validate(&self) -> PortResult<()> {
        if self.username.trim().is_empty() {
            return Err(PortError::validation("username", "username must not be empty"));
        }
        if self.password.len() < 8 {
            return Err(PortError::validation(
                "password",
                "password must be at least 8 characters",
            ));
        }
        Ok(())
    }
}

//=========================================================================================
// Notes
//=========================================================================================

/// A free-text note. Visible to the owner, to accounts it was shared with,
/// and to everyone once a share row marks it public.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub body: String,
}

impl NewNote {
    pub fn validate(&self) -> PortResult<()> {
        if self.title.trim().is_empty() {
            return Err(PortError::validation("title", "title must not be empty"));
        }
        Ok(())
    }
}

//=========================================================================================
// Homework and Todos
//=========================================================================================

/// A homework item. Listing is ordered by due date; `is_finished` flips
/// freely via the toggle operation.
#[derive(Debug, Clone, Serialize)]
pub struct Homework {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub subject: String,
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
    pub is_finished: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHomework {
    pub subject: String,
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
}

impl NewHomework {
    pub fn validate(&self) -> PortResult<()> {
        if self.subject.trim().is_empty() {
            return Err(PortError::validation("subject", "subject must not be empty"));
        }
        if self.title.trim().is_empty() {
            return Err(PortError::validation("title", "title must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Todo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub is_finished: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
    pub title: String,
}

impl NewTodo {
    pub fn validate(&self) -> PortResult<()> {
        if self.title.trim().is_empty() {
            return Err(PortError::validation("title", "title must not be empty"));
        }
        Ok(())
    }
}

//=========================================================================================
// Wallet Ledger
//=========================================================================================

/// Direction of a ledger entry: `Positive` is income, `Negative` is spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "Positive",
            Polarity::Negative => "Negative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Positive" => Some(Polarity::Positive),
            "Negative" => Some(Polarity::Negative),
            _ => None,
        }
    }
}

/// Per-account wallet totals, maintained incrementally as expenses are
/// recorded. Invariant: `balance == income - expenses`.
#[derive(Debug, Clone, Serialize)]
pub struct WalletProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

impl WalletProfile {
    /// A fresh profile with all totals at zero.
    pub fn empty(id: Uuid, owner_id: Uuid) -> Self {
        Self {
            id,
            owner_id,
            income: 0.0,
            expenses: 0.0,
            balance: 0.0,
        }
    }

    /// Folds one ledger entry into the running totals.
    pub fn apply(&mut self, polarity: Polarity, amount: f64) {
        match polarity {
            Polarity::Positive => {
                self.income += amount;
                self.balance += amount;
            }
            Polarity::Negative => {
                self.expenses += amount;
                self.balance -= amount;
            }
        }
    }
}

/// One append-only ledger entry.
#[derive(Debug, Clone, Serialize)]
pub struct Expense {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub polarity: Polarity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub name: String,
    pub amount: f64,
    pub polarity: Polarity,
}

impl NewExpense {
    pub fn validate(&self) -> PortResult<()> {
        if self.name.trim().is_empty() {
            return Err(PortError::validation("name", "name must not be empty"));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(PortError::validation("amount", "amount must be positive"));
        }
        Ok(())
    }
}

//=========================================================================================
// Chatbot History
//=========================================================================================

/// One prompt/response exchange with the chatbot, listed newest-first.
#[derive(Debug, Clone, Serialize)]
pub struct ChatEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub prompt: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Study Sessions
//=========================================================================================

/// A timed study block. `completed = false` means the session is still in
/// progress; completing it is a one-way transition that stamps `ended_at`.
#[derive(Debug, Clone, Serialize)]
pub struct StudySession {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub subject: String,
    pub duration_minutes: i32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudySession {
    pub subject: String,
    pub duration_minutes: i32,
}

impl NewStudySession {
    pub fn validate(&self) -> PortResult<()> {
        if self.subject.trim().is_empty() {
            return Err(PortError::validation("subject", "subject must not be empty"));
        }
        if self.duration_minutes < 1 {
            return Err(PortError::validation(
                "duration_minutes",
                "duration must be at least 1 minute",
            ));
        }
        Ok(())
    }
}

//=========================================================================================
// Sharing Graph
//=========================================================================================

/// What a share request asks for. Making a note public is monotonic; there
/// is no unpublish action.
#[derive(Debug, Clone)]
pub enum ShareAction {
    MakePublic,
    GrantTo(String),
}

/// The share row for one (note, sharer) pair: a grant set plus a public flag.
#[derive(Debug, Clone, Serialize)]
pub struct SharedNote {
    pub id: Uuid,
    pub note_id: Uuid,
    pub shared_by: Uuid,
    pub shared_with: Vec<Uuid>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// A share row joined with its note and sharer, as listed by the
/// shared-notes views. Dangling share rows (note deleted) are never
/// materialized into this shape.
#[derive(Debug, Clone, Serialize)]
pub struct SharedNoteView {
    pub share_id: Uuid,
    pub note: Note,
    pub shared_by_username: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// External Lookup Results
//=========================================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DictionaryEntry {
    pub word: String,
    pub phonetics: Option<String>,
    pub audio: Option<String>,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EncyclopediaPage {
    pub title: String,
    pub url: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookResult {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i64>,
    pub categories: Vec<String>,
    pub thumbnail: Option<String>,
    pub preview_link: Option<String>,
}
