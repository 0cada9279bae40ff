//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StoreService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every query is owner-scoped in SQL: the acting account id is part of the
//! WHERE clause, so a row belonging to someone else is indistinguishable
//! from a missing row and surfaces as `PortError::NotFound`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::ErrorKind;
use sqlx::{FromRow, PgPool};
use studyhub_core::domain::{
    Account, AccountCredentials, ChatEntry, Expense, Homework, NewAccount, NewExpense,
    NewHomework, NewNote, NewStudySession, NewTodo, Note, Polarity, ShareAction, SharedNote,
    SharedNoteView, StudySession, Todo, WalletProfile,
};
use studyhub_core::ports::{PortError, PortResult, StoreService};
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StoreService` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or(e: sqlx::Error, what: &str) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what.to_string()),
        other => unexpected(other),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    id: Uuid,
    username: String,
}
impl AccountRecord {
    fn to_domain(self) -> Account {
        Account {
            id: self.id,
            username: self.username,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    username: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> AccountCredentials {
        AccountCredentials {
            account_id: self.id,
            username: self.username,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            body: self.body,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct HomeworkRecord {
    id: Uuid,
    owner_id: Uuid,
    subject: String,
    title: String,
    description: String,
    due_at: DateTime<Utc>,
    is_finished: bool,
}
impl HomeworkRecord {
    fn to_domain(self) -> Homework {
        Homework {
            id: self.id,
            owner_id: self.owner_id,
            subject: self.subject,
            title: self.title,
            description: self.description,
            due_at: self.due_at,
            is_finished: self.is_finished,
        }
    }
}

#[derive(FromRow)]
struct TodoRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    is_finished: bool,
}
impl TodoRecord {
    fn to_domain(self) -> Todo {
        Todo {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            is_finished: self.is_finished,
        }
    }
}

#[derive(FromRow)]
struct WalletRecord {
    id: Uuid,
    owner_id: Uuid,
    income: f64,
    expenses: f64,
    balance: f64,
}
impl WalletRecord {
    fn to_domain(self) -> WalletProfile {
        WalletProfile {
            id: self.id,
            owner_id: self.owner_id,
            income: self.income,
            expenses: self.expenses,
            balance: self.balance,
        }
    }
}

#[derive(FromRow)]
struct ExpenseRecord {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    amount: f64,
    polarity: String,
    created_at: DateTime<Utc>,
}
impl ExpenseRecord {
    fn to_domain(self) -> PortResult<Expense> {
        let polarity = Polarity::parse(&self.polarity).ok_or_else(|| {
            PortError::Unexpected(format!("invalid polarity stored: {}", self.polarity))
        })?;
        Ok(Expense {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            amount: self.amount,
            polarity,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ChatEntryRecord {
    id: Uuid,
    owner_id: Uuid,
    prompt: String,
    response: String,
    created_at: DateTime<Utc>,
}
impl ChatEntryRecord {
    fn to_domain(self) -> ChatEntry {
        ChatEntry {
            id: self.id,
            owner_id: self.owner_id,
            prompt: self.prompt,
            response: self.response,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct StudySessionRecord {
    id: Uuid,
    owner_id: Uuid,
    subject: String,
    duration_minutes: i32,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    completed: bool,
}
impl StudySessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            owner_id: self.owner_id,
            subject: self.subject,
            duration_minutes: self.duration_minutes,
            started_at: self.started_at,
            ended_at: self.ended_at,
            completed: self.completed,
        }
    }
}

#[derive(FromRow)]
struct SharedNoteRecord {
    id: Uuid,
    note_id: Uuid,
    shared_by: Uuid,
    is_public: bool,
    created_at: DateTime<Utc>,
}

/// A share row joined with its note and sharer for the list views.
#[derive(FromRow)]
struct SharedViewRecord {
    share_id: Uuid,
    note_id: Uuid,
    note_owner: Uuid,
    title: String,
    body: String,
    note_created_at: DateTime<Utc>,
    shared_by_username: String,
    is_public: bool,
    created_at: DateTime<Utc>,
}
impl SharedViewRecord {
    fn to_domain(self) -> SharedNoteView {
        SharedNoteView {
            share_id: self.share_id,
            note: Note {
                id: self.note_id,
                owner_id: self.note_owner,
                title: self.title,
                body: self.body,
                created_at: self.note_created_at,
            },
            shared_by_username: self.shared_by_username,
            is_public: self.is_public,
            created_at: self.created_at,
        }
    }
}

const SHARED_VIEW_COLUMNS: &str = "s.id AS share_id, n.id AS note_id, n.owner_id AS note_owner, \
     n.title, n.body, n.created_at AS note_created_at, a.username AS shared_by_username, \
     s.is_public, s.created_at";

//=========================================================================================
// `StoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoreService for PgStore {
    // --- Accounts & Auth ---

    async fn create_account(
        &self,
        account: NewAccount,
        hashed_password: &str,
    ) -> PortResult<Account> {
        account.validate()?;
        let record = sqlx::query_as::<_, AccountRecord>(
            "INSERT INTO accounts (id, username, hashed_password) VALUES ($1, $2, $3) \
             RETURNING id, username",
        )
        .bind(Uuid::new_v4())
        .bind(account.username.trim())
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.kind() == ErrorKind::UniqueViolation => {
                PortError::validation("username", "username is already taken")
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_account_by_username(&self, username: &str) -> PortResult<AccountCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, username, hashed_password FROM accounts WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "account"))?;
        Ok(record.to_domain())
    }

    async fn delete_account(&self, account_id: Uuid) -> PortResult<()> {
        // Foreign keys cascade to everything the account owns; grants held
        // by the account disappear without touching the shared notes.
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("account".to_string()));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        account_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, account_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(account_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT account_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(|(id,)| id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Notes ---

    async fn create_note(&self, owner: Uuid, note: NewNote) -> PortResult<Note> {
        note.validate()?;
        let record = sqlx::query_as::<_, NoteRecord>(
            "INSERT INTO notes (id, owner_id, title, body) VALUES ($1, $2, $3, $4) \
             RETURNING id, owner_id, title, body, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&note.title)
        .bind(&note.body)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_notes(&self, owner: Uuid) -> PortResult<Vec<Note>> {
        let records = sqlx::query_as::<_, NoteRecord>(
            "SELECT id, owner_id, title, body, created_at FROM notes \
             WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_note(&self, requester: Uuid, note_id: Uuid) -> PortResult<Note> {
        // Owner, grantee, or public via some share row.
        let record = sqlx::query_as::<_, NoteRecord>(
            "SELECT n.id, n.owner_id, n.title, n.body, n.created_at FROM notes n \
             WHERE n.id = $1 AND (n.owner_id = $2 \
               OR EXISTS (SELECT 1 FROM shared_notes s \
                          JOIN shared_note_grants g ON g.shared_note_id = s.id \
                          WHERE s.note_id = n.id AND g.account_id = $2) \
               OR EXISTS (SELECT 1 FROM shared_notes s \
                          WHERE s.note_id = n.id AND s.is_public))",
        )
        .bind(note_id)
        .bind(requester)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "note"))?;
        Ok(record.to_domain())
    }

    async fn delete_note(&self, owner: Uuid, note_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner_id = $2")
            .bind(note_id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("note".to_string()));
        }
        Ok(())
    }

    // --- Homework ---

    async fn create_homework(&self, owner: Uuid, homework: NewHomework) -> PortResult<Homework> {
        homework.validate()?;
        let record = sqlx::query_as::<_, HomeworkRecord>(
            "INSERT INTO homework (id, owner_id, subject, title, description, due_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, owner_id, subject, title, description, due_at, is_finished",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&homework.subject)
        .bind(&homework.title)
        .bind(&homework.description)
        .bind(homework.due_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_homework(&self, owner: Uuid) -> PortResult<Vec<Homework>> {
        let records = sqlx::query_as::<_, HomeworkRecord>(
            "SELECT id, owner_id, subject, title, description, due_at, is_finished \
             FROM homework WHERE owner_id = $1 ORDER BY due_at ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn toggle_homework(&self, owner: Uuid, homework_id: Uuid) -> PortResult<Homework> {
        let record = sqlx::query_as::<_, HomeworkRecord>(
            "UPDATE homework SET is_finished = NOT is_finished \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING id, owner_id, subject, title, description, due_at, is_finished",
        )
        .bind(homework_id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "homework"))?;
        Ok(record.to_domain())
    }

    async fn delete_homework(&self, owner: Uuid, homework_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM homework WHERE id = $1 AND owner_id = $2")
            .bind(homework_id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("homework".to_string()));
        }
        Ok(())
    }

    // --- Todos ---

    async fn create_todo(&self, owner: Uuid, todo: NewTodo) -> PortResult<Todo> {
        todo.validate()?;
        let record = sqlx::query_as::<_, TodoRecord>(
            "INSERT INTO todos (id, owner_id, title) VALUES ($1, $2, $3) \
             RETURNING id, owner_id, title, is_finished",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&todo.title)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_todos(&self, owner: Uuid) -> PortResult<Vec<Todo>> {
        let records = sqlx::query_as::<_, TodoRecord>(
            "SELECT id, owner_id, title, is_finished FROM todos WHERE owner_id = $1",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn toggle_todo(&self, owner: Uuid, todo_id: Uuid) -> PortResult<Todo> {
        let record = sqlx::query_as::<_, TodoRecord>(
            "UPDATE todos SET is_finished = NOT is_finished \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING id, owner_id, title, is_finished",
        )
        .bind(todo_id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "todo"))?;
        Ok(record.to_domain())
    }

    async fn delete_todo(&self, owner: Uuid, todo_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND owner_id = $2")
            .bind(todo_id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("todo".to_string()));
        }
        Ok(())
    }

    // --- Wallet Ledger ---

    async fn get_or_create_wallet(&self, owner: Uuid) -> PortResult<WalletProfile> {
        sqlx::query(
            "INSERT INTO wallet_profiles (id, owner_id) VALUES ($1, $2) \
             ON CONFLICT (owner_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        let record = sqlx::query_as::<_, WalletRecord>(
            "SELECT id, owner_id, income, expenses, balance FROM wallet_profiles \
             WHERE owner_id = $1",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn record_expense(
        &self,
        owner: Uuid,
        entry: NewExpense,
    ) -> PortResult<(Expense, WalletProfile)> {
        entry.validate()?;

        // Ledger append and profile update commit or roll back together.
        // The single UPDATE takes the profile's row lock, so concurrent
        // submissions for the same account serialize.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let expense = sqlx::query_as::<_, ExpenseRecord>(
            "INSERT INTO expenses (id, owner_id, name, amount, polarity) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, owner_id, name, amount, polarity, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&entry.name)
        .bind(entry.amount)
        .bind(entry.polarity.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?
        .to_domain()?;

        sqlx::query(
            "INSERT INTO wallet_profiles (id, owner_id) VALUES ($1, $2) \
             ON CONFLICT (owner_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        let update_sql = match entry.polarity {
            Polarity::Positive => {
                "UPDATE wallet_profiles SET income = income + $1, balance = balance + $1 \
                 WHERE owner_id = $2 \
                 RETURNING id, owner_id, income, expenses, balance"
            }
            Polarity::Negative => {
                "UPDATE wallet_profiles SET expenses = expenses + $1, balance = balance - $1 \
                 WHERE owner_id = $2 \
                 RETURNING id, owner_id, income, expenses, balance"
            }
        };
        let profile = sqlx::query_as::<_, WalletRecord>(update_sql)
            .bind(entry.amount)
            .bind(owner)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?
            .to_domain();

        tx.commit().await.map_err(unexpected)?;
        Ok((expense, profile))
    }

    async fn list_expenses(&self, owner: Uuid) -> PortResult<Vec<Expense>> {
        let records = sqlx::query_as::<_, ExpenseRecord>(
            "SELECT id, owner_id, name, amount, polarity, created_at FROM expenses \
             WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    // --- Chat History ---

    async fn append_chat_entry(
        &self,
        owner: Uuid,
        prompt: &str,
        response: &str,
    ) -> PortResult<ChatEntry> {
        let record = sqlx::query_as::<_, ChatEntryRecord>(
            "INSERT INTO chat_entries (id, owner_id, prompt, response) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, owner_id, prompt, response, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(prompt)
        .bind(response)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_chat_entries(&self, owner: Uuid, limit: usize) -> PortResult<Vec<ChatEntry>> {
        let records = sqlx::query_as::<_, ChatEntryRecord>(
            "SELECT id, owner_id, prompt, response, created_at FROM chat_entries \
             WHERE owner_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(owner)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn clear_chat_entries(&self, owner: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM chat_entries WHERE owner_id = $1")
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Study Sessions ---

    async fn create_study_session(
        &self,
        owner: Uuid,
        session: NewStudySession,
    ) -> PortResult<StudySession> {
        session.validate()?;
        let record = sqlx::query_as::<_, StudySessionRecord>(
            "INSERT INTO study_sessions (id, owner_id, subject, duration_minutes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, owner_id, subject, duration_minutes, started_at, ended_at, completed",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&session.subject)
        .bind(session.duration_minutes)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_study_sessions(&self, owner: Uuid) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, StudySessionRecord>(
            "SELECT id, owner_id, subject, duration_minutes, started_at, ended_at, completed \
             FROM study_sessions WHERE owner_id = $1 ORDER BY started_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn complete_study_session(
        &self,
        owner: Uuid,
        session_id: Uuid,
    ) -> PortResult<StudySession> {
        // COALESCE keeps the original end time, making a repeated complete a
        // no-op rather than moving the stamp.
        let record = sqlx::query_as::<_, StudySessionRecord>(
            "UPDATE study_sessions \
             SET completed = TRUE, ended_at = COALESCE(ended_at, now()) \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING id, owner_id, subject, duration_minutes, started_at, ended_at, completed",
        )
        .bind(session_id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "study session"))?;
        Ok(record.to_domain())
    }

    async fn delete_study_session(&self, owner: Uuid, session_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM study_sessions WHERE id = $1 AND owner_id = $2")
            .bind(session_id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("study session".to_string()));
        }
        Ok(())
    }

    // --- Sharing Graph ---

    async fn share_note(
        &self,
        sharer: Uuid,
        note_id: Uuid,
        action: ShareAction,
    ) -> PortResult<SharedNote> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Ownership check first; sharing someone else's note is NotFound.
        let owned: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM notes WHERE id = $1 AND owner_id = $2")
                .bind(note_id)
                .bind(sharer)
                .fetch_optional(&mut *tx)
                .await
                .map_err(unexpected)?;
        if owned.is_none() {
            return Err(PortError::NotFound("note".to_string()));
        }

        sqlx::query(
            "INSERT INTO shared_notes (id, note_id, shared_by) VALUES ($1, $2, $3) \
             ON CONFLICT (note_id, shared_by) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(note_id)
        .bind(sharer)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        let share = sqlx::query_as::<_, SharedNoteRecord>(
            "SELECT id, note_id, shared_by, is_public, created_at FROM shared_notes \
             WHERE note_id = $1 AND shared_by = $2",
        )
        .bind(note_id)
        .bind(sharer)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        match action {
            ShareAction::MakePublic => {
                // Monotonic: no unpublish path exists.
                sqlx::query("UPDATE shared_notes SET is_public = TRUE WHERE id = $1")
                    .bind(share.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(unexpected)?;
            }
            ShareAction::GrantTo(ref username) => {
                let grantee: Option<(Uuid,)> =
                    sqlx::query_as("SELECT id FROM accounts WHERE username = $1")
                        .bind(username)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(unexpected)?;
                let (grantee_id,) =
                    grantee.ok_or_else(|| PortError::NotFound("account".to_string()))?;

                if grantee_id == sharer {
                    warn!("account {sharer} tried to share note {note_id} with itself");
                } else {
                    sqlx::query(
                        "INSERT INTO shared_note_grants (shared_note_id, account_id) \
                         VALUES ($1, $2) ON CONFLICT DO NOTHING",
                    )
                    .bind(share.id)
                    .bind(grantee_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(unexpected)?;
                }
            }
        }

        let grants: Vec<(Uuid,)> =
            sqlx::query_as("SELECT account_id FROM shared_note_grants WHERE shared_note_id = $1")
                .bind(share.id)
                .fetch_all(&mut *tx)
                .await
                .map_err(unexpected)?;
        let is_public = matches!(action, ShareAction::MakePublic) || share.is_public;

        tx.commit().await.map_err(unexpected)?;

        Ok(SharedNote {
            id: share.id,
            note_id: share.note_id,
            shared_by: share.shared_by,
            shared_with: grants.into_iter().map(|(id,)| id).collect(),
            is_public,
            created_at: share.created_at,
        })
    }

    async fn shared_with_me(&self, account_id: Uuid) -> PortResult<Vec<SharedNoteView>> {
        // The inner join on notes drops dangling share rows.
        let sql = format!(
            "SELECT {SHARED_VIEW_COLUMNS} FROM shared_notes s \
             JOIN notes n ON n.id = s.note_id \
             JOIN accounts a ON a.id = s.shared_by \
             WHERE s.shared_by <> $1 \
               AND (s.is_public OR EXISTS (SELECT 1 FROM shared_note_grants g \
                    WHERE g.shared_note_id = s.id AND g.account_id = $1)) \
             ORDER BY s.created_at DESC"
        );
        let records = sqlx::query_as::<_, SharedViewRecord>(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn my_shared_notes(&self, account_id: Uuid) -> PortResult<Vec<SharedNoteView>> {
        let sql = format!(
            "SELECT {SHARED_VIEW_COLUMNS} FROM shared_notes s \
             JOIN notes n ON n.id = s.note_id \
             JOIN accounts a ON a.id = s.shared_by \
             WHERE s.shared_by = $1 \
             ORDER BY s.created_at DESC"
        );
        let records = sqlx::query_as::<_, SharedViewRecord>(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Health ---

    async fn ping(&self) -> PortResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
