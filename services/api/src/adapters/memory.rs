//! services/api/src/adapters/memory.rs
//!
//! An in-memory implementation of the `StoreService` port. It mirrors the
//! semantics of the Postgres adapter (ownership scoping, upserts, the
//! ledger's atomic two-step write) with everything behind one mutex, and
//! backs the integration test suite.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use studyhub_core::domain::{
    Account, AccountCredentials, ChatEntry, Expense, Homework, NewAccount, NewExpense,
    NewHomework, NewNote, NewStudySession, NewTodo, Note, ShareAction, SharedNote,
    SharedNoteView, StudySession, Todo, WalletProfile,
};
use studyhub_core::ports::{PortError, PortResult, StoreService};
use tracing::warn;
use uuid::Uuid;

struct StoredAccount {
    username: String,
    hashed_password: String,
}

struct StoredShare {
    id: Uuid,
    note_id: Uuid,
    shared_by: Uuid,
    grants: HashSet<Uuid>,
    is_public: bool,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, StoredAccount>,
    auth_sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    notes: HashMap<Uuid, Note>,
    homework: HashMap<Uuid, Homework>,
    todos: HashMap<Uuid, Todo>,
    wallets: HashMap<Uuid, WalletProfile>,
    expenses: Vec<Expense>,
    chat_entries: Vec<ChatEntry>,
    study_sessions: HashMap<Uuid, StudySession>,
    shares: Vec<StoredShare>,
}

impl Inner {
    fn share_view(&self, share: &StoredShare) -> Option<SharedNoteView> {
        // Dangling share rows (note deleted) are filtered out here, the
        // same guard the SQL join performs.
        let note = self.notes.get(&share.note_id)?.clone();
        let shared_by_username = self.accounts.get(&share.shared_by)?.username.clone();
        Some(SharedNoteView {
            share_id: share.id,
            note,
            shared_by_username,
            is_public: share.is_public,
            created_at: share.created_at,
        })
    }
}

/// An in-process `StoreService`, used as the port's test double.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StoreService for MemoryStore {
    // --- Accounts & Auth ---

    async fn create_account(
        &self,
        account: NewAccount,
        hashed_password: &str,
    ) -> PortResult<Account> {
        account.validate()?;
        let username = account.username.trim().to_string();
        let mut inner = self.lock();
        if inner.accounts.values().any(|a| a.username == username) {
            return Err(PortError::validation("username", "username is already taken"));
        }
        let id = Uuid::new_v4();
        inner.accounts.insert(
            id,
            StoredAccount {
                username: username.clone(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(Account { id, username })
    }

    async fn get_account_by_username(&self, username: &str) -> PortResult<AccountCredentials> {
        let inner = self.lock();
        inner
            .accounts
            .iter()
            .find(|(_, a)| a.username == username)
            .map(|(id, a)| AccountCredentials {
                account_id: *id,
                username: a.username.clone(),
                hashed_password: a.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound("account".to_string()))
    }

    async fn delete_account(&self, account_id: Uuid) -> PortResult<()> {
        let mut inner = self.lock();
        if inner.accounts.remove(&account_id).is_none() {
            return Err(PortError::NotFound("account".to_string()));
        }
        inner.auth_sessions.retain(|_, (owner, _)| *owner != account_id);
        inner.notes.retain(|_, n| n.owner_id != account_id);
        inner.homework.retain(|_, h| h.owner_id != account_id);
        inner.todos.retain(|_, t| t.owner_id != account_id);
        inner.wallets.remove(&account_id);
        inner.expenses.retain(|e| e.owner_id != account_id);
        inner.chat_entries.retain(|c| c.owner_id != account_id);
        inner.study_sessions.retain(|_, s| s.owner_id != account_id);
        // Shares the account created go away; grants it held on other
        // accounts' notes are revoked without touching those notes.
        inner.shares.retain(|s| s.shared_by != account_id);
        for share in inner.shares.iter_mut() {
            share.grants.remove(&account_id);
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        account_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.lock()
            .auth_sessions
            .insert(session_id.to_string(), (account_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let inner = self.lock();
        match inner.auth_sessions.get(session_id) {
            Some((account_id, expires_at)) if *expires_at > Utc::now() => Ok(*account_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.lock().auth_sessions.remove(session_id);
        Ok(())
    }

    // --- Notes ---

    async fn create_note(&self, owner: Uuid, note: NewNote) -> PortResult<Note> {
        note.validate()?;
        let stored = Note {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: note.title,
            body: note.body,
            created_at: Utc::now(),
        };
        self.lock().notes.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_notes(&self, owner: Uuid) -> PortResult<Vec<Note>> {
        let inner = self.lock();
        let mut notes: Vec<Note> = inner
            .notes
            .values()
            .filter(|n| n.owner_id == owner)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn get_note(&self, requester: Uuid, note_id: Uuid) -> PortResult<Note> {
        let inner = self.lock();
        let note = inner
            .notes
            .get(&note_id)
            .ok_or_else(|| PortError::NotFound("note".to_string()))?;
        let visible = note.owner_id == requester
            || inner.shares.iter().any(|s| {
                s.note_id == note_id && (s.is_public || s.grants.contains(&requester))
            });
        if !visible {
            return Err(PortError::NotFound("note".to_string()));
        }
        Ok(note.clone())
    }

    async fn delete_note(&self, owner: Uuid, note_id: Uuid) -> PortResult<()> {
        let mut inner = self.lock();
        let owned = inner
            .notes
            .get(&note_id)
            .is_some_and(|n| n.owner_id == owner);
        if !owned {
            return Err(PortError::NotFound("note".to_string()));
        }
        inner.notes.remove(&note_id);
        // Share rows are left behind on purpose; the list queries carry the
        // dangling-note guard.
        Ok(())
    }

    // --- Homework ---

    async fn create_homework(&self, owner: Uuid, homework: NewHomework) -> PortResult<Homework> {
        homework.validate()?;
        let stored = Homework {
            id: Uuid::new_v4(),
            owner_id: owner,
            subject: homework.subject,
            title: homework.title,
            description: homework.description,
            due_at: homework.due_at,
            is_finished: false,
        };
        self.lock().homework.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_homework(&self, owner: Uuid) -> PortResult<Vec<Homework>> {
        let inner = self.lock();
        let mut items: Vec<Homework> = inner
            .homework
            .values()
            .filter(|h| h.owner_id == owner)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.due_at.cmp(&b.due_at));
        Ok(items)
    }

    async fn toggle_homework(&self, owner: Uuid, homework_id: Uuid) -> PortResult<Homework> {
        let mut inner = self.lock();
        match inner.homework.get_mut(&homework_id) {
            Some(item) if item.owner_id == owner => {
                item.is_finished = !item.is_finished;
                Ok(item.clone())
            }
            _ => Err(PortError::NotFound("homework".to_string())),
        }
    }

    async fn delete_homework(&self, owner: Uuid, homework_id: Uuid) -> PortResult<()> {
        let mut inner = self.lock();
        let owned = inner
            .homework
            .get(&homework_id)
            .is_some_and(|h| h.owner_id == owner);
        if !owned {
            return Err(PortError::NotFound("homework".to_string()));
        }
        inner.homework.remove(&homework_id);
        Ok(())
    }

    // --- Todos ---

    async fn create_todo(&self, owner: Uuid, todo: NewTodo) -> PortResult<Todo> {
        todo.validate()?;
        let stored = Todo {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: todo.title,
            is_finished: false,
        };
        self.lock().todos.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_todos(&self, owner: Uuid) -> PortResult<Vec<Todo>> {
        let inner = self.lock();
        Ok(inner
            .todos
            .values()
            .filter(|t| t.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn toggle_todo(&self, owner: Uuid, todo_id: Uuid) -> PortResult<Todo> {
        let mut inner = self.lock();
        match inner.todos.get_mut(&todo_id) {
            Some(item) if item.owner_id == owner => {
                item.is_finished = !item.is_finished;
                Ok(item.clone())
            }
            _ => Err(PortError::NotFound("todo".to_string())),
        }
    }

    async fn delete_todo(&self, owner: Uuid, todo_id: Uuid) -> PortResult<()> {
        let mut inner = self.lock();
        let owned = inner
            .todos
            .get(&todo_id)
            .is_some_and(|t| t.owner_id == owner);
        if !owned {
            return Err(PortError::NotFound("todo".to_string()));
        }
        inner.todos.remove(&todo_id);
        Ok(())
    }

    // --- Wallet Ledger ---

    async fn get_or_create_wallet(&self, owner: Uuid) -> PortResult<WalletProfile> {
        let mut inner = self.lock();
        let profile = inner
            .wallets
            .entry(owner)
            .or_insert_with(|| WalletProfile::empty(Uuid::new_v4(), owner));
        Ok(profile.clone())
    }

    async fn record_expense(
        &self,
        owner: Uuid,
        entry: NewExpense,
    ) -> PortResult<(Expense, WalletProfile)> {
        entry.validate()?;
        // One lock covers the append and the profile update, matching the
        // Postgres adapter's transaction.
        let mut inner = self.lock();
        let expense = Expense {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: entry.name.clone(),
            amount: entry.amount,
            polarity: entry.polarity,
            created_at: Utc::now(),
        };
        inner.expenses.push(expense.clone());
        let profile = inner
            .wallets
            .entry(owner)
            .or_insert_with(|| WalletProfile::empty(Uuid::new_v4(), owner));
        profile.apply(entry.polarity, entry.amount);
        Ok((expense, profile.clone()))
    }

    async fn list_expenses(&self, owner: Uuid) -> PortResult<Vec<Expense>> {
        let inner = self.lock();
        let mut expenses: Vec<Expense> = inner
            .expenses
            .iter()
            .filter(|e| e.owner_id == owner)
            .cloned()
            .collect();
        expenses.reverse();
        Ok(expenses)
    }

    // --- Chat History ---

    async fn append_chat_entry(
        &self,
        owner: Uuid,
        prompt: &str,
        response: &str,
    ) -> PortResult<ChatEntry> {
        let entry = ChatEntry {
            id: Uuid::new_v4(),
            owner_id: owner,
            prompt: prompt.to_string(),
            response: response.to_string(),
            created_at: Utc::now(),
        };
        self.lock().chat_entries.push(entry.clone());
        Ok(entry)
    }

    async fn list_chat_entries(&self, owner: Uuid, limit: usize) -> PortResult<Vec<ChatEntry>> {
        let inner = self.lock();
        Ok(inner
            .chat_entries
            .iter()
            .rev()
            .filter(|c| c.owner_id == owner)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn clear_chat_entries(&self, owner: Uuid) -> PortResult<()> {
        self.lock().chat_entries.retain(|c| c.owner_id != owner);
        Ok(())
    }

    // --- Study Sessions ---

    async fn create_study_session(
        &self,
        owner: Uuid,
        session: NewStudySession,
    ) -> PortResult<StudySession> {
        session.validate()?;
        let stored = StudySession {
            id: Uuid::new_v4(),
            owner_id: owner,
            subject: session.subject,
            duration_minutes: session.duration_minutes,
            started_at: Utc::now(),
            ended_at: None,
            completed: false,
        };
        self.lock().study_sessions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_study_sessions(&self, owner: Uuid) -> PortResult<Vec<StudySession>> {
        let inner = self.lock();
        let mut sessions: Vec<StudySession> = inner
            .study_sessions
            .values()
            .filter(|s| s.owner_id == owner)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    async fn complete_study_session(
        &self,
        owner: Uuid,
        session_id: Uuid,
    ) -> PortResult<StudySession> {
        let mut inner = self.lock();
        match inner.study_sessions.get_mut(&session_id) {
            Some(session) if session.owner_id == owner => {
                if !session.completed {
                    session.completed = true;
                    session.ended_at = Some(Utc::now());
                }
                // Already-completed sessions keep their original end stamp.
                Ok(session.clone())
            }
            _ => Err(PortError::NotFound("study session".to_string())),
        }
    }

    async fn delete_study_session(&self, owner: Uuid, session_id: Uuid) -> PortResult<()> {
        let mut inner = self.lock();
        let owned = inner
            .study_sessions
            .get(&session_id)
            .is_some_and(|s| s.owner_id == owner);
        if !owned {
            return Err(PortError::NotFound("study session".to_string()));
        }
        inner.study_sessions.remove(&session_id);
        Ok(())
    }

    // --- Sharing Graph ---

    async fn share_note(
        &self,
        sharer: Uuid,
        note_id: Uuid,
        action: ShareAction,
    ) -> PortResult<SharedNote> {
        let mut inner = self.lock();

        match inner.notes.get(&note_id) {
            Some(note) if note.owner_id == sharer => {}
            _ => return Err(PortError::NotFound("note".to_string())),
        }

        let grantee_id = match &action {
            ShareAction::GrantTo(username) => Some(
                inner
                    .accounts
                    .iter()
                    .find(|(_, a)| &a.username == username)
                    .map(|(id, _)| *id)
                    .ok_or_else(|| PortError::NotFound("account".to_string()))?,
            ),
            ShareAction::MakePublic => None,
        };

        // Upsert on the (note, sharer) pair.
        if !inner
            .shares
            .iter()
            .any(|s| s.note_id == note_id && s.shared_by == sharer)
        {
            inner.shares.push(StoredShare {
                id: Uuid::new_v4(),
                note_id,
                shared_by: sharer,
                grants: HashSet::new(),
                is_public: false,
                created_at: Utc::now(),
            });
        }
        let share = inner
            .shares
            .iter_mut()
            .find(|s| s.note_id == note_id && s.shared_by == sharer)
            .expect("share row was just upserted");

        match action {
            ShareAction::MakePublic => share.is_public = true,
            ShareAction::GrantTo(_) => {
                let grantee_id = grantee_id.expect("grantee resolved above");
                if grantee_id == sharer {
                    warn!("account {sharer} tried to share note {note_id} with itself");
                } else {
                    share.grants.insert(grantee_id);
                }
            }
        }

        Ok(SharedNote {
            id: share.id,
            note_id: share.note_id,
            shared_by: share.shared_by,
            shared_with: share.grants.iter().copied().collect(),
            is_public: share.is_public,
            created_at: share.created_at,
        })
    }

    async fn shared_with_me(&self, account_id: Uuid) -> PortResult<Vec<SharedNoteView>> {
        let inner = self.lock();
        Ok(inner
            .shares
            .iter()
            .filter(|s| {
                s.shared_by != account_id && (s.is_public || s.grants.contains(&account_id))
            })
            .filter_map(|s| inner.share_view(s))
            .collect())
    }

    async fn my_shared_notes(&self, account_id: Uuid) -> PortResult<Vec<SharedNoteView>> {
        let inner = self.lock();
        Ok(inner
            .shares
            .iter()
            .filter(|s| s.shared_by == account_id)
            .filter_map(|s| inner.share_view(s))
            .collect())
    }

    // --- Health ---

    async fn ping(&self) -> PortResult<()> {
        Ok(())
    }
}
