pub mod domain;
pub mod ports;
pub mod stats;

pub use domain::{
    Account, AccountCredentials, AuthSession, ChatEntry, Expense, Homework, Note, Polarity,
    ShareAction, SharedNote, SharedNoteView, StudySession, Todo, WalletProfile,
};
pub use ports::{
    BookSearchService, ChatService, DictionaryService, EncyclopediaService, NoteExportService,
    PortError, PortResult, StoreService,
};
