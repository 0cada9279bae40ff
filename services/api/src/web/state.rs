//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use studyhub_core::ports::{
    BookSearchService, ChatService, DictionaryService, EncyclopediaService, NoteExportService,
    StoreService,
};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoreService>,
    pub config: Arc<Config>,
    pub chat: Arc<dyn ChatService>,
    pub dictionary: Arc<dyn DictionaryService>,
    pub encyclopedia: Arc<dyn EncyclopediaService>,
    pub books: Arc<dyn BookSearchService>,
    pub exporter: Arc<dyn NoteExportService>,
}
