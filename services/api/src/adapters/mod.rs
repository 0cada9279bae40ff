pub mod chat_llm;
pub mod db;
pub mod export;
pub mod lookup;
pub mod memory;

pub use chat_llm::{DisabledChatAdapter, GeminiChatAdapter};
pub use db::PgStore;
pub use export::TextExporter;
pub use lookup::{DictionaryApiAdapter, GoogleBooksAdapter, WikipediaAdapter};
pub use memory::MemoryStore;
