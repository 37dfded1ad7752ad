pub mod db;
pub mod events;
pub mod gemini_llm;

pub use db::PgDocumentStore;
pub use events::{channel_source, ChannelEventSource, PgChangeListener};
pub use gemini_llm::GeminiTextAdapter;
