//! InMemory Repository 実装

mod chat_state;

pub use chat_state::InMemoryChatStateRepository;
