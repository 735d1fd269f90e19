//! Repository 実装
//!
//! ドメイン層が定義する RoomDirectory / MessageStore trait の具体的な実装。

pub mod inmemory;

pub use inmemory::{InMemoryMessageStore, InMemoryRoomDirectory};
