//! インメモリ Repository 実装
//!
//! ルームメタデータと参加登録、メッセージ履歴をインメモリで保持します。
//! 本番ではいずれも外部の永続化層（RDBMS）が所有するデータであり、
//! このクレートの責務はインターフェースの消費だけです。インメモリ実装は
//! 開発用サーバーと統合テストのために提供します。

pub mod directory;
pub mod message_store;

pub use directory::InMemoryRoomDirectory;
pub use message_store::InMemoryMessageStore;
