//! Hiroba room coordination server library.
//!
//! リアルタイムのチャットルーム・通話ルームを支える調整コア。
//! プレゼンス管理・メッセージ暗号化・ルーム単位のケイパビリティトークン・
//! シグナリング中継を、外部トランスポート（WebSocket）から呼び出せる
//! ユースケースとして提供します。

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
