//! UI 層（トランスポートアダプタ）
//!
//! axum による WebSocket / HTTP エンドポイントを提供します。
//! フレームのパースと DTO 変換のみを行い、判断はすべて UseCase 層に
//! 委譲します。

pub mod handler;
pub mod server;
pub mod state;

pub use server::Server;
pub use state::AppState;
