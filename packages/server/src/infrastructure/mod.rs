//! Infrastructure 層
//!
//! ドメイン層が定義する trait の具体的な実装と、技術的な葉コンポーネント
//! （並行プレゼンス台帳・フラッドガード・ルーム暗号・トークンサービス）を
//! 提供します。

pub mod crypto;
pub mod dto;
pub mod flood;
pub mod message_pusher;
pub mod presence;
pub mod repository;
pub mod token;
