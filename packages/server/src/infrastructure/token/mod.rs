//! ルームスコープのケイパビリティトークン
//!
//! (subject, room, role) を束ねた短寿命の署名付きトークンを発行・検証します。
//! トークンはアカウントではなく単一ルームにスコープされるため、既定の TTL は
//! セッションより長め（数時間）です。リフレッシュは行わず、再入室には
//! 新しいトークンの発行が必要です。
//!
//! 検証は署名・発行者・オーディエンス・有効期限をすべて確認し、
//! 時刻の猶予（clock skew）はゼロです。不正・期限切れのトークンは
//! 例外ではなく `None` として扱います。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use hiroba_shared::time::Clock;

use crate::domain::{Role, RoomId, UserId};

/// トークンの最大サイズ（バイト）
///
/// パース前にサイズを検査することで、巨大なトークンによる
/// リソース枯渇攻撃を base64 デコードより手前で弾く。
const MAX_TOKEN_SIZE_BYTES: usize = 4096;

/// 発行者識別子
const ISSUER: &str = "hiroba";

/// オーディエンス識別子（ルーム入室トークン）
const AUDIENCE: &str = "hiroba-room";

/// 既定の TTL（6 時間）
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// トークン発行のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// 署名に失敗
    #[error("failed to sign token")]
    SigningFailed,
}

/// ルーム入室トークンのクレーム
///
/// `sub` はユーザー識別子を含むため Debug 出力では秘匿する。
#[derive(Clone, Serialize, Deserialize)]
pub struct RoomClaims {
    /// Subject（ユーザー ID）
    pub sub: String,
    /// 入室対象のルーム ID
    pub room: String,
    /// ルーム内ロール
    pub role: String,
    /// 発行時刻（Unix 秒）
    pub iat: i64,
    /// 有効期限（Unix 秒）
    pub exp: i64,
    /// ランダムな nonce（発行ごとに一意）
    pub jti: String,
    /// 発行者
    pub iss: String,
    /// オーディエンス
    pub aud: String,
}

impl fmt::Debug for RoomClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomClaims")
            .field("sub", &"[REDACTED]")
            .field("room", &self.room)
            .field("role", &self.role)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("jti", &self.jti)
            .finish()
    }
}

impl RoomClaims {
    /// 検証済みクレームからルーム ID を取り出す
    pub fn room_id(&self) -> Option<RoomId> {
        RoomId::new(self.room.clone()).ok()
    }

    /// 検証済みクレームから subject（ユーザー ID）を取り出す
    pub fn subject(&self) -> Option<UserId> {
        UserId::new(self.sub.clone()).ok()
    }

    /// 検証済みクレームからロールを取り出す
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

/// ルーム入室トークンの発行・検証サービス
pub struct RoomTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl RoomTokenService {
    /// 既定の TTL で新しい RoomTokenService を作成
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(secret, clock, DEFAULT_TOKEN_TTL)
    }

    /// TTL を指定して新しい RoomTokenService を作成
    pub fn with_ttl(secret: &[u8], clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 有効期限は注入された Clock に対して猶予なしで検査する
        // （jsonwebtoken 内蔵の exp 検査はシステム時計に固定されているため使わない）
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        }
    }

    /// (subject, room, role) を束ねたトークンを発行する
    pub fn mint(&self, user_id: &UserId, room_id: &RoomId, role: Role) -> Result<String, TokenError> {
        let issued_at = self.clock.now_millis() / 1000;
        let claims = RoomClaims {
            sub: user_id.as_str().to_string(),
            room: room_id.as_str().to_string(),
            role: role.as_str().to_string(),
            iat: issued_at,
            exp: issued_at + self.ttl.as_secs() as i64,
            jti: uuid::Uuid::new_v4().to_string(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| TokenError::SigningFailed)
    }

    /// トークンを検証し、有効であればクレームを返す
    ///
    /// 署名・発行者・オーディエンス・有効期限のいずれかが不正なら `None`。
    pub fn verify(&self, token: &str) -> Option<RoomClaims> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            debug!(size = token.len(), "rejecting oversized token");
            return None;
        }
        let claims = match decode::<RoomClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(err) => {
                debug!(error = %err, "token verification failed");
                return None;
            }
        };
        let now = self.clock.now_millis() / 1000;
        if claims.exp <= now {
            debug!(exp = claims.exp, now, "rejecting expired token");
            return None;
        }
        Some(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiroba_shared::time::SystemClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 発行したトークンの検証とクレーム内容
    // - 署名改竄・期限切れ・別シークレット・巨大トークンの拒否
    // - nonce (jti) の一意性
    //
    // 【なぜこのテストが必要か】
    // - トークンはルームへの入室を許可するケイパビリティであり、
    //   検証の抜けはそのまま認可バイパスになる
    // - 「不正なトークンは例外ではなく None」という契約の固定
    // ========================================

    fn service() -> RoomTokenService {
        RoomTokenService::new(b"unit-test-secret", Arc::new(SystemClock))
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_mint_and_verify_round_trip() {
        // テスト項目: 発行したトークンが検証を通り、クレームが一致する
        // given (前提条件):
        let service = service();

        // when (操作):
        let token = service
            .mint(&user("alice"), &room("r1"), Role::Teacher)
            .unwrap();
        let claims = service.verify(&token).unwrap();

        // then (期待する結果):
        assert_eq!(claims.subject(), Some(user("alice")));
        assert_eq!(claims.room_id(), Some(room("r1")));
        assert_eq!(claims.role(), Some(Role::Teacher));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        // テスト項目: 署名の 1 バイト改竄で検証が失敗する
        // given (前提条件):
        let service = service();
        let token = service
            .mint(&user("alice"), &room("r1"), Role::Student)
            .unwrap();

        // when (操作): 署名部の末尾 1 文字を書き換える
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        // then (期待する結果):
        assert!(service.verify(&tampered).is_none());
    }

    #[test]
    fn test_expired_token_is_rejected_with_zero_leeway() {
        // テスト項目: 期限切れトークンは猶予なしで拒否される
        // given (前提条件): 1 秒前に失効したクレームを同じ鍵で署名する
        let service = service();
        let now = SystemClock.now_millis() / 1000;
        let claims = RoomClaims {
            sub: "alice".to_string(),
            room: "r1".to_string(),
            role: "student".to_string(),
            iat: now - 3600,
            exp: now - 1,
            jti: uuid::Uuid::new_v4().to_string(),
            iss: "hiroba".to_string(),
            aud: "hiroba-room".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        // when (操作) / then (期待する結果):
        assert!(service.verify(&token).is_none());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        // テスト項目: 別のシークレットで署名されたトークンは拒否される
        // given (前提条件):
        let issuer = RoomTokenService::new(b"other-secret", Arc::new(SystemClock));
        let verifier = service();

        // when (操作):
        let token = issuer
            .mint(&user("alice"), &room("r1"), Role::Student)
            .unwrap();

        // then (期待する結果):
        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn test_oversized_token_is_rejected_before_parse() {
        // テスト項目: 上限を超えるサイズのトークンはパース前に拒否される
        // given (前提条件):
        let service = service();
        let oversized = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);

        // when (操作) / then (期待する結果):
        assert!(service.verify(&oversized).is_none());
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        // テスト項目: JWT として解釈できない文字列は拒否される
        // given (前提条件):
        let service = service();

        // when (操作) / then (期待する結果):
        assert!(service.verify("not-a-jwt").is_none());
        assert!(service.verify("").is_none());
    }

    #[test]
    fn test_jti_is_unique_per_mint() {
        // テスト項目: 発行ごとに nonce (jti) が異なる
        // given (前提条件):
        let service = service();

        // when (操作):
        let t1 = service
            .mint(&user("alice"), &room("r1"), Role::Student)
            .unwrap();
        let t2 = service
            .mint(&user("alice"), &room("r1"), Role::Student)
            .unwrap();
        let c1 = service.verify(&t1).unwrap();
        let c2 = service.verify(&t2).unwrap();

        // then (期待する結果):
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn test_debug_redacts_subject() {
        // テスト項目: クレームの Debug 出力で subject が秘匿される
        // given (前提条件):
        let service = service();
        let token = service
            .mint(&user("alice"), &room("r1"), Role::Student)
            .unwrap();
        let claims = service.verify(&token).unwrap();

        // when (操作):
        let debug = format!("{claims:?}");

        // then (期待する結果):
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("alice"));
    }
}
