//! ルーム単位のメッセージ暗号化
//!
//! プロセス全体のマスターシークレットからルーム ID を HMAC-SHA256 で
//! 鍵導出し（ルーム ID 単体を鍵にはしない）、AES-256-GCM で本文を
//! 認証付き暗号化します。
//!
//! 形式: `base64( nonce(12 bytes) || ciphertext || tag )`
//!
//! 復号の失敗（破損・別ルーム・改竄）は生の例外として伝播させず、
//! 型付きの [`DecryptError`] として返します。1 件の不正なメッセージが
//! ルーム全体の履歴表示を巻き込んで落とさないための契約です。

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

use crate::domain::RoomId;

/// AES-256-GCM の認証タグ長（バイト）
const TAG_LEN: usize = 16;

/// 暗号化のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// 乱数生成に失敗
    #[error("failed to generate nonce")]
    NonceGeneration,

    /// 暗号化に失敗
    #[error("encryption failed")]
    EncryptionFailed,
}

/// 復号のエラー（呼び出し側は 1 件単位でプレースホルダへ退避できる）
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecryptError {
    /// base64 として解釈できない
    #[error("ciphertext blob is not valid base64")]
    InvalidEncoding,

    /// nonce とタグを含む最小長に満たない
    #[error("ciphertext blob is too short")]
    TooShort,

    /// 認証付き復号に失敗（改竄・別ルームの鍵・破損）
    #[error("decryption failed")]
    DecryptionFailed,

    /// 復号結果が UTF-8 でない
    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

/// ルーム暗号サービス
pub struct RoomCipher {
    master_secret: Vec<u8>,
    rng: SystemRandom,
}

impl RoomCipher {
    /// 新しい RoomCipher を作成
    pub fn new(master_secret: Vec<u8>) -> Self {
        Self {
            master_secret,
            rng: SystemRandom::new(),
        }
    }

    /// ルーム鍵を導出する（HMAC-SHA256(master_secret, room_id)）
    ///
    /// 同じマスターシークレットとルーム ID からは常に同じ鍵が導出される。
    fn derive_key(&self, room_id: &RoomId) -> Option<LessSafeKey> {
        let mac_key = hmac::Key::new(hmac::HMAC_SHA256, &self.master_secret);
        let derived = hmac::sign(&mac_key, room_id.as_str().as_bytes());
        // HMAC-SHA256 の出力は 32 バイトで AES-256 の鍵長と一致する
        let unbound = UnboundKey::new(&AES_256_GCM, derived.as_ref()).ok()?;
        Some(LessSafeKey::new(unbound))
    }

    /// 本文をルーム鍵で暗号化し、base64 のブロブとして返す
    ///
    /// 呼び出しごとに新しいランダム nonce を生成して先頭に付加する。
    /// 空・空白のみの入力は暗号化せずそのまま返す（エラーにしない）。
    pub fn encrypt(&self, plaintext: &str, room_id: &RoomId) -> Result<String, CryptoError> {
        if plaintext.trim().is_empty() {
            return Ok(plaintext.to_string());
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::NonceGeneration)?;

        let key = self
            .derive_key(room_id)
            .ok_or(CryptoError::EncryptionFailed)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);
        let mut in_out = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&in_out);
        Ok(BASE64.encode(blob))
    }

    /// base64 のブロブから nonce を取り出し、ルーム鍵で復号する
    ///
    /// いかなる失敗もパニックや生の伝播にはせず [`DecryptError`] を返す。
    pub fn decrypt(&self, blob: &str, room_id: &RoomId) -> Result<String, DecryptError> {
        if blob.trim().is_empty() {
            return Ok(blob.to_string());
        }

        let decoded = BASE64
            .decode(blob)
            .map_err(|_| DecryptError::InvalidEncoding)?;
        if decoded.len() < NONCE_LEN + TAG_LEN {
            return Err(DecryptError::TooShort);
        }

        let (nonce_bytes, ciphertext) = decoded.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| DecryptError::TooShort)?;

        let key = self
            .derive_key(room_id)
            .ok_or(DecryptError::DecryptionFailed)?;
        let mut in_out = ciphertext.to_vec();
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| DecryptError::DecryptionFailed)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| DecryptError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 暗号化 → 復号のラウンドトリップ
    // - 別ルームの鍵では復号できないこと（型付きエラー・パニックしない）
    // - 改竄されたブロブの検出
    // - nonce が呼び出しごとに異なること
    // - 空入力のパススルー
    //
    // 【なぜこのテストが必要か】
    // - ルーム間のメッセージ漏洩防止は暗号境界であり、鍵導出の
    //   ルーム分離が機能していることを直接確認する必要がある
    // - 復号失敗時の型付き degrade は履歴表示の可用性の契約
    // ========================================

    fn cipher() -> RoomCipher {
        RoomCipher::new(b"unit-test-master-secret".to_vec())
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        // テスト項目: 暗号化したブロブを同じルーム ID で復号すると元に戻る
        // given (前提条件):
        let cipher = cipher();
        let plaintext = "こんにちは、Hiroba!";

        // when (操作):
        let blob = cipher.encrypt(plaintext, &room("r1")).unwrap();
        let decrypted = cipher.decrypt(&blob, &room("r1")).unwrap();

        // then (期待する結果):
        assert_ne!(blob, plaintext);
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_with_wrong_room_fails_without_panic() {
        // テスト項目: 別ルームの鍵での復号は型付きエラーになる（パニックしない）
        // given (前提条件):
        let cipher = cipher();
        let blob = cipher.encrypt("secret", &room("r1")).unwrap();

        // when (操作):
        let result = cipher.decrypt(&blob, &room("r2"));

        // then (期待する結果):
        assert_eq!(result, Err(DecryptError::DecryptionFailed));
    }

    #[test]
    fn test_decrypt_tampered_blob_fails() {
        // テスト項目: 1 バイトでも改竄されたブロブは復号に失敗する
        // given (前提条件):
        let cipher = cipher();
        let blob = cipher.encrypt("secret", &room("r1")).unwrap();
        let mut bytes = BASE64.decode(&blob).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = BASE64.encode(bytes);

        // when (操作):
        let result = cipher.decrypt(&tampered, &room("r1"));

        // then (期待する結果):
        assert_eq!(result, Err(DecryptError::DecryptionFailed));
    }

    #[test]
    fn test_decrypt_garbage_returns_typed_errors() {
        // テスト項目: 不正なブロブは種別ごとの型付きエラーになる
        // given (前提条件):
        let cipher = cipher();

        // when (操作) / then (期待する結果):
        assert_eq!(
            cipher.decrypt("not-base64!!!", &room("r1")),
            Err(DecryptError::InvalidEncoding)
        );
        assert_eq!(
            cipher.decrypt(&BASE64.encode(b"short"), &room("r1")),
            Err(DecryptError::TooShort)
        );
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        // テスト項目: 同じ平文でも呼び出しごとにブロブが異なる（nonce が新しい）
        // given (前提条件):
        let cipher = cipher();

        // when (操作):
        let blob1 = cipher.encrypt("same text", &room("r1")).unwrap();
        let blob2 = cipher.encrypt("same text", &room("r1")).unwrap();

        // then (期待する結果):
        assert_ne!(blob1, blob2);
    }

    #[test]
    fn test_blank_input_passes_through() {
        // テスト項目: 空・空白のみの入力は暗号化も復号もパススルーされる
        // given (前提条件):
        let cipher = cipher();

        // when (操作) / then (期待する結果):
        assert_eq!(cipher.encrypt("", &room("r1")).unwrap(), "");
        assert_eq!(cipher.encrypt("   ", &room("r1")).unwrap(), "   ");
        assert_eq!(cipher.decrypt("", &room("r1")).unwrap(), "");
    }

    #[test]
    fn test_same_secret_interoperates_across_instances() {
        // テスト項目: 鍵導出は決定的で、同じシークレットの別インスタンスと相互運用できる
        // given (前提条件):
        let cipher_a = RoomCipher::new(b"shared-secret".to_vec());
        let cipher_b = RoomCipher::new(b"shared-secret".to_vec());
        let cipher_c = RoomCipher::new(b"other-secret".to_vec());

        // when (操作):
        let blob = cipher_a.encrypt("hello", &room("r1")).unwrap();

        // then (期待する結果): 同じシークレットなら復号可、違えば不可
        assert_eq!(cipher_b.decrypt(&blob, &room("r1")).unwrap(), "hello");
        assert_eq!(
            cipher_c.decrypt(&blob, &room("r1")),
            Err(DecryptError::DecryptionFailed)
        );
    }
}
