//! Signed bearer token codec (compact JWS, HS256).
//!
//! Tokens are self-contained: nothing is stored server-side, so a minted token
//! stays valid until its `exp` regardless of later account changes.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;

use crate::{Claims, Principal};

/// Minimum signing key length in bytes (256 bits).
pub const MIN_SECRET_LEN: usize = 32;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("signing key is {0} bytes; at least {MIN_SECRET_LEN} are required")]
    WeakKey(usize),

    #[error("token lifetime must be positive")]
    InvalidTtl,

    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// Mints and verifies tokens with a process-wide symmetric key.
///
/// Cheap to clone; the keys are shared and never mutated after construction.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakKey(secret.len()));
        }

        // Expiry is checked by hand against an explicit clock; the library
        // only checks signature, algorithm and claim presence.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = ["sub", "exp"].into_iter().map(String::from).collect::<HashSet<_>>();

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(validation),
        })
    }

    /// Mint a token for `principal` valid for `ttl` from now.
    pub fn mint(&self, principal: &Principal, ttl: Duration) -> Result<String, TokenError> {
        self.mint_at(principal, ttl, Utc::now())
    }

    /// Mint a token as if issued at `now`.
    pub fn mint_at(
        &self,
        principal: &Principal,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl_secs = ttl.num_seconds();
        if ttl_secs <= 0 {
            return Err(TokenError::InvalidTtl);
        }

        let iat = now.timestamp();
        let claims = Claims {
            sub: principal.subject().to_string(),
            iat,
            exp: iat.saturating_add(ttl_secs),
            roles: principal.role_names(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify signature and expiry against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature, then expiry against `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = self.decode_signed(token)?;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Decode a correctly signed token without the expiry check.
    ///
    /// Inspection only: the result must never be used to authorize a request.
    pub fn extract_all(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_signed(token)
    }

    fn decode_signed(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token.trim(), &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed(err.to_string()),
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeZone;
    use proptest::prelude::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-hs256";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    /// Flip one bit of the decoded signature and re-encode it, so the segment
    /// stays valid base64url.
    fn flip_signature_bit(token: &str, bit: usize) -> String {
        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(sig).unwrap();
        let idx = bit % (bytes.len() * 8);
        bytes[idx / 8] ^= 1 << (idx % 8);
        format!("{head}.{}", URL_SAFE_NO_PAD.encode(bytes))
    }

    #[test]
    fn mint_then_verify_round_trips_subject_and_roles() {
        let codec = codec();
        let principal = Principal::new("alice", Role::Admin);

        let token = codec.mint(&principal, Duration::minutes(10)).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, vec!["ADMIN".to_string()]);
        assert_eq!(claims.exp - claims.iat, 600);
        assert_eq!(Principal::from_claims(&claims), principal);
    }

    #[test]
    fn token_has_three_segments() {
        let token = codec()
            .mint(&Principal::new("alice", Role::User), Duration::minutes(1))
            .unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn expires_exactly_at_exp() {
        let codec = codec();
        let issued = at(1_700_000_000);
        let ttl = Duration::seconds(3600);
        let token = codec
            .mint_at(&Principal::new("alice", Role::User), ttl, issued)
            .unwrap();

        assert!(codec.verify_at(&token, issued).is_ok());
        assert!(codec.verify_at(&token, at(1_700_003_599)).is_ok());
        assert_eq!(codec.verify_at(&token, at(1_700_003_600)), Err(TokenError::Expired));
        assert_eq!(codec.verify_at(&token, at(1_700_003_601)), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_key_is_bad_signature() {
        let other = TokenCodec::new("another-secret-key-that-is-long-enough-too").unwrap();
        let token = other
            .mint(&Principal::new("mallory", Role::Admin), Duration::minutes(5))
            .unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn bad_signature_wins_over_expiry() {
        let other = TokenCodec::new("another-secret-key-that-is-long-enough-too").unwrap();
        let token = other
            .mint_at(&Principal::new("mallory", Role::Admin), Duration::seconds(1), at(10))
            .unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        assert!(matches!(codec.verify("not-a-token"), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.verify("a.b.c"), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.verify(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let claims = Claims {
            sub: "alice".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 60,
            roles: vec!["ADMIN".to_string()],
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn short_keys_are_refused() {
        assert_eq!(TokenCodec::new("short").unwrap_err(), TokenError::WeakKey(5));
        assert!(TokenCodec::new([7u8; MIN_SECRET_LEN]).is_ok());
    }

    #[test]
    fn non_positive_ttl_is_refused() {
        let principal = Principal::new("alice", Role::User);
        assert_eq!(codec().mint(&principal, Duration::zero()), Err(TokenError::InvalidTtl));
        assert_eq!(codec().mint(&principal, Duration::seconds(-5)), Err(TokenError::InvalidTtl));
    }

    #[test]
    fn extract_all_ignores_expiry_but_not_signature() {
        let codec = codec();
        let token = codec
            .mint_at(&Principal::new("alice", Role::User), Duration::seconds(60), at(1_000))
            .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));

        let claims = codec.extract_all(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 1_060);

        let tampered = flip_signature_bit(&token, 3);
        assert_eq!(codec.extract_all(&tampered), Err(TokenError::BadSignature));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: verify(mint(P, ttl)) yields P's subject and roles inside the window,
        /// and is Expired one second after the window closes.
        #[test]
        fn verify_inverts_mint_within_ttl(
            subject in "[a-zA-Z0-9_.@-]{1,32}",
            role_idx in 0usize..3,
            ttl_secs in 1i64..1_000_000,
            issued in 1_600_000_000i64..1_900_000_000,
        ) {
            let codec = codec();
            let principal = Principal::new(subject.clone(), Role::ALL[role_idx]);
            let token = codec.mint_at(&principal, Duration::seconds(ttl_secs), at(issued)).unwrap();

            let claims = codec.verify_at(&token, at(issued + ttl_secs - 1)).unwrap();
            prop_assert_eq!(&claims.sub, &subject);
            let from_claims = Principal::from_claims(&claims);
            prop_assert_eq!(from_claims.roles(), principal.roles());

            prop_assert_eq!(
                codec.verify_at(&token, at(issued + ttl_secs + 1)),
                Err(TokenError::Expired)
            );
        }

        /// Property: flipping any single bit of the signature yields BadSignature.
        #[test]
        fn any_signature_bit_flip_is_detected(bit in 0usize..256) {
            let codec = codec();
            let token = codec
                .mint(&Principal::new("alice", Role::User), Duration::minutes(5))
                .unwrap();

            let tampered = flip_signature_bit(&token, bit);
            prop_assert_eq!(codec.verify(&tampered), Err(TokenError::BadSignature));
        }
    }
}
