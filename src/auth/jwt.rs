use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Decodes and validates a bearer token signed with the shared secret.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
pub mod testing {
    use std::time::{SystemTime, UNIX_EPOCH};

    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    use crate::models::{Claims, TokenType};

    pub fn sign(role: u8, employee_id: Option<u64>, token_type: TokenType, secret: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize;

        let claims = Claims {
            user_id: 1,
            sub: "jane".to_string(),
            role,
            exp: now + 900,
            jti: Uuid::new_v4().to_string(),
            token_type,
            employee_id,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::sign;
    use super::*;
    use crate::models::TokenType;

    #[test]
    fn verifies_own_tokens() {
        let token = sign(3, Some(7), TokenType::Access, "secret");
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.employee_id, Some(7));
        assert_eq!(claims.role, 3);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn rejects_foreign_signatures() {
        let token = sign(1, None, TokenType::Access, "other");
        assert!(verify_token(&token, "secret").is_err());
        assert!(verify_token("not-a-token", "secret").is_err());
    }
}
