use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Generate a hex-encoded HMAC-SHA256 signature over a raw payload.
pub fn generate_signature(secret: &str, payload: &str) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;
    mac.update(payload.as_bytes());
    let result = mac.finalize();
    Ok(hex::encode(result.into_bytes()))
}

/// Verify a hex-encoded HMAC-SHA256 signature using constant-time comparison.
pub fn verify_signature(
    secret: &str,
    payload: &str,
    signature: &str,
) -> Result<bool, anyhow::Error> {
    let expected_signature = generate_signature(secret, payload)?;

    let expected_bytes = expected_signature.as_bytes();
    let signature_bytes = signature.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(signature_bytes).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_generation_and_verification() {
        let secret = "whsec_test_key";
        let body = r#"{"type":"invoice.paid","data":{"object":{}}}"#;

        let signature = generate_signature(secret, body).unwrap();
        assert!(!signature.is_empty());

        assert!(verify_signature(secret, body, &signature).unwrap());
    }

    #[test]
    fn test_invalid_signature() {
        let secret = "whsec_test_key";
        let body = r#"{"type":"invoice.paid"}"#;

        let signature = generate_signature(secret, body).unwrap();
        let invalid_signature = format!("a{}", &signature[1..]);

        assert!(!verify_signature(secret, body, &invalid_signature).unwrap());
    }

    #[test]
    fn test_tampered_body() {
        let secret = "whsec_test_key";
        let body = r#"{"type":"invoice.paid"}"#;
        let signature = generate_signature(secret, body).unwrap();

        let tampered = r#"{"type":"invoice.void"}"#;
        assert!(!verify_signature(secret, tampered, &signature).unwrap());
    }

    #[test]
    fn test_wrong_length_signature() {
        let secret = "whsec_test_key";
        let body = r#"{}"#;
        assert!(!verify_signature(secret, body, "deadbeef").unwrap());
    }
}
