use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// How far a webhook timestamp may drift from our clock before the
/// delivery is considered a replay.
pub const TOLERANCE_SECS: i64 = 300;

fn unauthorized(msg: &str) -> ApiError {
    ApiError::Unauthorized(msg.to_string())
}

fn check_timestamp(timestamp: &str, now: i64) -> Result<(), ApiError> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| unauthorized("Malformed webhook timestamp"))?;
    if (now - ts).abs() > TOLERANCE_SECS {
        return Err(unauthorized("Webhook timestamp outside tolerance"));
    }
    Ok(())
}

/// Verifies an identity-provider delivery (svix format): the signature
/// header carries space-separated `v1,<base64>` entries, each an
/// HMAC-SHA256 over `{id}.{timestamp}.{body}` keyed with the base64 part
/// of the `whsec_` secret.
pub fn verify_identity_webhook(
    secret: &str,
    msg_id: &str,
    timestamp: &str,
    signature_header: &str,
    body: &[u8],
    now: i64,
) -> Result<(), ApiError> {
    check_timestamp(timestamp, now)?;

    let encoded_key = secret.strip_prefix("whsec_").unwrap_or(secret);
    let key = base64::decode(encoded_key).map_err(|_| unauthorized("Malformed webhook secret"))?;

    let mut signed = Vec::new();
    signed.extend_from_slice(msg_id.as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(timestamp.as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(body);

    for entry in signature_header.split_whitespace() {
        let candidate = match entry.split_once(',') {
            Some(("v1", sig)) => sig,
            _ => continue,
        };
        let decoded = match base64::decode(candidate) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|_| unauthorized("Malformed webhook secret"))?;
        mac.update(&signed);
        if mac.verify_slice(&decoded).is_ok() {
            return Ok(());
        }
    }

    Err(unauthorized("No matching webhook signature"))
}

/// Verifies a video-host delivery: header `t=<unix>,v1=<hex>` where the
/// digest is HMAC-SHA256 over `{t}.{body}`.
pub fn verify_video_webhook(
    secret: &str,
    signature_header: &str,
    body: &[u8],
    now: i64,
) -> Result<(), ApiError> {
    let mut timestamp = None;
    let mut signature = None;
    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("v1", v)) => signature = Some(v),
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or_else(|| unauthorized("Missing signature timestamp"))?;
    let signature = signature.ok_or_else(|| unauthorized("Missing signature digest"))?;

    check_timestamp(timestamp, now)?;

    let decoded = hex::decode(signature).map_err(|_| unauthorized("Malformed signature digest"))?;

    let mut signed = Vec::new();
    signed.extend_from_slice(timestamp.as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(body);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| unauthorized("Malformed webhook secret"))?;
    mac.update(&signed);
    mac.verify_slice(&decoded)
        .map_err(|_| unauthorized("Webhook signature mismatch"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn identity_secret() -> String {
        format!("whsec_{}", base64::encode(b"identity-signing-key"))
    }

    fn sign_identity(msg_id: &str, timestamp: &str, body: &[u8]) -> String {
        let key = base64::decode(identity_secret().strip_prefix("whsec_").unwrap()).unwrap();
        let mut mac = HmacSha256::new_from_slice(&key).unwrap();
        mac.update(format!("{}.{}.", msg_id, timestamp).as_bytes());
        mac.update(body);
        format!("v1,{}", base64::encode(mac.finalize().into_bytes()))
    }

    fn sign_video(secret: &str, timestamp: i64, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.", timestamp).as_bytes());
        mac.update(body);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn identity_signature_accepts_a_valid_delivery() {
        let body = br#"{"type":"user.created"}"#;
        let ts = NOW.to_string();
        let header = sign_identity("msg_1", &ts, body);
        assert!(
            verify_identity_webhook(&identity_secret(), "msg_1", &ts, &header, body, NOW).is_ok()
        );
    }

    #[test]
    fn identity_signature_accepts_a_valid_entry_among_several() {
        let body = br#"{"type":"user.updated"}"#;
        let ts = NOW.to_string();
        let good = sign_identity("msg_2", &ts, body);
        let header = format!("v1,{} {}", base64::encode(b"wrong-signature"), good);
        assert!(
            verify_identity_webhook(&identity_secret(), "msg_2", &ts, &header, body, NOW).is_ok()
        );
    }

    #[test]
    fn identity_signature_rejects_a_tampered_body() {
        let ts = NOW.to_string();
        let header = sign_identity("msg_3", &ts, br#"{"type":"user.created"}"#);
        let err = verify_identity_webhook(
            &identity_secret(),
            "msg_3",
            &ts,
            &header,
            br#"{"type":"user.deleted"}"#,
            NOW,
        );
        assert!(err.is_err());
    }

    #[test]
    fn identity_signature_rejects_a_stale_timestamp() {
        let body = br#"{}"#;
        let ts = (NOW - TOLERANCE_SECS - 1).to_string();
        let header = sign_identity("msg_4", &ts, body);
        assert!(
            verify_identity_webhook(&identity_secret(), "msg_4", &ts, &header, body, NOW).is_err()
        );
    }

    #[test]
    fn video_signature_accepts_a_valid_delivery() {
        let body = br#"{"type":"video.asset.ready"}"#;
        let header = sign_video("video-secret", NOW, body);
        assert!(verify_video_webhook("video-secret", &header, body, NOW).is_ok());
    }

    #[test]
    fn video_signature_rejects_a_wrong_secret() {
        let body = br#"{"type":"video.asset.ready"}"#;
        let header = sign_video("video-secret", NOW, body);
        assert!(verify_video_webhook("other-secret", &header, body, NOW).is_err());
    }

    #[test]
    fn video_signature_rejects_malformed_headers() {
        let body = br#"{}"#;
        assert!(verify_video_webhook("s", "", body, NOW).is_err());
        assert!(verify_video_webhook("s", "t=abc,v1=00", body, NOW).is_err());
        assert!(verify_video_webhook("s", "v1=00", body, NOW).is_err());
        let header = format!("t={}", NOW);
        assert!(verify_video_webhook("s", &header, body, NOW).is_err());
    }
}
