use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};

use crate::error::ApiError;

const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

pub struct UploadedImage {
    pub ext: String,
    pub bytes: Vec<u8>,
}

fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpeg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Reads the first image part out of a multipart upload. Non-image parts
/// are skipped; oversized or empty images are a bad request.
pub async fn read_image(mut payload: Multipart) -> Result<UploadedImage, ApiError> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        let mime = field.content_type().to_string();
        let ext = match extension_for(&mime) {
            Some(v) => v,
            None => continue,
        };

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|_| ApiError::BadRequest("Malformed multipart payload".into()))?;
            if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(ApiError::BadRequest("Image is too large".into()));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Empty image upload".into()));
        }

        return Ok(UploadedImage {
            ext: ext.to_string(),
            bytes,
        });
    }

    Err(ApiError::BadRequest("No image found in upload".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_image_mimes_map_to_extensions() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("video/mp4"), None);
        assert_eq!(extension_for("application/json"), None);
    }
}
