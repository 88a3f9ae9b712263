use s3::creds::Credentials;
use s3::{Bucket, Region};

use crate::config;
use crate::error::ApiError;
use crate::models::new_id;

pub struct StoredObject {
    pub url: String,
    pub key: String,
}

/// Object storage for thumbnails, previews and banners. Keys are generated
/// here; the database keeps both the public URL and the key so objects can
/// be deleted when their row goes away.
pub struct Storage {
    bucket: Bucket,
    public_base: String,
}

impl Storage {
    pub fn from_env() -> Result<Storage, ApiError> {
        let region = Region::Custom {
            region: config::s3_region()?,
            endpoint: config::s3_endpoint()?,
        };

        let credentials = Credentials {
            access_key: Some(config::s3_key()?),
            secret_key: Some(config::s3_secret()?),
            security_token: None,
            session_token: None,
        };

        let mut bucket =
            Bucket::new(&config::s3_bucket()?, region, credentials).map_err(ApiError::internal)?;
        bucket.add_header("x-amz-acl", "public-read");

        Ok(Storage {
            bucket,
            public_base: config::s3_public_base()?,
        })
    }

    pub async fn store_bytes(
        &self,
        prefix: &str,
        ext: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, ApiError> {
        let key = format!("{}/{}.{}", prefix, new_id(), ext);

        let (_, code) = self
            .bucket
            .put_object(&key, bytes)
            .await
            .map_err(ApiError::internal)?;
        if code != 200 {
            return Err(ApiError::Internal(format!(
                "Storage put for {} returned {}",
                key, code
            )));
        }

        Ok(StoredObject {
            url: self.public_url(&key),
            key,
        })
    }

    /// Pulls an image the video host generated (thumbnail, animated
    /// preview) into our own bucket.
    pub async fn import_from_url(
        &self,
        prefix: &str,
        ext: &str,
        source_url: &str,
    ) -> Result<StoredObject, ApiError> {
        let response = reqwest::blocking::get(source_url)?;
        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Fetching {} returned {}",
                source_url,
                response.status()
            )));
        }
        let bytes = response.bytes()?;
        self.store_bytes(prefix, ext, &bytes).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), ApiError> {
        let (_, code) = self
            .bucket
            .delete_object(key)
            .await
            .map_err(ApiError::internal)?;
        if code != 200 && code != 204 {
            return Err(ApiError::Internal(format!(
                "Storage delete for {} returned {}",
                key, code
            )));
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), key)
    }
}
