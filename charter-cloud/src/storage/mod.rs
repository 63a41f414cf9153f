//! Object storage for diary photos (S3 presigned uploads)
//!
//! Objects live at `s3://{bucket}/diary/{user_id}/{entry_id}/{id}.{ext}`.
//! Clients PUT directly to the presigned URL; the service never proxies bytes.

use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use std::time::Duration;

use crate::config::Config;

/// Accepted photo content types and their file extensions
const PHOTO_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/heic", "heic"),
];

pub fn photo_extension(content_type: &str) -> Option<&'static str> {
    PHOTO_TYPES
        .iter()
        .find(|(ct, _)| ct.eq_ignore_ascii_case(content_type))
        .map(|(_, ext)| *ext)
}

pub fn photo_key(user_id: i64, entry_id: i64, photo_id: i64, ext: &str) -> String {
    format!("diary/{user_id}/{entry_id}/{photo_id}.{ext}")
}

/// Whether `key` has the shape `photo_key` issues for this user's entry
pub fn is_entry_photo_key(user_id: i64, entry_id: i64, key: &str) -> bool {
    let Some(file) = key.strip_prefix(&format!("diary/{user_id}/{entry_id}/")) else {
        return false;
    };
    let Some((id, ext)) = file.split_once('.') else {
        return false;
    };
    !id.is_empty()
        && id.bytes().all(|b| b.is_ascii_digit())
        && PHOTO_TYPES.iter().any(|(_, e)| *e == ext)
}

#[derive(Debug, Serialize)]
pub struct UploadUrl {
    pub upload_url: String,
    pub key: String,
    pub content_type: String,
    pub expires_in_secs: u64,
}

#[derive(Clone)]
pub struct PhotoStorage {
    client: S3Client,
    bucket: String,
    ttl: Duration,
}

impl PhotoStorage {
    /// Build from config: static credentials when both keys are set,
    /// otherwise the default AWS provider chain.
    pub async fn from_config(config: &Config) -> Self {
        if let (Some(id), Some(secret)) = (&config.s3_access_key_id, &config.s3_secret_access_key)
        {
            return Self::with_static_credentials(
                &config.s3_bucket,
                &config.s3_region,
                config.s3_endpoint.as_deref(),
                id,
                secret,
                config.upload_url_ttl_secs,
            );
        }

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.s3_region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = &config.s3_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.s3_bucket.clone(),
            ttl: Duration::from_secs(config.upload_url_ttl_secs),
        }
    }

    pub fn with_static_credentials(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key_id: &str,
        secret_access_key: &str,
        ttl_secs: u64,
    ) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "charter-static",
            ));
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Presigned PUT for a new object under `key`
    pub async fn presigned_put(&self, key: &str, content_type: &str) -> Result<UploadUrl, AppError> {
        let presigning = PresigningConfig::expires_in(self.ttl).map_err(|e| {
            tracing::error!(error = %e, "Failed to create presigning config");
            AppError::new(ErrorCode::InternalError)
        })?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "Failed to presign upload");
                AppError::new(ErrorCode::StorageUnavailable)
            })?;

        Ok(UploadUrl {
            upload_url: presigned.uri().to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            expires_in_secs: self.ttl.as_secs(),
        })
    }

    /// HEAD the object; `false` when the client never finished the upload
    pub async fn object_exists(&self, key: &str) -> Result<bool, AppError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to look up photo object");
                Err(AppError::new(ErrorCode::StorageUnavailable))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(photo_extension("image/JPEG"), Some("jpg"));
        assert_eq!(photo_extension("image/gif"), None);
        assert_eq!(photo_key(1, 2, 3, "png"), "diary/1/2/3.png");
    }

    #[test]
    fn entry_photo_keys() {
        assert!(is_entry_photo_key(1, 2, &photo_key(1, 2, 42, "jpg")));
        // another user's or another entry's object
        assert!(!is_entry_photo_key(1, 2, "diary/7/2/42.jpg"));
        assert!(!is_entry_photo_key(1, 2, "diary/1/22/42.jpg"));
        assert!(!is_entry_photo_key(1, 2, "diary/1/2/../3/42.jpg"));
        assert!(!is_entry_photo_key(1, 2, "diary/1/2/42.gif"));
        assert!(!is_entry_photo_key(1, 2, "diary/1/2/.jpg"));
        assert!(!is_entry_photo_key(1, 2, "diary/1/2/42"));
    }

    #[tokio::test]
    async fn presigns_locally() {
        let storage = PhotoStorage::with_static_credentials(
            "photos",
            "us-east-1",
            Some("http://localhost:9000"),
            "AKIDEXAMPLE",
            "secret",
            900,
        );
        let url = storage
            .presigned_put("diary/1/2/3.jpg", "image/jpeg")
            .await
            .unwrap();
        assert!(url.upload_url.starts_with("http://localhost:9000/photos/diary/1/2/3.jpg"));
        assert!(url.upload_url.contains("X-Amz-Signature"));
        assert_eq!(url.expires_in_secs, 900);
    }
}
