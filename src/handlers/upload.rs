//! # Upload Handler
//!
//! Publishes one static asset to the CDN origin bucket.
//!
//! ## Publication Lifecycle
//!
//! ```text
//! 1. Validate  → file exists, has an extension, version tag starts with "v"
//! 2. Resolve   → account id → environment (bucket, domain)
//! 3. Hash      → read the file once; short hash + base64 checksum
//! 4. Name      → versioned and alias filenames and keys
//! 5. Preview   → dry run: report everything, touch nothing
//!    or
//!    Write     → put versioned object (one year, immutable)
//!    Alias     → copy versioned → latest (five minutes, REPLACE)
//! 6. Result    → committed record with keys, URIs and URLs
//! ```
//!
//! A failed alias copy leaves the versioned object in place. It is
//! content-addressed and never overwritten, so no rollback is attempted.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::constants::{
    ALIAS_CACHE_CONTROL, ALIAS_MARKER, META_ALIAS, META_CONTENT_HASH, META_ORIGINAL_FILENAME,
    META_POINTS_TO, META_VERSION_TAG, SERVER_SIDE_ENCRYPTION, VERSIONED_CACHE_CONTROL,
};
use crate::errors::AppResult;
use crate::identity::{resolve_target, IdentityResolver};
use crate::log_data;
use crate::logging::Logger;
use crate::models::{
    AssetDescriptor, CommittedRecord, EnvironmentTarget, HeaderBundle, PreviewRecord, UploadResult,
};
use crate::store::{CopyObjectRequest, ObjectStore, PutObjectRequest};
use crate::utils::{
    build_key, content_disposition_for, content_type_for, normalize_suffix, AssetName,
    ContentDigest,
};
use crate::validation::InputValidator;

/// Everything derived from the asset before any write happens.
#[derive(Clone, Debug, PartialEq)]
pub struct PublicationPlan {
    pub original_filename: String,
    pub content_hash: String,
    pub versioned_key: String,
    pub alias_key: String,
    pub headers: HeaderBundle,
}

impl PublicationPlan {
    /// Derives names, keys and headers from the asset and its bytes.
    pub fn build(asset: &AssetDescriptor, ext: &str, data: &[u8]) -> Self {
        let digest = ContentDigest::of(data);

        let name = AssetName {
            slug: &asset.slug,
            version_tag: &asset.version_tag,
            short_hash: &digest.short_hash,
            lang_suffix: normalize_suffix(asset.lang.as_deref()),
            variant_suffix: normalize_suffix(asset.variant.as_deref()),
            ext,
        };
        let versioned_key = build_key(&asset.event, &asset.type_code, &name.versioned_filename());
        let alias_key = build_key(&asset.event, &asset.type_code, &name.alias_filename());

        let original_filename = asset
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = content_type_for(&original_filename);
        let content_disposition = content_disposition_for(&content_type, &original_filename);

        let headers = HeaderBundle {
            content_type,
            content_disposition,
            versioned_cache_control: VERSIONED_CACHE_CONTROL.to_string(),
            latest_cache_control: ALIAS_CACHE_CONTROL.to_string(),
            server_side_encryption: SERVER_SIDE_ENCRYPTION.to_string(),
            checksum_sha256_b64: digest.checksum_b64,
        };

        Self {
            original_filename,
            content_hash: digest.short_hash,
            versioned_key,
            alias_key,
            headers,
        }
    }

    fn versioned_metadata(&self, asset: &AssetDescriptor) -> HashMap<String, String> {
        HashMap::from([
            (META_ORIGINAL_FILENAME.to_string(), self.original_filename.clone()),
            (META_VERSION_TAG.to_string(), asset.version_tag.clone()),
            (META_CONTENT_HASH.to_string(), self.content_hash.clone()),
        ])
    }

    fn alias_metadata(&self, asset: &AssetDescriptor, points_to: &str) -> HashMap<String, String> {
        let mut metadata = self.versioned_metadata(asset);
        metadata.insert(META_ALIAS.to_string(), ALIAS_MARKER.to_string());
        metadata.insert(META_POINTS_TO.to_string(), points_to.to_string());
        metadata
    }

    pub fn put_request(&self, asset: &AssetDescriptor, target: &EnvironmentTarget, body: Vec<u8>) -> PutObjectRequest {
        PutObjectRequest {
            bucket: target.bucket.clone(),
            key: self.versioned_key.clone(),
            body,
            content_type: self.headers.content_type.clone(),
            content_disposition: self.headers.content_disposition.clone(),
            cache_control: self.headers.versioned_cache_control.clone(),
            server_side_encryption: self.headers.server_side_encryption.clone(),
            checksum_sha256: self.headers.checksum_sha256_b64.clone(),
            metadata: self.versioned_metadata(asset),
        }
    }

    /// Copy request for the alias; `source_key` is the key the write step returned.
    pub fn copy_request(&self, asset: &AssetDescriptor, target: &EnvironmentTarget, source_key: &str) -> CopyObjectRequest {
        CopyObjectRequest {
            bucket: target.bucket.clone(),
            source_key: source_key.to_string(),
            dest_key: self.alias_key.clone(),
            content_type: self.headers.content_type.clone(),
            content_disposition: self.headers.content_disposition.clone(),
            cache_control: self.headers.latest_cache_control.clone(),
            server_side_encryption: self.headers.server_side_encryption.clone(),
            metadata: self.alias_metadata(asset, source_key),
        }
    }

    pub fn preview(&self, asset: &AssetDescriptor, target: &EnvironmentTarget) -> PreviewRecord {
        PreviewRecord {
            dry_run: true,
            env: target.env,
            aws_account_id: target.account_id.clone(),
            bucket: target.bucket.clone(),
            domain: target.domain.clone(),
            source_file: display_path(&asset.file_path),
            event: asset.event.clone(),
            type_code: asset.type_code.clone(),
            slug: asset.slug.clone(),
            version_tag: asset.version_tag.clone(),
            content_hash: self.content_hash.clone(),
            key_versioned_preview: self.versioned_key.clone(),
            s3_uri_versioned_preview: target.s3_uri(&self.versioned_key),
            cloudfront_url_versioned_preview: target.public_url(&self.versioned_key),
            key_latest_preview: self.alias_key.clone(),
            s3_uri_latest_preview: target.s3_uri(&self.alias_key),
            cloudfront_url_latest_preview: target.public_url(&self.alias_key),
            headers: self.headers.clone(),
        }
    }
}

/// Path as echoed in the preview, with `.` components dropped. `components()`
/// alone keeps a leading `./`.
fn display_path(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect::<PathBuf>()
        .display()
        .to_string()
}

fn committed(target: &EnvironmentTarget, versioned_key: &str, alias_key: &str) -> CommittedRecord {
    CommittedRecord {
        env: target.env,
        aws_account_id: target.account_id.clone(),
        bucket: target.bucket.clone(),
        domain: target.domain.clone(),
        key_versioned: versioned_key.to_string(),
        s3_uri_versioned: target.s3_uri(versioned_key),
        cloudfront_url_versioned: target.public_url(versioned_key),
        key_latest: alias_key.to_string(),
        s3_uri_latest: target.s3_uri(alias_key),
        cloudfront_url_latest: target.public_url(alias_key),
    }
}

/// Publishes `asset` to an already resolved environment.
///
/// Callable without `run_upload`, so inputs are validated again here and the
/// returned extension feeds the filename. A bad version tag never reaches
/// hashing or the store.
pub async fn publish_asset<S>(
    asset: &AssetDescriptor,
    target: &EnvironmentTarget,
    store: &S,
    dry_run: bool,
    logger: &Logger,
) -> AppResult<UploadResult>
where
    S: ObjectStore + ?Sized,
{
    let ext = InputValidator::validate_inputs(&asset.file_path, &asset.version_tag)?;

    let data = tokio::fs::read(&asset.file_path).await?;
    let plan = PublicationPlan::build(asset, &ext, &data);
    logger.info(
        "Derived object keys",
        log_data!(
            "content_hash" => plan.content_hash,
            "key_versioned" => plan.versioned_key,
            "key_latest" => plan.alias_key
        ),
    );

    if dry_run {
        logger.info("Dry run, skipping S3 writes", None);
        return Ok(UploadResult::Preview(plan.preview(asset, target)));
    }

    let put = plan.put_request(asset, target, data);
    let versioned_key = store.put_object(put).await.inspect_err(|e| {
        logger.error("Versioned upload failed", log_data!("error" => e.to_string()));
    })?;
    logger.info(
        "Uploaded versioned object",
        log_data!("bucket" => target.bucket, "key" => versioned_key),
    );

    let copy = plan.copy_request(asset, target, &versioned_key);
    store.copy_object(copy).await.inspect_err(|e| {
        logger.error(
            "Alias copy failed; versioned object is kept",
            log_data!("key_versioned" => versioned_key, "error" => e.to_string()),
        );
    })?;
    logger.info(
        "Updated latest alias",
        log_data!("key_latest" => plan.alias_key, "points_to" => versioned_key),
    );

    Ok(UploadResult::Committed(committed(target, &versioned_key, &plan.alias_key)))
}

/// Full uploader flow: validate, resolve the environment, then publish.
///
/// The identity resolver is consulted in dry-run mode too; only the store is
/// left untouched.
pub async fn run_upload<R, S>(
    asset: &AssetDescriptor,
    dry_run: bool,
    config: &Config,
    resolver: &R,
    store: &S,
    logger: &Logger,
) -> AppResult<UploadResult>
where
    R: IdentityResolver + ?Sized,
    S: ObjectStore + ?Sized,
{
    InputValidator::validate_inputs(&asset.file_path, &asset.version_tag)?;

    let target = resolve_target(config, resolver).await?;
    logger.info(
        "Resolved environment",
        log_data!(
            "env" => target.env,
            "account_id" => target.account_id,
            "bucket" => target.bucket
        ),
    );

    publish_asset(asset, &target, store, dry_run, logger).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::identity::testing::FixedIdentity;
    use crate::models::Environment;
    use crate::store::testing::{RecordingStore, StoreCall};
    use crate::utils::short_hash;
    use tempfile::TempDir;

    const DEV_ACCOUNT: &str = "022731370203";

    fn write_asset(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn asset(path: &Path, version_tag: &str) -> AssetDescriptor {
        AssetDescriptor {
            file_path: path.to_path_buf(),
            event: "iccv2025".to_string(),
            type_code: "s".to_string(),
            slug: "talk".to_string(),
            version_tag: version_tag.to_string(),
            lang: Some("ja".to_string()),
            variant: None,
        }
    }

    fn logger() -> Logger {
        Logger::new("test-run".to_string())
    }

    #[tokio::test]
    async fn dry_run_previews_without_writing_but_still_resolves_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_asset(&dir, "opening.pdf", b"%PDF-1.7 slides");
        let resolver = FixedIdentity::new(DEV_ACCOUNT);
        let store = RecordingStore::default();

        let result = run_upload(&asset(&path, "v1.0.0"), true, &Config::default(), &resolver, &store, &logger())
            .await
            .unwrap();

        assert_eq!(resolver.calls(), 1);
        assert!(store.calls().is_empty());

        let hash = short_hash(b"%PDF-1.7 slides", 12);
        let UploadResult::Preview(preview) = result else {
            panic!("expected a preview");
        };
        assert!(preview.dry_run);
        assert_eq!(preview.env, Environment::Dev);
        assert_eq!(preview.content_hash, hash);
        assert_eq!(preview.key_versioned_preview, format!("iccv2025/s/talk_v1.0.0_{hash}-ja.pdf"));
        assert_eq!(preview.key_latest_preview, "iccv2025/s/talk_latest-ja.pdf");
        assert_eq!(
            preview.s3_uri_latest_preview,
            "s3://dev-limitlab-webpage-cdn-cloudfront-origin/iccv2025/s/talk_latest-ja.pdf"
        );
        assert_eq!(
            preview.cloudfront_url_latest_preview,
            "https://cdn.dev.limitlab.xyz/iccv2025/s/talk_latest-ja.pdf"
        );
        assert_eq!(preview.headers.content_type, "application/pdf");
        assert_eq!(preview.headers.content_disposition.as_deref(), Some("inline; filename=\"opening.pdf\""));

        let json = serde_json::to_value(UploadResult::Preview(preview)).unwrap();
        assert_eq!(json["type"], "s");
        assert_eq!(json["aws_account_id"], DEV_ACCOUNT);
    }

    #[tokio::test]
    async fn upload_writes_versioned_then_copies_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_asset(&dir, "poster.png", b"\x89PNG poster");
        let resolver = FixedIdentity::new(DEV_ACCOUNT);
        let store = RecordingStore::default();

        let result = run_upload(&asset(&path, "v2025-10-19"), false, &Config::default(), &resolver, &store, &logger())
            .await
            .unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        let (StoreCall::Put(put), StoreCall::Copy(copy)) = (&calls[0], &calls[1]) else {
            panic!("expected put then copy, got {calls:?}");
        };

        assert_eq!(put.body, b"\x89PNG poster");
        assert_eq!(put.cache_control, VERSIONED_CACHE_CONTROL);
        assert_eq!(put.server_side_encryption, "AES256");
        assert_eq!(put.content_type, "image/png");
        assert!(put.content_disposition.is_none());
        assert_eq!(put.checksum_sha256, crate::utils::checksum_b64(b"\x89PNG poster"));
        assert_eq!(put.metadata[META_ORIGINAL_FILENAME], "poster.png");
        assert_eq!(put.metadata[META_VERSION_TAG], "v2025-10-19");
        assert!(!put.metadata.contains_key(META_ALIAS));

        assert_eq!(copy.source_key, put.key);
        assert_eq!(copy.dest_key, "iccv2025/s/talk_latest-ja.png");
        assert_eq!(copy.cache_control, ALIAS_CACHE_CONTROL);
        assert_ne!(copy.cache_control, put.cache_control);
        assert_eq!(copy.metadata[META_ALIAS], "latest");
        assert_eq!(copy.metadata[META_POINTS_TO], put.key);

        let UploadResult::Committed(record) = result else {
            panic!("expected a committed record");
        };
        assert_eq!(record.key_versioned, put.key);
        assert_eq!(record.key_latest, copy.dest_key);
        assert_eq!(record.cloudfront_url_versioned, format!("https://cdn.dev.limitlab.xyz/{}", put.key));
    }

    #[tokio::test]
    async fn naming_is_deterministic_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_asset(&dir, "talk.pdf", b"same bytes");
        let target = Config::default().resolve(DEV_ACCOUNT).unwrap();
        let store = RecordingStore::default();
        let asset = asset(&path, "v1");

        let first = publish_asset(&asset, &target, &store, true, &logger()).await.unwrap();
        let second = publish_asset(&asset, &target, &store, true, &logger()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn malformed_version_tag_is_rejected_before_any_network_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_asset(&dir, "talk.pdf", b"bytes");
        let resolver = FixedIdentity::new(DEV_ACCOUNT);
        let store = RecordingStore::default();

        let err = run_upload(&asset(&path, "2025-10-19"), false, &Config::default(), &resolver, &store, &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidArgument { .. }));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(resolver.calls(), 0);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_account_aborts_before_reading_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_asset(&dir, "talk.pdf", b"bytes");
        let resolver = FixedIdentity::new("123456789012");
        let store = RecordingStore::default();

        let err = run_upload(&asset(&path, "v1"), false, &Config::default(), &resolver, &store, &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnrecognizedEnvironment { .. }));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_write_skips_the_alias_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_asset(&dir, "talk.pdf", b"bytes");
        let target = Config::default().resolve(DEV_ACCOUNT).unwrap();
        let store = RecordingStore { fail_put: true, ..Default::default() };

        let err = publish_asset(&asset(&path, "v1"), &target, &store, false, &logger())
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 3);
        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], StoreCall::Put(_)));
    }

    #[tokio::test]
    async fn failed_copy_keeps_the_versioned_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_asset(&dir, "talk.pdf", b"bytes");
        let target = Config::default().resolve(DEV_ACCOUNT).unwrap();
        let store = RecordingStore { fail_copy: true, ..Default::default() };

        let err = publish_asset(&asset(&path, "v1"), &target, &store, false, &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StoreClient { .. }));
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn pdf_upload_carries_disposition_and_full_metadata_on_both_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_asset(&dir, "opening.pdf", b"%PDF-1.7 keynote");
        let target = Config::default().resolve(DEV_ACCOUNT).unwrap();
        let store = RecordingStore::default();

        publish_asset(&asset(&path, "v1.2.0"), &target, &store, false, &logger())
            .await
            .unwrap();

        let calls = store.calls();
        let (StoreCall::Put(put), StoreCall::Copy(copy)) = (&calls[0], &calls[1]) else {
            panic!("expected put then copy, got {calls:?}");
        };
        let hash = short_hash(b"%PDF-1.7 keynote", 12);
        let disposition = Some("inline; filename=\"opening.pdf\"".to_string());

        assert_eq!(put.content_type, "application/pdf");
        assert_eq!(put.content_disposition, disposition);
        assert_eq!(put.metadata[META_CONTENT_HASH], hash);
        assert_eq!(put.metadata[META_ORIGINAL_FILENAME], "opening.pdf");
        assert_eq!(put.metadata[META_VERSION_TAG], "v1.2.0");

        assert_eq!(copy.content_type, put.content_type);
        assert_eq!(copy.content_disposition, disposition);
        assert_eq!(copy.server_side_encryption, "AES256");
        assert_eq!(copy.metadata[META_ORIGINAL_FILENAME], "opening.pdf");
        assert_eq!(copy.metadata[META_VERSION_TAG], "v1.2.0");
        assert_eq!(copy.metadata[META_CONTENT_HASH], hash);
        assert_eq!(copy.metadata[META_ALIAS], "latest");
        assert_eq!(copy.metadata[META_POINTS_TO], format!("iccv2025/s/talk_v1.2.0_{hash}-ja.pdf"));
    }

    #[test]
    fn preview_source_file_drops_current_dir_components() {
        assert_eq!(display_path(Path::new("./slides/x.pdf")), "slides/x.pdf");
        assert_eq!(display_path(Path::new("slides/./x.pdf")), "slides/x.pdf");
        assert_eq!(display_path(Path::new("/tmp/x.pdf")), "/tmp/x.pdf");

        let target = Config::default().resolve(DEV_ACCOUNT).unwrap();
        let asset = asset(Path::new("./slides/x.pdf"), "v1");
        let preview = PublicationPlan::build(&asset, ".pdf", b"x").preview(&asset, &target);
        assert_eq!(preview.source_file, "slides/x.pdf");
    }

    #[test]
    fn plan_without_optional_suffixes() {
        let asset = AssetDescriptor {
            file_path: "deck/final.key.pdf".into(),
            event: "/cvpr2026/".to_string(),
            type_code: "p".to_string(),
            slug: "poster".to_string(),
            version_tag: "v3".to_string(),
            lang: None,
            variant: Some("-w1200".to_string()),
        };
        let plan = PublicationPlan::build(&asset, ".pdf", b"x");
        let hash = short_hash(b"x", 12);
        assert_eq!(plan.versioned_key, format!("cvpr2026/p/poster_v3_{hash}-w1200.pdf"));
        assert_eq!(plan.alias_key, "cvpr2026/p/poster_latest-w1200.pdf");
        assert_eq!(plan.original_filename, "final.key.pdf");
    }
}
