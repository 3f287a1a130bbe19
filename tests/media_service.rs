//! End-to-end scenarios for the media engine: upload, compressed reads,
//! lazy and eager thumbnail derivation, policy rejections, and deletes,
//! all against a real temporary directory.

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageOutputFormat, RgbaImage};
use media_store::{
    ContentKind, MediaConfig, MediaService, MediaStoreError, ThumbnailFormat, UploadRequest,
};
use std::io::Cursor;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

fn service(config: MediaConfig) -> (TempDir, MediaService) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
    let dir = TempDir::new().unwrap();
    let service = MediaService::new(config, dir.path());
    (dir, service)
}

fn upload(content: Bytes, name: &str, extension: &str) -> UploadRequest {
    UploadRequest {
        content,
        name: name.into(),
        extension: extension.into(),
        public: true,
    }
}

fn test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 251) as u8, (y % 241) as u8, 90, 255])
    }))
}

fn png_payload(width: u32, height: u32) -> Bytes {
    let mut out = Cursor::new(Vec::new());
    test_image(width, height)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    Bytes::from(out.into_inner())
}

fn gif_payload(width: u32, height: u32) -> Bytes {
    let mut out = Cursor::new(Vec::new());
    test_image(width, height)
        .write_to(&mut out, ImageOutputFormat::Gif)
        .unwrap();
    Bytes::from(out.into_inner())
}

fn compressible_payload() -> Bytes {
    Bytes::from(b"the quick brown fox jumps over the lazy dog ".repeat(1024))
}

#[tokio::test]
async fn compressed_upload_round_trips() -> anyhow::Result<()> {
    let (_dir, service) = service(MediaConfig::default());
    let original = compressible_payload();

    let record = service
        .upload(upload(original.clone(), "notes", "txt"))
        .await?;

    assert_eq!(record.kind, ContentKind::Other);
    assert!(record.content_compressed);
    assert!((record.content_size as usize) < original.len());

    // The size on the record is the stored size, not the original one.
    let on_disk = std::fs::metadata(&record.content_path)?.len();
    assert_eq!(on_disk, record.content_size as u64);

    assert_eq!(service.get_content(&record).await?, original);
    Ok(())
}

#[tokio::test]
async fn disabled_compression_stores_verbatim() -> anyhow::Result<()> {
    let config = MediaConfig {
        compression: false,
        ..MediaConfig::default()
    };
    let (_dir, service) = service(config);
    let original = compressible_payload();

    let record = service
        .upload(upload(original.clone(), "notes", "txt"))
        .await?;

    assert!(!record.content_compressed);
    assert_eq!(record.content_size as usize, original.len());
    assert_eq!(service.get_content(&record).await?, original);
    Ok(())
}

#[tokio::test]
async fn disallowed_kind_is_rejected_without_storing() {
    let config = MediaConfig {
        allow_images: false,
        ..MediaConfig::default()
    };
    let (dir, service) = service(config);

    let err = service
        .upload(upload(png_payload(16, 16), "cat", "png"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MediaStoreError::MediaKindDisallowed(ContentKind::Image)
    ));
    assert!(!dir.path().join("content").exists());
}

#[tokio::test]
async fn eager_video_thumbnail_respects_width_bound() -> anyhow::Result<()> {
    let config = MediaConfig {
        precompute_thumbnails: true,
        thumbnail_width: Some(320),
        thumbnail_height: None,
        ..MediaConfig::default()
    };
    let (_dir, service) = service(config);

    let mut record = service
        .upload(upload(gif_payload(640, 480), "clip", "gif"))
        .await?;

    assert_eq!(record.kind, ContentKind::Video);
    assert!(record.thumbnail_path.is_some());

    let thumb = service.get_thumbnail(&mut record).await?;
    let decoded = image::load_from_memory(&thumb)?;
    assert_eq!(decoded.dimensions(), (320, 240));
    Ok(())
}

#[tokio::test]
async fn eager_derivation_failure_does_not_fail_the_upload() -> anyhow::Result<()> {
    let config = MediaConfig {
        precompute_thumbnails: true,
        ..MediaConfig::default()
    };
    let (_dir, service) = service(config);

    // Classified as an image by extension, but undecodable.
    let record = service
        .upload(upload(Bytes::from_static(b"not pixels"), "broken", "png"))
        .await?;

    assert!(record.thumbnail_path.is_none());
    assert_eq!(
        service.get_content(&record).await?,
        Bytes::from_static(b"not pixels")
    );
    Ok(())
}

#[tokio::test]
async fn other_kind_never_gets_a_thumbnail() -> anyhow::Result<()> {
    let config = MediaConfig {
        precompute_thumbnails: true,
        ..MediaConfig::default()
    };
    let (_dir, service) = service(config);

    let mut record = service
        .upload(upload(Bytes::from_static(b"hello world"), "readme", "txt"))
        .await?;
    assert!(record.thumbnail_path.is_none());

    let err = service.get_thumbnail(&mut record).await.unwrap_err();
    assert!(matches!(
        err,
        MediaStoreError::UnsupportedMediaKind(ContentKind::Other)
    ));
    assert!(record.thumbnail_path.is_none());

    service.delete(&record).await?;
    Ok(())
}

#[tokio::test]
async fn lazy_derivation_fills_the_cache_once() -> anyhow::Result<()> {
    let (_dir, service) = service(MediaConfig::default());

    let mut record = service
        .upload(upload(png_payload(800, 600), "photo", "png"))
        .await?;
    assert!(record.thumbnail_path.is_none());

    let first = service.get_thumbnail(&mut record).await?;
    let path = record.thumbnail_path.clone().unwrap();
    assert!(path.exists());

    // Later reads come from the cache: with the original content gone,
    // a re-derivation would have no bytes to work from.
    std::fs::remove_file(&record.content_path)?;
    let second = service.get_thumbnail(&mut record).await?;
    assert_eq!(first, second);

    assert!(matches!(
        service.get_content(&record).await.unwrap_err(),
        MediaStoreError::StorageReadFailed { .. }
    ));
    Ok(())
}

#[tokio::test]
async fn thumbnails_can_be_disabled_outright() -> anyhow::Result<()> {
    let config = MediaConfig {
        thumbnails: false,
        ..MediaConfig::default()
    };
    let (_dir, service) = service(config);

    let mut record = service
        .upload(upload(png_payload(64, 64), "photo", "png"))
        .await?;
    assert!(record.thumbnail_path.is_none());

    let err = service.get_thumbnail(&mut record).await.unwrap_err();
    assert!(matches!(err, MediaStoreError::ThumbnailsDisabled));
    Ok(())
}

#[tokio::test]
async fn jpeg_thumbnails_use_the_configured_format() -> anyhow::Result<()> {
    let config = MediaConfig {
        thumbnail_format: ThumbnailFormat::Jpeg,
        ..MediaConfig::default()
    };
    let (_dir, service) = service(config);

    let mut record = service
        .upload(upload(png_payload(64, 64), "photo", "png"))
        .await?;
    let thumb = service.get_thumbnail(&mut record).await?;

    let path = record.thumbnail_path.clone().unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
    assert_eq!(
        image::guess_format(&thumb)?,
        image::ImageFormat::Jpeg
    );
    Ok(())
}

#[tokio::test]
async fn delete_removes_both_artifacts_and_is_idempotent() -> anyhow::Result<()> {
    let (dir, service) = service(MediaConfig::default());

    let mut record = service
        .upload(upload(png_payload(128, 128), "photo", "png"))
        .await?;
    service.get_thumbnail(&mut record).await?;
    let thumbnail_path = record.thumbnail_path.clone().unwrap();

    service.delete(&record).await?;
    assert!(!record.content_path.exists());
    assert!(!thumbnail_path.exists());

    // Empty shard directories are pruned along the way.
    assert!(!dir.path().join("content").exists());
    assert!(!dir.path().join("thumbnails").exists());

    // A second delete converges on success.
    service.delete(&record).await?;
    Ok(())
}

#[tokio::test]
async fn delete_tolerates_already_missing_files() -> anyhow::Result<()> {
    let (_dir, service) = service(MediaConfig::default());

    let mut record = service
        .upload(upload(png_payload(64, 64), "photo", "png"))
        .await?;
    service.get_thumbnail(&mut record).await?;

    // Someone removed the thumbnail behind the engine's back.
    std::fs::remove_file(record.thumbnail_path.clone().unwrap())?;
    service.delete(&record).await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_uploads_of_the_same_name_get_distinct_placements() -> anyhow::Result<()> {
    let (_dir, service) = service(MediaConfig::default());
    let payload = png_payload(32, 32);

    let a = {
        let service = service.clone();
        let payload = payload.clone();
        tokio::spawn(async move { service.upload(upload(payload, "shared", "png")).await })
    };
    let b = {
        let service = service.clone();
        let payload = payload.clone();
        tokio::spawn(async move { service.upload(upload(payload, "shared", "png")).await })
    };

    let first = a.await??;
    let second = b.await??;

    assert_ne!(first.id, second.id);
    assert_ne!(first.content_path, second.content_path);
    assert_eq!(service.get_content(&first).await?, payload);
    assert_eq!(service.get_content(&second).await?, payload);
    Ok(())
}

#[tokio::test]
async fn concurrent_first_reads_agree_on_one_thumbnail() -> anyhow::Result<()> {
    let (_dir, service) = service(MediaConfig::default());

    let record = service
        .upload(upload(png_payload(640, 480), "busy", "png"))
        .await?;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        let mut copy = record.clone();
        tasks.push(tokio::spawn(async move {
            let bytes = service.get_thumbnail(&mut copy).await?;
            Ok::<_, MediaStoreError>((bytes, copy.thumbnail_path))
        }));
    }

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await??);
    }

    let (reference_bytes, reference_path) = &results[0];
    for (bytes, path) in &results {
        assert_eq!(bytes, reference_bytes);
        assert_eq!(path, reference_path);
    }
    Ok(())
}
