mod common;

use common::*;
use pdf_convert::*;
use std::sync::Arc;

#[test]
fn test_downscales_longer_side() {
    let image = SourceImage::new("wide.png", "image/png", noisy_png_bytes(400, 300));
    let result = recompress(&image, 0.8, 100).unwrap();

    assert_eq!(result.image.dimensions(), Some(Dimensions::new(100, 75)));
    assert_eq!(result.image.mime(), "image/jpeg");
    assert_eq!(result.image.name(), "compressed-wide.png");
    assert_eq!(result.original_bytes, image.len());
    assert_eq!(result.compressed_bytes, result.image.len());

    // The output really is that size
    let decoded = image::load_from_memory(result.image.bytes()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 75));
}

#[test]
fn test_small_images_keep_their_size() {
    let image = SourceImage::new("small.jpg", "image/jpeg", jpeg_bytes(64, 32, [10, 200, 30]));
    let result = recompress(&image, 0.5, 1920).unwrap();
    assert_eq!(result.image.dimensions(), Some(Dimensions::new(64, 32)));
}

#[test]
fn test_recompressing_twice_stays_bounded() {
    let image = SourceImage::new("tall.png", "image/png", noisy_png_bytes(120, 500));
    let once = recompress(&image, 0.7, 200).unwrap();
    let twice = recompress(&once.image, 0.7, 200).unwrap();

    for result in [&once, &twice] {
        let dims = result.image.dimensions().unwrap();
        assert!(dims.longest_side() <= 200);
    }
    assert_eq!(twice.image.dimensions(), once.image.dimensions());
}

#[test]
fn test_reduction_is_reported() {
    let image = SourceImage::new("big.png", "image/png", noisy_png_bytes(300, 300));
    let result = recompress(&image, 0.3, 100).unwrap();

    let expected = (result.original_bytes as f64 - result.compressed_bytes as f64)
        / result.original_bytes as f64
        * 100.0;
    assert_eq!(result.reduction_percent(), expected);
    assert!(result.reduction_percent() > 0.0);
}

#[test]
fn test_unsupported_input() {
    let image = SourceImage::new("doc.txt", "text/plain", b"hello".to_vec());
    assert!(matches!(
        recompress(&image, 0.8, 100),
        Err(ConvertError::UnsupportedImageKind { .. })
    ));

    let image = SourceImage::new("a.png", "image/png", png_bytes(4, 4, [0, 0, 0, 255]));
    assert!(matches!(
        recompress(&image, 0.0, 100),
        Err(ConvertError::Config(_))
    ));
    assert!(matches!(
        recompress(&image, 0.8, 0),
        Err(ConvertError::Config(_))
    ));
}

#[tokio::test]
async fn test_batch_reports_failures_per_item() {
    let pool = WorkerPool::new(2);
    let images: Vec<_> = [
        SourceImage::new("a.png", "image/png", noisy_png_bytes(200, 100)),
        SourceImage::new("b.png", "image/png", b"not a png".to_vec()),
        SourceImage::new("c.jpg", "image/jpeg", jpeg_bytes(150, 150, [1, 2, 3])),
    ]
    .into_iter()
    .map(Arc::new)
    .collect();
    let options = RecompressOptions {
        quality: 0.6,
        max_dimension_px: 100,
    };

    let outcome = recompress_batch(&pool, &images, &options).await.unwrap();

    let names: Vec<_> = outcome.succeeded.iter().map(|r| r.image.name()).collect();
    assert_eq!(names, vec!["compressed-a.png", "compressed-c.jpg"]);

    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].index, 1);
    assert_eq!(outcome.failed[0].name, "b.png");
    assert_eq!(
        outcome.failed[0].error.category(),
        ErrorCategory::UnsupportedFile
    );

    assert_eq!(
        outcome.total_original_bytes(),
        images[0].len() + images[2].len()
    );
}

#[tokio::test]
async fn test_batch_rejects_invalid_options() {
    let pool = WorkerPool::new(1);
    let images = vec![png_image("a.png", 10, 10)];
    let options = RecompressOptions {
        quality: 2.0,
        max_dimension_px: 1920,
    };
    assert!(matches!(
        recompress_batch(&pool, &images, &options).await,
        Err(ConvertError::Config(_))
    ));
}

#[tokio::test]
async fn test_ingest_then_compress() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("photo.png");
    let txt = dir.path().join("notes.txt");
    std::fs::write(&png, noisy_png_bytes(50, 40)).unwrap();
    std::fs::write(&txt, b"hello").unwrap();

    let mut files = Vec::new();
    for path in [&png, &txt] {
        files.push(read_incoming(path).await.unwrap());
    }
    let ingested = ingest(files, MimeFamily::Image, SniffPolicy::default());
    assert_eq!(ingested.skipped, 1);

    let images: Vec<_> = ingested
        .accepted
        .into_iter()
        .map(|f| Arc::new(f.into_source_image()))
        .collect();
    let outcome = recompress_batch(&WorkerPool::new(1), &images, &RecompressOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.succeeded.len(), 1);
    assert!(outcome.failed.is_empty());
}
