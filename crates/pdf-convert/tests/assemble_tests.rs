mod common;

use common::*;
use lopdf::{Document, Object, ObjectId};
use pdf_convert::*;
use std::sync::Arc;

fn a4_geometry() -> PageGeometry {
    AssemblyOptions::default().geometry().unwrap()
}

/// Filter of the image drawn on `page_id`, plus the stream itself
fn page_image(doc: &Document, page_id: ObjectId) -> (Option<Vec<u8>>, lopdf::Stream) {
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
    let stream = doc
        .get_object(image_id)
        .unwrap()
        .as_stream()
        .unwrap()
        .clone();
    let filter = stream
        .dict
        .get(b"Filter")
        .ok()
        .and_then(|f| f.as_name().ok())
        .map(|f| f.to_vec());
    (filter, stream)
}

#[tokio::test]
async fn test_mixed_orientations_on_a4() {
    let pool = WorkerPool::new(2);
    let images = vec![
        png_image("landscape.png", 800, 600),
        png_image("portrait.png", 600, 800),
        png_image("square.png", 1000, 1000),
    ];

    let doc = assemble(&pool, &images, a4_geometry(), FitMode::Contain)
        .await
        .unwrap();
    assert_eq!(doc.page_count(), 3);

    for page in doc.pages() {
        let placement = page.placement();
        assert!(placement.x >= 10.0 - 1e-3);
        assert!(placement.y >= 10.0 - 1e-3);
        assert!(placement.right() <= 200.0 + 1e-3);
        assert!(placement.bottom() <= 287.0 + 1e-3);
    }

    // All three are relatively wider than the 190 x 277 area
    let first = doc.pages()[0].placement();
    assert!((first.width - 190.0).abs() < 1e-3);
    assert!((first.height - 142.5).abs() < 1e-3);
    assert!((first.y - (10.0 + (277.0 - 142.5) / 2.0)).abs() < 1e-3);

    let second = doc.pages()[1].placement();
    assert!((second.width - 190.0).abs() < 1e-3);
    assert!((second.height - 253.333).abs() < 1e-2);
}

#[tokio::test]
async fn test_pages_follow_input_order() {
    let pool = WorkerPool::new(4);
    let images: Vec<_> = (0..12)
        .map(|i| png_image(&format!("img-{i}.png"), 10 + i, 20))
        .collect();

    let doc = assemble(&pool, &images, a4_geometry(), FitMode::Cover)
        .await
        .unwrap();
    let names: Vec<_> = doc
        .pages()
        .iter()
        .map(|p| p.image().name().to_string())
        .collect();
    let expected: Vec<_> = (0..12).map(|i| format!("img-{i}.png")).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_empty_input_is_rejected() {
    let pool = WorkerPool::new(1);
    let result = assemble(&pool, &[], a4_geometry(), FitMode::Contain).await;
    assert!(matches!(result, Err(ConvertError::EmptyInput)));
}

#[tokio::test]
async fn test_one_bad_image_fails_the_assembly() {
    let pool = WorkerPool::new(2);
    let images = vec![
        png_image("ok.png", 10, 10),
        Arc::new(SourceImage::new(
            "notes.txt",
            "text/plain",
            b"hello".to_vec(),
        )),
        png_image("also-ok.png", 10, 10),
    ];
    let result = assemble(&pool, &images, a4_geometry(), FitMode::Contain).await;
    assert!(matches!(
        result,
        Err(ConvertError::UnsupportedImageKind { .. })
    ));

    let truncated = Arc::new(SourceImage::new("broken.png", "image/png", vec![0x89]));
    let result = assemble(&pool, &[truncated], a4_geometry(), FitMode::Contain).await;
    assert!(matches!(
        result,
        Err(ConvertError::UnsupportedImageKind { .. })
    ));
}

#[test]
fn test_known_dimensions_skip_probing() {
    // The payload is not decodable, but the declared size is enough to lay out
    let image = Arc::new(
        SourceImage::new("lazy.png", "image/png", Vec::new()).with_dimensions(400, 200),
    );
    let page = compose_page(&image, &a4_geometry(), FitMode::Contain).unwrap();
    assert_eq!(page.source_dimensions(), Dimensions::new(400, 200));
    assert!((page.placement().height - 95.0).abs() < 1e-3);
}

#[test]
fn test_cover_placement_is_clipped() {
    let image = png_image("wide.png", 400, 100);
    let page = compose_page(&image, &a4_geometry(), FitMode::Cover).unwrap();

    assert!(page.placement().width > 190.0);
    assert_eq!(page.visible_rect(), page.clip_rect());
}

#[tokio::test]
async fn test_embedding_by_kind() {
    let pool = WorkerPool::new(2);
    let jpeg = jpeg_bytes(32, 16, [200, 10, 10]);
    let images = vec![
        Arc::new(SourceImage::new("a.jpg", "image/jpeg", jpeg.clone())),
        Arc::new(SourceImage::new(
            "b.png",
            "image/png",
            png_bytes(8, 8, [0, 0, 255, 128]),
        )),
        Arc::new(SourceImage::new(
            "c.bmp",
            "image/bmp",
            encode(
                image::DynamicImage::new_rgb8(8, 8),
                image::ImageFormat::Bmp,
            ),
        )),
    ];

    let assembled = assemble(&pool, &images, a4_geometry(), FitMode::Contain)
        .await
        .unwrap();
    let doc = assembled.to_pdf(Some("test")).unwrap();
    let page_ids: Vec<_> = doc.get_pages().values().copied().collect();
    assert_eq!(page_ids.len(), 3);

    // JPEG passes through untouched
    let (filter, stream) = page_image(&doc, page_ids[0]);
    assert_eq!(filter.as_deref(), Some(&b"DCTDecode"[..]));
    assert_eq!(stream.content, jpeg);

    // PNG is stored losslessly, alpha in a soft mask
    let (filter, stream) = page_image(&doc, page_ids[1]);
    assert_eq!(filter.as_deref(), Some(&b"FlateDecode"[..]));
    assert!(stream.dict.get(b"SMask").is_ok());

    // Anything else is re-encoded as JPEG
    let (filter, stream) = page_image(&doc, page_ids[2]);
    assert_eq!(filter.as_deref(), Some(&b"DCTDecode"[..]));
    assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 8);
}

#[tokio::test]
async fn test_page_content_clips_and_places() {
    let pool = WorkerPool::new(1);
    let images = [png_image("a.png", 50, 50)];
    let doc = assemble(&pool, &images, a4_geometry(), FitMode::Contain)
        .await
        .unwrap()
        .to_pdf(None)
        .unwrap();

    let contents = page_contents(&doc);
    assert_eq!(contents.len(), 1);
    assert!(contents[0].contains("rg 0 0"));
    assert!(contents[0].contains("re W n"));
    assert!(contents[0].contains("/Im0 Do"));

    let page_id = *doc.get_pages().values().next().unwrap();
    let media_box = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .clone();
    let width = media_box[2].as_float().unwrap();
    assert!((width - 595.2756).abs() < 1e-2);
}

#[tokio::test]
async fn test_write_pdf_round_trip() {
    let pool = WorkerPool::default();
    let images: Vec<_> = (0..4)
        .map(|i| png_image(&format!("{i}.png"), 30, 20))
        .collect();
    let assembled = assemble(&pool, &images, a4_geometry(), FitMode::Contain)
        .await
        .unwrap();

    let bytes = assembled.write_pdf(&pool, Some("holiday")).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(naming::assembly_file_name("holiday"));
    std::fs::write(&path, &bytes).unwrap();

    let loaded = load_pdf(&path).await.unwrap();
    assert_eq!(loaded.get_pages().len(), 4);

    let info_id = loaded.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = loaded.get_dictionary(info_id).unwrap();
    match info.get(b"Title").unwrap() {
        Object::String(title, _) => assert_eq!(title, b"holiday"),
        other => panic!("unexpected title {:?}", other),
    }
}
