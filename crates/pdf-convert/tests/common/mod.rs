#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};
use pdf_convert::SourceImage;
use std::io::Cursor;
use std::sync::Arc;

pub fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    encode(DynamicImage::ImageRgba8(image), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(color));
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Jpeg)
}

/// A gradient, so that JPEG output size depends on resolution
pub fn noisy_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        let (r, g, b) = (x * 7 % 256, y * 13 % 256, (x ^ y) % 256);
        Rgb([r as u8, g as u8, b as u8])
    });
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Png)
}

pub fn png_image(name: &str, width: u32, height: u32) -> Arc<SourceImage> {
    Arc::new(SourceImage::new(
        name,
        "image/png",
        png_bytes(width, height, [0, 0, 0, 255]),
    ))
}

/// A PDF whose page content streams read `% {tag} page {n}`
pub fn create_test_pdf(num_pages: usize, tag: &str) -> Document {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for n in 1..=num_pages {
        let content = format!("% {} page {}\nq Q\n", tag, n);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));

    doc.trailer.set("Root", catalog_id);

    doc
}

pub fn pdf_bytes(mut doc: Document) -> Vec<u8> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

/// Content stream of every page, in page order
pub fn page_contents(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&id| String::from_utf8(doc.get_page_content(id).unwrap()).unwrap())
        .collect()
}
