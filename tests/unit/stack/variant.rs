use std::io::Cursor;

use super::*;
use crate::assets::decode::png_data_url;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([9, 8, 7, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn source_reference_roundtrip() {
    let p = VariantSource::parse("art/hat.png");
    assert_eq!(p, VariantSource::Path(PathBuf::from("art/hat.png")));
    assert_eq!(p.to_reference(), "art/hat.png");

    let e = VariantSource::parse("data:image/png;base64,AAAA");
    assert!(matches!(e, VariantSource::Embedded(_)));
    assert_eq!(e.to_reference(), "data:image/png;base64,AAAA");
}

#[test]
fn from_path_names_after_file_and_builds_thumbnail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eyes_blue.png");
    std::fs::write(&path, png(100, 60)).unwrap();

    let v = Variant::from_path(&path).unwrap();
    assert_eq!(v.name(), "eyes_blue.png");
    assert_eq!(v.source(), &VariantSource::Path(path.clone()));

    let thumb = parse_data_url(v.thumb()).unwrap();
    let decoded = image::load_from_memory(&thumb).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (40, 40));
}

#[test]
fn from_path_rejects_non_images() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.png");
    std::fs::write(&path, b"not an image").unwrap();
    assert!(Variant::from_path(&path).is_err());
}

#[test]
fn from_data_url_keeps_embedded_source() {
    let url = png_data_url(&png(2, 2));
    let v = Variant::from_data_url(url.clone(), "inline").unwrap();
    assert_eq!(v.source(), &VariantSource::Embedded(url));
    assert_eq!(v.name(), "inline");
    assert!(v.thumb().starts_with("data:image/png;base64,"));
}
