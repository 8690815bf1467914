use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn data_url_payload_is_decoded() {
    let png = png_bytes(1, 1, [1, 2, 3, 255]);
    let url = png_data_url(&png);
    assert!(url.starts_with("data:image/png;base64,"));
    assert_eq!(parse_data_url(&url).unwrap(), png);
}

#[test]
fn data_url_rejects_non_base64_forms() {
    assert!(parse_data_url("file:///tmp/x.png").is_err());
    assert!(parse_data_url("data:image/png,rawbytes").is_err());
    assert!(parse_data_url("data:image/png;base64").is_err());
}

#[test]
fn decode_fitted_stretches_to_canvas_and_premultiplies() {
    let png = png_bytes(2, 2, [100, 50, 200, 128]);
    let canvas = Canvas::new(4, 3).unwrap();
    let prepared = decode_image_fitted(&png, canvas).unwrap();
    assert_eq!(prepared.width, 4);
    assert_eq!(prepared.height, 3);
    assert_eq!(prepared.rgba8_premul.len(), canvas.rgba_len());
    assert_eq!(
        &prepared.rgba8_premul[..4],
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn encode_png_unpremultiplies_opaque_pixels_losslessly() {
    let premul = vec![10u8, 20, 30, 255, 0, 0, 0, 0];
    let png = encode_png_premul(2, 1, &premul).unwrap();
    let back = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(back.as_raw().as_slice(), premul.as_slice());
}

#[test]
fn encode_png_rejects_mismatched_buffer() {
    assert!(encode_png_premul(2, 2, &[0u8; 4]).is_err());
}

#[test]
fn read_source_reports_missing_file() {
    let src = VariantSource::Path("definitely/not/here.png".into());
    let err = read_source(&src).unwrap_err();
    assert!(err.to_string().contains("not/here.png"));
}
