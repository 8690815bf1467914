use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    let c = Canvas::new(3, 2).unwrap();
    assert_eq!(c.rgba_len(), 24);
}

#[test]
fn canvas_default_matches_export_size() {
    assert_eq!(
        Canvas::default(),
        Canvas {
            width: 512,
            height: 512
        }
    );
}

#[test]
fn layer_id_display() {
    assert_eq!(LayerId(7).to_string(), "layer#7");
}
