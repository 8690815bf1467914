use super::*;

#[test]
fn small_runs_pad_to_five() {
    assert_eq!(pad_width(1), 5);
    assert_eq!(pad_width(42), 5);
    assert_eq!(pad_width(99_999), 5);
    assert_eq!(output_filename("prefix", 1, 42), "prefix-00001.png");
    assert_eq!(output_filename("prefix", 42, 42), "prefix-00042.png");
}

#[test]
fn large_runs_widen_padding() {
    assert_eq!(pad_width(100_000), 6);
    assert_eq!(pad_width(123_456), 6);
    assert_eq!(output_filename("v", 7, 123_456), "v-000007.png");
    assert_eq!(output_filename("v", 123_456, 123_456), "v-123456.png");
}

#[test]
fn names_sort_in_step_order() {
    let total = 120_000;
    let mut names: Vec<_> = [1u64, 9, 10, 99_999, 100_000, 119_999]
        .iter()
        .map(|&s| output_filename("x", s, total))
        .collect();
    let expected = names.clone();
    names.sort();
    assert_eq!(names, expected);
}

#[test]
fn blank_prefix_falls_back() {
    assert_eq!(normalize_prefix("  "), DEFAULT_PREFIX);
    assert_eq!(normalize_prefix(" hero "), "hero");
}

#[test]
fn progress_passes_through() {
    let p = Progress::new(3, 6);
    assert_eq!((p.current, p.total), (3, 6));
    assert!((p.fraction() - 0.5).abs() < f64::EPSILON);
    assert!(!p.is_done());
    assert!(Progress::new(6, 6).is_done());
    assert_eq!(Progress::default().current, 0);
    assert_eq!(p.to_string(), "3/6");
}
