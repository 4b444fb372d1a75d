use super::*;
use rstest::rstest;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, 50);
}

#[rstest]
#[case(1, 20, 0)]
#[case(2, 20, 20)]
#[case(3, 50, 100)]
#[case(0, 10, 0)]
fn test_page_request_offset(#[case] page: u32, #[case] per_page: u32, #[case] expected: u64) {
    assert_eq!(PageRequest::new(page, per_page).offset(), expected);
}

#[rstest]
#[case(0, 1)]
#[case(50, 50)]
#[case(5_000, 1000)]
fn test_page_request_clamps_per_page(#[case] per_page: u32, #[case] limit: u64) {
    assert_eq!(PageRequest::new(1, per_page).limit(), limit);
}

#[test]
fn test_deserialized_request_is_clamped_on_use() {
    let request: PageRequest = serde_json::from_str(r#"{"page": 2, "per_page": 0}"#).unwrap();
    assert_eq!(request.limit(), 1);
    assert_eq!(request.offset(), 1);
}

#[test]
fn test_page_response_new() {
    let rows = vec![1, 2, 3];
    let response = PageResponse::new(rows.clone(), &PageRequest::new(1, 10), 3);

    assert_eq!(response.data, rows);
    assert_eq!(
        response.meta,
        PageMeta {
            page: 1,
            per_page: 10,
            total: 3,
            total_pages: 1,
        }
    );
    assert!(!response.meta.has_next());
}

#[rstest]
#[case(25, 10, 3)]
#[case(30, 10, 3)]
#[case(31, 10, 4)]
#[case(0, 10, 1)]
fn test_page_meta_total_pages(#[case] total: u64, #[case] per_page: u32, #[case] pages: u32) {
    let meta = PageMeta::new(&PageRequest::new(1, per_page), total);
    assert_eq!(meta.total_pages, pages);
    assert_eq!(meta.has_next(), pages > 1);
}
