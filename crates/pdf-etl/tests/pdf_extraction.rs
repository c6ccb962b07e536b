//! Page extraction from generated PDFs

mod common;

use common::{pdf_bytes, PageSpec};
use pdf_etl::normalize::{normalize_image_metadata, RawValue};
use pdf_etl::{Actions, Error, PageSource, PdfExtractor, UnitKind};

#[test]
fn test_text_from_courier_page() {
    let bytes = pdf_bytes(&[PageSpec::text(&["Hello World!"])]);
    let extractor = PdfExtractor::from_bytes(&bytes).unwrap();

    assert_eq!(extractor.page_count(), 1);
    let page = extractor.page(1);
    let text = page.text.unwrap().unwrap();
    assert!(text.contains("Hello"), "unexpected text: {:?}", text);
    assert!(page.images.unwrap().is_empty());
}

#[test]
fn test_space_aligned_lines_become_table() {
    let bytes = pdf_bytes(&[PageSpec::text(&[
        "Inventory",
        "Item    Qty",
        "bolt    4",
        "nut     12",
    ])]);
    let extractor = PdfExtractor::from_bytes(&bytes).unwrap();
    let tables = extractor.page(1).tables.unwrap();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].len(), 3);
    assert_eq!(tables[0][1], vec![RawValue::from("bolt"), RawValue::from("4")]);
}

#[test]
fn test_drawn_image_descriptor() {
    let bytes = pdf_bytes(&[PageSpec::text(&["Figure 1"]).with_image()]);
    let extractor = PdfExtractor::from_bytes(&bytes).unwrap();
    let images = extractor.page(1).images.unwrap();

    assert_eq!(images.len(), 1);
    let map = images[0].as_map().unwrap();
    assert_eq!(map["name"], RawValue::from("Im1"));
    assert_eq!(map["page_number"], RawValue::Int(1));
    assert_eq!(map["x0"], RawValue::Float(50.0));
    assert_eq!(map["y1"], RawValue::Float(700.0));
    assert_eq!(map["width"], RawValue::Float(200.0));
    assert_eq!(map["height"], RawValue::Float(100.0));
    // media box is inherited from the page tree: 792pt high
    assert_eq!(map["top"], RawValue::Float(92.0));
    assert_eq!(map["srcsize"], RawValue::List(vec![RawValue::Int(2), RawValue::Int(2)]));
    assert_eq!(map["bits"], RawValue::Int(8));
    assert_eq!(map["imagemask"], RawValue::Bool(false));
    assert_eq!(map["stream"], RawValue::Bytes(vec![0x00, 0x40, 0x80, 0xff]));

    let metadata = normalize_image_metadata(&images[0]);
    assert!(metadata.get("stream").is_none());
    assert_eq!(metadata["colorspace"], "/DeviceGray");
    assert_eq!(metadata["width"], 200.0);
    serde_json::to_string(&metadata).unwrap();
}

#[test]
fn test_shared_resources_do_not_leak_images() {
    let bytes = pdf_bytes(&[
        PageSpec::text(&["with picture"]).with_image(),
        PageSpec::text(&["without picture"]),
    ]);
    let extractor = PdfExtractor::from_bytes(&bytes).unwrap();

    assert_eq!(extractor.page(1).images.unwrap().len(), 1);
    assert!(extractor.page(2).images.unwrap().is_empty());
}

#[test]
fn test_actions_from_pdf() {
    let bytes = pdf_bytes(&[
        PageSpec::text(&["Hello World!"]).with_image(),
        PageSpec::text(&["Second page"]),
    ]);
    let extractor = PdfExtractor::from_bytes(&bytes).unwrap();
    let actions: Vec<_> = Actions::new(extractor, "sample", "pdf_data").collect();

    let ids: Vec<_> = actions.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["sample_para_1_0", "sample_img_1_0", "sample_para_2_0"]);
    assert_eq!(actions[1].source.kind, UnitKind::Image);
    assert_eq!(actions[1].source.caption.as_deref(), Some(""));
}

#[test]
fn test_missing_page_is_extraction_error() {
    let bytes = pdf_bytes(&[PageSpec::text(&["only page"])]);
    let extractor = PdfExtractor::from_bytes(&bytes).unwrap();
    let page = extractor.page(5);

    assert!(matches!(page.text, Err(Error::Extraction { page: 5, .. })));
    assert!(page.tables.is_err());
    assert!(page.images.is_err());
}

#[test]
fn test_open_missing_file() {
    let err = PdfExtractor::open("/nonexistent/report.pdf").unwrap_err();
    assert!(matches!(err, Error::DocumentOpen { .. }));
    assert!(err.to_string().contains("report.pdf"));
}
