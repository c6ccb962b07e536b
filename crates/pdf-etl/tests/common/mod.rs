//! Shared helpers: PDFs built with lopdf at test time

#![allow(dead_code)]

pub mod stub_server;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

/// One page of a generated PDF
#[derive(Default)]
pub struct PageSpec {
    /// Lines of text, one `BT ... ET` block each
    pub lines: Vec<String>,
    /// Draw a 2x2 grey image at (50, 600) scaled to 200x100
    pub image: bool,
}

impl PageSpec {
    pub fn text(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            image: false,
        }
    }

    pub fn with_image(mut self) -> Self {
        self.image = true;
        self
    }
}

/// Build a PDF with a Courier font, US Letter pages inherited from the page tree
pub fn build_pdf(pages: &[PageSpec]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0x00, 0x40, 0x80, 0xff],
    ));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let mut kids = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        let mut y: i64 = 700;
        for line in &page.lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![72.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
            operations.push(Operation::new("ET", vec![]));
            y -= 20;
        }
        if page.image {
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![200.into(), 0.into(), 0.into(), 100.into(), 50.into(), 600.into()],
            ));
            operations.push(Operation::new("Do", vec!["Im1".into()]));
            operations.push(Operation::new("Q", vec![]));
        }

        let content = Content { operations };
        let encoded = content.encode().expect("content encodes");
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Write a generated PDF into `dir`
pub fn write_pdf(dir: &Path, name: &str, pages: &[PageSpec]) -> PathBuf {
    let path = dir.join(name);
    let mut doc = build_pdf(pages);
    doc.save(&path).expect("pdf saved");
    path
}

/// Serialized bytes of a generated PDF
pub fn pdf_bytes(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = build_pdf(pages);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("pdf serialized");
    bytes
}
