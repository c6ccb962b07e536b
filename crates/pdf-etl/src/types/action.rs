//! Indexing actions submitted to the search backend

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::unit::{ImageUnit, ParagraphUnit, TableUnit, UnitKind};
use crate::error::Result;

/// Searchable record stored in the index for one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Owning document id
    pub pdf_id: String,
    /// Unit kind
    #[serde(rename = "type")]
    pub kind: UnitKind,
    /// Page number (1-indexed)
    pub page: u32,
    /// Text of a paragraph or flattened table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Normalized image attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_metadata: Option<Value>,
    /// Image caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// One write against the index: target, deterministic id, record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexAction {
    /// Target index name
    #[serde(rename = "_index")]
    pub index: String,
    /// Deterministic document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Record body
    #[serde(rename = "_source")]
    pub source: IndexRecord,
}

impl IndexAction {
    /// `{doc_id}_{tag}_{page}_{unit_index}`
    pub fn unit_id(doc_id: &str, kind: UnitKind, page: u32, unit_index: usize) -> String {
        format!("{}_{}_{}_{}", doc_id, kind.id_tag(), page, unit_index)
    }

    /// Action for a paragraph unit
    pub fn paragraph(index: &str, unit: ParagraphUnit) -> Self {
        Self {
            index: index.to_string(),
            id: Self::unit_id(&unit.doc_id, UnitKind::Paragraph, unit.page, unit.paragraph_index),
            source: IndexRecord {
                pdf_id: unit.doc_id,
                kind: UnitKind::Paragraph,
                page: unit.page,
                content: Some(unit.text),
                image_metadata: None,
                caption: None,
            },
        }
    }

    /// Action for a table unit; content is the flattened table text
    pub fn table(index: &str, unit: TableUnit) -> Self {
        let content = unit.render();
        Self {
            index: index.to_string(),
            id: Self::unit_id(&unit.doc_id, UnitKind::Table, unit.page, unit.table_index),
            source: IndexRecord {
                pdf_id: unit.doc_id,
                kind: UnitKind::Table,
                page: unit.page,
                content: Some(content),
                image_metadata: None,
                caption: None,
            },
        }
    }

    /// Action for an image unit
    pub fn image(index: &str, unit: ImageUnit) -> Self {
        Self {
            index: index.to_string(),
            id: Self::unit_id(&unit.doc_id, UnitKind::Image, unit.page, unit.image_index),
            source: IndexRecord {
                pdf_id: unit.doc_id,
                kind: UnitKind::Image,
                page: unit.page,
                content: None,
                image_metadata: Some(unit.metadata),
                caption: Some(unit.caption),
            },
        }
    }

    /// Append this action to a bulk body: header line, then source line
    pub fn write_ndjson(&self, buf: &mut Vec<u8>) -> Result<()> {
        let header = json!({ "index": { "_index": self.index, "_id": self.id } });
        serde_json::to_writer(&mut *buf, &header)?;
        buf.push(b'\n');
        serde_json::to_writer(&mut *buf, &self.source)?;
        buf.push(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::RawValue;
    use crate::types::TableRecord;

    #[test]
    fn test_unit_ids() {
        assert_eq!(
            IndexAction::unit_id("report", UnitKind::Paragraph, 1, 0),
            "report_para_1_0"
        );
        assert_eq!(IndexAction::unit_id("r", UnitKind::Table, 4, 2), "r_table_4_2");
        assert_eq!(IndexAction::unit_id("r", UnitKind::Image, 9, 1), "r_img_9_1");
    }

    #[test]
    fn test_table_content_rendering() {
        let unit = TableUnit {
            doc_id: "r".to_string(),
            page: 2,
            table_index: 0,
            columns: vec!["A".to_string(), "B".to_string()],
            rows: vec![
                TableRecord::new(vec![
                    ("A".to_string(), RawValue::from("1")),
                    ("B".to_string(), RawValue::Null),
                ]),
                TableRecord::new(vec![
                    ("A".to_string(), RawValue::Int(3)),
                    ("B".to_string(), RawValue::from("x")),
                ]),
            ],
        };
        let action = IndexAction::table("pdf_data", unit);
        assert_eq!(action.source.content.as_deref(), Some("1, \n3, x"));
    }

    #[test]
    fn test_ndjson_lines() {
        let action = IndexAction::paragraph(
            "pdf_data",
            ParagraphUnit {
                doc_id: "report".to_string(),
                page: 1,
                paragraph_index: 0,
                text: "Intro".to_string(),
            },
        );
        let mut buf = Vec::new();
        action.write_ndjson(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        let header: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(header["index"]["_id"], "report_para_1_0");
        assert_eq!(header["index"]["_index"], "pdf_data");
        let source: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(
            source,
            json!({ "pdf_id": "report", "type": "paragraph", "page": 1, "content": "Intro" })
        );
    }

    #[test]
    fn test_image_record_fields() {
        let action = IndexAction::image(
            "pdf_data",
            ImageUnit {
                doc_id: "r".to_string(),
                page: 3,
                image_index: 0,
                metadata: json!({ "width": 10 }),
                caption: String::new(),
            },
        );
        let source = serde_json::to_value(&action.source).unwrap();
        assert_eq!(source["type"], "image");
        assert_eq!(source["caption"], "");
        assert_eq!(source["image_metadata"]["width"], 10);
        assert!(source.get("content").is_none());
    }
}
