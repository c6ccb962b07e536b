//! PDF page extraction using lopdf
//!
//! Text comes from lopdf's per-page text extraction, tables from grid
//! detection over that text, and images from every `Do` of an image XObject
//! in the page content, placed by replaying the transformation matrices.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::source::{PageSource, RawPage};
use super::tables::detect_text_grids;
use crate::error::{Error, Result};
use crate::normalize::{dictionary_entries, RawValue};

/// Upper bound on `/Parent` hops when resolving inherited page attributes
const MAX_TREE_DEPTH: usize = 32;

/// US Letter height, used when a page has no usable `/MediaBox`
const DEFAULT_PAGE_HEIGHT: f64 = 792.0;

/// Page source backed by a parsed PDF
pub struct PdfExtractor {
    doc: Document,
    /// (page number, page object) in page order
    pages: Vec<(u32, ObjectId)>,
}

impl std::fmt::Debug for PdfExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfExtractor")
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl PdfExtractor {
    /// Open a PDF file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path)
            .map_err(|e| Error::document_open(path.display().to_string(), e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    /// Parse a PDF held in memory
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(data)
            .map_err(|e| Error::document_open("<memory>", e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    fn from_document(doc: Document) -> Self {
        let pages = doc.get_pages().into_iter().collect();
        Self { doc, pages }
    }

    fn page_id(&self, number: u32) -> Option<ObjectId> {
        self.pages
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, id)| *id)
    }

    fn page_text(&self, number: u32) -> Result<Option<String>> {
        let text = self
            .doc
            .extract_text(&[number])
            .map_err(|e| Error::extraction(number, format!("text extraction failed: {}", e)))?;
        let text = text.replace('\0', "");
        Ok(if text.trim().is_empty() { None } else { Some(text) })
    }

    fn page_images(&self, number: u32, page_id: ObjectId) -> Result<Vec<RawValue>> {
        let xobjects = self
            .image_xobjects(page_id)
            .map_err(|e| Error::extraction(number, format!("image lookup failed: {}", e)))?;
        if xobjects.is_empty() {
            return Ok(Vec::new());
        }

        let placements = self
            .image_placements(page_id, &xobjects)
            .map_err(|e| Error::extraction(number, format!("content stream unreadable: {}", e)))?;
        let page_height = self.page_height(page_id);

        Ok(placements
            .into_iter()
            .map(|(slot, matrix)| describe_image(number, &xobjects[slot], matrix, page_height))
            .collect())
    }

    /// Image XObjects from the page's resources, in resource order
    fn image_xobjects(&self, page_id: ObjectId) -> Result<Vec<ImageXObject<'_>>> {
        let Some(resources) = self.inherited(page_id, b"Resources")? else {
            return Ok(Vec::new());
        };
        let resources = self.resolve(resources)?.as_dict()?;
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(Vec::new());
        };
        let xobjects = self.resolve(xobjects)?.as_dict()?;

        let mut images = Vec::new();
        for (name, entry) in xobjects.iter() {
            let object_id = entry.as_reference().ok();
            let Ok(stream) = self.resolve(entry)?.as_stream() else {
                continue;
            };
            let is_image = stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .map(|subtype| subtype == b"Image")
                .unwrap_or(false);
            if is_image {
                images.push(ImageXObject {
                    name: String::from_utf8_lossy(name).into_owned(),
                    object_id,
                    stream,
                });
            }
        }
        Ok(images)
    }

    /// (xobject slot, CTM) for every `Do` that draws one of `xobjects`
    fn image_placements(
        &self,
        page_id: ObjectId,
        xobjects: &[ImageXObject<'_>],
    ) -> Result<Vec<(usize, Matrix)>> {
        let slots: HashMap<&[u8], usize> = xobjects
            .iter()
            .enumerate()
            .map(|(slot, x)| (x.name.as_bytes(), slot))
            .collect();

        let content = self.doc.get_and_decode_page_content(page_id)?;
        let mut ctm = Matrix::IDENTITY;
        let mut saved = Vec::new();
        let mut placements = Vec::new();

        for op in &content.operations {
            match op.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => ctm = saved.pop().unwrap_or(Matrix::IDENTITY),
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.multiply(&ctm);
                    }
                }
                "Do" => {
                    let slot = op
                        .operands
                        .first()
                        .and_then(|o| o.as_name().ok())
                        .and_then(|name| slots.get(name));
                    if let Some(&slot) = slot {
                        placements.push((slot, ctm));
                    }
                }
                _ => {}
            }
        }
        Ok(placements)
    }

    fn page_height(&self, page_id: ObjectId) -> f64 {
        let media_box = self
            .inherited(page_id, b"MediaBox")
            .ok()
            .flatten()
            .and_then(|obj| self.resolve(obj).ok())
            .and_then(|obj| obj.as_array().ok())
            .map(|values| values.iter().filter_map(number).collect::<Vec<_>>());

        match media_box.as_deref() {
            Some([_, y0, _, y1]) => (y1 - y0).abs(),
            _ => DEFAULT_PAGE_HEIGHT,
        }
    }

    /// Look up a page attribute, walking `/Parent` for inherited values
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<&Object>> {
        let mut node: &Dictionary = self.doc.get_dictionary(page_id)?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return Ok(Some(value));
            }
            match node.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => node = self.doc.get_dictionary(parent)?,
                Err(_) => return Ok(None),
            }
        }
        Ok(None)
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(id) => Ok(self.doc.get_object(*id)?),
            other => Ok(other),
        }
    }
}

impl PageSource for PdfExtractor {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, number: u32) -> RawPage {
        let Some(page_id) = self.page_id(number) else {
            return RawPage::failed(number, "no such page");
        };

        let text = self.page_text(number);
        let tables = match &text {
            Ok(Some(text)) => Ok(detect_text_grids(text)),
            _ => Ok(Vec::new()),
        };
        let images = self.page_images(number, page_id);

        RawPage {
            number,
            text,
            tables,
            images,
        }
    }
}

struct ImageXObject<'a> {
    name: String,
    object_id: Option<ObjectId>,
    stream: &'a Stream,
}

/// Build the raw descriptor for one image
///
/// Stream dictionary entries come first; placement and the raw payload are
/// layered on top under lower-case keys. An image drawn twice yields two
/// descriptors.
fn describe_image(
    page_number: u32,
    xobject: &ImageXObject<'_>,
    ctm: Matrix,
    page_height: f64,
) -> RawValue {
    let dict = &xobject.stream.dict;
    let mut map: BTreeMap<String, RawValue> = dictionary_entries(dict);
    let entry = |key: &[u8]| dict.get(key).map(RawValue::from).unwrap_or(RawValue::Null);

    map.insert("name".to_string(), RawValue::from(xobject.name.as_str()));
    map.insert("page_number".to_string(), RawValue::from(page_number));
    map.insert(
        "object_id".to_string(),
        xobject
            .object_id
            .map(|(id, _)| RawValue::from(id))
            .unwrap_or(RawValue::Null),
    );
    map.insert(
        "srcsize".to_string(),
        RawValue::List(vec![entry(b"Width"), entry(b"Height")]),
    );
    map.insert("bits".to_string(), entry(b"BitsPerComponent"));
    map.insert("colorspace".to_string(), entry(b"ColorSpace"));
    map.insert("filter".to_string(), entry(b"Filter"));
    map.insert(
        "imagemask".to_string(),
        match entry(b"ImageMask") {
            RawValue::Null => RawValue::Bool(false),
            other => other,
        },
    );

    let (x0, y0, x1, y1) = ctm.unit_square_bounds();
    map.insert("x0".to_string(), RawValue::Float(x0));
    map.insert("y0".to_string(), RawValue::Float(y0));
    map.insert("x1".to_string(), RawValue::Float(x1));
    map.insert("y1".to_string(), RawValue::Float(y1));
    map.insert("top".to_string(), RawValue::Float(page_height - y1));
    map.insert("bottom".to_string(), RawValue::Float(page_height - y0));
    map.insert("width".to_string(), RawValue::Float(x1 - x0));
    map.insert("height".to_string(), RawValue::Float(y1 - y0));

    map.insert(
        "stream".to_string(),
        RawValue::Bytes(xobject.stream.content.clone()),
    );
    RawValue::Map(map)
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// PDF transformation matrix `[a b c d e f]`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values: Vec<f64> = operands.iter().filter_map(number).collect();
        match values.as_slice() {
            [a, b, c, d, e, f] => Some(Self { a: *a, b: *b, c: *c, d: *d, e: *e, f: *f }),
            _ => None,
        }
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Bounding box of the unit square under this matrix
    fn unit_square_bounds(&self) -> (f64, f64, f64, f64) {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(1.0, 0.0),
            self.apply(0.0, 1.0),
            self.apply(1.0, 1.0),
        ];
        let xs = corners.iter().map(|(x, _)| *x);
        let ys = corners.iter().map(|(_, y)| *y);
        (
            xs.clone().fold(f64::INFINITY, f64::min),
            ys.clone().fold(f64::INFINITY, f64::min),
            xs.fold(f64::NEG_INFINITY, f64::max),
            ys.fold(f64::NEG_INFINITY, f64::max),
        )
    }
}
