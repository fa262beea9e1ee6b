//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface to the extraction collaborator,
//! isolating the concrete PDF library (lopdf) from the analysis model.

use std::collections::HashSet;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::layout::{
    build_text_page, collect_text_runs_with_forms, Form, FormSource, PageFrame, MAX_FORM_DEPTH,
};
use super::tree::{ImageInfo, TextPage};
use crate::detect::detect_format_from_path;
use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// US Letter, used when a page declares no media box.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A loaded page, as handed out by [`PdfBackend::load_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    /// 0-based page index
    pub index: u32,
    /// Backend-specific page identifier
    pub id: PageId,
}

/// Abstract interface for the PDF extraction collaborator.
///
/// A backend owns the parsed-file resource. Every accessor fails with
/// [`Error::DocumentClosed`] once [`PdfBackend::close`] has run.
pub trait PdfBackend {
    /// Document name, usually the path it was opened from.
    fn name(&self) -> &str;

    /// Number of pages in the document.
    fn page_count(&self) -> Result<u32>;

    /// Load the page at a 0-based index.
    fn load_page(&self, index: u32) -> Result<PageHandle>;

    /// Images embedded in the page, with their pixel dimensions.
    fn page_images(&self, page: &PageHandle) -> Result<Vec<ImageInfo>>;

    /// The page's block → line → span tree.
    fn text_page(&self, page: &PageHandle) -> Result<TextPage>;

    /// Release the parsed-file resource. Calling it again is a no-op.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    name: String,
    doc: Option<LopdfDocument>,
    pages: Vec<ObjectId>,
}

impl LopdfBackend {
    /// Open a PDF file. Every failure is an [`Error::DocumentOpen`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = detect_format_from_path(path)?;
        let doc = LopdfDocument::load(path).map_err(|e| Error::open(path, e))?;
        log::info!("Opened {} ({})", path.display(), format);
        Ok(Self::from_document(path.display().to_string(), doc))
    }

    /// Load from an in-memory byte slice.
    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        let name = name.into();
        let doc = LopdfDocument::load_mem(data).map_err(|e| Error::open(&name, e))?;
        Ok(Self::from_document(name, doc))
    }

    fn from_document(name: String, doc: LopdfDocument) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            name,
            doc: Some(doc),
            pages,
        }
    }

    fn doc(&self) -> Result<&LopdfDocument> {
        self.doc.as_ref().ok_or(Error::DocumentClosed)
    }

    /// Raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let doc = self.doc()?;
        let page_dict = doc.get_dictionary(page_id)?;

        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        // /Contents is a stream or an array of streams, either possibly indirect
        let streams: Vec<&Stream> = match resolve(doc, contents)? {
            Object::Stream(s) => vec![s],
            Object::Array(arr) => arr
                .iter()
                .map(|o| match resolve(doc, o)? {
                    Object::Stream(s) => Ok(s),
                    _ => Err(Error::Structural(
                        "/Contents array holds a non-stream entry".to_string(),
                    )),
                })
                .collect::<Result<_>>()?,
            _ => return Err(Error::Structural("invalid /Contents entry".to_string())),
        };

        let mut content = Vec::new();
        for s in streams {
            content.extend_from_slice(&stream_bytes(s));
            content.push(b'\n');
        }
        Ok(content)
    }

    fn page_resources(&self, page_id: ObjectId) -> Result<Option<&Dictionary>> {
        let doc = self.doc()?;
        match resolve_inherited(doc, page_id, b"Resources")? {
            Some(resources) => Ok(Some(as_dict(doc, resources)?)),
            None => Ok(None),
        }
    }

    fn media_box(&self, page_id: ObjectId) -> Result<[f64; 4]> {
        let doc = self.doc()?;
        let Some(obj) = resolve_inherited(doc, page_id, b"MediaBox")? else {
            log::warn!("Page {:?} has no /MediaBox, assuming Letter", page_id);
            return Ok(DEFAULT_MEDIA_BOX);
        };
        let array = resolve(doc, obj)?.as_array()?;
        if array.len() < 4 {
            return Err(Error::Structural("/MediaBox has fewer than 4 values".into()));
        }
        let mut media_box = [0.0; 4];
        for (slot, value) in media_box.iter_mut().zip(array) {
            *slot = f64::from(value.as_float()?);
        }
        Ok(media_box)
    }
}

impl PdfBackend for LopdfBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> Result<u32> {
        self.doc()?;
        Ok(self.pages.len() as u32)
    }

    fn load_page(&self, index: u32) -> Result<PageHandle> {
        self.doc()?;
        let id = self
            .pages
            .get(index as usize)
            .copied()
            .ok_or(Error::PageOutOfRange(index, self.pages.len() as u32))?;
        Ok(PageHandle { index, id })
    }

    fn page_images(&self, page: &PageHandle) -> Result<Vec<ImageInfo>> {
        let doc = self.doc()?;
        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(page.id)? {
            let mut seen = HashSet::new();
            collect_images(doc, resources, 0, &mut seen, &mut images)?;
        }

        log::debug!("Page {}: {} images", page.index + 1, images.len());
        Ok(images)
    }

    fn text_page(&self, page: &PageHandle) -> Result<TextPage> {
        let frame = PageFrame::from_media_box(self.media_box(page.id)?);
        let content = self.page_content(page.id)?;
        if content.is_empty() {
            return Ok(TextPage::empty(frame.width, frame.height));
        }

        let content = Content::decode(&content)?;
        let forms = LopdfForms {
            doc: self.doc()?,
            resources: self.page_resources(page.id)?,
        };
        let runs = collect_text_runs_with_forms(&content.operations, &forms);
        log::debug!("Page {}: {} text runs", page.index + 1, runs.len());
        Ok(build_text_page(frame, runs))
    }

    fn close(&mut self) {
        if self.doc.take().is_some() {
            log::info!("Closed {}", self.name);
        }
    }

    fn is_closed(&self) -> bool {
        self.doc.is_none()
    }
}

/// Look up `key` on a page, following `/Parent` links for inherited attributes.
fn resolve_inherited<'a>(
    doc: &'a LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut current = page_id;
    // Bounded walk so a cyclic /Parent chain cannot hang the analysis.
    for _ in 0..64 {
        let dict = doc.get_dictionary(current)?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent") {
            Ok(parent) => current = parent.as_reference()?,
            Err(_) => return Ok(None),
        }
    }
    Err(Error::Structural("page tree /Parent chain too deep".into()))
}

fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(r) => Ok(doc.get_object(*r)?),
        other => Ok(other),
    }
}

fn as_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Result<&'a Dictionary> {
    Ok(resolve(doc, obj)?.as_dict()?)
}

/// Collect image XObjects from `resources`, descending into Form XObjects.
///
/// Indirect objects are visited once, so an image shared by several forms
/// counts once and reference cycles terminate.
fn collect_images(
    doc: &LopdfDocument,
    resources: &Dictionary,
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    images: &mut Vec<ImageInfo>,
) -> Result<()> {
    if depth > MAX_FORM_DEPTH {
        log::warn!("Form XObjects nested deeper than {}, skipping", MAX_FORM_DEPTH);
        return Ok(());
    }
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(());
    };

    for (name, entry) in as_dict(doc, xobjects)?.iter() {
        if let Object::Reference(id) = entry {
            if !seen.insert(*id) {
                continue;
            }
        }
        let Object::Stream(stream) = resolve(doc, entry)? else {
            continue;
        };
        match stream.dict.get(b"Subtype").ok().and_then(|o| o.as_name().ok()) {
            Some(b"Image") => {
                let name = String::from_utf8_lossy(name);
                let width = image_dimension(&stream.dict, b"Width", &name)?;
                let height = image_dimension(&stream.dict, b"Height", &name)?;
                images.push(ImageInfo::new(width, height));
            }
            Some(b"Form") => {
                if let Ok(form_resources) = stream.dict.get(b"Resources") {
                    let form_resources = as_dict(doc, form_resources)?;
                    collect_images(doc, form_resources, depth + 1, seen, images)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Form XObjects reachable from one resource dictionary.
struct LopdfForms<'a> {
    doc: &'a LopdfDocument,
    resources: Option<&'a Dictionary>,
}

impl FormSource for LopdfForms<'_> {
    fn form(&self, name: &[u8]) -> Option<Form<'_>> {
        let xobjects = as_dict(self.doc, self.resources?.get(b"XObject").ok()?).ok()?;
        let Object::Stream(stream) = resolve(self.doc, xobjects.get(name).ok()?).ok()? else {
            return None;
        };
        if stream.dict.get(b"Subtype").ok()?.as_name().ok()? != b"Form" {
            return None;
        }

        let operations = match Content::decode(&stream_bytes(stream)) {
            Ok(content) => content.operations,
            Err(e) => {
                log::warn!("Skipping form /{}: {}", String::from_utf8_lossy(name), e);
                return None;
            }
        };
        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|m| m.as_array().ok())
            .and_then(|values| form_matrix(values));
        // A form without /Resources inherits its parent's
        let resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|r| as_dict(self.doc, r).ok())
            .or(self.resources);

        Some(Form {
            operations,
            matrix,
            resources: Box::new(LopdfForms {
                doc: self.doc,
                resources,
            }),
        })
    }
}

fn form_matrix(values: &[Object]) -> Option<[f64; 6]> {
    if values.len() != 6 {
        return None;
    }
    let mut matrix = [0.0; 6];
    for (slot, value) in matrix.iter_mut().zip(values) {
        *slot = f64::from(value.as_float().ok()?);
    }
    Some(matrix)
}

fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

fn image_dimension(dict: &Dictionary, key: &[u8], image: &str) -> Result<u32> {
    let field = String::from_utf8_lossy(key);
    let value = dict
        .get(key)
        .map_err(|_| Error::Structural(format!("image /{} has no /{}", image, field)))?
        .as_i64()
        .map_err(|_| Error::Structural(format!("image /{} has a non-integer /{}", image, field)))?;
    u32::try_from(value).map_err(|_| {
        Error::Structural(format!("image /{} has invalid /{} {}", image, field, value))
    })
}
