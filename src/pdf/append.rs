//! Incremental page appending across multiple PDF documents
//!
//! Based on the lopdf merge example:
//! https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};

/// Accumulates pages from any number of source PDFs and writes them out as
/// one document.
///
/// Sources are appended in call order and their pages keep their internal
/// order. The page tree is built once, in [`PdfAppender::save`]; nothing
/// touches the filesystem before that.
pub struct PdfAppender {
    objects: BTreeMap<ObjectId, Object>,
    page_ids: Vec<ObjectId>,
    next_id: u32,
}

impl PdfAppender {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            page_ids: Vec::new(),
            next_id: 1,
        }
    }

    /// Load the PDF at `path` and append all of its pages.
    ///
    /// Returns the number of pages appended. Fails with
    /// [`Error::FileNotFound`] if `path` does not exist and
    /// [`Error::EmptyPdf`] if the document contributes no pages.
    pub fn append_file(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let doc = Document::load(path)?;
        let appended = self.append_document(doc)?;
        if appended == 0 {
            return Err(Error::EmptyPdf(path.to_path_buf()));
        }

        debug!(source = %path.display(), pages = appended, "appended PDF pages");
        Ok(appended)
    }

    /// Append all pages of an in-memory document.
    pub fn append_document(&mut self, mut doc: Document) -> Result<usize> {
        // Renumber into our ID space so objects from different sources
        // cannot collide.
        doc.renumber_objects_with(self.next_id);
        self.next_id = doc.max_id + 1;

        let pages = doc.get_pages();
        let appended = pages.len();
        self.page_ids.extend(pages.into_values());
        self.objects.extend(doc.objects);

        Ok(appended)
    }

    /// Number of pages accumulated so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Build the page tree and write the combined document to `output_path`.
    ///
    /// Consumes the appender; fails with [`Error::EmptyInput`] if no pages
    /// were ever appended.
    pub fn save(self, output_path: &Path) -> Result<()> {
        if self.page_ids.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut doc = Document::with_version("1.5");
        doc.objects = self.objects;

        // new_object_id() must hand out IDs above everything we renumbered,
        // or the catalog would collide with a source object.
        doc.max_id = self.next_id - 1;

        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Count", Object::Integer(self.page_ids.len() as i64));
        pages_dict.set("Kids", Object::Array(kids));
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.new_object_id();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        doc.objects.insert(catalog_id, Object::Dictionary(catalog));

        doc.trailer.set("Root", Object::Reference(catalog_id));

        // Every page must point at the new tree; source parents are gone.
        for &page_id in &self.page_ids {
            if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }

        doc.compress();
        doc.save(output_path)?;

        debug!(
            output = %output_path.display(),
            pages = self.page_ids.len(),
            "saved combined document"
        );

        Ok(())
    }
}

impl Default for PdfAppender {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_missing_file() {
        let mut appender = PdfAppender::new();

        let result = appender.append_file(Path::new("nonexistent.pdf"));

        assert!(matches!(result, Err(Error::FileNotFound(_))));
        assert_eq!(appender.page_count(), 0);
    }

    #[test]
    fn test_save_without_pages() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let output = dir.path().join("nothing.pdf");

        let result = PdfAppender::new().save(&output);

        assert!(matches!(result, Err(Error::EmptyInput)));
        assert!(!output.exists());
    }

    // End-to-end appending is covered in tests/integration.rs with
    // generated documents.
}
