//! PDF-to-PDF merging
//!
//! Pages are moved between documents structurally: their objects and
//! content streams are copied byte for byte under new object numbers.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::render::set_info;
use crate::types::{ConvertError, Result};
use crate::worker::WorkerPool;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic Parent links in damaged files
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when neither the page nor its ancestors declare a MediaBox
const FALLBACK_MEDIA_BOX: [i64; 4] = [0, 0, 612, 792];

/// Where a merged page came from (both indices zero-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOrigin {
    pub document: usize,
    pub page: usize,
}

/// The concatenation of several documents
#[derive(Debug)]
pub struct MergedDocument {
    document: Document,
    origins: Vec<PageOrigin>,
}

impl MergedDocument {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Origin of every output page, in output order
    pub fn origins(&self) -> &[PageOrigin] {
        &self.origins
    }

    pub fn page_count(&self) -> usize {
        self.origins.len()
    }

    /// Replace the Info dictionary, recording `title`
    pub fn set_title(&mut self, title: &str) {
        set_info(&mut self.document, Some(title));
    }
}

/// Parse `sources` concurrently and merge them in input order.
///
/// Needs at least two sources. Any source that fails to parse aborts the
/// merge with [`ConvertError::CorruptSource`] carrying its index.
pub async fn merge(pool: &WorkerPool, sources: Vec<Vec<u8>>) -> Result<MergedDocument> {
    if sources.len() < 2 {
        return Err(ConvertError::InsufficientInput {
            found: sources.len(),
        });
    }

    let handles: Vec<_> = sources
        .into_iter()
        .enumerate()
        .map(|(index, bytes)| {
            pool.dispatch(move || {
                let doc = Document::load_mem(&bytes).map_err(|e| ConvertError::CorruptSource {
                    index,
                    reason: e.to_string(),
                })?;
                check_page_tree(index, &doc)?;
                Ok(doc)
            })
        })
        .collect();

    let mut documents = Vec::with_capacity(handles.len());
    for handle in handles {
        documents.push(handle.join().await?);
    }

    pool.dispatch(move || merge_documents(documents))
        .join()
        .await
}

/// Concatenate already-parsed documents: documents in order, pages in order.
///
/// Every document must have a catalog and a page tree; the first one that
/// does not fails the merge with [`ConvertError::CorruptSource`].
pub fn merge_documents(documents: Vec<Document>) -> Result<MergedDocument> {
    if documents.len() < 2 {
        return Err(ConvertError::InsufficientInput {
            found: documents.len(),
        });
    }

    for (index, doc) in documents.iter().enumerate() {
        check_page_tree(index, doc)?;
    }

    let document_count = documents.len();
    let mut output = Document::with_version("1.7");
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut origins = Vec::new();

    for (doc_index, mut doc) in documents.into_iter().enumerate() {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages: BTreeMap<u32, ObjectId> = doc.get_pages();
        for (page_number, &page_id) in pages.values().enumerate() {
            materialize_inherited(&mut doc, page_id);
            page_ids.push(page_id);
            origins.push(PageOrigin {
                document: doc_index,
                page: page_number,
            });
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" => {}
                _ => {
                    output.objects.insert(object_id, object);
                }
            }
        }
    }

    output.max_id = max_id;
    let pages_tree_id = output.new_object_id();
    for &page_id in &page_ids {
        if let Ok(page) = output.get_dictionary_mut(page_id) {
            page.set("Parent", Object::Reference(pages_tree_id));
        }
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(page_ids.len() as i64)),
    ]);
    output
        .objects
        .insert(pages_tree_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_tree_id)),
    ]));
    output.trailer.set("Root", catalog_id);
    set_info(&mut output, None);

    log::info!(
        "Merged {} document(s) into {} page(s)",
        document_count,
        page_ids.len()
    );

    Ok(MergedDocument {
        document: output,
        origins,
    })
}

/// A source must have a catalog whose `/Pages` resolves to a dictionary
fn check_page_tree(index: usize, doc: &Document) -> Result<()> {
    let corrupt = |reason: String| ConvertError::CorruptSource { index, reason };

    let catalog = doc
        .catalog()
        .map_err(|e| corrupt(format!("no document catalog: {}", e)))?;
    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| corrupt("catalog has no Pages reference".to_string()))?;
    doc.get_dictionary(pages_id)
        .map_err(|e| corrupt(format!("page tree is missing: {}", e)))?;
    Ok(())
}

/// Copy inherited attributes onto the page itself so it no longer depends
/// on the source page tree
fn materialize_inherited(doc: &mut Document, page_id: ObjectId) {
    let mut found: Vec<(&[u8], Object)> = Vec::new();
    for key in INHERITABLE {
        if let Some(value) = inherited_attribute(doc, page_id, key) {
            found.push((key, value));
        } else if key == b"MediaBox" {
            log::debug!("Page {:?} has no MediaBox, using Letter", page_id);
            let media_box = FALLBACK_MEDIA_BOX
                .iter()
                .map(|&v| Object::Integer(v))
                .collect();
            found.push((key, Object::Array(media_box)));
        }
    }

    if let Ok(page) = doc.get_dictionary_mut(page_id) {
        for (key, value) in found {
            if !page.has(key) {
                page.set(key, value);
            }
        }
    }
}

fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(node).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        node = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}
