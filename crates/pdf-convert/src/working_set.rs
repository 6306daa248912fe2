//! Staged inputs and the previews they own

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::constants::PREVIEW_MAX_EDGE_PX;
use crate::preview::{Preview, generate_preview};
use crate::types::{Result, SourceImage};

/// Handle to a staged item, stable across reordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub u64);

/// A preview counted against its working set until dropped
#[derive(Debug)]
pub struct PreviewHandle {
    preview: Preview,
    live: Arc<AtomicUsize>,
}

impl PreviewHandle {
    pub fn preview(&self) -> &Preview {
        &self.preview
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct StagedItem {
    id: ItemId,
    image: Arc<SourceImage>,
    preview: Option<PreviewHandle>,
}

impl StagedItem {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn image(&self) -> &Arc<SourceImage> {
        &self.image
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref().map(PreviewHandle::preview)
    }
}

/// Ordered, caller-mutable collection of staged images.
///
/// Each item's preview is released as soon as the item leaves the set,
/// whether by [`remove`](Self::remove), [`clear`](Self::clear) or dropping
/// the set.
#[derive(Debug, Default)]
pub struct WorkingSet {
    items: Vec<StagedItem>,
    next_id: u64,
    live_previews: Arc<AtomicUsize>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image without a preview
    pub fn stage(&mut self, image: impl Into<Arc<SourceImage>>) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.push(StagedItem {
            id,
            image: image.into(),
            preview: None,
        });
        id
    }

    /// Append an image and build its preview
    pub fn stage_with_preview(&mut self, image: impl Into<Arc<SourceImage>>) -> Result<ItemId> {
        let image = image.into();
        let preview = generate_preview(&image, PREVIEW_MAX_EDGE_PX)?;
        let id = self.stage(image);
        self.attach_preview(id, preview);
        Ok(id)
    }

    /// Attach (or replace) the preview of `id`. Returns false if no such item
    pub fn attach_preview(&mut self, id: ItemId, preview: Preview) -> bool {
        let live = Arc::clone(&self.live_previews);
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        live.fetch_add(1, Ordering::SeqCst);
        item.preview = Some(PreviewHandle { preview, live });
        true
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Arc<SourceImage>> {
        let index = self.position(id)?;
        let item = self.items.remove(index);
        Some(item.image)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Move the item at `from` to position `to`, shifting the items between
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        true
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn get(&self, id: ItemId) -> Option<&StagedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedItem> {
        self.items.iter()
    }

    /// Snapshot of the staged images in current order
    pub fn images(&self) -> Vec<Arc<SourceImage>> {
        self.items.iter().map(|item| Arc::clone(&item.image)).collect()
    }

    /// Number of previews currently held by this set
    pub fn live_previews(&self) -> usize {
        self.live_previews.load(Ordering::SeqCst)
    }

    /// Counter shared with the previews, readable after the set is dropped
    pub fn preview_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.live_previews)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
