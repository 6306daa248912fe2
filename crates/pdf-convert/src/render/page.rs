//! Output page rendering for assembled documents

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::constants::{PAGE_BACKGROUND_RGB, PDF_PRODUCER, mm_to_pt};
use crate::layout::{Page, PlacementRect};

use super::xobject::ImageXObject;

const IMAGE_NAME: &str = "Im0";

/// Add one assembled page to `output`, returning the page object id
pub fn render_page(
    output: &mut Document,
    page: &Page,
    image: ImageXObject,
    parent_pages_id: ObjectId,
) -> ObjectId {
    let (width_pt, height_pt) = page.geometry().page_size_pt();

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(parent_pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width_pt),
            Object::Real(height_pt),
        ]),
    );

    let image_id = image.add_to(output);
    let mut xobjects = Dictionary::new();
    xobjects.set(IMAGE_NAME, Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = [
        background_command(width_pt, height_pt),
        placement_command(
            IMAGE_NAME,
            &page.clip_rect(),
            &page.placement(),
            page.geometry().page_height_mm(),
        ),
    ]
    .concat();
    let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Dictionary(resources));

    output.add_object(page_dict)
}

/// Finish a document: pages tree, catalog and info dictionary
pub fn finish_document(
    output: &mut Document,
    pages_tree_id: ObjectId,
    page_ids: &[ObjectId],
    title: Option<&str>,
) {
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

    set_info(output, title);
}

/// Write our producer and an optional title into the Info dictionary,
/// creating it if the document has none
pub(crate) fn set_info(output: &mut Document, title: Option<&str>) {
    let existing = output
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok();
    let mut info = existing
        .and_then(|id| output.get_dictionary(id).ok().cloned())
        .unwrap_or_else(Dictionary::new);

    info.set("Producer", Object::string_literal(PDF_PRODUCER));
    if let Some(title) = title {
        info.set("Title", Object::string_literal(title));
    }

    match existing {
        Some(id) => {
            output.objects.insert(id, Object::Dictionary(info));
        }
        None => {
            let info_id = output.add_object(info);
            output.trailer.set("Info", info_id);
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn background_command(width_pt: f32, height_pt: f32) -> String {
    let [r, g, b] = PAGE_BACKGROUND_RGB.map(|c| c as f32 / 255.0);
    format!(
        "q {} {} {} rg 0 0 {} {} re f Q\n",
        r, g, b, width_pt, height_pt
    )
}

/// Clip to the usable area, then paint the unit-square image XObject over
/// the placement. Page rectangles have a top-left origin; PDF user space
/// starts at the bottom-left.
fn placement_command(
    xobject_name: &str,
    clip: &PlacementRect,
    placement: &PlacementRect,
    page_height_mm: f32,
) -> String {
    let clip_y = mm_to_pt(page_height_mm - clip.bottom());
    let image_y = mm_to_pt(page_height_mm - placement.bottom());
    format!(
        "q {} {} {} {} re W n {} 0 0 {} {} {} cm /{} Do Q\n",
        mm_to_pt(clip.x),
        clip_y,
        mm_to_pt(clip.width),
        mm_to_pt(clip.height),
        mm_to_pt(placement.width),
        mm_to_pt(placement.height),
        mm_to_pt(placement.x),
        image_y,
        xobject_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_command_flips_y() {
        // 10 mm square, 20 mm from the top of a 100 mm page
        let rect = PlacementRect::new(0.0, 20.0, 10.0, 10.0);
        let cmd = placement_command("Im0", &rect, &rect, 100.0);
        let expected_y = mm_to_pt(70.0);
        assert!(cmd.contains(&format!(" {} cm", expected_y)), "{cmd}");
        assert!(cmd.contains("re W n"));
        assert!(cmd.ends_with("/Im0 Do Q\n"));
    }

    #[test]
    fn test_background_is_white() {
        assert_eq!(
            background_command(10.0, 20.0),
            "q 1 1 1 rg 0 0 10 20 re f Q\n"
        );
    }
}
