//! PDF writing for assembled documents
//!
//! - Encoding source images as image XObjects
//! - Building output pages (background, clip, placed image)
//! - Pages tree, catalog and document info

mod page;
mod xobject;

pub use page::{finish_document, render_page};
pub(crate) use page::set_info;
pub use xobject::ImageXObject;
