//! Page layout for image assembly
//!
//! - Fitting a source image into the usable page area
//! - Composing one page from an image and a page geometry

mod fit;
mod page;
mod types;

pub use fit::fit;
pub use page::{Page, compose_page};
pub use types::*;
