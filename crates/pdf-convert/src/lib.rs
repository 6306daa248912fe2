mod assemble;
pub mod codec;
mod compress;
pub mod constants;
mod ingest;
mod io;
pub mod layout;
mod merge;
pub mod naming;
mod options;
mod preview;
pub mod raster;
pub mod render;
mod types;
mod worker;
mod working_set;

pub use assemble::{AssembledDocument, assemble};
pub use compress::{
    BatchOutcome, FailedItem, Recompressed, bounded_dimensions, recompress, recompress_batch,
};
pub use ingest::{IncomingFile, Ingested, MimeFamily, SniffPolicy, ingest};
pub use io::{
    document_to_bytes, load_multiple_pdfs, load_pdf, mime_from_path, read_incoming, save_pdf,
};
pub use layout::{Page, PageGeometry, PlacementRect, compose_page, fit};
pub use merge::{MergedDocument, PageOrigin, merge, merge_documents};
pub use options::*;
pub use preview::{Preview, generate_preview};
pub use raster::{RasterPage, RasterizedPage, rasterize, rasterize_pages};
pub use types::*;
pub use worker::{JobHandle, WorkerPool};
pub use working_set::{ItemId, PreviewHandle, StagedItem, WorkingSet};
