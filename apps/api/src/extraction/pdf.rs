use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

use lopdf::Document;
use thiserror::Error;
use tracing::warn;

use super::DocumentError;

/// Extracts text from a PDF page by page.
///
/// A page that fails to extract, or whose extraction panics, contributes an
/// empty string; only a document that cannot be loaded at all is an error. Pages are concatenated in page
/// order with no separator.
pub fn extract_pdf_text(data: &[u8]) -> Result<String, DocumentError> {
    let doc = Document::load_mem(data)?;

    // BTreeMap keyed by page number: iteration is page order.
    let pages = doc.get_pages();
    let page_texts = pages
        .keys()
        .map(|&page_number| (page_number, guard_page(|| doc.extract_text(&[page_number]))));

    Ok(join_pages(page_texts))
}

#[derive(Debug, Error)]
enum PageError {
    #[error("{0}")]
    Pdf(#[from] lopdf::Error),

    #[error("text extraction panicked")]
    Panicked,
}

/// Runs one page's extraction so that a panic is confined to that page.
fn guard_page<F>(extract: F) -> Result<String, PageError>
where
    F: FnOnce() -> Result<String, lopdf::Error>,
{
    match catch_unwind(AssertUnwindSafe(extract)) {
        Ok(result) => Ok(result?),
        Err(_) => Err(PageError::Panicked),
    }
}

fn join_pages<E: Display>(pages: impl IntoIterator<Item = (u32, Result<String, E>)>) -> String {
    pages
        .into_iter()
        .map(|(page_number, result)| match result {
            Ok(text) => text,
            Err(e) => {
                warn!(page = page_number, "Failed to extract text from PDF page: {e}");
                String::new()
            }
        })
        .collect()
}
