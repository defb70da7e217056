//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! runtime's worker threads never stall on a large document.
//!
//! ## Library binding
//!
//! pdfium is a shared library loaded at runtime. Resolution order:
//! explicit path from config, `PDFIUM_LIB_PATH`, the working directory,
//! then the system library search path.

use crate::config::{PageSelection, RoadmapConfig};
use crate::error::RoadmapError;
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Text of the selected pages, in page order.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Page texts joined with newlines.
    pub text: String,
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages that contributed text.
    pub pages_read: usize,
}

/// Extract the text of the configured pages.
pub async fn extract_text(
    pdf_path: &Path,
    config: &RoadmapConfig,
) -> Result<ExtractedText, RoadmapError> {
    let path = pdf_path.to_path_buf();
    let password = config.password.clone();
    let lib_path = config.pdfium_lib_path.clone();
    let selection = config.pages.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(lib_path.as_deref())?;
        let document = open_document(&pdfium, &path, password.as_deref())?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let indices = select_pages(&selection, total_pages)?;

        let mut texts = Vec::with_capacity(indices.len());
        for idx in indices {
            let page = pages
                .get(idx as u16)
                .map_err(|e| RoadmapError::CorruptPdf {
                    path: path.clone(),
                    detail: format!("page {}: {:?}", idx + 1, e),
                })?;

            let page_text = page.text();
            match page_text {
                Ok(t) => {
                    let all = t.all();
                    debug!("Page {}: {} chars", idx + 1, all.chars().count());
                    texts.push(all);
                }
                Err(e) => warn!("Page {}: no text layer ({:?})", idx + 1, e),
            };
        }

        Ok(ExtractedText {
            pages_read: texts.len(),
            text: texts.join("\n"),
            total_pages,
        })
    })
    .await
    .map_err(|e| RoadmapError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Extract document metadata without reading page text.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
    lib_path: Option<&Path>,
) -> Result<DocumentMetadata, RoadmapError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());
    let lib = lib_path.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(lib.as_deref())?;
        let document = open_document(&pdfium, &path, pwd.as_deref())?;

        let metadata = document.metadata();
        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        Ok(DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
            page_count: document.pages().len() as usize,
            pdf_version: format!("{:?}", document.version()),
        })
    })
    .await
    .map_err(|e| RoadmapError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// 0-indexed pages to read.
///
/// A document without pages yields an empty list, so the length gate
/// reports it. Otherwise a selection matching no page is an error.
fn select_pages(selection: &PageSelection, total_pages: usize) -> Result<Vec<usize>, RoadmapError> {
    if total_pages == 0 {
        warn!("PDF has no pages");
        return Ok(Vec::new());
    }
    let indices = selection.to_indices(total_pages);
    if indices.is_empty() {
        let page = match selection {
            PageSelection::All => 0,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
            PageSelection::Set(pages) => pages.iter().copied().max().unwrap_or(0),
        };
        return Err(RoadmapError::PageOutOfRange {
            page,
            total: total_pages,
        });
    }
    Ok(indices)
}

/// Bind to the pdfium shared library.
fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, RoadmapError> {
    if let Some(path) = library_override(explicit) {
        debug!("Binding pdfium from {}", path.display());
        return Pdfium::bind_to_library(&path)
            .map(Pdfium::new)
            .map_err(|e| {
                RoadmapError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e))
            });
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| RoadmapError::PdfiumBindingFailed(format!("{:?}", e)))
}

/// Explicit library path: config first, then `PDFIUM_LIB_PATH`.
fn library_override(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => None,
    }
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, RoadmapError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                RoadmapError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                RoadmapError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            RoadmapError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_library_path_wins() {
        let p = library_override(Some(Path::new("/opt/pdfium/libpdfium.so")));
        assert_eq!(p, Some(PathBuf::from("/opt/pdfium/libpdfium.so")));
    }

    #[test]
    fn missing_library_is_a_binding_error() {
        let err = bind_pdfium(Some(Path::new("/definitely/not/libpdfium.so")))
            .err()
            .expect("binding a missing library must fail");
        assert!(matches!(err, RoadmapError::PdfiumBindingFailed(_)));
    }

    #[tokio::test]
    async fn extract_text_reports_binding_failure() {
        let config = RoadmapConfig::builder()
            .pdfium_lib_path("/definitely/not/libpdfium.so")
            .password("secret")
            .build()
            .unwrap();
        let err = extract_text(Path::new("paper.pdf"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, RoadmapError::PdfiumBindingFailed(_)));
    }

    #[test]
    fn empty_document_selects_nothing_without_error() {
        assert_eq!(select_pages(&PageSelection::All, 0).unwrap(), Vec::<usize>::new());
        assert_eq!(select_pages(&PageSelection::Single(3), 0).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn selection_outside_document_is_out_of_range() {
        assert_eq!(select_pages(&PageSelection::Range(2, 3), 4).unwrap(), vec![1, 2]);
        let err = select_pages(&PageSelection::Single(9), 4).unwrap_err();
        assert!(matches!(err, RoadmapError::PageOutOfRange { page: 9, total: 4 }));
    }
}
