//! Work queue construction.

use std::io::{Cursor, Read};

use tracing::debug;
use zip::ZipArchive;

use factura_extract::MediaType;

use crate::archive::is_supported_name;
use crate::error::{ArchiveError, Result};

/// A standalone input file submitted alongside (or instead of) an
/// archive.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original filename.
    pub name: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Declared media type.
    pub media_type: MediaType,
}

/// One unit of work for the processing loop. Immutable once built and
/// consumed exactly once.
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Raw document bytes.
    pub payload: Vec<u8>,
    /// Name surfaced to the caller and used for the exported workbook.
    pub display_name: String,
    /// Payload kind forwarded to the extraction service.
    pub media_type: MediaType,
}

/// Build the ordered work queue: the standalone file first, then every
/// supported archive entry in the archive's own enumeration order.
///
/// The queue is rebuilt from scratch on every call. No cap is applied
/// here; admission control belongs to the rate limiter, and oversized
/// archives are expected to have been rejected already.
pub fn build_queue(standalone: Option<SourceFile>, archive: Option<&[u8]>) -> Result<Vec<WorkItem>> {
    let mut queue = Vec::new();

    if let Some(file) = standalone {
        queue.push(WorkItem {
            payload: file.bytes,
            display_name: file.name,
            media_type: file.media_type,
        });
    }

    if let Some(bytes) = archive {
        let mut zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ArchiveError::Unreadable(e.to_string()))?;

        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|e| ArchiveError::Unreadable(e.to_string()))?;

            if entry.is_dir() || !is_supported_name(entry.name()) {
                continue;
            }

            let name = entry.name().to_string();
            let mut payload = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut payload)
                .map_err(|e| ArchiveError::Entry { name: name.clone(), reason: e.to_string() })?;

            queue.push(WorkItem {
                payload,
                media_type: MediaType::from_name(&name),
                display_name: name,
            });
        }
    }

    debug!(len = queue.len(), "built work queue");

    Ok(queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::archive::tests::sample_zip;
    use crate::error::FacturaError;

    fn standalone(name: &str) -> SourceFile {
        SourceFile {
            name: name.to_string(),
            bytes: b"standalone-bytes".to_vec(),
            media_type: MediaType::from_name(name),
        }
    }

    #[test]
    fn test_standalone_comes_first() {
        let bytes = sample_zip(&[("a.jpg", b"aa"), ("b.pdf", b"bb")]);
        let queue = build_queue(Some(standalone("factura.pdf")), Some(&bytes)).unwrap();

        let names: Vec<&str> = queue.iter().map(|i| i.display_name.as_str()).collect();
        assert_eq!(names, vec!["factura.pdf", "a.jpg", "b.pdf"]);
    }

    #[test]
    fn test_archive_entries_keep_enumeration_order_and_payloads() {
        let bytes = sample_zip(&[
            ("z_last.png", b"zz"),
            ("dir/", b""),
            ("a_first.jpeg", b"aa"),
            ("skip.txt", b"tt"),
        ]);

        let queue = build_queue(None, Some(&bytes)).unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].display_name, "z_last.png");
        assert_eq!(queue[0].payload, b"zz");
        assert_eq!(queue[1].display_name, "a_first.jpeg");
        assert_eq!(queue[1].payload, b"aa");
    }

    #[test]
    fn test_media_type_inferred_from_entry_name() {
        let bytes = sample_zip(&[("scan.webp", b"x"), ("doc.PDF", b"y")]);
        let queue = build_queue(None, Some(&bytes)).unwrap();

        assert_eq!(queue[0].media_type, MediaType::Image);
        assert_eq!(queue[1].media_type, MediaType::Pdf);
    }

    #[test]
    fn test_no_inputs_yields_empty_queue() {
        assert!(build_queue(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_archive_fails() {
        let result = build_queue(None, Some(b"garbage"));
        assert!(matches!(
            result,
            Err(FacturaError::Archive(ArchiveError::Unreadable(_)))
        ));
    }
}
