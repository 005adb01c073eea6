// crates/devdesc-rs-quality/src/ingest/sniff.rs

use devdesc_rs::DocumentFormat;
use std::path::Path;

/// How far into a file the content signatures are looked for.
const SNIFF_WINDOW: usize = 4096;

/// Decides which parser a file goes to.
///
/// The content is checked first: an `<IODevice` root means IODD, an `[File]`
/// or `[Device]` section header means EDS. Without a signature the
/// extension decides. `None` means the file is not a device description.
pub fn sniff_format(file_name: &str, bytes: &[u8]) -> Option<DocumentFormat> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_WINDOW)]);
    if head.contains("<IODevice") {
        return Some(DocumentFormat::Iodd);
    }
    if head.lines().any(|line| {
        let line = line.trim();
        line.starts_with("[File]") || line.starts_with("[Device]")
    }) {
        return Some(DocumentFormat::Eds);
    }

    let extension = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match extension.as_str() {
        "xml" | "iodd" => Some(DocumentFormat::Iodd),
        "eds" => Some(DocumentFormat::Eds),
        _ => None,
    }
}
