// crates/devdesc-rs-iodd/src/builder/texts.rs

use crate::model::{ExternalTextCollection, Language, Text};
use crate::resolver::header::blocks;
use devdesc_rs::error::Result;
use devdesc_rs::{SectionLog, SnapshotView};

/// `<ExternalTextCollection>`: the primary language (when the document had
/// one) first, then the others in their stored order.
pub(super) fn build_text_collection(
    view: &SnapshotView<'_>,
    log: &SectionLog,
) -> Result<ExternalTextCollection> {
    let language = |code: &str| Language {
        lang: code.to_string(),
        text: view
            .texts_of(code)
            .iter()
            .map(|t| Text {
                id: t.text_id.clone(),
                value: t.value.clone(),
            })
            .collect(),
    };

    if view.languages().is_empty() {
        return Err(log.missing(
            blocks::EXTERNAL_TEXT_COLLECTION,
            "text collection has no language rows",
        ));
    }
    let primary = view.languages().iter().find(|l| l.primary);
    Ok(ExternalTextCollection {
        primary_language: primary.map(|l| language(&l.language)),
        language: view
            .languages()
            .iter()
            .filter(|l| !l.primary)
            .map(|l| language(&l.language))
            .collect(),
    })
}
