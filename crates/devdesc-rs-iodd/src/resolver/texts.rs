// crates/devdesc-rs-iodd/src/resolver/texts.rs

//! Pass 1: builds the text pool from `<ExternalTextCollection>`.

use crate::model::ExternalTextCollection;
use devdesc_rs::IngestionContext;
use devdesc_rs::error::Result;

/// Loads every language into the context's pool, primary language first.
/// A text id repeated within one language keeps its first position and the
/// last value.
pub(super) fn resolve_texts(
    collection: Option<&ExternalTextCollection>,
    ctx: &mut IngestionContext,
) -> Result<()> {
    let Some(collection) = collection else {
        return Ok(());
    };
    ctx.within("ExternalTextCollection", |ctx| {
        if let Some(primary) = &collection.primary_language {
            let lang = ctx.texts_mut().language_mut(&primary.lang, true);
            for text in &primary.text {
                lang.insert(text.id.as_str(), text.value.as_str());
            }
        }
        for language in &collection.language {
            let lang = ctx.texts_mut().language_mut(&language.lang, false);
            for text in &language.text {
                lang.insert(text.id.as_str(), text.value.as_str());
            }
        }
        Ok(())
    })
}
