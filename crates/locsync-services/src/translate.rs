use crate::cancel::CancelToken;
use crate::store::{DisplayOrder, EntryStore};
use locsync_core::{Context, Status, TranslateError};
use locsync_domain::{BatchItemOutcome, BatchSummary, SCHEMA_VERSION};

/// External AI translation collaborator. A black box from this core's
/// perspective: it returns a translation or fails, nothing else.
pub trait Translator {
    fn translate(
        &self,
        source_text: &str,
        context: &Context,
        instructions: &str,
    ) -> Result<String, TranslateError>;
}

/// Fill untranslated entries through the collaborator. Partial-failure
/// tolerant: one entry's failure is recorded and the batch moves on.
/// Cancellation takes effect between entries; work already applied stands.
pub fn translate_batch(
    store: &mut EntryStore,
    translator: &dyn Translator,
    instructions: &str,
    cancel: &CancelToken,
) -> BatchSummary {
    let order: Vec<String> = store
        .display_entries(DisplayOrder::Position)
        .iter()
        .map(|e| e.identity.clone())
        .collect();

    let mut items = Vec::new();
    let mut translated = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;
    let mut cancelled = false;

    for identity in order {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        let Some(entry) = store.get(&identity) else {
            continue;
        };
        if entry.status != Status::Untranslated {
            skipped += 1;
            continue;
        }
        let result = translator.translate(&entry.source_text, &entry.context, instructions);
        match result {
            Ok(text) if !text.is_empty() => {
                store.update(&identity, |e| e.set_translation(text));
                translated += 1;
                items.push(BatchItemOutcome {
                    identity,
                    status: "translated".into(),
                    error: None,
                });
            }
            Ok(_) => {
                failed += 1;
                items.push(BatchItemOutcome {
                    identity,
                    status: "failed".into(),
                    error: Some(TranslateError::InvalidResponse.to_string()),
                });
            }
            Err(err) => {
                tracing::warn!(event = "ai_translate_failed", identity = %identity, error = %err);
                failed += 1;
                items.push(BatchItemOutcome {
                    identity,
                    status: "failed".into(),
                    error: Some(err.to_string()),
                });
            }
        }
    }

    BatchSummary {
        schema_version: SCHEMA_VERSION,
        translated,
        failed,
        skipped,
        cancelled,
        items,
    }
}
