//! XOR/AND compositing engine.
//!
//! Walks a [`CompositePlan`] bottom to top and builds a layer stack:
//!
//! - A **mask** entry (`-XOR` layer) followed by another entry: the next
//!   entry's image is drawn with its alpha replaced by the mask's alpha. The
//!   mask itself is not drawn. If the mask layer has an `-AND` companion
//!   (matched by name when the catalog was built), the companion variant at
//!   the mask's ordinal is drawn next, unmasked. The walk then skips both
//!   entries.
//! - A mask entry with nothing after it is drawn as a plain image, with a
//!   warning.
//! - Anything else is drawn as a plain image.
//!
//! The first element of the stack is the base; the rest are overlaid in
//! order. Pairing is positional (mask → next plan entry) while companion
//! lookup is by name; both are kept as-is.
//!
//! ```text
//! plan:   [bg_v2, eyes-xor_m1, pupils_p2]      (Eyes-AND present)
//! stack:  [bg_v2, pupils_p2 & alpha(m1), eyes-and_a1]
//! ```

use crate::imaging::{BackendError, RasterBackend};
use crate::select::CompositePlan;
use crate::types::{Catalog, LayerRole};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("Composite plan is empty")]
    EmptyPlan,
    #[error("Plan entry refers to layer {index}, catalog has {len} layers")]
    UnknownLayer { index: usize, len: usize },
    #[error("Raster backend failed: {0}")]
    Backend(#[from] BackendError),
}

/// Composite `plan` into a single raster.
pub fn composite<B: RasterBackend>(
    backend: &B,
    catalog: &Catalog,
    plan: &CompositePlan,
) -> Result<B::Raster, CompositeError> {
    let entries = &plan.entries;
    if entries.is_empty() {
        return Err(CompositeError::EmptyPlan);
    }
    if let Some(bad) = entries.iter().find(|e| e.layer >= catalog.layers.len()) {
        return Err(CompositeError::UnknownLayer {
            index: bad.layer,
            len: catalog.layers.len(),
        });
    }

    let mut stack: Vec<B::Raster> = Vec::with_capacity(entries.len() + 1);
    let mut i = 0;
    while i < entries.len() {
        let entry = &entries[i];
        let layer = &catalog.layers[entry.layer];

        let LayerRole::Mask { companion } = layer.role else {
            stack.push(backend.load(&entry.path)?);
            i += 1;
            continue;
        };

        let Some(target) = entries.get(i + 1) else {
            warn!(
                layer = layer.name.as_str(),
                "mask layer has nothing above it, drawing it as a plain layer"
            );
            stack.push(backend.load(&entry.path)?);
            i += 1;
            continue;
        };

        let image = backend.load(&target.path)?;
        let mask = backend.load(&entry.path)?;
        stack.push(backend.apply_mask(image, mask)?);

        if let Some(companion) = companion {
            let companion_layer = &catalog.layers[companion];
            let ordinal = layer.ordinal_of(&entry.path);
            match ordinal.and_then(|o| companion_layer.images.get(o)) {
                Some(variant) => stack.push(backend.load(&variant.path)?),
                None => debug!(
                    mask = layer.name.as_str(),
                    companion = companion_layer.name.as_str(),
                    ?ordinal,
                    "companion has no variant at the mask's ordinal, skipping"
                ),
            }
        }
        i += 2;
    }

    let mut layers = stack.into_iter();
    let base = layers.next().ok_or(CompositeError::EmptyPlan)?;
    Ok(backend.flatten(base, layers.collect())?)
}
