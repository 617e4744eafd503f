//! Differential to snapshot promotion

use crate::error::{Error, Result};
use ferrum_models::{Differential, Snapshot, StructureDefinition};

/// Copy the differential elements, in order, into a new snapshot.
pub fn promote_differential(differential: &Differential) -> Snapshot {
    Snapshot {
        element: differential.element.clone(),
    }
}

/// Return the definition with a snapshot and `abstract` forced to false.
///
/// A present snapshot is left untouched. Applying this twice is the same as
/// applying it once.
pub fn ensure_snapshot(mut sd: StructureDefinition) -> Result<StructureDefinition> {
    ensure_snapshot_in_place(&mut sd)?;
    Ok(sd)
}

/// In-place variant of [`ensure_snapshot`]; returns whether a snapshot was
/// synthesized from the differential.
pub fn ensure_snapshot_in_place(sd: &mut StructureDefinition) -> Result<bool> {
    // Logical models are instantiated directly, so none of them may stay abstract
    sd.is_abstract = Some(false);

    if sd.snapshot.is_some() {
        return Ok(false);
    }

    let snapshot = match &sd.differential {
        Some(differential) => {
            check_paths(&sd.url, differential)?;
            promote_differential(differential)
        }
        None => Snapshot::default(),
    };
    tracing::debug!(
        url = %sd.url,
        elements = snapshot.element.len(),
        "Promoted differential to snapshot"
    );
    sd.snapshot = Some(snapshot);
    Ok(true)
}

fn check_paths(url: &str, differential: &Differential) -> Result<()> {
    match differential.element.iter().position(|e| e.path.is_empty()) {
        Some(idx) => Err(Error::Differential {
            url: url.to_string(),
            message: format!("element {idx} has an empty path"),
        }),
        None => Ok(()),
    }
}
