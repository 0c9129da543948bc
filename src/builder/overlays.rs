//! Overlay entry assembly.
//!
//! Resolves every collected [`OverlayContribution`] and rewrites the pack
//! descriptor's `overlays.entries` list. Entry order is observable: the
//! game applies the last matching entry when several cover the same format
//! version, so dependency declaration order becomes the priority order.

use anyhow::Result;

use super::OverlayContribution;
use crate::pack::{OverlayEntry, PackDescriptor};
use crate::version::FormatRange;

/// Resolve contributions and merge them into the descriptor.
///
/// `contributions[0]` is the project base entry; it goes first, followed by
/// entries the descriptor already declared, followed by the dependency
/// entries in declaration order.
pub(super) fn assemble(
    descriptor: &mut PackDescriptor,
    contributions: &[OverlayContribution],
) -> Result<()> {
    let (base, rest) = contributions
        .split_first()
        .expect("the project base contribution is registered during staging");

    let base_entry = resolve(base)?;
    let dependency_entries = rest.iter().map(resolve).collect::<Result<Vec<_>>>()?;
    descriptor.merge_overlay_entries(base_entry, dependency_entries)?;
    Ok(())
}

fn resolve(contribution: &OverlayContribution) -> Result<OverlayEntry> {
    // Range expressions were validated when the contributing manifest was
    // read, so a failure here is a real bug rather than bad user input.
    let range = FormatRange::resolve(&contribution.range_expr)?;
    Ok(OverlayEntry::new(&contribution.directory, range))
}
