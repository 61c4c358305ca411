//! Helpers for walking the DIE tree (§6.3): collecting compilation units,
//! tracking the ancestor stack during a pre-order walk, and resolving a
//! `.debug_info` offset back to the unit and DIE it names (needed to chase
//! `DW_OP_GNU_implicit_pointer` across unit boundaries).

use gimli::{DebugInfoOffset, UnitOffset, UnitSectionOffset};

use crate::error::ReaderError;
use crate::object::{Dwarf, Reader, Unit};

/// Eagerly collects every compilation unit. Type units (`.debug_types`) carry
/// no executable code and are not a source of coverage data, so they are not
/// visited.
pub fn compilation_units(dwarf: &Dwarf) -> Result<Vec<Unit>, ReaderError> {
    let mut units = Vec::new();
    let mut headers = dwarf.units();
    while let Some(header) = headers.next()? {
        units.push(dwarf.unit(header)?);
    }
    Ok(units)
}

/// Resolves a `.debug_info`-relative offset to the unit that contains it and
/// the DIE's offset within that unit.
///
/// `DW_OP_GNU_implicit_pointer` references a DIE by its absolute offset,
/// which may land in a unit other than the one the expression came from.
pub fn resolve_debug_info_offset(
    units: &[Unit],
    offset: DebugInfoOffset,
) -> Option<(&Unit, UnitOffset)> {
    let section_offset = UnitSectionOffset::DebugInfoOffset(offset);
    let index = match units.binary_search_by_key(&section_offset, |u| u.header.offset()) {
        Ok(index) => index,
        Err(0) => return None,
        Err(next_index) => next_index - 1,
    };

    let unit = &units[index];
    let unit_offset = section_offset.to_unit_offset(unit)?;
    Some((unit, unit_offset))
}

/// Reads the DIE at `offset` within `unit`.
pub fn entry_at<'u>(
    unit: &'u Unit,
    offset: UnitOffset,
) -> gimli::Result<gimli::DebuggingInformationEntry<'u, 'u, Reader>> {
    unit.header.entry(&unit.abbreviations, offset)
}

/// Tracks the chain of ancestor DIE offsets during a `next_dfs` walk, from
/// the unit's root (index 0) down to the immediate parent of the entry
/// currently being visited.
#[derive(Default)]
pub struct AncestorStack(Vec<UnitOffset>);

impl AncestorStack {
    pub fn new() -> Self {
        AncestorStack(Vec::new())
    }

    /// Adjusts the stack for an entry found at `depth` (the running sum of
    /// `next_dfs`'s `delta_depth`) and returns its ancestors, root-first.
    pub fn enter(&mut self, depth: isize) -> &[UnitOffset] {
        self.0.truncate(depth.max(0) as usize);
        &self.0
    }

    /// Records `offset` as a potential parent for whatever is visited next.
    pub fn push(&mut self, offset: UnitOffset) {
        self.0.push(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestor_stack_tracks_descend_sibling_and_ascend() {
        let mut stack = AncestorStack::new();

        // Root DIE: no ancestors.
        assert_eq!(stack.enter(0), &[] as &[UnitOffset]);
        stack.push(UnitOffset(0));

        // First child: root is the only ancestor.
        assert_eq!(stack.enter(1), &[UnitOffset(0)]);
        stack.push(UnitOffset(10));

        // Sibling of the child: still just root as ancestor.
        assert_eq!(stack.enter(1), &[UnitOffset(0)]);
        stack.push(UnitOffset(20));

        // Grandchild: root, then the second child.
        assert_eq!(stack.enter(2), &[UnitOffset(0), UnitOffset(20)]);
        stack.push(UnitOffset(30));

        // Back up to another child of root (delta_depth = -2 from depth 2).
        assert_eq!(stack.enter(1), &[UnitOffset(0)]);
    }
}
