//! The classifier (§4.3): the per-DIE filter that runs before the coverage
//! analyzer ever looks at a location expression.

use gimli::{AttributeValue, DebuggingInformationEntry, DwAt, UnitOffset};

use gimli::constants::{
    DW_AT_abstract_origin, DW_AT_artificial, DW_AT_const_value, DW_AT_declaration, DW_AT_external,
    DW_AT_inline, DW_AT_location, DW_AT_specification, DW_TAG_formal_parameter,
    DW_TAG_inlined_subroutine, DW_TAG_subprogram, DW_TAG_subroutine_type, DW_TAG_variable,
};

use crate::config::{Category, Config};
use crate::die_iter;
use crate::error::{DieError, DieOutcome};
use crate::object::{Dwarf, Reader, Unit};

type Entry<'u> = DebuggingInformationEntry<'u, 'u, Reader>;

/// What the coverage analyzer should look at for a surviving DIE (§4.3 step
/// 7, "location resolution").
#[derive(Debug, Clone)]
pub enum Location {
    None,
    /// `DW_AT_const_value` stood in for a missing `DW_AT_location`.
    Const,
    Attr(AttributeValue<Reader>),
}

#[derive(Debug)]
pub struct Classified {
    /// Only the `inlined`/`inlined_subroutine` bits are populated here; the
    /// coverage analyzer adds the rest once it knows the coverage outcome.
    pub category: Category,
    pub location: Location,
}

/// Runs the gates of §4.3 against one DIE. `ancestors` is the chain from the
/// CU root down to (but excluding) `entry`, as produced by
/// [`die_iter::AncestorStack`].
pub fn classify(
    dwarf: &Dwarf,
    units: &[Unit],
    unit: &Unit,
    entry: &Entry<'_>,
    ancestors: &[UnitOffset],
    config: &Config,
) -> DieOutcome<Classified> {
    match classify_inner(dwarf, units, unit, entry, ancestors, config) {
        Ok(outcome) => outcome,
        Err(e) => DieOutcome::Error(DieError::new(entry.offset().0 as u64, e.to_string())),
    }
}

fn classify_inner(
    dwarf: &Dwarf,
    units: &[Unit],
    unit: &Unit,
    entry: &Entry<'_>,
    ancestors: &[UnitOffset],
    config: &Config,
) -> gimli::Result<DieOutcome<Classified>> {
    let is_formal_parameter = entry.tag() == DW_TAG_formal_parameter;
    if !is_formal_parameter && entry.tag() != DW_TAG_variable {
        return Ok(DieOutcome::Filtered);
    }

    if flag_value(entry, DW_AT_declaration)? {
        return Ok(DieOutcome::Filtered);
    }

    if config.ignore.contains(Category::ARTIFICIAL) && flag_value(entry, DW_AT_artificial)? {
        return Ok(DieOutcome::Filtered);
    }

    if is_formal_parameter {
        if let Some(&parent_offset) = ancestors.last() {
            let parent = die_iter::entry_at(unit, parent_offset)?;
            if parent.tag() == DW_TAG_subroutine_type || flag_value(&parent, DW_AT_declaration)? {
                return Ok(DieOutcome::Filtered);
            }
        }
    }

    let mut category = Category::empty();
    let interested = config.interested();
    if interested.intersects(Category::INLINED | Category::INLINED_SUBROUTINE) {
        let mut inlined = false;
        let mut inlined_subroutine = false;
        for &ancestor_offset in ancestors {
            let ancestor = die_iter::entry_at(unit, ancestor_offset)?;
            if interested.contains(Category::INLINED)
                && ancestor.tag() == DW_TAG_subprogram
                && is_inlined(&ancestor)?
            {
                inlined = true;
                if interested.contains(Category::INLINED_SUBROUTINE) && inlined_subroutine {
                    break;
                }
            }
            if interested.contains(Category::INLINED_SUBROUTINE)
                && ancestor.tag() == DW_TAG_inlined_subroutine
            {
                inlined_subroutine = true;
                if interested.contains(Category::INLINED) && inlined {
                    break;
                }
            }
        }

        if inlined {
            if config.ignore.contains(Category::INLINED) {
                return Ok(DieOutcome::Filtered);
            }
            category |= Category::INLINED;
        }
        if inlined_subroutine {
            if config.ignore.contains(Category::INLINED_SUBROUTINE) {
                return Ok(DieOutcome::Filtered);
            }
            category |= Category::INLINED_SUBROUTINE;
        }
    }

    let location_attr = integrated_location(dwarf, units, unit, entry)?;

    if flag_value(entry, DW_AT_external)? && location_attr.is_none() {
        return Ok(DieOutcome::Filtered);
    }

    let location = match location_attr {
        Some(attr) => Location::Attr(attr),
        None => match entry.attr_value(DW_AT_const_value)? {
            Some(_) => Location::Const,
            None => Location::None,
        },
    };

    Ok(DieOutcome::Ok(Classified { category, location }))
}

/// `DW_AT_inline` holds a `DW_INL_*` enumerator; any non-`DW_INL_not_inlined`
/// value means the subprogram was a candidate for inlining somewhere.
fn is_inlined(entry: &Entry<'_>) -> gimli::Result<bool> {
    Ok(match entry.attr_value(DW_AT_inline)? {
        Some(AttributeValue::Inline(v)) => v.0 != 0,
        Some(AttributeValue::Udata(v)) => v != 0,
        Some(AttributeValue::Data1(v)) => v != 0,
        _ => false,
    })
}

/// A flag attribute lookup that does *not* follow `DW_AT_specification` /
/// `DW_AT_abstract_origin` (only `DW_AT_location` is integrated; see the
/// classification gates above).
fn flag_value(entry: &Entry<'_>, attr: DwAt) -> gimli::Result<bool> {
    match entry.attr_value(attr)? {
        None => Ok(false),
        Some(AttributeValue::Flag(v)) => Ok(v),
        Some(_) => Err(gimli::Error::TypeMismatch),
    }
}

/// §4.3 step 7's location resolution (`location`, else `const_value`, else
/// none), exposed for the implicit-pointer recursion in the coverage
/// analyzer (§4.4): an implicit pointer's target DIE is resolved the same
/// way a normal DIE's location is.
pub(crate) fn resolve_location(
    dwarf: &Dwarf,
    units: &[Unit],
    unit: &Unit,
    entry: &Entry<'_>,
) -> gimli::Result<Location> {
    Ok(match integrated_location(dwarf, units, unit, entry)? {
        Some(attr) => Location::Attr(attr),
        None => match entry.attr_value(DW_AT_const_value)? {
            Some(_) => Location::Const,
            None => Location::None,
        },
    })
}

/// `DW_AT_location`, following `DW_AT_abstract_origin`/`DW_AT_specification`
/// references (possibly into another unit) when the DIE itself doesn't carry
/// one directly.
fn integrated_location(
    dwarf: &Dwarf,
    units: &[Unit],
    unit: &Unit,
    entry: &Entry<'_>,
) -> gimli::Result<Option<AttributeValue<Reader>>> {
    let _ = dwarf;
    let mut current = entry.clone();
    for _ in 0..16 {
        if let Some(loc) = current.attr_value(DW_AT_location)? {
            return Ok(Some(loc));
        }

        let reference = match current.attr_value(DW_AT_abstract_origin)? {
            Some(v) => Some(v),
            None => current.attr_value(DW_AT_specification)?,
        };

        match reference {
            Some(AttributeValue::UnitRef(offset)) => {
                current = die_iter::entry_at(unit, offset)?;
            }
            Some(AttributeValue::DebugInfoRef(offset)) => {
                match die_iter::resolve_debug_info_offset(units, offset) {
                    Some((target_unit, target_offset)) => {
                        current = die_iter::entry_at(target_unit, target_offset)?;
                    }
                    None => return Ok(None),
                }
            }
            _ => return Ok(None),
        }
    }
    Ok(None)
}
