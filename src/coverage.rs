//! The coverage analyzer (§4.4): the core of the crate. For one classified
//! DIE, resolves its effective address ranges, dispatches on the shape of
//! its location attribute (none / constant / single expression / location
//! list), follows `DW_OP_GNU_implicit_pointer` references recursively, scans
//! for mutability, and folds the result into a final category bitmask plus
//! a coverage percentage.

use std::fmt;

use gimli::{DebugInfoOffset, DebuggingInformationEntry, Operation, Range, UnitOffset};

use crate::bucket::Coverage;
use crate::classify::Location;
use crate::config::{Category, Config};
use crate::die_iter;
use crate::error::{DieError, DieOutcome};
use crate::names;
use crate::object::{Dwarf, Reader, Unit};

type Entry<'u> = DebuggingInformationEntry<'u, 'u, Reader>;

/// DWARF producers do not nest implicit pointers deeply in practice; this
/// caps the mutual recursion between the analyzer and the implicit-pointer
/// resolver so a pathological input cannot exhaust the stack (§9).
const MAX_IMPLICIT_DEPTH: u32 = 32;

/// `(is_mutable, is_immutable)` from §3: both may end up true when a DIE's
/// expression has pieces of each kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mutability {
    pub is_mutable: bool,
    pub is_immutable: bool,
}

impl Mutability {
    fn both() -> Self {
        Mutability {
            is_mutable: true,
            is_immutable: true,
        }
    }

    fn merge(&mut self, other: Mutability) {
        self.is_mutable |= other.is_mutable;
        self.is_immutable |= other.is_immutable;
    }
}

enum AnalyzeError {
    Gimli(gimli::Error),
    NoRanges,
}

impl From<gimli::Error> for AnalyzeError {
    fn from(e: gimli::Error) -> Self {
        AnalyzeError::Gimli(e)
    }
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzeError::Gimli(e) => write!(f, "{e}"),
            AnalyzeError::NoRanges => {
                write!(f, "no address ranges found on this DIE or any ancestor")
            }
        }
    }
}

/// Runs the coverage analyzer (§4.4) on one already-classified DIE.
/// `classified_category` carries the `inlined`/`inlined_subroutine` bits the
/// classifier already derived; this function adds `single_addr`,
/// `implicit_pointer`, `no_coverage`, `mutable`/`immutable`, applies the
/// post-coverage ignore check, and (if requested) dumps the DIE.
#[allow(clippy::too_many_arguments)]
pub fn analyze(
    dwarf: &Dwarf,
    units: &[Unit],
    unit: &Unit,
    entry: &Entry<'_>,
    ancestors: &[UnitOffset],
    location: &Location,
    classified_category: Category,
    config: &Config,
) -> DieOutcome<Coverage> {
    match analyze_inner(
        dwarf,
        units,
        unit,
        entry,
        ancestors,
        location,
        classified_category,
        config,
    ) {
        Ok(outcome) => outcome,
        Err(e) => DieOutcome::Error(DieError::new(entry.offset().0 as u64, e.to_string())),
    }
}

#[allow(clippy::too_many_arguments)]
fn analyze_inner(
    dwarf: &Dwarf,
    units: &[Unit],
    unit: &Unit,
    entry: &Entry<'_>,
    ancestors: &[UnitOffset],
    location: &Location,
    classified_category: Category,
    config: &Config,
) -> Result<DieOutcome<Coverage>, AnalyzeError> {
    let ranges = match effective_ranges(dwarf, unit, entry, ancestors)? {
        Some(ranges) => ranges,
        None => return Err(AnalyzeError::NoRanges),
    };

    let want_mutability = config.wants_mutability();
    let want_implicit_tag = config.wants_implicit_tag();
    let follow_implicit = config.follow_implicit_pointers();

    let (coverage, mut category, mutability) = resolve(
        dwarf,
        units,
        unit,
        location,
        &ranges,
        want_mutability,
        want_implicit_tag,
        follow_implicit,
        0,
    )?;

    if coverage == Coverage::SharpZero {
        if config.ignore.contains(Category::NO_COVERAGE) {
            return Ok(DieOutcome::Filtered);
        }
        category |= Category::NO_COVERAGE;
    } else if want_mutability {
        debug_assert!(mutability.is_mutable || mutability.is_immutable);
        if mutability.is_mutable {
            if config.ignore.contains(Category::MUTABLE) {
                return Ok(DieOutcome::Filtered);
            }
            category |= Category::MUTABLE;
        }
        if mutability.is_immutable {
            if config.ignore.contains(Category::IMMUTABLE) {
                return Ok(DieOutcome::Filtered);
            }
            category |= Category::IMMUTABLE;
        }
    }

    let category = classified_category | category;
    if category.intersects(config.ignore) {
        return Ok(DieOutcome::Filtered);
    }

    if category.intersects(config.dump) {
        dump(unit, entry, ancestors, category);
    }

    Ok(DieOutcome::Ok(coverage))
}

/// §4.4 "Ranges resolution": the nearest non-empty range set found by
/// walking from the DIE up to the CU root.
fn effective_ranges(
    dwarf: &Dwarf,
    unit: &Unit,
    entry: &Entry<'_>,
    ancestors: &[UnitOffset],
) -> gimli::Result<Option<Vec<Range>>> {
    let own = collect_ranges(dwarf, unit, entry)?;
    if !own.is_empty() {
        return Ok(Some(own));
    }

    for &offset in ancestors.iter().rev() {
        let ancestor = die_iter::entry_at(unit, offset)?;
        let ranges = collect_ranges(dwarf, unit, &ancestor)?;
        if !ranges.is_empty() {
            return Ok(Some(ranges));
        }
    }

    Ok(None)
}

fn collect_ranges(dwarf: &Dwarf, unit: &Unit, entry: &Entry<'_>) -> gimli::Result<Vec<Range>> {
    let mut iter = dwarf.die_ranges(unit, entry)?;
    let mut ranges = Vec::new();
    while let Some(range) = iter.next()? {
        ranges.push(range);
    }
    Ok(ranges)
}

/// The recursive engine behind both the top-level analysis and the
/// implicit-pointer recursion (§4.4). `want_implicit_tag` is forced to
/// `false` by callers recursing through an implicit pointer, so the target
/// DIE's own category never pollutes the originating DIE's bitmask.
#[allow(clippy::too_many_arguments)]
fn resolve(
    dwarf: &Dwarf,
    units: &[Unit],
    unit: &Unit,
    location: &Location,
    ranges: &[Range],
    want_mutability: bool,
    want_implicit_tag: bool,
    follow_implicit: bool,
    depth: u32,
) -> gimli::Result<(Coverage, Category, Mutability)> {
    match location {
        Location::None => {
            let mutability = if want_mutability {
                Mutability::both()
            } else {
                Mutability::default()
            };
            Ok((Coverage::SharpZero, Category::empty(), mutability))
        }

        Location::Const => {
            let mutability = if want_mutability {
                Mutability {
                    is_mutable: false,
                    is_immutable: true,
                }
            } else {
                Mutability::default()
            };
            Ok((Coverage::Percent(100), Category::empty(), mutability))
        }

        Location::Attr(attr) => match attr {
            gimli::AttributeValue::Exprloc(expr) => resolve_non_list(
                dwarf,
                units,
                unit,
                expr.clone(),
                ranges,
                want_mutability,
                want_implicit_tag,
                follow_implicit,
                depth,
            ),
            other => match dwarf.attr_locations(unit, other.clone())? {
                Some(entries) => resolve_list(
                    dwarf,
                    units,
                    unit,
                    entries,
                    ranges,
                    want_mutability,
                    want_implicit_tag,
                    follow_implicit,
                    depth,
                ),
                // Not a form the reader recognizes as either a single
                // expression or a location list; nothing to cover.
                None => Ok((Coverage::SharpZero, Category::empty(), Mutability::default())),
            },
        },
    }
}

/// §4.4 "Non-list expression".
#[allow(clippy::too_many_arguments)]
fn resolve_non_list(
    dwarf: &Dwarf,
    units: &[Unit],
    unit: &Unit,
    expr: gimli::Expression<Reader>,
    ranges: &[Range],
    want_mutability: bool,
    want_implicit_tag: bool,
    follow_implicit: bool,
    depth: u32,
) -> gimli::Result<(Coverage, Category, Mutability)> {
    let ops = collect_ops(expr, unit.encoding())?;
    let mut category = Category::empty();

    if let [op] = ops.as_slice() {
        if matches!(op, Operation::Address { .. }) {
            category |= Category::SINGLE_ADDR;
        }

        if let Operation::ImplicitPointer { value, .. } = op {
            if want_implicit_tag {
                category |= Category::IMPLICIT_POINTER;
            }

            if follow_implicit {
                let (coverage, mutability) =
                    resolve_implicit(dwarf, units, *value, ranges, want_mutability, follow_implicit, depth)?;
                return Ok((coverage, category, mutability));
            }

            // Can't tell whether the pointed-to value is covered without
            // following it; report no coverage rather than guess (see
            // DESIGN.md for why this takes priority over the general
            // non-empty-sequence rule below).
            let mutability = if want_mutability {
                scan_mutability(dwarf, units, &ops, ranges, follow_implicit, depth)?
            } else {
                Mutability::default()
            };
            return Ok((Coverage::SharpZero, category, mutability));
        }
    }

    let mutability = if want_mutability {
        scan_mutability(dwarf, units, &ops, ranges, follow_implicit, depth)?
    } else {
        Mutability::default()
    };

    let coverage = if ops.is_empty() {
        Coverage::SharpZero
    } else {
        Coverage::Percent(100)
    };
    Ok((coverage, category, mutability))
}

/// §4.4 "Location list": folds contiguous location-list entries rather than
/// walking one target byte at a time (the optimization sanctioned by §9,
/// since `gimli`'s location lists never hand back overlapping entries for a
/// single address).
#[allow(clippy::too_many_arguments)]
fn resolve_list(
    dwarf: &Dwarf,
    units: &[Unit],
    unit: &Unit,
    mut entries: gimli::LocListIter<Reader>,
    ranges: &[Range],
    want_mutability: bool,
    want_implicit_tag: bool,
    follow_implicit: bool,
    depth: u32,
) -> gimli::Result<(Coverage, Category, Mutability)> {
    let mut list = Vec::new();
    while let Some(entry) = entries.next()? {
        list.push(entry);
    }

    let length: u64 = ranges.iter().map(|r| r.end.saturating_sub(r.begin)).sum();

    let mut covered: u64 = 0;
    let mut category = Category::empty();
    let mut mutability = Mutability::default();

    for die_range in ranges {
        for entry in &list {
            let Some((lo, hi)) = intersect(
                (die_range.begin, die_range.end),
                (entry.range.begin, entry.range.end),
            ) else {
                continue;
            };

            let ops = collect_ops(entry.data.clone(), unit.encoding())?;
            let sole_implicit = matches!(ops.as_slice(), [Operation::ImplicitPointer { .. }]);

            if sole_implicit && want_implicit_tag {
                category |= Category::IMPLICIT_POINTER;
            }

            let mut entry_covered = !ops.is_empty() && (!sole_implicit || !follow_implicit);

            if sole_implicit && follow_implicit {
                if let [Operation::ImplicitPointer { value, .. }] = ops.as_slice() {
                    let sub_ranges = [Range { begin: lo, end: hi }];
                    let (sub_coverage, sub_mutability) = resolve_implicit(
                        dwarf,
                        units,
                        *value,
                        &sub_ranges,
                        want_mutability,
                        follow_implicit,
                        depth,
                    )?;
                    if sub_coverage == Coverage::Percent(100) {
                        entry_covered = true;
                    }
                    if want_mutability {
                        mutability.merge(sub_mutability);
                    }
                }
            }

            if entry_covered {
                covered += hi - lo;
            }

            if want_mutability && !sole_implicit {
                let m = scan_mutability(dwarf, units, &ops, &[Range { begin: lo, end: hi }], follow_implicit, depth)?;
                mutability.merge(m);
            }
        }
    }

    let coverage = if length == 0 || covered == 0 {
        Coverage::SharpZero
    } else {
        Coverage::Percent(((100 * covered) / length) as u8)
    };

    Ok((coverage, category, mutability))
}

/// Implicit-pointer recursion (§4.4). Resolves the referenced DIE's own
/// location and re-enters the analyzer over the *originating* DIE's ranges,
/// not the target's.
fn resolve_implicit(
    dwarf: &Dwarf,
    units: &[Unit],
    value: DebugInfoOffset<<Reader as gimli::Reader>::Offset>,
    ranges: &[Range],
    want_mutability: bool,
    follow_implicit: bool,
    depth: u32,
) -> gimli::Result<(Coverage, Mutability)> {
    if depth >= MAX_IMPLICIT_DEPTH {
        return Ok((Coverage::SharpZero, Mutability::default()));
    }

    let Some((target_unit, target_offset)) = die_iter::resolve_debug_info_offset(units, value) else {
        return Ok((Coverage::SharpZero, Mutability::default()));
    };

    let target_entry = die_iter::entry_at(target_unit, target_offset)?;
    let target_location = crate::classify::resolve_location(dwarf, units, target_unit, &target_entry)?;

    if matches!(target_location, Location::None) {
        return Ok((Coverage::SharpZero, Mutability::default()));
    }

    let (coverage, _category, mutability) = resolve(
        dwarf,
        units,
        target_unit,
        &target_location,
        ranges,
        want_mutability,
        false,
        follow_implicit,
        depth + 1,
    )?;

    Ok((coverage, mutability))
}

/// §4.4 "Mutability scan": walks one expression's operators, committing the
/// running `m` flag at each piece boundary.
fn scan_mutability(
    dwarf: &Dwarf,
    units: &[Unit],
    ops: &[Operation<Reader>],
    ranges: &[Range],
    follow_implicit: bool,
    depth: u32,
) -> gimli::Result<Mutability> {
    let mut result = Mutability::default();
    let mut m = true;

    for op in ops {
        match op {
            Operation::ImplicitValue { .. } | Operation::StackValue => {
                m = false;
            }
            Operation::Piece { .. } => {
                if m {
                    result.is_mutable = true;
                } else {
                    result.is_immutable = true;
                }
                m = true;
            }
            Operation::EntryValue { .. } => {
                // Describes a constant-like quantity; contributes no decision.
            }
            Operation::ImplicitPointer { value, .. } => {
                // By construction this is the sole operand of the expression.
                if !follow_implicit {
                    return Ok(Mutability::both());
                }
                let (_coverage, sub_mutability) =
                    resolve_implicit(dwarf, units, *value, ranges, true, follow_implicit, depth)?;
                result.merge(sub_mutability);
                return Ok(result);
            }
            _ => {}
        }
    }

    if m {
        result.is_mutable = true;
    } else {
        result.is_immutable = true;
    }
    Ok(result)
}

fn collect_ops(
    expr: gimli::Expression<Reader>,
    encoding: gimli::Encoding,
) -> gimli::Result<Vec<Operation<Reader>>> {
    let mut iter = expr.operations(encoding);
    let mut ops = Vec::new();
    while let Some(op) = iter.next()? {
        ops.push(op);
    }
    Ok(ops)
}

fn intersect(a: (u64, u64), b: (u64, u64)) -> Option<(u64, u64)> {
    let lo = a.0.max(b.0);
    let hi = a.1.min(b.1);
    if lo < hi { Some((lo, hi)) } else { None }
}

/// §4.4 "Dump": the DIE's ancestor chain, tag names, and derived category.
fn dump(unit: &Unit, entry: &Entry<'_>, ancestors: &[UnitOffset], category: Category) {
    eprintln!(
        "-- {:#x} {} [{:?}]",
        entry.offset().0,
        names::tag_name(entry.tag()),
        category
    );
    for &offset in ancestors {
        if let Ok(ancestor) = die_iter::entry_at(unit, offset) {
            eprintln!(
                "     parent {:#x} {}",
                ancestor.offset().0,
                names::tag_name(ancestor.tag())
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_overlapping_ranges() {
        assert_eq!(intersect((0, 10), (5, 15)), Some((5, 10)));
        assert_eq!(intersect((0, 10), (10, 20)), None);
        assert_eq!(intersect((0, 10), (20, 30)), None);
    }

    #[test]
    fn mutability_merge_is_union() {
        let mut a = Mutability {
            is_mutable: true,
            is_immutable: false,
        };
        a.merge(Mutability {
            is_mutable: false,
            is_immutable: true,
        });
        assert_eq!(a, Mutability::both());
    }

    // Synthetic-DWARF scenario tests (§8). Each builds a single compile unit
    // in-process with `gimli::write`, loads it back as a `gimli::Dwarf<Reader>`
    // the same shape `object::load` produces, and runs it through `classify`
    // then `analyze`.
    mod scenarios {
        use std::sync::Arc;

        use gimli::constants;
        use gimli::write::{
            Address, EndianVec, Expression, LineProgram, Reference, Sections, Unit, UnitEntryId,
            UnitId,
        };
        use gimli::{EndianArcSlice, Encoding, Format, LittleEndian, Reader as _, RunTimeEndian};

        use super::*;
        use crate::classify::{self, Classified};
        use crate::config::Config;
        use crate::die_iter::AncestorStack;
        use crate::error::DieOutcome;
        use crate::object::{self, Dwarf as ReadDwarf};

        const ENCODING: Encoding = Encoding {
            format: Format::Dwarf32,
            version: 4,
            address_size: 8,
        };

        fn reader(bytes: &[u8]) -> Reader {
            EndianArcSlice::new(Arc::from(bytes), RunTimeEndian::Little)
        }

        const MARKER: &[u8] = b"under_test";

        /// Adds one compile unit to a fresh `write::Dwarf`, lets `configure`
        /// populate its DIE tree (it gets the unit's own `UnitId`, needed for
        /// `DW_OP_implicit_pointer` references within the same unit), writes
        /// the result to in-memory sections, and reads it back. `configure`
        /// must give the DIE under test a `DW_AT_name` of `MARKER`, the only
        /// way to recover its identity once it's round-tripped through bytes.
        fn fixture(
            configure: impl FnOnce(&mut gimli::write::Dwarf, UnitId),
        ) -> (ReadDwarf, Vec<object::Unit>, UnitOffset) {
            let mut write_dwarf = gimli::write::Dwarf::new();
            let unit_id = write_dwarf.units.add(Unit::new(ENCODING, LineProgram::none()));

            configure(&mut write_dwarf, unit_id);

            let mut sections = Sections::new(EndianVec::new(LittleEndian));
            write_dwarf.write(&mut sections).unwrap();

            let dwarf = gimli::Dwarf {
                debug_abbrev: reader(sections.debug_abbrev.slice()).into(),
                debug_addr: reader(&[]).into(),
                debug_aranges: reader(&[]).into(),
                debug_info: reader(sections.debug_info.slice()).into(),
                debug_line: reader(&[]).into(),
                debug_line_str: reader(&[]).into(),
                debug_str: reader(sections.debug_str.slice()).into(),
                debug_str_offsets: reader(&[]).into(),
                debug_types: reader(&[]).into(),
                ranges: gimli::RangeLists::new(
                    reader(sections.debug_ranges.slice()).into(),
                    reader(sections.debug_rnglists.slice()).into(),
                ),
                locations: gimli::LocationLists::new(
                    reader(sections.debug_loc.slice()).into(),
                    reader(sections.debug_loclists.slice()).into(),
                ),
                file_type: gimli::DwarfFileType::Main,
                sup: None,
                abbreviations_cache: gimli::AbbreviationsCache::new(),
            };

            let units = die_iter::compilation_units(&dwarf).unwrap();

            let unit = &units[0];
            let mut cursor = unit.entries();
            let mut offset = None;
            while let Some((_, entry)) = cursor.next_dfs().unwrap() {
                if let Ok(Some(gimli::AttributeValue::String(name))) =
                    entry.attr_value(constants::DW_AT_name)
                {
                    if name.to_slice().map(|s| &*s == MARKER).unwrap_or(false) {
                        offset = Some(entry.offset());
                        break;
                    }
                }
            }
            (dwarf, units, offset.expect("target DIE present"))
        }

        fn mark(entry: &mut gimli::write::DebuggingInformationEntry) {
            entry.set(
                constants::DW_AT_name,
                gimli::write::AttributeValue::String(MARKER.to_vec()),
            );
        }

        fn classify_and_analyze(
            dwarf: &ReadDwarf,
            units: &[object::Unit],
            unit: &object::Unit,
            offset: UnitOffset,
            config: &Config,
        ) -> DieOutcome<Coverage> {
            let entry = die_iter::entry_at(unit, offset).unwrap();
            let ancestors: Vec<UnitOffset> = {
                let mut stack = AncestorStack::new();
                let mut cursor = unit.entries();
                let mut depth: isize = -1;
                let mut found = Vec::new();
                while let Some((delta, e)) = cursor.next_dfs().unwrap() {
                    depth += delta;
                    let a = stack.enter(depth).to_vec();
                    if e.offset() == offset {
                        found = a;
                        break;
                    }
                    stack.push(e.offset());
                }
                found
            };

            match classify::classify(dwarf, units, unit, &entry, &ancestors, config) {
                DieOutcome::Ok(Classified { category, location }) => {
                    analyze(dwarf, units, unit, &entry, &ancestors, &location, category, config)
                }
                DieOutcome::Filtered => DieOutcome::Filtered,
                DieOutcome::Error(e) => DieOutcome::Error(e),
            }
        }

        /// Adds a marked `variable` DIE spanning `[low_pc, low_pc + size)` as
        /// a child of `unit`'s root.
        fn add_variable(unit: &mut Unit, low_pc: u64, size: u64) -> UnitEntryId {
            let root = unit.root();
            let var = unit.add(root, constants::DW_TAG_variable);
            let entry = unit.get_mut(var);
            mark(entry);
            entry.set(
                constants::DW_AT_low_pc,
                gimli::write::AttributeValue::Address(Address::Constant(low_pc)),
            );
            entry.set(constants::DW_AT_high_pc, gimli::write::AttributeValue::Udata(size));
            var
        }

        #[test]
        fn single_address_expression_is_fully_covered() {
            let (dwarf, units, offset) = fixture(|write_dwarf, unit_id| {
                let unit = write_dwarf.units.get_mut(unit_id);
                let var = add_variable(unit, 0x1000, 0x10);
                let mut expr = Expression::new();
                expr.op_addr(Address::Constant(0x2000));
                unit.get_mut(var)
                    .set(constants::DW_AT_location, gimli::write::AttributeValue::Exprloc(expr));
            });

            let config = Config::default();
            let outcome = classify_and_analyze(&dwarf, &units, &units[0], offset, &config);
            match outcome {
                DieOutcome::Ok(coverage) => assert_eq!(coverage, Coverage::Percent(100)),
                other => panic!("expected Ok outcome, got {other:?}"),
            }
        }

        #[test]
        fn missing_location_is_sharp_zero() {
            let (dwarf, units, offset) = fixture(|write_dwarf, unit_id| {
                add_variable(write_dwarf.units.get_mut(unit_id), 0x1000, 0x10);
            });

            let config = Config::default();
            let outcome = classify_and_analyze(&dwarf, &units, &units[0], offset, &config);
            match outcome {
                DieOutcome::Ok(coverage) => assert_eq!(coverage, Coverage::SharpZero),
                other => panic!("expected Ok outcome, got {other:?}"),
            }
        }

        #[test]
        fn no_coverage_is_filtered_when_ignored() {
            let (dwarf, units, offset) = fixture(|write_dwarf, unit_id| {
                add_variable(write_dwarf.units.get_mut(unit_id), 0x1000, 0x10);
            });

            let mut config = Config::default();
            config.ignore |= Category::NO_COVERAGE;
            let outcome = classify_and_analyze(&dwarf, &units, &units[0], offset, &config);
            assert!(matches!(outcome, DieOutcome::Filtered));
        }

        #[test]
        fn mutability_split_across_pieces() {
            let (dwarf, units, offset) = fixture(|write_dwarf, unit_id| {
                let unit = write_dwarf.units.get_mut(unit_id);
                let var = add_variable(unit, 0x1000, 0x10);
                let mut expr = Expression::new();
                expr.op_reg(gimli::Register(0));
                expr.op_piece(4);
                expr.op_implicit_value(vec![0u8; 4].into_boxed_slice());
                expr.op_piece(4);
                unit.get_mut(var)
                    .set(constants::DW_AT_location, gimli::write::AttributeValue::Exprloc(expr));
            });

            let mut config = Config::default();
            config.dump |= Category::MUTABLE | Category::IMMUTABLE;
            let outcome = classify_and_analyze(&dwarf, &units, &units[0], offset, &config);
            match outcome {
                DieOutcome::Ok(coverage) => assert_eq!(coverage, Coverage::Percent(100)),
                other => panic!("expected Ok outcome, got {other:?}"),
            }
        }

        /// Adds a one-entry location list covering `[low_pc, low_pc + size)`
        /// with the given expression and attaches it to `var`'s
        /// `DW_AT_location`.
        fn set_location_list(unit: &mut Unit, var: UnitEntryId, low_pc: u64, size: u64, data: Expression) {
            let loc_id = unit.locations.add(gimli::write::LocationList(vec![gimli::write::Location::StartEnd {
                begin: Address::Constant(low_pc),
                end: Address::Constant(low_pc + size),
                data,
            }]));
            unit.get_mut(var).set(
                constants::DW_AT_location,
                gimli::write::AttributeValue::LocationListRef(loc_id),
            );
        }

        #[test]
        fn location_list_entry_spanning_the_whole_scope_is_fully_covered() {
            let (dwarf, units, offset) = fixture(|write_dwarf, unit_id| {
                let unit = write_dwarf.units.get_mut(unit_id);
                let var = add_variable(unit, 0x1000, 0x10);
                let mut expr = Expression::new();
                expr.op_reg(gimli::Register(0));
                set_location_list(unit, var, 0x1000, 0x10, expr);
            });

            let config = Config::default();
            let outcome = classify_and_analyze(&dwarf, &units, &units[0], offset, &config);
            match outcome {
                DieOutcome::Ok(coverage) => assert_eq!(coverage, Coverage::Percent(100)),
                other => panic!("expected Ok outcome, got {other:?}"),
            }
        }

        #[test]
        fn location_list_entry_covering_half_the_scope_is_half_covered() {
            let (dwarf, units, offset) = fixture(|write_dwarf, unit_id| {
                let unit = write_dwarf.units.get_mut(unit_id);
                let var = add_variable(unit, 0x1000, 0x20);
                let mut expr = Expression::new();
                expr.op_reg(gimli::Register(0));
                set_location_list(unit, var, 0x1000, 0x10, expr);
            });

            let config = Config::default();
            let outcome = classify_and_analyze(&dwarf, &units, &units[0], offset, &config);
            match outcome {
                DieOutcome::Ok(coverage) => assert_eq!(coverage, Coverage::Percent(50)),
                other => panic!("expected Ok outcome, got {other:?}"),
            }
        }

        #[test]
        fn location_list_sole_implicit_pointer_with_follow_recurses_into_target() {
            let (dwarf, units, offset) = fixture(|write_dwarf, unit_id| {
                let unit = write_dwarf.units.get_mut(unit_id);
                let root = unit.root();
                let target = unit.add(root, constants::DW_TAG_variable);
                {
                    let entry = unit.get_mut(target);
                    entry.set(
                        constants::DW_AT_low_pc,
                        gimli::write::AttributeValue::Address(Address::Constant(0x3000)),
                    );
                    entry.set(constants::DW_AT_high_pc, gimli::write::AttributeValue::Udata(0x10));
                    let mut target_expr = Expression::new();
                    target_expr.op_addr(Address::Constant(0x3000));
                    entry.set(
                        constants::DW_AT_location,
                        gimli::write::AttributeValue::Exprloc(target_expr),
                    );
                }

                let var = add_variable(unit, 0x1000, 0x10);
                let mut expr = Expression::new();
                expr.op_implicit_pointer(Reference::Entry(unit_id, target), 0);
                set_location_list(unit, var, 0x1000, 0x10, expr);
            });

            let config = Config::default();
            let outcome = classify_and_analyze(&dwarf, &units, &units[0], offset, &config);
            match outcome {
                DieOutcome::Ok(coverage) => assert_eq!(coverage, Coverage::Percent(100)),
                other => panic!("expected Ok outcome, got {other:?}"),
            }
        }

        #[test]
        fn location_list_sole_implicit_pointer_without_follow_counts_as_covered() {
            let (dwarf, units, offset) = fixture(|write_dwarf, unit_id| {
                let unit = write_dwarf.units.get_mut(unit_id);
                let root = unit.root();
                let target = unit.add(root, constants::DW_TAG_variable);
                let var = add_variable(unit, 0x1000, 0x10);
                let mut expr = Expression::new();
                expr.op_implicit_pointer(Reference::Entry(unit_id, target), 0);
                set_location_list(unit, var, 0x1000, 0x10, expr);
            });

            let config = Config {
                ignore_implicit_pointer: true,
                ..Config::default()
            };
            let outcome = classify_and_analyze(&dwarf, &units, &units[0], offset, &config);
            match outcome {
                DieOutcome::Ok(coverage) => assert_eq!(coverage, Coverage::Percent(100)),
                other => panic!("expected Ok outcome, got {other:?}"),
            }
        }

        #[test]
        fn implicit_pointer_without_follow_is_sharp_zero() {
            let (dwarf, units, offset) = fixture(|write_dwarf, unit_id| {
                let unit = write_dwarf.units.get_mut(unit_id);
                let root = unit.root();
                let target = unit.add(root, constants::DW_TAG_variable);
                {
                    let entry = unit.get_mut(target);
                    entry.set(
                        constants::DW_AT_low_pc,
                        gimli::write::AttributeValue::Address(Address::Constant(0x3000)),
                    );
                    entry.set(constants::DW_AT_high_pc, gimli::write::AttributeValue::Udata(0x10));
                    let mut target_expr = Expression::new();
                    target_expr.op_addr(Address::Constant(0x3000));
                    entry.set(
                        constants::DW_AT_location,
                        gimli::write::AttributeValue::Exprloc(target_expr),
                    );
                }

                let var = add_variable(unit, 0x1000, 0x10);
                let mut expr = Expression::new();
                expr.op_implicit_pointer(Reference::Entry(unit_id, target), 0);
                unit.get_mut(var)
                    .set(constants::DW_AT_location, gimli::write::AttributeValue::Exprloc(expr));
            });

            let config = Config {
                ignore_implicit_pointer: true,
                ..Config::default()
            };
            let outcome = classify_and_analyze(&dwarf, &units, &units[0], offset, &config);
            match outcome {
                DieOutcome::Ok(coverage) => assert_eq!(coverage, Coverage::SharpZero),
                other => panic!("expected Ok outcome, got {other:?}"),
            }
        }
    }
}
