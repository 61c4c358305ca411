//! The per-file driver (§2, §4.1 "implementation direction"): walks every
//! DIE of every compilation unit in pre-order, running each one through the
//! classifier and coverage analyzer and folding the result into a tally,
//! then handing the tally to the reporter.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::byteview::ByteView;
use crate::classify::{self};
use crate::config::Config;
use crate::coverage;
use crate::die_iter::{self, AncestorStack};
use crate::error::{DieOutcome, FileError, ReaderError};
use crate::object;
use crate::report;
use crate::tally::Tally;

/// Processes one input file to completion: opens it, walks its DIEs, and
/// writes its histogram to `out`. Per-DIE errors (§7 level 1) are logged to
/// stderr and do not abort the file; only a reader-level failure (§7 level
/// 2) is returned to the caller.
pub fn process_file(path: &Path, config: &Config, out: &mut impl Write) -> Result<(), FileError> {
    let file = File::open(path).map_err(|source| FileError::Reader {
        path: path.to_path_buf(),
        source: ReaderError::Open {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let data = ByteView::map_file(file).map_err(|source| FileError::Reader {
        path: path.to_path_buf(),
        source: ReaderError::Map {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let dwarf = object::load(&data).map_err(|source| FileError::Reader {
        path: path.to_path_buf(),
        source,
    })?;

    let units = die_iter::compilation_units(&dwarf).map_err(|source| FileError::Reader {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tally = Tally::new();

    for (index, unit) in units.iter().enumerate() {
        if config.show_progress {
            print!("\r{}: CU {}/{}", path.display(), index + 1, units.len());
            let _ = std::io::stdout().flush();
        }

        if let Err(e) = walk_unit(&dwarf, &units, unit, config, &mut tally) {
            eprintln!("dwlocstat: {}: {e}", path.display());
        }
    }

    if config.show_progress {
        println!();
    }

    report::report(&tally, &config.tabulate, out).map_err(|source| FileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

fn walk_unit(
    dwarf: &object::Dwarf,
    units: &[object::Unit],
    unit: &object::Unit,
    config: &Config,
    tally: &mut Tally,
) -> gimli::Result<()> {
    let mut cursor = unit.entries();
    let mut stack = AncestorStack::new();
    let mut depth: isize = -1;

    while let Some((delta, entry)) = cursor.next_dfs()? {
        depth += delta;
        let entry = entry.clone();
        let ancestors = stack.enter(depth).to_vec();

        match classify::classify(dwarf, units, unit, &entry, &ancestors, config) {
            DieOutcome::Ok(classified) => {
                match coverage::analyze(
                    dwarf,
                    units,
                    unit,
                    &entry,
                    &ancestors,
                    &classified.location,
                    classified.category,
                    config,
                ) {
                    DieOutcome::Ok(coverage) => tally.record(coverage),
                    DieOutcome::Filtered => {}
                    DieOutcome::Error(e) => eprintln!("dwlocstat: {e}"),
                }
            }
            DieOutcome::Filtered => {}
            DieOutcome::Error(e) => eprintln!("dwlocstat: {e}"),
        }

        stack.push(entry.offset());
    }

    Ok(())
}
