//! The reporter (§4.5): walks the tally from `SHARP_ZERO` through 100,
//! emitting one row each time the bucket engine's head matches the current
//! value.
//!
//! `SHARP_ZERO` is represented internally as `-1`, exactly as the source
//! does, so that `last_pct`'s "not yet seen a real percentage" state and the
//! `i + 1` advance read the same way they do there.

use std::io::{self, Write};

use crate::bucket::{BucketRule, Coverage};
use crate::tally::Tally;

const SHARP_ZERO: i32 = -1;

/// Prints the tab-separated histogram for one input file's tally.
///
/// `rule` is the `--tabulate` rule as configured; a fresh stepping copy is
/// made for each report so that results for one file never depend on how
/// many rows a previous file emitted.
pub fn report(tally: &Tally, rule: &BucketRule, out: &mut impl Write) -> io::Result<()> {
    if tally.total() == 0 {
        return writeln!(out, "No coverage recorded.");
    }

    writeln!(out, "cov%\tsamples\tcumul")?;

    let total = tally.total();
    let mut rule = rule.clone();
    let mut cumulative: u64 = 0;
    let mut last: u64 = 0;
    let mut last_pct = SHARP_ZERO;

    for i in SHARP_ZERO..=100 {
        cumulative += tally.count(coverage_of(i));
        if !rule.matches(coverage_of(i)) {
            continue;
        }

        let samples = cumulative - last;
        if last_pct == SHARP_ZERO && i > SHARP_ZERO {
            last_pct = 0;
        }

        let mut label = if last_pct == SHARP_ZERO {
            "0.0".to_string()
        } else {
            last_pct.to_string()
        };
        if last_pct != i {
            label.push_str("..");
            label.push_str(&i.to_string());
        }

        writeln!(
            out,
            "{label}\t{samples}/{}%\t{cumulative}/{}%",
            percent_of(samples, total),
            percent_of(cumulative, total),
        )?;

        last = cumulative;
        last_pct = i + 1;
        rule.advance();
    }

    Ok(())
}

fn coverage_of(i: i32) -> Coverage {
    if i == SHARP_ZERO {
        Coverage::SharpZero
    } else {
        Coverage::Percent(i as u8)
    }
}

fn percent_of(value: u64, total: u64) -> u64 {
    value.saturating_mul(100).checked_div(total).unwrap_or(0)
}
