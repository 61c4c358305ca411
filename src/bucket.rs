//! The bucket-rule engine (§4.2): parses a small "10:10"-style grammar into
//! an ordered stepper used by the reporter to decide where each histogram
//! row ends.

use std::fmt;

/// A coverage percentage, or the distinguished "sharp zero" value meaning
/// "no byte covered at all" (as opposed to a ratio that merely rounds to
/// zero). See §3, "Coverage value".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Coverage {
    SharpZero,
    Percent(u8),
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coverage::SharpZero => write!(f, "0.0"),
            Coverage::Percent(p) => write!(f, "{p}"),
        }
    }
}

/// One step of a tabulation rule: this run of the histogram ends at `start`
/// and the *next* run starts `step` past it (or the rule has run out of
/// steppers, if `step == 0`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Item {
    start: Coverage,
    step: u32,
}

/// A parsed `--tabulate` rule together with the runtime stepping state
/// described in §4.3 of the data model.
#[derive(Clone, Debug)]
pub struct BucketRule {
    items: Vec<Item>,
}

impl Default for BucketRule {
    fn default() -> Self {
        // "10:10" is the CLI default (§6.1).
        BucketRule::parse("10:10")
    }
}

impl BucketRule {
    /// Parses the grammar in §4.2. Tolerates trailing garbage inside an
    /// item by logging to stderr and treating it as `step=0`; ignores empty
    /// items; always appends the `(100, 0)` sentinel; sorts ascending by
    /// `start`.
    pub fn parse(rule: &str) -> Self {
        let mut items = Vec::new();

        for raw in rule.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let (start_str, step_str) = match raw.split_once(':') {
                Some((s, step)) => (s, Some(step)),
                None => (raw, None),
            };

            let start = match parse_start(start_str) {
                Some(s) => s,
                None => {
                    eprintln!("dwlocstat: ignoring malformed tabulate item {raw:?}");
                    continue;
                }
            };

            let step = match step_str {
                None => 0,
                Some(s) => match s.trim().parse::<u32>() {
                    Ok(v) => v,
                    Err(_) => {
                        eprintln!(
                            "dwlocstat: trailing garbage in tabulate item {raw:?}, using step=0"
                        );
                        0
                    }
                },
            };

            items.push(Item { start, step });
        }

        items.push(Item {
            start: Coverage::Percent(100),
            step: 0,
        });
        items.sort_by_key(|i| i.start);
        items.dedup_by_key(|i| i.start);

        BucketRule { items }
    }

    /// True iff the current (head) bucket ends exactly at `v`.
    pub fn matches(&self, v: Coverage) -> bool {
        self.items.first().map(|i| i.start) == Some(v)
    }

    /// Advances the stepper past the current head, per §4.3: pop if the
    /// step is zero, else bump `start` by `step` and collapse any
    /// now-stale followers.
    pub fn advance(&mut self) {
        let Some(head) = self.items.first_mut() else {
            return;
        };

        if head.step == 0 {
            self.items.remove(0);
            return;
        }

        let next_start = match head.start {
            Coverage::SharpZero => 0,
            Coverage::Percent(p) => p as u32 + head.step,
        };
        head.start = Coverage::Percent(next_start.min(100) as u8);

        if self.items.len() > 1 && self.items[0].start > self.items[1].start {
            self.items.remove(0);
        }
        while self.items.len() > 1 && self.items[0].start == self.items[1].start {
            self.items.remove(0);
        }
    }
}

fn parse_start(s: &str) -> Option<Coverage> {
    let s = s.trim();
    if s == "0.0" {
        return Some(Coverage::SharpZero);
    }
    s.parse::<u32>().ok().map(|v| Coverage::Percent(v.min(100) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_is_10_10() {
        let mut rule = BucketRule::default();
        let expected = [10u8, 20, 30, 40, 50, 60, 70, 80, 90, 100];
        for &v in &expected {
            assert!(rule.matches(Coverage::Percent(v)), "expected match at {v}");
            rule.advance();
        }
    }

    #[test]
    fn sharp_zero_is_its_own_bucket_by_default() {
        let rule = BucketRule::default();
        assert!(!rule.matches(Coverage::SharpZero));
    }

    #[test]
    fn bucket_collapse_rule_5_5_10_10() {
        // Scenario 5 from §8: "5:5,10:10" collapses the stale 5-stepper
        // once the 10-stepper reaches the same boundary.
        let mut rule = BucketRule::parse("5:5,10:10");
        assert!(rule.matches(Coverage::Percent(5)));
        rule.advance();
        assert!(rule.matches(Coverage::Percent(10)));
        rule.advance();
        assert!(rule.matches(Coverage::Percent(20)));
        rule.advance();
        assert!(rule.matches(Coverage::Percent(30)));
    }

    #[test]
    fn sentinel_always_reachable() {
        let mut rule = BucketRule::parse("50:0");
        assert!(rule.matches(Coverage::Percent(50)));
        rule.advance();
        assert!(rule.matches(Coverage::Percent(100)));
    }

    #[test]
    fn trailing_garbage_defaults_to_step_zero() {
        let rule = BucketRule::parse("10:abc");
        assert!(rule.matches(Coverage::Percent(10)));
    }

    #[test]
    fn empty_items_are_ignored() {
        let rule = BucketRule::parse("10:10,,20:5");
        // Sorted ascending, sentinel appended: 10, 20, 100.
        assert!(rule.matches(Coverage::Percent(10)));
    }
}
