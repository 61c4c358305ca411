//! The immutable run configuration (§4.6): built once by the CLI layer from
//! parsed arguments, then passed by shared reference into the classifier and
//! coverage analyzer for the whole run. Replaces the global option state the
//! original tool kept in process-wide singletons (§9).

use std::fmt;

use bitflags::bitflags;

use crate::bucket::BucketRule;

bitflags! {
    /// The category bitmask from §3: one flag per classification tag, kept
    /// orthogonal so a DIE can carry any combination.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct Category: u16 {
        const SINGLE_ADDR       = 1 << 0;
        const ARTIFICIAL        = 1 << 1;
        const INLINED           = 1 << 2;
        const INLINED_SUBROUTINE = 1 << 3;
        const NO_COVERAGE       = 1 << 4;
        const MUTABLE           = 1 << 5;
        const IMMUTABLE         = 1 << 6;
        const IMPLICIT_POINTER  = 1 << 7;
    }
}

impl Category {
    /// Parses a single class name as used in `--ignore`/`--dump`.
    pub fn parse_name(name: &str) -> Option<Category> {
        Some(match name {
            "single_addr" => Category::SINGLE_ADDR,
            "artificial" => Category::ARTIFICIAL,
            "inlined" => Category::INLINED,
            "inlined_subroutine" => Category::INLINED_SUBROUTINE,
            "no_coverage" => Category::NO_COVERAGE,
            "mutable" => Category::MUTABLE,
            "immutable" => Category::IMMUTABLE,
            "implicit_pointer" => Category::IMPLICIT_POINTER,
            _ => return None,
        })
    }
}

/// Parses a comma-separated `CLASS[,...]` list, as used by `--ignore` and
/// `--dump`. Unknown class names are a fatal CLI argument error (§4.6): they
/// indicate a typo in the invocation, not a problem with the input file.
pub fn parse_class_list(raw: &str) -> Result<Category, ClassParseError> {
    let mut mask = Category::empty();
    for name in raw.split(',') {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        match Category::parse_name(name) {
            Some(class) => mask |= class,
            None => {
                return Err(ClassParseError {
                    name: name.to_string(),
                });
            }
        }
    }
    Ok(mask)
}

#[derive(Debug)]
pub struct ClassParseError {
    name: String,
}

impl fmt::Display for ClassParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown class {:?}", self.name)
    }
}

impl std::error::Error for ClassParseError {}

/// The run configuration, built once and borrowed for the lifetime of the
/// analysis (§9: no global mutable option state).
#[derive(Debug)]
pub struct Config {
    pub ignore: Category,
    pub dump: Category,
    pub tabulate: BucketRule,
    pub show_progress: bool,
    pub ignore_implicit_pointer: bool,
}

impl Config {
    /// The union of masks that make a category "of interest" even when it is
    /// not being ignored: being ignored, being dumped, or (for mutability)
    /// being needed to decide implicit-pointer follow-through (§4.3 step 5).
    pub fn interested(&self) -> Category {
        self.ignore | self.dump
    }

    pub fn wants_mutability(&self) -> bool {
        self.interested()
            .intersects(Category::MUTABLE | Category::IMMUTABLE)
    }

    pub fn wants_implicit_tag(&self) -> bool {
        self.interested().contains(Category::IMPLICIT_POINTER)
    }

    pub fn follow_implicit_pointers(&self) -> bool {
        !self.ignore_implicit_pointer
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ignore: Category::empty(),
            dump: Category::empty(),
            tabulate: BucketRule::default(),
            show_progress: false,
            ignore_implicit_pointer: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_classes() {
        let mask = parse_class_list("inlined,mutable").unwrap();
        assert!(mask.contains(Category::INLINED));
        assert!(mask.contains(Category::MUTABLE));
        assert!(!mask.contains(Category::ARTIFICIAL));
    }

    #[test]
    fn rejects_unknown_class() {
        assert!(parse_class_list("not_a_class").is_err());
    }

    #[test]
    fn ignores_empty_items() {
        let mask = parse_class_list("artificial,,inlined").unwrap();
        assert_eq!(mask, Category::ARTIFICIAL | Category::INLINED);
    }
}
