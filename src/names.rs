//! Human-readable name lookups for DWARF codes (§1, "out of scope" item):
//! thin wrappers over `gimli`'s own `Display` impls so callers never hand-roll
//! a tag/attribute/opcode name table.

use gimli::DwTag;

pub fn tag_name(tag: DwTag) -> String {
    tag.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gimli::constants;

    #[test]
    fn known_codes_print_their_dw_name() {
        assert_eq!(tag_name(constants::DW_TAG_variable), "DW_TAG_variable");
    }
}
