// crates/devdesc-rs-eds/src/layout.rs

//! Section names and field positions shared by the parser and the builder.

// --- Sections ---

pub(crate) const FILE: &str = "File";
pub(crate) const DEVICE: &str = "Device";
pub(crate) const PARAMS: &str = "Params";
pub(crate) const ASSEMBLY: &str = "Assembly";
pub(crate) const CONNECTION_MANAGER: &str = "Connection Manager";

// --- Entry key prefixes ---

pub(crate) const PARAM_PREFIX: &str = "Param";
pub(crate) const ENUM_PREFIX: &str = "Enum";
pub(crate) const ASSEM_PREFIX: &str = "Assem";
pub(crate) const CONNECTION_PREFIX: &str = "Connection";

/// Text pool language every EDS display string is stored under.
pub(crate) const TEXT_LANGUAGE: &str = "en";

/// Datatype kind given to `EnumN` value maps.
pub(crate) const ENUM_KIND: &str = "Enum";

// --- ParamN ---

pub(crate) const PARAM_NAME: usize = 6;
pub(crate) const PARAM_UNITS: usize = 7;
pub(crate) const PARAM_HELP: usize = 8;
pub(crate) const PARAM_MIN: usize = 9;
pub(crate) const PARAM_MAX: usize = 10;
pub(crate) const PARAM_DEFAULT: usize = 11;

/// A `ParamN` entry must carry at least reserved through default.
pub(crate) const PARAM_MIN_FIELDS: usize = 12;

/// Fields past this position have no name and are kept as `fieldN`.
pub(crate) const PARAM_NAMED_FIELDS: usize = 21;

/// Fields kept verbatim as parameter attributes, by position.
pub(crate) const PARAM_RAW_FIELDS: [(usize, &str); 15] = [
    (0, "reserved"),
    (1, "link_path_size"),
    (2, "link_path"),
    (3, "descriptor"),
    (4, "data_type"),
    (5, "data_size"),
    (12, "scaling_multiplier"),
    (13, "scaling_divider"),
    (14, "scaling_base"),
    (15, "scaling_offset"),
    (16, "multiplier_link"),
    (17, "divider_link"),
    (18, "base_link"),
    (19, "offset_link"),
    (20, "decimal_places"),
];

/// Fields that must read as integers when present.
pub(crate) const PARAM_NUMERIC_FIELDS: [(usize, &str); 5] = [
    (1, "link_path_size"),
    (3, "descriptor"),
    (4, "data_type"),
    (5, "data_size"),
    (20, "decimal_places"),
];

/// Descriptor bit flagging a read-only parameter.
pub(crate) const DESCRIPTOR_READ_ONLY: i64 = 0x0010;

pub(crate) fn param_extra_field(index: usize) -> String {
    format!("field{}", index)
}

/// Position of a `fieldN` attribute name.
pub(crate) fn param_extra_index(name: &str) -> Option<usize> {
    name.strip_prefix("field")?.parse().ok()
}

// --- AssemN ---

pub(crate) const ASSEM_NAME: usize = 0;
pub(crate) const ASSEM_PATH: usize = 1;
pub(crate) const ASSEM_SIZE: usize = 2;
pub(crate) const ASSEM_DESCRIPTOR: usize = 3;
pub(crate) const ASSEM_RESERVED: usize = 4;
/// Member `(size, reference)` pairs start here.
pub(crate) const ASSEM_MEMBERS: usize = 6;

// --- ConnectionN ---

pub(crate) const CONN_OT_RPI: usize = 2;
pub(crate) const CONN_OT_SIZE: usize = 3;
pub(crate) const CONN_TO_SIZE: usize = 6;
pub(crate) const CONN_NAME: usize = 12;
pub(crate) const CONN_HELP: usize = 13;
pub(crate) const CONN_PATH: usize = 14;

/// Text pool id of a display string owned by `owner`.
pub(crate) fn text_id(owner: &str, field: &str) -> String {
    format!("{}.{}", owner, field)
}

/// The `N` of a key such as `Param12`, if the key has that exact shape.
pub(crate) fn numbered(key: &str, prefix: &str) -> Option<u32> {
    let digits = key.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_keys() {
        assert_eq!(numbered("Param12", PARAM_PREFIX), Some(12));
        assert_eq!(numbered("ParamClass", PARAM_PREFIX), None);
        assert_eq!(numbered("Param", PARAM_PREFIX), None);
        assert_eq!(numbered("Assem100", ASSEM_PREFIX), Some(100));
        assert_eq!(param_extra_index(&param_extra_field(23)), Some(23));
    }
}
