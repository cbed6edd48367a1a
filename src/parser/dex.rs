/// DEX labelling
///
/// Primary path matches the provider's source string against the known
/// vendor list (case-insensitive substring). A secondary path derives the
/// label from the first known program id in the instruction list, for
/// records that come from a lower-level parsed source.

use crate::constants::{ DEX_PROGRAM_IDS, KNOWN_DEX_VENDORS };

/// Label from the provider's source/type strings.
/// Unrecognized non-empty sources pass through verbatim.
pub fn label_from_source(source: &str, tx_type: &str) -> String {
    let source = source.trim();
    if !source.is_empty() && !source.eq_ignore_ascii_case("unknown") {
        let lower = source.to_lowercase();
        for (needle, label) in KNOWN_DEX_VENDORS {
            if lower.contains(needle) {
                return label.to_string();
            }
        }
        return source.to_string();
    }

    if tx_type.to_lowercase().contains("swap") {
        "DEX Swap".to_string()
    } else {
        "Unknown".to_string()
    }
}

/// Label from the first known DEX program id in an instruction list
pub fn label_from_programs<'a>(program_ids: impl IntoIterator<Item = &'a str>) -> Option<String> {
    for program_id in program_ids {
        for (known, label) in DEX_PROGRAM_IDS {
            if program_id == *known {
                return Some(label.to_string());
            }
        }
    }
    None
}

/// Combined resolution: source string first; when the source gives nothing
/// specific, fall back to the instruction program ids.
pub fn resolve_label<'a>(
    source: &str,
    tx_type: &str,
    program_ids: impl IntoIterator<Item = &'a str>
) -> String {
    let from_source = label_from_source(source, tx_type);
    if from_source == "Unknown" || from_source == "DEX Swap" {
        if let Some(from_program) = label_from_programs(program_ids) {
            return from_program;
        }
    }
    from_source
}
