//! Canonical tag URIs and normalization of the shorthand forms parsers report.

pub const TAG_PREFIX: &str = "tag:yaml.org,2002:";

pub const TAG_STR: &str = "tag:yaml.org,2002:str";
pub const TAG_BOOL: &str = "tag:yaml.org,2002:bool";
pub const TAG_NULL: &str = "tag:yaml.org,2002:null";
pub const TAG_INT: &str = "tag:yaml.org,2002:int";
pub const TAG_FLOAT: &str = "tag:yaml.org,2002:float";
pub const TAG_SEQ: &str = "tag:yaml.org,2002:seq";
pub const TAG_MAP: &str = "tag:yaml.org,2002:map";

/// Bring a tag to its canonical URI form.
///
/// `!!int`, `tag:yaml.org,2002:int` and `tag:yaml.org,2002:!int` all become
/// `tag:yaml.org,2002:int`. The single-bang shorthand (`!int`) of a core type is treated
/// the same way since `saphyr-parser` renders secondary-handle tags like that. Local
/// tags that do not name a core type are returned unchanged.
pub fn normalize(tag: &str) -> String {
    if let Some(rest) = tag.strip_prefix(TAG_PREFIX) {
        let rest = rest.strip_prefix('!').unwrap_or(rest);
        return format!("{TAG_PREFIX}{rest}");
    }
    if let Some(rest) = tag.strip_prefix("!!") {
        return format!("{TAG_PREFIX}{rest}");
    }
    if let Some(rest) = tag.strip_prefix('!') {
        if is_core_suffix(rest) {
            return format!("{TAG_PREFIX}{rest}");
        }
    }
    tag.to_string()
}

fn is_core_suffix(s: &str) -> bool {
    matches!(s, "str" | "bool" | "null" | "int" | "float" | "seq" | "map")
}

/// Short display form: `!!int` for core tags, the tag itself otherwise.
pub fn short(tag: &str) -> String {
    match tag.strip_prefix(TAG_PREFIX) {
        Some(rest) => format!("!!{rest}"),
        None => tag.to_string(),
    }
}
