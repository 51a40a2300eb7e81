use crate::budget::Budget;
use crate::event::Version;

/// How documents are flagged as JSON for schema selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JsonMode {
    /// Take whatever the event source reports. The text adapter reports YAML.
    #[default]
    Auto,
    /// Never treat documents as JSON.
    None,
    /// Treat every document as JSON, which makes `auto` select the `json` schema.
    Force,
}

/// Binding configuration.
///
/// Example: bind a small record with a fixed schema.
///
/// ```rust
/// use saphyr_bind::{Field, Shape, Shaped};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Config {
///     enabled: bool,
/// }
///
/// impl Shaped for Config {
///     fn shape() -> Shape {
///         Shape::record::<Self>(|| vec![Field::of::<bool>("enabled")])
///     }
/// }
///
/// let options = saphyr_bind::options! {
///     schema: "1.1".to_string(),
/// };
/// let cfg: Config = saphyr_bind::from_str_with_options("enabled: yes", options).unwrap();
/// assert!(cfg.enabled);
/// ```
#[derive(Clone, Debug)]
pub struct Options {
    /// Registry name of the schema to use. `"auto"` (default) follows the document.
    pub schema: String,
    /// Overrides the YAML version the event source reports for each document.
    pub version: Option<Version>,
    /// JSON detection for schema selection.
    pub json: JsonMode,
    /// Optional resource budget, checked on every event.
    pub budget: Option<Budget>,
    /// Skip keys that name no field of a record target instead of failing.
    pub ignore_unknown_fields: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            schema: "auto".to_string(),
            version: None,
            json: JsonMode::Auto,
            budget: Some(Budget::default()),
            ignore_unknown_fields: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let opts = Options::default();
        assert_eq!(opts.schema, "auto");
        assert!(opts.version.is_none());
        assert_eq!(opts.json, JsonMode::Auto);
        assert!(opts.budget.is_some());
        assert!(!opts.ignore_unknown_fields);
    }

    #[test]
    fn test_options_macro() {
        let opts = crate::options! {
            version: Some(Version::V1_1),
            ignore_unknown_fields: true,
        };
        assert_eq!(opts.version, Some(Version::V1_1));
        assert!(opts.ignore_unknown_fields);
        assert_eq!(opts.schema, "auto");
    }
}
