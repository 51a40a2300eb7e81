/// Marshaling configuration.
#[derive(Clone, Copy, Debug)]
pub struct SerializerOptions {
    /// Render null as `null` instead of `~`.
    pub json_null: bool,
    /// Maximum nesting of emitted collections. Deeper (or cyclic) values are rejected.
    ///
    /// Default: 1,024
    pub max_depth: usize,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            json_null: false,
            max_depth: 1024,
        }
    }
}
