//! Public macros for constructing option structs without relying on struct literal syntax.

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// use saphyr_bind::JsonMode;
///
/// let options = saphyr_bind::options! {
///     schema: "1.1".to_string(),
///     json: JsonMode::None,
/// };
/// assert_eq!(options.schema, "1.1");
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct [`crate::SerializerOptions`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// let opts = saphyr_bind::ser_options! {
///     json_null: true,
/// };
/// assert!(opts.json_null);
/// ```
#[macro_export]
macro_rules! ser_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::SerializerOptions::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}
