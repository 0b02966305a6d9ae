//! Rails column method to diagram type mapping.

/// Column helper methods understood by both parser tiers, with the type
/// shown in the diagram.
const COLUMN_METHODS: &[(&str, &str)] = &[
    ("string", "varchar"),
    ("text", "text"),
    ("integer", "int"),
    ("bigint", "int"),
    ("float", "float"),
    ("decimal", "decimal"),
    ("boolean", "boolean"),
    ("date", "date"),
    ("datetime", "datetime"),
    ("timestamp", "timestamp"),
    ("time", "time"),
    ("json", "json"),
    ("jsonb", "jsonb"),
    ("uuid", "uuid"),
    ("binary", "binary"),
];

/// Type of a `t.<method>` column helper, if it is one of the modeled helpers.
pub fn mapped_type(method: &str) -> Option<&'static str> {
    COLUMN_METHODS
        .iter()
        .find(|(m, _)| *m == method)
        .map(|(_, typ)| *typ)
}

/// Type for a column declared through `t.<method>`; unknown helpers pass
/// through verbatim (`t.citext "slug"` shows as `citext`).
pub fn column_type(method: &str) -> String {
    mapped_type(method)
        .map(str::to_string)
        .unwrap_or_else(|| method.to_string())
}

/// Type of the foreign key column added by `references` / `belongs_to`.
pub const REFERENCE_TYPE: &str = "int";
/// Type of the `created_at` / `updated_at` pair.
pub const TIMESTAMP_TYPE: &str = "datetime";
/// Type of the `<name>_type` column added for polymorphic references.
pub const POLYMORPHIC_TYPE: &str = "varchar";
