//! Centralized limits and thresholds for pxdgen.
//!
//! # Categories
//!
//! - **Naming**: bounds on synthetic-name disambiguation
//! - **Recursion Depths**: limits for walking nested type descriptors
//! - **Capacity Limits**: pre-allocation sizes for emitted text

// =============================================================================
// Naming
// =============================================================================

/// Highest numeric suffix tried when disambiguating an import alias.
///
/// Aliases are derived from a package path (`Foo::B` becomes `Foo_B`). When two
/// different foreign declarations map to the same alias, the later one gets
/// `_1`, `_2`, ... in first-encounter order. Running out of suffixes is a hard
/// `NameCollisionError` rather than a silent overwrite.
pub const MAX_ALIAS_SUFFIX: u32 = 9_999;

/// Prefix of the synthetic names given to anonymous aggregates.
///
/// Each anonymous struct/union/enum that is not folded into a typedef receives
/// `pxdgen_anon_<ordinal>`, numbered per translation unit in discovery order.
pub const ANONYMOUS_PREFIX: &str = "pxdgen_anon_";

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting of type descriptors (template arguments inside function
/// pointer parameters inside template arguments, ...).
///
/// Descriptors deeper than this are treated as opaque instead of recursing
/// further.
pub const MAX_TYPE_NESTING_DEPTH: u32 = 64;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Initial capacity of the buffer one output file is rendered into.
pub const OUTPUT_BUFFER_CAPACITY: usize = 4096;

/// Indentation unit of emitted blocks.
pub const INDENT: &str = "    ";
