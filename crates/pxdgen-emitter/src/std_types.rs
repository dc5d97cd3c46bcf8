//! Built-in and library type tables.
//!
//! Built-ins pass through without lookup. Library types map C and C++
//! standard names onto the declarations Cython bundles under `libc` and
//! `libcpp`, and are imported through the same alias rule as any other
//! foreign declaration.

use once_cell::sync::Lazy;
use pxdgen_model::NamedType;
use rustc_hash::FxHashMap;

/// C/C++ built-in type spellings and the spelling emitted for them.
const BUILTINS: &[(&str, &str)] = &[
    ("void", "void"),
    ("bool", "bint"),
    ("_Bool", "bint"),
    ("char", "char"),
    ("signed char", "signed char"),
    ("unsigned char", "unsigned char"),
    ("wchar_t", "wchar_t"),
    ("char16_t", "char16_t"),
    ("char32_t", "char32_t"),
    ("short", "short"),
    ("short int", "short"),
    ("unsigned short", "unsigned short"),
    ("unsigned short int", "unsigned short"),
    ("int", "int"),
    ("signed", "int"),
    ("signed int", "int"),
    ("unsigned", "unsigned int"),
    ("unsigned int", "unsigned int"),
    ("long", "long"),
    ("long int", "long"),
    ("unsigned long", "unsigned long"),
    ("unsigned long int", "unsigned long"),
    ("long long", "long long"),
    ("long long int", "long long"),
    ("unsigned long long", "unsigned long long"),
    ("unsigned long long int", "unsigned long long"),
    ("float", "float"),
    ("double", "double"),
    ("long double", "long double"),
    ("size_t", "size_t"),
    ("ssize_t", "ssize_t"),
    ("std::size_t", "size_t"),
];

/// The compiler's variadic argument list, emitted as an untyped pointer.
pub const BUILTIN_VA_LIST: &str = "__builtin_va_list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryType {
    pub module: &'static str,
    pub name: &'static str,
    /// `std::vector` is imported as `std_vector`; C names keep their own.
    pub alias: &'static str,
}

const LIBRARY: &[(&str, LibraryType)] = &[
    ("int8_t", lib_c("libc.stdint", "int8_t")),
    ("int16_t", lib_c("libc.stdint", "int16_t")),
    ("int32_t", lib_c("libc.stdint", "int32_t")),
    ("int64_t", lib_c("libc.stdint", "int64_t")),
    ("uint8_t", lib_c("libc.stdint", "uint8_t")),
    ("uint16_t", lib_c("libc.stdint", "uint16_t")),
    ("uint32_t", lib_c("libc.stdint", "uint32_t")),
    ("uint64_t", lib_c("libc.stdint", "uint64_t")),
    ("intptr_t", lib_c("libc.stdint", "intptr_t")),
    ("uintptr_t", lib_c("libc.stdint", "uintptr_t")),
    ("intmax_t", lib_c("libc.stdint", "intmax_t")),
    ("uintmax_t", lib_c("libc.stdint", "uintmax_t")),
    ("FILE", lib_c("libc.stdio", "FILE")),
    ("fpos_t", lib_c("libc.stdio", "fpos_t")),
    ("clock_t", lib_c("libc.time", "clock_t")),
    ("time_t", lib_c("libc.time", "time_t")),
    ("std::complex", lib_cpp("libcpp.complex", "complex", "std_complex")),
    ("std::deque", lib_cpp("libcpp.deque", "deque", "std_deque")),
    ("std::list", lib_cpp("libcpp.list", "list", "std_list")),
    ("std::map", lib_cpp("libcpp.map", "map", "std_map")),
    ("std::unique_ptr", lib_cpp("libcpp.memory", "unique_ptr", "std_unique_ptr")),
    ("std::shared_ptr", lib_cpp("libcpp.memory", "shared_ptr", "std_shared_ptr")),
    ("std::weak_ptr", lib_cpp("libcpp.memory", "weak_ptr", "std_weak_ptr")),
    ("std::queue", lib_cpp("libcpp.queue", "queue", "std_queue")),
    ("std::priority_queue", lib_cpp("libcpp.queue", "priority_queue", "std_priority_queue")),
    ("std::set", lib_cpp("libcpp.set", "set", "std_set")),
    ("std::multiset", lib_cpp("libcpp.set", "multiset", "std_multiset")),
    ("std::stack", lib_cpp("libcpp.stack", "stack", "std_stack")),
    ("std::string", lib_cpp("libcpp.string", "string", "std_string")),
    ("std::unordered_map", lib_cpp("libcpp.unordered_map", "unordered_map", "std_unordered_map")),
    ("std::unordered_set", lib_cpp("libcpp.unordered_set", "unordered_set", "std_unordered_set")),
    (
        "std::unordered_multiset",
        lib_cpp("libcpp.unordered_set", "unordered_multiset", "std_unordered_multiset"),
    ),
    ("std::pair", lib_cpp("libcpp.pair", "pair", "std_pair")),
    ("std::vector", lib_cpp("libcpp.vector", "vector", "std_vector")),
];

const fn lib_c(module: &'static str, name: &'static str) -> LibraryType {
    LibraryType {
        module,
        name,
        alias: name,
    }
}

const fn lib_cpp(module: &'static str, name: &'static str, alias: &'static str) -> LibraryType {
    LibraryType {
        module,
        name,
        alias,
    }
}

static BUILTIN_TABLE: Lazy<FxHashMap<&'static str, &'static str>> =
    Lazy::new(|| BUILTINS.iter().copied().collect());

static LIBRARY_TABLE: Lazy<FxHashMap<&'static str, LibraryType>> =
    Lazy::new(|| LIBRARY.iter().copied().collect());

/// Emitted spelling of a built-in type, if `named` is one.
pub fn builtin(named: &NamedType) -> Option<&'static str> {
    if named.segments.iter().any(|s| !s.args.is_empty()) {
        return None;
    }
    BUILTIN_TABLE.get(named.qualified_name().as_str()).copied()
}

/// Library type named by a prefix of `named`'s segments. Returns the entry
/// and the index of the segment it matched, so the remaining segments can be
/// reached as members (`std::vector<int>::iterator`).
///
/// Inline namespaces (`std::__1`, `std::__cxx11`) are skipped.
pub fn library(named: &NamedType) -> Option<(LibraryType, usize)> {
    let mut path = String::new();
    for (index, segment) in named.segments.iter().enumerate() {
        if index > 0 && segment.name.starts_with("__") {
            continue;
        }
        if !path.is_empty() {
            path.push_str("::");
        }
        path.push_str(&segment.name);
        if let Some(entry) = LIBRARY_TABLE.get(path.as_str()) {
            return Some((*entry, index));
        }
    }
    None
}

#[cfg(test)]
#[path = "tests/std_types.rs"]
mod tests;
