//! Prints resolved types as Cython declarators.
//!
//! The declarator is built inside out, the way C composes it: qualifiers are
//! applied from the outermost to the innermost, and a function base wraps
//! whatever has been built so far before handing it to its return type.
//!
//! ```text
//! int (**foobar)(std_vector[std_vector[const char*]])
//! ```

use pxdgen_model::Qualifier;

use crate::resolver::{ResolvedArg, ResolvedBase, ResolvedSegment, ResolvedType};

/// `ty` on its own, as used in parameter lists and template arguments.
pub fn print_type(ty: &ResolvedType) -> String {
    compose(ty, String::new())
}

/// `ty` declaring `name`. `name` may already carry a parameter list.
pub fn print_declaration(ty: &ResolvedType, name: &str) -> String {
    compose(ty, name.to_string())
}

fn compose(ty: &ResolvedType, mut declarator: String) -> String {
    for qualifier in ty.chain.iter().rev() {
        declarator = match qualifier {
            Qualifier::Pointer { is_const: false } => format!("*{declarator}"),
            Qualifier::Pointer { is_const: true } if declarator.is_empty() => "* const".to_string(),
            Qualifier::Pointer { is_const: true } => format!("* const {declarator}"),
            Qualifier::LvalueRef => format!("&{declarator}"),
            Qualifier::RvalueRef => format!("&&{declarator}"),
            Qualifier::Array(len) => {
                let inner = if starts_with_indirection(&declarator) {
                    format!("({declarator})")
                } else {
                    declarator
                };
                match len {
                    Some(len) => format!("{inner}[{len}]"),
                    None => format!("{inner}[]"),
                }
            }
        };
    }

    match &ty.base {
        ResolvedBase::Named { path, .. } => {
            let mut base = String::new();
            if ty.is_const {
                base.push_str("const ");
            }
            base.push_str(&print_path(path));
            attach(base, &declarator)
        }
        ResolvedBase::Function {
            ret,
            params,
            variadic,
        } => {
            let inner = if starts_with_indirection(&declarator) {
                format!("({declarator})")
            } else {
                declarator
            };
            let mut params: Vec<String> = params.iter().map(print_type).collect();
            if *variadic {
                params.push("...".to_string());
            }
            compose(ret, format!("{inner}({})", params.join(", ")))
        }
    }
}

fn starts_with_indirection(declarator: &str) -> bool {
    declarator.starts_with('*') || declarator.starts_with('&')
}

/// Leading `*`/`&` stick to the type (`const char* name`) and pointer
/// `const` keeps its spaces (`char* const* name`); anything parenthesized
/// keeps a space (`int (* const cb)(int)`).
fn attach(base: String, declarator: &str) -> String {
    if declarator.is_empty() {
        return base;
    }
    let mut indirection = String::new();
    let mut rest = declarator;
    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix(['*', '&']) {
            indirection.push_str(&trimmed[..1]);
            rest = after;
        } else if let Some(after) = trimmed
            .strip_prefix("const")
            .filter(|after| after.is_empty() || after.starts_with(' '))
        {
            indirection.push_str(" const");
            rest = after;
        } else {
            rest = trimmed;
            break;
        }
    }
    if rest.starts_with('(') {
        return format!("{base} {declarator}");
    }
    if rest.is_empty() {
        format!("{base}{indirection}")
    } else {
        format!("{base}{indirection} {rest}")
    }
}

fn print_path(path: &[ResolvedSegment]) -> String {
    let parts: Vec<String> = path
        .iter()
        .map(|segment| {
            if segment.args.is_empty() {
                segment.name.clone()
            } else {
                let args: Vec<String> = segment.args.iter().map(print_arg).collect();
                format!("{}[{}]", segment.name, args.join(", "))
            }
        })
        .collect();
    parts.join(".")
}

fn print_arg(arg: &ResolvedArg) -> String {
    match arg {
        ResolvedArg::Type(ty) => print_type(ty),
        ResolvedArg::Value(value) => value.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/type_printer.rs"]
mod tests;
