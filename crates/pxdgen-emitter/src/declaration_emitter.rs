//! Declaration File (.pxd) Emitter
//!
//! Serializes one output file: the stub section, the import section, then
//! one `cdef extern from` block per package and origin header.
//!
//! ```text
//! // geometry.hpp
//! namespace geo {
//! struct Point { double x, y; };
//! class Shape {
//!   public:
//!     Shape(int sides = 3);
//!     virtual double area() const;
//!   private:
//!     int sides_;
//! };
//! }
//! ```
//!
//! Generates:
//!
//! ```text
//! cdef extern from "geometry.hpp" namespace "geo":
//!     struct Point:
//!         double x
//!         double y
//!     cppclass Shape:
//!         Shape()
//!         Shape(int)
//!         double area() const
//! ```

use std::path::Path;

use pxdgen_common::diagnostics::diagnostic_messages;
use pxdgen_common::limits::{INDENT, OUTPUT_BUFFER_CAPACITY};
use pxdgen_common::Diagnostic;
use pxdgen_model::{
    DeclDetail, DeclFlags, DeclId, DeclKind, Declaration, DeclarationGraph, FileId, FunctionRole,
    MacroValue, Partition,
};
use tracing::trace;

use crate::EmitOptions;
use crate::order::{OriginGroup, is_emitted, is_hoisted, origin_groups};
use crate::resolver::{FileResolution, SlotPosition, StubKind, TypeSlot};
use crate::type_printer::{print_declaration, print_type};

pub const STUB_SECTION_MARKER: &str = "#  PXDGEN AUTO-DEFINED TYPES";
pub const IMPORT_SECTION_MARKER: &str = "#  PXDGEN IMPORTS";

/// Prefix of lines Cython would reject.
const COMMENT_PREFIX: &str = "#  ";

/// Operators Cython cannot declare.
const UNSUPPORTED_OPERATORS: &[&str] = &[
    "operator+=",
    "operator-=",
    "operator*=",
    "operator/=",
    "operator%=",
    "operator^=",
    "operator&=",
    "operator|=",
    "operator<<=",
    "operator>>=",
    "operator->",
    "operator->*",
];

/// Identifiers that are keywords in Cython but not in C.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "by", "cimport", "def",
    "del", "elif", "except", "exec", "finally", "from", "global", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "print", "raise", "with", "yield",
];

pub struct DeclarationEmitter<'a> {
    graph: &'a DeclarationGraph,
    partition: &'a Partition,
    resolution: &'a FileResolution,
    options: &'a EmitOptions,
    output: String,
    indent_level: u32,
    /// Non-comment lines written so far; a body that adds none needs `pass`.
    statements: u32,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> DeclarationEmitter<'a> {
    pub fn new(
        graph: &'a DeclarationGraph,
        partition: &'a Partition,
        resolution: &'a FileResolution,
        options: &'a EmitOptions,
    ) -> Self {
        Self {
            graph,
            partition,
            resolution,
            options,
            output: String::with_capacity(OUTPUT_BUFFER_CAPACITY),
            indent_level: 0,
            statements: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Text of `file` and the warnings raised while printing it.
    pub fn emit(mut self, file: FileId) -> (String, Vec<Diagnostic>) {
        let (graph, partition, resolution) = (self.graph, self.partition, self.resolution);
        let generator = self.options.generator;

        if generator.autodefine() && !resolution.stubs.is_empty() {
            self.emit_stubs();
            self.write_line();
        }

        if generator.emit_imports() && !resolution.imports.is_empty() {
            self.write_statement(IMPORT_SECTION_MARKER);
            for edge in &resolution.imports {
                self.write_statement(&edge.to_line());
            }
            self.write_line();
        }

        for &package in &partition.file(file).packages {
            let package = partition.package(package);
            let namespace = graph.namespace(package.namespace);
            for group in origin_groups(graph, partition, &generator, package) {
                self.emit_block(&group, &namespace.qualified_name());
                self.write_line();
            }
        }

        while self.output.ends_with("\n\n") {
            self.output.pop();
        }
        (self.output, self.diagnostics)
    }

    fn emit_stubs(&mut self) {
        self.write_statement(STUB_SECTION_MARKER);
        self.write_statement("cdef extern from *:");
        self.increase_indent();
        let resolution = self.resolution;
        for stub in &resolution.stubs {
            let cname = if stub.cname == stub.name {
                String::new()
            } else {
                format!(" \"{}\"", stub.cname)
            };
            let header = match stub.kind {
                StubKind::Struct => format!("ctypedef struct {}{cname}:", stub.name),
                StubKind::Union => format!("ctypedef union {}{cname}:", stub.name),
                StubKind::Enum => format!("ctypedef enum {}{cname}:", stub.name),
                StubKind::Class { params } => {
                    format!("cppclass {}{cname}{}:", stub.name, template_list(params))
                }
            };
            self.write_statement(&header);
            self.increase_indent();
            self.write_statement("pass");
            self.decrease_indent();
        }
        self.decrease_indent();
    }

    fn emit_block(&mut self, group: &OriginGroup, namespace: &str) {
        let label = self.header_label(&group.origin);
        let label = if group.system {
            format!("<{label}>")
        } else {
            label
        };
        let mut header = format!("cdef extern from \"{label}\"");
        if !namespace.is_empty() {
            header.push_str(&format!(" namespace \"{namespace}\""));
        }
        header.push(':');
        self.write_statement(&header);

        self.increase_indent();
        let before = self.statements;
        for &id in &group.decls {
            self.emit_decl(id);
        }
        if self.statements == before {
            self.write_statement("pass");
        }
        self.decrease_indent();
    }

    /// `origin` relative to the first include root containing it, or its
    /// file name.
    fn header_label(&self, origin: &str) -> String {
        let path = Path::new(origin);
        for root in &self.options.include_roots {
            if let Ok(relative) = path.strip_prefix(root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                if !parts.is_empty() {
                    return parts.join("/");
                }
            }
        }
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| origin.to_string())
    }

    fn emit_decl(&mut self, id: DeclId) {
        let graph = self.graph;
        let decl = graph.decl(id);
        trace!(name = %decl.name, kind = decl.kind.as_str(), "emitting declaration");
        match decl.kind {
            DeclKind::Struct | DeclKind::Union | DeclKind::Class | DeclKind::Template => {
                self.emit_aggregate(decl)
            }
            DeclKind::Enum => self.emit_enum(decl),
            DeclKind::Typedef => self.emit_typedef(decl),
            DeclKind::Variable => self.emit_variable(decl),
            DeclKind::Function => self.emit_function(decl),
            DeclKind::Macro => self.emit_macro(decl),
        }
    }

    fn emit_aggregate(&mut self, decl: &Declaration) {
        let is_cppclass = matches!(decl.kind, DeclKind::Class | DeclKind::Template)
            || decl.nests_children();
        let keyword = match decl.kind {
            _ if is_cppclass => "cppclass",
            DeclKind::Union => "union",
            _ => "struct",
        };
        let prefix = if decl.flags.contains(DeclFlags::TYPEDEF_NAME) && !is_cppclass {
            "ctypedef "
        } else {
            ""
        };
        let name = self.declared_name(decl);
        let params = template_params(&decl.template_params);

        if !decl.is_definition() {
            self.write_statement(&format!("{prefix}{keyword} {name}{params}"));
            return;
        }

        for &child in &decl.children {
            if is_hoisted(self.graph, child) && self.is_emitted(child) {
                self.emit_decl(child);
            }
        }

        self.write_statement(&format!("{prefix}{keyword} {name}{params}:"));
        self.increase_indent();
        let before = self.statements;
        for &child in &decl.children {
            if !is_hoisted(self.graph, child) && self.is_emitted(child) {
                self.emit_decl(child);
            }
        }
        if self.statements == before {
            self.write_statement("pass");
        }
        self.decrease_indent();
    }

    fn emit_enum(&mut self, decl: &Declaration) {
        let prefix = if decl.flags.contains(DeclFlags::TYPEDEF_NAME) {
            "ctypedef "
        } else {
            ""
        };
        let name = self.declared_name(decl);
        if !decl.is_definition() {
            self.write_statement(&format!("{prefix}enum {name}"));
            return;
        }

        self.write_statement(&format!("{prefix}enum {name}:"));
        self.increase_indent();
        let constants = match &decl.detail {
            DeclDetail::Enum { constants } => constants.as_slice(),
            _ => &[],
        };
        for constant in constants {
            self.write_statement(&format!("{} = {}", constant.name, constant.value));
        }
        if constants.is_empty() {
            self.write_statement("pass");
        }
        self.decrease_indent();
    }

    fn emit_typedef(&mut self, decl: &Declaration) {
        let DeclDetail::Typedef { target } = &decl.detail else {
            return;
        };
        let reason = if !decl.template_params.is_empty() {
            Some("alias template")
        } else if target.has_rvalue_ref() {
            Some("rvalue reference")
        } else {
            None
        };
        let name = self.declared_name(decl);
        let text = format!("ctypedef {}", self.slot_declaration(decl.id, SlotPosition::Value, &name));
        self.write_member(decl, &[text], reason);
    }

    fn emit_variable(&mut self, decl: &Declaration) {
        let DeclDetail::Variable { ty } = &decl.detail else {
            return;
        };
        let reason = if decl.parent.is_some() && decl.is_static() {
            Some("static data member")
        } else if ty.has_rvalue_ref() {
            Some("rvalue reference")
        } else if PYTHON_KEYWORDS.contains(&decl.name.as_str()) {
            Some("name is a Python keyword")
        } else {
            None
        };
        let name = self.declared_name(decl);
        let text = self.slot_declaration(decl.id, SlotPosition::Value, &name);
        self.write_member(decl, &[text], reason);
    }

    fn emit_function(&mut self, decl: &Declaration) {
        let Some(sig) = decl.function() else {
            return;
        };
        let reason = unsupported_function(decl);

        let name = match (sig.role, decl.parent) {
            (FunctionRole::Constructor, Some(parent)) => self.declared_name(self.graph.decl(parent)),
            _ => format!(
                "{}{}",
                self.declared_name(decl),
                template_params(&decl.template_params)
            ),
        };
        let is_static_method = decl.parent.is_some() && decl.is_static();

        // One line per callable arity when trailing parameters have defaults.
        let mut lines = Vec::new();
        for arity in sig.first_default()..=sig.params.len() {
            let mut params: Vec<String> = (0..arity)
                .map(|i| self.slot_type(decl.id, SlotPosition::Param(i as u32)))
                .collect();
            if sig.variadic {
                params.push("...".to_string());
            }
            let call = format!("{name}({})", params.join(", "));
            let mut line = match sig.role {
                FunctionRole::Constructor => call,
                _ => self.slot_declaration(decl.id, SlotPosition::Return, &call),
            };
            if decl.flags.contains(DeclFlags::CONST_METHOD) {
                line.push_str(" const");
            }
            if decl.flags.contains(DeclFlags::THROWS) {
                line.push_str(" except +");
            }
            if is_static_method {
                lines.push("@staticmethod".to_string());
            }
            lines.push(line);
        }
        self.write_member(decl, &lines, reason);
    }

    fn emit_macro(&mut self, decl: &Declaration) {
        let DeclDetail::Macro {
            value,
            function_like,
        } = &decl.detail
        else {
            return;
        };
        let text = if *function_like {
            format!("const int {}(...)", decl.name)
        } else {
            let ty = match value {
                MacroValue::Integer => "long",
                MacroValue::Float => "double",
                MacroValue::Other => "int",
            };
            format!("const {ty} {}", decl.name)
        };
        let reason = PYTHON_KEYWORDS
            .contains(&decl.name.as_str())
            .then_some("name is a Python keyword");
        self.write_member(decl, &[text], reason);
    }

    /// Writes `lines`, commented out with a warning when `reason` is set.
    fn write_member(&mut self, decl: &Declaration, lines: &[String], reason: Option<&str>) {
        match reason {
            None => {
                for line in lines {
                    self.write_statement(line);
                }
            }
            Some(reason) => {
                for line in lines {
                    self.write_indent();
                    self.write(COMMENT_PREFIX);
                    self.write(line);
                    self.write_line();
                }
                self.diagnostics.push(Diagnostic::from_message(
                    &decl.location,
                    &diagnostic_messages::UNSUPPORTED_CONSTRUCT,
                    &[self.graph.qualified_name(decl.id), reason],
                ));
            }
        }
    }

    /// Name `decl` is declared under, with the C name attached when the
    /// file renamed it.
    fn declared_name(&self, decl: &Declaration) -> String {
        if decl.parent.is_none() && self.partition.is_renamed(decl.id) {
            format!(
                "{} \"{}\"",
                self.partition.local_name(self.graph, decl.id),
                decl.name
            )
        } else {
            decl.name.clone()
        }
    }

    fn slot_declaration(&self, decl: DeclId, position: SlotPosition, declarator: &str) -> String {
        match self.resolution.get(TypeSlot::new(decl, position)) {
            Some(ty) => print_declaration(ty, declarator),
            None => format!("void* {declarator}"),
        }
    }

    fn slot_type(&self, decl: DeclId, position: SlotPosition) -> String {
        match self.resolution.get(TypeSlot::new(decl, position)) {
            Some(ty) => print_type(ty),
            None => "void*".to_string(),
        }
    }

    fn is_emitted(&self, id: DeclId) -> bool {
        is_emitted(self.graph, self.partition, &self.options.generator, id)
    }

    // =========================================================================
    // Output helpers
    // =========================================================================

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn write_line(&mut self) {
        self.output.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str(INDENT);
        }
    }

    /// One indented line that Cython reads as a declaration.
    fn write_statement(&mut self, s: &str) {
        self.write_indent();
        self.write(s);
        self.write_line();
        self.statements += 1;
    }

    fn increase_indent(&mut self) {
        self.indent_level += 1;
    }

    fn decrease_indent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }
}

fn unsupported_function(decl: &Declaration) -> Option<&'static str> {
    let sig = decl.function()?;
    let name = decl.name.as_str();
    if UNSUPPORTED_OPERATORS.contains(&name) {
        return Some("operator");
    }
    if name.starts_with("operator\"\"") {
        return Some("literal operator");
    }
    if PYTHON_KEYWORDS.contains(&name) {
        return Some("name is a Python keyword");
    }
    if sig.role == FunctionRole::Constructor && !decl.template_params.is_empty() {
        return Some("templated constructor");
    }
    let rvalue = sig.ret.as_ref().is_some_and(|ret| ret.has_rvalue_ref())
        || sig.params.iter().any(|p| p.ty.has_rvalue_ref());
    rvalue.then_some("rvalue reference")
}

fn template_params(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("[{}]", params.join(", "))
    }
}

/// `[T0, T1]` for a stub with `count` parameters.
fn template_list(count: usize) -> String {
    let names: Vec<String> = (0..count).map(|i| format!("T{i}")).collect();
    template_params(&names)
}
