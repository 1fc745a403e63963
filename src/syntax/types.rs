// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Go syntax tree types.
//!
//! Only the parts of Go that wrapper generation reads or writes are modelled.
//! Anything else (function bodies, struct members, complex type literals) is
//! kept as verbatim source text.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A qualified identifier inside verbatim type text (`io.` in `[]io.Reader`).
static QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^\w.])([\p{L}_][\p{L}\p{N}_]*)\.").expect("valid regex")
});

/// A single Go source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Name from the package clause.
    pub package: String,
    /// Import specifications in source order.
    pub imports: Vec<ImportSpec>,
    /// Top-level declarations in source order.
    pub decls: Vec<Decl>,
}

impl File {
    /// Create an empty file for the given package.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            imports: Vec::new(),
            decls: Vec::new(),
        }
    }
}

/// An import specification: optional local name plus import path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportSpec {
    /// Import path without quotes.
    pub path: String,
    /// Explicit local name (`alias`, `_` or `.`), if any.
    pub alias: Option<String>,
}

impl ImportSpec {
    /// Import a path under its default name.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
        }
    }

    /// Import a path under an explicit local name.
    pub fn aliased(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: Some(alias.into()),
        }
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Func(FuncDecl),
    Type(TypeSpec),
}

impl Decl {
    /// Declared name.
    pub fn name(&self) -> &str {
        match self {
            Self::Func(func) => &func.name,
            Self::Type(spec) => &spec.name,
        }
    }
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncDecl {
    /// Doc comment lines, verbatim (including the `//` markers).
    pub doc: Vec<String>,
    /// Receiver, present for methods.
    pub receiver: Option<Field>,
    pub name: String,
    pub type_params: Vec<Field>,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    /// Body statements. Parsed declarations carry `None`; only synthesized
    /// declarations have a body.
    pub body: Option<Vec<Stmt>>,
}

impl FuncDecl {
    /// Whether this declaration is a method.
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// Number of declared results (named results count individually).
    pub fn result_count(&self) -> usize {
        self.results.iter().map(Field::arity).sum()
    }

    /// Every identifier bound by the signature.
    pub fn bound_names(&self) -> impl Iterator<Item = &str> {
        self.receiver
            .iter()
            .chain(self.type_params.iter())
            .chain(self.params.iter())
            .chain(self.results.iter())
            .flat_map(|field| field.names.iter().map(String::as_str))
    }

    /// Every type expression appearing in the signature, receiver excluded.
    pub fn signature_types(&self) -> impl Iterator<Item = &TypeExpr> {
        self.type_params
            .iter()
            .chain(self.params.iter())
            .chain(self.results.iter())
            .map(|field| &field.ty)
    }

    /// Mutable access to the types [`signature_types`](Self::signature_types)
    /// yields.
    pub fn signature_types_mut(&mut self) -> impl Iterator<Item = &mut TypeExpr> {
        self.type_params
            .iter_mut()
            .chain(self.params.iter_mut())
            .chain(self.results.iter_mut())
            .map(|field| &mut field.ty)
    }
}

/// A type declaration (`type Name ...` or `type Name = ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: String,
    pub type_params: Vec<Field>,
    /// `true` for alias declarations (`type A = B`).
    pub alias: bool,
    pub ty: TypeExpr,
}

impl TypeSpec {
    /// Whether the declared type is an interface.
    pub fn is_interface(&self) -> bool {
        matches!(
            self.ty,
            TypeExpr::Literal {
                shape: LiteralShape::Interface,
                ..
            }
        )
    }
}

/// A named (or anonymous) field in a parameter, result, receiver, type
/// parameter or struct field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Declared names. Empty for anonymous parameters and embedded fields.
    pub names: Vec<String>,
    pub ty: TypeExpr,
}

impl Field {
    pub fn new(names: Vec<String>, ty: TypeExpr) -> Self {
        Self { names, ty }
    }

    /// A field with a single name.
    pub fn named(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            names: vec![name.into()],
            ty,
        }
    }

    /// An anonymous field (unnamed parameter or embedded struct field).
    pub fn anonymous(ty: TypeExpr) -> Self {
        Self {
            names: Vec::new(),
            ty,
        }
    }

    /// Number of values this field declares.
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }
}

/// Rough classification of a type kept as verbatim text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralShape {
    Struct,
    Interface,
    Other,
}

/// A Go type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A plain identifier (`error`, `Config`, `T`).
    Name(String),
    /// A package-qualified identifier (`io.Reader`).
    Qualified { package: String, name: String },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `T[A, B]`
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    /// `...T`, only valid as the last parameter.
    Variadic(Box<TypeExpr>),
    /// A struct type with the given fields.
    Struct(Vec<Field>),
    /// Any other type, kept as source text together with the package
    /// qualifiers it references.
    Literal {
        shape: LiteralShape,
        text: String,
        qualifiers: Vec<String>,
    },
}

impl TypeExpr {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn pointer(inner: TypeExpr) -> Self {
        Self::Pointer(Box::new(inner))
    }

    /// Whether this is exactly the qualified type `package.name`.
    pub fn is_qualified(&self, package: &str, name: &str) -> bool {
        matches!(self, Self::Qualified { package: p, name: n } if p == package && n == name)
    }

    /// Strip any number of pointer indirections.
    pub fn deref(&self) -> &TypeExpr {
        match self {
            Self::Pointer(inner) => inner.deref(),
            other => other,
        }
    }

    /// Every package qualifier referenced anywhere in this type.
    pub fn qualifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_qualifiers(&mut out);
        out
    }

    /// Rewrite package qualifiers through `renames`; others are left alone.
    pub fn requalify(&mut self, renames: &HashMap<String, String>) {
        match self {
            Self::Name(_) => {}
            Self::Qualified { package, .. } => {
                if let Some(renamed) = renames.get(package.as_str()) {
                    *package = renamed.clone();
                }
            }
            Self::Pointer(inner) | Self::Variadic(inner) => inner.requalify(renames),
            Self::Generic { base, args } => {
                base.requalify(renames);
                for arg in args {
                    arg.requalify(renames);
                }
            }
            Self::Struct(fields) => {
                for field in fields {
                    field.ty.requalify(renames);
                }
            }
            Self::Literal {
                text, qualifiers, ..
            } => {
                if !qualifiers.iter().any(|q| renames.contains_key(q)) {
                    return;
                }
                *text = QUALIFIER
                    .replace_all(text, |caps: &Captures<'_>| match renames.get(&caps[2]) {
                        Some(renamed) => format!("{}{}.", &caps[1], renamed),
                        None => caps[0].to_string(),
                    })
                    .into_owned();
                for qualifier in qualifiers.iter_mut() {
                    if let Some(renamed) = renames.get(qualifier.as_str()) {
                        *qualifier = renamed.clone();
                    }
                }
            }
        }
    }

    fn collect_qualifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Name(_) => {}
            Self::Qualified { package, .. } => out.push(package),
            Self::Pointer(inner) | Self::Variadic(inner) => inner.collect_qualifiers(out),
            Self::Generic { base, args } => {
                base.collect_qualifiers(out);
                for arg in args {
                    arg.collect_qualifiers(out);
                }
            }
            Self::Struct(fields) => {
                for field in fields {
                    field.ty.collect_qualifiers(out);
                }
            }
            Self::Literal { qualifiers, .. } => out.extend(qualifiers.iter().map(String::as_str)),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Qualified { package, name } => write!(f, "{}.{}", package, name),
            Self::Pointer(inner) => write!(f, "*{}", inner),
            Self::Generic { base, args } => {
                write!(f, "{}[", base)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str("]")
            }
            Self::Variadic(inner) => write!(f, "...{}", inner),
            Self::Struct(fields) if fields.is_empty() => f.write_str("struct{}"),
            Self::Struct(fields) => {
                f.write_str("struct {\n")?;
                for field in fields {
                    if field.names.is_empty() {
                        writeln!(f, "\t{}", field.ty)?;
                    } else {
                        writeln!(f, "\t{} {}", field.names.join(", "), field.ty)?;
                    }
                }
                f.write_str("}")
            }
            Self::Literal { text, .. } => f.write_str(text),
        }
    }
}

/// A statement in a synthesized function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `a, b := expr`
    Define { lhs: Vec<String>, rhs: Expr },
    /// `defer call`
    Defer(Expr),
    /// `return a, b`
    Return(Vec<Expr>),
    /// A bare expression statement.
    Expr(Expr),
}

/// An expression in a synthesized function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(String),
    /// `x.sel`
    Selector { x: Box<Expr>, sel: String },
    /// `fun[type_args](args...)`; `spread` appends `...` to the last argument.
    Call {
        fun: Box<Expr>,
        type_args: Vec<TypeExpr>,
        args: Vec<Expr>,
        spread: bool,
    },
    /// An interpreted string literal holding the given (unquoted) value.
    Str(String),
    /// `&x`
    AddressOf(Box<Expr>),
    /// `T{elts}`
    Composite { ty: TypeExpr, elts: Vec<Expr> },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// `x.sel`
    pub fn select(self, sel: impl Into<String>) -> Self {
        Self::Selector {
            x: Box::new(self),
            sel: sel.into(),
        }
    }

    /// A plain call without type arguments or spreading.
    pub fn call(self, args: Vec<Expr>) -> Self {
        Self::Call {
            fun: Box::new(self),
            type_args: Vec::new(),
            args,
            spread: false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => f.write_str(name),
            Self::Selector { x, sel } => write!(f, "{}.{}", x, sel),
            Self::Call {
                fun,
                type_args,
                args,
                spread,
            } => {
                write!(f, "{}", fun)?;
                if !type_args.is_empty() {
                    f.write_str("[")?;
                    for (i, arg) in type_args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str("]")?;
                }
                f.write_str("(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                if *spread && !args.is_empty() {
                    f.write_str("...")?;
                }
                f.write_str(")")
            }
            Self::Str(value) => f.write_str(&quote(value)),
            Self::AddressOf(inner) => write!(f, "&{}", inner),
            Self::Composite { ty, elts } => {
                write!(f, "{}{{", ty)?;
                for (i, elt) in elts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", elt)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Quote a string as a Go interpreted string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether a Go identifier is exported (starts with an upper-case letter).
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}
