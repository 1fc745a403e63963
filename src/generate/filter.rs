// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Eligibility rules for wrapping.

use crate::syntax::{is_exported, FuncDecl, LiteralShape, TypeExpr, TypeSpec};

use super::types::Declaration;

/// Qualifier and name of the operation context type.
const CONTEXT_PACKAGE: &str = "context";
const CONTEXT_TYPE: &str = "Context";

/// Whether a declaration gets a wrapper.
pub fn is_wrappable(decl: &Declaration<'_>) -> bool {
    match decl {
        Declaration::Type(spec) => is_exported(&spec.name) && is_embeddable(spec),
        Declaration::Function(func) => is_exported(&func.name) && has_context_param(func),
        Declaration::Method(func) => {
            is_exported(&func.name) && has_context_param(func) && receiver_is_exported(func)
        }
    }
}

/// Whether a wrapper struct can embed the type.
///
/// Generic types need instantiation, and Go forbids embedding pointer types.
/// Aliases may name either, so they are skipped too. Interfaces with type
/// set elements (`~int | ~float64`) are constraints and cannot be used as
/// value types at all.
fn is_embeddable(spec: &TypeSpec) -> bool {
    spec.type_params.is_empty()
        && !spec.alias
        && !matches!(spec.ty, TypeExpr::Pointer(_))
        && !is_constraint(&spec.ty)
}

fn is_constraint(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Literal {
            shape: LiteralShape::Interface,
            text,
            ..
        } => text.contains(['~', '|']),
        _ => false,
    }
}

/// Whether any parameter has type `context.Context`.
pub fn has_context_param(func: &FuncDecl) -> bool {
    context_param_index(func).is_some()
}

/// Index (in `func.params`) of the first `context.Context` parameter.
pub fn context_param_index(func: &FuncDecl) -> Option<usize> {
    func.params
        .iter()
        .position(|field| field.ty.is_qualified(CONTEXT_PACKAGE, CONTEXT_TYPE))
}

/// Whether the receiver's base type is a plain exported type name.
///
/// Generic receivers and anything that is not `T` or `*T` are rejected.
pub fn receiver_is_exported(func: &FuncDecl) -> bool {
    receiver_type_name(func).is_some_and(is_exported)
}

/// Base type name of a method receiver (`Bar` for `*Bar`).
pub fn receiver_type_name(func: &FuncDecl) -> Option<&str> {
    match func.receiver.as_ref()?.ty.deref() {
        TypeExpr::Name(name) => Some(name),
        _ => None,
    }
}
