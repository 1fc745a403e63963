// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Go syntax model and printer.
//!
//! The loader produces [`File`] values from Go sources; the generator builds
//! new `File`s out of them and [`print_file`] renders those back to Go text.

mod printer;
mod types;

pub use printer::{print_decl, print_file, signature};
pub use types::{
    is_exported, quote, Decl, Expr, Field, File, FuncDecl, ImportSpec, LiteralShape, Stmt,
    TypeExpr, TypeSpec,
};
