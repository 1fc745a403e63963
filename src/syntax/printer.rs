// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! gofmt-style rendering of the syntax model.
//!
//! Output uses tab indentation, a single import block and one blank line
//! between top-level declarations. Rendering is deterministic: the same
//! `File` always produces the same bytes.

use super::types::{quote, Decl, Field, File, FuncDecl, ImportSpec, Stmt, TypeSpec};

/// Render a complete source file.
pub fn print_file(file: &File) -> String {
    let mut out = String::new();
    out.push_str(&format!("package {}\n", file.package));

    match file.imports.as_slice() {
        [] => {}
        [single] => {
            out.push_str(&format!("\nimport {}\n", import_spec(single)));
        }
        specs => {
            out.push_str("\nimport (\n");
            for spec in specs {
                out.push_str(&format!("\t{}\n", import_spec(spec)));
            }
            out.push_str(")\n");
        }
    }

    for decl in &file.decls {
        out.push('\n');
        print_decl(&mut out, decl);
    }

    out
}

/// Render a single top-level declaration (with trailing newline).
pub fn print_decl(out: &mut String, decl: &Decl) {
    match decl {
        Decl::Type(spec) => print_type(out, spec),
        Decl::Func(func) => print_func(out, func),
    }
}

fn import_spec(spec: &ImportSpec) -> String {
    match &spec.alias {
        Some(alias) => format!("{} {}", alias, quote(&spec.path)),
        None => quote(&spec.path),
    }
}

fn print_type(out: &mut String, spec: &TypeSpec) {
    out.push_str("type ");
    out.push_str(&spec.name);
    out.push_str(&type_params(&spec.type_params));
    if spec.alias {
        out.push_str(" =");
    }
    out.push_str(&format!(" {}\n", spec.ty));
}

fn print_func(out: &mut String, func: &FuncDecl) {
    for line in &func.doc {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&signature(func));

    match &func.body {
        None => out.push('\n'),
        Some(body) if body.is_empty() => out.push_str(" {\n}\n"),
        Some(body) => {
            out.push_str(" {\n");
            for stmt in body {
                out.push('\t');
                out.push_str(&statement(stmt));
                out.push('\n');
            }
            out.push_str("}\n");
        }
    }
}

/// Render the `func ...` header of a declaration, without body.
pub fn signature(func: &FuncDecl) -> String {
    let mut sig = String::from("func ");
    if let Some(receiver) = &func.receiver {
        sig.push_str(&format!("({}) ", field(receiver)));
    }
    sig.push_str(&func.name);
    sig.push_str(&type_params(&func.type_params));
    sig.push_str(&format!("({})", field_list(&func.params)));
    sig.push_str(&results(&func.results));
    sig
}

fn type_params(params: &[Field]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("[{}]", field_list(params))
    }
}

fn results(fields: &[Field]) -> String {
    match fields {
        [] => String::new(),
        [single] if single.names.is_empty() => format!(" {}", single.ty),
        fields => format!(" ({})", field_list(fields)),
    }
}

fn field_list(fields: &[Field]) -> String {
    fields.iter().map(field).collect::<Vec<_>>().join(", ")
}

fn field(field: &Field) -> String {
    if field.names.is_empty() {
        field.ty.to_string()
    } else {
        format!("{} {}", field.names.join(", "), field.ty)
    }
}

fn statement(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Define { lhs, rhs } => format!("{} := {}", lhs.join(", "), rhs),
        Stmt::Defer(call) => format!("defer {}", call),
        Stmt::Return(values) if values.is_empty() => "return".to_string(),
        Stmt::Return(values) => format!(
            "return {}",
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Stmt::Expr(expr) => expr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::types::{Expr, TypeExpr};

    fn sample_func() -> FuncDecl {
        FuncDecl {
            doc: vec!["// Foo does things.".to_string()],
            receiver: None,
            name: "Foo".to_string(),
            type_params: Vec::new(),
            params: vec![
                Field::named("ctx", TypeExpr::qualified("context", "Context")),
                Field::new(
                    vec!["a".to_string(), "b".to_string()],
                    TypeExpr::name("int"),
                ),
            ],
            results: vec![Field::anonymous(TypeExpr::name("error"))],
            body: Some(vec![Stmt::Return(vec![Expr::ident("p")
                .select("Foo")
                .call(vec![Expr::ident("ctx"), Expr::ident("a"), Expr::ident("b")])])]),
        }
    }

    #[test]
    fn test_print_function() {
        let mut out = String::new();
        print_decl(&mut out, &Decl::Func(sample_func()));
        assert_eq!(
            out,
            "// Foo does things.\n\
             func Foo(ctx context.Context, a, b int) error {\n\
             \treturn p.Foo(ctx, a, b)\n\
             }\n"
        );
    }

    #[test]
    fn test_print_results_forms() {
        let mut func = sample_func();
        func.results = vec![Field::named("err", TypeExpr::name("error"))];
        assert!(signature(&func).ends_with(") (err error)"));

        func.results = vec![
            Field::anonymous(TypeExpr::name("int")),
            Field::anonymous(TypeExpr::name("error")),
        ];
        assert!(signature(&func).ends_with(") (int, error)"));

        func.results.clear();
        assert!(signature(&func).ends_with("b int)"));
    }

    #[test]
    fn test_print_method_signature() {
        let mut func = sample_func();
        func.receiver = Some(Field::named("r", TypeExpr::pointer(TypeExpr::name("Bar"))));
        func.type_params.clear();
        assert!(signature(&func).starts_with("func (r *Bar) Foo("));
    }

    #[test]
    fn test_print_file() {
        let mut file = File::new("wrapper");
        file.imports = vec![
            ImportSpec::new("context"),
            ImportSpec::aliased("aliasedIO", "io"),
        ];
        file.decls.push(Decl::Type(TypeSpec {
            name: "Bar".to_string(),
            type_params: Vec::new(),
            alias: false,
            ty: TypeExpr::Struct(vec![Field::anonymous(TypeExpr::pointer(
                TypeExpr::qualified("p", "Bar"),
            ))]),
        }));

        assert_eq!(
            print_file(&file),
            "package wrapper\n\
             \n\
             import (\n\
             \t\"context\"\n\
             \taliasedIO \"io\"\n\
             )\n\
             \n\
             type Bar struct {\n\
             \t*p.Bar\n\
             }\n"
        );
    }

    #[test]
    fn test_print_single_import() {
        let mut file = File::new("x");
        file.imports.push(ImportSpec::new("fmt"));
        assert_eq!(print_file(&file), "package x\n\nimport \"fmt\"\n");
    }

    #[test]
    fn test_print_is_deterministic() {
        let mut file = File::new("x");
        file.decls.push(Decl::Func(sample_func()));
        assert_eq!(print_file(&file), print_file(&file.clone()));
    }
}
