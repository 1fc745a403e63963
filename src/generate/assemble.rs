// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Assembly of generated files from work units.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::debug;

use crate::loader::{default_package_name, Package};
use crate::syntax::{File, ImportSpec};
#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::imports::{local_names, ImportSet};
use super::plan::Placement;
use super::synth::{fixed_names, fresh, Synthesizer};
use super::types::{Declaration, GeneratedFile, TracingTarget, WorkUnit, WrapperDecl};

/// Build the wrapper file for a unit of work.
///
/// Returns `None` when the unit yields no wrapped function or method, even if
/// it declares exported types.
pub fn assemble(unit: &WorkUnit, tracing: &TracingTarget) -> Option<GeneratedFile> {
    let start = Instant::now();
    let package = &unit.package;

    let mut names = HashMap::new();
    let mut entries = Vec::new();
    for placement in unit.plan.unit(unit.index) {
        let Some(source) = package.files.get(placement.file) else {
            continue;
        };
        let Some(decl) = source.syntax.decls.get(placement.decl) else {
            continue;
        };
        names
            .entry(placement.file)
            .or_insert_with(|| local_names(&source.syntax, package));
        entries.push((placement, Declaration::from_decl(decl)));
    }

    let callables = entries
        .iter()
        .filter(|(_, decl)| !matches!(decl, Declaration::Type(_)))
        .count();
    if callables == 0 {
        debug!("No wrapped functions in {} ({}), skipping", unit.name, package.id);
        record_assemble(start);
        return None;
    }

    let (qualifier, tracing) = shadow_free(package, tracing, &entries, &names);
    let synth = Synthesizer::new(&qualifier, &tracing);

    let mut imports = ImportSet::new();
    imports.insert(package_import(package, &qualifier), &qualifier);
    imports.insert(tracing_import(&tracing), &tracing.package);

    let mut decls = Vec::new();
    for (placement, decl) in entries {
        let Some(mut wrapper) = synth.synthesize(decl) else {
            continue;
        };
        match &mut wrapper {
            WrapperDecl::Function(func) | WrapperDecl::Method(func) => {
                if let Some(names) = names.get(&placement.file) {
                    imports.require(func, names);
                }
            }
            WrapperDecl::Type { constructor, .. } => {
                if let Some(name) = &placement.constructor {
                    constructor.name = name.clone();
                }
            }
        }

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_wrap(decl.kind());

        decls.extend(wrapper.into_decls());
    }

    record_assemble(start);

    Some(GeneratedFile {
        name: unit.name.clone(),
        source: package.id.clone(),
        file: File {
            package: package.name.clone(),
            imports: imports.into_sorted(),
            decls,
        },
        callables,
    })
}

fn record_assemble(start: Instant) {
    #[cfg(feature = "telemetry")]
    GLOBAL_METRICS.record_operation("generate.assemble", start.elapsed());
    #[cfg(not(feature = "telemetry"))]
    let _ = start;
}

/// Identifiers for the wrapped and tracing packages that no named result,
/// type parameter or other source import of the unit shadows.
fn shadow_free(
    package: &Package,
    tracing: &TracingTarget,
    entries: &[(&Placement, Declaration<'_>)],
    names: &HashMap<usize, HashMap<String, ImportSpec>>,
) -> (String, TracingTarget) {
    let mut taken: HashSet<String> = entries
        .iter()
        .filter_map(|(_, decl)| match decl {
            Declaration::Function(func) | Declaration::Method(func) => Some(*func),
            Declaration::Type(_) => None,
        })
        .flat_map(fixed_names)
        .map(str::to_string)
        .collect();
    for (name, spec) in names.values().flatten() {
        if spec.path != package.id && spec.path != tracing.import_path {
            taken.insert(name.clone());
        }
    }

    let qualifier = fresh(&package.name, &taken);
    taken.insert(qualifier.clone());
    let tracing = TracingTarget {
        package: fresh(&tracing.package, &taken),
        ..tracing.clone()
    };
    (qualifier, tracing)
}

/// Import spec for the wrapped package, aliased when `qualifier` is not its
/// package name.
fn package_import(package: &Package, qualifier: &str) -> ImportSpec {
    if qualifier == package.name {
        ImportSpec::new(&package.id)
    } else {
        ImportSpec::aliased(qualifier, &package.id)
    }
}

/// Import spec for the tracing package, aliased when its identifier differs
/// from the default name of its path.
fn tracing_import(tracing: &TracingTarget) -> ImportSpec {
    if default_package_name(&tracing.import_path) == tracing.package {
        ImportSpec::new(&tracing.import_path)
    } else {
        ImportSpec::aliased(&tracing.package, &tracing.import_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Package, SourceFile};
    use crate::generate::types::Grouping;
    use crate::syntax::{Decl, Field, FuncDecl, TypeExpr, TypeSpec};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn ctx() -> Field {
        Field::named("ctx", TypeExpr::qualified("context", "Context"))
    }

    fn unit(decls: Vec<Decl>) -> WorkUnit {
        let mut syntax = File::new("p");
        syntax.imports.push(ImportSpec::new("context"));
        syntax.decls = decls;
        let package = Arc::new(Package {
            id: "example.com/p".to_string(),
            name: "p".to_string(),
            dir: PathBuf::from("p"),
            files: vec![SourceFile {
                path: PathBuf::from("p/p.go"),
                syntax,
            }],
            imports: HashMap::from([("context".to_string(), "context".to_string())]),
            errors: Vec::new(),
        });
        WorkUnit::for_package(package, Grouping::PerPackage).remove(0)
    }

    fn func(name: &str) -> Decl {
        Decl::Func(FuncDecl {
            name: name.to_string(),
            params: vec![ctx()],
            results: vec![Field::anonymous(TypeExpr::name("error"))],
            ..Default::default()
        })
    }

    fn struct_type(name: &str) -> Decl {
        Decl::Type(TypeSpec {
            name: name.to_string(),
            type_params: Vec::new(),
            alias: false,
            ty: TypeExpr::Struct(Vec::new()),
        })
    }

    #[test]
    fn test_assemble_orders_imports_and_decls() {
        let generated = assemble(
            &unit(vec![struct_type("Bar"), func("Foo"), func("bar")]),
            &TracingTarget::default(),
        )
        .unwrap();

        assert_eq!(generated.name, "p.go");
        assert_eq!(generated.callables, 1);
        let paths: Vec<&str> = generated
            .file
            .imports
            .iter()
            .map(|s| s.path.as_str())
            .collect();
        assert_eq!(paths, vec!["context", "example.com/p", "go.opencensus.io/trace"]);

        let names: Vec<&str> = generated.file.decls.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Bar", "NewBar", "Foo"]);
    }

    #[test]
    fn test_type_only_unit_suppressed() {
        assert!(assemble(&unit(vec![struct_type("Bar")]), &TracingTarget::default()).is_none());
        assert!(assemble(&unit(vec![func("bar")]), &TracingTarget::default()).is_none());
    }

    #[test]
    fn test_constructor_collision_keeps_type() {
        let method = Decl::Func(FuncDecl {
            receiver: Some(Field::named("b", TypeExpr::pointer(TypeExpr::name("Bar")))),
            name: "Do".to_string(),
            params: vec![ctx()],
            ..Default::default()
        });
        let generated = assemble(
            &unit(vec![func("NewBar"), struct_type("Bar"), method]),
            &TracingTarget::default(),
        )
        .unwrap();
        let names: Vec<&str> = generated.file.decls.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["NewBar", "Bar", "NewBar_", "Do"]);
        assert!(generated
            .render()
            .contains("func NewBar_(orig *p.Bar) *Bar {\n\treturn &Bar{orig}\n}\n"));
    }

    #[test]
    fn test_result_named_like_package() {
        let load = Decl::Func(FuncDecl {
            name: "Load".to_string(),
            params: vec![ctx()],
            results: vec![
                Field::named("p", TypeExpr::pointer(TypeExpr::name("Bar"))),
                Field::named("trace", TypeExpr::name("int")),
                Field::named("err", TypeExpr::name("error")),
            ],
            ..Default::default()
        });
        let generated = assemble(&unit(vec![load]), &TracingTarget::default()).unwrap();

        assert!(generated
            .file
            .imports
            .contains(&ImportSpec::aliased("p_", "example.com/p")));
        assert!(generated
            .file
            .imports
            .contains(&ImportSpec::aliased("trace_", "go.opencensus.io/trace")));
        let text = generated.render();
        assert!(text.contains(
            "func Load(ctx context.Context) (p *Bar, trace int, err error) {\n\
             \tctx, span := trace_.StartSpan(ctx, \"auto generated span\")\n\
             \tdefer span.End()\n\
             \treturn p_.Load(ctx)\n\
             }\n"
        ));
    }

    #[test]
    fn test_source_import_named_like_package() {
        let mut unit = unit(vec![func("Foo")]);
        let package = Arc::get_mut(&mut unit.package).unwrap();
        package.files[0]
            .syntax
            .imports
            .push(ImportSpec::aliased("p", "example.com/other/p"));

        let generated = assemble(&unit, &TracingTarget::default()).unwrap();
        assert!(generated
            .file
            .imports
            .contains(&ImportSpec::aliased("p_", "example.com/p")));
        assert!(generated.render().contains("\treturn p_.Foo(ctx)\n"));
    }

    #[test]
    fn test_custom_tracing_alias() {
        let tracing = TracingTarget {
            import_path: "go.opentelemetry.io/otel/trace".to_string(),
            package: "oteltrace".to_string(),
            span_name: "wrapped".to_string(),
        };
        let generated = assemble(&unit(vec![func("Foo")]), &tracing).unwrap();
        assert!(generated
            .file
            .imports
            .contains(&ImportSpec::aliased("oteltrace", "go.opentelemetry.io/otel/trace")));
        assert!(generated
            .render()
            .contains("ctx, span := oteltrace.StartSpan(ctx, \"wrapped\")"));
    }
}
