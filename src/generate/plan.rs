// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Package-wide placement of wrappers.
//!
//! Every output file of a package lands in the same Go package, so names and
//! type dependencies are settled across all of its source files before any
//! single file is assembled.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::loader::Package;

use super::filter::{is_wrappable, receiver_type_name};
use super::synth::fresh;
use super::types::{Declaration, Grouping};

/// A declaration assigned to an output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Index into `package.files`.
    pub file: usize,
    /// Index into that file's declarations.
    pub decl: usize,
    /// Constructor name, for type wrappers.
    pub constructor: Option<String>,
}

/// Declarations each output file of a package receives, in output order.
///
/// - Function, type and constructor names are unique across the package. A
///   constructor that would clash with another wrapper is renamed.
/// - Methods are only wrapped when their receiver type is.
/// - A type whose own file yields no callable wrapper moves to the file of its
///   first method, and is dropped if it has none.
#[derive(Debug, Clone, Default)]
pub struct PackagePlan {
    units: Vec<Vec<Placement>>,
}

#[derive(Clone, Copy)]
struct Candidate<'a> {
    file: usize,
    decl: usize,
    declaration: Declaration<'a>,
}

impl PackagePlan {
    pub fn new(package: &Package, grouping: Grouping) -> Self {
        let unit_count = match grouping {
            Grouping::PerPackage => 1,
            Grouping::PerFile => package.files.len(),
        };
        let unit_of = |file: usize| match grouping {
            Grouping::PerPackage => 0,
            Grouping::PerFile => file,
        };

        let mut candidates = Vec::new();
        for (file, source) in package.files.iter().enumerate() {
            for (decl, node) in source.syntax.decls.iter().enumerate() {
                let declaration = Declaration::from_decl(node);
                if is_wrappable(&declaration) {
                    candidates.push(Candidate {
                        file,
                        decl,
                        declaration,
                    });
                } else {
                    debug!(
                        "Skipping {} {} in {}",
                        declaration.kind(),
                        declaration.name(),
                        package.id
                    );
                }
            }
        }

        let types: HashMap<&str, Candidate<'_>> = candidates
            .iter()
            .filter_map(|c| match c.declaration {
                Declaration::Type(spec) => Some((spec.name.as_str(), *c)),
                _ => None,
            })
            .collect();

        candidates.retain(|c| match c.declaration {
            Declaration::Method(func) => {
                let wrapped =
                    receiver_type_name(func).is_some_and(|name| types.contains_key(name));
                if !wrapped {
                    debug!(
                        "Skipping method {} in {}: receiver type is not wrapped",
                        func.name, package.id
                    );
                }
                wrapped
            }
            _ => true,
        });

        let constructors = constructor_names(&candidates, &package.id);

        let mut callables = vec![0usize; unit_count];
        for c in &candidates {
            if !matches!(c.declaration, Declaration::Type(_)) {
                callables[unit_of(c.file)] += 1;
            }
        }

        // Where each type wrapper is emitted.
        let mut host: HashMap<&str, usize> = HashMap::new();
        for c in &candidates {
            if let Declaration::Type(spec) = c.declaration {
                if callables[unit_of(c.file)] > 0 {
                    host.insert(&spec.name, unit_of(c.file));
                }
            }
        }
        for c in &candidates {
            if let Declaration::Method(func) = c.declaration {
                if let Some(name) = receiver_type_name(func) {
                    host.entry(name).or_insert(unit_of(c.file));
                }
            }
        }

        let placement = |c: &Candidate<'_>| Placement {
            file: c.file,
            decl: c.decl,
            constructor: constructors.get(c.declaration.name()).cloned(),
        };

        let mut units = vec![Vec::new(); unit_count];
        let mut placed: HashSet<&str> = HashSet::new();
        for c in &candidates {
            let unit = unit_of(c.file);
            match c.declaration {
                Declaration::Type(spec) => match host.get(spec.name.as_str()) {
                    Some(&target) if target == unit => {
                        if placed.insert(&spec.name) {
                            units[unit].push(placement(c));
                        }
                    }
                    Some(_) => {}
                    None => debug!(
                        "Skipping type {} in {}: no wrapped function or method alongside",
                        spec.name, package.id
                    ),
                },
                Declaration::Method(func) => {
                    // The receiver's wrapper precedes its first method in a unit.
                    let receiver = receiver_type_name(func).and_then(|name| types.get(name));
                    if let Some(recv) = receiver {
                        let name = recv.declaration.name();
                        if host.get(name) == Some(&unit) && placed.insert(name) {
                            units[unit].push(placement(recv));
                        }
                    }
                    units[unit].push(placement(c));
                }
                Declaration::Function(_) => units[unit].push(placement(c)),
            }
        }

        Self { units }
    }

    /// Placements for the unit at `index`, as ordered by
    /// [`WorkUnit::for_package`](super::types::WorkUnit::for_package).
    pub fn unit(&self, index: usize) -> &[Placement] {
        self.units.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of units that receive at least one declaration.
    pub fn populated(&self) -> usize {
        self.units.iter().filter(|u| !u.is_empty()).count()
    }
}

/// `New<Type>` for every type wrapper, renamed when the name is taken by a
/// wrapped function, another type or an earlier constructor.
fn constructor_names<'a>(
    candidates: &[Candidate<'a>],
    package: &str,
) -> HashMap<&'a str, String> {
    let mut claimed: HashSet<String> = candidates
        .iter()
        .filter(|c| !matches!(c.declaration, Declaration::Method(_)))
        .map(|c| c.declaration.name().to_string())
        .collect();

    let mut names = HashMap::new();
    for c in candidates {
        if let Declaration::Type(spec) = c.declaration {
            let wanted = format!("New{}", spec.name);
            let name = fresh(&wanted, &claimed);
            if name != wanted {
                warn!(
                    "Constructor {} in {} clashes with another wrapper, using {}",
                    wanted, package, name
                );
            }
            claimed.insert(name.clone());
            names.insert(spec.name.as_str(), name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SourceFile;
    use crate::syntax::{Decl, Field, File, FuncDecl, TypeExpr, TypeSpec};
    use std::path::PathBuf;

    fn ctx() -> Field {
        Field::named("ctx", TypeExpr::qualified("context", "Context"))
    }

    fn func(name: &str) -> Decl {
        Decl::Func(FuncDecl {
            name: name.to_string(),
            params: vec![ctx()],
            ..Default::default()
        })
    }

    fn method(recv: &str, name: &str) -> Decl {
        Decl::Func(FuncDecl {
            receiver: Some(Field::named("x", TypeExpr::pointer(TypeExpr::name(recv)))),
            name: name.to_string(),
            params: vec![ctx()],
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

    fn package(files: Vec<Vec<Decl>>) -> Package {
        Package {
            id: "example.com/p".to_string(),
            name: "p".to_string(),
            dir: PathBuf::from("p"),
            files: files
                .into_iter()
                .enumerate()
                .map(|(i, decls)| {
                    let mut syntax = File::new("p");
                    syntax.decls = decls;
                    SourceFile {
                        path: PathBuf::from(format!("p/f{}.go", i)),
                        syntax,
                    }
                })
                .collect(),
            imports: HashMap::new(),
            errors: Vec::new(),
        }
    }

    fn positions(plan: &PackagePlan, unit: usize) -> Vec<(usize, usize)> {
        plan.unit(unit).iter().map(|p| (p.file, p.decl)).collect()
    }

    #[test]
    fn test_constructor_renamed_on_clash() {
        let pkg = package(vec![vec![func("NewBar"), struct_type("Bar"), method("Bar", "Do")]]);
        let plan = PackagePlan::new(&pkg, Grouping::PerPackage);

        assert_eq!(positions(&plan, 0), vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(plan.unit(0)[0].constructor, None);
        assert_eq!(plan.unit(0)[1].constructor.as_deref(), Some("NewBar_"));
    }

    #[test]
    fn test_constructor_clash_across_files() {
        let pkg = package(vec![
            vec![struct_type("Bar"), method("Bar", "Do")],
            vec![func("NewBar")],
        ]);
        let plan = PackagePlan::new(&pkg, Grouping::PerFile);
        assert_eq!(plan.unit(0)[0].constructor.as_deref(), Some("NewBar_"));
        assert_eq!(positions(&plan, 1), vec![(1, 0)]);
    }

    #[test]
    fn test_methods_need_wrapped_receiver() {
        let alias = Decl::Type(TypeSpec {
            name: "Alias".to_string(),
            type_params: Vec::new(),
            alias: true,
            ty: TypeExpr::name("Bar"),
        });
        let pkg = package(vec![vec![alias, method("Alias", "Do"), func("Foo")]]);
        let plan = PackagePlan::new(&pkg, Grouping::PerPackage);
        assert_eq!(positions(&plan, 0), vec![(0, 2)]);
    }

    #[test]
    fn test_type_moves_to_first_method() {
        let pkg = package(vec![
            vec![struct_type("Bar"), struct_type("Unused")],
            vec![func("Foo")],
            vec![method("Bar", "Do"), method("Bar", "Close")],
        ]);
        let plan = PackagePlan::new(&pkg, Grouping::PerFile);

        assert!(plan.unit(0).is_empty());
        assert_eq!(positions(&plan, 1), vec![(1, 0)]);
        assert_eq!(positions(&plan, 2), vec![(0, 0), (2, 0), (2, 1)]);
        assert_eq!(plan.unit(2)[0].constructor.as_deref(), Some("NewBar"));
        assert_eq!(plan.populated(), 2);
    }

    #[test]
    fn test_type_stays_home_when_file_emitted() {
        let pkg = package(vec![
            vec![struct_type("Bar"), func("Foo")],
            vec![method("Bar", "Do")],
        ]);
        let plan = PackagePlan::new(&pkg, Grouping::PerFile);
        assert_eq!(positions(&plan, 0), vec![(0, 0), (0, 1)]);
        assert_eq!(positions(&plan, 1), vec![(1, 0)]);
    }

    #[test]
    fn test_type_precedes_methods_in_one_unit() {
        let pkg = package(vec![vec![method("Bar", "Do")], vec![struct_type("Bar")]]);
        let plan = PackagePlan::new(&pkg, Grouping::PerPackage);
        assert_eq!(positions(&plan, 0), vec![(1, 0), (0, 0)]);
    }

    #[test]
    fn test_unknown_unit_is_empty() {
        let plan = PackagePlan::new(&package(Vec::new()), Grouping::PerFile);
        assert!(plan.unit(3).is_empty());
        assert_eq!(plan.populated(), 0);
    }
}
