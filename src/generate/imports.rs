// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Import resolution for generated files.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::loader::{default_package_name, Package};
use crate::syntax::{File, FuncDecl, ImportSpec};

use super::synth::fresh;

/// Map each identifier a source file uses for an import to its spec.
///
/// Explicit aliases win; otherwise the imported package's own name from the
/// import graph is used. Blank and dot imports bind no identifier.
pub fn local_names(file: &File, package: &Package) -> HashMap<String, ImportSpec> {
    let mut names = HashMap::new();
    for spec in &file.imports {
        let name = match spec.alias.as_deref() {
            Some("_") | Some(".") => continue,
            Some(alias) => alias.to_string(),
            None => package
                .import_name(&spec.path)
                .map(str::to_string)
                .unwrap_or_else(|| default_package_name(&spec.path)),
        };
        names.insert(name, spec.clone());
    }
    names
}

/// The imports a generated file needs, keyed and ordered by path.
///
/// Every path is imported once and every identifier names one path.
#[derive(Debug, Clone, Default)]
pub struct ImportSet {
    /// Path to its spec and the identifier it binds.
    specs: BTreeMap<String, (ImportSpec, String)>,
    bound: HashSet<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an import every generated file carries under identifier `name`,
    /// replacing any spec with the same path.
    pub fn insert(&mut self, spec: ImportSpec, name: impl Into<String>) {
        let name = name.into();
        if let Some((_, old)) = self.specs.remove(&spec.path) {
            self.bound.remove(&old);
        }
        self.bound.insert(name.clone());
        self.specs.insert(spec.path.clone(), (spec, name));
    }

    /// Add the imports referenced by a wrapper's signature types.
    ///
    /// `names` maps qualifiers to specs for the file the declaration came
    /// from. A qualifier whose path is already imported under another
    /// identifier, or whose identifier already names another path, is
    /// rewritten in the signature.
    pub fn require(&mut self, func: &mut FuncDecl, names: &HashMap<String, ImportSpec>) {
        let qualifiers: BTreeSet<String> = func
            .signature_types()
            .flat_map(|ty| ty.qualifiers())
            .map(str::to_string)
            .collect();

        let mut renames = HashMap::new();
        for qualifier in qualifiers {
            let Some(spec) = names.get(&qualifier) else {
                warn!(
                    "No import found for qualifier '{}' in {}",
                    qualifier, func.name
                );
                continue;
            };
            let bound = self.bind(&qualifier, spec);
            if bound != qualifier {
                debug!("Qualifier {} of {} becomes {}", qualifier, func.name, bound);
                renames.insert(qualifier, bound);
            }
        }

        if !renames.is_empty() {
            for ty in func.signature_types_mut() {
                ty.requalify(&renames);
            }
        }
    }

    /// Identifier `spec.path` is imported under, importing it first if needed.
    fn bind(&mut self, name: &str, spec: &ImportSpec) -> String {
        if let Some((_, bound)) = self.specs.get(&spec.path) {
            return bound.clone();
        }
        let bound = fresh(name, &self.bound);
        let spec = if bound == name {
            spec.clone()
        } else {
            ImportSpec::aliased(&bound, &spec.path)
        };
        self.insert(spec, bound.clone());
        bound
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Specs sorted by path.
    pub fn into_sorted(self) -> Vec<ImportSpec> {
        self.specs.into_values().map(|(spec, _)| spec).collect()
    }
}
