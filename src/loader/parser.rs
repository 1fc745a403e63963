// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tree-sitter based Go parsing.
//!
//! Converts a tree-sitter-go syntax tree into the [`crate::syntax`] model.
//! Function bodies are not kept; signatures, imports and type declarations
//! are.

use std::path::Path;
use std::time::Instant;

use tree_sitter::{Node, Parser};

use crate::error::LoadError;
use crate::syntax::{Decl, Field, File, FuncDecl, ImportSpec, LiteralShape, TypeExpr, TypeSpec};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::types::PackageDiagnostic;

/// Result of parsing a single Go file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub syntax: File,
    /// Syntax errors reported by the parser.
    pub diagnostics: Vec<PackageDiagnostic>,
}

/// Go parser using tree-sitter.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a new Go parser.
    pub fn new() -> Result<Self, LoadError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| LoadError::Parser(format!("Failed to set Go language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse a Go source file.
    pub fn parse_file(&mut self, path: &Path, content: &str) -> Result<ParsedFile, LoadError> {
        let start = Instant::now();

        let tree = self.parser.parse(content, None).ok_or_else(|| {
            LoadError::Parser(format!("Failed to parse file: {}", path.display()))
        })?;
        let root = tree.root_node();
        let source = content.as_bytes();

        let syntax = self.extract_file(&root, source);
        let diagnostics = if root.has_error() {
            self.syntax_errors(&root, path, source)
        } else {
            Vec::new()
        };

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("loader.parse_file", start.elapsed());
        #[cfg(not(feature = "telemetry"))]
        let _ = start;

        Ok(ParsedFile {
            syntax,
            diagnostics,
        })
    }

    /// Build the file model from the root `source_file` node.
    fn extract_file(&self, root: &Node, source: &[u8]) -> File {
        let mut file = File::new(String::new());

        for i in 0..root.named_child_count() {
            let Some(node) = root.named_child(i) else {
                continue;
            };
            match node.kind() {
                "package_clause" => {
                    if let Some(name) = node.named_child(0) {
                        file.package = self.node_text(&name, source);
                    }
                }
                "import_declaration" => self.extract_imports(&node, source, &mut file.imports),
                "function_declaration" | "method_declaration" => {
                    if let Some(func) = self.extract_func(&node, source) {
                        file.decls.push(Decl::Func(func));
                    }
                }
                "type_declaration" => self.extract_types(&node, source, &mut file.decls),
                _ => {}
            }
        }

        file
    }

    /// Collect the specs of an `import` declaration (single or grouped).
    fn extract_imports(&self, node: &Node, source: &[u8], imports: &mut Vec<ImportSpec>) {
        self.walk_tree(node, &mut |spec| {
            if spec.kind() != "import_spec" {
                return;
            }
            let path = spec
                .child_by_field_name("path")
                .map(|n| unquote(&self.node_text(&n, source)))
                .unwrap_or_default();
            if path.is_empty() {
                return;
            }
            imports.push(ImportSpec {
                path,
                alias: self.get_child_by_field(spec, "name", source),
            });
        });
    }

    /// Extract a function or method signature.
    fn extract_func(&self, node: &Node, source: &[u8]) -> Option<FuncDecl> {
        let name = self.get_child_by_field(node, "name", source)?;

        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|list| self.field_list(&list, source).into_iter().next());
        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|list| self.field_list(&list, source))
            .unwrap_or_default();
        let params = node
            .child_by_field_name("parameters")
            .map(|list| self.field_list(&list, source))
            .unwrap_or_default();
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.field_list(&result, source),
            Some(result) => vec![Field::anonymous(self.parse_type(&result, source))],
            None => Vec::new(),
        };

        Some(FuncDecl {
            doc: self.doc_comments(node, source),
            receiver,
            name,
            type_params,
            params,
            results,
            body: None,
        })
    }

    /// Extract every spec of a `type` declaration.
    fn extract_types(&self, node: &Node, source: &[u8], decls: &mut Vec<Decl>) {
        for i in 0..node.named_child_count() {
            let Some(spec) = node.named_child(i) else {
                continue;
            };
            let alias = match spec.kind() {
                "type_spec" => false,
                "type_alias" => true,
                _ => continue,
            };
            let (Some(name), Some(ty)) = (
                self.get_child_by_field(&spec, "name", source),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            let type_params = spec
                .child_by_field_name("type_parameters")
                .map(|list| self.field_list(&list, source))
                .unwrap_or_default();

            decls.push(Decl::Type(TypeSpec {
                name,
                type_params,
                alias,
                ty: self.parse_type(&ty, source),
            }));
        }
    }

    /// Convert a parameter, receiver or type parameter list.
    fn field_list(&self, list: &Node, source: &[u8]) -> Vec<Field> {
        let mut fields = Vec::new();

        for i in 0..list.named_child_count() {
            let Some(decl) = list.named_child(i) else {
                continue;
            };
            let variadic = match decl.kind() {
                "parameter_declaration" | "type_parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let Some(ty_node) = decl.child_by_field_name("type") else {
                continue;
            };

            let mut cursor = decl.walk();
            let names = decl
                .children_by_field_name("name", &mut cursor)
                .map(|n| self.node_text(&n, source))
                .collect();

            let ty = self.parse_type(&ty_node, source);
            let ty = if variadic {
                TypeExpr::Variadic(Box::new(ty))
            } else {
                ty
            };
            fields.push(Field::new(names, ty));
        }

        fields
    }

    /// Convert a type node.
    fn parse_type(&self, node: &Node, source: &[u8]) -> TypeExpr {
        match node.kind() {
            "type_identifier" | "identifier" | "field_identifier" => {
                TypeExpr::Name(self.node_text(node, source))
            }
            "qualified_type" => {
                let package = self.get_child_by_field(node, "package", source);
                let name = self.get_child_by_field(node, "name", source);
                match (package, name) {
                    (Some(package), Some(name)) => TypeExpr::Qualified { package, name },
                    _ => self.literal(node, source, LiteralShape::Other),
                }
            }
            "pointer_type" => match node.named_child(0) {
                Some(inner) => TypeExpr::pointer(self.parse_type(&inner, source)),
                None => self.literal(node, source, LiteralShape::Other),
            },
            "generic_type" => {
                let base = node.child_by_field_name("type");
                let args = node.child_by_field_name("type_arguments");
                match (base, args) {
                    (Some(base), Some(args)) => {
                        let mut parsed = Vec::new();
                        for i in 0..args.named_child_count() {
                            if let Some(arg) = args.named_child(i) {
                                parsed.push(self.parse_type(&arg, source));
                            }
                        }
                        TypeExpr::Generic {
                            base: Box::new(self.parse_type(&base, source)),
                            args: parsed,
                        }
                    }
                    _ => self.literal(node, source, LiteralShape::Other),
                }
            }
            // Wrapper nodes around a single type.
            "type_elem" | "type_constraint" | "parenthesized_type"
                if node.named_child_count() == 1 =>
            {
                match node.named_child(0) {
                    Some(inner) => self.parse_type(&inner, source),
                    None => self.literal(node, source, LiteralShape::Other),
                }
            }
            "struct_type" => self.literal(node, source, LiteralShape::Struct),
            "interface_type" => self.literal(node, source, LiteralShape::Interface),
            _ => self.literal(node, source, LiteralShape::Other),
        }
    }

    /// Keep a type as source text, remembering the packages it refers to.
    fn literal(&self, node: &Node, source: &[u8], shape: LiteralShape) -> TypeExpr {
        let mut qualifiers = Vec::new();
        self.walk_tree(node, &mut |n| {
            if n.kind() == "qualified_type" {
                if let Some(package) = self.get_child_by_field(n, "package", source) {
                    if !qualifiers.contains(&package) {
                        qualifiers.push(package);
                    }
                }
            }
        });

        TypeExpr::Literal {
            shape,
            text: self.node_text(node, source),
            qualifiers,
        }
    }

    /// Report ERROR and MISSING nodes.
    fn syntax_errors(&self, root: &Node, path: &Path, source: &[u8]) -> Vec<PackageDiagnostic> {
        let mut diagnostics = Vec::new();
        self.collect_errors(root, path, source, &mut diagnostics);
        diagnostics
    }

    fn collect_errors(
        &self,
        node: &Node,
        path: &Path,
        source: &[u8],
        diagnostics: &mut Vec<PackageDiagnostic>,
    ) {
        let position = node.start_position();
        let (line, column) = (position.row as u32 + 1, position.column as u32 + 1);

        if node.is_error() {
            let text = self.node_text(node, source);
            let snippet = text.lines().next().unwrap_or("").trim();
            let snippet: String = snippet.chars().take(40).collect();
            diagnostics.push(PackageDiagnostic::at(
                path,
                line,
                column,
                format!("syntax error near `{}`", snippet),
            ));
            return;
        }
        if node.is_missing() {
            diagnostics.push(PackageDiagnostic::at(
                path,
                line,
                column,
                format!("syntax error: missing {}", node.kind()),
            ));
            return;
        }
        if !node.has_error() {
            return;
        }

        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.collect_errors(&child, path, source, diagnostics);
            }
        }
    }

    // Helper methods

    /// Walk the tree depth-first, calling the callback for each node.
    fn walk_tree<'t, F>(&self, node: &Node<'t>, callback: &mut F)
    where
        F: FnMut(&Node<'t>),
    {
        callback(node);
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.walk_tree(&child, callback);
            }
        }
    }

    /// Get text content of a node.
    fn node_text(&self, node: &Node, source: &[u8]) -> String {
        node.utf8_text(source).unwrap_or("").to_string()
    }

    /// Get a child node by field name and return its text.
    fn get_child_by_field(&self, node: &Node, field: &str, source: &[u8]) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.node_text(&n, source))
    }

    /// Comment lines directly above a declaration, in source order.
    fn doc_comments(&self, node: &Node, source: &[u8]) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut next_row = node.start_position().row;
        let mut current = node.prev_named_sibling();

        while let Some(prev) = current {
            if prev.kind() != "comment" || prev.end_position().row + 1 < next_row {
                break;
            }
            // A comment trailing the previous declaration on the same line.
            if let Some(before) = prev.prev_named_sibling() {
                if before.end_position().row == prev.start_position().row {
                    break;
                }
            }
            blocks.push(self.node_text(&prev, source));
            next_row = prev.start_position().row;
            current = prev.prev_named_sibling();
        }

        blocks
            .iter()
            .rev()
            .flat_map(|block| block.lines().map(|l| l.trim_end().to_string()))
            .collect()
    }
}

/// Strip the quotes from an interpreted or raw string literal.
fn unquote(literal: &str) -> String {
    literal.trim_matches(|c| c == '"' || c == '`').to_string()
}
