// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Wrapper synthesis.
//!
//! Builds wrapper declarations from source declarations. Source declarations
//! are never modified; every wrapper is a fresh copy.

use std::collections::HashSet;

use crate::syntax::{Expr, Field, FuncDecl, Stmt, TypeExpr, TypeSpec};

use super::filter::{context_param_index, is_wrappable, receiver_type_name};
use super::types::{Declaration, TracingTarget, WrapperDecl};

/// Span start and end statements for a wrapper body.
///
/// `ctx` is the context variable rebound by the span start, `span` the
/// variable holding the span.
pub fn span_statements(ctx: &str, span: &str, tracing: &TracingTarget) -> [Stmt; 2] {
    [
        Stmt::Define {
            lhs: vec![ctx.to_string(), span.to_string()],
            rhs: Expr::ident(&tracing.package)
                .select("StartSpan")
                .call(vec![Expr::ident(ctx), Expr::Str(tracing.span_name.clone())]),
        },
        Stmt::Defer(Expr::ident(span).select("End").call(Vec::new())),
    ]
}

/// Builds wrappers for declarations of one package.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'a> {
    /// Identifier the wrapped package is imported under.
    package: &'a str,
    tracing: &'a TracingTarget,
}

impl<'a> Synthesizer<'a> {
    /// `package` and `tracing.package` must not be bound by the results or
    /// type parameters of any declaration passed in; see [`fixed_names`].
    pub fn new(package: &'a str, tracing: &'a TracingTarget) -> Self {
        Self { package, tracing }
    }

    /// Wrap a declaration, or `None` if it is not eligible.
    pub fn synthesize(&self, decl: Declaration<'_>) -> Option<WrapperDecl> {
        if !is_wrappable(&decl) {
            return None;
        }
        match decl {
            Declaration::Type(spec) => Some(self.wrap_type(spec)),
            Declaration::Function(func) => self.wrap_function(func).map(WrapperDecl::Function),
            Declaration::Method(func) => self.wrap_method(func).map(WrapperDecl::Method),
        }
    }

    /// `type X struct{ *p.X }` plus `func NewX(orig *p.X) *X`.
    ///
    /// Interfaces are embedded by value.
    fn wrap_type(&self, spec: &TypeSpec) -> WrapperDecl {
        let original = TypeExpr::qualified(self.package, &spec.name);
        let embedded = if spec.is_interface() {
            original
        } else {
            TypeExpr::pointer(original)
        };

        let wrapper = TypeSpec {
            name: spec.name.clone(),
            type_params: Vec::new(),
            alias: false,
            ty: TypeExpr::Struct(vec![Field::anonymous(embedded.clone())]),
        };

        let constructor = FuncDecl {
            doc: Vec::new(),
            receiver: None,
            name: format!("New{}", spec.name),
            type_params: Vec::new(),
            params: vec![Field::named("orig", embedded)],
            results: vec![Field::anonymous(TypeExpr::pointer(TypeExpr::name(
                &spec.name,
            )))],
            body: Some(vec![Stmt::Return(vec![Expr::AddressOf(Box::new(
                Expr::Composite {
                    ty: TypeExpr::name(&spec.name),
                    elts: vec![Expr::ident("orig")],
                },
            ))])]),
        };

        WrapperDecl::Type {
            wrapper,
            constructor,
        }
    }

    fn wrap_function(&self, func: &FuncDecl) -> Option<FuncDecl> {
        let mut scope = self.scope(func);
        let params = self.name_params(&func.params, &mut scope);
        let ctx = context_name(func, &params)?;
        let span = fresh("span", &scope);

        let call = Expr::Call {
            fun: Box::new(Expr::ident(self.package).select(&func.name)),
            type_args: func
                .type_params
                .iter()
                .flat_map(|field| field.names.iter().map(TypeExpr::name))
                .collect(),
            args: forwarded_args(&params),
            spread: is_variadic(&params),
        };

        Some(FuncDecl {
            doc: func.doc.clone(),
            receiver: None,
            name: func.name.clone(),
            type_params: func.type_params.clone(),
            body: Some(self.body(&ctx, &span, call, func.result_count())),
            params,
            results: func.results.clone(),
        })
    }

    fn wrap_method(&self, func: &FuncDecl) -> Option<FuncDecl> {
        let receiver = func.receiver.as_ref()?;
        let type_name = receiver_type_name(func)?;

        let mut scope = self.scope(func);
        let params = self.name_params(&func.params, &mut scope);
        let ctx = context_name(func, &params)?;
        let recv = fresh("r", &scope);
        scope.insert(recv.clone());
        let span = fresh("span", &scope);

        let call = Expr::Call {
            fun: Box::new(Expr::ident(&recv).select(type_name).select(&func.name)),
            type_args: Vec::new(),
            args: forwarded_args(&params),
            spread: is_variadic(&params),
        };

        Some(FuncDecl {
            doc: func.doc.clone(),
            receiver: Some(Field::named(recv, receiver.ty.clone())),
            name: func.name.clone(),
            type_params: Vec::new(),
            body: Some(self.body(&ctx, &span, call, func.result_count())),
            params,
            results: func.results.clone(),
        })
    }

    fn body(&self, ctx: &str, span: &str, call: Expr, results: usize) -> Vec<Stmt> {
        let mut body: Vec<Stmt> = span_statements(ctx, span, self.tracing).into();
        if results == 0 {
            body.push(Stmt::Expr(call));
        } else {
            body.push(Stmt::Return(vec![call]));
        }
        body
    }

    /// Package identifiers the body refers to.
    fn reserved(&self) -> HashSet<String> {
        HashSet::from([self.package.to_string(), self.tracing.package.clone()])
    }

    /// Names already bound in the wrapper before parameters are named.
    fn scope(&self, func: &FuncDecl) -> HashSet<String> {
        let mut scope = self.reserved();
        scope.extend(fixed_names(func).map(str::to_string));
        scope
    }

    /// Copy a parameter list, naming every parameter so it can be forwarded.
    ///
    /// Unnamed and blank parameters become `argN`; names shadowing the
    /// wrapped or tracing package get a `_` suffix. Every name ends up in
    /// `scope`.
    fn name_params(&self, params: &[Field], scope: &mut HashSet<String>) -> Vec<Field> {
        let reserved = self.reserved();
        for name in params.iter().flat_map(|f| f.names.iter()) {
            if name != "_" && !reserved.contains(name) {
                scope.insert(name.clone());
            }
        }

        let mut index = 0;
        let mut next = |scope: &mut HashSet<String>, current: Option<&String>| {
            let name = match current {
                Some(name) if name != "_" && !reserved.contains(name) => name.clone(),
                Some(name) if name != "_" => {
                    let name = fresh(name, scope);
                    scope.insert(name.clone());
                    name
                }
                _ => {
                    let name = fresh(&format!("arg{}", index), scope);
                    scope.insert(name.clone());
                    name
                }
            };
            index += 1;
            name
        };

        params
            .iter()
            .map(|field| {
                let names = if field.names.is_empty() {
                    vec![next(scope, None)]
                } else {
                    field.names.iter().map(|n| next(scope, Some(n))).collect()
                };
                Field::new(names, field.ty.clone())
            })
            .collect()
    }
}

/// Names a wrapper copies unchanged: named results and type parameters.
pub fn fixed_names(func: &FuncDecl) -> impl Iterator<Item = &str> {
    func.type_params
        .iter()
        .chain(func.results.iter())
        .flat_map(|field| field.names.iter().map(String::as_str))
        .filter(|name| *name != "_")
}

/// Name of the first `context.Context` parameter in the renamed list.
fn context_name(original: &FuncDecl, params: &[Field]) -> Option<String> {
    let index = context_param_index(original)?;
    params.get(index)?.names.first().cloned()
}

fn forwarded_args(params: &[Field]) -> Vec<Expr> {
    params
        .iter()
        .flat_map(|field| field.names.iter().map(Expr::ident))
        .collect()
}

fn is_variadic(params: &[Field]) -> bool {
    matches!(params.last(), Some(Field { ty: TypeExpr::Variadic(_), .. }))
}

/// `base`, suffixed with `_` until it is not taken.
pub(crate) fn fresh(base: &str, taken: &HashSet<String>) -> String {
    let mut name = base.to_string();
    while taken.contains(&name) {
        name.push('_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{print_decl, Decl};

    fn ctx() -> Field {
        Field::named("ctx", TypeExpr::qualified("context", "Context"))
    }

    fn render(decl: FuncDecl) -> String {
        let mut out = String::new();
        print_decl(&mut out, &Decl::Func(decl));
        out
    }

    fn wrap(func: &FuncDecl) -> FuncDecl {
        let tracing = TracingTarget::default();
        let synth = Synthesizer::new("p", &tracing);
        let decl = if func.is_method() {
            Declaration::Method(func)
        } else {
            Declaration::Function(func)
        };
        match synth.synthesize(decl) {
            Some(WrapperDecl::Function(f)) | Some(WrapperDecl::Method(f)) => f,
            other => panic!("unexpected wrapper: {:?}", other),
        }
    }

    #[test]
    fn test_span_statements() {
        let [start, end] = span_statements("ctx", "span", &TracingTarget::default());
        let mut func = FuncDecl {
            name: "F".to_string(),
            body: Some(vec![start, end]),
            ..Default::default()
        };
        func.params.push(ctx());
        assert_eq!(
            render(func),
            "func F(ctx context.Context) {\n\
             \tctx, span := trace.StartSpan(ctx, \"auto generated span\")\n\
             \tdefer span.End()\n\
             }\n"
        );
    }

    #[test]
    fn test_wrap_function_returns_call() {
        let foo = FuncDecl {
            doc: vec!["// Foo does work.".to_string()],
            name: "Foo".to_string(),
            params: vec![ctx()],
            results: vec![Field::anonymous(TypeExpr::name("error"))],
            ..Default::default()
        };
        let wrapped = wrap(&foo);
        assert_eq!(wrapped.params, foo.params);
        assert_eq!(wrapped.results, foo.results);
        assert_eq!(
            render(wrapped),
            "// Foo does work.\n\
             func Foo(ctx context.Context) error {\n\
             \tctx, span := trace.StartSpan(ctx, \"auto generated span\")\n\
             \tdefer span.End()\n\
             \treturn p.Foo(ctx)\n\
             }\n"
        );
    }

    #[test]
    fn test_wrap_function_without_results() {
        let run = FuncDecl {
            name: "Run".to_string(),
            params: vec![ctx(), Field::named("n", TypeExpr::name("int"))],
            ..Default::default()
        };
        let body = wrap(&run).body.unwrap();
        assert_eq!(body.len(), 3);
        assert_eq!(
            body[2],
            Stmt::Expr(
                Expr::ident("p")
                    .select("Run")
                    .call(vec![Expr::ident("ctx"), Expr::ident("n")])
            )
        );
    }

    #[test]
    fn test_multi_value_results_forwarded() {
        let get = FuncDecl {
            name: "Get".to_string(),
            params: vec![ctx()],
            results: vec![
                Field::named("n", TypeExpr::name("int")),
                Field::named("err", TypeExpr::name("error")),
            ],
            ..Default::default()
        };
        let wrapped = wrap(&get);
        assert_eq!(wrapped.results, get.results);
        assert!(matches!(&wrapped.body.unwrap()[2], Stmt::Return(values) if values.len() == 1));
    }

    #[test]
    fn test_unnamed_and_blank_params() {
        let anon = FuncDecl {
            name: "Anon".to_string(),
            params: vec![
                Field::anonymous(TypeExpr::qualified("context", "Context")),
                Field::anonymous(TypeExpr::name("int")),
            ],
            ..Default::default()
        };
        let wrapped = wrap(&anon);
        assert_eq!(wrapped.params[0].names, vec!["arg0"]);
        assert_eq!(wrapped.params[1].names, vec!["arg1"]);
        assert!(render(wrapped).contains("arg0, span := trace.StartSpan(arg0,"));

        let blank = FuncDecl {
            name: "Blank".to_string(),
            params: vec![
                ctx(),
                Field::new(vec!["_".to_string(), "arg1".to_string()], TypeExpr::name("int")),
            ],
            ..Default::default()
        };
        let wrapped = wrap(&blank);
        assert_eq!(wrapped.params[1].names, vec!["arg1_", "arg1"]);
    }

    #[test]
    fn test_variadic_and_generic_forwarding() {
        let join = FuncDecl {
            name: "Join".to_string(),
            type_params: vec![Field::named("T", TypeExpr::name("any"))],
            params: vec![
                ctx(),
                Field::named("parts", TypeExpr::Variadic(Box::new(TypeExpr::name("T")))),
            ],
            results: vec![Field::anonymous(TypeExpr::name("T"))],
            ..Default::default()
        };
        let text = render(wrap(&join));
        assert!(text.starts_with("func Join[T any](ctx context.Context, parts ...T) T {"));
        assert!(text.contains("\treturn p.Join[T](ctx, parts...)\n"));
    }

    #[test]
    fn test_span_name_collision() {
        let f = FuncDecl {
            name: "F".to_string(),
            params: vec![ctx(), Field::named("span", TypeExpr::name("int"))],
            ..Default::default()
        };
        assert!(render(wrap(&f)).contains("ctx, span_ := trace.StartSpan"));
    }

    #[test]
    fn test_named_results_stay_bound() {
        let load = FuncDecl {
            name: "Load".to_string(),
            params: vec![ctx()],
            results: vec![
                Field::named("bar", TypeExpr::pointer(TypeExpr::name("Bar"))),
                Field::named("span", TypeExpr::name("int")),
                Field::named("err", TypeExpr::name("error")),
            ],
            ..Default::default()
        };
        let wrapped = wrap(&load);
        assert_eq!(wrapped.results, load.results);
        let text = render(wrapped);
        assert!(text.contains("\tctx, span_ := trace.StartSpan(ctx,"));
        assert!(text.contains("\tdefer span_.End()\n"));
    }

    #[test]
    fn test_type_param_names_reserved() {
        let f = FuncDecl {
            name: "F".to_string(),
            type_params: vec![Field::named("span", TypeExpr::name("any"))],
            params: vec![ctx(), Field::named("v", TypeExpr::name("span"))],
            ..Default::default()
        };
        assert!(render(wrap(&f)).contains("ctx, span_ := trace.StartSpan"));
    }

    #[test]
    fn test_fixed_names() {
        let f = FuncDecl {
            type_params: vec![Field::named("T", TypeExpr::name("any"))],
            params: vec![ctx()],
            results: vec![
                Field::new(vec!["p".to_string(), "_".to_string()], TypeExpr::name("int")),
                Field::anonymous(TypeExpr::name("error")),
            ],
            ..Default::default()
        };
        assert_eq!(fixed_names(&f).collect::<Vec<_>>(), vec!["T", "p"]);
    }

    #[test]
    fn test_package_shadowing_param_renamed() {
        let f = FuncDecl {
            name: "F".to_string(),
            params: vec![ctx(), Field::named("p", TypeExpr::name("int"))],
            ..Default::default()
        };
        let wrapped = wrap(&f);
        assert_eq!(wrapped.params[1].names, vec!["p_"]);
        assert!(render(wrapped).contains("\tp.F(ctx, p_)\n"));
    }

    #[test]
    fn test_wrap_method() {
        let method = FuncDecl {
            receiver: Some(Field::named("b", TypeExpr::name("Bar"))),
            name: "Method".to_string(),
            params: vec![ctx()],
            results: vec![Field::anonymous(TypeExpr::name("error"))],
            ..Default::default()
        };
        let wrapped = wrap(&method);
        assert_eq!(
            render(wrapped),
            "func (r Bar) Method(ctx context.Context) error {\n\
             \tctx, span := trace.StartSpan(ctx, \"auto generated span\")\n\
             \tdefer span.End()\n\
             \treturn r.Bar.Method(ctx)\n\
             }\n"
        );
        // Source declaration is untouched.
        assert_eq!(method.receiver.unwrap().names, vec!["b"]);
    }

    #[test]
    fn test_method_receiver_normalization() {
        let anonymous = FuncDecl {
            receiver: Some(Field::anonymous(TypeExpr::pointer(TypeExpr::name("Bar")))),
            name: "Close".to_string(),
            params: vec![ctx(), Field::named("r", TypeExpr::name("int"))],
            ..Default::default()
        };
        let wrapped = wrap(&anonymous);
        let recv = wrapped.receiver.clone().unwrap();
        assert_eq!(recv.names, vec!["r_"]);
        assert_eq!(recv.ty, TypeExpr::pointer(TypeExpr::name("Bar")));
        assert!(render(wrapped).contains("\tr_.Bar.Close(ctx, r)\n"));
    }

    #[test]
    fn test_receiver_avoids_named_results() {
        let read = FuncDecl {
            receiver: Some(Field::named("b", TypeExpr::pointer(TypeExpr::name("Bar")))),
            name: "Read".to_string(),
            params: vec![ctx()],
            results: vec![
                Field::named("r", TypeExpr::name("int")),
                Field::named("err", TypeExpr::name("error")),
            ],
            ..Default::default()
        };
        let text = render(wrap(&read));
        assert!(text.starts_with(
            "func (r_ *Bar) Read(ctx context.Context) (r int, err error) {"
        ));
        assert!(text.contains("\treturn r_.Bar.Read(ctx)\n"));
    }

    #[test]
    fn test_wrap_type() {
        let tracing = TracingTarget::default();
        let synth = Synthesizer::new("p", &tracing);
        let spec = TypeSpec {
            name: "Bar".to_string(),
            type_params: Vec::new(),
            alias: false,
            ty: TypeExpr::Struct(Vec::new()),
        };
        let Some(WrapperDecl::Type {
            wrapper,
            constructor,
        }) = synth.synthesize(Declaration::Type(&spec))
        else {
            panic!("expected type wrapper");
        };

        assert_eq!(
            wrapper.ty,
            TypeExpr::Struct(vec![Field::anonymous(TypeExpr::pointer(
                TypeExpr::qualified("p", "Bar")
            ))])
        );
        assert_eq!(
            render(constructor),
            "func NewBar(orig *p.Bar) *Bar {\n\
             \treturn &Bar{orig}\n\
             }\n"
        );
    }

    #[test]
    fn test_wrap_interface_by_value() {
        let tracing = TracingTarget::default();
        let synth = Synthesizer::new("p", &tracing);
        let spec = TypeSpec {
            name: "Greeter".to_string(),
            type_params: Vec::new(),
            alias: false,
            ty: TypeExpr::Literal {
                shape: crate::syntax::LiteralShape::Interface,
                text: "interface {\n\tGreet() string\n}".to_string(),
                qualifiers: Vec::new(),
            },
        };
        let Some(WrapperDecl::Type { constructor, .. }) =
            synth.synthesize(Declaration::Type(&spec))
        else {
            panic!("expected type wrapper");
        };
        assert!(render(constructor).starts_with("func NewGreeter(orig p.Greeter) *Greeter {"));
    }

    #[test]
    fn test_ineligible_returns_none() {
        let tracing = TracingTarget::default();
        let synth = Synthesizer::new("p", &tracing);
        let bar = FuncDecl {
            name: "bar".to_string(),
            params: vec![ctx()],
            ..Default::default()
        };
        assert!(synth.synthesize(Declaration::Function(&bar)).is_none());
    }
}
