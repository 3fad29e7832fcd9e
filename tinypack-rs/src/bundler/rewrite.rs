//! Dependency rewriting.
//!
//! Parses a module with SWC, finds every `require("<literal>")` call, resolves
//! the literal to a file and replaces it with that file's canonical module id,
//! then prints the module back to text.

use deno_ast::swc::ast::{CallExpr, Callee, EsVersion, Expr, Lit, Module, Str};
use deno_ast::swc::codegen::text_writer::JsWriter;
use deno_ast::swc::codegen::{Config as CodegenConfig, Emitter};
use deno_ast::swc::common::comments::SingleThreadedComments;
use deno_ast::swc::common::sync::Lrc;
use deno_ast::swc::common::{FileName, SourceMap};
use deno_ast::swc::ecma_visit::{VisitMut, VisitMutWith};
use deno_ast::swc::parser::lexer::Lexer;
use deno_ast::swc::parser::{EsSyntax, Parser, StringInput, Syntax};
use log::debug;
use std::path::{Path, PathBuf};

use super::resolve::Resolver;
use crate::error::{BundleError, Result};
use crate::path::module_id;

/// Callee name of a dependency declaration.
pub const REQUIRE_IDENT: &str = "require";

/// Result of rewriting one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// Printed source with every dependency literal replaced by a module id.
    pub code: String,
    /// Resolved files whose ids were not yet known to the build, in source order.
    pub dependencies: Vec<PathBuf>,
    /// Every module id the source references, in source order.
    pub requires: Vec<String>,
}

pub struct DependencyRewriter {
    root: PathBuf,
    resolver: Resolver,
    source_map: Lrc<SourceMap>,
}

impl DependencyRewriter {
    /// Module ids are computed relative to `root`.
    pub fn new(root: impl Into<PathBuf>, resolver: Resolver) -> Self {
        Self {
            root: root.into(),
            resolver,
            source_map: Lrc::new(SourceMap::default()),
        }
    }

    /// Rewrites the dependency declarations in `source`, which was read from
    /// `path`. A resolved file is reported in `dependencies` only if
    /// `is_known` returns false for its id.
    pub fn rewrite(
        &self,
        source: &str,
        path: &Path,
        is_known: impl Fn(&str) -> bool,
    ) -> Result<Rewritten> {
        let source_file = self
            .source_map
            .new_source_file(FileName::Real(path.to_path_buf()).into(), source.to_string());

        let comments = SingleThreadedComments::default();
        let input = StringInput::from(&*source_file);
        let lexer = Lexer::new(
            Syntax::Es(EsSyntax::default()),
            EsVersion::Es2020,
            input,
            Some(&comments),
        );
        let mut parser = Parser::new_from(lexer);
        let mut module = parser
            .parse_module()
            .map_err(|e| BundleError::parse(path, format!("{:?}", e)))?;
        if let Some(e) = parser.take_errors().into_iter().next() {
            return Err(BundleError::parse(path, format!("{:?}", e)));
        }

        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let mut visitor = RequireVisitor {
            root: &self.root,
            resolver: &self.resolver,
            directory,
            is_known,
            dependencies: Vec::new(),
            requires: Vec::new(),
            error: None,
        };
        module.visit_mut_with(&mut visitor);
        if let Some(err) = visitor.error {
            return Err(err);
        }

        let code = self.print(&module, &comments, path)?;
        debug!(
            "rewrote {} ({} requires, {} new)",
            path.display(),
            visitor.requires.len(),
            visitor.dependencies.len()
        );
        Ok(Rewritten {
            code,
            dependencies: visitor.dependencies,
            requires: visitor.requires,
        })
    }

    fn print(&self, module: &Module, comments: &SingleThreadedComments, path: &Path) -> Result<String> {
        let mut buf = Vec::new();
        {
            let cfg = CodegenConfig::default()
                .with_minify(false)
                .with_target(EsVersion::Es2020)
                .with_omit_last_semi(false);

            let mut emitter = Emitter {
                cfg,
                cm: self.source_map.clone(),
                comments: Some(comments),
                wr: Box::new(JsWriter::new(self.source_map.clone(), "\n", &mut buf, None)),
            };

            emitter
                .emit_module(module)
                .map_err(|e| BundleError::print(path, e.to_string()))?;
        }
        String::from_utf8(buf).map_err(|e| BundleError::print(path, e.to_string()))
    }
}

struct RequireVisitor<'a, F> {
    root: &'a Path,
    resolver: &'a Resolver,
    directory: &'a Path,
    is_known: F,
    dependencies: Vec<PathBuf>,
    requires: Vec<String>,
    error: Option<BundleError>,
}

impl<F> VisitMut for RequireVisitor<'_, F>
where
    F: Fn(&str) -> bool,
{
    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        if self.error.is_some() {
            return;
        }
        // Non-literal arguments (dynamic requires) are left alone
        if let Some(literal) = dependency_literal(call) {
            let specifier = literal.value.to_string_lossy().into_owned();
            match self.resolver.resolve(&specifier, self.directory) {
                Ok(resolved) => {
                    let id = module_id(self.root, &resolved);
                    *literal = Str {
                        span: literal.span,
                        value: id.clone().into(),
                        raw: None,
                    };
                    if !self.requires.contains(&id) {
                        if !(self.is_known)(&id) {
                            self.dependencies.push(resolved);
                        }
                        self.requires.push(id);
                    }
                }
                Err(err) => {
                    self.error = Some(err);
                    return;
                }
            }
        }
        call.visit_mut_children_with(self);
    }
}

/// The string argument of `require("<literal>")`, if `call` has that shape.
fn dependency_literal(call: &mut CallExpr) -> Option<&mut Str> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Ident(ident) = &**callee else {
        return None;
    };
    if &*ident.sym != REQUIRE_IDENT || call.args.len() != 1 {
        return None;
    }
    let arg = &mut call.args[0];
    if arg.spread.is_some() {
        return None;
    }
    match &mut *arg.expr {
        Expr::Lit(Lit::Str(literal)) => Some(literal),
        _ => None,
    }
}
