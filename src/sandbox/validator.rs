// src/sandbox/validator.rs

//! Static syntax check run before anything touches the filesystem or spawns
//! a process.
//!
//! Submissions are parsed with an in-process Python parser; a rejected
//! submission costs a parse, never a spawn + teardown cycle.
//!
//! The parser is more permissive than CPython: it builds a tree for `1 = x`
//! or a module-level `break`, which CPython only rejects while compiling.
//! A second pass over the tree applies those rules so such code is reported
//! as a syntax error instead of failing at runtime.

use std::fmt;

use rustpython_ast::Visitor;
use rustpython_parser::ast::{self, Ranged, text_size::TextSize};
use rustpython_parser::{Mode, ParseError, parse};

/// Source path reported by the parser for learner code.
const SUBMISSION_PATH: &str = "<submission>";

/// Source path reported by the parser for a lesson's test expression.
const TEST_EXPRESSION_PATH: &str = "<lesson-test>";

/// Where and why a piece of source failed to parse.
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes, so
/// it stays meaningful for Cyrillic identifiers and string literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorDetail {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl SyntaxErrorDetail {
    fn from_parse_error(source: &str, err: &ParseError) -> Self {
        let (line, column) = locate(source, u32::from(err.offset) as usize);
        Self {
            message: err.error.to_string(),
            line,
            column,
        }
    }

    fn at(source: &str, offset: TextSize, message: String) -> Self {
        let (line, column) = locate(source, u32::from(offset) as usize);
        Self {
            message,
            line,
            column,
        }
    }
}

impl fmt::Display for SyntaxErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for SyntaxErrorDetail {}

/// Check that `code` is a syntactically valid Python module.
///
/// Empty and whitespace-only code is accepted; it runs, prints nothing and
/// is left to fail grading like any other wrong answer.
pub fn validate(code: &str) -> Result<(), SyntaxErrorDetail> {
    if code.trim().is_empty() {
        return Ok(());
    }

    let parsed = parse(code, Mode::Module, SUBMISSION_PATH)
        .map_err(|err| SyntaxErrorDetail::from_parse_error(code, &err))?;
    let ast::Mod::Module(module) = parsed else {
        return Ok(());
    };

    let mut rules = CompileRules::default();
    for stmt in module.body {
        rules.visit_stmt(stmt);
    }
    match rules.rejection {
        Some((offset, message)) => Err(SyntaxErrorDetail::at(code, offset, message)),
        None => Ok(()),
    }
}

/// Check that a lesson's test expression is a single Python expression.
///
/// The expression is compared after trimming surrounding whitespace, which is
/// also how the harness embeds it.
pub fn validate_test_expression(expression: &str) -> Result<(), SyntaxErrorDetail> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(SyntaxErrorDetail {
            message: "test expression is empty".to_string(),
            line: 1,
            column: 1,
        });
    }

    parse(expression, Mode::Expression, TEST_EXPRESSION_PATH)
        .map(|_| ())
        .map_err(|err| SyntaxErrorDetail::from_parse_error(expression, &err))
}

/// Convert a byte offset into a 1-based (line, column) pair.
fn locate(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }

    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetUse {
    Assign,
    Delete,
}

impl TargetUse {
    fn verb(self) -> &'static str {
        match self {
            TargetUse::Assign => "assign to",
            TargetUse::Delete => "delete",
        }
    }
}

/// Tree walk for the rules CPython enforces at compile time.
///
/// Only the first violation in source order is kept.
#[derive(Default)]
struct CompileRules {
    /// Function scopes whose body is being walked; a class body resets it.
    function_depth: usize,
    /// Every enclosing function, including those outside a class body.
    enclosing_functions: usize,
    loop_depth: usize,
    rejection: Option<(TextSize, String)>,
}

impl CompileRules {
    fn reject(&mut self, offset: TextSize, message: impl Into<String>) {
        if self.rejection.is_none() {
            self.rejection = Some((offset, message.into()));
        }
    }

    fn check_target(&mut self, target: &ast::Expr, usage: TargetUse) {
        match target {
            ast::Expr::Name(name) if name.id.as_str() == "__debug__" => {
                self.reject(target.start(), format!("cannot {} __debug__", usage.verb()));
            }
            ast::Expr::Name(_) | ast::Expr::Attribute(_) | ast::Expr::Subscript(_) => {}
            ast::Expr::Starred(starred) if usage == TargetUse::Assign => {
                self.check_target(&starred.value, usage);
            }
            ast::Expr::Tuple(tuple) => {
                for elt in &tuple.elts {
                    self.check_target(elt, usage);
                }
            }
            ast::Expr::List(list) => {
                for elt in &list.elts {
                    self.check_target(elt, usage);
                }
            }
            other => {
                self.reject(
                    other.start(),
                    format!("cannot {} {}", usage.verb(), describe(other)),
                );
            }
        }
    }

    fn check_augmented_target(&mut self, target: &ast::Expr) {
        match target {
            ast::Expr::Name(name) if name.id.as_str() == "__debug__" => {
                self.reject(target.start(), "cannot assign to __debug__");
            }
            ast::Expr::Name(_) | ast::Expr::Attribute(_) | ast::Expr::Subscript(_) => {}
            other => {
                self.reject(
                    other.start(),
                    format!(
                        "'{}' is an illegal expression for augmented assignment",
                        describe(other)
                    ),
                );
            }
        }
    }

    fn check_annotated_target(&mut self, target: &ast::Expr) {
        match target {
            ast::Expr::Name(name) if name.id.as_str() == "__debug__" => {
                self.reject(target.start(), "cannot assign to __debug__");
            }
            ast::Expr::Name(_) | ast::Expr::Attribute(_) | ast::Expr::Subscript(_) => {}
            ast::Expr::Tuple(_) => {
                self.reject(target.start(), "only single target (not tuple) can be annotated");
            }
            ast::Expr::List(_) => {
                self.reject(target.start(), "only single target (not list) can be annotated");
            }
            other => self.reject(other.start(), "illegal target for annotation"),
        }
    }

    fn visit_loop_body(&mut self, body: Vec<ast::Stmt>) {
        self.loop_depth += 1;
        for stmt in body {
            self.visit_stmt(stmt);
        }
        self.loop_depth -= 1;
    }

    /// Run `visit` with fresh loop context; `function` says whether the new
    /// scope may `return` and `yield`.
    fn in_scope(&mut self, function: bool, visit: impl FnOnce(&mut Self)) {
        let saved = (self.function_depth, self.enclosing_functions, self.loop_depth);
        if function {
            self.function_depth += 1;
            self.enclosing_functions += 1;
        } else {
            self.function_depth = 0;
        }
        self.loop_depth = 0;
        visit(self);
        (self.function_depth, self.enclosing_functions, self.loop_depth) = saved;
    }
}

impl Visitor for CompileRules {
    fn visit_stmt_function_def(&mut self, node: ast::StmtFunctionDef) {
        self.in_scope(true, |rules| rules.generic_visit_stmt_function_def(node));
    }

    fn visit_stmt_async_function_def(&mut self, node: ast::StmtAsyncFunctionDef) {
        self.in_scope(true, |rules| rules.generic_visit_stmt_async_function_def(node));
    }

    fn visit_stmt_class_def(&mut self, node: ast::StmtClassDef) {
        self.in_scope(false, |rules| rules.generic_visit_stmt_class_def(node));
    }

    fn visit_expr_lambda(&mut self, node: ast::ExprLambda) {
        self.in_scope(true, |rules| rules.generic_visit_expr_lambda(node));
    }

    fn visit_stmt_return(&mut self, node: ast::StmtReturn) {
        if self.function_depth == 0 {
            self.reject(node.range.start(), "'return' outside function");
        }
        self.generic_visit_stmt_return(node);
    }

    fn visit_expr_yield(&mut self, node: ast::ExprYield) {
        if self.function_depth == 0 {
            self.reject(node.range.start(), "'yield' outside function");
        }
        self.generic_visit_expr_yield(node);
    }

    fn visit_expr_yield_from(&mut self, node: ast::ExprYieldFrom) {
        if self.function_depth == 0 {
            self.reject(node.range.start(), "'yield' outside function");
        }
        self.generic_visit_expr_yield_from(node);
    }

    fn visit_stmt_nonlocal(&mut self, node: ast::StmtNonlocal) {
        if self.enclosing_functions == 0 {
            self.reject(
                node.range.start(),
                "nonlocal declaration not allowed at module level",
            );
        }
    }

    fn visit_stmt_break(&mut self, node: ast::StmtBreak) {
        if self.loop_depth == 0 {
            self.reject(node.range.start(), "'break' outside loop");
        }
    }

    fn visit_stmt_continue(&mut self, node: ast::StmtContinue) {
        if self.loop_depth == 0 {
            self.reject(node.range.start(), "'continue' not properly in loop");
        }
    }

    // The harness wraps learner code in a `try` block, where a future
    // import can never be the first statement.
    fn visit_stmt_import_from(&mut self, node: ast::StmtImportFrom) {
        if node.module.as_ref().is_some_and(|m| m.as_str() == "__future__") {
            self.reject(
                node.range.start(),
                "'from __future__' imports are not supported in submissions",
            );
        }
    }

    fn visit_stmt_assign(&mut self, node: ast::StmtAssign) {
        for target in &node.targets {
            self.check_target(target, TargetUse::Assign);
        }
        self.generic_visit_stmt_assign(node);
    }

    fn visit_stmt_aug_assign(&mut self, node: ast::StmtAugAssign) {
        self.check_augmented_target(&node.target);
        self.generic_visit_stmt_aug_assign(node);
    }

    fn visit_stmt_ann_assign(&mut self, node: ast::StmtAnnAssign) {
        self.check_annotated_target(&node.target);
        self.generic_visit_stmt_ann_assign(node);
    }

    fn visit_stmt_delete(&mut self, node: ast::StmtDelete) {
        for target in &node.targets {
            self.check_target(target, TargetUse::Delete);
        }
        self.generic_visit_stmt_delete(node);
    }

    fn visit_stmt_for(&mut self, node: ast::StmtFor) {
        self.check_target(&node.target, TargetUse::Assign);
        self.visit_expr(*node.target);
        self.visit_expr(*node.iter);
        self.visit_loop_body(node.body);
        for stmt in node.orelse {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt_async_for(&mut self, node: ast::StmtAsyncFor) {
        self.check_target(&node.target, TargetUse::Assign);
        self.visit_expr(*node.target);
        self.visit_expr(*node.iter);
        self.visit_loop_body(node.body);
        for stmt in node.orelse {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt_while(&mut self, node: ast::StmtWhile) {
        self.visit_expr(*node.test);
        self.visit_loop_body(node.body);
        for stmt in node.orelse {
            self.visit_stmt(stmt);
        }
    }

    fn visit_withitem(&mut self, node: ast::WithItem) {
        self.visit_expr(node.context_expr);
        if let Some(vars) = node.optional_vars {
            self.check_target(&vars, TargetUse::Assign);
            self.visit_expr(*vars);
        }
    }

    fn visit_comprehension(&mut self, node: ast::Comprehension) {
        self.check_target(&node.target, TargetUse::Assign);
        self.visit_expr(node.target);
        self.visit_expr(node.iter);
        for cond in node.ifs {
            self.visit_expr(cond);
        }
    }

    fn visit_keyword(&mut self, node: ast::Keyword) {
        self.visit_expr(node.value);
    }

    fn visit_match_case(&mut self, node: ast::MatchCase) {
        if let Some(guard) = node.guard {
            self.visit_expr(*guard);
        }
        for stmt in node.body {
            self.visit_stmt(stmt);
        }
    }
}

/// CPython's wording for an expression that cannot be a target.
fn describe(expr: &ast::Expr) -> &'static str {
    match expr {
        ast::Expr::Constant(constant) => match constant.value {
            ast::Constant::None => "None",
            ast::Constant::Bool(true) => "True",
            ast::Constant::Bool(false) => "False",
            ast::Constant::Ellipsis => "ellipsis",
            _ => "literal",
        },
        ast::Expr::Call(_) => "function call",
        ast::Expr::Lambda(_) => "lambda",
        ast::Expr::BoolOp(_) | ast::Expr::BinOp(_) | ast::Expr::UnaryOp(_) => "expression",
        ast::Expr::IfExp(_) => "conditional expression",
        ast::Expr::Compare(_) => "comparison",
        ast::Expr::NamedExpr(_) => "named expression",
        ast::Expr::Dict(_) => "dict literal",
        ast::Expr::Set(_) => "set display",
        ast::Expr::ListComp(_) => "list comprehension",
        ast::Expr::SetComp(_) => "set comprehension",
        ast::Expr::DictComp(_) => "dict comprehension",
        ast::Expr::GeneratorExp(_) => "generator expression",
        ast::Expr::Await(_) => "await expression",
        ast::Expr::Yield(_) | ast::Expr::YieldFrom(_) => "yield expression",
        ast::Expr::JoinedStr(_) | ast::Expr::FormattedValue(_) => "f-string expression",
        ast::Expr::Starred(_) => "starred",
        ast::Expr::Tuple(_) => "tuple",
        ast::Expr::List(_) => "list",
        ast::Expr::Name(_) => "name",
        ast::Expr::Attribute(_) => "attribute",
        ast::Expr::Subscript(_) => "subscript",
        ast::Expr::Slice(_) => "slice",
    }
}
