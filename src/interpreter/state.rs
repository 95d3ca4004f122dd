//! Reified evaluation states
//!
//! Each pending sub-evaluation is a heap-allocated [`State`]: a parent
//! link, the scope it evaluates under, an optional label set, and a
//! per-node payload carrying that node's progress fields. [`State::step`]
//! consumes the state. Stepping into a sub-evaluation moves the state into
//! the child's parent slot; completing returns the taken parent together
//! with a completion value. A completed state is dropped, so control flow
//! is parent-directed by construction and a finished state can never be
//! re-entered.
//!
//! Abrupt completion values (break, continue, return, throw) travel upward
//! untouched except through the constructs that consume them: loops eat
//! matching break/continue, labeled statements eat a targeted break, calls
//! normalize return, try/catch/finally reroutes throw.

use std::rc::Rc;

use crate::ast::{
    AssignmentOp, BlockStatement, CatchClause, Expression, ForInit, FunctionNode, LiteralValue,
    MemberProperty, Program, Statement, UnaryOp, UpdateOp, VariableDeclarator,
};
use crate::error::JsError;
use crate::value::{Closure, JsObjectRef, JsString, JsValue};

use super::scope::{Scope, ScopeRef};
use super::Interpreter;

/// How a step's result flows: ordinary value or abrupt transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Normal,
    Break,
    Continue,
    Return,
    Throw,
}

/// The result of one step: a flow kind, an optional carried value, and an
/// optional jump label (break/continue only)
#[derive(Debug, Clone)]
pub struct Completion {
    pub kind: CompletionKind,
    pub value: Option<JsValue>,
    pub target: Option<JsString>,
}

impl Completion {
    pub fn normal(value: JsValue) -> Self {
        Completion {
            kind: CompletionKind::Normal,
            value: Some(value),
            target: None,
        }
    }

    /// Normal completion with no carried value
    pub fn empty() -> Self {
        Completion {
            kind: CompletionKind::Normal,
            value: None,
            target: None,
        }
    }

    pub fn throw(value: JsValue) -> Self {
        Completion {
            kind: CompletionKind::Throw,
            value: Some(value),
            target: None,
        }
    }

    pub fn return_value(value: JsValue) -> Self {
        Completion {
            kind: CompletionKind::Return,
            value: Some(value),
            target: None,
        }
    }

    pub fn break_to(target: Option<JsString>) -> Self {
        Completion {
            kind: CompletionKind::Break,
            value: None,
            target,
        }
    }

    pub fn continue_to(target: Option<JsString>) -> Self {
        Completion {
            kind: CompletionKind::Continue,
            value: None,
            target,
        }
    }

    pub fn is_abrupt(&self) -> bool {
        self.kind != CompletionKind::Normal
    }

    /// The carried value, `undefined` when absent
    pub fn payload(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }
}

/// One step's outcome: the state to run next (`None` once the root has
/// finished) and the completion value to feed it
pub type StepOutcome = Result<(Option<Box<State>>, Option<Completion>), JsError>;

/// A reified computation frame for one AST node
pub struct State {
    parent: Option<Box<State>>,
    scope: ScopeRef,
    /// Labels this statement answers to; loops consume matching
    /// break/continue directly
    labels: Vec<JsString>,
    kind: StateKind,
}

/// Progress phases of a three-clause `for` loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForPhase {
    Init,
    Test,
    Body,
    Update,
}

struct ForLoop {
    init: Option<ForInit>,
    test: Option<Rc<Expression>>,
    update: Option<Rc<Expression>>,
    body: Rc<Statement>,
    phase: ForPhase,
    value: Option<JsValue>,
}

enum StateKind {
    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════
    /// Statement list of a program, block, or function body
    Block {
        body: Vec<Rc<Statement>>,
        index: usize,
        last: Completion,
    },
    ExpressionStmt {
        expression: Rc<Expression>,
    },
    Empty,
    If {
        test: Rc<Expression>,
        consequent: Rc<Statement>,
        alternate: Option<Rc<Statement>>,
    },
    /// While and do-while share one protocol; do-while starts with
    /// `tested` already set so the body runs before the first test
    WhileLoop {
        test: Rc<Expression>,
        body: Rc<Statement>,
        tested: bool,
        value: Option<JsValue>,
    },
    ForLoop(Box<ForLoop>),
    BreakStmt {
        label: Option<JsString>,
    },
    ContinueStmt {
        label: Option<JsString>,
    },
    ReturnStmt {
        argument: Option<Rc<Expression>>,
    },
    ThrowStmt {
        argument: Rc<Expression>,
    },
    Labeled {
        label: JsString,
        body: Rc<Statement>,
        entered: bool,
    },
    TryCatch {
        block: Rc<BlockStatement>,
        handler: Option<Rc<CatchClause>>,
        finalizer: Option<Rc<BlockStatement>>,
        handled: bool,
        finalized: bool,
        saved: Option<Completion>,
    },
    /// Binds the catch parameter in a fresh scope, then tail-steps the
    /// handler block so the try stays in control of what follows
    CatchHandler {
        clause: Rc<CatchClause>,
    },
    VarDecl {
        declarations: Vec<VariableDeclarator>,
        index: usize,
        /// Name awaiting its initializer's value
        pending: Option<JsString>,
    },
    /// Hoisted by `Scope::populate`; nothing left to do at execution time
    FunctionDecl,

    // ═══════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════
    LiteralExpr {
        value: JsValue,
    },
    IdentifierExpr {
        name: JsString,
    },
    FunctionExpr {
        function: Rc<FunctionNode>,
    },
    ObjectLiteral {
        properties: Vec<(JsString, Rc<Expression>)>,
        object: Option<JsObjectRef>,
        index: usize,
    },
    UnaryExpr {
        operator: UnaryOp,
        argument: Rc<Expression>,
    },
    BinaryExpr {
        operator: crate::ast::BinaryOp,
        left: Rc<Expression>,
        right: Rc<Expression>,
        left_value: Option<JsValue>,
    },
    LogicalExpr {
        operator: crate::ast::LogicalOp,
        left: Rc<Expression>,
        right: Rc<Expression>,
    },
    ConditionalExpr {
        test: Rc<Expression>,
        consequent: Rc<Expression>,
        alternate: Rc<Expression>,
    },
    SequenceExpr {
        expressions: Vec<Rc<Expression>>,
        index: usize,
    },
    MemberExpr {
        object: Rc<Expression>,
        property: MemberProperty,
        base: Option<JsValue>,
    },
    CallExpr {
        callee: Rc<Expression>,
        arguments: Vec<Rc<Expression>>,
        function: Option<Rc<Closure>>,
        call_scope: Option<ScopeRef>,
        /// Next argument to evaluate; arguments below it are bound
        index: usize,
        called: bool,
    },
    AssignmentExpr {
        operator: AssignmentOp,
        target: Lvalue,
        value: Rc<Expression>,
        value_pending: bool,
    },
    UpdateExpr {
        operator: UpdateOp,
        prefix: bool,
        target: Lvalue,
    },
}

impl State {
    // ═══════════════════════════════════════════════════════════════════
    // Factory
    // ═══════════════════════════════════════════════════════════════════

    /// Root state for a whole program; its parent is the driver sentinel
    pub fn from_program(program: &Program, scope: ScopeRef) -> Box<State> {
        Box::new(State {
            parent: None,
            scope,
            labels: Vec::new(),
            kind: StateKind::Block {
                body: program.body.clone(),
                index: 0,
                last: Completion::empty(),
            },
        })
    }

    /// Map a statement node to a freshly initialised state
    pub fn from_statement(
        stmt: &Rc<Statement>,
        parent: Option<Box<State>>,
        scope: ScopeRef,
    ) -> Box<State> {
        let kind = match &**stmt {
            Statement::Variable(node) => StateKind::VarDecl {
                declarations: node.declarations.clone(),
                index: 0,
                pending: None,
            },
            Statement::Function(_) => StateKind::FunctionDecl,
            Statement::Block(node) => StateKind::Block {
                body: node.body.clone(),
                index: 0,
                last: Completion::empty(),
            },
            Statement::If(node) => StateKind::If {
                test: node.test.clone(),
                consequent: node.consequent.clone(),
                alternate: node.alternate.clone(),
            },
            Statement::While(node) => StateKind::WhileLoop {
                test: node.test.clone(),
                body: node.body.clone(),
                tested: false,
                value: None,
            },
            Statement::DoWhile(node) => StateKind::WhileLoop {
                test: node.test.clone(),
                body: node.body.clone(),
                tested: true,
                value: None,
            },
            Statement::For(node) => StateKind::ForLoop(Box::new(ForLoop {
                init: node.init.clone(),
                test: node.test.clone(),
                update: node.update.clone(),
                body: node.body.clone(),
                phase: ForPhase::Init,
                value: None,
            })),
            Statement::Try(node) => StateKind::TryCatch {
                block: node.block.clone(),
                handler: node.handler.clone(),
                finalizer: node.finalizer.clone(),
                handled: false,
                finalized: false,
                saved: None,
            },
            Statement::Return(node) => StateKind::ReturnStmt {
                argument: node.argument.clone(),
            },
            Statement::Break(node) => StateKind::BreakStmt {
                label: node.label.clone(),
            },
            Statement::Continue(node) => StateKind::ContinueStmt {
                label: node.label.clone(),
            },
            Statement::Throw(node) => StateKind::ThrowStmt {
                argument: node.argument.clone(),
            },
            Statement::Expression(node) => StateKind::ExpressionStmt {
                expression: node.expression.clone(),
            },
            Statement::Labeled(node) => StateKind::Labeled {
                label: node.label.clone(),
                body: node.body.clone(),
                entered: false,
            },
            Statement::Empty(_) => StateKind::Empty,
        };
        Box::new(State {
            parent,
            scope,
            labels: Vec::new(),
            kind,
        })
    }

    /// Map an expression node to a freshly initialised state
    pub fn from_expression(
        expr: &Rc<Expression>,
        parent: Option<Box<State>>,
        scope: ScopeRef,
    ) -> Box<State> {
        let kind = match &**expr {
            Expression::Literal(node) => StateKind::LiteralExpr {
                value: match &node.value {
                    LiteralValue::Null => JsValue::Null,
                    LiteralValue::Boolean(b) => JsValue::Boolean(*b),
                    LiteralValue::Number(n) => JsValue::Number(*n),
                    LiteralValue::String(s) => JsValue::String(s.clone()),
                },
            },
            Expression::Identifier(node) => StateKind::IdentifierExpr {
                name: node.name.clone(),
            },
            Expression::Function(node) => StateKind::FunctionExpr {
                function: node.function.clone(),
            },
            Expression::Object(node) => StateKind::ObjectLiteral {
                properties: node
                    .properties
                    .iter()
                    .map(|p| (p.key.clone(), p.value.clone()))
                    .collect(),
                object: None,
                index: 0,
            },
            Expression::Unary(node) => StateKind::UnaryExpr {
                operator: node.operator,
                argument: node.argument.clone(),
            },
            Expression::Binary(node) => StateKind::BinaryExpr {
                operator: node.operator,
                left: node.left.clone(),
                right: node.right.clone(),
                left_value: None,
            },
            Expression::Logical(node) => StateKind::LogicalExpr {
                operator: node.operator,
                left: node.left.clone(),
                right: node.right.clone(),
            },
            Expression::Conditional(node) => StateKind::ConditionalExpr {
                test: node.test.clone(),
                consequent: node.consequent.clone(),
                alternate: node.alternate.clone(),
            },
            Expression::Assignment(node) => StateKind::AssignmentExpr {
                operator: node.operator,
                target: Lvalue::from_expression(&node.target),
                value: node.value.clone(),
                value_pending: false,
            },
            Expression::Update(node) => StateKind::UpdateExpr {
                operator: node.operator,
                prefix: node.prefix,
                target: Lvalue::from_expression(&node.argument),
            },
            Expression::Sequence(node) => StateKind::SequenceExpr {
                expressions: node.expressions.clone(),
                index: 0,
            },
            Expression::Member(node) => StateKind::MemberExpr {
                object: node.object.clone(),
                property: node.property.clone(),
                base: None,
            },
            Expression::Call(node) => StateKind::CallExpr {
                callee: node.callee.clone(),
                arguments: node.arguments.clone(),
                function: None,
                call_scope: None,
                index: 0,
                called: false,
            },
        };
        Box::new(State {
            parent,
            scope,
            labels: Vec::new(),
            kind,
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Stepping
    // ═══════════════════════════════════════════════════════════════════

    /// Advance this state by one step, receiving the previous step's
    /// completion value. Returns the next state to run (`None` when the
    /// program root finished) and the completion value to feed it.
    pub fn step(mut self: Box<Self>, it: &mut Interpreter, cv: Option<Completion>) -> StepOutcome {
        let kind = std::mem::replace(&mut self.kind, StateKind::Empty);
        match kind {
            StateKind::Block { body, index, last } => self.step_block(cv, body, index, last),
            StateKind::ExpressionStmt { expression } => self.step_expression_stmt(cv, expression),
            StateKind::Empty => self.finish(Completion::empty()),
            StateKind::If {
                test,
                consequent,
                alternate,
            } => self.step_if(cv, test, consequent, alternate),
            StateKind::WhileLoop {
                test,
                body,
                tested,
                value,
            } => self.step_while(cv, test, body, tested, value),
            StateKind::ForLoop(state) => self.step_for(cv, *state),
            StateKind::BreakStmt { label } => self.finish(Completion::break_to(label)),
            StateKind::ContinueStmt { label } => self.finish(Completion::continue_to(label)),
            StateKind::ReturnStmt { argument } => self.step_return(cv, argument),
            StateKind::ThrowStmt { argument } => self.step_throw(cv, argument),
            StateKind::Labeled {
                label,
                body,
                entered,
            } => self.step_labeled(cv, label, body, entered),
            StateKind::TryCatch {
                block,
                handler,
                finalizer,
                handled,
                finalized,
                saved,
            } => self.step_try(cv, block, handler, finalizer, handled, finalized, saved),
            StateKind::CatchHandler { clause } => self.step_catch(cv, clause),
            StateKind::VarDecl {
                declarations,
                index,
                pending,
            } => self.step_var_decl(cv, declarations, index, pending),
            StateKind::FunctionDecl => Ok((self.parent, None)),

            StateKind::LiteralExpr { value } => self.finish(Completion::normal(value)),
            StateKind::IdentifierExpr { name } => {
                let value = Scope::get_var(&self.scope, &name);
                self.finish(Completion::normal(value))
            }
            StateKind::FunctionExpr { function } => {
                let closure = Closure {
                    name: function.name.clone(),
                    params: function.params.clone(),
                    body: function.body.clone(),
                    scope: self.scope.clone(),
                };
                self.finish(Completion::normal(JsValue::Function(Rc::new(closure))))
            }
            StateKind::ObjectLiteral {
                properties,
                object,
                index,
            } => self.step_object_literal(it, cv, properties, object, index),
            StateKind::UnaryExpr { operator, argument } => {
                self.step_unary(it, cv, operator, argument)
            }
            StateKind::BinaryExpr {
                operator,
                left,
                right,
                left_value,
            } => self.step_binary(it, cv, operator, left, right, left_value),
            StateKind::LogicalExpr {
                operator,
                left,
                right,
            } => self.step_logical(cv, operator, left, right),
            StateKind::ConditionalExpr {
                test,
                consequent,
                alternate,
            } => self.step_conditional(cv, test, consequent, alternate),
            StateKind::SequenceExpr { expressions, index } => {
                self.step_sequence(cv, expressions, index)
            }
            StateKind::MemberExpr {
                object,
                property,
                base,
            } => self.step_member(it, cv, object, property, base),
            StateKind::CallExpr {
                callee,
                arguments,
                function,
                call_scope,
                index,
                called,
            } => self.step_call(it, cv, callee, arguments, function, call_scope, index, called),
            StateKind::AssignmentExpr {
                operator,
                target,
                value,
                value_pending,
            } => self.step_assignment(it, cv, operator, target, value, value_pending),
            StateKind::UpdateExpr {
                operator,
                prefix,
                target,
            } => self.step_update(it, cv, operator, prefix, target),
        }
    }

    /// Whether a break/continue target names this statement: an empty
    /// target always matches, a label must be in the label set
    fn matches_label(&self, target: &Option<JsString>) -> bool {
        match target {
            None => true,
            Some(label) => self.labels.contains(label),
        }
    }

    // ─── plumbing ──────────────────────────────────────────────────────

    /// Step into a child statement; this state becomes its parent
    fn enter_statement(self: Box<Self>, stmt: &Rc<Statement>) -> StepOutcome {
        let scope = self.scope.clone();
        Ok((Some(State::from_statement(stmt, Some(self), scope)), None))
    }

    /// Step into a child expression; this state becomes its parent
    fn enter_expression(self: Box<Self>, expr: &Rc<Expression>) -> StepOutcome {
        let scope = self.scope.clone();
        Ok((Some(State::from_expression(expr, Some(self), scope)), None))
    }

    /// Step into a statement list under `scope`; this state becomes the
    /// list's parent
    fn enter_body(self: Box<Self>, body: Vec<Rc<Statement>>, scope: ScopeRef) -> StepOutcome {
        let child = Box::new(State {
            parent: Some(self),
            scope,
            labels: Vec::new(),
            kind: StateKind::Block {
                body,
                index: 0,
                last: Completion::empty(),
            },
        });
        Ok((Some(child), None))
    }

    /// Return to the parent with a completion value
    fn finish(self: Box<Self>, cv: Completion) -> StepOutcome {
        Ok((self.parent, Some(cv)))
    }

    /// Convert an adapter error into a THROW completion; anything that is
    /// not a thrown program value is an interpreter bug and propagates as
    /// a host error
    fn raise(self: Box<Self>, err: JsError) -> StepOutcome {
        match err {
            JsError::Thrown { value } => Ok((self.parent, Some(Completion::throw(value)))),
            other => Err(other),
        }
    }

    // ─── statements ────────────────────────────────────────────────────

    fn step_block(
        mut self: Box<Self>,
        cv: Option<Completion>,
        body: Vec<Rc<Statement>>,
        index: usize,
        mut last: Completion,
    ) -> StepOutcome {
        if let Some(c) = cv {
            if c.is_abrupt() {
                return Ok((self.parent, Some(c)));
            }
            last = c;
        }
        if let Some(stmt) = body.get(index).cloned() {
            self.kind = StateKind::Block {
                body,
                index: index + 1,
                last,
            };
            return self.enter_statement(&stmt);
        }
        self.finish(last)
    }

    fn step_expression_stmt(
        mut self: Box<Self>,
        cv: Option<Completion>,
        expression: Rc<Expression>,
    ) -> StepOutcome {
        match cv {
            None => {
                self.kind = StateKind::ExpressionStmt {
                    expression: expression.clone(),
                };
                self.enter_expression(&expression)
            }
            Some(c) => {
                if c.is_abrupt() {
                    return Ok((self.parent, Some(c)));
                }
                self.finish(Completion::normal(c.payload()))
            }
        }
    }

    fn step_if(
        mut self: Box<Self>,
        cv: Option<Completion>,
        test: Rc<Expression>,
        consequent: Rc<Statement>,
        alternate: Option<Rc<Statement>>,
    ) -> StepOutcome {
        let Some(c) = cv else {
            self.kind = StateKind::If {
                test: test.clone(),
                consequent,
                alternate,
            };
            return self.enter_expression(&test);
        };
        if c.is_abrupt() {
            return Ok((self.parent, Some(c)));
        }
        let branch = if c.payload().to_boolean() {
            Some(consequent)
        } else {
            alternate
        };
        match branch {
            // Tail position: the branch reports straight to our parent
            Some(stmt) => {
                let scope = self.scope.clone();
                Ok((Some(State::from_statement(&stmt, self.parent, scope)), None))
            }
            None => self.finish(Completion::empty()),
        }
    }

    fn step_while(
        mut self: Box<Self>,
        cv: Option<Completion>,
        test: Rc<Expression>,
        body: Rc<Statement>,
        tested: bool,
        mut value: Option<JsValue>,
    ) -> StepOutcome {
        if !tested {
            match cv {
                None => {
                    // Evaluate the test
                    self.kind = StateKind::WhileLoop {
                        test: test.clone(),
                        body,
                        tested: false,
                        value,
                    };
                    self.enter_expression(&test)
                }
                Some(c) => {
                    if c.is_abrupt() {
                        return Ok((self.parent, Some(c)));
                    }
                    if !c.payload().to_boolean() {
                        return self.finish(Completion {
                            kind: CompletionKind::Normal,
                            value,
                            target: None,
                        });
                    }
                    self.kind = StateKind::WhileLoop {
                        test,
                        body: body.clone(),
                        tested: true,
                        value,
                    };
                    self.enter_statement(&body)
                }
            }
        } else {
            let Some(c) = cv else {
                // First entry of a do-while: run the body before any test
                self.kind = StateKind::WhileLoop {
                    test,
                    body: body.clone(),
                    tested: true,
                    value,
                };
                return self.enter_statement(&body);
            };
            if c.value.is_some() {
                value = c.value.clone();
            }
            let retest = match c.kind {
                CompletionKind::Continue if self.matches_label(&c.target) => true,
                CompletionKind::Break if self.matches_label(&c.target) => {
                    return self.finish(Completion {
                        kind: CompletionKind::Normal,
                        value,
                        target: None,
                    });
                }
                CompletionKind::Normal => true,
                _ => return Ok((self.parent, Some(c))),
            };
            if retest {
                self.kind = StateKind::WhileLoop {
                    test,
                    body,
                    tested: false,
                    value,
                };
            }
            // Re-enter ourselves with no completion value to run the test
            Ok((Some(self), None))
        }
    }

    fn step_for(mut self: Box<Self>, cv: Option<Completion>, mut f: ForLoop) -> StepOutcome {
        let mut cv = cv;
        loop {
            match f.phase {
                ForPhase::Init => {
                    if let Some(c) = cv.take() {
                        if c.is_abrupt() {
                            return Ok((self.parent, Some(c)));
                        }
                    } else if let Some(init) = f.init.take() {
                        let scope = self.scope.clone();
                        self.kind = StateKind::ForLoop(Box::new(f));
                        let child = match &init {
                            ForInit::Variable(stmt) => {
                                State::from_statement(stmt, Some(self), scope)
                            }
                            ForInit::Expression(expr) => {
                                State::from_expression(expr, Some(self), scope)
                            }
                        };
                        return Ok((Some(child), None));
                    }
                    f.phase = ForPhase::Test;
                }
                ForPhase::Test => match cv.take() {
                    Some(c) => {
                        if c.is_abrupt() {
                            return Ok((self.parent, Some(c)));
                        }
                        if !c.payload().to_boolean() {
                            return self.finish(Completion {
                                kind: CompletionKind::Normal,
                                value: f.value,
                                target: None,
                            });
                        }
                        let body = f.body.clone();
                        f.phase = ForPhase::Body;
                        self.kind = StateKind::ForLoop(Box::new(f));
                        return self.enter_statement(&body);
                    }
                    None => match f.test.clone() {
                        Some(test) => {
                            self.kind = StateKind::ForLoop(Box::new(f));
                            return self.enter_expression(&test);
                        }
                        None => {
                            // No test clause: always run the body
                            let body = f.body.clone();
                            f.phase = ForPhase::Body;
                            self.kind = StateKind::ForLoop(Box::new(f));
                            return self.enter_statement(&body);
                        }
                    },
                },
                ForPhase::Body => {
                    let c = cv.take().unwrap_or_else(Completion::empty);
                    if c.value.is_some() {
                        f.value = c.value.clone();
                    }
                    match c.kind {
                        CompletionKind::Continue if self.matches_label(&c.target) => {
                            f.phase = ForPhase::Update;
                        }
                        CompletionKind::Break if self.matches_label(&c.target) => {
                            return self.finish(Completion {
                                kind: CompletionKind::Normal,
                                value: f.value,
                                target: None,
                            });
                        }
                        CompletionKind::Normal => f.phase = ForPhase::Update,
                        _ => return Ok((self.parent, Some(c))),
                    }
                }
                ForPhase::Update => match cv.take() {
                    Some(c) => {
                        if c.is_abrupt() {
                            return Ok((self.parent, Some(c)));
                        }
                        f.phase = ForPhase::Test;
                    }
                    None => match f.update.clone() {
                        Some(update) => {
                            self.kind = StateKind::ForLoop(Box::new(f));
                            return self.enter_expression(&update);
                        }
                        None => f.phase = ForPhase::Test,
                    },
                },
            }
        }
    }

    fn step_return(
        mut self: Box<Self>,
        cv: Option<Completion>,
        argument: Option<Rc<Expression>>,
    ) -> StepOutcome {
        match cv {
            None => match argument {
                Some(expr) => {
                    self.kind = StateKind::ReturnStmt {
                        argument: Some(expr.clone()),
                    };
                    self.enter_expression(&expr)
                }
                None => self.finish(Completion::return_value(JsValue::Undefined)),
            },
            Some(c) => {
                if c.is_abrupt() {
                    return Ok((self.parent, Some(c)));
                }
                self.finish(Completion::return_value(c.payload()))
            }
        }
    }

    fn step_throw(
        mut self: Box<Self>,
        cv: Option<Completion>,
        argument: Rc<Expression>,
    ) -> StepOutcome {
        match cv {
            None => {
                self.kind = StateKind::ThrowStmt {
                    argument: argument.clone(),
                };
                self.enter_expression(&argument)
            }
            Some(c) => {
                if c.is_abrupt() {
                    return Ok((self.parent, Some(c)));
                }
                self.finish(Completion::throw(c.payload()))
            }
        }
    }

    fn step_labeled(
        mut self: Box<Self>,
        cv: Option<Completion>,
        label: JsString,
        body: Rc<Statement>,
        entered: bool,
    ) -> StepOutcome {
        if !entered {
            // Hand the inner statement every label it answers to, ours
            // included, so loops can consume targeted break/continue
            // directly
            let mut inner_labels = self.labels.clone();
            inner_labels.push(label.clone());
            let scope = self.scope.clone();
            self.kind = StateKind::Labeled {
                label,
                body: body.clone(),
                entered: true,
            };
            let mut inner = State::from_statement(&body, Some(self), scope);
            inner.labels = inner_labels;
            return Ok((Some(inner), None));
        }
        if let Some(c) = &cv {
            if c.kind == CompletionKind::Break && c.target.as_ref() == Some(&label) {
                return self.finish(Completion {
                    kind: CompletionKind::Normal,
                    value: c.value.clone(),
                    target: None,
                });
            }
        }
        Ok((self.parent, cv))
    }

    #[allow(clippy::too_many_arguments)]
    fn step_try(
        mut self: Box<Self>,
        cv: Option<Completion>,
        block: Rc<BlockStatement>,
        handler: Option<Rc<CatchClause>>,
        finalizer: Option<Rc<BlockStatement>>,
        handled: bool,
        finalized: bool,
        saved: Option<Completion>,
    ) -> StepOutcome {
        let Some(c) = cv else {
            // First entry: run the protected block
            let scope = self.scope.clone();
            self.kind = StateKind::TryCatch {
                block: block.clone(),
                handler,
                finalizer,
                handled,
                finalized,
                saved,
            };
            return self.enter_body(block.body.clone(), scope);
        };

        if finalized {
            // Finalizer completed: its abrupt completion supersedes the
            // saved one
            if c.is_abrupt() {
                return Ok((self.parent, Some(c)));
            }
            return Ok((self.parent, saved));
        }

        if !handled {
            if c.kind == CompletionKind::Throw {
                if let Some(clause) = handler.clone() {
                    let scope = self.scope.clone();
                    self.kind = StateKind::TryCatch {
                        block,
                        handler,
                        finalizer,
                        handled: true,
                        finalized,
                        saved,
                    };
                    let child = Box::new(State {
                        parent: Some(self),
                        scope,
                        labels: Vec::new(),
                        kind: StateKind::CatchHandler { clause },
                    });
                    // The thrown completion is the handler's input
                    return Ok((Some(child), Some(c)));
                }
            }
        }

        // Block or handler finished with `c`; run the finalizer if any
        match finalizer {
            Some(fin) => {
                let scope = self.scope.clone();
                self.kind = StateKind::TryCatch {
                    block,
                    handler,
                    finalizer: None,
                    handled: true,
                    finalized: true,
                    saved: Some(c),
                };
                self.enter_body(fin.body.clone(), scope)
            }
            None => self.finish(c),
        }
    }

    fn step_catch(self: Box<Self>, cv: Option<Completion>, clause: Rc<CatchClause>) -> StepOutcome {
        let c = require_cv(cv)?;
        // Fresh scope with the catch parameter bound to the thrown value
        let catch_scope = Scope::new_child(&self.scope);
        Scope::new_var(&catch_scope, clause.param.clone(), c.payload());
        // Tail-step the handler block: it reports to the try, which keeps
        // control of post-catch flow
        let child = Box::new(State {
            parent: self.parent,
            scope: catch_scope,
            labels: Vec::new(),
            kind: StateKind::Block {
                body: clause.body.body.clone(),
                index: 0,
                last: Completion::empty(),
            },
        });
        Ok((Some(child), None))
    }

    fn step_var_decl(
        mut self: Box<Self>,
        cv: Option<Completion>,
        declarations: Vec<VariableDeclarator>,
        mut index: usize,
        pending: Option<JsString>,
    ) -> StepOutcome {
        if let Some(name) = pending {
            let c = require_cv(cv)?;
            if c.is_abrupt() {
                return Ok((self.parent, Some(c)));
            }
            // The name was pre-declared by populate; write the value
            Scope::set_var(&self.scope, &name, c.payload());
        }
        while let Some(declarator) = declarations.get(index) {
            index += 1;
            if let Some(init) = declarator.init.clone() {
                self.kind = StateKind::VarDecl {
                    declarations: declarations.clone(),
                    index,
                    pending: Some(declarator.name.clone()),
                };
                return self.enter_expression(&init);
            }
        }
        self.finish(Completion::empty())
    }

    // ─── expressions ───────────────────────────────────────────────────

    fn step_object_literal(
        mut self: Box<Self>,
        it: &mut Interpreter,
        cv: Option<Completion>,
        properties: Vec<(JsString, Rc<Expression>)>,
        object: Option<JsObjectRef>,
        mut index: usize,
    ) -> StepOutcome {
        let obj = match object {
            None => it.new_object(),
            Some(obj) => {
                let c = require_cv(cv)?;
                if c.is_abrupt() {
                    return Ok((self.parent, Some(c)));
                }
                let Some((key, _)) = properties.get(index) else {
                    return Err(JsError::internal("object literal property out of range"));
                };
                crate::value::JsObject::set_property(&obj, key.clone(), c.payload());
                index += 1;
                obj
            }
        };
        if let Some((_, value_expr)) = properties.get(index).cloned() {
            self.kind = StateKind::ObjectLiteral {
                properties,
                object: Some(obj),
                index,
            };
            return self.enter_expression(&value_expr);
        }
        self.finish(Completion::normal(JsValue::Object(obj)))
    }

    fn step_unary(
        mut self: Box<Self>,
        it: &mut Interpreter,
        cv: Option<Completion>,
        operator: UnaryOp,
        argument: Rc<Expression>,
    ) -> StepOutcome {
        let Some(c) = cv else {
            self.kind = StateKind::UnaryExpr {
                operator,
                argument: argument.clone(),
            };
            return self.enter_expression(&argument);
        };
        if c.is_abrupt() {
            return Ok((self.parent, Some(c)));
        }
        let result = it.unary_op(operator, &c.payload());
        self.finish(Completion::normal(result))
    }

    fn step_binary(
        mut self: Box<Self>,
        it: &mut Interpreter,
        cv: Option<Completion>,
        operator: crate::ast::BinaryOp,
        left: Rc<Expression>,
        right: Rc<Expression>,
        left_value: Option<JsValue>,
    ) -> StepOutcome {
        let Some(c) = cv else {
            self.kind = StateKind::BinaryExpr {
                operator,
                left: left.clone(),
                right,
                left_value,
            };
            return self.enter_expression(&left);
        };
        if c.is_abrupt() {
            return Ok((self.parent, Some(c)));
        }
        match left_value {
            None => {
                self.kind = StateKind::BinaryExpr {
                    operator,
                    left,
                    right: right.clone(),
                    left_value: Some(c.payload()),
                };
                self.enter_expression(&right)
            }
            Some(lhs) => {
                let result = it.binary_op(operator, &lhs, &c.payload());
                self.finish(Completion::normal(result))
            }
        }
    }

    fn step_logical(
        mut self: Box<Self>,
        cv: Option<Completion>,
        operator: crate::ast::LogicalOp,
        left: Rc<Expression>,
        right: Rc<Expression>,
    ) -> StepOutcome {
        let Some(c) = cv else {
            self.kind = StateKind::LogicalExpr {
                operator,
                left: left.clone(),
                right,
            };
            return self.enter_expression(&left);
        };
        if c.is_abrupt() {
            return Ok((self.parent, Some(c)));
        }
        let lhs = c.payload();
        let take_right = match operator {
            crate::ast::LogicalOp::And => lhs.to_boolean(),
            crate::ast::LogicalOp::Or => !lhs.to_boolean(),
        };
        if take_right {
            // Tail position, like the conditional's branches
            let scope = self.scope.clone();
            Ok((Some(State::from_expression(&right, self.parent, scope)), None))
        } else {
            self.finish(Completion::normal(lhs))
        }
    }

    fn step_conditional(
        mut self: Box<Self>,
        cv: Option<Completion>,
        test: Rc<Expression>,
        consequent: Rc<Expression>,
        alternate: Rc<Expression>,
    ) -> StepOutcome {
        let Some(c) = cv else {
            self.kind = StateKind::ConditionalExpr {
                test: test.clone(),
                consequent,
                alternate,
            };
            return self.enter_expression(&test);
        };
        if c.is_abrupt() {
            return Ok((self.parent, Some(c)));
        }
        let branch = if c.payload().to_boolean() {
            consequent
        } else {
            alternate
        };
        // Tail position: the branch reports straight to our parent
        let scope = self.scope.clone();
        Ok((Some(State::from_expression(&branch, self.parent, scope)), None))
    }

    fn step_sequence(
        mut self: Box<Self>,
        cv: Option<Completion>,
        expressions: Vec<Rc<Expression>>,
        index: usize,
    ) -> StepOutcome {
        if let Some(c) = cv {
            if c.is_abrupt() {
                return Ok((self.parent, Some(c)));
            }
            // Intermediate results are discarded
        }
        let Some(expr) = expressions.get(index).cloned() else {
            return Err(JsError::internal("sequence expression out of range"));
        };
        if index + 1 == expressions.len() {
            // The last subexpression runs in tail position; this state
            // drops out before it is evaluated
            let scope = self.scope.clone();
            return Ok((Some(State::from_expression(&expr, self.parent, scope)), None));
        }
        self.kind = StateKind::SequenceExpr {
            expressions,
            index: index + 1,
        };
        self.enter_expression(&expr)
    }

    fn step_member(
        mut self: Box<Self>,
        it: &mut Interpreter,
        cv: Option<Completion>,
        object: Rc<Expression>,
        property: MemberProperty,
        base: Option<JsValue>,
    ) -> StepOutcome {
        let Some(c) = cv else {
            self.kind = StateKind::MemberExpr {
                object: object.clone(),
                property,
                base,
            };
            return self.enter_expression(&object);
        };
        if c.is_abrupt() {
            return Ok((self.parent, Some(c)));
        }
        match base {
            None => {
                let base_value = c.payload();
                match &property {
                    MemberProperty::Identifier(name) => {
                        let value = match it.get_property(&base_value, name) {
                            Ok(v) => v,
                            Err(e) => return self.raise(e),
                        };
                        self.finish(Completion::normal(value))
                    }
                    MemberProperty::Computed(expr) => {
                        let expr = expr.clone();
                        self.kind = StateKind::MemberExpr {
                            object,
                            property,
                            base: Some(base_value),
                        };
                        self.enter_expression(&expr)
                    }
                }
            }
            Some(base_value) => {
                let name = c.payload().to_js_string();
                let value = match it.get_property(&base_value, &name) {
                    Ok(v) => v,
                    Err(e) => return self.raise(e),
                };
                self.finish(Completion::normal(value))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn step_call(
        mut self: Box<Self>,
        it: &mut Interpreter,
        cv: Option<Completion>,
        callee: Rc<Expression>,
        arguments: Vec<Rc<Expression>>,
        mut function: Option<Rc<Closure>>,
        mut call_scope: Option<ScopeRef>,
        mut index: usize,
        called: bool,
    ) -> StepOutcome {
        let Some(c) = cv else {
            // Evaluate the callee first
            self.kind = StateKind::CallExpr {
                callee: callee.clone(),
                arguments,
                function,
                call_scope,
                index,
                called,
            };
            return self.enter_expression(&callee);
        };

        if called {
            // The body finished; normalise its completion
            return match c.kind {
                CompletionKind::Return => self.finish(Completion::normal(c.payload())),
                CompletionKind::Throw => Ok((self.parent, Some(c))),
                CompletionKind::Normal => self.finish(Completion::normal(JsValue::Undefined)),
                _ => Err(JsError::internal(
                    "break or continue escaped a function body",
                )),
            };
        }

        if c.is_abrupt() {
            return Ok((self.parent, Some(c)));
        }

        if function.is_none() {
            // Callee value arrived
            let callee_value = c.payload();
            let JsValue::Function(closure) = callee_value else {
                let message = format!("{} is not a function", callee_value.to_js_string());
                return self.raise(it.type_error(message));
            };
            // Fresh scope under the closure's defining scope: missing
            // arguments read as undefined, then hoisting runs
            let ns = Scope::new_child(&closure.scope);
            for param in &closure.params {
                Scope::new_var(&ns, param.clone(), JsValue::Undefined);
            }
            Scope::populate(&ns, &closure.body);
            function = Some(closure);
            call_scope = Some(ns);
        } else {
            // An argument's value arrived; bind the matching parameter
            // (extra arguments are evaluated, then dropped)
            let (Some(closure), Some(ns)) = (&function, &call_scope) else {
                return Err(JsError::internal("call state lost its scope"));
            };
            if let Some(param) = closure.params.get(index) {
                Scope::new_var(ns, param.clone(), c.payload());
            }
            index += 1;
        }

        if let Some(arg) = arguments.get(index).cloned() {
            self.kind = StateKind::CallExpr {
                callee,
                arguments,
                function,
                call_scope,
                index,
                called,
            };
            return self.enter_expression(&arg);
        }

        // All arguments bound: run the body under the call scope
        let (Some(closure), Some(ns)) = (&function, &call_scope) else {
            return Err(JsError::internal("call state stepped out of order"));
        };
        let body = closure.body.clone();
        let ns = ns.clone();
        self.kind = StateKind::CallExpr {
            callee,
            arguments,
            function: function.clone(),
            call_scope: call_scope.clone(),
            index,
            called: true,
        };
        self.enter_body(body, ns)
    }

    fn step_assignment(
        mut self: Box<Self>,
        it: &mut Interpreter,
        cv: Option<Completion>,
        operator: AssignmentOp,
        mut target: Lvalue,
        value: Rc<Expression>,
        value_pending: bool,
    ) -> StepOutcome {
        let mut cv = cv;
        if let Some(c) = &cv {
            if c.is_abrupt() {
                return Ok((self.parent, cv));
            }
        }
        if !target.ready {
            if let Some(expr) = target.step(cv.take()) {
                self.kind = StateKind::AssignmentExpr {
                    operator,
                    target,
                    value,
                    value_pending,
                };
                return self.enter_expression(&expr);
            }
            // The reference is resolved; any completion value fed the
            // resolver
        }
        if !value_pending {
            self.kind = StateKind::AssignmentExpr {
                operator,
                target,
                value: value.clone(),
                value_pending: true,
            };
            return self.enter_expression(&value);
        }
        let c = require_cv(cv)?;
        let rhs = c.payload();
        let result = match operator.binary_op() {
            None => rhs,
            Some(op) => {
                let current = match target.get(it, &self.scope) {
                    Ok(v) => v,
                    Err(e) => return self.raise(e),
                };
                it.binary_op(op, &current, &rhs)
            }
        };
        if let Err(e) = target.set(it, &self.scope, result.clone()) {
            return self.raise(e);
        }
        self.finish(Completion::normal(result))
    }

    fn step_update(
        mut self: Box<Self>,
        it: &mut Interpreter,
        cv: Option<Completion>,
        operator: UpdateOp,
        prefix: bool,
        mut target: Lvalue,
    ) -> StepOutcome {
        let mut cv = cv;
        if let Some(c) = &cv {
            if c.is_abrupt() {
                return Ok((self.parent, cv));
            }
        }
        if !target.ready {
            if let Some(expr) = target.step(cv.take()) {
                self.kind = StateKind::UpdateExpr {
                    operator,
                    prefix,
                    target,
                };
                return self.enter_expression(&expr);
            }
        }
        let old = match target.get(it, &self.scope) {
            Ok(v) => v,
            Err(e) => return self.raise(e),
        };
        let old_number = old.to_number();
        let new_number = match operator {
            UpdateOp::Increment => old_number + 1.0,
            UpdateOp::Decrement => old_number - 1.0,
        };
        if let Err(e) = target.set(it, &self.scope, JsValue::Number(new_number)) {
            return self.raise(e);
        }
        let result = if prefix { new_number } else { old_number };
        self.finish(Completion::normal(JsValue::Number(result)))
    }
}

fn require_cv(cv: Option<Completion>) -> Result<Completion, JsError> {
    cv.ok_or_else(|| JsError::internal("state resumed without a completion value"))
}

/// A resolved or in-flight reference to an identifier or object property.
///
/// Shared by assignment and update expressions: the owner forwards its
/// incoming completion values to [`Lvalue::step`], which answers with the
/// next sub-expression to evaluate until the `(base, name)` pair is known;
/// after that the owner reads and writes through [`Lvalue::get`] and
/// [`Lvalue::set`] without further stepping.
pub(crate) struct Lvalue {
    /// `None` for a variable reference, the base value for a property
    base: Option<JsValue>,
    name: Option<JsString>,
    object_expr: Option<Rc<Expression>>,
    property_expr: Option<Rc<Expression>>,
    have_base: bool,
    ready: bool,
}

impl Lvalue {
    /// Build a reference resolver for an identifier or member expression.
    /// Anything else is a malformed lvalue the parser never produces; it
    /// surfaces as an internal error on first access.
    fn from_expression(expr: &Expression) -> Lvalue {
        match expr {
            Expression::Identifier(node) => Lvalue {
                base: None,
                name: Some(node.name.clone()),
                object_expr: None,
                property_expr: None,
                have_base: false,
                ready: true,
            },
            Expression::Member(node) => {
                let (name, property_expr) = match &node.property {
                    MemberProperty::Identifier(name) => (Some(name.clone()), None),
                    MemberProperty::Computed(expr) => (None, Some(expr.clone())),
                };
                Lvalue {
                    base: None,
                    name,
                    object_expr: Some(node.object.clone()),
                    property_expr,
                    have_base: false,
                    ready: false,
                }
            }
            _ => Lvalue {
                base: None,
                name: None,
                object_expr: None,
                property_expr: None,
                have_base: false,
                ready: true,
            },
        }
    }

    /// Feed the resolver one completion value; returns the next
    /// sub-expression to evaluate, or `None` once the reference is ready
    fn step(&mut self, cv: Option<Completion>) -> Option<Rc<Expression>> {
        if self.ready {
            return None;
        }
        if !self.have_base {
            match cv {
                // First entry: evaluate the base expression
                None => self.object_expr.clone(),
                Some(c) => {
                    self.base = Some(c.payload());
                    self.have_base = true;
                    match self.property_expr.clone() {
                        Some(expr) => Some(expr),
                        None => {
                            // Plain `.name` member: the name was recorded
                            // at construction
                            self.ready = true;
                            None
                        }
                    }
                }
            }
        } else {
            // Computed property name arrived
            if let Some(c) = cv {
                self.name = Some(c.payload().to_js_string());
            }
            self.ready = true;
            None
        }
    }

    /// Read the current value of the reference
    fn get(&self, it: &Interpreter, scope: &ScopeRef) -> Result<JsValue, JsError> {
        let Some(name) = &self.name else {
            return Err(JsError::internal("malformed lvalue"));
        };
        match &self.base {
            Some(base) => it.get_property(base, name),
            None => Ok(Scope::get_var(scope, name)),
        }
    }

    /// Write through the reference
    fn set(&self, it: &Interpreter, scope: &ScopeRef, value: JsValue) -> Result<(), JsError> {
        let Some(name) = &self.name else {
            return Err(JsError::internal("malformed lvalue"));
        };
        match &self.base {
            Some(base) => it.set_property(base, name.clone(), value),
            None => {
                Scope::set_var(scope, name, value);
                Ok(())
            }
        }
    }
}
