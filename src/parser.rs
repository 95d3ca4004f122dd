//! Parser for ECMAScript 5.1 source code
//!
//! Recursive descent with precedence climbing for binary expressions.
//! Automatic semicolon insertion follows the usual rules: a statement may
//! end at a `}`, at end of input, or before a token on a new line. The
//! restricted productions (`return`, `break`, `continue`, postfix `++`/`--`)
//! honor the no-line-terminator rule.
//!
//! Misplaced control transfers are rejected here, where the syntactic
//! context is known: `return` outside a function, `break`/`continue`
//! outside a loop, and jumps to undeclared labels are all SyntaxErrors.

use std::rc::Rc;

use crate::ast::{
    AssignmentExpression, AssignmentOp, BinaryExpression, BinaryOp, BlockStatement,
    BreakStatement, CallExpression, CatchClause, ConditionalExpression, ContinueStatement,
    DoWhileStatement, Expression, ExpressionStatement, ForInit, ForStatement,
    FunctionDeclaration, FunctionExpression, FunctionNode, Identifier, IfStatement,
    LabeledStatement, Literal, LiteralValue, LogicalExpression, LogicalOp, MemberExpression,
    MemberProperty, ObjectExpression, ObjectProperty, Program, ReturnStatement,
    SequenceExpression, Statement, ThrowStatement, TryStatement, UnaryExpression, UnaryOp,
    UpdateExpression, UpdateOp, VariableDeclaration, VariableDeclarator, WhileStatement,
};
use crate::error::JsError;
use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::value::{number_to_string, JsString};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    prev_end: usize,
    /// Enclosing loops within the current function body
    loop_depth: u32,
    /// Enclosing function bodies
    function_depth: u32,
    /// Labels in scope within the current function body
    labels: Vec<JsString>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            prev_end: 0,
            loop_depth: 0,
            function_depth: 0,
            labels: Vec::new(),
        }
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program, JsError> {
        let mut body = Vec::new();
        while self.current.kind != TokenKind::Eof {
            body.push(Rc::new(self.parse_statement()?));
        }
        Ok(Program { body })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Token plumbing
    // ═══════════════════════════════════════════════════════════════════

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        let peek = std::mem::replace(&mut self.peek, next);
        let current = std::mem::replace(&mut self.current, peek);
        self.prev_end = current.span.end;
        current
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.current.kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, JsError> {
        if &self.current.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {}", what)))
        }
    }

    fn error(&self, message: impl Into<String>) -> JsError {
        JsError::syntax(message, self.current.span.line, self.current.span.column)
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(start.start, self.prev_end, start.line, start.column)
    }

    fn expect_identifier(&mut self, what: &str) -> Result<JsString, JsError> {
        match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(format!("Expected {}", what))),
        }
    }

    /// Consume a statement terminator, applying automatic semicolon insertion
    fn expect_semicolon(&mut self) -> Result<(), JsError> {
        if self.eat(&TokenKind::Semicolon) {
            return Ok(());
        }
        match self.current.kind {
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ if self.current.newline_before => Ok(()),
            _ => Err(self.error("Expected ';'")),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    fn parse_statement(&mut self) -> Result<Statement, JsError> {
        match &self.current.kind {
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block_statement()?)),
            TokenKind::Var => self.parse_variable_statement(),
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => self.parse_break_statement(),
            TokenKind::Continue => self.parse_continue_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Semicolon => {
                let tok = self.advance();
                Ok(Statement::Empty(tok.span))
            }
            TokenKind::Switch => Err(self.error("'switch' statements are not supported")),
            TokenKind::With => Err(self.error("'with' statements are not supported")),
            TokenKind::Identifier(_) if self.peek.kind == TokenKind::Colon => {
                self.parse_labeled_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Statement in single-statement position (loop body, if branch,
    /// labeled body). Function declarations only live in statement lists.
    fn parse_nested_statement(&mut self) -> Result<Statement, JsError> {
        if self.current.kind == TokenKind::Function {
            return Err(self.error(
                "Function declarations are only allowed at the top level or inside a function body",
            ));
        }
        self.parse_statement()
    }

    fn parse_block_statement(&mut self) -> Result<BlockStatement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut body = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            if self.current.kind == TokenKind::Eof {
                return Err(self.error("Expected '}'"));
            }
            body.push(Rc::new(self.parse_statement()?));
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(BlockStatement {
            body,
            span: self.span_from(start),
        })
    }

    fn parse_variable_statement(&mut self) -> Result<Statement, JsError> {
        let decl = self.parse_variable_declaration()?;
        self.expect_semicolon()?;
        Ok(Statement::Variable(decl))
    }

    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::Var, "'var'")?;
        let mut declarations = Vec::new();
        loop {
            let decl_start = self.current.span;
            let name = self.expect_identifier("variable name")?;
            let init = if self.eat(&TokenKind::Eq) {
                Some(Rc::new(self.parse_assignment_expression()?))
            } else {
                None
            };
            declarations.push(VariableDeclarator {
                name,
                init,
                span: self.span_from(decl_start),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(VariableDeclaration {
            declarations,
            span: self.span_from(start),
        })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::Function, "'function'")?;
        let name = self.expect_identifier("function name")?;
        let params = self.parse_function_params()?;
        let body = self.parse_function_body()?;
        let span = self.span_from(start);
        Ok(Statement::Function(FunctionDeclaration {
            function: Rc::new(FunctionNode {
                name: Some(name),
                params,
                body,
                span,
            }),
            span,
        }))
    }

    fn parse_function_params(&mut self) -> Result<Vec<JsString>, JsError> {
        self.expect(&TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if self.current.kind != TokenKind::RParen {
            loop {
                params.push(self.expect_identifier("parameter name")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(params)
    }

    /// Parse a function body; loops and labels of the enclosing function
    /// are not visible inside it
    fn parse_function_body(&mut self) -> Result<Vec<Rc<Statement>>, JsError> {
        let saved_loops = std::mem::take(&mut self.loop_depth);
        let saved_labels = std::mem::take(&mut self.labels);
        self.function_depth += 1;

        let result = self.parse_block_statement();

        self.function_depth -= 1;
        self.loop_depth = saved_loops;
        self.labels = saved_labels;
        Ok(result?.body)
    }

    fn parse_if_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::If, "'if'")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let test = Rc::new(self.parse_expression()?);
        self.expect(&TokenKind::RParen, "')'")?;
        let consequent = Rc::new(self.parse_nested_statement()?);
        let alternate = if self.eat(&TokenKind::Else) {
            Some(Rc::new(self.parse_nested_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        }))
    }

    fn parse_loop_body(&mut self) -> Result<Rc<Statement>, JsError> {
        self.loop_depth += 1;
        let body = self.parse_nested_statement();
        self.loop_depth -= 1;
        Ok(Rc::new(body?))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::While, "'while'")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let test = Rc::new(self.parse_expression()?);
        self.expect(&TokenKind::RParen, "')'")?;
        let body = self.parse_loop_body()?;
        Ok(Statement::While(WhileStatement {
            test,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::Do, "'do'")?;
        let body = self.parse_loop_body()?;
        self.expect(&TokenKind::While, "'while'")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let test = Rc::new(self.parse_expression()?);
        self.expect(&TokenKind::RParen, "')'")?;
        // The trailing semicolon after do-while is optional
        self.eat(&TokenKind::Semicolon);
        Ok(Statement::DoWhile(DoWhileStatement {
            body,
            test,
            span: self.span_from(start),
        }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::For, "'for'")?;
        self.expect(&TokenKind::LParen, "'('")?;

        let init = if self.current.kind == TokenKind::Semicolon {
            None
        } else if self.current.kind == TokenKind::Var {
            let decl = self.parse_variable_declaration()?;
            if self.current.kind == TokenKind::In {
                return Err(self.error("'for-in' loops are not supported"));
            }
            Some(ForInit::Variable(Rc::new(Statement::Variable(decl))))
        } else {
            Some(ForInit::Expression(Rc::new(self.parse_expression()?)))
        };
        if self.current.kind == TokenKind::In {
            return Err(self.error("'for-in' loops are not supported"));
        }
        self.expect(&TokenKind::Semicolon, "';'")?;

        let test = if self.current.kind == TokenKind::Semicolon {
            None
        } else {
            Some(Rc::new(self.parse_expression()?))
        };
        self.expect(&TokenKind::Semicolon, "';'")?;

        let update = if self.current.kind == TokenKind::RParen {
            None
        } else {
            Some(Rc::new(self.parse_expression()?))
        };
        self.expect(&TokenKind::RParen, "')'")?;

        let body = self.parse_loop_body()?;
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::Try, "'try'")?;
        let block = Rc::new(self.parse_block_statement()?);

        let handler = if self.current.kind == TokenKind::Catch {
            let catch_start = self.current.span;
            self.advance();
            self.expect(&TokenKind::LParen, "'('")?;
            let param = self.expect_identifier("catch parameter")?;
            self.expect(&TokenKind::RParen, "')'")?;
            let body = Rc::new(self.parse_block_statement()?);
            Some(Rc::new(CatchClause {
                param,
                body,
                span: self.span_from(catch_start),
            }))
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(Rc::new(self.parse_block_statement()?))
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
            span: self.span_from(start),
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        if self.function_depth == 0 {
            return Err(self.error("Illegal return statement"));
        }
        self.expect(&TokenKind::Return, "'return'")?;
        let argument = if matches!(
            self.current.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) || self.current.newline_before
        {
            None
        } else {
            Some(Rc::new(self.parse_expression()?))
        };
        self.expect_semicolon()?;
        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_jump_label(&mut self) -> Result<Option<JsString>, JsError> {
        if self.current.newline_before {
            return Ok(None);
        }
        match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Some(name))
            }
            _ => Ok(None),
        }
    }

    fn parse_break_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::Break, "'break'")?;
        let label = self.parse_jump_label()?;
        match &label {
            Some(name) => {
                if !self.labels.contains(name) {
                    return Err(self.error(format!("Undefined label '{}'", name)));
                }
            }
            None => {
                if self.loop_depth == 0 {
                    return Err(self.error("Illegal break statement"));
                }
            }
        }
        self.expect_semicolon()?;
        Ok(Statement::Break(BreakStatement {
            label,
            span: self.span_from(start),
        }))
    }

    fn parse_continue_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::Continue, "'continue'")?;
        if self.loop_depth == 0 {
            return Err(self.error("Illegal continue statement"));
        }
        let label = self.parse_jump_label()?;
        if let Some(name) = &label {
            if !self.labels.contains(name) {
                return Err(self.error(format!("Undefined label '{}'", name)));
            }
        }
        self.expect_semicolon()?;
        Ok(Statement::Continue(ContinueStatement {
            label,
            span: self.span_from(start),
        }))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::Throw, "'throw'")?;
        if self.current.newline_before {
            return Err(self.error("Illegal newline after throw"));
        }
        let argument = Rc::new(self.parse_expression()?);
        self.expect_semicolon()?;
        Ok(Statement::Throw(ThrowStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_labeled_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        let label = self.expect_identifier("label")?;
        self.expect(&TokenKind::Colon, "':'")?;
        if self.labels.contains(&label) {
            return Err(self.error(format!("Label '{}' has already been declared", label)));
        }
        self.labels.push(label.clone());
        let body = self.parse_nested_statement();
        self.labels.pop();
        Ok(Statement::Labeled(LabeledStatement {
            label,
            body: Rc::new(body?),
            span: self.span_from(start),
        }))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        let expression = Rc::new(self.parse_expression()?);
        self.expect_semicolon()?;
        Ok(Statement::Expression(ExpressionStatement {
            expression,
            span: self.span_from(start),
        }))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════

    /// Comma-sequence expression
    fn parse_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let first = self.parse_assignment_expression()?;
        if self.current.kind != TokenKind::Comma {
            return Ok(first);
        }
        let mut expressions = vec![Rc::new(first)];
        while self.eat(&TokenKind::Comma) {
            expressions.push(Rc::new(self.parse_assignment_expression()?));
        }
        Ok(Expression::Sequence(SequenceExpression {
            expressions,
            span: self.span_from(start),
        }))
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let left = self.parse_conditional_expression()?;

        let operator = match self.current.kind {
            TokenKind::Eq => AssignmentOp::Assign,
            TokenKind::PlusEq => AssignmentOp::AddAssign,
            TokenKind::MinusEq => AssignmentOp::SubAssign,
            TokenKind::StarEq => AssignmentOp::MulAssign,
            TokenKind::SlashEq => AssignmentOp::DivAssign,
            TokenKind::PercentEq => AssignmentOp::ModAssign,
            TokenKind::LtLtEq => AssignmentOp::LShiftAssign,
            TokenKind::GtGtEq => AssignmentOp::RShiftAssign,
            TokenKind::GtGtGtEq => AssignmentOp::URShiftAssign,
            TokenKind::AmpEq => AssignmentOp::BitAndAssign,
            TokenKind::PipeEq => AssignmentOp::BitOrAssign,
            TokenKind::CaretEq => AssignmentOp::BitXorAssign,
            _ => return Ok(left),
        };
        if !is_assignment_target(&left) {
            return Err(self.error("Invalid assignment target"));
        }
        self.advance();
        // Right-associative
        let value = self.parse_assignment_expression()?;
        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            target: Rc::new(left),
            value: Rc::new(value),
            span: self.span_from(start),
        }))
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let test = self.parse_binary_expression(1)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment_expression()?;
        self.expect(&TokenKind::Colon, "':'")?;
        let alternate = self.parse_assignment_expression()?;
        Ok(Expression::Conditional(ConditionalExpression {
            test: Rc::new(test),
            consequent: Rc::new(consequent),
            alternate: Rc::new(alternate),
            span: self.span_from(start),
        }))
    }

    fn parse_binary_expression(&mut self, min_prec: u8) -> Result<Expression, JsError> {
        let start = self.current.span;
        let mut left = self.parse_unary_expression()?;

        loop {
            let Some((prec, op)) = binary_precedence(&self.current.kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            // Left-associative: the right side binds one level tighter
            let right = self.parse_binary_expression(prec + 1)?;
            let span = self.span_from(start);
            left = match op {
                BinaryOrLogical::Binary(operator) => Expression::Binary(BinaryExpression {
                    operator,
                    left: Rc::new(left),
                    right: Rc::new(right),
                    span,
                }),
                BinaryOrLogical::Logical(operator) => Expression::Logical(LogicalExpression {
                    operator,
                    left: Rc::new(left),
                    right: Rc::new(right),
                    span,
                }),
            };
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let operator = match self.current.kind {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance();
            let argument = self.parse_unary_expression()?;
            return Ok(Expression::Unary(UnaryExpression {
                operator,
                argument: Rc::new(argument),
                span: self.span_from(start),
            }));
        }

        match self.current.kind {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let operator = if self.current.kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance();
                let argument = self.parse_unary_expression()?;
                if !is_assignment_target(&argument) {
                    return Err(self.error("Invalid update target"));
                }
                Ok(Expression::Update(UpdateExpression {
                    operator,
                    prefix: true,
                    argument: Rc::new(argument),
                    span: self.span_from(start),
                }))
            }
            TokenKind::Delete => Err(self.error("'delete' is not supported")),
            _ => self.parse_postfix_expression(),
        }
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let expr = self.parse_left_hand_side_expression()?;
        // Restricted production: no line terminator before postfix ++/--
        if !self.current.newline_before
            && matches!(
                self.current.kind,
                TokenKind::PlusPlus | TokenKind::MinusMinus
            )
        {
            let operator = if self.current.kind == TokenKind::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            self.advance();
            if !is_assignment_target(&expr) {
                return Err(self.error("Invalid update target"));
            }
            return Ok(Expression::Update(UpdateExpression {
                operator,
                prefix: false,
                argument: Rc::new(expr),
                span: self.span_from(start),
            }));
        }
        Ok(expr)
    }

    fn parse_left_hand_side_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let mut expr = self.parse_primary_expression()?;

        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier("property name")?;
                    expr = Expression::Member(MemberExpression {
                        object: Rc::new(expr),
                        property: MemberProperty::Identifier(name),
                        span: self.span_from(start),
                    });
                }
                TokenKind::LBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expression::Member(MemberExpression {
                        object: Rc::new(expr),
                        property: MemberProperty::Computed(Rc::new(property)),
                        span: self.span_from(start),
                    });
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut arguments = Vec::new();
                    if self.current.kind != TokenKind::RParen {
                        loop {
                            arguments.push(Rc::new(self.parse_assignment_expression()?));
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "')'")?;
                    expr = Expression::Call(CallExpression {
                        callee: Rc::new(expr),
                        arguments,
                        span: self.span_from(start),
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        match self.current.kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Number(n),
                    span: start,
                }))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::String(s),
                    span: start,
                }))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Boolean(true),
                    span: start,
                }))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Boolean(false),
                    span: start,
                }))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Null,
                    span: start,
                }))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expression::Identifier(Identifier { name, span: start }))
            }
            TokenKind::Function => self.parse_function_expression(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::LBracket => Err(self.error("Array literals are not supported")),
            TokenKind::This => Err(self.error("'this' is not supported")),
            TokenKind::New => Err(self.error("'new' expressions are not supported")),
            TokenKind::Invalid(c) => Err(self.error(format!("Unexpected character '{}'", c))),
            _ => Err(self.error("Unexpected token")),
        }
    }

    fn parse_function_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::Function, "'function'")?;
        let name = match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Some(name)
            }
            _ => None,
        };
        let params = self.parse_function_params()?;
        let body = self.parse_function_body()?;
        let span = self.span_from(start);
        Ok(Expression::Function(FunctionExpression {
            function: Rc::new(FunctionNode {
                name,
                params,
                body,
                span,
            }),
            span,
        }))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut properties = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            let prop_start = self.current.span;
            let key = match self.current.kind.clone() {
                TokenKind::Identifier(name) => {
                    if self.peek.kind != TokenKind::Colon
                        && (name == "get" || name == "set")
                    {
                        return Err(self.error("Getters and setters are not supported"));
                    }
                    self.advance();
                    name
                }
                TokenKind::String(s) => {
                    self.advance();
                    s
                }
                TokenKind::Number(n) => {
                    self.advance();
                    number_to_string(n)
                }
                _ => return Err(self.error("Expected property name")),
            };
            self.expect(&TokenKind::Colon, "':'")?;
            let value = Rc::new(self.parse_assignment_expression()?);
            properties.push(ObjectProperty {
                key,
                value,
                span: self.span_from(prop_start),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(Expression::Object(ObjectExpression {
            properties,
            span: self.span_from(start),
        }))
    }
}

enum BinaryOrLogical {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Binding powers for the precedence climb, loosest first
fn binary_precedence(kind: &TokenKind) -> Option<(u8, BinaryOrLogical)> {
    use BinaryOrLogical::{Binary, Logical};
    let entry = match kind {
        TokenKind::PipePipe => (1, Logical(LogicalOp::Or)),
        TokenKind::AmpAmp => (2, Logical(LogicalOp::And)),
        TokenKind::Pipe => (3, Binary(BinaryOp::BitOr)),
        TokenKind::Caret => (4, Binary(BinaryOp::BitXor)),
        TokenKind::Amp => (5, Binary(BinaryOp::BitAnd)),
        TokenKind::EqEq => (6, Binary(BinaryOp::Eq)),
        TokenKind::BangEq => (6, Binary(BinaryOp::NotEq)),
        TokenKind::EqEqEq => (6, Binary(BinaryOp::StrictEq)),
        TokenKind::BangEqEq => (6, Binary(BinaryOp::StrictNotEq)),
        TokenKind::Lt => (7, Binary(BinaryOp::Lt)),
        TokenKind::LtEq => (7, Binary(BinaryOp::LtEq)),
        TokenKind::Gt => (7, Binary(BinaryOp::Gt)),
        TokenKind::GtEq => (7, Binary(BinaryOp::GtEq)),
        TokenKind::LtLt => (8, Binary(BinaryOp::LShift)),
        TokenKind::GtGt => (8, Binary(BinaryOp::RShift)),
        TokenKind::GtGtGt => (8, Binary(BinaryOp::URShift)),
        TokenKind::Plus => (9, Binary(BinaryOp::Add)),
        TokenKind::Minus => (9, Binary(BinaryOp::Sub)),
        TokenKind::Star => (10, Binary(BinaryOp::Mul)),
        TokenKind::Slash => (10, Binary(BinaryOp::Div)),
        TokenKind::Percent => (10, Binary(BinaryOp::Mod)),
        _ => return None,
    };
    Some(entry)
}

/// Identifiers and member expressions are the only valid lvalues
fn is_assignment_target(expr: &Expression) -> bool {
    matches!(expr, Expression::Identifier(_) | Expression::Member(_))
}
