// loxide-vm - Bytecode compiler and virtual machine for the Loxide scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Single-pass compiler for Loxide source code.
//!
//! Tokenising, parsing, scope resolution, and bytecode emission happen
//! in one pass with no intermediate tree. Expressions are parsed with
//! a Pratt rule table ([`rules`]); each nested function gets its own
//! [`FunctionCompiler`] record on a stack so upvalue resolution can
//! walk outward through enclosing functions.
//!
//! Diagnostics print to stderr as they are found. The first error in a
//! statement sets panic mode, suppressing the cascade until the parser
//! re-synchronises at a statement boundary.

pub mod rules;

use std::fmt;
use std::rc::Rc;

use loxide_parser::{Scanner, Token, TokenKind};

use crate::chunk::{Chunk, OpCode};
use crate::object::{Heap, ObjFunction, ObjRef};
use crate::value::Value;

use rules::{rule_for, InfixRule, Precedence, PrefixRule};

/// Locals and upvalues are addressed by one byte each.
const UINT8_COUNT: usize = 256;

/// Compilation failed; the diagnostics have already been reported to
/// stderr.
#[derive(Debug, Clone, Copy)]
pub struct CompileError;

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compile error")
    }
}

impl std::error::Error for CompileError {}

/// What kind of function a compiler record is building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    Script,
    Function,
}

/// A local variable slot during compilation.
#[derive(Debug, Clone, Copy)]
struct Local<'src> {
    name: Token<'src>,
    /// Scope depth, or -1 while the initializer is still being
    /// compiled.
    depth: i32,
    /// Set when a nested function captures this local; its slot must
    /// be closed instead of popped.
    is_captured: bool,
}

/// An upvalue recorded while compiling one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CompilerUpvalue {
    /// Slot in the enclosing function's locals (`is_local`) or index
    /// into its upvalues.
    index: u8,
    is_local: bool,
}

/// Per-function compilation state. One record per function being
/// compiled; records stack up as `fun` declarations nest.
struct FunctionCompiler<'src> {
    kind: FunctionKind,
    chunk: Chunk,
    arity: u8,
    name: Option<ObjRef>,
    locals: Vec<Local<'src>>,
    upvalues: Vec<CompilerUpvalue>,
    scope_depth: i32,
}

impl<'src> FunctionCompiler<'src> {
    fn new(kind: FunctionKind, name: Option<ObjRef>) -> Self {
        // Slot 0 belongs to the function being called; give it a name
        // no identifier can collide with.
        let slot_zero = Local {
            name: Token::new(TokenKind::Identifier, "", 0),
            depth: 0,
            is_captured: false,
        };
        Self {
            kind,
            chunk: Chunk::new(),
            arity: 0,
            name,
            locals: vec![slot_zero],
            upvalues: Vec::new(),
            scope_depth: 0,
        }
    }
}

/// The single-pass compiler: token cursor, emission target, and the
/// stack of function records.
pub struct Compiler<'src, 'h> {
    scanner: Scanner<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    /// Innermost function last.
    compilers: Vec<FunctionCompiler<'src>>,
    heap: &'h mut Heap,
}

/// Compile a source string into a top-level script function.
pub fn compile(heap: &mut Heap, source: &str) -> Result<ObjRef, CompileError> {
    let placeholder = Token::new(TokenKind::Eof, "", 0);
    let mut compiler = Compiler {
        scanner: Scanner::new(source),
        current: placeholder,
        previous: placeholder,
        had_error: false,
        panic_mode: false,
        compilers: vec![FunctionCompiler::new(FunctionKind::Script, None)],
        heap,
    };

    compiler.advance();
    while !compiler.match_token(TokenKind::Eof) {
        compiler.declaration();
    }

    let (function, _upvalues) = compiler.end_compiler();
    if compiler.had_error {
        return Err(CompileError);
    }
    Ok(compiler.heap.alloc_function(function))
}

impl<'src> Compiler<'src, '_> {
    // =========================================================================
    // Token cursor
    // =========================================================================

    fn advance(&mut self) {
        self.previous = self.current;

        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            // Error tokens carry the scanner's diagnostic as their lexeme.
            let message = self.current.lexeme;
            self.error_at_current(message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;

        eprint!("[line {}] Error", token.line);
        match token.kind {
            TokenKind::Eof => eprint!(" at end"),
            // The token itself is the diagnostic; no location fragment.
            TokenKind::Error => {}
            _ => eprint!(" at '{}'", token.lexeme),
        }
        eprintln!(": {}", message);
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.previous, message);
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_at(self.current, message);
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;

        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }

            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }

            self.advance();
        }
    }

    // =========================================================================
    // Emission
    // =========================================================================

    fn compiler(&self) -> &FunctionCompiler<'src> {
        self.compilers.last().expect("no active function compiler")
    }

    fn compiler_mut(&mut self) -> &mut FunctionCompiler<'src> {
        self.compilers
            .last_mut()
            .expect("no active function compiler")
    }

    fn current_chunk(&mut self) -> &mut Chunk {
        &mut self.compiler_mut().chunk
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.current_chunk().write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op.as_byte());
    }

    fn emit_ops(&mut self, first: OpCode, second: OpCode) {
        self.emit_op(first);
        self.emit_op(second);
    }

    fn emit_op_byte(&mut self, op: OpCode, byte: u8) {
        self.emit_op(op);
        self.emit_byte(byte);
    }

    fn emit_return(&mut self) {
        self.emit_ops(OpCode::Nil, OpCode::Return);
    }

    fn make_constant(&mut self, value: Value) -> u16 {
        match self.current_chunk().add_constant(value) {
            Some(index) => index,
            None => {
                self.error("Too many constants in one chunk");
                0
            }
        }
    }

    /// Emit a constant load, choosing the wide form once the pool
    /// outgrows one-byte indices.
    fn emit_constant(&mut self, value: Value) {
        let constant = self.make_constant(value);
        if constant <= u8::MAX as u16 {
            self.emit_op_byte(OpCode::Constant, constant as u8);
        } else {
            let bytes = constant.to_be_bytes();
            self.emit_op(OpCode::ConstantLong);
            self.emit_byte(bytes[0]);
            self.emit_byte(bytes[1]);
        }
    }

    /// Intern an identifier and add it to the constant pool. Name
    /// operands are one byte wide, so the pool index must fit u8.
    fn identifier_constant(&mut self, name: Token<'src>) -> u8 {
        let interned = self.heap.intern(name.lexeme);
        let constant = self.make_constant(Value::Obj(interned));
        if constant > u8::MAX as u16 {
            self.error("Too many constants in one chunk");
            return 0;
        }
        constant as u8
    }

    /// Emit a jump with a placeholder offset, returning the offset of
    /// the operand for later patching.
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.current_chunk().code.len() - 2
    }

    /// Point the jump operand at `offset` to the current end of code.
    fn patch_jump(&mut self, offset: usize) {
        // Adjust for the two offset bytes themselves.
        let jump = self.current_chunk().code.len() - offset - 2;
        if jump > u16::MAX as usize {
            self.error("Too much code to jump over.");
        }

        let bytes = (jump as u16).to_be_bytes();
        let chunk = self.current_chunk();
        chunk.code[offset] = bytes[0];
        chunk.code[offset + 1] = bytes[1];
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::Loop);

        let offset = self.current_chunk().code.len() - loop_start + 2;
        if offset > u16::MAX as usize {
            self.error("Loop body too large.");
        }

        let bytes = (offset as u16).to_be_bytes();
        self.emit_byte(bytes[0]);
        self.emit_byte(bytes[1]);
    }

    fn end_compiler(&mut self) -> (ObjFunction, Vec<CompilerUpvalue>) {
        self.emit_return();
        let compiler = self.compilers.pop().expect("no active function compiler");
        let function = ObjFunction {
            arity: compiler.arity,
            upvalue_count: compiler.upvalues.len(),
            chunk: Rc::new(compiler.chunk),
            name: compiler.name,
        };

        #[cfg(feature = "print-code")]
        {
            if !self.had_error {
                let name = match function.name {
                    Some(name) => self.heap.string(name).chars.clone(),
                    None => String::from("<script>"),
                };
                crate::debug::disassemble_chunk(self.heap, &function.chunk, &name);
            }
        }

        (function, compiler.upvalues)
    }

    // =========================================================================
    // Scope and variable resolution
    // =========================================================================

    fn begin_scope(&mut self) {
        self.compiler_mut().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.compiler_mut().scope_depth -= 1;

        loop {
            let compiler = self.compiler();
            let Some(local) = compiler.locals.last() else {
                break;
            };
            if local.depth <= compiler.scope_depth {
                break;
            }
            let captured = local.is_captured;
            self.compiler_mut().locals.pop();
            if captured {
                self.emit_op(OpCode::CloseUpvalue);
            } else {
                self.emit_op(OpCode::Pop);
            }
        }
    }

    fn add_local(&mut self, name: Token<'src>) {
        if self.compiler().locals.len() >= UINT8_COUNT {
            self.error("Too many local variables in function.");
            return;
        }
        self.compiler_mut().locals.push(Local {
            name,
            depth: -1,
            is_captured: false,
        });
    }

    /// Record a new local in the current scope. Globals are late-bound
    /// and skip declaration entirely.
    fn declare_variable(&mut self) {
        if self.compiler().scope_depth == 0 {
            return;
        }

        let name = self.previous;
        let scope_depth = self.compiler().scope_depth;
        let duplicate = self
            .compiler()
            .locals
            .iter()
            .rev()
            .take_while(|local| local.depth == -1 || local.depth >= scope_depth)
            .any(|local| local.name.lexeme == name.lexeme);
        if duplicate {
            self.error("Already a variable with same name in this scope.");
        }

        self.add_local(name);
    }

    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::Identifier, message);

        self.declare_variable();
        if self.compiler().scope_depth > 0 {
            return 0;
        }

        self.identifier_constant(self.previous)
    }

    fn mark_initialized(&mut self) {
        let compiler = self.compiler_mut();
        if compiler.scope_depth == 0 {
            return;
        }
        let depth = compiler.scope_depth;
        if let Some(local) = compiler.locals.last_mut() {
            local.depth = depth;
        }
    }

    fn define_variable(&mut self, global: u8) {
        if self.compiler().scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_op_byte(OpCode::DefineGlobal, global);
    }

    /// Resolve a name against the locals of the function at
    /// `compiler_index`, innermost declaration first.
    fn resolve_local(&mut self, compiler_index: usize, name: Token<'src>) -> Option<u8> {
        let mut found = None;
        let mut in_own_initializer = false;

        for (slot, local) in self.compilers[compiler_index].locals.iter().enumerate().rev() {
            if local.name.lexeme == name.lexeme {
                if local.depth == -1 {
                    in_own_initializer = true;
                }
                found = Some(slot as u8);
                break;
            }
        }

        if in_own_initializer {
            self.error("Can't read local variable in its own initializer.");
        }
        found
    }

    /// Resolve a name captured from an enclosing function, registering
    /// upvalues down the compiler chain as needed.
    fn resolve_upvalue(&mut self, compiler_index: usize, name: Token<'src>) -> Option<u8> {
        if compiler_index == 0 {
            return None;
        }
        let enclosing = compiler_index - 1;

        if let Some(local) = self.resolve_local(enclosing, name) {
            self.compilers[enclosing].locals[local as usize].is_captured = true;
            return Some(self.add_upvalue(compiler_index, local, true));
        }

        if let Some(upvalue) = self.resolve_upvalue(enclosing, name) {
            return Some(self.add_upvalue(compiler_index, upvalue, false));
        }

        None
    }

    fn add_upvalue(&mut self, compiler_index: usize, index: u8, is_local: bool) -> u8 {
        // Reuse an existing descriptor for the same capture.
        for (i, upvalue) in self.compilers[compiler_index].upvalues.iter().enumerate() {
            if upvalue.index == index && upvalue.is_local == is_local {
                return i as u8;
            }
        }

        if self.compilers[compiler_index].upvalues.len() >= UINT8_COUNT {
            self.error("Too many closure variables in function.");
            return 0;
        }

        self.compilers[compiler_index]
            .upvalues
            .push(CompilerUpvalue { index, is_local });
        (self.compilers[compiler_index].upvalues.len() - 1) as u8
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let top = self.compilers.len() - 1;

        let (get_op, set_op, arg) = if let Some(slot) = self.resolve_local(top, name) {
            (OpCode::GetLocal, OpCode::SetLocal, slot)
        } else if let Some(upvalue) = self.resolve_upvalue(top, name) {
            (OpCode::GetUpvalue, OpCode::SetUpvalue, upvalue)
        } else {
            let constant = self.identifier_constant(name);
            (OpCode::GetGlobal, OpCode::SetGlobal, constant)
        };

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op_byte(set_op, arg);
        } else {
            self.emit_op_byte(get_op, arg);
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();

        let Some(prefix) = rule_for(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };

        // Assignment binds loosest, so only a target parsed at that
        // level may be followed by '='.
        let can_assign = precedence <= Precedence::Assignment;
        self.run_prefix(prefix, can_assign);

        while precedence <= rule_for(self.current.kind).precedence {
            self.advance();
            let Some(infix) = rule_for(self.previous.kind).infix else {
                break;
            };
            self.run_infix(infix);
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn run_prefix(&mut self, rule: PrefixRule, can_assign: bool) {
        match rule {
            PrefixRule::Grouping => self.grouping(),
            PrefixRule::Unary => self.unary(),
            PrefixRule::Number => self.number(),
            PrefixRule::String => self.string(),
            PrefixRule::Literal => self.literal(),
            PrefixRule::Variable => self.variable(can_assign),
        }
    }

    fn run_infix(&mut self, rule: InfixRule) {
        match rule {
            InfixRule::Binary => self.binary(),
            InfixRule::And => self.and_operator(),
            InfixRule::Or => self.or_operator(),
            InfixRule::Call => self.call(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn number(&mut self) {
        // The scanner only produces digit sequences, so this parse
        // cannot fail.
        let value: f64 = self.previous.lexeme.parse().unwrap_or_default();
        self.emit_constant(Value::Number(value));
    }

    fn string(&mut self) {
        // Trim the surrounding quotes.
        let lexeme = self.previous.lexeme;
        let contents = &lexeme[1..lexeme.len() - 1];
        let interned = self.heap.intern(contents);
        self.emit_constant(Value::Obj(interned));
    }

    fn literal(&mut self) {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            TokenKind::True => self.emit_op(OpCode::True),
            _ => unreachable!("literal rule on non-literal token"),
        }
    }

    fn variable(&mut self, can_assign: bool) {
        self.named_variable(self.previous, can_assign);
    }

    fn unary(&mut self) {
        let operator = self.previous.kind;

        // Compile the operand first; unary is right-associative.
        self.parse_precedence(Precedence::Unary);

        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!("unary rule on non-unary token"),
        }
    }

    fn binary(&mut self) {
        let operator = self.previous.kind;
        let rule = rule_for(operator);
        self.parse_precedence(rule.precedence.next());

        match operator {
            TokenKind::BangEqual => self.emit_ops(OpCode::Equal, OpCode::Not),
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_ops(OpCode::Less, OpCode::Not),
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => self.emit_ops(OpCode::Greater, OpCode::Not),
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            _ => unreachable!("binary rule on non-binary token"),
        }
    }

    /// `and` short-circuits: when the left side is falsy it stays as
    /// the result and the right side is skipped.
    fn and_operator(&mut self) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);

        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);

        self.patch_jump(end_jump);
    }

    /// `or` short-circuits: a falsy left side falls through the first
    /// jump into the right operand; anything else jumps past it.
    fn or_operator(&mut self) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);

        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);

        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn call(&mut self) {
        let arg_count = self.argument_list();
        self.emit_op_byte(OpCode::Call, arg_count);
    }

    fn argument_list(&mut self) -> u8 {
        let mut count: usize = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                self.expression();
                if count == u8::MAX as usize {
                    self.error("Can't have more than 255 arguments.");
                } else {
                    count += 1;
                }
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.");
        count as u8
    }

    // =========================================================================
    // Declarations and statements
    // =========================================================================

    fn declaration(&mut self) {
        if self.match_token(TokenKind::Fun) {
            self.fun_declaration();
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::For) {
            self.for_statement();
        } else if self.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.match_token(TokenKind::Return) {
            self.return_statement();
        } else if self.match_token(TokenKind::While) {
            self.while_statement();
        } else if self.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");

        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration");

        self.define_variable(global);
    }

    fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        // A function may refer to itself; it is usable as soon as its
        // name is declared.
        self.mark_initialized();
        self.function(FunctionKind::Function);
        self.define_variable(global);
    }

    /// Compile a function body in a fresh compiler record and emit the
    /// closure that wraps it.
    fn function(&mut self, kind: FunctionKind) {
        let name = self.heap.intern(self.previous.lexeme);
        self.compilers
            .push(FunctionCompiler::new(kind, Some(name)));
        self.begin_scope();

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.");
        if !self.check(TokenKind::RightParen) {
            loop {
                if self.compiler().arity == u8::MAX {
                    self.error_at_current("Can't have more than 255 parameters.");
                } else {
                    self.compiler_mut().arity += 1;
                }
                let constant = self.parse_variable("Expect parameter name.");
                self.define_variable(constant);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.");
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.");
        self.block();

        let (function, upvalues) = self.end_compiler();
        let function = self.heap.alloc_function(function);
        let constant = self.make_constant(Value::Obj(function));
        if constant > u8::MAX as u16 {
            self.error("Too many constants in one chunk");
        }
        self.emit_op_byte(OpCode::Closure, constant as u8);

        for upvalue in upvalues {
            self.emit_byte(if upvalue.is_local { 1 } else { 0 });
            self.emit_byte(upvalue.index);
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after statement value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        let else_jump = self.emit_jump(OpCode::Jump);

        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);

        if self.match_token(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.current_chunk().code.len();

        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
    }

    fn for_statement(&mut self) {
        // The initializer's variable is scoped to the loop.
        self.begin_scope();

        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");
        if self.match_token(TokenKind::Semicolon) {
            // No initializer.
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.current_chunk().code.len();
        let mut exit_jump = None;
        if !self.match_token(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");

            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        }

        if !self.match_token(TokenKind::RightParen) {
            // The increment textually precedes the body but runs after
            // it: jump over it now, loop back to it after the body.
            let body_jump = self.emit_jump(OpCode::Jump);
            let increment_start = self.current_chunk().code.len();
            self.expression();
            self.emit_op(OpCode::Pop);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::Pop);
        }

        self.end_scope();
    }

    fn return_statement(&mut self) {
        if self.compiler().kind == FunctionKind::Script {
            self.error("Can't return from top-level code.");
        }

        if self.match_token(TokenKind::Semicolon) {
            self.emit_return();
        } else {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after return value.");
            self.emit_op(OpCode::Return);
        }
    }
}
