// loxide-vm - Bytecode compiler and virtual machine for the Loxide scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode compiler and stack-based virtual machine for Loxide.
//!
//! The pipeline is single-pass: [`compiler::compile`] scans, parses,
//! and emits bytecode in one traversal of the source (no AST), and
//! [`vm::VM`] executes the resulting chunks on a value stack with call
//! frames, closures, and interned strings.

pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod object;
pub mod table;
pub mod value;
pub mod vm;

pub use chunk::{Chunk, OpCode};
pub use compiler::{compile, CompileError};
pub use object::{Heap, Obj, ObjRef};
pub use table::Table;
pub use value::Value;
pub use vm::{InterpretError, RuntimeError, FRAMES_MAX, VM};
