// loxide-parser - Scanner for the Loxide scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # loxide-parser
//!
//! Lexical analysis for the Loxide scripting language.
//! Produces a lazy stream of tokens borrowing from the source string;
//! the syntactic grammar lives in the single-pass compiler in
//! `loxide-vm`.

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
