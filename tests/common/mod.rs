#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use audiolang::ast::Program;
use audiolang::audio::{Clip, MemoryAudioBackend};
use audiolang::config::Config;
use audiolang::error::{LexError, ParseError, RuntimeError, TypeError};
use audiolang::fs::MemoryFileSystem;
use audiolang::interp::Interpreter;
use audiolang::lexer::{Lexer, Token};
use audiolang::parser::Parser;
use audiolang::types::TypeChecker;
use audiolang::value::Value;

/// Output sink the test keeps a handle to after handing it to the
/// interpreter.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, &Config::default()).tokenize()
}

pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = lex(source).expect("lexing failed");
    Parser::new(tokens).parse()
}

pub fn check(source: &str) -> Result<(), TypeError> {
    let program = parse(source).expect("parsing failed");
    TypeChecker::new().check_program(&program)
}

/// In-memory filesystem and audio store for interpreter tests.
pub struct World {
    pub fs: Rc<MemoryFileSystem>,
    pub audio: Rc<MemoryAudioBackend>,
}

impl World {
    pub fn new() -> Self {
        Self {
            fs: Rc::new(MemoryFileSystem::new()),
            audio: Rc::new(MemoryAudioBackend::new()),
        }
    }

    /// A world with one music folder holding two audio files and a
    /// stray text file.
    pub fn with_music() -> Self {
        let world = Self::new();
        world.fs.add_dir("/music");
        world.fs.add_file("/music/song.mp3");
        world.fs.add_file("/music/other.mp3");
        world.fs.add_file("/music/notes.txt");
        world.audio.insert(
            "/music/song.mp3",
            MemoryAudioBackend::stock_clip(180_000, Some("Song")),
        );
        world.audio.insert(
            "/music/other.mp3",
            MemoryAudioBackend::stock_clip(60_000, None),
        );
        world
    }

    pub fn add_clip(&self, path: &str, clip: Clip) {
        self.fs.add_file(path);
        self.audio.insert(path, clip);
    }
}

/// Runs a program against `world` after checking it, capturing stdout.
pub fn run_in(
    source: &str,
    world: &World,
    config: &Config,
    input: &[&str],
) -> (String, Result<Value, RuntimeError>) {
    let program = parse(source).expect("parsing failed");
    TypeChecker::new()
        .check_program(&program)
        .expect("type checking failed");

    let mut interpreter =
        Interpreter::with_capabilities(config, world.fs.clone(), world.audio.clone());
    let buf = SharedBuf::new();
    interpreter.set_output(Box::new(buf.clone()));
    if !input.is_empty() {
        interpreter.set_input_data(input.iter().map(|s| s.to_string()).collect());
    }
    let result = interpreter.run_program(&program);
    (buf.contents(), result)
}

pub fn run(source: &str) -> (String, Result<Value, RuntimeError>) {
    run_in(source, &World::new(), &Config::default(), &[])
}

/// Asserts the program fails at runtime and yields the error message.
pub fn run_err(source: &str) -> String {
    let (_, result) = run(source);
    result.expect_err("expected a runtime error").to_string()
}
