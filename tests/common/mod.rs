//! Common test utilities

#![allow(dead_code)]

use buggery::lang::{load_program, Program};
use buggery::runner::{Context, Engine, Verbosity};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// In-memory output sink that tests can read back after the engine wrote to it
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Parse and check a program, panicking on any error
pub fn load(source: &str) -> Program {
    load_program(source).unwrap_or_else(|e| panic!("program failed to load: {}", e))
}

/// A quiet engine whose task output goes to the returned buffer
pub fn engine(program: &Program) -> (Engine<'_>, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let ctx = Context::new()
        .with_verbosity(Verbosity::Quiet)
        .with_output(Box::new(buffer.clone()));
    (Engine::with_context(program, ctx), buffer)
}

/// Create a temporary directory holding a Buggeryfile
pub fn create_source_file(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let source_path = temp_dir.path().join("Buggeryfile");
    fs::write(&source_path, content).unwrap();
    (temp_dir, source_path)
}
