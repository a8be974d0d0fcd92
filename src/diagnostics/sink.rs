// src/diagnostics/sink.rs

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tracing::error;

/// Line written after every captured process.
pub const BLOCK_SEPARATOR: &str = "------------------";

/// Render the labelled block for one process.
pub fn render_block(pid: u32, stacks: &str) -> String {
    let mut block = format!("Process {pid}\n{stacks}");
    if !stacks.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(BLOCK_SEPARATOR);
    block.push('\n');
    block
}

/// A writer that can be cut back to an earlier length.
///
/// Used to drop the fragment a failed `write_all` may leave behind.
pub trait Rollback {
    /// Current length of everything written so far.
    fn committed_len(&mut self) -> io::Result<u64>;

    /// Discard everything after `len`.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl Rollback for File {
    fn committed_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

impl Rollback for Vec<u8> {
    fn committed_len(&mut self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.truncate(len as usize);
        Ok(())
    }
}

/// Append-only destination for captured stack dumps.
///
/// A block either lands whole or not at all: if writing it fails part-way,
/// the writer is rolled back to where the block started.
#[derive(Debug)]
pub struct DiagnosticSink<W: Write + Rollback> {
    writer: W,
    blocks: usize,
}

impl DiagnosticSink<File> {
    /// Open (creating if needed) `path` for appending.
    pub fn open_append(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Rollback> DiagnosticSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, blocks: 0 }
    }

    pub fn append_block(&mut self, pid: u32, stacks: &str) -> io::Result<()> {
        let block = render_block(pid, stacks);
        let start = self.writer.committed_len()?;

        if let Err(e) = self.writer.write_all(block.as_bytes()) {
            if let Err(rollback) = self.writer.truncate_to(start) {
                error!(pid, error = %rollback, "could not discard partial stack dump block");
            }
            return Err(e);
        }

        self.blocks += 1;
        Ok(())
    }

    /// Number of blocks written through this sink.
    pub fn blocks_written(&self) -> usize {
        self.blocks
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
