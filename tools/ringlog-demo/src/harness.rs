//! Scripted sessions against a live ring
//!
//! The harness owns the ring and reports every step to `out`. Reporting goes
//! through [`viz::render`] and the peek accessors only.

use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use ringlog::{viz, RingLog};

use crate::config::RingConfig;
use crate::message::{DebugRecord, Level};

/// Twenty characters of padding used by the streaming session
pub const PAD: &str = "[..................]";

pub struct Harness<W: Write> {
    ring: RingLog<Vec<u8>>,
    width: usize,
    allow_overwrite: bool,
    out: W,
}

impl<W: Write> Harness<W> {
    pub fn new(config: &RingConfig, out: W) -> Result<Self> {
        Ok(Self {
            ring: RingLog::with_capacity(config.capacity)?,
            width: config.width,
            allow_overwrite: config.allow_overwrite,
            out,
        })
    }

    #[cfg(test)]
    pub fn ring(&self) -> &RingLog<Vec<u8>> {
        &self.ring
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    fn show(&mut self) -> Result<()> {
        writeln!(self.out, "{}\n", viz::render(&self.ring, self.width))?;
        Ok(())
    }

    /// Enqueue one debug record
    pub fn log(&mut self, level: Level, message: &str, max_len: usize) -> Result<()> {
        let record = DebugRecord::new(level, message, max_len);
        let bytes = record.encode()?;
        match self.ring.enqueue(&bytes, self.allow_overwrite) {
            Ok(evicted) => writeln!(
                self.out,
                "Enqueued a message of {} bytes (overwrote {})",
                bytes.len(),
                evicted
            )?,
            Err(err) => writeln!(self.out, "{} {}", "Dropped message:".red(), err)?,
        }
        self.show()
    }

    /// Dequeue every readable record, oldest first
    pub fn drain_records(&mut self) -> Result<Vec<DebugRecord>> {
        let mut records = Vec::new();
        while let Some(bytes) = self.ring.pop() {
            let record = DebugRecord::decode(&bytes)?;
            writeln!(
                self.out,
                "[{:>5}] {}.{:03} {}",
                record.level,
                record.timestamp,
                (record.fracsec * 1000.0) as u32,
                record.message
            )?;
            self.show()?;
            records.push(record);
        }
        Ok(records)
    }

    /// Enqueue a whole item, or one chunk of an open item
    pub fn write(&mut self, text: &str) -> Result<bool> {
        let written = match self.ring.enqueue(text.as_bytes(), self.allow_overwrite) {
            Ok(evicted) => {
                writeln!(
                    self.out,
                    "Enqueued {} bytes (overwrote {})",
                    text.len(),
                    evicted
                )?;
                true
            }
            Err(err) => {
                writeln!(self.out, "{} {}", "Failed to enqueue:".red(), err)?;
                false
            }
        };
        self.show()?;
        Ok(written)
    }

    pub fn open(&mut self) -> Result<bool> {
        let opened = match self.ring.open_append(self.allow_overwrite) {
            Ok(evicted) => {
                writeln!(self.out, "Opened a new item (overwrote {})", evicted)?;
                true
            }
            Err(err) => {
                writeln!(self.out, "{} {}", "Failed to open:".red(), err)?;
                false
            }
        };
        self.show()?;
        Ok(opened)
    }

    pub fn close(&mut self) -> Result<bool> {
        let closed = match self.ring.close_append() {
            Ok(()) => {
                writeln!(self.out, "Closed")?;
                true
            }
            Err(err) => {
                writeln!(self.out, "{} {}", "Failed to close:".red(), err)?;
                false
            }
        };
        self.show()?;
        Ok(closed)
    }

    /// Dequeue one item as text
    pub fn read_one(&mut self) -> Result<Option<String>> {
        let Some(len) = self.ring.peek_len() else {
            writeln!(self.out, "Nothing to read")?;
            return Ok(None);
        };

        writeln!(self.out, "Length to read: {}", len)?;
        let text = self
            .ring
            .pop()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        if let Some(text) = &text {
            writeln!(self.out, "{}", text)?;
        }
        self.show()?;
        Ok(text)
    }

    /// Dequeue every readable item as text
    pub fn read_all(&mut self) -> Result<Vec<String>> {
        let mut items = Vec::new();
        while self.ring.peek_len().is_some() {
            if let Some(text) = self.read_one()? {
                items.push(text);
            }
        }
        Ok(items)
    }
}

/// Queue a run of debug messages, then drain them
pub fn run_messages<W: Write>(harness: &mut Harness<W>, max_len: usize) -> Result<Vec<DebugRecord>> {
    let script = [
        (Level::Info, "bytes 0"),
        (Level::Info, "bytes 1 lorem ipsum dolor sit amet"),
        (Level::Debug, "bytes 2"),
        (Level::Warning, "bytes 3 but also something longer"),
        (Level::Debug, "bytes 4"),
        (Level::Info, "bytes 6"),
        (Level::Error, "bytes 7 and some stuff"),
        (Level::Debug, "bytes 8 but why"),
        (Level::Info, "bytes 9"),
    ];
    for (level, message) in script {
        harness.log(level, message, max_len)?;
    }
    harness.drain_records()
}

/// Streaming session: fill, open, append chunks, close, drain; then repeat
/// with reads interleaved between the chunks of an open item
pub fn run_partial<W: Write>(harness: &mut Harness<W>) -> Result<Vec<String>> {
    let mut read = Vec::new();

    for n in 1..=3 {
        harness.write(&format!("Buffer Fill {n}{PAD}"))?;
    }
    harness.open()?;
    harness.write(PAD)?;
    harness.write(PAD)?;
    harness.write("hello ")?;
    harness.write("world!")?;
    for _ in 0..5 {
        harness.write(PAD)?;
    }
    harness.close()?;
    read.extend(harness.read_all()?);

    for n in 1..=3 {
        harness.write(&format!("Buffer Fill {n}{PAD}"))?;
    }
    harness.open()?;
    for _ in 0..3 {
        harness.write(PAD)?;
        read.extend(harness.read_one()?);
    }
    harness.write(PAD)?;
    read.extend(harness.read_one()?);
    harness.close()?;
    read.extend(harness.read_all()?);

    Ok(read)
}
