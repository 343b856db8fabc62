//! Dictionary-based string compressor/decompressor shared across a single
//! name record's fields (§4.1).
//!
//! Usage mirrors the two-phase protocol spec.md describes: every string
//! that will be serialized is `add`ed during a learn pass (sizing), then
//! the compressor is asked to `write_table` once and `write` each string
//! occurrence during the emit pass. The reference/literal discriminator
//! isn't constrained beyond `read(write(s)) == s`; this crate uses a
//! one-byte tag (0 = inline literal, 1 = table reference) because the
//! table itself is capped at 255 entries (a `u8` count prefix), so an
//! index always fits in a single byte too.

use crate::errors::ParseError;
use crate::io::{write_blob, RecordReadExt};
use std::collections::HashMap;
use std::io::Cursor;

const LITERAL: u8 = 0;
const REFERENCE: u8 = 1;

/// Builds the per-record symbol table during the learn phase, then emits
/// compressed string references during the write phase.
#[derive(Debug, Default)]
pub struct Compressor {
    table: Vec<String>,
    index: HashMap<String, usize>,
}

impl Compressor {
    pub fn new() -> Compressor {
        Compressor::default()
    }

    /// Adds `s` to the symbol table if it isn't already present. Duplicates
    /// do not add a new entry (invariant: each distinct string gets exactly
    /// one table slot, in first-seen order).
    pub fn add(&mut self, s: &str) {
        if !self.index.contains_key(s) {
            self.index.insert(s.to_string(), self.table.len());
            self.table.push(s.to_string());
        }
    }

    /// The number of bytes [`Compressor::write`] will emit for `s` at emit
    /// time: a reference if `s` was added, otherwise an inline literal.
    pub fn size(&self, s: &str) -> usize {
        match self.index.get(s) {
            Some(_) => 1 + 1,           // discriminator + u8 index
            None => 1 + 1 + s.len(),    // discriminator + length prefix + bytes
        }
    }

    /// The byte size of the table section [`Compressor::write_table`] will
    /// emit.
    pub fn get_size(&self) -> usize {
        1 + self
            .table
            .iter()
            .map(|s| 1 + s.len())
            .sum::<usize>()
    }

    /// Writes the symbol table: a one-byte count, then each entry as a
    /// length-prefixed string, in insertion order.
    pub fn write_table(&self, buf: &mut Vec<u8>) -> Result<(), ParseError> {
        if self.table.len() > 255 {
            return Err(ParseError::FieldTooLong(self.table.len()));
        }
        buf.push(self.table.len() as u8);
        for s in &self.table {
            write_blob(buf, s.as_bytes())?;
        }
        Ok(())
    }

    /// Writes a compressed occurrence of `s`: a reference if it's in the
    /// table, otherwise an inline literal.
    pub fn write(&self, buf: &mut Vec<u8>, s: &str) -> Result<(), ParseError> {
        match self.index.get(s) {
            Some(&idx) => {
                buf.push(REFERENCE);
                buf.push(idx as u8);
            }
            None => {
                buf.push(LITERAL);
                write_blob(buf, s.as_bytes())?;
            }
        }
        Ok(())
    }
}

/// Reads the symbol table at the head of a record's body, then resolves
/// compressed string references against it.
#[derive(Debug, Default)]
pub struct Decompressor {
    table: Vec<String>,
}

impl Decompressor {
    /// Reads the table section written by [`Compressor::write_table`].
    pub fn read_table(cur: &mut Cursor<&[u8]>) -> Result<Decompressor, ParseError> {
        let count = cur.read_u8_checked()? as usize;
        let mut table = Vec::with_capacity(count);
        for _ in 0..count {
            let blob = cur.read_blob()?;
            let s = String::from_utf8(blob).map_err(|_| ParseError::UnexpectedEof)?;
            table.push(s);
        }
        Ok(Decompressor { table })
    }

    /// Reads one compressed string occurrence written by [`Compressor::write`].
    pub fn read(&self, cur: &mut Cursor<&[u8]>) -> Result<String, ParseError> {
        let disc = cur.read_u8_checked()?;
        match disc {
            LITERAL => {
                let blob = cur.read_blob()?;
                String::from_utf8(blob).map_err(|_| ParseError::UnexpectedEof)
            }
            REFERENCE => {
                let idx = cur.read_u8_checked()? as usize;
                self.table
                    .get(idx)
                    .cloned()
                    .ok_or(ParseError::BadTableReference(idx))
            }
            _ => Err(ParseError::UnexpectedEof),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuse_beats_naive_encoding() {
        let s = "0123456789"; // 10 bytes
        let mut c = Compressor::new();
        c.add(s);
        c.add(s);
        c.add(s);

        let mut buf = Vec::new();
        c.write_table(&mut buf).unwrap();
        for _ in 0..3 {
            c.write(&mut buf, s).unwrap();
        }

        let naive = 3 * (1 + s.len());
        assert!(
            buf.len() + 2 * (1 + s.len()) <= naive,
            "expected at least two reuses worth of savings: got {} naive {}",
            buf.len(),
            naive
        );
    }

    #[test]
    fn round_trips_through_table_and_reference() {
        let mut c = Compressor::new();
        c.add("example.i");
        c.add("other");

        let mut buf = Vec::new();
        c.write_table(&mut buf).unwrap();
        c.write(&mut buf, "example.i").unwrap();
        c.write(&mut buf, "other").unwrap();
        c.write(&mut buf, "not-added").unwrap();

        let mut cur = Cursor::new(buf.as_slice());
        let dc = Decompressor::read_table(&mut cur).unwrap();
        assert_eq!(dc.read(&mut cur).unwrap(), "example.i");
        assert_eq!(dc.read(&mut cur).unwrap(), "other");
        assert_eq!(dc.read(&mut cur).unwrap(), "not-added");
    }

    #[test]
    fn empty_table_is_one_byte() {
        let c = Compressor::new();
        assert_eq!(c.get_size(), 1);

        let mut buf = Vec::new();
        c.write_table(&mut buf).unwrap();
        assert_eq!(buf, vec![0u8]);
    }
}
