//! I/O helpers shared by the wire codecs.
//!
//! [`RecordReadExt`] is the extension-trait-over-`Read` idiom the teacher
//! uses for its own `DNSReadExt` (reading a DNS message off the wire),
//! applied here to the name-record wire format (§3/§4) instead: no
//! compression pointers, no qnames, just the length-prefixed and
//! fixed-width primitives `Record`/`Target`/the leaf codecs are built
//! from.
//!
//! The DNS side of this crate ([`crate::message`]) is write-only — a
//! synthesizer produces [`crate::message::Message`] values and encodes
//! them, it never parses an incoming query off the wire — so there is
//! no DNS-message read path here, unlike the teacher's `io.rs`.

use crate::errors::ParseError;
use byteorder::{ReadBytesExt, BE};
use std::io::Cursor;

/// Extensions to [`Cursor`] for reading the length-prefixed and
/// fixed-width primitives the name-record wire format is built from.
pub trait RecordReadExt {
    fn read_u8_checked(&mut self) -> Result<u8, ParseError>;
    fn read_u16be(&mut self) -> Result<u16, ParseError>;
    fn read_u32be(&mut self) -> Result<u32, ParseError>;

    /// Reads a one-byte length prefix, then that many bytes.
    fn read_blob(&mut self) -> Result<Vec<u8>, ParseError>;

    /// Reads exactly `len` bytes.
    fn read_exact_vec(&mut self, len: usize) -> Result<Vec<u8>, ParseError>;
}

impl<'a> RecordReadExt for Cursor<&'a [u8]> {
    fn read_u8_checked(&mut self) -> Result<u8, ParseError> {
        self.read_u8().map_err(|_| ParseError::UnexpectedEof)
    }

    fn read_u16be(&mut self) -> Result<u16, ParseError> {
        self.read_u16::<BE>().map_err(|_| ParseError::UnexpectedEof)
    }

    fn read_u32be(&mut self) -> Result<u32, ParseError> {
        self.read_u32::<BE>().map_err(|_| ParseError::UnexpectedEof)
    }

    fn read_blob(&mut self) -> Result<Vec<u8>, ParseError> {
        let len = self.read_u8_checked()? as usize;
        self.read_exact_vec(len)
    }

    fn read_exact_vec(&mut self, len: usize) -> Result<Vec<u8>, ParseError> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)
            .map_err(|_| ParseError::UnexpectedEof)?;
        Ok(buf)
    }
}

/// Returns the number of unread bytes remaining in a record-codec cursor.
pub fn remaining(cur: &Cursor<&[u8]>) -> usize {
    let pos = cur.position() as usize;
    cur.get_ref().len().saturating_sub(pos)
}

/// Writes a one-byte length prefix followed by `data`.
///
/// # Errors
/// Returns [`ParseError::FieldTooLong`] if `data` is longer than 255 bytes
/// (invariant 4 of the wire format).
pub fn write_blob(buf: &mut Vec<u8>, data: &[u8]) -> Result<(), ParseError> {
    if data.len() > crate::constants::MAX_FIELD_LEN {
        return Err(ParseError::FieldTooLong(data.len()));
    }
    buf.push(data.len() as u8);
    buf.extend_from_slice(data);
    Ok(())
}

/// Writes a domain name in the DNS wire label format (length-prefixed
/// labels terminated by a zero byte), ASCII-normalised via IDNA. Used by
/// [`crate::message`] when encoding a synthesized [`crate::message::Message`].
/// No compression: every name synthesized here is written out in full.
pub fn write_qname(buf: &mut Vec<u8>, domain: &str) -> Result<(), ParseError> {
    let domain = idna::domain_to_ascii(domain)
        .map_err(|_| ParseError::InvalidTarget(domain.to_string()))?;

    if !domain.is_empty() && domain != "." {
        for label in domain.split_terminator('.') {
            if label.is_empty() || label.len() > 63 {
                return Err(ParseError::InvalidTarget(domain.clone()));
            }
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
    }

    buf.push(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qname_root_is_a_single_zero_byte() {
        let mut buf = Vec::new();
        write_qname(&mut buf, ".").unwrap();
        assert_eq!(buf, vec![0u8]);
    }

    #[test]
    fn qname_writes_length_prefixed_labels() {
        let mut buf = Vec::new();
        write_qname(&mut buf, "alice.").unwrap();
        assert_eq!(buf, vec![5, b'a', b'l', b'i', b'c', b'e', 0]);
    }
}
