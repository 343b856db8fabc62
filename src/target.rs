//! The polymorphic [`Target`] value (§4.2): a union of host/onion/name
//! kinds with a single wire form `{u8 kind}{body}`.
//!
//! The source this is redesigned from uses duck-typed predicates over a
//! loosely-typed value; here the kind byte is an exhaustive tag and also
//! doubles as the top-level record tag when the target is a host entry
//! (§3, §9 "Polymorphic Target").

use crate::constants::{self, Tag};
use crate::compress::{Compressor, Decompressor};
use crate::errors::ParseError;
use crate::io::{write_blob, RecordReadExt};
use num_traits::{FromPrimitive, ToPrimitive};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::io::Cursor;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

const ONION_V2_BODY_LEN: usize = 10;
const ONION_V2_TEXT_LEN: usize = 16;
const ONIONNG_BODY_LEN: usize = 33; // pubkey(32) + version(1); checksum is recomputed
const ONIONNG_TEXT_LEN: usize = 56;
const ONIONNG_VERSION: u8 = 3;

/// `isINET()`, `isName()`, `isTor()` in §4.2 are expressed here as
/// matches over this enum rather than predicates over a loose value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Inet4(Ipv4Addr),
    Inet6(Ipv6Addr),
    /// Raw 10-byte onion v2 service id (the SHA1-derived identifier).
    Onion([u8; ONION_V2_BODY_LEN]),
    /// 32-byte ed25519 public key + 1-byte version; the 2-byte checksum
    /// is not stored on the wire, it's recomputed when rendering text.
    OnionNG([u8; 32], u8),
    /// Name minus its `.ICANN`/`.HSK` suffix, stored *with* the suffix
    /// re-appended (e.g. `"example.com.i"`), per §3/§4.2.
    IName(String),
    HName(String),
}

impl Target {
    pub fn is_inet(&self) -> bool {
        matches!(self, Target::Inet4(_) | Target::Inet6(_))
    }

    pub fn is_name(&self) -> bool {
        matches!(self, Target::IName(_) | Target::HName(_))
    }

    pub fn is_tor(&self) -> bool {
        matches!(self, Target::Onion(_) | Target::OnionNG(_, _))
    }

    /// The tag this target occupies at the top level: for IP/onion kinds
    /// this is also the record tag used when the target is a host entry.
    pub fn tag(&self) -> Tag {
        match self {
            Target::Inet4(_) => Tag::Inet4,
            Target::Inet6(_) => Tag::Inet6,
            Target::Onion(_) => Tag::Onion,
            Target::OnionNG(_, _) => Tag::OnionNG,
            Target::IName(_) => Tag::IName,
            Target::HName(_) => Tag::HName,
        }
    }

    /// `toDNS()`: HNAME → `value + "."`; INAME → strip `.ICANN` then
    /// append `.`; INET/ONION → the target literal.
    pub fn to_dns(&self) -> String {
        match self {
            Target::HName(v) => {
                let base = v.strip_suffix(constants::HSKP).unwrap_or(v);
                format!("{}.", base)
            }
            Target::IName(v) => {
                let base = v.strip_suffix(constants::ICANNP).unwrap_or(v);
                format!("{}.", base)
            }
            _ => self.to_string(),
        }
    }

    /// `toPointer(name)`: requires an IP kind. Base58-encodes the raw
    /// address bytes and prefixes `name` with a synthetic `_` label
    /// (§4.2, §GLOSSARY "Pointer name").
    pub fn to_pointer(&self, name: &str) -> Option<String> {
        let raw: Vec<u8> = match self {
            Target::Inet4(ip) => ip.octets().to_vec(),
            Target::Inet6(ip) => ip.octets().to_vec(),
            _ => return None,
        };
        Some(format!("_{}.{}", bs58::encode(raw).into_string(), name))
    }

    fn named(base: &str, hsk: bool) -> Target {
        let suffix = if hsk { constants::HSK } else { constants::ICANN };
        let value = format!("{}.{}", base, suffix);
        if hsk {
            Target::HName(value)
        } else {
            Target::IName(value)
        }
    }

    /// Registers every string this target will emit during the encode
    /// learn phase (§4.1): only name kinds carry a compressible string.
    pub fn learn(&self, c: &mut Compressor) {
        match self {
            Target::IName(v) | Target::HName(v) => c.add(name_body(self, v)),
            _ => {}
        }
    }

    /// Size of the body alone (not including the kind byte).
    pub fn body_size(&self, c: &Compressor) -> usize {
        match self {
            Target::Inet4(_) => 4,
            Target::Inet6(ip) => ipv6_size(ip),
            Target::Onion(_) => ONION_V2_BODY_LEN,
            Target::OnionNG(_, _) => ONIONNG_BODY_LEN,
            Target::IName(v) | Target::HName(v) => c.size(name_body(self, v)),
        }
    }

    pub fn write_body(&self, buf: &mut Vec<u8>, c: &Compressor) -> Result<(), ParseError> {
        match self {
            Target::Inet4(ip) => {
                buf.extend_from_slice(&ip.octets());
                Ok(())
            }
            Target::Inet6(ip) => {
                ipv6_write(buf, ip);
                Ok(())
            }
            Target::Onion(body) => {
                buf.extend_from_slice(body);
                Ok(())
            }
            Target::OnionNG(pubkey, version) => {
                buf.extend_from_slice(pubkey);
                buf.push(*version);
                Ok(())
            }
            Target::IName(v) | Target::HName(v) => c.write(buf, name_body(self, v)),
        }
    }

    /// Reads the body for a target of kind `tag`. `tag` must be one of
    /// the six target-carrying tags; other tags are a caller bug.
    pub fn read_body(
        tag: Tag,
        cur: &mut Cursor<&[u8]>,
        dc: &Decompressor,
    ) -> Result<Target, ParseError> {
        match tag {
            Tag::Inet4 => {
                let bytes = cur.read_exact_vec(4)?;
                Ok(Target::Inet4(Ipv4Addr::new(
                    bytes[0], bytes[1], bytes[2], bytes[3],
                )))
            }
            Tag::Inet6 => Ok(Target::Inet6(ipv6_read(cur)?)),
            Tag::Onion => {
                let bytes = cur.read_exact_vec(ONION_V2_BODY_LEN)?;
                let mut body = [0u8; ONION_V2_BODY_LEN];
                body.copy_from_slice(&bytes);
                Ok(Target::Onion(body))
            }
            Tag::OnionNG => {
                let bytes = cur.read_exact_vec(ONIONNG_BODY_LEN)?;
                let mut pubkey = [0u8; 32];
                pubkey.copy_from_slice(&bytes[..32]);
                Ok(Target::OnionNG(pubkey, bytes[32]))
            }
            Tag::IName => Ok(Target::named(&dc.read(cur)?, false)),
            Tag::HName => Ok(Target::named(&dc.read(cur)?, true)),
            _ => Err(ParseError::HostTagOnName),
        }
    }
}

/// The string a name-kind target contributes to the compressor: the
/// value minus its `.ICANN`/`.HSK` suffix (§3: "compressed name minus
/// the suffix").
fn name_body<'a>(t: &Target, v: &'a str) -> &'a str {
    match t {
        Target::HName(_) => v.strip_suffix(constants::HSKP).unwrap_or(v),
        Target::IName(_) => v.strip_suffix(constants::ICANNP).unwrap_or(v),
        _ => v,
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Inet4(ip) => write!(f, "{}", ip),
            Target::Inet6(ip) => write!(f, "{}", ip),
            Target::Onion(body) => {
                write!(f, "{}.onion", onion_v2_encode(body))
            }
            Target::OnionNG(pubkey, version) => {
                write!(f, "{}.onion", onionng_encode(pubkey, *version))
            }
            Target::IName(v) | Target::HName(v) => write!(f, "{}", v),
        }
    }
}

impl FromStr for Target {
    type Err = ParseError;

    /// Dispatches on inferred address type (§4.2).
    fn from_str(s: &str) -> Result<Target, ParseError> {
        if let Ok(ip) = s.parse::<Ipv4Addr>() {
            return Ok(Target::Inet4(ip));
        }
        if let Ok(ip) = s.parse::<Ipv6Addr>() {
            return Ok(Target::Inet6(ip));
        }
        if let Some(onion) = s.strip_suffix(".onion").or_else(|| s.strip_suffix(".ONION")) {
            if onion.len() == ONION_V2_TEXT_LEN {
                if let Some(body) = onion_v2_decode(onion) {
                    return Ok(Target::Onion(body));
                }
            } else if onion.len() == ONIONNG_TEXT_LEN {
                if let Some((pubkey, version)) = onionng_decode(onion) {
                    return Ok(Target::OnionNG(pubkey, version));
                }
            }
            return Err(ParseError::InvalidTarget(s.to_string()));
        }

        // Name-kind targets: recognise already-suffixed short forms
        // (".i"/".h"), the long human forms (".ICANN"/".HSK"), and
        // otherwise default to ICANN (§4.2 last bullet).
        if let Some(base) = s.strip_suffix(constants::ICANNP) {
            return Ok(Target::named(base, false));
        }
        if let Some(base) = s.strip_suffix(constants::HSKP) {
            return Ok(Target::named(base, true));
        }
        if let Some(base) = strip_suffix_ignore_case(s, ".ICANN") {
            return Ok(Target::named(base, false));
        }
        if let Some(base) = strip_suffix_ignore_case(s, ".HSK") {
            return Ok(Target::named(base, true));
        }

        let base = s.strip_suffix('.').unwrap_or(s);
        Ok(Target::named(base, false))
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() >= suffix.len() && s[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix) {
        Some(&s[..s.len() - suffix.len()])
    } else {
        None
    }
}

fn onion_v2_encode(body: &[u8; ONION_V2_BODY_LEN]) -> String {
    base32::encode(base32::Alphabet::RFC4648 { padding: false }, body).to_lowercase()
}

fn onion_v2_decode(text: &str) -> Option<[u8; ONION_V2_BODY_LEN]> {
    let bytes = base32::decode(base32::Alphabet::RFC4648 { padding: false }, &text.to_uppercase())?;
    if bytes.len() != ONION_V2_BODY_LEN {
        return None;
    }
    let mut body = [0u8; ONION_V2_BODY_LEN];
    body.copy_from_slice(&bytes);
    Some(body)
}

/// Tor v3 checksum: `H(".onion checksum" || pubkey || version)[:2]`,
/// `H` = SHA3-256. Recomputed on render since the wire form drops it.
fn onionng_checksum(pubkey: &[u8; 32], version: u8) -> [u8; 2] {
    let mut hasher = Sha3_256::new();
    hasher.update(b".onion checksum");
    hasher.update(pubkey);
    hasher.update([version]);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

fn onionng_encode(pubkey: &[u8; 32], version: u8) -> String {
    let checksum = onionng_checksum(pubkey, version);
    let mut full = Vec::with_capacity(35);
    full.extend_from_slice(pubkey);
    full.extend_from_slice(&checksum);
    full.push(version);
    base32::encode(base32::Alphabet::RFC4648 { padding: false }, &full).to_lowercase()
}

fn onionng_decode(text: &str) -> Option<([u8; 32], u8)> {
    let bytes = base32::decode(base32::Alphabet::RFC4648 { padding: false }, &text.to_uppercase())?;
    if bytes.len() != 35 {
        return None;
    }
    let version = bytes[34];
    if version != ONIONNG_VERSION {
        return None;
    }
    let mut pubkey = [0u8; 32];
    pubkey.copy_from_slice(&bytes[..32]);
    Some((pubkey, version))
}

/// IPv6 wire form: a one-byte length, a u16 bitmap of which of the 16
/// byte positions hold a nonzero value, then just those bytes (§9
/// "IPv6 compression" redesign note — a bitmap replaces the source's
/// run-of-zeros scheme).
fn ipv6_size(ip: &Ipv6Addr) -> usize {
    2 + ip.octets().iter().filter(|&&b| b != 0).count()
}

fn ipv6_write(buf: &mut Vec<u8>, ip: &Ipv6Addr) {
    let octets = ip.octets();
    let mut mask: u16 = 0;
    for (i, &b) in octets.iter().enumerate() {
        if b != 0 {
            mask |= 1 << i;
        }
    }
    buf.extend_from_slice(&mask.to_be_bytes());
    for &b in octets.iter() {
        if b != 0 {
            buf.push(b);
        }
    }
}

fn ipv6_read(cur: &mut Cursor<&[u8]>) -> Result<Ipv6Addr, ParseError> {
    let mask = cur.read_u16be()?;
    let mut octets = [0u8; 16];
    for i in 0..16 {
        if mask & (1 << i) != 0 {
            octets[i] = cur.read_u8_checked()?;
        }
    }
    Ok(Ipv6Addr::from(octets))
}

/// Writes a full `Target`: `{u8 kind}{body}`. Used anywhere a `Target`
/// field stands on its own rather than being implied by a host/canonical
/// tag already written by the caller (e.g. `ns`, `DELEGATE`'s payload).
pub fn write_full(buf: &mut Vec<u8>, t: &Target, c: &Compressor) -> Result<(), ParseError> {
    buf.push(t.tag().to_u8().expect("Tag always fits in u8"));
    t.write_body(buf, c)
}

pub fn full_size(t: &Target, c: &Compressor) -> usize {
    1 + t.body_size(c)
}

/// Reads a full `Target` as written by [`write_full`]. Does not
/// restrict which kind comes back; callers that need the name-kind-only
/// restriction (CANONICAL/DELEGATE, §3) check `is_name()` themselves
/// and raise [`ParseError::HostTagOnName`].
pub fn read_full(cur: &mut Cursor<&[u8]>, dc: &Decompressor) -> Result<Target, ParseError> {
    let byte = cur.read_u8_checked()?;
    let tag = Tag::from_u8(byte).ok_or(ParseError::HostTagOnName)?;
    Target::read_body(tag, cur, dc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_round_trips() {
        let t: Target = "1.2.3.4".parse().unwrap();
        assert_eq!(t, Target::Inet4(Ipv4Addr::new(1, 2, 3, 4)));
        assert_eq!(t.to_string(), "1.2.3.4");
    }

    fn roundtrip_ipv6(ip: Ipv6Addr) {
        let c = Compressor::new();
        let mut buf = Vec::new();
        ipv6_write(&mut buf, &ip);
        assert_eq!(buf.len(), ipv6_size(&ip));
        let mut cur = Cursor::new(buf.as_slice());
        assert_eq!(ipv6_read(&mut cur).unwrap(), ip);
        let _ = &c;
    }

    #[test]
    fn ipv6_zero_run_compresses() {
        // Mostly-zero address: loopback ::1.
        roundtrip_ipv6(Ipv6Addr::LOCALHOST);
    }

    #[test]
    fn ipv6_dense_round_trips() {
        roundtrip_ipv6(Ipv6Addr::new(
            0x2001, 0x0db8, 0x1234, 0x5678, 0x9abc, 0xdef0, 0x1111, 0x2222,
        ));
    }

    #[test]
    fn onion_v2_round_trips() {
        let s = "xxxxxxxxxxxxxxxx.onion";
        let t: Target = s.parse().unwrap();
        assert!(matches!(t, Target::Onion(_)));
        assert_eq!(t.to_string(), s);
    }

    #[test]
    fn onionng_round_trips() {
        let pubkey = [7u8; 32];
        let t = Target::OnionNG(pubkey, ONIONNG_VERSION);
        let text = t.to_string();
        assert!(text.ends_with(".onion"));
        let back: Target = text.parse().unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn other_names_default_to_icann() {
        let t: Target = "example.com.".parse().unwrap();
        assert_eq!(t, Target::IName("example.com.i".to_string()));
        assert_eq!(t.to_dns(), "example.com.");
    }

    #[test]
    fn bare_label_without_a_dot_also_defaults_to_icann() {
        let t: Target = "example".parse().unwrap();
        assert_eq!(t, Target::IName("example.i".to_string()));
    }

    #[test]
    fn hsk_suffix_preserved() {
        let t: Target = "bob.h".parse().unwrap();
        assert_eq!(t, Target::HName("bob.h".to_string()));
        assert_eq!(t.to_dns(), "bob.");
    }

    #[test]
    fn to_pointer_wraps_ipv4() {
        let t: Target = "1.2.3.4".parse().unwrap();
        let ptr = t.to_pointer("example.").unwrap();
        assert!(ptr.starts_with('_'));
        assert!(ptr.ends_with(".example."));
    }

    #[test]
    fn name_kind_has_no_pointer() {
        let t: Target = "example.com.".parse().unwrap();
        assert!(t.to_pointer("example.").is_none());
    }
}
