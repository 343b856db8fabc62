//! Leaf sub-entities of a [`crate::record::Record`] (§3, §4.4): each
//! provides `size`/`write`/`read` against the shared compressor, plus
//! a JSON shape documented in §6.
//!
//! These mirror the shape of the teacher's `MX`/`SOA`/`SRV` structs
//! (plain fields, no bitfields) rather than the mixed bitfield variant
//! also present in the retrieved snapshot.

use crate::compress::{Compressor, Decompressor};
use crate::errors::ParseError;
use crate::io::{write_blob, RecordReadExt};
use crate::target::{self, Target};
use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::{TryFrom, TryInto};
use std::io::Cursor;
use std::str::FromStr;

/// An SRV-like service record. `{service, protocol, priority, weight,
/// target, port}`; "SMTP" iff `service="smtp" ∧ protocol="tcp"` (§3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Service {
    pub service: String,
    pub protocol: String,
    pub priority: u8,
    pub weight: u8,
    pub target: Target,
    pub port: u16,
}

impl Service {
    pub fn is_smtp(&self) -> bool {
        self.service == "smtp" && self.protocol == "tcp"
    }

    pub fn learn(&self, c: &mut Compressor) {
        c.add(&self.service);
        c.add(&self.protocol);
        self.target.learn(c);
    }

    /// `getSize = size(service) + size(protocol) + 2 + target.getSize + 2`.
    pub fn size(&self, c: &Compressor) -> usize {
        c.size(&self.service) + c.size(&self.protocol) + 2 + target::full_size(&self.target, c) + 2
    }

    pub fn write(&self, buf: &mut Vec<u8>, c: &Compressor) -> Result<(), ParseError> {
        c.write(buf, &self.service)?;
        c.write(buf, &self.protocol)?;
        buf.push(self.priority);
        buf.push(self.weight);
        target::write_full(buf, &self.target, c)?;
        buf.extend_from_slice(&self.port.to_be_bytes());
        Ok(())
    }

    pub fn read(cur: &mut Cursor<&[u8]>, dc: &Decompressor) -> Result<Service, ParseError> {
        let service = dc.read(cur)?;
        let protocol = dc.read(cur)?;
        let priority = cur.read_u8_checked()?;
        let weight = cur.read_u8_checked()?;
        let target = target::read_full(cur, dc)?;
        let port = cur.read_u16be()?;
        Ok(Service {
            service,
            protocol,
            priority,
            weight,
            target,
            port,
        })
    }
}

impl Serialize for Service {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        ServiceJson::from(self).serialize(s)
    }
}

impl<'de> Deserialize<'de> for Service {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let j = ServiceJson::deserialize(d)?;
        j.try_into().map_err(serde::de::Error::custom)
    }
}

#[derive(Serialize, Deserialize)]
struct ServiceJson {
    service: String,
    protocol: String,
    priority: u8,
    weight: u8,
    target: String,
    port: u16,
}

impl From<&Service> for ServiceJson {
    fn from(s: &Service) -> ServiceJson {
        ServiceJson {
            service: s.service.clone(),
            protocol: s.protocol.clone(),
            priority: s.priority,
            weight: s.weight,
            target: s.target.to_string(),
            port: s.port,
        }
    }
}

impl TryFrom<ServiceJson> for Service {
    type Error = ParseError;

    fn try_from(j: ServiceJson) -> Result<Service, ParseError> {
        Ok(Service {
            service: j.service,
            protocol: j.protocol,
            priority: j.priority,
            weight: j.weight,
            target: j
                .target
                .parse()
                .map_err(|_| ParseError::InvalidTarget(j.target.clone()))?,
            port: j.port,
        })
    }
}

/// `{currency, address}`. When `currency="hsk"` the address is the
/// native versioned-hash form; JSON shape is `"{currency}:{address}"`
/// (§6), so `Addr` always round-trips through its own string parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Addr {
    pub currency: String,
    pub address: String,
}

const NATIVE_FLAG: u8 = 0x80;
const TESTNET_FLAG: u8 = 0x40;
const LEN_MASK: u8 = 0x3f;

impl Addr {
    fn is_native(&self) -> bool {
        self.currency == "hsk"
    }

    pub fn learn(&self, c: &mut Compressor) {
        if !self.is_native() {
            c.add(&self.currency);
        }
    }

    pub fn size(&self, c: &Compressor) -> usize {
        if self.is_native() {
            let (_, _, hash) = decode_native(&self.address)
                .unwrap_or((false, 0, Vec::new()));
            2 + hash.len()
        } else {
            c.size(&self.currency) + 1 + self.address.len()
        }
    }

    pub fn write(&self, buf: &mut Vec<u8>, c: &Compressor) -> Result<(), ParseError> {
        if self.is_native() {
            let (testnet, version, hash) = decode_native(&self.address)
                .map_err(|e| ParseError::AddrParse(self.address.clone(), e))?;
            if hash.len() > LEN_MASK as usize {
                return Err(ParseError::FieldTooLong(hash.len()));
            }
            let len_byte = NATIVE_FLAG | (if testnet { TESTNET_FLAG } else { 0 }) | (hash.len() as u8);
            buf.push(len_byte);
            buf.push(version);
            buf.extend_from_slice(&hash);
        } else {
            c.write(buf, &self.currency)?;
            if self.address.len() > 255 {
                return Err(ParseError::FieldTooLong(self.address.len()));
            }
            write_blob(buf, self.address.as_bytes())?;
        }
        Ok(())
    }

    pub fn read(cur: &mut Cursor<&[u8]>, dc: &Decompressor) -> Result<Addr, ParseError> {
        // Peek the first byte to tell native from ASCII form without
        // consuming the compressor's discriminator byte for the ASCII
        // path (native form never touches the compressor).
        let pos = cur.position();
        let first = cur.read_u8_checked()?;
        if first & NATIVE_FLAG != 0 {
            let testnet = first & TESTNET_FLAG != 0;
            let len = (first & LEN_MASK) as usize;
            let version = cur.read_u8_checked()?;
            let hash = cur.read_exact_vec(len)?;
            let address = encode_native(testnet, version, &hash);
            Ok(Addr {
                currency: "hsk".to_string(),
                address,
            })
        } else {
            cur.set_position(pos);
            let currency = dc.read(cur)?;
            let address_bytes = cur.read_blob()?;
            let address = String::from_utf8(address_bytes).map_err(|_| ParseError::UnexpectedEof)?;
            Ok(Addr { currency, address })
        }
    }
}

fn native_hrp(testnet: bool) -> &'static str {
    if testnet {
        "ts"
    } else {
        "hs"
    }
}

fn encode_native(testnet: bool, version: u8, hash: &[u8]) -> String {
    let mut data = vec![bech32::u5::try_from_u8(version).unwrap_or_else(|_| bech32::u5::try_from_u8(0).unwrap())];
    data.extend(hash.to_base32());
    bech32::encode(native_hrp(testnet), data, Variant::Bech32)
        .unwrap_or_else(|_| String::new())
}

fn decode_native(address: &str) -> Result<(bool, u8, Vec<u8>), String> {
    let (hrp, data, _variant) =
        bech32::decode(address).map_err(|e| format!("bech32 decode failed: {}", e))?;
    let testnet = match hrp.as_str() {
        "hs" => false,
        "ts" => true,
        other => return Err(format!("unrecognised native address hrp {:?}", other)),
    };
    if data.is_empty() {
        return Err("empty bech32 payload".to_string());
    }
    let version = data[0].to_u8();
    let hash = Vec::<u8>::from_base32(&data[1..]).map_err(|e| e.to_string())?;
    Ok((testnet, version, hash))
}

impl Serialize for Addr {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{}:{}", self.currency, self.address))
    }
}

impl<'de> Deserialize<'de> for Addr {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Addr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Addr, ParseError> {
        match s.split_once(':') {
            Some((currency, address)) => Ok(Addr {
                currency: currency.to_string(),
                address: address.to_string(),
            }),
            None => Err(ParseError::InvalidTarget(s.to_string())),
        }
    }
}

/// `{algorithm, type, fingerprint}`. Shared wire form for both `ssh`
/// and `pgp` fields (§4.4: "PGP and SSH are byte-identical in wire
/// form; they differ only by tag").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ssh {
    pub algorithm: u8,
    #[serde(rename = "type")]
    pub type_: u8,
    #[serde(with = "hex_bytes")]
    pub fingerprint: Vec<u8>,
}

impl Ssh {
    pub fn size(&self) -> usize {
        2 + 1 + self.fingerprint.len()
    }

    pub fn write(&self, buf: &mut Vec<u8>) -> Result<(), ParseError> {
        buf.push(self.algorithm);
        buf.push(self.type_);
        write_blob(buf, &self.fingerprint)
    }

    pub fn read(cur: &mut Cursor<&[u8]>) -> Result<Ssh, ParseError> {
        Ok(Ssh {
            algorithm: cur.read_u8_checked()?,
            type_: cur.read_u8_checked()?,
            fingerprint: cur.read_blob()?,
        })
    }
}

/// `{protocol, port, usage, selector, matchingType, certificate}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tls {
    pub protocol: String,
    pub port: u16,
    pub usage: u8,
    pub selector: u8,
    pub matching_type: u8,
    #[serde(with = "hex_bytes")]
    pub certificate: Vec<u8>,
}

impl Tls {
    pub fn learn(&self, c: &mut Compressor) {
        c.add(&self.protocol);
    }

    pub fn size(&self, c: &Compressor) -> usize {
        c.size(&self.protocol) + 2 + 3 + 1 + self.certificate.len()
    }

    pub fn write(&self, buf: &mut Vec<u8>, c: &Compressor) -> Result<(), ParseError> {
        c.write(buf, &self.protocol)?;
        buf.extend_from_slice(&self.port.to_be_bytes());
        buf.push(self.usage);
        buf.push(self.selector);
        buf.push(self.matching_type);
        write_blob(buf, &self.certificate)
    }

    pub fn read(cur: &mut Cursor<&[u8]>, dc: &Decompressor) -> Result<Tls, ParseError> {
        Ok(Tls {
            protocol: dc.read(cur)?,
            port: cur.read_u16be()?,
            usage: cur.read_u8_checked()?,
            selector: cur.read_u8_checked()?,
            matching_type: cur.read_u8_checked()?,
            certificate: cur.read_blob()?,
        })
    }
}

/// `{keyTag, algorithm, digestType, digest}`, wire-identical to
/// RFC 4034's DS RDATA.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    #[serde(with = "hex_bytes")]
    pub digest: Vec<u8>,
}

impl Ds {
    pub fn size(&self) -> usize {
        2 + 1 + 1 + 1 + self.digest.len()
    }

    pub fn write(&self, buf: &mut Vec<u8>) -> Result<(), ParseError> {
        buf.extend_from_slice(&self.key_tag.to_be_bytes());
        buf.push(self.algorithm);
        buf.push(self.digest_type);
        write_blob(buf, &self.digest)
    }

    pub fn read(cur: &mut Cursor<&[u8]>) -> Result<Ds, ParseError> {
        Ok(Ds {
            key_tag: cur.read_u16be()?,
            algorithm: cur.read_u8_checked()?,
            digest_type: cur.read_u8_checked()?,
            digest: cur.read_blob()?,
        })
    }
}

/// `{nid, nin}`, round-tripping via `magnet:?xt=urn:{nid}:{nin}`; `nin`
/// is hex text, stored on the wire as the raw bytes it represents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Magnet {
    pub nid: String,
    pub nin: String,
}

impl Magnet {
    pub fn learn(&self, c: &mut Compressor) {
        c.add(&self.nid);
    }

    pub fn size(&self, c: &Compressor) -> usize {
        c.size(&self.nid) + 1 + self.nin.len() / 2
    }

    pub fn write(&self, buf: &mut Vec<u8>, c: &Compressor) -> Result<(), ParseError> {
        c.write(buf, &self.nid)?;
        let raw = hex::decode(&self.nin).map_err(|e| ParseError::InvalidHex("nin", e))?;
        write_blob(buf, &raw)
    }

    pub fn read(cur: &mut Cursor<&[u8]>, dc: &Decompressor) -> Result<Magnet, ParseError> {
        let nid = dc.read(cur)?;
        let raw = cur.read_blob()?;
        Ok(Magnet {
            nid,
            nin: hex::encode(raw),
        })
    }

    pub fn to_uri(&self) -> String {
        format!("magnet:?xt=urn:{}:{}", self.nid, self.nin)
    }
}

impl FromStr for Magnet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Magnet, ParseError> {
        let rest = s
            .strip_prefix("magnet:?xt=urn:")
            .ok_or_else(|| ParseError::InvalidTarget(s.to_string()))?;
        let (nid, nin) = rest
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidTarget(s.to_string()))?;
        Ok(Magnet {
            nid: nid.to_string(),
            nin: nin.to_string(),
        })
    }
}

impl Serialize for Magnet {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_uri())
    }
}

impl<'de> Deserialize<'de> for Magnet {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Fixed 16-byte record, no compression (§4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub version: u8,
    pub size: u8,
    pub horiz_pre: u8,
    pub vert_pre: u8,
    pub latitude: u32,
    pub longitude: u32,
    pub altitude: u32,
}

impl Location {
    pub const SIZE: usize = 16;

    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.push(self.version);
        buf.push(self.size);
        buf.push(self.horiz_pre);
        buf.push(self.vert_pre);
        buf.extend_from_slice(&self.latitude.to_be_bytes());
        buf.extend_from_slice(&self.longitude.to_be_bytes());
        buf.extend_from_slice(&self.altitude.to_be_bytes());
    }

    pub fn read(cur: &mut Cursor<&[u8]>) -> Result<Location, ParseError> {
        Ok(Location {
            version: cur.read_u8_checked()?,
            size: cur.read_u8_checked()?,
            horiz_pre: cur.read_u8_checked()?,
            vert_pre: cur.read_u8_checked()?,
            latitude: cur.read_u32be()?,
            longitude: cur.read_u32be()?,
            altitude: cur.read_u32be()?,
        })
    }
}

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(d)?;
        hex::decode(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssh_round_trips() {
        let s = Ssh {
            algorithm: 1,
            type_: 2,
            fingerprint: vec![0xab, 0xcd, 0xef],
        };
        let mut buf = Vec::new();
        s.write(&mut buf).unwrap();
        assert_eq!(buf.len(), s.size());
        let mut cur = Cursor::new(buf.as_slice());
        assert_eq!(Ssh::read(&mut cur).unwrap(), s);
    }

    #[test]
    fn ds_round_trips() {
        let d = Ds {
            key_tag: 12345,
            algorithm: 8,
            digest_type: 2,
            digest: vec![1, 2, 3, 4],
        };
        let mut buf = Vec::new();
        d.write(&mut buf).unwrap();
        assert_eq!(buf.len(), d.size());
        let mut cur = Cursor::new(buf.as_slice());
        assert_eq!(Ds::read(&mut cur).unwrap(), d);
    }

    #[test]
    fn location_is_fixed_16_bytes() {
        let l = Location {
            version: 0,
            size: 0x29,
            horiz_pre: 0x16,
            vert_pre: 0x13,
            latitude: 2_147_483_648,
            longitude: 2_147_483_648,
            altitude: 10_000_000,
        };
        let mut buf = Vec::new();
        l.write(&mut buf);
        assert_eq!(buf.len(), Location::SIZE);
        let mut cur = Cursor::new(buf.as_slice());
        assert_eq!(Location::read(&mut cur).unwrap(), l);
    }

    #[test]
    fn magnet_round_trips_through_uri() {
        let m = Magnet {
            nid: "btih".to_string(),
            nin: "abcdef0123".to_string(),
        };
        assert_eq!(m.to_uri(), "magnet:?xt=urn:btih:abcdef0123");
        let back: Magnet = m.to_uri().parse().unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn addr_ascii_round_trips() {
        let a = Addr {
            currency: "btc".to_string(),
            address: "1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string(),
        };
        let c = Compressor::new();
        let mut buf = Vec::new();
        a.write(&mut buf, &c).unwrap();
        let dc = Decompressor::default();
        let mut cur = Cursor::new(buf.as_slice());
        assert_eq!(Addr::read(&mut cur, &dc).unwrap(), a);
    }

    #[test]
    fn addr_native_round_trips() {
        let hash = vec![9u8; 20];
        let address = encode_native(false, 0, &hash);
        let a = Addr {
            currency: "hsk".to_string(),
            address,
        };
        let c = Compressor::new();
        let mut buf = Vec::new();
        a.write(&mut buf, &c).unwrap();
        assert_eq!(buf[0] & NATIVE_FLAG, NATIVE_FLAG);
        let dc = Decompressor::default();
        let mut cur = Cursor::new(buf.as_slice());
        assert_eq!(Addr::read(&mut cur, &dc).unwrap(), a);
    }
}
