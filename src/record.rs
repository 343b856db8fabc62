//! The `Record` aggregate (§3, §4.3): a per-name record set, its wire
//! encode/decode, and its JSON shape (§6).

use crate::compress::{Compressor, Decompressor};
use crate::constants::Tag;
use crate::errors::ParseError;
use crate::fields::{Addr, Ds, Location, Magnet, Service, Ssh, Tls};
use crate::io::{remaining, write_blob, RecordReadExt};
use crate::target::{self, Target};
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// A fully decoded per-name record set. Immutable once built; encode and
/// DNS synthesis both take `&self` (§5: "no shared mutable state").
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    pub ttl: u32,
    pub hosts: Vec<Target>,
    pub canonical: Option<Target>,
    pub delegate: Option<Target>,
    pub ns: Vec<Target>,
    pub service: Vec<Service>,
    pub url: Vec<String>,
    pub email: Vec<String>,
    pub text: Vec<String>,
    pub location: Vec<Location>,
    pub magnet: Vec<Magnet>,
    pub ds: Vec<Ds>,
    pub tls: Vec<Tls>,
    pub ssh: Vec<Ssh>,
    pub pgp: Vec<Ssh>,
    pub addr: Vec<Addr>,
    pub extra: Vec<Extra>,
}

/// An unrecognised top-level tag preserved verbatim (§3 invariant 6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extra {
    pub tag: u8,
    pub data: Vec<u8>,
}

impl Record {
    /// Builds the compressor and runs the learn phase over every string
    /// this record will emit (§4.3 step 1).
    fn build_compressor(&self) -> Compressor {
        let mut c = Compressor::new();
        for h in &self.hosts {
            h.learn(&mut c);
        }
        if let Some(t) = &self.canonical {
            t.learn(&mut c);
        }
        if let Some(t) = &self.delegate {
            t.learn(&mut c);
        }
        for t in &self.ns {
            t.learn(&mut c);
        }
        for s in &self.service {
            s.learn(&mut c);
        }
        for s in &self.url {
            c.add(s);
        }
        for s in &self.email {
            c.add(s);
        }
        for s in &self.text {
            c.add(s);
        }
        for m in &self.magnet {
            m.learn(&mut c);
        }
        for t in &self.tls {
            t.learn(&mut c);
        }
        for a in &self.addr {
            a.learn(&mut c);
        }
        c
    }

    /// Encodes this record into its compressed wire form (§4.3).
    pub fn encode(&self) -> Result<Vec<u8>, ParseError> {
        let c = self.build_compressor();

        let mut buf = Vec::new();
        buf.push(0u8); // version
        buf.extend_from_slice(&((self.ttl >> 6) as u16).to_be_bytes());
        c.write_table(&mut buf)?;

        for h in &self.hosts {
            target::write_full(&mut buf, h, &c)?;
        }
        if let Some(t) = &self.canonical {
            target::write_full(&mut buf, t, &c)?;
        }
        if let Some(t) = &self.delegate {
            buf.push(Tag::Delegate as u8);
            target::write_full(&mut buf, t, &c)?;
        }
        for t in &self.ns {
            buf.push(Tag::Ns as u8);
            target::write_full(&mut buf, t, &c)?;
        }
        for s in &self.service {
            buf.push(Tag::Service as u8);
            s.write(&mut buf, &c)?;
        }
        for s in &self.url {
            buf.push(Tag::Url as u8);
            c.write(&mut buf, s)?;
        }
        for s in &self.email {
            buf.push(Tag::Email as u8);
            c.write(&mut buf, s)?;
        }
        for s in &self.text {
            buf.push(Tag::Text as u8);
            c.write(&mut buf, s)?;
        }
        for l in &self.location {
            buf.push(Tag::Location as u8);
            l.write(&mut buf);
        }
        for m in &self.magnet {
            buf.push(Tag::Magnet as u8);
            m.write(&mut buf, &c)?;
        }
        for d in &self.ds {
            buf.push(Tag::Ds as u8);
            d.write(&mut buf)?;
        }
        for t in &self.tls {
            buf.push(Tag::Tls as u8);
            t.write(&mut buf, &c)?;
        }
        for s in &self.ssh {
            buf.push(Tag::Ssh as u8);
            s.write(&mut buf)?;
        }
        for p in &self.pgp {
            buf.push(Tag::Pgp as u8);
            p.write(&mut buf)?;
        }
        for a in &self.addr {
            buf.push(Tag::Addr as u8);
            a.write(&mut buf, &c)?;
        }
        for e in &self.extra {
            buf.push(e.tag);
            write_blob(&mut buf, &e.data)?;
        }

        Ok(buf)
    }

    /// Decodes a record from its compressed wire form (§4.3).
    pub fn decode(bytes: &[u8]) -> Result<Record, ParseError> {
        let mut cur = Cursor::new(bytes);

        let version = cur.read_u8_checked()?;
        if version != 0 {
            return Err(ParseError::UnknownVersion(version));
        }
        let ttl = (cur.read_u16be()? as u32) << 6;
        let dc = Decompressor::read_table(&mut cur)?;

        let mut r = Record {
            ttl,
            ..Record::default()
        };

        while remaining(&cur) > 0 {
            let byte = cur.read_u8_checked()?;
            match Tag::from_u8(byte) {
                Some(tag @ (Tag::Inet4 | Tag::Inet6 | Tag::Onion | Tag::OnionNG)) => {
                    r.hosts.push(Target::read_body(tag, &mut cur, &dc)?);
                }
                Some(tag @ (Tag::IName | Tag::HName)) => {
                    if r.canonical.is_some() {
                        return Err(ParseError::DuplicateCanonical);
                    }
                    r.canonical = Some(Target::read_body(tag, &mut cur, &dc)?);
                }
                Some(Tag::Canonical) => {
                    if r.canonical.is_some() {
                        return Err(ParseError::DuplicateCanonical);
                    }
                    let t = target::read_full(&mut cur, &dc)?;
                    if !t.is_name() {
                        return Err(ParseError::HostTagOnName);
                    }
                    r.canonical = Some(t);
                }
                Some(Tag::Delegate) => {
                    if r.delegate.is_some() {
                        return Err(ParseError::DuplicateDelegate);
                    }
                    let t = target::read_full(&mut cur, &dc)?;
                    if !t.is_name() {
                        return Err(ParseError::HostTagOnName);
                    }
                    r.delegate = Some(t);
                }
                Some(Tag::Ns) => r.ns.push(target::read_full(&mut cur, &dc)?),
                Some(Tag::Service) => r.service.push(Service::read(&mut cur, &dc)?),
                Some(Tag::Url) => r.url.push(dc.read(&mut cur)?),
                Some(Tag::Email) => r.email.push(dc.read(&mut cur)?),
                Some(Tag::Text) => r.text.push(dc.read(&mut cur)?),
                Some(Tag::Location) => r.location.push(Location::read(&mut cur)?),
                Some(Tag::Magnet) => r.magnet.push(Magnet::read(&mut cur, &dc)?),
                Some(Tag::Ds) => r.ds.push(Ds::read(&mut cur)?),
                Some(Tag::Tls) => r.tls.push(Tls::read(&mut cur, &dc)?),
                Some(Tag::Ssh) => r.ssh.push(Ssh::read(&mut cur)?),
                Some(Tag::Pgp) => r.pgp.push(Ssh::read(&mut cur)?),
                Some(Tag::Addr) => r.addr.push(Addr::read(&mut cur, &dc)?),
                None => {
                    let data = cur.read_blob()?;
                    r.extra.push(Extra { tag: byte, data });
                }
            }
        }

        Ok(r)
    }
}

/// JSON shape (§6): arrays omitted when empty, `canonical`/`delegate`
/// omitted when unset. `name` is caller context for `toDNS`, not part
/// of the record's own state, so it has no place in this shape.
#[derive(Serialize, Deserialize)]
struct RecordJson {
    version: u8,
    ttl: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    hosts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    canonical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    delegate: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    ns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    service: Vec<Service>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    url: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    email: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    text: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    location: Vec<Location>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    magnet: Vec<Magnet>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    ds: Vec<Ds>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    tls: Vec<Tls>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    ssh: Vec<Ssh>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pgp: Vec<Ssh>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    addr: Vec<Addr>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    extra: Vec<ExtraJson>,
}

#[derive(Serialize, Deserialize)]
struct ExtraJson {
    #[serde(rename = "type")]
    type_: u8,
    #[serde(with = "crate::fields::hex_bytes")]
    data: Vec<u8>,
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let j = RecordJson {
            version: 0,
            ttl: self.ttl,
            hosts: self.hosts.iter().map(|t| t.to_string()).collect(),
            canonical: self.canonical.as_ref().map(|t| t.to_string()),
            delegate: self.delegate.as_ref().map(|t| t.to_string()),
            ns: self.ns.iter().map(|t| t.to_string()).collect(),
            service: self.service.clone(),
            url: self.url.clone(),
            email: self.email.clone(),
            text: self.text.clone(),
            location: self.location.clone(),
            magnet: self.magnet.clone(),
            ds: self.ds.clone(),
            tls: self.tls.clone(),
            ssh: self.ssh.clone(),
            pgp: self.pgp.clone(),
            addr: self.addr.clone(),
            extra: self
                .extra
                .iter()
                .map(|e| ExtraJson {
                    type_: e.tag,
                    data: e.data.clone(),
                })
                .collect(),
        };
        j.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let j = RecordJson::deserialize(d)?;
        if j.version != 0 {
            return Err(serde::de::Error::custom(ParseError::UnknownVersion(
                j.version,
            )));
        }
        let parse_target = |s: String| -> Result<Target, D::Error> {
            s.parse().map_err(|_| serde::de::Error::custom(ParseError::InvalidTarget(s)))
        };
        Ok(Record {
            ttl: j.ttl,
            hosts: j
                .hosts
                .into_iter()
                .map(parse_target)
                .collect::<Result<_, _>>()?,
            canonical: j.canonical.map(parse_target).transpose()?,
            delegate: j.delegate.map(parse_target).transpose()?,
            ns: j.ns.into_iter().map(parse_target).collect::<Result<_, _>>()?,
            service: j.service,
            url: j.url,
            email: j.email,
            text: j.text,
            location: j.location,
            magnet: j.magnet,
            ds: j.ds,
            tls: j.tls,
            ssh: j.ssh,
            pgp: j.pgp,
            addr: j.addr,
            extra: j
                .extra
                .into_iter()
                .map(|e| Extra {
                    tag: e.type_,
                    data: e.data,
                })
                .collect(),
        })
    }
}
