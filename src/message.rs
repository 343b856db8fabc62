//! DNS message representation and wire encoding (§4.5, §6).
//!
//! Adapted from the teacher's `types.rs`/`dns.rs`/`display.rs`: same
//! header layout, same `QR`/`Opcode`/`Rcode`/`Type`/`Class` enums, same
//! bit-packing in `to_vec`. Two differences follow directly from this
//! crate's narrower job:
//!
//! - This crate only ever *produces* messages (the synthesizer turns a
//!   `Record` plus a query name/qtype into a `Message`); nothing here
//!   parses an incoming query off the wire, so there's no `MessageParser`
//!   and no compression-pointer reading.
//! - The teacher's per-answer struct is called `Record`; that name is
//!   taken here by [`crate::record::Record`] (the name-registry
//!   aggregate), so the DNS answer/authority/additional entry is named
//!   [`RR`] instead.

use crate::errors::ParseError;
use crate::fields;
use crate::io::write_qname;
use num_derive::{FromPrimitive, ToPrimitive};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use strum_macros::{Display, EnumString};

/// A DNS message: a header, a question section, and three RR sections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    pub id: u16,
    pub rd: bool,
    pub tc: bool,
    pub aa: bool,
    pub opcode: Opcode,
    pub qr: QR,
    pub rcode: Rcode,
    pub cd: bool,
    pub ad: bool,
    pub z: bool,
    pub ra: bool,

    pub questions: Vec<Question>,
    pub answers: Vec<RR>,
    pub authority: Vec<RR>,
    pub additional: Vec<RR>,

    pub extension: Option<Extension>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Question {
    pub name: String,
    pub r#type: Type,
    pub class: Class,
}

/// One resource record in an answer/authority/additional section.
#[derive(Clone, Debug, PartialEq)]
pub struct RR {
    pub name: String,
    pub class: Class,
    pub ttl: u32,
    pub resource: Resource,
}

impl RR {
    pub fn r#type(&self) -> Type {
        self.resource.r#type()
    }
}

/// EDNS(0) extension record, as defined by rfc6891.
#[derive(Clone, Debug, PartialEq)]
pub struct Extension {
    pub payload_size: u16,
    pub extend_rcode: u8,
    pub version: u8,
    pub dnssec_ok: bool,
}

impl Default for Extension {
    fn default() -> Self {
        Extension {
            payload_size: 4096,
            extend_rcode: 0,
            version: 0,
            dnssec_ok: false,
        }
    }
}

impl Extension {
    /// `edns0(4096, do=true)`, as every `toDNS` response sets (§4.5).
    pub fn edns0(payload_size: u16, dnssec_ok: bool) -> Extension {
        Extension {
            payload_size,
            dnssec_ok,
            ..Extension::default()
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        buf.push(0); // root domain
        buf.extend_from_slice(&(Type::Opt as u16).to_be_bytes());
        buf.extend_from_slice(&self.payload_size.to_be_bytes());
        buf.push(self.extend_rcode);
        buf.push(self.version);

        let mut b = 0u8;
        if self.dnssec_ok {
            b |= 0b1000_0000;
        }
        buf.push(b);
        buf.push(0);

        buf.extend_from_slice(&0u16.to_be_bytes()); // rdlength: no options
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QR {
    Query,
    Response,
}

impl Default for QR {
    fn default() -> Self {
        QR::Query
    }
}

impl QR {
    fn to_bool(self) -> bool {
        matches!(self, QR::Response)
    }
}

#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u8)]
pub enum Opcode {
    Query = 0,
    IQuery = 1,
    Status = 2,
    Notify = 4,
    Update = 5,
    DSO = 6,
}

impl Default for Opcode {
    fn default() -> Self {
        Opcode::Query
    }
}

#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u16)]
pub enum Rcode {
    NoError = 0,
    FormErr = 1,
    ServFail = 2,
    NXDomain = 3,
    NotImp = 4,
    Refused = 5,
}

impl Default for Rcode {
    fn default() -> Self {
        Rcode::NoError
    }
}

/// Resource record type codes this crate synthesizes, per §4.5's
/// per-qtype dispatch list, plus `OPT`/`ANY` as pseudo-types.
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, ToPrimitive, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u16)]
pub enum Type {
    A = 1,
    NS = 2,
    CNAME = 5,
    SOA = 6,
    MX = 15,
    TXT = 16,
    AAAA = 28,
    LOC = 29,
    SRV = 33,
    DNAME = 39,
    Opt = 41,
    DS = 43,
    TLSA = 52,
    OPENPGPKEY = 61,
    ANY = 255,
}

impl Default for Type {
    fn default() -> Self {
        Type::ANY
    }
}

#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq, Eq)]
#[repr(u16)]
pub enum Class {
    #[strum(serialize = "IN")]
    Internet = 1,
    #[strum(serialize = "*")]
    Any = 255,
}

impl Default for Class {
    fn default() -> Self {
        Class::Internet
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Soa {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mx {
    pub preference: u16,
    pub exchange: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Srv {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub name: String,
}

/// RDATA for every type this crate's synthesizer emits (§4.5).
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Resource {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    Ns(String),
    Cname(String),
    Dname(String),
    Soa(Soa),
    Mx(Mx),
    Srv(Srv),
    /// A single TXT RRset: one or more character-strings.
    Txt(Vec<Vec<u8>>),
    Loc(fields::Location),
    Ds(fields::Ds),
    Tlsa(fields::Tls),
    OpenPgpKey(Vec<u8>),
    Opt,
    Any,
}

impl Resource {
    pub fn r#type(&self) -> Type {
        match self {
            Resource::A(_) => Type::A,
            Resource::AAAA(_) => Type::AAAA,
            Resource::Ns(_) => Type::NS,
            Resource::Cname(_) => Type::CNAME,
            Resource::Dname(_) => Type::DNAME,
            Resource::Soa(_) => Type::SOA,
            Resource::Mx(_) => Type::MX,
            Resource::Srv(_) => Type::SRV,
            Resource::Txt(_) => Type::TXT,
            Resource::Loc(_) => Type::LOC,
            Resource::Ds(_) => Type::DS,
            Resource::Tlsa(_) => Type::TLSA,
            Resource::OpenPgpKey(_) => Type::OPENPGPKEY,
            Resource::Opt => Type::Opt,
            Resource::Any => Type::ANY,
        }
    }

    fn write_rdata(&self, buf: &mut Vec<u8>) -> Result<(), ParseError> {
        match self {
            Resource::A(ip) => buf.extend_from_slice(&ip.octets()),
            Resource::AAAA(ip) => buf.extend_from_slice(&ip.octets()),
            Resource::Ns(name) | Resource::Cname(name) | Resource::Dname(name) => {
                write_qname(buf, name)?
            }
            Resource::Soa(soa) => {
                write_qname(buf, &soa.mname)?;
                write_qname(buf, &soa.rname)?;
                buf.extend_from_slice(&soa.serial.to_be_bytes());
                buf.extend_from_slice(&soa.refresh.to_be_bytes());
                buf.extend_from_slice(&soa.retry.to_be_bytes());
                buf.extend_from_slice(&soa.expire.to_be_bytes());
                buf.extend_from_slice(&soa.minimum.to_be_bytes());
            }
            Resource::Mx(mx) => {
                buf.extend_from_slice(&mx.preference.to_be_bytes());
                write_qname(buf, &mx.exchange)?;
            }
            Resource::Srv(srv) => {
                buf.extend_from_slice(&srv.priority.to_be_bytes());
                buf.extend_from_slice(&srv.weight.to_be_bytes());
                buf.extend_from_slice(&srv.port.to_be_bytes());
                write_qname(buf, &srv.name)?;
            }
            Resource::Txt(strings) => {
                for s in strings {
                    if s.len() > 255 {
                        return Err(ParseError::FieldTooLong(s.len()));
                    }
                    buf.push(s.len() as u8);
                    buf.extend_from_slice(s);
                }
            }
            Resource::Loc(loc) => loc.write(buf),
            Resource::Ds(ds) => ds.write(buf)?,
            Resource::Tlsa(tls) => {
                buf.push(tls.usage);
                buf.push(tls.selector);
                buf.push(tls.matching_type);
                buf.extend_from_slice(&tls.certificate);
            }
            Resource::OpenPgpKey(key) => buf.extend_from_slice(key),
            Resource::Opt | Resource::Any => {}
        }
        Ok(())
    }
}

impl Default for Message {
    fn default() -> Self {
        Message {
            id: 0,
            rd: false,
            tc: false,
            aa: false,
            opcode: Opcode::Query,
            qr: QR::Query,
            rcode: Rcode::NoError,
            cd: false,
            ad: false,
            z: false,
            ra: false,
            questions: Vec::new(),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            extension: None,
        }
    }
}

impl Message {
    pub fn add_question(&mut self, name: &str, r#type: Type, class: Class) {
        self.questions.push(Question {
            name: name.to_string(),
            r#type,
            class,
        });
    }

    pub fn add_extension(&mut self, ext: Extension) {
        self.extension = Some(ext);
    }

    /// Encodes this message as defined by rfc1035, plus the EDNS(0)
    /// pseudo-record in the additional section if set.
    pub fn to_vec(&self) -> Result<Vec<u8>, ParseError> {
        let mut out = Vec::with_capacity(512);

        out.extend_from_slice(&self.id.to_be_bytes());

        let mut b = 0u8;
        if self.qr.to_bool() {
            b |= 0b1000_0000;
        }
        b |= ((self.opcode as u8) << 3) & 0b0111_1000;
        if self.aa {
            b |= 0b0000_0100;
        }
        if self.tc {
            b |= 0b0000_0010;
        }
        if self.rd {
            b |= 0b0000_0001;
        }
        out.push(b);

        let mut b = 0u8;
        if self.ra {
            b |= 0b1000_0000;
        }
        if self.z {
            b |= 0b0100_0000;
        }
        if self.ad {
            b |= 0b0010_0000;
        }
        if self.cd {
            b |= 0b0001_0000;
        }
        b |= (self.rcode as u16 as u8) & 0b0000_1111;
        out.push(b);

        let ar_count = self.additional.len() as u16 + self.extension.is_some() as u16;

        out.extend_from_slice(&(self.questions.len() as u16).to_be_bytes());
        out.extend_from_slice(&(self.answers.len() as u16).to_be_bytes());
        out.extend_from_slice(&(self.authority.len() as u16).to_be_bytes());
        out.extend_from_slice(&ar_count.to_be_bytes());

        for q in &self.questions {
            write_qname(&mut out, &q.name)?;
            out.extend_from_slice(&(q.r#type as u16).to_be_bytes());
            out.extend_from_slice(&(q.class as u16).to_be_bytes());
        }

        for rr in self
            .answers
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
        {
            write_qname(&mut out, &rr.name)?;
            out.extend_from_slice(&(rr.r#type() as u16).to_be_bytes());
            out.extend_from_slice(&(rr.class as u16).to_be_bytes());
            out.extend_from_slice(&rr.ttl.to_be_bytes());

            let mut rdata = Vec::new();
            rr.resource.write_rdata(&mut rdata)?;
            out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
            out.extend_from_slice(&rdata);
        }

        if let Some(e) = &self.extension {
            e.write(&mut out);
        }

        Ok(out)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            ";; opcode: {}, status: {}, id: {}",
            self.opcode, self.rcode, self.id
        )?;
        writeln!(
            f,
            ";; flags: qr={} aa={} rd={} ra={} ad={}",
            self.qr.to_bool(),
            self.aa,
            self.rd,
            self.ra,
            self.ad
        )?;
        for q in &self.questions {
            writeln!(f, ";; QUESTION: {} {} {}", q.name, q.class, q.r#type)?;
        }
        for rr in &self.answers {
            writeln!(f, ";; ANSWER: {}", rr)?;
        }
        for rr in &self.authority {
            writeln!(f, ";; AUTHORITY: {}", rr)?;
        }
        for rr in &self.additional {
            writeln!(f, ";; ADDITIONAL: {}", rr)?;
        }
        Ok(())
    }
}

impl fmt::Display for RR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{name:<20} {ttl:>6} {class:4} {type:10} {resource}",
            name = self.name,
            ttl = self.ttl,
            class = self.class,
            r#type = self.r#type(),
            resource = self.resource,
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::A(ip) => ip.fmt(f),
            Resource::AAAA(ip) => ip.fmt(f),
            Resource::Ns(name) | Resource::Cname(name) | Resource::Dname(name) => name.fmt(f),
            Resource::Soa(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            Resource::Mx(mx) => write!(f, "{} {}", mx.preference, mx.exchange),
            Resource::Srv(srv) => write!(f, "{} {} {} {}", srv.priority, srv.weight, srv.port, srv.name),
            Resource::Txt(strings) => {
                let joined = strings
                    .iter()
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "{}", joined)
            }
            Resource::Loc(loc) => write!(f, "{:?}", loc),
            Resource::Ds(ds) => write!(f, "{} {} {} {}", ds.key_tag, ds.algorithm, ds.digest_type, hex::encode(&ds.digest)),
            Resource::Tlsa(tls) => write!(
                f,
                "{} {} {} {}",
                tls.usage,
                tls.selector,
                tls.matching_type,
                hex::encode(&tls.certificate)
            ),
            Resource::OpenPgpKey(key) => write!(f, "{}", hex::encode(key)),
            Resource::Opt => write!(f, "OPT"),
            Resource::Any => write!(f, "*"),
        }
    }
}
