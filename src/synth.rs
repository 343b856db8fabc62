//! The DNS synthesizer (§4.5): maps a [`crate::record::Record`] and a
//! query `(name, qtype)` to a synthesized [`Message`].
//!
//! Free functions over `&Record` rather than a builder object, mirroring
//! how the teacher's `Message::to_vec` (`dns.rs`) assembles sections from
//! plain data. No `Result` anywhere here: per §7, the synthesizer has no
//! error path, and the fallback clauses below guarantee a well-formed
//! response even for a mostly-empty record.

use crate::message::{Class, Extension, Message, Mx, Resource, Soa, Srv, Type, RR, QR};
use crate::record::Record;
use crate::target::Target;

const SOA_REFRESH: u32 = 1800;
const SOA_EXPIRE: u32 = 604800;
const SOA_MINTTL: u32 = 86400;

/// Entry point (§4.5). `name` MUST be fully qualified (end in `.`); this
/// is checked with `debug_assert!` rather than a `Result`, since §7 calls
/// it out as an assertion error, not a recoverable one.
///
/// `naked` is accepted on the signature per spec.md's API, but every
/// caller in this crate passes `true` — see DESIGN.md's Open Question
/// notes on why that override is kept visible here instead of hidden
/// inside the function body.
pub fn to_dns(record: &Record, name: &str, qtype: Type, naked: bool) -> Message {
    debug_assert!(name.ends_with('.'), "to_dns requires a fully-qualified name, got {:?}", name);

    let mut m = Message::default();
    m.qr = QR::Response;
    m.ad = true;
    m.add_extension(Extension::edns0(4096, true));

    let labels: Vec<&str> = name.trim_end_matches('.').split('.').collect();
    let labels: Vec<&str> = if labels == [""] { Vec::new() } else { labels };

    if labels.len() > 1 {
        referral(record, name, &mut m, naked);
    } else {
        m.aa = true;
        authoritative(record, name, qtype, &mut m, naked);
    }

    if m.answers.is_empty() && m.authority.is_empty() {
        if let Some(c) = &record.canonical {
            m.answers.push(to_cname_rr(name, c));
        } else {
            m.answers.push(to_soa_rr(name, record));
        }
    }

    m
}

/// `name` has more than one label: referral for the leaf TLD (§4.5).
fn referral(record: &Record, name: &str, m: &mut Message, naked: bool) {
    let tld = last_label(name);

    if !record.ns.is_empty() {
        m.authority.extend(to_ns(record, &tld));
        m.additional.extend(to_ns_ip(record, &tld, naked));
    } else if let Some(d) = &record.delegate {
        m.answers.push(to_dname_rr(&tld, d));
    } else {
        m.authority.push(to_soa_rr(&tld, record));
    }

    m.authority.extend(to_ds(record, &tld));
}

/// `name` has exactly one label: authoritative response, dispatch by
/// qtype (§4.5).
fn authoritative(record: &Record, name: &str, qtype: Type, m: &mut Message, naked: bool) {
    match qtype {
        Type::ANY => {
            m.answers.push(to_soa_rr(name, record));
            m.answers.extend(to_ns(record, name));
            m.additional.extend(to_ns_ip(record, name, naked));
        }
        Type::A => {
            m.answers.extend(to_a(record, name));
            if let Some(tor) = to_tor_txt(record, name) {
                m.answers.push(tor);
            }
        }
        Type::AAAA => {
            m.answers.extend(to_aaaa(record, name));
            if let Some(tor) = to_tor_txt(record, name) {
                m.answers.push(tor);
            }
        }
        Type::CNAME => {
            if let Some(c) = &record.canonical {
                m.answers.push(to_cname_rr(name, c));
            }
        }
        Type::DNAME => {
            if let Some(d) = &record.delegate {
                m.answers.push(to_dname_rr(name, d));
            }
        }
        Type::NS => {
            m.answers.extend(to_ns(record, name));
            m.additional.extend(to_ns_ip(record, name, naked));
        }
        Type::MX => {
            m.answers.extend(to_mx(record, name));
            m.additional.extend(to_srv_ip(record, name, naked, true));
        }
        Type::SRV => {
            m.answers.extend(to_srv(record, name));
            m.additional.extend(to_srv_ip(record, name, naked, false));
        }
        Type::TXT => {
            m.answers.extend(to_txt(record, name));
        }
        Type::LOC => {
            m.answers.extend(to_loc(record, name));
        }
        Type::DS => {
            m.answers.extend(to_ds(record, name));
        }
        Type::TLSA => {
            m.answers.extend(to_tlsa(record, name));
        }
        Type::OPENPGPKEY => {
            m.answers.extend(to_openpgpkey(record, name));
        }
        _ => {}
    }
}

fn last_label(name: &str) -> String {
    let trimmed = name.trim_end_matches('.');
    match trimmed.rsplit_once('.') {
        Some((_, last)) => format!("{}.", last),
        None => format!("{}.", trimmed),
    }
}

fn to_a(record: &Record, name: &str) -> Vec<RR> {
    record
        .hosts
        .iter()
        .filter_map(|t| match t {
            Target::Inet4(ip) => Some(RR {
                name: name.to_string(),
                class: Class::Internet,
                ttl: record.ttl,
                resource: Resource::A(*ip),
            }),
            _ => None,
        })
        .collect()
}

fn to_aaaa(record: &Record, name: &str) -> Vec<RR> {
    record
        .hosts
        .iter()
        .filter_map(|t| match t {
            Target::Inet6(ip) => Some(RR {
                name: name.to_string(),
                class: Class::Internet,
                ttl: record.ttl,
                resource: Resource::AAAA(*ip),
            }),
            _ => None,
        })
        .collect()
}

/// Tor TXT record: `["hsk:tor", <onion addrs...>]` (§4.5, glossary).
fn to_tor_txt(record: &Record, name: &str) -> Option<RR> {
    let onions: Vec<Vec<u8>> = record
        .hosts
        .iter()
        .filter(|t| t.is_tor())
        .map(|t| t.to_string().into_bytes())
        .collect();

    if onions.is_empty() {
        return None;
    }

    let mut strings = vec![b"hsk:tor".to_vec()];
    strings.extend(onions);

    Some(RR {
        name: name.to_string(),
        class: Class::Internet,
        ttl: record.ttl,
        resource: Resource::Txt(strings),
    })
}

fn to_cname_rr(name: &str, canonical: &Target) -> RR {
    RR {
        name: name.to_string(),
        class: Class::Internet,
        ttl: 0,
        resource: Resource::Cname(canonical.to_dns()),
    }
}

fn to_dname_rr(name: &str, delegate: &Target) -> RR {
    RR {
        name: name.to_string(),
        class: Class::Internet,
        ttl: 0,
        resource: Resource::Dname(delegate.to_dns()),
    }
}

fn to_ns(record: &Record, name: &str) -> Vec<RR> {
    record
        .ns
        .iter()
        .map(|t| RR {
            name: name.to_string(),
            class: Class::Internet,
            ttl: record.ttl,
            resource: Resource::Ns(ns_target_name(t, name)),
        })
        .collect()
}

/// NS RDATA must be a domain name; an inline IP target is rendered as
/// its pointer name so it matches the glue `to_ns_ip` emits for it.
fn ns_target_name(t: &Target, name: &str) -> String {
    if t.is_inet() {
        t.to_pointer(name).unwrap_or_else(|| t.to_dns())
    } else {
        t.to_dns()
    }
}

/// Glue for inline IP targets used as NS names: synthesize a pointer
/// name and an A/AAAA for it in the additional section (§4.2, §4.5).
fn to_ns_ip(record: &Record, name: &str, naked: bool) -> Vec<RR> {
    record
        .ns
        .iter()
        .filter(|t| t.is_inet())
        .filter_map(|t| glue_rr(t, name, record.ttl, naked))
        .collect()
}

fn to_mx(record: &Record, name: &str) -> Vec<RR> {
    record
        .service
        .iter()
        .filter(|s| s.is_smtp())
        .map(|s| RR {
            name: name.to_string(),
            class: Class::Internet,
            ttl: record.ttl,
            resource: Resource::Mx(Mx {
                preference: s.priority as u16,
                exchange: service_target_name(s, name),
            }),
        })
        .collect()
}

fn to_srv(record: &Record, name: &str) -> Vec<RR> {
    record
        .service
        .iter()
        .map(|s| RR {
            name: srv_owner(name, s),
            class: Class::Internet,
            ttl: record.ttl,
            resource: Resource::Srv(Srv {
                priority: s.priority as u16,
                weight: s.weight as u16,
                port: s.port,
                name: service_target_name(s, name),
            }),
        })
        .collect()
}

/// `toSRVIP(name, naked, mx)`: glue for service targets that are inline
/// IPs. When `mx` is true, restricted to SMTP services (strict reading
/// of the Open Question in §9: both `isSMTP()` *and* an IP target).
fn to_srv_ip(record: &Record, name: &str, naked: bool, mx: bool) -> Vec<RR> {
    record
        .service
        .iter()
        .filter(|s| !mx || s.is_smtp())
        .filter(|s| s.target.is_inet())
        .filter_map(|s| glue_rr(&s.target, name, record.ttl, naked))
        .collect()
}

fn service_target_name(s: &crate::fields::Service, name: &str) -> String {
    if s.target.is_inet() {
        s.target
            .to_pointer(name)
            .unwrap_or_else(|| s.target.to_dns())
    } else {
        s.target.to_dns()
    }
}

fn srv_owner(name: &str, s: &crate::fields::Service) -> String {
    format!("_{}._{}.{}", s.service, s.protocol, name)
}

/// Synthesizes the additional-section glue record for an inline IP
/// target: `_<base58(ip)>.<name>` with a matching A/AAAA (§4.2, §GLOSSARY
/// "Pointer name"). Returns `None` for non-IP targets.
fn glue_rr(t: &Target, name: &str, ttl: u32, _naked: bool) -> Option<RR> {
    let pointer = t.to_pointer(name)?;
    let resource = match t {
        Target::Inet4(ip) => Resource::A(*ip),
        Target::Inet6(ip) => Resource::AAAA(*ip),
        _ => return None,
    };
    Some(RR {
        name: pointer,
        class: Class::Internet,
        ttl,
        resource,
    })
}

fn to_txt(record: &Record, name: &str) -> Vec<RR> {
    let mut rrs = Vec::new();

    if !record.text.is_empty() {
        rrs.push(txt_rr(name, record.ttl, None, &record.text));
    }
    if !record.url.is_empty() {
        rrs.push(txt_rr(name, record.ttl, Some("hsk:url"), &record.url));
    }
    if !record.email.is_empty() {
        rrs.push(txt_rr(name, record.ttl, Some("hsk:email"), &record.email));
    }
    if !record.magnet.is_empty() {
        let uris: Vec<String> = record.magnet.iter().map(|m| m.to_uri()).collect();
        rrs.push(txt_rr(name, record.ttl, Some("hsk:magnet"), &uris));
    }
    if !record.addr.is_empty() {
        let strs: Vec<String> = record
            .addr
            .iter()
            .map(|a| format!("{}:{}", a.currency, a.address))
            .collect();
        rrs.push(txt_rr(name, record.ttl, Some("hsk:addr"), &strs));
    }

    rrs
}

fn txt_rr(name: &str, ttl: u32, sentinel: Option<&str>, payload: &[String]) -> RR {
    let mut strings: Vec<Vec<u8>> = Vec::with_capacity(payload.len() + 1);
    if let Some(s) = sentinel {
        strings.push(s.as_bytes().to_vec());
    }
    strings.extend(payload.iter().map(|s| s.as_bytes().to_vec()));

    RR {
        name: name.to_string(),
        class: Class::Internet,
        ttl,
        resource: Resource::Txt(strings),
    }
}

fn to_loc(record: &Record, name: &str) -> Vec<RR> {
    record
        .location
        .iter()
        .map(|l| RR {
            name: name.to_string(),
            class: Class::Internet,
            ttl: record.ttl,
            resource: Resource::Loc(*l),
        })
        .collect()
}

fn to_ds(record: &Record, name: &str) -> Vec<RR> {
    record
        .ds
        .iter()
        .map(|d| RR {
            name: name.to_string(),
            class: Class::Internet,
            ttl: record.ttl,
            resource: Resource::Ds(d.clone()),
        })
        .collect()
}

/// `toTLSA`: owner name `_<port>._<protocol>.<name>` (§4.5).
fn to_tlsa(record: &Record, name: &str) -> Vec<RR> {
    record
        .tls
        .iter()
        .map(|t| RR {
            name: format!("_{}._{}.{}", t.port, t.protocol, name),
            class: Class::Internet,
            ttl: record.ttl,
            resource: Resource::Tlsa(t.clone()),
        })
        .collect()
}

fn to_openpgpkey(record: &Record, name: &str) -> Vec<RR> {
    record
        .pgp
        .iter()
        .map(|p| RR {
            name: name.to_string(),
            class: Class::Internet,
            ttl: record.ttl,
            resource: Resource::OpenPgpKey(p.fingerprint.clone()),
        })
        .collect()
}

/// `toSOA(tld)` (§4.5): fixed serial/refresh/expire/minttl; `retry` is
/// this record's TTL. The first NS name becomes the primary NS if `ns`
/// is non-empty; the first MX name becomes the mbox if an MX exists.
fn to_soa_rr(name: &str, record: &Record) -> RR {
    let mname = record
        .ns
        .first()
        .map(|t| t.to_dns())
        .unwrap_or_else(|| name.to_string());

    let rname = record
        .service
        .iter()
        .find(|s| s.is_smtp())
        .map(|s| service_target_name(s, name))
        .unwrap_or_else(|| format!("hostmaster.{}", name));

    RR {
        name: name.to_string(),
        class: Class::Internet,
        ttl: record.ttl,
        resource: Resource::Soa(Soa {
            mname,
            rname,
            serial: 0,
            refresh: SOA_REFRESH,
            retry: record.ttl,
            expire: SOA_EXPIRE,
            minimum: SOA_MINTTL,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Service;

    fn host_record(ttl: u32, host: &str) -> Record {
        Record {
            ttl,
            hosts: vec![host.parse().unwrap()],
            ..Record::default()
        }
    }

    #[test]
    fn s1_empty_record_soa_fallback() {
        let r = Record::default();
        let m = to_dns(&r, "foo.", Type::A, true);
        assert_eq!(m.answers.len(), 1);
        match &m.answers[0].resource {
            Resource::Soa(soa) => {
                assert_eq!(soa.serial, 0);
                assert_eq!(soa.refresh, 1800);
                assert_eq!(soa.expire, 604800);
                assert_eq!(soa.minimum, 86400);
            }
            other => panic!("expected SOA, got {:?}", other),
        }
    }

    #[test]
    fn s2_one_ipv4_host_a_query() {
        let r = host_record(3600, "1.2.3.4");
        let m = to_dns(&r, "alice.", Type::A, true);
        assert!(m.aa);
        assert!(m.ad);
        assert!(m.extension.is_some());
        assert_eq!(m.answers.len(), 1);
        match &m.answers[0].resource {
            Resource::A(ip) => assert_eq!(ip.to_string(), "1.2.3.4"),
            other => panic!("expected A, got {:?}", other),
        }
        assert_eq!(m.answers[0].ttl, 3600 & !63);
    }

    #[test]
    fn s3_canonical_icann_cname() {
        let r = Record {
            canonical: Some("example.com.".parse().unwrap()),
            ..Record::default()
        };
        let m = to_dns(&r, "alice.", Type::CNAME, true);
        assert_eq!(m.answers.len(), 1);
        match &m.answers[0].resource {
            Resource::Cname(target) => assert_eq!(target, "example.com."),
            other => panic!("expected CNAME, got {:?}", other),
        }
    }

    #[test]
    fn s4_native_canonical_hname() {
        let r = Record {
            canonical: Some("bob.h".parse().unwrap()),
            ..Record::default()
        };
        let m = to_dns(&r, "alice.", Type::CNAME, true);
        match &m.answers[0].resource {
            Resource::Cname(target) => assert_eq!(target, "bob."),
            other => panic!("expected CNAME, got {:?}", other),
        }
    }

    #[test]
    fn s5_mx_with_ip_glue() {
        let r = Record {
            service: vec![Service {
                service: "smtp".to_string(),
                protocol: "tcp".to_string(),
                priority: 10,
                weight: 0,
                target: "1.2.3.4".parse().unwrap(),
                port: 25,
            }],
            ..Record::default()
        };
        let m = to_dns(&r, "alice.", Type::MX, true);
        assert_eq!(m.answers.len(), 1);
        let exchange = match &m.answers[0].resource {
            Resource::Mx(mx) => {
                assert_eq!(mx.preference, 10);
                assert!(mx.exchange.starts_with('_'));
                assert!(mx.exchange.ends_with(".alice."));
                mx.exchange.clone()
            }
            other => panic!("expected MX, got {:?}", other),
        };
        assert_eq!(m.additional.len(), 1);
        assert_eq!(m.additional[0].name, exchange);
        assert!(matches!(m.additional[0].resource, Resource::A(_)));
    }

    #[test]
    fn s6_tor_host_a_query_txt() {
        let r = host_record(0, "xxxxxxxxxxxxxxxx.onion");
        let m = to_dns(&r, "alice.", Type::A, true);
        assert_eq!(m.answers.len(), 1);
        match &m.answers[0].resource {
            Resource::Txt(strings) => {
                assert_eq!(strings[0], b"hsk:tor");
                assert_eq!(strings[1], b"xxxxxxxxxxxxxxxx.onion");
            }
            other => panic!("expected TXT, got {:?}", other),
        }
    }

    #[test]
    fn property9_single_ipv4_host_authoritative() {
        let r = host_record(64, "1.2.3.4");
        let m = to_dns(&r, "one-label.", Type::A, true);
        assert!(m.aa);
        assert!(m.ad);
        assert_eq!(m.answers.len(), 1);
    }

    #[test]
    fn property10_sub_label_is_referral() {
        let r = host_record(64, "1.2.3.4");
        let m = to_dns(&r, "sub.one-label.", Type::A, true);
        assert!(!m.aa);
        assert!(m.answers.is_empty());
        assert!(!m.authority.is_empty());
    }

    #[test]
    fn property11_canonical_fallback_without_a_hosts() {
        let r = Record {
            canonical: Some("example.com.".parse().unwrap()),
            ..Record::default()
        };
        let m = to_dns(&r, "alice.", Type::A, true);
        assert_eq!(m.answers.len(), 1);
        assert!(matches!(m.answers[0].resource, Resource::Cname(_)));
    }

    #[test]
    fn referral_appends_ds_to_authority() {
        let r = Record {
            ds: vec![crate::fields::Ds {
                key_tag: 1,
                algorithm: 8,
                digest_type: 2,
                digest: vec![1, 2, 3],
            }],
            ..Record::default()
        };
        let m = to_dns(&r, "sub.tld.", Type::A, true);
        assert!(m.authority.iter().any(|rr| matches!(rr.resource, Resource::Ds(_))));
    }

    #[test]
    fn referral_with_ns_populates_authority_and_glue() {
        let r = Record {
            ns: vec!["1.2.3.4".parse().unwrap()],
            ..Record::default()
        };
        let m = to_dns(&r, "sub.tld.", Type::A, true);
        assert!(m.authority.iter().any(|rr| matches!(rr.resource, Resource::Ns(_))));
        assert!(m.additional.iter().any(|rr| matches!(rr.resource, Resource::A(_))));
    }

    #[test]
    fn referral_with_delegate_and_no_ns_is_dname() {
        let r = Record {
            delegate: Some("example.com.".parse().unwrap()),
            ..Record::default()
        };
        let m = to_dns(&r, "sub.tld.", Type::A, true);
        assert!(matches!(m.answers[0].resource, Resource::Dname(_)));
    }

    #[test]
    fn srv_glue_emitted_for_non_mx_services_without_smtp_filter() {
        let r = Record {
            service: vec![Service {
                service: "ldap".to_string(),
                protocol: "tcp".to_string(),
                priority: 1,
                weight: 1,
                target: "1.2.3.4".parse().unwrap(),
                port: 389,
            }],
            ..Record::default()
        };
        let m = to_dns(&r, "alice.", Type::SRV, true);
        assert_eq!(m.answers.len(), 1);
        assert_eq!(m.additional.len(), 1);
    }

    #[test]
    fn mx_glue_requires_smtp_and_ip_target() {
        let r = Record {
            service: vec![Service {
                service: "ldap".to_string(),
                protocol: "tcp".to_string(),
                priority: 1,
                weight: 1,
                target: "1.2.3.4".parse().unwrap(),
                port: 389,
            }],
            ..Record::default()
        };
        // A non-SMTP service does not produce MX glue even though its
        // target is an IP (strict reading of the Open Question, §9).
        let m = to_dns(&r, "alice.", Type::MX, true);
        assert!(m.additional.is_empty());
    }

    #[test]
    fn any_query_includes_soa_ns_and_glue() {
        let r = Record {
            ns: vec!["1.2.3.4".parse().unwrap()],
            ..Record::default()
        };
        let m = to_dns(&r, "alice.", Type::ANY, true);
        assert!(m.answers.iter().any(|rr| matches!(rr.resource, Resource::Soa(_))));
        assert!(m.answers.iter().any(|rr| matches!(rr.resource, Resource::Ns(_))));
        assert!(!m.additional.is_empty());
    }
}
