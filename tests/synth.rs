//! Black-box DNS synthesis tests against the public API (§8, properties
//! 9-11 and scenarios S1-S6).

use hnsres::fields::Service;
use hnsres::message::{Resource, Type};
use hnsres::record::Record;
use hnsres::synth::to_dns;
use pretty_assertions::assert_eq;

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
        other => panic!("expected SOA fallback, got {:?}", other),
    }
}

#[test]
fn s2_single_ipv4_host_a_query() {
    let r = Record {
        ttl: 3600,
        hosts: vec!["1.2.3.4".parse().unwrap()],
        ..Record::default()
    };
    let m = to_dns(&r, "alice.", Type::A, true);
    assert!(m.aa, "single-label authoritative query must set aa");
    assert_eq!(m.answers.len(), 1);
    assert_eq!(m.answers[0].ttl, 3584);
    match &m.answers[0].resource {
        Resource::A(ip) => assert_eq!(ip.to_string(), "1.2.3.4"),
        other => panic!("expected A, got {:?}", other),
    }
}

#[test]
fn s3_icann_canonical_cname() {
    let r = Record {
        canonical: Some("example.com.".parse().unwrap()),
        ..Record::default()
    };
    let m = to_dns(&r, "alice.", Type::CNAME, true);
    match &m.answers[0].resource {
        Resource::Cname(target) => assert_eq!(target, "example.com."),
        other => panic!("expected CNAME, got {:?}", other),
    }
}

#[test]
fn s4_native_canonical_cname() {
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
fn s5_mx_with_inline_ip_produces_glue() {
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
    let exchange = match &m.answers[0].resource {
        Resource::Mx(mx) => {
            assert_eq!(mx.preference, 10);
            assert!(mx.exchange.starts_with('_') && mx.exchange.ends_with(".alice."));
            mx.exchange.clone()
        }
        other => panic!("expected MX, got {:?}", other),
    };
    assert_eq!(m.additional.len(), 1);
    assert_eq!(m.additional[0].name, exchange);
    assert!(matches!(m.additional[0].resource, Resource::A(_)));
}

#[test]
fn s6_onion_host_a_query_includes_tor_txt() {
    let r = Record {
        hosts: vec!["xxxxxxxxxxxxxxxx.onion".parse().unwrap()],
        ..Record::default()
    };
    let m = to_dns(&r, "alice.", Type::A, true);
    assert_eq!(m.answers.len(), 1);
    match &m.answers[0].resource {
        Resource::Txt(strings) => {
            assert_eq!(strings, &vec![
                b"hsk:tor".to_vec(),
                b"xxxxxxxxxxxxxxxx.onion".to_vec(),
            ]);
        }
        other => panic!("expected TXT, got {:?}", other),
    }
}

#[test]
fn property9_single_label_a_query_is_authoritative() {
    let r = Record {
        hosts: vec!["1.2.3.4".parse().unwrap()],
        ..Record::default()
    };
    let m = to_dns(&r, "one-label.", Type::A, true);
    assert!(m.aa);
    assert!(m.ad);
    assert!(m.extension.is_some());
    assert_eq!(m.answers.len(), 1);
}

#[test]
fn property10_multi_label_query_is_a_referral() {
    let r = Record {
        hosts: vec!["1.2.3.4".parse().unwrap()],
        ..Record::default()
    };
    let m = to_dns(&r, "sub.one-label.", Type::A, true);
    assert!(!m.aa);
    assert!(m.answers.is_empty());
    assert!(!m.authority.is_empty());
}

#[test]
fn property11_cname_fallback_when_no_a_hosts() {
    let r = Record {
        canonical: Some("example.com.".parse().unwrap()),
        ..Record::default()
    };
    let m = to_dns(&r, "alice.", Type::A, true);
    assert_eq!(m.answers.len(), 1);
    assert!(matches!(m.answers[0].resource, Resource::Cname(_)));
}

#[test]
fn every_query_sets_ad_and_edns0() {
    let r = Record::default();
    for qtype in [Type::A, Type::AAAA, Type::NS, Type::TXT, Type::ANY] {
        let m = to_dns(&r, "alice.", qtype, true);
        assert!(m.ad);
        let ext = m.extension.as_ref().expect("edns0 must always be set");
        assert_eq!(ext.payload_size, 4096);
        assert!(ext.dnssec_ok);
    }
}
