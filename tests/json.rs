//! JSON shape tests against the public API (§6, §8 property 2).

use hnsres::fields::{Addr, Service};
use hnsres::record::Record;
use pretty_assertions::assert_eq;

#[test]
fn json_round_trips_a_populated_record() {
    let r = Record {
        ttl: 120,
        hosts: vec!["1.2.3.4".parse().unwrap()],
        canonical: Some("bob.h".parse().unwrap()),
        text: vec!["hello world".to_string()],
        service: vec![Service {
            service: "smtp".to_string(),
            protocol: "tcp".to_string(),
            priority: 1,
            weight: 1,
            target: "mail.example.com.".parse().unwrap(),
            port: 25,
        }],
        addr: vec![Addr {
            currency: "btc".to_string(),
            address: "1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string(),
        }],
        ..Record::default()
    };

    let json = serde_json::to_string(&r).unwrap();
    let back: Record = serde_json::from_str(&json).unwrap();
    assert_eq!(back, r);
}

#[test]
fn empty_arrays_and_unset_optionals_are_omitted() {
    let r = Record::default();
    let value = serde_json::to_value(&r).unwrap();
    let obj = value.as_object().unwrap();

    for key in [
        "hosts", "canonical", "delegate", "ns", "service", "url", "email", "text", "location",
        "magnet", "ds", "tls", "ssh", "pgp", "addr", "extra",
    ] {
        assert!(!obj.contains_key(key), "expected {:?} to be omitted", key);
    }
    assert!(obj.contains_key("version"));
    assert!(obj.contains_key("ttl"));
}

#[test]
fn target_serializes_as_a_plain_string() {
    let r = Record {
        hosts: vec!["1.2.3.4".parse().unwrap()],
        ..Record::default()
    };
    let value = serde_json::to_value(&r).unwrap();
    let hosts = value["hosts"].as_array().unwrap();
    assert_eq!(hosts[0].as_str().unwrap(), "1.2.3.4");
}

#[test]
fn magnet_serializes_as_a_uri() {
    use hnsres::fields::Magnet;
    let r = Record {
        magnet: vec![Magnet {
            nid: "btih".to_string(),
            nin: "abcdef0123".to_string(),
        }],
        ..Record::default()
    };
    let value = serde_json::to_value(&r).unwrap();
    assert_eq!(value["magnet"][0], "magnet:?xt=urn:btih:abcdef0123");
}

#[test]
fn addr_serializes_as_currency_colon_address() {
    let r = Record {
        addr: vec![Addr {
            currency: "btc".to_string(),
            address: "1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string(),
        }],
        ..Record::default()
    };
    let value = serde_json::to_value(&r).unwrap();
    assert_eq!(
        value["addr"][0],
        "btc:1BoatSLRHtKNngkdXEeobR76b53LETtpyT"
    );
}

#[test]
fn unknown_version_is_rejected_in_json() {
    let json = r#"{"version": 1, "ttl": 0}"#;
    let err = serde_json::from_str::<Record>(json).unwrap_err();
    assert!(err.to_string().contains("unknown record version"));
}
