//! Wire-format constants: the record tag registry and the TLD suffix markers.
//!
//! These are part of the wire format (§3 of the format this crate implements)
//! and must never be renumbered.

use num_derive::{FromPrimitive, ToPrimitive};

/// Single-byte record tags as they appear at the top level of an encoded
/// name record. Values are fixed; they are part of the wire format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum Tag {
    Inet4 = 1,
    Inet6 = 2,
    Onion = 3,
    OnionNG = 5,
    IName = 6,
    HName = 7,
    Canonical = 8,
    Delegate = 9,
    Ns = 10,
    Service = 11,
    Url = 12,
    Email = 13,
    Text = 14,
    Location = 15,
    Magnet = 16,
    Ds = 17,
    Tls = 18,
    Ssh = 19,
    Pgp = 20,
    Addr = 21,
    // Any other byte value means "Extra"; it is not a named variant here
    // because it isn't a fixed value, it's "everything else".
}

/// The ICANN root TLD suffix marker.
pub const ICANN: &str = "i";

/// The native (blockchain registry) root TLD suffix marker.
pub const HSK: &str = "h";

/// `.ICANN` suffix, as appended to a wire-compressed name.
pub const ICANNP: &str = ".i";

/// `.HSK` suffix, as appended to a wire-compressed name.
pub const HSKP: &str = ".h";

/// `.ICANN` suffix with a trailing dot, for human-readable forms.
pub const ICANNS: &str = "i.";

/// `.HSK` suffix with a trailing dot, for human-readable forms.
pub const HSKS: &str = "h.";

/// The maximum length of any single length-prefixed byte field (invariant 4).
pub const MAX_FIELD_LEN: usize = 255;

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn tag_values_match_wire_format() {
        assert_eq!(Tag::Inet4 as u8, 1);
        assert_eq!(Tag::Inet6 as u8, 2);
        assert_eq!(Tag::Onion as u8, 3);
        assert_eq!(Tag::OnionNG as u8, 5);
        assert_eq!(Tag::IName as u8, 6);
        assert_eq!(Tag::HName as u8, 7);
        assert_eq!(Tag::Canonical as u8, 8);
        assert_eq!(Tag::Delegate as u8, 9);
        assert_eq!(Tag::Ns as u8, 10);
        assert_eq!(Tag::Service as u8, 11);
        assert_eq!(Tag::Url as u8, 12);
        assert_eq!(Tag::Email as u8, 13);
        assert_eq!(Tag::Text as u8, 14);
        assert_eq!(Tag::Location as u8, 15);
        assert_eq!(Tag::Magnet as u8, 16);
        assert_eq!(Tag::Ds as u8, 17);
        assert_eq!(Tag::Tls as u8, 18);
        assert_eq!(Tag::Ssh as u8, 19);
        assert_eq!(Tag::Pgp as u8, 20);
        assert_eq!(Tag::Addr as u8, 21);
    }

    #[test]
    fn unknown_byte_is_not_a_tag() {
        assert!(<Tag as FromPrimitive>::from_u8(200).is_none());
        assert!(<Tag as FromPrimitive>::from_u8(4).is_none()); // 4 is unassigned
    }
}
