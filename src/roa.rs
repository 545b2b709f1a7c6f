//! Route Origin Authorizations.
//!
//! For details, see RFC 6482.
//!
//! Besides decoding, this module answers whether a ROA covers a given
//! prefix. The answer is the first entry in the order the ROA lists them
//! that covers the prefix, not the most specific one.

use std::convert::Infallible;
use bcder::{decode, Mode, Tag};
use bcder::decode::DecodeError;
use bytes::Bytes;
use log::debug;
use crate::oid;
use crate::error::ObjectError;
use crate::prefix::{AddressFamily, Prefix};
use crate::sigobj::SignedObject;


//------------ Roa -----------------------------------------------------------

/// A decoded ROA.
#[derive(Clone, Debug)]
pub struct Roa {
    pub signed: SignedObject,
    pub content: RouteOriginAttestation,
}

impl Roa {
    /// Decodes a ROA without verifying it.
    pub fn decode(bytes: Bytes, strict: bool) -> Result<Self, ObjectError> {
        let signed = SignedObject::decode(bytes, strict)
            .map_err(ObjectError::Envelope)?;
        if signed.content_type() != &oid::CT_ROUTE_ORIGIN_AUTHZ {
            return Err(
                ObjectError::ContentType(signed.content_type().clone())
            )
        }
        let content = signed.content().ok_or(ObjectError::MissingContent)?;
        let content = RouteOriginAttestation::decode(content, strict)
            .map_err(ObjectError::Roa)?;
        Ok(Roa { signed, content })
    }
}


//------------ RouteOriginAttestation ----------------------------------------

/// The content of a ROA.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteOriginAttestation {
    as_id: u32,
    families: Vec<RoaIpAddresses>,
}

impl RouteOriginAttestation {
    pub fn new(as_id: u32, families: Vec<RoaIpAddresses>) -> Self {
        RouteOriginAttestation { as_id, families }
    }

    pub fn as_id(&self) -> u32 {
        self.as_id
    }

    /// Returns the address blocks in the order they were encoded.
    pub fn families(&self) -> &[RoaIpAddresses] {
        &self.families
    }

    /// Returns an iterator over all entries of the given address family.
    pub fn iter_family(
        &self, family: AddressFamily
    ) -> impl Iterator<Item = &RoaIpAddress> + '_ {
        self.families.iter().filter(move |block| {
            block.family == family
        }).flat_map(|block| block.addrs.iter())
    }

    /// Returns the first entry that covers `query`.
    ///
    /// Only blocks of the query’s address family are considered. Blocks
    /// and their entries are tried in encoding order and the first hit
    /// wins even if a later entry is more specific.
    pub fn find_match(&self, query: &Prefix) -> Option<&RoaIpAddress> {
        self.iter_family(query.family()).find(|entry| entry.covers(query))
    }

    /// Decodes the content from the encapsulated content octets.
    pub fn decode(
        content: Bytes, strict: bool
    ) -> Result<Self, DecodeError<Infallible>> {
        let mode = if strict { Mode::Der } else { Mode::Ber };
        mode.decode(content, Self::take_from)
    }

    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            // version [0] EXPLICIT INTEGER DEFAULT 0
            cons.take_opt_constructed_if(Tag::CTX_0, |c| c.skip_u8_if(0))?;
            let as_id = cons.take_u32()?;
            let mut families = Vec::new();
            cons.take_sequence(|cons| {
                while let Some(()) = cons.take_opt_sequence(|cons| {
                    match AddressFamily::take_from(cons)? {
                        Some(family) => {
                            families.push(
                                RoaIpAddresses::take_from(cons, family)?
                            );
                        }
                        None => {
                            // Blocks of other families can never match.
                            debug!("Skipping ROA block of unknown family");
                            cons.skip_all()?;
                        }
                    }
                    Ok(())
                })? { }
                Ok(())
            })?;
            Ok(RouteOriginAttestation { as_id, families })
        })
    }
}


//------------ RoaIpAddresses ------------------------------------------------

/// The entries of one address family block of a ROA.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoaIpAddresses {
    family: AddressFamily,
    addrs: Vec<RoaIpAddress>,
}

impl RoaIpAddresses {
    pub fn new(family: AddressFamily, addrs: Vec<RoaIpAddress>) -> Self {
        RoaIpAddresses { family, addrs }
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn addrs(&self) -> &[RoaIpAddress] {
        &self.addrs
    }

    /// Takes the addresses of a block whose family has been taken already.
    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
        family: AddressFamily,
    ) -> Result<Self, DecodeError<S::Error>> {
        let addrs = cons.take_sequence(|cons| {
            let mut addrs = Vec::new();
            while let Some(addr) = RoaIpAddress::take_opt_from(cons, family)? {
                addrs.push(addr)
            }
            Ok(addrs)
        })?;
        Ok(RoaIpAddresses { family, addrs })
    }
}


//------------ RoaIpAddress --------------------------------------------------

/// A single entry of a ROA: a prefix and its maximum length.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RoaIpAddress {
    prefix: Prefix,
    max_length: Option<u8>
}

impl RoaIpAddress {
    pub fn new(prefix: Prefix, max_length: Option<u8>) -> Self {
        RoaIpAddress { prefix, max_length }
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    /// Returns the maximum length, defaulting to the prefix length.
    pub fn max_length(&self) -> u8 {
        self.max_length.unwrap_or_else(|| self.prefix.addr_len())
    }

    /// Returns whether the entry authorizes `query`.
    pub fn covers(&self, query: &Prefix) -> bool {
        matches(query, self)
    }

    // Section 3 of RFC 6482 defines  ROAIPAddress as
    //
    // ```txt
    // ROAIPAddress ::= SEQUENCE {
    //    address       IPAddress,
    //    maxLength     INTEGER OPTIONAL }
    //
    // IPAddress    ::= BIT STRING
    // ```
    fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
        family: AddressFamily,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let prefix = Prefix::take_from(cons, family)?;
            let max_length = cons.take_opt_u8()?;

            // Check that a max length fits both family and prefix length.
            if let Some(max_length) = max_length {
                if max_length > family.max_addr_len()
                    || max_length < prefix.addr_len()
                {
                    return Err(cons.content_err(
                        "invalid max length in ROA prefix"
                    ))
                }
            }
            Ok(RoaIpAddress { prefix, max_length })
        })
    }
}


//------------ matches -------------------------------------------------------

/// Returns whether the ROA entry `entry` covers the prefix `query`.
///
/// The query must be at least as long as the entry’s prefix and at most as
/// long as its maximum length. The leading bits of both prefixes up to the
/// shorter of the two lengths must be equal.
///
/// The address family isn’t checked. Callers pick entries of the query’s
/// family.
pub fn matches(query: &Prefix, entry: &RoaIpAddress) -> bool {
    let prefix = entry.prefix();
    if query.addr_len() < prefix.addr_len() {
        return false
    }
    if query.addr_len() > entry.max_length() {
        return false
    }
    query.leading_bits_eq(
        &prefix, query.addr_len().min(prefix.addr_len())
    )
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use crate::test::der;
    use super::*;

    fn prefix(s: &str) -> Prefix {
        Prefix::from_str(s).unwrap()
    }

    fn entry(s: &str, max_len: Option<u8>) -> RoaIpAddress {
        RoaIpAddress::new(prefix(s), max_len)
    }

    #[test]
    fn match_lengths() {
        let entry = entry("10.0.0.0/8", Some(16));
        assert!(matches(&prefix("10.1.0.0/16"), &entry));
        assert!(matches(&prefix("10.0.0.0/8"), &entry));
        assert!(!matches(&prefix("10.1.0.0/24"), &entry));
        assert!(!matches(&prefix("10.0.0.0/4"), &entry));
        assert!(!matches(&prefix("11.0.0.0/16"), &entry));
    }

    #[test]
    fn match_default_max_length() {
        let entry = entry("192.0.2.0/24", None);
        assert_eq!(entry.max_length(), 24);
        assert!(matches(&prefix("192.0.2.0/24"), &entry));
        assert!(!matches(&prefix("192.0.2.0/25"), &entry));
    }

    #[test]
    fn match_partial_octet() {
        let entry = entry("10.64.0.0/10", Some(12));
        assert!(matches(&prefix("10.80.0.0/12"), &entry));
        assert!(!matches(&prefix("10.128.0.0/12"), &entry));
        let entry = entry_v6();
        assert!(matches(&prefix("2001:db8:8000::/33"), &entry));
        assert!(!matches(&prefix("2001:db9::/33"), &entry));
    }

    fn entry_v6() -> RoaIpAddress {
        entry("2001:db8::/32", Some(48))
    }

    #[test]
    fn first_match_wins() {
        let roa = RouteOriginAttestation::new(64496, vec![
            RoaIpAddresses::new(AddressFamily::Ipv6, vec![entry_v6()]),
            RoaIpAddresses::new(AddressFamily::Ipv4, vec![
                entry("10.0.0.0/8", Some(24)),
                entry("10.1.0.0/16", Some(24)),
            ]),
        ]);
        assert_eq!(
            roa.find_match(&prefix("10.1.2.0/24")).map(|x| x.prefix()),
            Some(prefix("10.0.0.0/8"))
        );
        assert_eq!(
            roa.find_match(&prefix("2001:db8:1::/48")).map(|x| x.prefix()),
            Some(prefix("2001:db8::/32"))
        );
        assert!(roa.find_match(&prefix("192.0.2.0/24")).is_none());
    }

    #[test]
    fn no_blocks_never_match() {
        let roa = RouteOriginAttestation::new(64496, Vec::new());
        assert!(roa.find_match(&prefix("0.0.0.0/0")).is_none());
        assert!(roa.find_match(&prefix("::/0")).is_none());
    }

    #[test]
    fn decode_roa() {
        let data = der::signed_roa(64496, &[
            der::roa_family(&[0, 1], &[
                der::roa_address(&[10], 0, Some(16)),
                der::roa_address(&[192, 0, 2], 0, None),
            ]),
            der::roa_family(&[0, 2, 0], &[
                der::roa_address(&[0x20, 0x01, 0x0d, 0xb8], 0, None),
            ]),
        ]);
        let roa = Roa::decode(Bytes::from(data), true).unwrap();
        let content = &roa.content;
        assert_eq!(content.as_id(), 64496);
        assert_eq!(content.families().len(), 2);
        assert_eq!(
            content.families()[0].addrs(),
            &[entry("10.0.0.0/8", Some(16)), entry("192.0.2.0/24", None)]
        );
        assert_eq!(content.families()[1].family(), AddressFamily::Ipv6);
        assert!(content.find_match(&prefix("10.1.0.0/16")).is_some());
    }

    #[test]
    fn decode_empty_roa() {
        let data = der::signed_roa(64496, &[]);
        let roa = Roa::decode(Bytes::from(data), false).unwrap();
        assert!(roa.content.families().is_empty());
        assert!(roa.content.find_match(&prefix("10.0.0.0/8")).is_none());
    }

    #[test]
    fn decode_skips_unknown_family() {
        let data = der::signed_roa(64496, &[
            der::roa_family(&[0, 3], &[der::roa_address(&[1, 2], 0, None)]),
            der::roa_family(&[0, 1], &[der::roa_address(&[10], 0, Some(16))]),
        ]);
        let roa = Roa::decode(Bytes::from(data), true).unwrap();
        assert_eq!(roa.content.families().len(), 1);
        assert_eq!(roa.content.families()[0].family(), AddressFamily::Ipv4);
        assert_eq!(
            roa.content.find_match(&prefix("10.1.0.0/16")),
            Some(&entry("10.0.0.0/8", Some(16)))
        );
        assert!(roa.content.find_match(&prefix("1.2.0.0/16")).is_none());
    }

    #[test]
    fn decode_masks_unused_bits() {
        let data = der::signed_roa(1, &[
            der::roa_family(&[0, 1], &[der::roa_address(&[10, 0xFF], 4, None)])
        ]);
        let roa = Roa::decode(Bytes::from(data), false).unwrap();
        assert_eq!(
            roa.content.families()[0].addrs()[0].prefix(),
            prefix("10.240.0.0/12")
        );
    }

    #[test]
    fn decode_malformed() {
        fn roa_err(families: &[Vec<u8>]) -> ObjectError {
            Roa::decode(Bytes::from(der::signed_roa(1, families)), false)
                .unwrap_err()
        }

        // Prefix too long for IPv4.
        let err = roa_err(&[der::roa_family(&[0, 1], &[
            der::roa_address(&[1, 2, 3, 4, 5], 0, None)
        ])]);
        assert!(matches!(err, ObjectError::Roa(_)));

        // Non-zero SAFI.
        assert!(matches!(
            roa_err(&[der::roa_family(&[0, 1, 1], &[])]),
            ObjectError::Roa(_)
        ));

        // Max length shorter than the prefix.
        assert!(matches!(
            roa_err(&[der::roa_family(&[0, 1], &[
                der::roa_address(&[10], 0, Some(7))
            ])]),
            ObjectError::Roa(_)
        ));

        // Max length beyond the family width.
        assert!(matches!(
            roa_err(&[der::roa_family(&[0, 1], &[
                der::roa_address(&[10], 0, Some(33))
            ])]),
            ObjectError::Roa(_)
        ));
    }

    #[test]
    fn decode_wrong_type() {
        let data = der::signed_object(oid::CT_RPKI_MANIFEST, &der::roa(1, &[]));
        assert!(matches!(
            Roa::decode(Bytes::from(data), false),
            Err(ObjectError::ContentType(_))
        ));
        assert!(matches!(
            Roa::decode(Bytes::from_static(b"\x30\x00"), false),
            Err(ObjectError::Envelope(_))
        ));
    }
}
