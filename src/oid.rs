//! The object identifiers used in this crate.
//!
//! This module collects all the object indentifiers used at various places
//! in this crate in one central place. They are public so you can refer to
//! them should that ever become necessary.
//!
//! It also provides [`describe`] which turns an object identifier into
//! something a human can read.

use std::fmt;
use bcder::{ConstOid, Oid};


/// [RFC 3279](https://tools.ietf.org/html/rfc3279) `id-sha1`
pub const SHA1: ConstOid = Oid(&[43, 14, 3, 2, 26]);

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `id-sha224`
pub const SHA224: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 4]);

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `id-sha256`
///
/// Identifies the SHA-256 one-way hash function. This is the only file hash
/// algorithm permitted on RPKI manifests.
pub const SHA256: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 1]);

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `id-sha384`
pub const SHA384: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 2]);

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `id-sha512`
pub const SHA512: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 3]);

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `rsaEncryption`
pub const RSA_ENCRYPTION: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 1, 1]);

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `sha256WithRSAEncryption`
pub const SHA256_WITH_RSA_ENCRYPTION: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 1, 11]);

pub const SIGNED_DATA: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 2]);
pub const CONTENT_TYPE: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 3]);
pub const MESSAGE_DIGEST: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 4]);
pub const SIGNING_TIME: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 5]);

/// [RFC 6486](https://tools.ietf.org/html/rfc6486) `id-ct-rpkiManifest`
pub const CT_RPKI_MANIFEST: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 1, 26]);

/// [RFC 6482](https://tools.ietf.org/html/rfc6482) `id-ct-routeOriginAuthz`
pub const CT_ROUTE_ORIGIN_AUTHZ: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 1, 24]);

pub const CE_SUBJECT_KEY_IDENTIFIER: ConstOid = Oid(&[85, 29, 14]);


//------------ Names ---------------------------------------------------------

const NAMES: &[(ConstOid, &str)] = &[
    (SHA1, "sha1"),
    (SHA224, "sha224"),
    (SHA256, "sha256"),
    (SHA384, "sha384"),
    (SHA512, "sha512"),
    (RSA_ENCRYPTION, "rsaEncryption"),
    (SHA256_WITH_RSA_ENCRYPTION, "sha256WithRSAEncryption"),
    (SIGNED_DATA, "pkcs7-signedData"),
    (CONTENT_TYPE, "contentType"),
    (MESSAGE_DIGEST, "messageDigest"),
    (SIGNING_TIME, "signingTime"),
    (CT_RPKI_MANIFEST, "id-ct-rpkiManifest"),
    (CT_ROUTE_ORIGIN_AUTHZ, "id-ct-routeOriginAuthz"),
    (CE_SUBJECT_KEY_IDENTIFIER, "X509v3 Subject Key Identifier"),
];

/// Returns a displayable name for an object identifier.
///
/// Well-known identifiers are shown by name, everything else in the usual
/// dotted decimal notation.
pub fn describe<T: AsRef<[u8]>>(oid: &Oid<T>) -> Describe<'_, T> {
    Describe(oid)
}

/// The helper type returned by [`describe`].
pub struct Describe<'a, T: AsRef<[u8]>>(&'a Oid<T>);

impl<'a, T: AsRef<[u8]>> Describe<'a, T> {
    /// Returns the well-known name of the identifier if there is one.
    pub fn name(&self) -> Option<&'static str> {
        NAMES.iter().find_map(|(oid, name)| {
            if oid.0 == self.0 .0.as_ref() { Some(*name) } else { None }
        })
    }
}

impl<'a, T: AsRef<[u8]>> fmt::Display for Describe<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => fmt::Display::fmt(self.0, f),
        }
    }
}


//============ Tests =========================================================
