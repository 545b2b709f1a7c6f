//! Signed objects.
//!
//! For details, see RFC 6488 and RFC 5652.
//!
//! Objects are only decoded here. Neither the signature nor any of the
//! signed attributes or certificates are verified.

use std::fmt;
use bcder::{decode, Captured, Mode, OctetString, Oid, Tag};
use bcder::decode::{DecodeError, IntoSource, Source};
use bytes::Bytes;
use crate::oid;
use crate::util::hex;
use crate::x509::{Cert, SigningTime};


//------------ SignedObject --------------------------------------------------

/// A signed object decoded without any verification.
#[derive(Clone, Debug)]
pub struct SignedObject {
    //--- From SignedData
    //
    version: u8,
    digest_algorithms: Vec<Oid<Bytes>>,
    content_type: Oid<Bytes>,
    content: Option<OctetString>,
    certs: Vec<Cert>,
    crl_count: usize,

    //--- SignerInfos
    //
    signer_infos: Vec<SignerInfo>,
}

/// # Data Access
///
impl SignedObject {
    /// Returns a reference to the object’s content type.
    pub fn content_type(&self) -> &Oid<Bytes> {
        &self.content_type
    }

    /// Returns the encapsulated content if there is any.
    pub fn content(&self) -> Option<Bytes> {
        self.content.as_ref().map(OctetString::to_bytes)
    }

    /// Returns the certificates included with the object.
    pub fn certs(&self) -> &[Cert] {
        &self.certs
    }

    /// Returns the number of CRLs included with the object.
    pub fn crl_count(&self) -> usize {
        self.crl_count
    }

    /// Returns the signer infos of the object.
    pub fn signer_infos(&self) -> &[SignerInfo] {
        &self.signer_infos
    }

    /// Returns an object displaying the complete decoded structure.
    pub fn dump(&self) -> Dump<'_> {
        Dump(self)
    }
}

/// # Decoding
///
impl SignedObject {
    /// Decodes a signed object from the given source.
    ///
    /// If `strict` is `true`, the object must be DER encoded, otherwise
    /// BER is accepted as well.
    pub fn decode<S: IntoSource>(
        source: S,
        strict: bool
    ) -> Result<Self, DecodeError<<S::Source as Source>::Error>> {
        let mode = if strict { Mode::Der } else { Mode::Ber };
        mode.decode(source, Self::take_from)
    }

    /// Takes a signed object from an encoded constructed value.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| { // ContentInfo
            oid::SIGNED_DATA.skip_if(cons)?; // contentType
            cons.take_constructed_if(Tag::CTX_0, |cons| { // content
                cons.take_sequence(|cons| { // SignedData
                    let version = cons.take_u8()?;
                    let digest_algorithms = cons.take_set(|cons| {
                        let mut res = Vec::new();
                        while let Some(alg) = take_opt_algorithm(cons)? {
                            res.push(alg)
                        }
                        Ok(res)
                    })?;
                    let (content_type, content) = {
                        cons.take_sequence(|cons| { // encapContentInfo
                            Ok((
                                Oid::take_from(cons)?,
                                cons.take_opt_constructed_if(
                                    Tag::CTX_0,
                                    OctetString::take_from
                                )?
                            ))
                        })?
                    };
                    let certs = cons.take_opt_constructed_if( // certificates
                        Tag::CTX_0,
                        |cons| {
                            let mut res = Vec::new();
                            while let Some(cert) = Cert::take_opt_from(cons)? {
                                res.push(cert)
                            }
                            Ok(res)
                        }
                    )?.unwrap_or_default();
                    let crl_count = cons.take_opt_constructed_if( // crls
                        Tag::CTX_1,
                        |cons| {
                            let mut res = 0;
                            while cons.skip_one()?.is_some() {
                                res += 1
                            }
                            Ok(res)
                        }
                    )?.unwrap_or(0);
                    let signer_infos = cons.take_set(|cons| { // signerInfos
                        let mut res = Vec::new();
                        while let Some(info) = SignerInfo::take_opt_from(cons)? {
                            res.push(info)
                        }
                        Ok(res)
                    })?;
                    Ok(SignedObject {
                        version,
                        digest_algorithms,
                        content_type,
                        content,
                        certs,
                        crl_count,
                        signer_infos,
                    })
                })
            })
        })
    }
}


//------------ SignerInfo ----------------------------------------------------

/// A decoded signer info.
#[derive(Clone, Debug)]
pub struct SignerInfo {
    version: u8,
    sid: SignerIdentifier,
    digest_algorithm: Oid<Bytes>,

    /// The types of all signed attributes in order.
    signed_attrs: Vec<Oid<Bytes>>,

    /// The signing time attribute if it has a single time value.
    signing_time: Option<SigningTime>,

    signature_algorithm: Oid<Bytes>,
    signature: Bytes,
}

impl SignerInfo {
    pub fn sid(&self) -> &SignerIdentifier {
        &self.sid
    }

    pub fn signing_time(&self) -> Option<&SigningTime> {
        self.signing_time.as_ref()
    }

    /// Returns whether the signer info was created with the given cert.
    ///
    /// This compares the signer identifier with the certificate’s subject
    /// key identifier or its issuer and serial number, depending on the
    /// form of the identifier.
    pub fn matches_cert(&self, cert: &Cert) -> bool {
        match self.sid {
            SignerIdentifier::KeyIdentifier(ref key_id) => {
                cert.subject_key_identifier() == Some(key_id.as_ref())
            }
            SignerIdentifier::IssuerAndSerial { ref issuer, ref serial } => {
                cert.issuer() == issuer.as_slice()
                    && cert.serial() == serial.as_ref()
            }
        }
    }

    /// Takes an optional signer info from the beginning of a value.
    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let version = cons.take_u8()?;
            let sid = SignerIdentifier::take_from(cons)?;
            let digest_algorithm = take_algorithm(cons)?;
            let mut signed_attrs = Vec::new();
            let mut signing_time = None;
            cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                while let Some(()) = cons.take_opt_sequence(|cons| {
                    let attr = Oid::take_from(cons)?;
                    if attr == oid::SIGNING_TIME && signing_time.is_none() {
                        signing_time = SigningTime::take_set_from(cons)?;
                    }
                    else {
                        cons.skip_all()?;
                    }
                    signed_attrs.push(attr);
                    Ok(())
                })? { }
                Ok(())
            })?;
            let signature_algorithm = take_algorithm(cons)?;
            let signature = OctetString::take_from(cons)?.into_bytes();
            // unsignedAttrs
            cons.take_opt_constructed_if(Tag::CTX_1, |cons| cons.skip_all())?;
            Ok(SignerInfo {
                version,
                sid,
                digest_algorithm,
                signed_attrs,
                signing_time,
                signature_algorithm,
                signature,
            })
        })
    }
}


//------------ SignerIdentifier ----------------------------------------------

/// The identifier of the certificate of a signer.
#[derive(Clone, Debug)]
pub enum SignerIdentifier {
    /// The subject key identifier of the certificate.
    KeyIdentifier(Bytes),

    /// The issuer name and serial number of the certificate.
    IssuerAndSerial {
        issuer: Captured,
        serial: Bytes,
    },
}

impl SignerIdentifier {
    /// Returns the key identifier if the identifier is one.
    pub fn key_identifier(&self) -> Option<&[u8]> {
        match *self {
            SignerIdentifier::KeyIdentifier(ref key_id) => {
                Some(key_id.as_ref())
            }
            SignerIdentifier::IssuerAndSerial { .. } => None,
        }
    }

    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        if let Some(key_id) = cons.take_opt_value_if(Tag::CTX_0, |content| {
            OctetString::from_content(content)
        })? {
            return Ok(SignerIdentifier::KeyIdentifier(key_id.into_bytes()))
        }
        cons.take_sequence(|cons| {
            let issuer = cons.capture_one()?;
            let serial = cons.take_primitive_if(Tag::INTEGER, |prim| {
                prim.take_all()
            })?;
            Ok(SignerIdentifier::IssuerAndSerial { issuer, serial })
        })
    }
}


//------------ Helpers -------------------------------------------------------

/// Takes an optional algorithm identifier and returns its algorithm.
///
/// Any parameters are ignored.
fn take_opt_algorithm<S: decode::Source>(
    cons: &mut decode::Constructed<S>
) -> Result<Option<Oid<Bytes>>, DecodeError<S::Error>> {
    cons.take_opt_sequence(|cons| {
        let alg = Oid::take_from(cons)?;
        cons.skip_all()?;
        Ok(alg)
    })
}

fn take_algorithm<S: decode::Source>(
    cons: &mut decode::Constructed<S>
) -> Result<Oid<Bytes>, DecodeError<S::Error>> {
    match take_opt_algorithm(cons)? {
        Some(alg) => Ok(alg),
        None => Err(cons.content_err("missing algorithm identifier"))
    }
}


//------------ Dump ----------------------------------------------------------

/// A helper type displaying the complete structure of a signed object.
pub struct Dump<'a>(&'a SignedObject);

impl<'a> fmt::Display for Dump<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let obj = self.0;
        writeln!(f, "CMS_ContentInfo:")?;
        writeln!(f, "  contentType: {}", oid::describe(&oid::SIGNED_DATA))?;
        writeln!(f, "  d.signedData:")?;
        writeln!(f, "    version: {}", obj.version)?;
        writeln!(f, "    digestAlgorithms:")?;
        for alg in &obj.digest_algorithms {
            writeln!(f, "      algorithm: {}", oid::describe(alg))?;
        }
        writeln!(f, "    encapContentInfo:")?;
        writeln!(
            f, "      eContentType: {}", oid::describe(&obj.content_type)
        )?;
        match obj.content {
            Some(ref content) => {
                writeln!(f, "      eContent: <{} octets>", content.len())?
            }
            None => writeln!(f, "      eContent: <ABSENT>")?,
        }
        writeln!(f, "    certificates:")?;
        if obj.certs.is_empty() {
            writeln!(f, "      <ABSENT>")?;
        }
        for (idx, cert) in obj.certs.iter().enumerate() {
            writeln!(f, "      [{}]:", idx)?;
            writeln!(f, "        serialNumber: {}", hex::colon(cert.serial()))?;
            writeln!(f, "        issuer: <{} octets>", cert.issuer().len())?;
            match cert.subject_key_identifier() {
                Some(key_id) => {
                    writeln!(
                        f, "        subjectKeyIdentifier: {}",
                        hex::colon(key_id)
                    )?
                }
                None => writeln!(f, "        subjectKeyIdentifier: <ABSENT>")?,
            }
        }
        writeln!(f, "    crls: {}", obj.crl_count)?;
        writeln!(f, "    signerInfos:")?;
        for (idx, info) in obj.signer_infos.iter().enumerate() {
            writeln!(f, "      [{}]:", idx)?;
            writeln!(f, "        version: {}", info.version)?;
            match info.sid {
                SignerIdentifier::KeyIdentifier(ref key_id) => {
                    writeln!(
                        f, "        sid.subjectKeyIdentifier: {}",
                        hex::colon(key_id)
                    )?
                }
                SignerIdentifier::IssuerAndSerial { ref issuer, ref serial } => {
                    writeln!(
                        f, "        sid.issuerAndSerialNumber: \
                        issuer <{} octets>, serialNumber {}",
                        issuer.as_slice().len(), hex::colon(serial)
                    )?
                }
            }
            writeln!(
                f, "        digestAlgorithm: {}",
                oid::describe(&info.digest_algorithm)
            )?;
            writeln!(f, "        signedAttrs:")?;
            for attr in &info.signed_attrs {
                writeln!(f, "          object: {}", oid::describe(attr))?;
            }
            if let Some(ref time) = info.signing_time {
                writeln!(f, "        {}", time)?;
                match time.to_time() {
                    Some(time) => writeln!(f, "          decoded: {}", time)?,
                    None => writeln!(f, "          decoded: <INVALID>")?,
                }
            }
            writeln!(
                f, "        signatureAlgorithm: {}",
                oid::describe(&info.signature_algorithm)
            )?;
            writeln!(
                f, "        signature: <{} octets>", info.signature.len()
            )?;
        }
        Ok(())
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::der;

    #[test]
    fn decode_signed_object() {
        let data = der::signed_object(oid::CT_RPKI_MANIFEST, b"\x30\x00");
        let obj = SignedObject::decode(data.as_slice(), true).unwrap();
        assert_eq!(obj.content_type(), &oid::CT_RPKI_MANIFEST);
        assert_eq!(obj.content().unwrap().as_ref(), b"\x30\x00");
        assert_eq!(obj.certs().len(), 1);
        assert_eq!(obj.crl_count(), 0);
        assert_eq!(obj.signer_infos().len(), 1);

        let info = &obj.signer_infos()[0];
        assert_eq!(info.sid().key_identifier(), Some(der::KEY_ID));
        assert!(info.matches_cert(&obj.certs()[0]));
        assert_eq!(
            info.signing_time().map(ToString::to_string),
            Some("signingTime(U) 20240301120000Z".into())
        );
    }

    #[test]
    fn decode_without_content() {
        let data = der::signed_object_with(
            oid::CT_ROUTE_ORIGIN_AUTHZ, None,
            &[], &[der::cert(&[2], b"ca", None), der::cert(&[3], b"ca", None)],
            &[der::signer_info(
                oid::CT_ROUTE_ORIGIN_AUTHZ,
                der::sid_issuer_serial(b"ca", &[3]),
                Some(der::generalized_time("20500101000000Z"))
            )],
        );
        let obj = SignedObject::decode(data.as_slice(), false).unwrap();
        assert!(obj.content().is_none());
        assert!(obj.certs().is_empty());
        assert_eq!(obj.crl_count(), 2);
        let info = &obj.signer_infos()[0];
        assert_eq!(info.sid().key_identifier(), None);
        assert_eq!(
            info.signing_time().map(ToString::to_string),
            Some("signingTime(G) 20500101000000Z".into())
        );
    }

    #[test]
    fn match_issuer_and_serial() {
        let data = der::signed_object_with(
            oid::CT_ROUTE_ORIGIN_AUTHZ, Some(b"\x30\x00"),
            &[der::cert(&[2], b"ca", None), der::cert(&[3], b"ca", None)],
            &[],
            &[der::signer_info(
                oid::CT_ROUTE_ORIGIN_AUTHZ,
                der::sid_issuer_serial(b"ca", &[3]),
                None,
            )],
        );
        let obj = SignedObject::decode(data.as_slice(), false).unwrap();
        let info = &obj.signer_infos()[0];
        assert!(!info.matches_cert(&obj.certs()[0]));
        assert!(info.matches_cert(&obj.certs()[1]));
        assert!(info.signing_time().is_none());
    }

    #[test]
    fn decode_garbage() {
        assert!(SignedObject::decode(b"".as_ref(), false).is_err());
        assert!(
            SignedObject::decode(b"\x30\x03\x02\x01\x00".as_ref(), false)
                .is_err()
        );
        let data = der::sequence(&[
            der::oid(oid::SHA256),
            der::explicit(0, &[der::sequence(&[])]),
        ]);
        assert!(SignedObject::decode(data.as_slice(), false).is_err());
    }

    #[test]
    fn dump() {
        let data = der::signed_object(oid::CT_RPKI_MANIFEST, b"\x30\x00");
        let obj = SignedObject::decode(data.as_slice(), false).unwrap();
        let dump = obj.dump().to_string();
        assert!(dump.starts_with("CMS_ContentInfo:\n"));
        assert!(dump.contains("      eContentType: id-ct-rpkiManifest\n"));
        assert!(dump.contains("      eContent: <2 octets>\n"));
        assert!(dump.contains("        serialNumber: 01\n"));
        assert!(dump.contains("          object: signingTime\n"));
        assert!(dump.contains(
            "        signingTime(U) 20240301120000Z\n\
             \x20         decoded: 2024-03-01T12:00:00+00:00\n"
        ));
        assert!(dump.contains("        signature: <64 octets>\n"));
    }
}
