//! RPKI Manifests.
//!
//! For details, see RFC 6486.

use std::fmt;
use std::convert::Infallible;
use bcder::{decode, BitString, Mode, OctetString, Oid, Tag};
use bcder::decode::DecodeError;
use bytes::Bytes;
use crate::oid;
use crate::error::ObjectError;
use crate::sigobj::SignedObject;
use crate::x509::Time;


//------------ Manifest ------------------------------------------------------

/// A decoded manifest.
#[derive(Clone, Debug)]
pub struct Manifest {
    pub signed: SignedObject,
    pub content: ManifestContent,
}

impl Manifest {
    /// Decodes a manifest without verifying it.
    pub fn decode(bytes: Bytes, strict: bool) -> Result<Self, ObjectError> {
        let signed = SignedObject::decode(bytes, strict)
            .map_err(ObjectError::Envelope)?;
        let content = Self::decode_content(&signed, strict)?;
        Ok(Manifest { signed, content })
    }

    /// Decodes the manifest content of an already decoded signed object.
    pub fn decode_content(
        signed: &SignedObject, strict: bool
    ) -> Result<ManifestContent, ObjectError> {
        if signed.content_type() != &oid::CT_RPKI_MANIFEST {
            return Err(
                ObjectError::ContentType(signed.content_type().clone())
            )
        }
        let content = signed.content().ok_or(ObjectError::MissingContent)?;
        ManifestContent::decode(content, strict).map_err(ObjectError::Manifest)
    }
}


//------------ ManifestContent -----------------------------------------------

/// The content of an RPKI manifest.
#[derive(Clone, Debug)]
pub struct ManifestContent {
    /// The version if it was given explicitly.
    version: Option<u32>,

    /// The number of this manifest.
    manifest_number: ManifestNumber,

    /// The time this iteration of the manifest was created.
    this_update: Time,

    /// The time the next iteration of the manifest is likely to be created.
    next_update: Time,

    /// The algorithm used for the file hashes.
    file_hash_alg: Oid<Bytes>,

    /// The list of files in encoding order.
    files: Vec<FileAndHash>,
}

impl ManifestContent {
    /// Returns the version if it was present in the encoding.
    ///
    /// An absent version means the default version 0.
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn manifest_number(&self) -> &ManifestNumber {
        &self.manifest_number
    }

    pub fn this_update(&self) -> Time {
        self.this_update
    }

    pub fn next_update(&self) -> Time {
        self.next_update
    }

    pub fn file_hash_alg(&self) -> &Oid<Bytes> {
        &self.file_hash_alg
    }

    pub fn files(&self) -> &[FileAndHash] {
        &self.files
    }

    /// Returns the number of entries in the file list.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns whether the file list is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns whether the manifest is stale at the time `now`.
    ///
    /// A manifest is stale if its nextUpdate time has passed.
    pub fn is_stale(&self, now: Time) -> bool {
        self.next_update < now
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
            let version = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                cons.take_u32()
            })?;
            let manifest_number = ManifestNumber::take_from(cons)?;
            let this_update = Time::take_from(cons)?;
            let next_update = Time::take_from(cons)?;
            let file_hash_alg = Oid::take_from(cons)?;
            let files = cons.take_sequence(|cons| {
                let mut files = Vec::new();
                while let Some(item) = FileAndHash::take_opt_from(cons)? {
                    files.push(item)
                }
                Ok(files)
            })?;
            Ok(ManifestContent {
                version, manifest_number, this_update, next_update,
                file_hash_alg, files
            })
        })
    }
}


//------------ ManifestNumber ------------------------------------------------

/// A manifest number.
///
/// Manifest numbers are non-negative integers of up to 20 octets, too large
/// for any native integer type. We keep the content octets and only ever
/// need them for display.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManifestNumber(Bytes);

impl ManifestNumber {
    /// Returns the big-endian octets of the number.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive_if(Tag::INTEGER, |prim| {
            let octets = prim.take_all()?;
            match octets.first() {
                None => Err(prim.content_err("empty integer")),
                Some(first) if first & 0x80 != 0 => {
                    Err(prim.content_err("negative manifest number"))
                }
                Some(_) => Ok(ManifestNumber(octets)),
            }
        })
    }
}

impl fmt::Display for ManifestNumber {
    /// Formats the number in decimal.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Repeated long division by ten over the big-endian octets.
        let mut value: Vec<u8> = self.0.iter().copied().skip_while(|x| {
            *x == 0
        }).collect();
        if value.is_empty() {
            return f.write_str("0")
        }
        let mut digits = Vec::new();
        while !value.is_empty() {
            let mut rem = 0u16;
            for octet in value.iter_mut() {
                let cur = (rem << 8) | u16::from(*octet);
                *octet = (cur / 10) as u8;
                rem = cur % 10;
            }
            digits.push(b'0' + rem as u8);
            let zeros = value.iter().take_while(|x| **x == 0).count();
            value.drain(..zeros);
        }
        digits.reverse();
        f.write_str(&String::from_utf8_lossy(&digits))
    }
}


//------------ FileAndHash ---------------------------------------------------

/// An entry in the manifest file list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileAndHash {
    /// The name of the file.
    file: String,

    /// The hash over the file’s content.
    hash: Bytes,
}

impl FileAndHash {
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn hash(&self) -> &[u8] {
        self.hash.as_ref()
    }

    /// Takes an optional value from the beginning of a constructed value.
    fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let file = cons.take_value_if(
                Tag::IA5_STRING,
                OctetString::from_content
            )?;
            let file = match String::from_utf8(file.to_bytes().to_vec()) {
                Ok(file) if file.is_ascii() => file,
                _ => return Err(cons.content_err("invalid file name")),
            };
            let hash = BitString::take_from(cons)?;
            if hash.unused() != 0 {
                return Err(cons.content_err("invalid file hash"))
            }
            Ok(FileAndHash { file, hash: hash.octet_bytes() })
        })
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::der;

    fn number(octets: &[u8]) -> String {
        ManifestNumber(Bytes::copy_from_slice(octets)).to_string()
    }

    #[test]
    fn manifest_number_decimal() {
        assert_eq!(number(&[0]), "0");
        assert_eq!(number(&[0x00, 0x80]), "128");
        assert_eq!(number(&[0x01, 0x00]), "256");
        assert_eq!(number(&[0x3B, 0x9A, 0xCA, 0x00]), "1000000000");
        assert_eq!(
            number(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
            "18446744073709551615"
        );
        assert_eq!(
            number(&[0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            "340282366920938463463374607431768211456"
        );
    }

    fn signed_manifest(version: Option<u64>, next_update: &str) -> Bytes {
        Bytes::from(der::signed_object(
            oid::CT_RPKI_MANIFEST,
            &der::manifest(
                version, &[0x01, 0x00],
                "20240301120000Z", next_update,
                &[("a.roa", &[0xde, 0xad]), ("b.crl", &[0xbe, 0xef])]
            )
        ))
    }

    #[test]
    fn decode_manifest() {
        let mft = Manifest::decode(
            signed_manifest(Some(0), "20240302120000Z"), true
        ).unwrap();
        let content = &mft.content;
        assert_eq!(content.version(), Some(0));
        assert_eq!(content.manifest_number().to_string(), "256");
        assert_eq!(
            content.this_update(), Time::utc(2024, 3, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(content.file_hash_alg(), &oid::SHA256);
        assert_eq!(content.len(), 2);
        assert_eq!(content.files()[0].file(), "a.roa");
        assert_eq!(content.files()[1].hash(), &[0xbe, 0xef]);
    }

    #[test]
    fn default_version() {
        let mft = Manifest::decode(
            signed_manifest(None, "20240302120000Z"), false
        ).unwrap();
        assert_eq!(mft.content.version(), None);
    }

    #[test]
    fn stale() {
        let mft = Manifest::decode(
            signed_manifest(None, "20240302120000Z"), false
        ).unwrap();
        let next = Time::utc(2024, 3, 2, 12, 0, 0).unwrap();
        assert!(!mft.content.is_stale(next));
        assert!(mft.content.is_stale(Time::utc(2024, 3, 2, 12, 0, 1).unwrap()));
        assert!(!mft.content.is_stale(Time::utc(2024, 3, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn decode_errors() {
        let data = der::signed_roa(1, &[]);
        assert!(matches!(
            Manifest::decode(Bytes::from(data), false),
            Err(ObjectError::ContentType(_))
        ));

        let data = der::signed_object(oid::CT_RPKI_MANIFEST, b"\x30\x00");
        assert!(matches!(
            Manifest::decode(Bytes::from(data), false),
            Err(ObjectError::Manifest(_))
        ));

        let data = der::signed_object_with(
            oid::CT_RPKI_MANIFEST, None, &[], &[], &[]
        );
        assert!(matches!(
            Manifest::decode(Bytes::from(data), false),
            Err(ObjectError::MissingContent)
        ));
    }
}
