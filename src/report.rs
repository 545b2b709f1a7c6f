//! Human-readable reports on manifests.
//!
//! Reports are values implementing `Display`, so callers decide where they
//! go. Each line ends in a newline.

use std::fmt;
use bcder::Oid;
use bytes::Bytes;
use crate::oid;
use crate::manifest::ManifestContent;
use crate::sigobj::SignedObject;
use crate::util::hex;
use crate::x509::{SigningTime, Time};


//------------ SignerInfoSummary ---------------------------------------------

/// What we report about the signers of a signed object.
#[derive(Clone, Debug)]
pub struct SignerInfoSummary {
    cert_count: usize,
    crl_count: usize,
    signers: Vec<SignerSummary>,
}

/// What we report about one signer.
#[derive(Clone, Debug)]
pub struct SignerSummary {
    /// The key identifier of the signer if it is identified by one.
    key_id: Option<Bytes>,

    /// The indexes of all embedded certificates matching the signer.
    matching_certs: Vec<usize>,

    signing_time: Option<SigningTime>,
}

impl SignerInfoSummary {
    /// Collects the summary from a decoded signed object.
    pub fn from_signed(signed: &SignedObject) -> Self {
        SignerInfoSummary {
            cert_count: signed.certs().len(),
            crl_count: signed.crl_count(),
            signers: signed.signer_infos().iter().map(|info| {
                SignerSummary {
                    key_id: info.sid().key_identifier().map(
                        Bytes::copy_from_slice
                    ),
                    matching_certs: signed.certs().iter().enumerate()
                        .filter(|(_, cert)| info.matches_cert(cert))
                        .map(|(idx, _)| idx)
                        .collect(),
                    signing_time: info.signing_time().cloned(),
                }
            }).collect(),
        }
    }

    pub fn cert_count(&self) -> usize {
        self.cert_count
    }

    pub fn crl_count(&self) -> usize {
        self.crl_count
    }
}

impl fmt::Display for SignerInfoSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Certificates:   {}", self.cert_count)?;
        writeln!(f, "CRLs:           {}", self.crl_count)?;
        for (idx, signer) in self.signers.iter().enumerate() {
            write!(f, "SignerId[{}]:    ", idx)?;
            match signer.key_id {
                Some(ref key_id) => write!(f, "{}", hex::colon(key_id))?,
                None => f.write_str("[Could not read SID]")?,
            }
            for cert in &signer.matching_certs {
                write!(f, " [Matches certificate {}]", cert)?;
            }
            if let Some(ref time) = signer.signing_time {
                write!(f, " [{}]", time)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Returns the signer report for a signed object.
pub fn report_signer_info(signed: &SignedObject) -> SignerInfoSummary {
    SignerInfoSummary::from_signed(signed)
}


//------------ ManifestReport ------------------------------------------------

/// The report on the content of a manifest.
pub struct ManifestReport<'a> {
    content_type: &'a Oid<Bytes>,
    manifest: &'a ManifestContent,
    now: Time,
}

impl<'a> fmt::Display for ManifestReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mft = self.manifest;
        writeln!(f, "eContentType:   {}", oid::describe(self.content_type))?;
        match mft.version() {
            Some(version) => writeln!(f, "version:        {}", version)?,
            None => writeln!(f, "version:        0 [Defaulted]")?,
        }
        writeln!(f, "manifestNumber: {}", mft.manifest_number())?;
        writeln!(f, "thisUpdate:     {}", mft.this_update().generalized())?;
        writeln!(f, "nextUpdate:     {}", mft.next_update().generalized())?;
        writeln!(f, "fileHashAlg:    {}", oid::describe(mft.file_hash_alg()))?;
        for (idx, item) in mft.files().iter().enumerate() {
            writeln!(
                f, "fileList[{:3}]:  {}  {}",
                idx, hex::colon(item.hash()), item.file()
            )?;
        }
        if mft.is_stale(self.now) {
            writeln!(f, "MANIFEST IS STALE")?;
        }
        Ok(())
    }
}

/// Returns the report for a manifest.
///
/// Staleness is judged against `now`.
pub fn report<'a>(
    content_type: &'a Oid<Bytes>,
    manifest: &'a ManifestContent,
    now: Time,
) -> ManifestReport<'a> {
    ManifestReport { content_type, manifest, now }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::manifest::Manifest;
    use crate::test::der;

    fn manifest(version: Option<u64>) -> Manifest {
        let data = der::signed_object(
            oid::CT_RPKI_MANIFEST,
            &der::manifest(
                version, &[0x2A],
                "20240301120000Z", "20240302120000Z",
                &[("a.roa", &[0xde, 0xad, 0x01]), ("b.crl", &[0x0f])]
            )
        );
        Manifest::decode(Bytes::from(data), false).unwrap()
    }

    #[test]
    fn manifest_report() {
        let mft = manifest(Some(0));
        let now = Time::utc(2024, 3, 1, 18, 0, 0).unwrap();
        assert_eq!(
            report(mft.signed.content_type(), &mft.content, now).to_string(),
            "eContentType:   id-ct-rpkiManifest\n\
             version:        0\n\
             manifestNumber: 42\n\
             thisUpdate:     20240301120000Z\n\
             nextUpdate:     20240302120000Z\n\
             fileHashAlg:    sha256\n\
             fileList[  0]:  de:ad:01  a.roa\n\
             fileList[  1]:  0f  b.crl\n"
        );
    }

    #[test]
    fn stale_and_defaulted() {
        let mft = manifest(None);
        let now = Time::utc(2024, 3, 3, 0, 0, 0).unwrap();
        let report = report(
            mft.signed.content_type(), &mft.content, now
        ).to_string();
        assert!(report.contains("version:        0 [Defaulted]\n"));
        assert!(report.ends_with("MANIFEST IS STALE\n"));
    }

    #[test]
    fn signer_report() {
        let mft = manifest(None);
        assert_eq!(
            report_signer_info(&mft.signed).to_string(),
            "Certificates:   1\n\
             CRLs:           0\n\
             SignerId[0]:    0b:1c:2d:3e:4f:50:61:72:83:94:a5:b6:c7:d8:e9:fa:\
             01:12:23:34 [Matches certificate 0] \
             [signingTime(U) 20240301120000Z]\n"
        );
    }

    #[test]
    fn signer_report_without_key_id() {
        let data = der::signed_object_with(
            oid::CT_RPKI_MANIFEST, Some(b"\x30\x00"),
            &[der::cert(&[7], b"ca", None)], &[der::cert(&[8], b"ca", None)],
            &[der::signer_info(
                oid::CT_RPKI_MANIFEST,
                der::sid_issuer_serial(b"ca", &[7]),
                Some(der::utc_time("991231235959Z")),
            )],
        );
        let signed = SignedObject::decode(data.as_slice(), false).unwrap();
        assert_eq!(
            report_signer_info(&signed).to_string(),
            "Certificates:   1\n\
             CRLs:           1\n\
             SignerId[0]:    [Could not read SID] [Matches certificate 0] \
             [signingTime(U) 19991231235959Z]\n"
        );
    }
}
