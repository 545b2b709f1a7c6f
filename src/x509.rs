//! Bits and pieces of X.509 needed for inspecting signed objects.
//!
//! Signed objects carry certificates and times. We never validate any of
//! them, so this module only extracts what the reports need: times,
//! signing times in their original encoding, and the identifying parts of
//! embedded certificates.

use std::{fmt, str};
use std::str::FromStr;
use bcder::{decode, Captured, Mode, OctetString, Oid, Tag};
use bcder::decode::{ContentError, DecodeError, Source};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use crate::oid;


//------------ Time ----------------------------------------------------------

/// A point in time as used in RPKI objects.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Time(DateTime<Utc>);

impl Time {
    pub fn now() -> Self {
        Time(Utc::now())
    }

    pub fn utc(
        year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32
    ) -> Option<Self> {
        Self::from_parts((year, month, day, hour, min, sec)).ok()
    }

    /// Takes a time from either a UTCTime or a GeneralizedTime value.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive(|tag, prim| {
            let year = if tag == Tag::UTC_TIME {
                // RFC 5280 requires the format YYMMDDHHMMSSZ
                utc_century(read_two_char(prim)? as i32)
            }
            else if tag == Tag::GENERALIZED_TIME {
                // RFC 5280 requires the format YYYYMMDDHHMMSSZ
                read_four_char(prim)? as i32
            }
            else {
                return Err(prim.content_err("malformed time value"))
            };
            let res = (
                year,
                read_two_char(prim)?,
                read_two_char(prim)?,
                read_two_char(prim)?,
                read_two_char(prim)?,
                read_two_char(prim)?,
            );
            if prim.take_u8()? != b'Z' {
                return Err(prim.content_err("malformed time value"))
            }
            Self::from_parts(res).map_err(|err| prim.content_err(err))
        })
    }

    fn from_parts(
        parts: (i32, u32, u32, u32, u32, u32)
    ) -> Result<Self, ContentError> {
        NaiveDate::from_ymd_opt(parts.0, parts.1, parts.2)
            .and_then(|date| date.and_hms_opt(parts.3, parts.4, parts.5))
            .map(|dt| Time(Utc.from_utc_datetime(&dt)))
            .ok_or_else(|| {
                ContentError::from_static("malformed time value")
            })
    }

    /// Returns an object displaying the time in GeneralizedTime format.
    pub fn generalized(self) -> impl fmt::Display {
        self.0.format("%Y%m%d%H%M%SZ")
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Expands a two digit UTCTime year.
///
/// Values below 50 are in the 21st century, all others in the 20th.
fn utc_century(year: i32) -> i32 {
    if year >= 50 { year + 1900 } else { year + 2000 }
}

fn read_two_char<S: decode::Source>(
    source: &mut S
) -> Result<u32, DecodeError<S::Error>> {
    let mut s = [0u8; 2];
    s[0] = source.take_u8()?;
    s[1] = source.take_u8()?;
    parse_digits(source, &s)
}

fn read_four_char<S: decode::Source>(
    source: &mut S
) -> Result<u32, DecodeError<S::Error>> {
    let mut s = [0u8; 4];
    for ch in s.iter_mut() {
        *ch = source.take_u8()?;
    }
    parse_digits(source, &s)
}

fn parse_digits<S: decode::Source>(
    source: &S, s: &[u8]
) -> Result<u32, DecodeError<S::Error>> {
    if !s.iter().all(u8::is_ascii_digit) {
        return Err(source.content_err("malformed time value"))
    }
    str::from_utf8(s).ok().and_then(|s| u32::from_str(s).ok()).ok_or_else(|| {
        source.content_err("malformed time value")
    })
}


//------------ SigningTime ---------------------------------------------------

/// The value of a signing time attribute as it was encoded.
///
/// The reports show signing times verbatim, only expanding the two digit
/// year of a UTCTime, so we keep the raw octets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SigningTime {
    /// A UTCTime in the form `YYMMDDHHMMSSZ`.
    Utc(Bytes),

    /// A GeneralizedTime in the form `YYYYMMDDHHMMSSZ`.
    Generalized(Bytes),
}

impl SigningTime {
    /// Takes the value set of a signing time attribute.
    ///
    /// Returns `None` if the set doesn’t contain exactly one value or if
    /// that value is of neither time type.
    pub fn take_set_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_set(|cons| {
            let res = if let Some(raw) = cons.take_opt_primitive_if(
                Tag::UTC_TIME, |prim| prim.take_all()
            )? {
                Some(SigningTime::Utc(raw))
            }
            else if let Some(raw) = cons.take_opt_primitive_if(
                Tag::GENERALIZED_TIME, |prim| prim.take_all()
            )? {
                Some(SigningTime::Generalized(raw))
            }
            else {
                None
            };
            if cons.skip_one()?.is_some() {
                cons.skip_all()?;
                return Ok(None)
            }
            Ok(res)
        })
    }

    /// Returns the time with a four digit year in GeneralizedTime format.
    ///
    /// A UTCTime gets the century `20` if its first digit is less than `5`
    /// and `19` otherwise.
    pub fn expanded(&self) -> String {
        match *self {
            SigningTime::Utc(ref raw) => {
                let century = match raw.first() {
                    Some(ch) if *ch < b'5' => "20",
                    _ => "19",
                };
                format!("{}{}", century, String::from_utf8_lossy(raw))
            }
            SigningTime::Generalized(ref raw) => {
                String::from_utf8_lossy(raw).into_owned()
            }
        }
    }

    /// Converts the signing time into a time value if it is well-formed.
    pub fn to_time(&self) -> Option<Time> {
        let expanded = self.expanded();
        let digits = expanded.strip_suffix('Z')?;
        if digits.len() != 14 || !digits.bytes().all(|ch| ch.is_ascii_digit())
        {
            return None
        }
        let num = |range: std::ops::Range<usize>| {
            u32::from_str(&digits[range]).ok()
        };
        Time::utc(
            num(0..4)? as i32, num(4..6)?, num(6..8)?,
            num(8..10)?, num(10..12)?, num(12..14)?
        )
    }
}

impl fmt::Display for SigningTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match *self {
            SigningTime::Utc(_) => "U",
            SigningTime::Generalized(_) => "G",
        };
        write!(f, "signingTime({}) {}", kind, self.expanded())
    }
}


//------------ Cert ----------------------------------------------------------

/// The identifying parts of a certificate embedded in a signed object.
///
/// We only pick out what is needed to match the certificate against a
/// signer identifier: the serial number, the issuer name in its encoded
/// form, and the subject key identifier extension if present.
#[derive(Clone, Debug)]
pub struct Cert {
    serial: Bytes,
    issuer: Captured,
    subject_key_id: Option<Bytes>,
}

impl Cert {
    pub fn serial(&self) -> &[u8] {
        self.serial.as_ref()
    }

    pub fn issuer(&self) -> &[u8] {
        self.issuer.as_slice()
    }

    pub fn subject_key_identifier(&self) -> Option<&[u8]> {
        self.subject_key_id.as_ref().map(AsRef::as_ref)
    }

    /// Takes an optional certificate from the beginning of a value.
    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let res = cons.take_sequence(Self::take_tbs_from)?;
            // signatureAlgorithm and signatureValue
            cons.skip_all()?;
            Ok(res)
        })
    }

    fn take_tbs_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        // version [0] EXPLICIT Version DEFAULT v1
        cons.take_opt_constructed_if(Tag::CTX_0, |cons| cons.skip_all())?;
        let serial = cons.take_primitive_if(Tag::INTEGER, |prim| {
            prim.take_all()
        })?;
        skip_required(cons, "missing signature algorithm")?;
        let issuer = cons.capture_one()?;
        skip_required(cons, "missing validity")?;
        skip_required(cons, "missing subject")?;
        skip_required(cons, "missing subject public key info")?;
        // issuerUniqueID and subjectUniqueID
        cons.take_opt_primitive_if(Tag::CTX_1, |prim| prim.skip_all())?;
        cons.take_opt_primitive_if(Tag::CTX_2, |prim| prim.skip_all())?;
        let subject_key_id = cons.take_opt_constructed_if(
            Tag::CTX_3, Self::take_key_identifier
        )?.flatten();
        Ok(Cert { serial, issuer, subject_key_id })
    }

    /// Takes the extensions and picks out the subject key identifier.
    fn take_key_identifier<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Bytes>, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let mut res = None;
            while let Some(()) = cons.take_opt_sequence(|cons| {
                let id = Oid::take_from(cons)?;
                cons.take_opt_bool()?;
                let value = OctetString::take_from(cons)?;
                if id == oid::CE_SUBJECT_KEY_IDENTIFIER {
                    let key_id = Mode::Ber.decode(
                        value.into_bytes(), OctetString::take_from
                    ).map_err(DecodeError::convert)?;
                    res = Some(key_id.into_bytes());
                }
                Ok(())
            })? { }
            Ok(res)
        })
    }
}

fn skip_required<S: decode::Source>(
    cons: &mut decode::Constructed<S>,
    msg: &'static str,
) -> Result<(), DecodeError<S::Error>> {
    if cons.skip_one()?.is_none() {
        return Err(cons.content_err(msg))
    }
    Ok(())
}


//============ Tests =========================================================
