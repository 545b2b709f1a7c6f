//! IP address prefixes.
//!
//! ROAs encode their prefixes as the `IPAddress` BIT STRING defined in
//! section 2.1.1 of RFC 3779: the bits of the prefix and nothing else. The
//! number of unused bits in the last octet determines the prefix length.
//!
//! This module converts between that encoding and [`Prefix`], a prefix held
//! in a fixed-width address buffer, and provides the canonical text forms
//! used in output.

use std::{error, fmt};
use std::net::{AddrParseError, IpAddr};
use std::num::ParseIntError;
use std::str::FromStr;
use bcder::{decode, BitString, OctetString};
use bcder::decode::{ContentError, DecodeError};


/// The size of the address buffer of a prefix in octets.
pub const ADDR_BUF_LEN: usize = 16;


//------------ AddressFamily -------------------------------------------------

/// The address family of a prefix.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AddressFamily {
    /// IPv4.
    ///
    /// This is encoded by a two octet AFI with value `0x00 0x01`.
    Ipv4,

    /// IPv6.
    ///
    /// This is encoded by a two octet AFI with value `0x00 0x02`.
    Ipv6,
}

impl AddressFamily {
    /// Returns the family for an IANA address family identifier.
    pub fn from_afi(afi: u16) -> Option<Self> {
        match afi {
            1 => Some(AddressFamily::Ipv4),
            2 => Some(AddressFamily::Ipv6),
            _ => None,
        }
    }

    /// Returns the IANA address family identifier.
    pub fn afi(self) -> u16 {
        match self {
            AddressFamily::Ipv4 => 1,
            AddressFamily::Ipv6 => 2,
        }
    }

    /// Returns the width of an address of this family in octets.
    pub fn addr_width(self) -> usize {
        match self {
            AddressFamily::Ipv4 => 4,
            AddressFamily::Ipv6 => 16,
        }
    }

    /// Returns the maximum prefix length for this family.
    pub fn max_addr_len(self) -> u8 {
        match self {
            AddressFamily::Ipv4 => 32,
            AddressFamily::Ipv6 => 128,
        }
    }

    /// Takes the `addressFamily` of a ROA address block.
    ///
    /// This is an OCTET STRING of the two octet AFI optionally followed by
    /// a SAFI. RPKI doesn’t use SAFIs, so we accept a SAFI of zero but
    /// nothing else.
    ///
    /// Returns `Ok(None)` for a well-formed value with an AFI other than
    /// IPv4 or IPv6.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        let family = OctetString::take_from(cons)?;
        let mut octets = family.octets();
        let afi = match (octets.next(), octets.next()) {
            (Some(hi), Some(lo)) => u16::from_be_bytes([hi, lo]),
            _ => {
                return Err(cons.content_err("short address family"))
            }
        };
        match octets.next() {
            None | Some(0) => { }
            Some(_) => {
                return Err(cons.content_err("SAFI in ROA address family"))
            }
        }
        if octets.next().is_some() {
            return Err(cons.content_err("overlong address family"))
        }
        Ok(Self::from_afi(afi))
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            AddressFamily::Ipv4 => "IPv4",
            AddressFamily::Ipv6 => "IPv6",
        })
    }
}


//------------ Prefix --------------------------------------------------------

/// An IP address prefix.
///
/// The address is kept in a buffer of [`ADDR_BUF_LEN`] octets. All bits
/// past the prefix length are zero, including the octets past the width of
/// the address family.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Prefix {
    family: AddressFamily,
    addr: [u8; ADDR_BUF_LEN],
    len: u8,
}

impl Prefix {
    /// Creates a new prefix from address octets and a length.
    ///
    /// Bits past `len` are cleared. Returns an error if there are more
    /// octets than the family allows or `len` is too large for the family.
    pub fn new(
        family: AddressFamily, octets: &[u8], len: u8
    ) -> Result<Self, MalformedPrefix> {
        if octets.len() > family.addr_width() || len > family.max_addr_len()
        {
            return Err(MalformedPrefix::new(family, octets.len()))
        }
        let mut addr = [0u8; ADDR_BUF_LEN];
        addr[..octets.len()].copy_from_slice(octets);
        Ok(Prefix { family, addr: mask(addr, len), len })
    }

    /// Creates a prefix from the octets and unused bits of a bit string.
    ///
    /// The length of the prefix is the number of bits in the bit string.
    /// The unused bits in the last octet are cleared whatever their value.
    pub fn from_bits(
        family: AddressFamily, octets: &[u8], unused: u8
    ) -> Result<Self, MalformedPrefix> {
        if octets.len() > family.addr_width()
            || unused > 7
            || (octets.is_empty() && unused != 0)
        {
            return Err(MalformedPrefix::new(family, octets.len()))
        }
        // Fits a u8 since the width is at most 16 octets.
        let len = (octets.len() * 8) as u8 - unused;
        Self::new(family, octets, len)
    }

    /// Creates a prefix from an encoded bit string.
    pub fn from_bit_string(
        family: AddressFamily, bits: &BitString
    ) -> Result<Self, MalformedPrefix> {
        if bits.octet_len() > family.addr_width() {
            return Err(MalformedPrefix::new(family, bits.octet_len()))
        }
        let octets: Vec<u8> = bits.octets().collect();
        Self::from_bits(family, &octets, bits.unused())
    }

    /// Takes an encoded prefix of the given family from a source.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
        family: AddressFamily,
    ) -> Result<Self, DecodeError<S::Error>> {
        let bits = BitString::take_from(cons)?;
        Self::from_bit_string(family, &bits).map_err(|err| {
            cons.content_err(err)
        })
    }

    /// Creates a prefix from an IP address and a length.
    pub fn from_addr(addr: IpAddr, len: u8) -> Result<Self, FromStrError> {
        let res = match addr {
            IpAddr::V4(addr) => {
                Self::new(AddressFamily::Ipv4, &addr.octets(), len)
            }
            IpAddr::V6(addr) => {
                Self::new(AddressFamily::Ipv6, &addr.octets(), len)
            }
        };
        res.map_err(|_| FromStrError::LengthOverflow(len))
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Returns the significant octets of the address buffer.
    ///
    /// These are the octets of an address of the prefix’s family.
    pub fn addr(&self) -> &[u8] {
        &self.addr[..self.family.addr_width()]
    }

    /// Returns the length of the prefix in bits.
    pub fn addr_len(&self) -> u8 {
        self.len
    }

    /// Returns the bit string representation of the prefix.
    ///
    /// The result is the octets containing prefix bits and the number of
    /// unused bits in the last of them.
    pub fn to_bits(&self) -> (&[u8], u8) {
        let octets = usize::from(self.len).div_ceil(8);
        let unused = (8 - self.len % 8) % 8;
        (&self.addr[..octets], unused)
    }

    /// Returns whether the first `bits` bits of both prefixes are equal.
    ///
    /// Whole octets are compared first, the remaining bits of the next
    /// octet under the mask `0xFF << (8 - remainder)`.
    pub fn leading_bits_eq(&self, other: &Prefix, bits: u8) -> bool {
        let whole = usize::from(bits / 8);
        let rem = bits % 8;
        if self.addr[..whole] != other.addr[..whole] {
            return false
        }
        if rem == 0 {
            return true
        }
        let mask = 0xFFu8 << (8 - rem);
        (self.addr[whole] ^ other.addr[whole]) & mask == 0
    }

    /// Returns an object that displays only the address of the prefix.
    pub fn display_addr(&self) -> DisplayAddr<'_> {
        DisplayAddr(self)
    }

    /// Formats the address as a dotted quad.
    fn fmt_v4(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f, "{}.{}.{}.{}",
            self.addr[0], self.addr[1], self.addr[2], self.addr[3]
        )
    }

    /// Formats the address in compressed IPv6 notation.
    ///
    /// The longest run of at least two zero groups, the first one if there
    /// are several, is replaced by `::`. Embedded IPv4 notation is never
    /// used.
    fn fmt_v6(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut groups = [0u16; 8];
        for (group, octets) in groups.iter_mut().zip(self.addr.chunks(2)) {
            *group = u16::from_be_bytes([octets[0], octets[1]]);
        }

        let (mut run_start, mut run_len) = (0, 0);
        let (mut cur_start, mut cur_len) = (0, 0);
        for (i, &group) in groups.iter().enumerate() {
            if group == 0 {
                if cur_len == 0 {
                    cur_start = i;
                }
                cur_len += 1;
                if cur_len > run_len {
                    run_start = cur_start;
                    run_len = cur_len;
                }
            }
            else {
                cur_len = 0;
            }
        }

        if run_len < 2 {
            return fmt_groups(&groups, f)
        }
        fmt_groups(&groups[..run_start], f)?;
        f.write_str("::")?;
        fmt_groups(&groups[run_start + run_len..], f)
    }
}

fn fmt_groups(groups: &[u16], f: &mut fmt::Formatter) -> fmt::Result {
    let mut iter = groups.iter();
    if let Some(first) = iter.next() {
        write!(f, "{:x}", first)?;
        for group in iter {
            write!(f, ":{:x}", group)?;
        }
    }
    Ok(())
}

/// Clears all bits of `addr` past `len`.
fn mask(mut addr: [u8; ADDR_BUF_LEN], len: u8) -> [u8; ADDR_BUF_LEN] {
    let whole = usize::from(len / 8);
    let rem = len % 8;
    if whole < ADDR_BUF_LEN {
        if rem != 0 {
            addr[whole] &= 0xFFu8 << (8 - rem);
            addr[whole + 1..].iter_mut().for_each(|x| *x = 0);
        }
        else {
            addr[whole..].iter_mut().for_each(|x| *x = 0);
        }
    }
    addr
}


//--- FromStr

impl FromStr for Prefix {
    type Err = FromStrError;

    /// Parses a prefix from `<address>[/<length>]`.
    ///
    /// Without a length, the prefix is a host prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.find('/') {
            Some(sep) => {
                let addr = IpAddr::from_str(&s[..sep])?;
                let len = u8::from_str(&s[sep + 1..])?;
                Self::from_addr(addr, len)
            }
            None => {
                let addr = IpAddr::from_str(s)?;
                let len = match addr {
                    IpAddr::V4(_) => 32,
                    IpAddr::V6(_) => 128,
                };
                Self::from_addr(addr, len)
            }
        }
    }
}


//--- Display

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.display_addr(), self.len)
    }
}


//------------ DisplayAddr ---------------------------------------------------

/// A helper type displaying the address of a prefix.
pub struct DisplayAddr<'a>(&'a Prefix);

impl<'a> fmt::Display for DisplayAddr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.family {
            AddressFamily::Ipv4 => self.0.fmt_v4(f),
            AddressFamily::Ipv6 => self.0.fmt_v6(f),
        }
    }
}


//============ Errors ========================================================

//------------ MalformedPrefix -----------------------------------------------

/// An encoded prefix doesn’t fit its address family.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MalformedPrefix {
    family: AddressFamily,
    octets: usize,
}

impl MalformedPrefix {
    fn new(family: AddressFamily, octets: usize) -> Self {
        MalformedPrefix { family, octets }
    }
}

impl fmt::Display for MalformedPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f, "malformed {} prefix ({} octets)", self.family, self.octets
        )
    }
}

impl error::Error for MalformedPrefix { }

impl From<MalformedPrefix> for ContentError {
    fn from(err: MalformedPrefix) -> Self {
        ContentError::from_boxed(Box::new(err))
    }
}


//------------ FromStrError --------------------------------------------------

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FromStrError {
    Addr(AddrParseError),
    PrefixLen(ParseIntError),
    LengthOverflow(u8),
}

impl From<AddrParseError> for FromStrError {
    fn from(err: AddrParseError) -> Self {
        FromStrError::Addr(err)
    }
}

impl From<ParseIntError> for FromStrError {
    fn from(err: ParseIntError) -> Self {
        FromStrError::PrefixLen(err)
    }
}

impl fmt::Display for FromStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FromStrError::Addr(ref err) => {
                write!(f, "unknown address family: {}", err)
            }
            FromStrError::PrefixLen(ref err) => {
                write!(f, "bad prefix length: {}", err)
            }
            FromStrError::LengthOverflow(len) => {
                write!(f, "bad prefix length: {} too large", len)
            }
        }
    }
}

impl error::Error for FromStrError { }


//============ Tests =========================================================
