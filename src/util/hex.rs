//! Converting octets to hex strings.

use std::fmt;


/// Returns an object displaying octets as colon separated hex pairs.
///
/// This is the `aa:bb:cc` form used for hashes and key identifiers in the
/// reports. The digits are lower case.
pub fn colon(src: &[u8]) -> Colon<'_> {
    Colon(src)
}

/// The helper type returned by [`colon`].
pub struct Colon<'a>(&'a [u8]);

impl<'a> fmt::Display for Colon<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some(first) = iter.next() {
            f.write_str(str_u8(*first))?;
            for ch in iter {
                f.write_str(":")?;
                f.write_str(str_u8(*ch))?;
            }
        }
        Ok(())
    }
}

fn str_u8(ch: u8) -> &'static str {
    let idx = usize::from(ch) * 2;
    &PAIRS[idx..idx + 2]
}

/// All octet values as two digit hex, back to back.
const PAIRS: &str = "\
    000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f\
    202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f\
    404142434445464748494a4b4c4d4e4f505152535455565758595a5b5c5d5e5f\
    606162636465666768696a6b6c6d6e6f707172737475767778797a7b7c7d7e7f\
    808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f\
    a0a1a2a3a4a5a6a7a8a9aaabacadaeafb0b1b2b3b4b5b6b7b8b9babbbcbdbebf\
    c0c1c2c3c4c5c6c7c8c9cacbcccdcecfd0d1d2d3d4d5d6d7d8d9dadbdcdddedf\
    e0e1e2e3e4e5e6e7e8e9eaebecedeeeff0f1f2f3f4f5f6f7f8f9fafbfcfdfeff";


//============ Tests =========================================================
