//! Genotype (`GT`) encoding
//!
//! Each allele of a call is stored as one integer `(allele + 1) << 1 | phased`,
//! where a missing allele (`.`) is 0 and `phased` is set when the allele is
//! preceded by `|`. Shorter calls within a record are padded with
//! [`MISSING_INT`], which ends the call.

use memchr::memchr2;

use crate::codec::MISSING_INT;
use crate::error::{RecordError, Result};

/// Largest allele index that survives the shift into an `i32`
const MAX_ALLELE: i32 = (1 << 30) - 2;

/// Parses a genotype string such as `0/1`, `1|1`, or `./.`
///
/// # Errors
///
/// Returns [`RecordError::InvalidGenotype`] for empty or non-numeric alleles.
pub fn parse_genotype(gt: &str) -> Result<Vec<i32>> {
    let invalid = || RecordError::InvalidGenotype(gt.to_string());
    let mut encoded = Vec::with_capacity(2);
    let mut rest = gt.as_bytes();
    let mut phased = false;
    loop {
        let end = memchr2(b'/', b'|', rest).unwrap_or(rest.len());
        let allele = match &rest[..end] {
            b"." => 0,
            token => std::str::from_utf8(token)
                .ok()
                .and_then(|t| t.parse::<i32>().ok())
                .filter(|a| (0..=MAX_ALLELE).contains(a))
                .ok_or_else(invalid)?
                + 1,
        };
        encoded.push(allele << 1 | i32::from(phased));
        if end == rest.len() {
            break;
        }
        phased = rest[end] == b'|';
        rest = &rest[end + 1..];
    }
    Ok(encoded)
}

/// The allele index of an encoded value, `None` when missing
#[must_use]
pub fn allele(encoded: i32) -> Option<i32> {
    match encoded >> 1 {
        0 => None,
        x => Some(x - 1),
    }
}

/// Whether an encoded allele is phased with its predecessor
#[must_use]
pub fn is_phased(encoded: i32) -> bool {
    encoded & 1 == 1
}

/// Renders encoded alleles back to text, stopping at the padding marker
pub fn write_genotype(out: &mut String, encoded: &[i32]) {
    let mut itoa = itoa::Buffer::new();
    let mut written = false;
    for (i, &x) in encoded.iter().enumerate() {
        if x == MISSING_INT {
            break;
        }
        if i > 0 {
            out.push(if is_phased(x) { '|' } else { '/' });
        }
        match allele(x) {
            Some(a) => out.push_str(itoa.format(a)),
            None => out.push('.'),
        }
        written = true;
    }
    if !written {
        out.push('.');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(encoded: &[i32]) -> String {
        let mut out = String::new();
        write_genotype(&mut out, encoded);
        out
    }

    #[test]
    fn test_parse_genotype() -> anyhow::Result<()> {
        assert_eq!(parse_genotype("0/1")?, vec![2, 4]);
        assert_eq!(parse_genotype("1|1")?, vec![4, 5]);
        assert_eq!(parse_genotype("./.")?, vec![0, 0]);
        assert_eq!(parse_genotype("2")?, vec![6]);
        assert_eq!(parse_genotype("0/1|2")?, vec![2, 4, 7]);
        Ok(())
    }

    #[test]
    fn test_invalid_genotype() {
        for gt in ["", "a/b", "0/", "-1/0", "0//1"] {
            assert!(
                matches!(
                    parse_genotype(gt),
                    Err(crate::Error::RecordError(RecordError::InvalidGenotype(_)))
                ),
                "{gt} should be rejected"
            );
        }
    }

    #[test]
    fn test_render_genotype() -> anyhow::Result<()> {
        for gt in ["0/1", "1|1", "./.", "0", "0/1|2", "10/12"] {
            assert_eq!(render(&parse_genotype(gt)?), gt);
        }
        assert_eq!(render(&[2, MISSING_INT]), "0");
        assert_eq!(render(&[MISSING_INT, MISSING_INT]), ".");
        assert_eq!(render(&[]), ".");
        Ok(())
    }

    #[test]
    fn test_allele_accessors() {
        assert_eq!(allele(0), None);
        assert_eq!(allele(2), Some(0));
        assert_eq!(allele(5), Some(1));
        assert!(is_phased(5));
        assert!(!is_phased(4));
    }
}
