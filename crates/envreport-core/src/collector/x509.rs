//! Minimal X.509 reader for trust store listings.
//!
//! Decodes PEM bundles and pulls the subject, issuer and validity end out of
//! each DER certificate. Nothing is verified; this is for display only.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::collector::procfs::ParseError;

const TAG_INTEGER: u8 = 0x02;
const TAG_OID: u8 = 0x06;
const TAG_UTC_TIME: u8 = 0x17;
const TAG_GENERALIZED_TIME: u8 = 0x18;
const TAG_BMP_STRING: u8 = 0x1E;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_SET: u8 = 0x31;
const TAG_VERSION: u8 = 0xA0;

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

const OID_COMMON_NAME: &[u8] = &[0x55, 0x04, 0x03];
const OID_ORGANIZATIONAL_UNIT: &[u8] = &[0x55, 0x04, 0x0B];
const OID_ORGANIZATION: &[u8] = &[0x55, 0x04, 0x0A];
const OID_LOCALITY: &[u8] = &[0x55, 0x04, 0x07];
const OID_COUNTRY: &[u8] = &[0x55, 0x04, 0x06];

/// Attribute types rendered in names, by DER-encoded OID.
const NAME_ATTRIBUTES: [(&[u8], &str); 5] = [
    (OID_COMMON_NAME, "CN"),
    (OID_ORGANIZATIONAL_UNIT, "OU"),
    (OID_ORGANIZATION, "O"),
    (OID_LOCALITY, "L"),
    (OID_COUNTRY, "C"),
];

/// Display fields of one certificate.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    /// `YYYY-MM-DD HH:MM:SS UTC`.
    pub not_after: String,
}

/// Splits a PEM bundle into DER blobs, one result per certificate block.
pub fn pem_certificates(content: &str) -> Vec<Result<Vec<u8>, ParseError>> {
    let mut blocks = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find(PEM_BEGIN) {
        let body_start = start + PEM_BEGIN.len();
        let Some(len) = rest[body_start..].find(PEM_END) else {
            blocks.push(Err(ParseError::new("unterminated certificate block")));
            break;
        };
        let body: String = rest[body_start..body_start + len]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        blocks.push(
            STANDARD
                .decode(body.as_bytes())
                .map_err(|e| ParseError::new(format!("invalid base64: {}", e))),
        );
        rest = &rest[body_start + len + PEM_END.len()..];
    }
    blocks
}

/// Reads subject, issuer and expiry from a DER certificate.
pub fn summarize(der: &[u8]) -> Result<CertificateSummary, ParseError> {
    let (certificate, _) = expect(der, TAG_SEQUENCE, "certificate")?;
    let (tbs, _) = expect(certificate, TAG_SEQUENCE, "tbsCertificate")?;

    let mut rest = tbs;
    let (tag, _, after) = read_tlv(rest)?;
    if tag == TAG_VERSION {
        rest = after;
    }
    let (_, rest) = expect(rest, TAG_INTEGER, "serialNumber")?;
    let (_, rest) = expect(rest, TAG_SEQUENCE, "signature")?;
    let (issuer, rest) = expect(rest, TAG_SEQUENCE, "issuer")?;
    let (validity, rest) = expect(rest, TAG_SEQUENCE, "validity")?;
    let (subject, _) = expect(rest, TAG_SEQUENCE, "subject")?;

    let (_, _, after_not_before) = read_tlv(validity)?;
    let (time_tag, not_after, _) = read_tlv(after_not_before)?;

    Ok(CertificateSummary {
        subject: render_name(subject)?,
        issuer: render_name(issuer)?,
        not_after: render_time(time_tag, not_after)?,
    })
}

/// Reads one tag-length-value; returns (tag, content, remaining input).
fn read_tlv(input: &[u8]) -> Result<(u8, &[u8], &[u8]), ParseError> {
    let (&tag, rest) = input
        .split_first()
        .ok_or_else(|| ParseError::new("unexpected end of DER data"))?;
    let (&first, rest) = rest
        .split_first()
        .ok_or_else(|| ParseError::new("missing DER length"))?;

    let (len, rest) = if first < 0x80 {
        (first as usize, rest)
    } else {
        let count = (first & 0x7F) as usize;
        if count == 0 || count > 4 || rest.len() < count {
            return Err(ParseError::new("unsupported DER length"));
        }
        let len = rest[..count]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        (len, &rest[count..])
    };

    if rest.len() < len {
        return Err(ParseError::new("truncated DER value"));
    }
    Ok((tag, &rest[..len], &rest[len..]))
}

fn expect<'a>(
    input: &'a [u8],
    tag: u8,
    what: &str,
) -> Result<(&'a [u8], &'a [u8]), ParseError> {
    let (found, content, rest) = read_tlv(input)?;
    if found != tag {
        return Err(ParseError::new(format!(
            "expected {} (tag 0x{:02X}), found tag 0x{:02X}",
            what, tag, found
        )));
    }
    Ok((content, rest))
}

/// Renders a Name as `CN=..., O=...`, keeping the encoded order.
fn render_name(mut rdns: &[u8]) -> Result<String, ParseError> {
    let mut parts = Vec::new();
    while !rdns.is_empty() {
        let (set, rest) = expect(rdns, TAG_SET, "RelativeDistinguishedName")?;
        rdns = rest;
        let mut attrs = set;
        while !attrs.is_empty() {
            let (attr, rest) = expect(attrs, TAG_SEQUENCE, "AttributeTypeAndValue")?;
            attrs = rest;
            let (oid, value) = expect(attr, TAG_OID, "attribute type")?;
            let (tag, text, _) = read_tlv(value)?;
            if let Some((_, label)) = NAME_ATTRIBUTES.iter().find(|(o, _)| *o == oid) {
                parts.push(format!("{}={}", label, decode_string(tag, text)));
            }
        }
    }
    if parts.is_empty() {
        Ok("(empty)".to_string())
    } else {
        Ok(parts.join(", "))
    }
}

fn decode_string(tag: u8, bytes: &[u8]) -> String {
    match tag {
        TAG_BMP_STRING => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn render_time(tag: u8, bytes: &[u8]) -> Result<String, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::new("invalid time encoding"))?;
    let digits = text.trim_end_matches('Z');
    // Slicing below is by byte offset.
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(format!("invalid time '{}'", text)));
    }
    let (year, rest) = match tag {
        TAG_UTC_TIME if digits.len() >= 10 => {
            let yy: u32 = digits[..2]
                .parse()
                .map_err(|_| ParseError::new(format!("invalid UTCTime '{}'", text)))?;
            // RFC 5280: two-digit years below 50 are in the 21st century.
            (if yy < 50 { 2000 + yy } else { 1900 + yy }, &digits[2..])
        }
        TAG_GENERALIZED_TIME if digits.len() >= 12 => {
            let yyyy: u32 = digits[..4]
                .parse()
                .map_err(|_| ParseError::new(format!("invalid GeneralizedTime '{}'", text)))?;
            (yyyy, &digits[4..])
        }
        _ => return Err(ParseError::new(format!("unsupported time '{}'", text))),
    };
    if rest.len() < 8 {
        return Err(ParseError::new(format!("invalid time '{}'", text)));
    }
    let seconds = if rest.len() >= 10 { &rest[8..10] } else { "00" };
    Ok(format!(
        "{:04}-{}-{} {}:{}:{} UTC",
        year,
        &rest[0..2],
        &rest[2..4],
        &rest[4..6],
        &rest[6..8],
        seconds
    ))
}
