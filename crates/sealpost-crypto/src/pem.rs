//! PEM text framing for key material.
//!
//! Export writes standard base64 wrapped at 64 columns between
//! `-----BEGIN <LABEL>-----` and `-----END <LABEL>-----` lines, with no
//! trailing newline. Import is lenient about layout: everything between the
//! expected header and footer is stripped of whitespace and base64-decoded.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Base64 characters per body line.
pub const LINE_WIDTH: usize = 64;

/// Label carried in the PEM header and footer lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemLabel {
    /// SPKI-encoded public key
    PublicKey,
    /// PKCS#8-encoded private key
    PrivateKey,
}

impl PemLabel {
    /// Label text as it appears between the dashes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicKey => "PUBLIC KEY",
            Self::PrivateKey => "PRIVATE KEY",
        }
    }

    fn header(self) -> String {
        format!("-----BEGIN {}-----", self.as_str())
    }

    fn footer(self) -> String {
        format!("-----END {}-----", self.as_str())
    }
}

/// Frame DER bytes as PEM text.
///
/// Returned as `Zeroizing` because private key PEM is secret material.
pub fn encode(label: PemLabel, der: &[u8]) -> Zeroizing<String> {
    let body = Zeroizing::new(STANDARD.encode(der));
    let header = label.header();
    let footer = label.footer();

    let line_count = body.len().div_ceil(LINE_WIDTH);
    let mut out = Zeroizing::new(String::with_capacity(
        header.len() + footer.len() + body.len() + line_count + 2,
    ));

    out.push_str(&header);
    out.push('\n');
    for (i, c) in body.chars().enumerate() {
        if i > 0 && i % LINE_WIDTH == 0 {
            out.push('\n');
        }
        out.push(c);
    }
    out.push('\n');
    out.push_str(&footer);

    out
}

/// Extract DER bytes from PEM text carrying `label`.
///
/// # Errors
///
/// - `KeyImport`: header or footer missing, wrong label, empty body, or body
///   is not valid base64
pub fn decode(label: PemLabel, text: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let header = label.header();
    let footer = label.footer();
    let text = text.trim();

    let Some(rest) = text.strip_prefix(header.as_str()) else {
        return Err(CryptoError::KeyImport(format!("missing {} header", label.as_str())));
    };
    let Some(body) = rest.strip_suffix(footer.as_str()) else {
        return Err(CryptoError::KeyImport(format!("missing {} footer", label.as_str())));
    };

    let compact: Zeroizing<String> =
        Zeroizing::new(body.chars().filter(|c| !c.is_whitespace()).collect());
    if compact.is_empty() {
        return Err(CryptoError::KeyImport("empty PEM body".to_string()));
    }

    STANDARD
        .decode(compact.as_bytes())
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::KeyImport("PEM body is not valid base64".to_string()))
}
