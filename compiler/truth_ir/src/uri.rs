//! URI subjects for cross-document references.

use std::fmt;

/// Reserved file extension a URI declaration must end with.
pub const TRUTH_EXTENSION: &str = ".truth";

/// Protocol of a recognized URI declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UriProtocol {
    Http,
    Https,
    /// `./` relative prefix.
    Relative,
    /// `../` retracting relative prefix.
    Retracting,
}

impl UriProtocol {
    /// The literal prefix that introduces this protocol.
    pub const fn prefix(self) -> &'static str {
        match self {
            UriProtocol::Http => "http://",
            UriProtocol::Https => "https://",
            UriProtocol::Relative => "./",
            UriProtocol::Retracting => "../",
        }
    }

    /// True for network protocols with transport security.
    pub const fn is_secure(self) -> bool {
        matches!(self, UriProtocol::Https)
    }

    /// True for the two relative forms.
    pub const fn is_relative(self) -> bool {
        matches!(self, UriProtocol::Relative | UriProtocol::Retracting)
    }
}

/// A recognized URI declaration.
///
/// Only text with one of the four reserved prefixes and the reserved file
/// extension parses as a URI; anything else falls through to term parsing.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct KnownUri {
    pub protocol: UriProtocol,
    /// Full raw text, prefix included.
    pub raw: String,
}

impl KnownUri {
    /// Try to recognize `text` as a URI declaration.
    pub fn parse(text: &str) -> Option<KnownUri> {
        if !text.ends_with(TRUTH_EXTENSION) {
            return None;
        }
        let protocol = [
            UriProtocol::Https,
            UriProtocol::Http,
            // Retracting before relative: "../" also starts with ".".
            UriProtocol::Retracting,
            UriProtocol::Relative,
        ]
        .into_iter()
        .find(|p| text.starts_with(p.prefix()))?;

        // A prefix alone, or a prefix immediately followed by the
        // extension, names no document.
        if text.len() <= protocol.prefix().len() + TRUTH_EXTENSION.len() {
            return None;
        }

        Some(KnownUri {
            protocol,
            raw: text.to_owned(),
        })
    }

    /// Resolve this URI against a base document URI.
    ///
    /// Absolute URIs resolve to themselves. Relative URIs are joined onto
    /// the base's directory, with `../` segments popping one directory each.
    pub fn resolve_against(&self, base: &KnownUri) -> KnownUri {
        if !self.protocol.is_relative() {
            return self.clone();
        }

        let base_dir = match base.raw.rfind('/') {
            Some(idx) => &base.raw[..idx],
            None => "",
        };
        let mut segments: Vec<&str> = base_dir.split('/').collect();
        let mut rest = self.raw.as_str();
        loop {
            if let Some(stripped) = rest.strip_prefix("../") {
                if segments.len() > 1 {
                    segments.pop();
                }
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix("./") {
                rest = stripped;
            } else {
                break;
            }
        }
        let mut joined = segments.join("/");
        joined.push('/');
        joined.push_str(rest);
        KnownUri {
            protocol: base.protocol,
            raw: joined,
        }
    }
}

impl fmt::Display for KnownUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognizes_prefixes() {
        let https = KnownUri::parse("https://example.com/animals.truth");
        assert_eq!(
            https.map(|u| u.protocol),
            Some(UriProtocol::Https)
        );
        let rel = KnownUri::parse("./animals.truth");
        assert_eq!(rel.map(|u| u.protocol), Some(UriProtocol::Relative));
        let retract = KnownUri::parse("../shared/animals.truth");
        assert_eq!(retract.map(|u| u.protocol), Some(UriProtocol::Retracting));
    }

    #[test]
    fn rejects_wrong_extension() {
        assert_eq!(KnownUri::parse("./animals.css"), None);
        assert_eq!(KnownUri::parse("https://example.com/x"), None);
    }

    #[test]
    fn rejects_plain_terms() {
        assert_eq!(KnownUri::parse("animal"), None);
        assert_eq!(KnownUri::parse("./.truth"), None);
    }

    #[test]
    fn resolve_relative() {
        let base = KnownUri::parse("https://example.com/a/b.truth").unwrap_or_else(|| {
            panic!("base must parse")
        });
        let rel = KnownUri::parse("./c.truth").unwrap_or_else(|| panic!("rel must parse"));
        assert_eq!(rel.resolve_against(&base).raw, "https://example.com/a/c.truth");

        let up = KnownUri::parse("../d.truth").unwrap_or_else(|| panic!("up must parse"));
        assert_eq!(up.resolve_against(&base).raw, "https://example.com/d.truth");
    }
}
