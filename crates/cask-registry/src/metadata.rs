//! Canonical JSON metadata encoding.
//!
//! [`PackageMetadata`] is the wire-facing view of a package: its short
//! name, a resolved release version, and descriptive fields. Encoding is
//! hand-written rather than serde-derived because the output shape is a
//! contract: fields appear in a fixed order, required string fields are
//! emitted even when blank, and the optional fields (`homepage`,
//! `repository`, `keywords`, `minimum_version`) are omitted entirely when
//! unset rather than emitted as `null`.
//!
//! The streaming encoder writes straight into any [`io::Write`] sink; the
//! buffered form runs the same encoder into a `Vec<u8>`, so both modes
//! produce byte-identical output by construction.

use std::io::{self, Write};

use cask_core::{Package, Version};

/// The canonical metadata record for one package at one version.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: Version,
    pub description: String,
    pub author: String,
    pub license: String,
    pub homepage: Option<String>,
    pub repository: Option<String>,
    pub keywords: Vec<String>,
    /// Oldest toolchain version the package supports, when declared.
    pub minimum_version: Option<Version>,
}

impl PackageMetadata {
    /// Builds the metadata view of `package` at `version`.
    ///
    /// The author is the owning side of the package identity; keywords are
    /// the package topics.
    pub fn new(package: &Package, version: Version) -> Self {
        Self {
            name: package.name().to_string(),
            version,
            description: package.description.clone(),
            author: package.id.owner.clone(),
            license: package.license.clone(),
            homepage: package.homepage.clone(),
            repository: package.source_url.clone(),
            keywords: package.topics.clone(),
            minimum_version: None,
        }
    }

    /// Streams the canonical JSON object into `sink`.
    pub fn write_json<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(b"{")?;
        write_field(sink, "name", &self.name, true)?;
        write_field(sink, "version", &self.version.to_string(), false)?;
        write_field(sink, "description", &self.description, false)?;
        write_field(sink, "author", &self.author, false)?;
        write_field(sink, "license", &self.license, false)?;
        if let Some(homepage) = &self.homepage {
            write_field(sink, "homepage", homepage, false)?;
        }
        if let Some(repository) = &self.repository {
            write_field(sink, "repository", repository, false)?;
        }
        if !self.keywords.is_empty() {
            sink.write_all(b",\"keywords\":[")?;
            for (idx, keyword) in self.keywords.iter().enumerate() {
                if idx > 0 {
                    sink.write_all(b",")?;
                }
                write_escaped(sink, keyword)?;
            }
            sink.write_all(b"]")?;
        }
        if let Some(minimum_version) = &self.minimum_version {
            write_field(sink, "minimum_version", &minimum_version.to_string(), false)?;
        }
        sink.write_all(b"}")
    }

    /// Buffered encode: the complete canonical JSON text.
    pub fn to_json_string(&self) -> String {
        let mut buf = Vec::new();
        self.write_json(&mut buf)
            .expect("writing to a Vec<u8> cannot fail");
        String::from_utf8(buf).expect("encoder only emits UTF-8")
    }
}

fn write_field<W: Write>(sink: &mut W, key: &str, value: &str, first: bool) -> io::Result<()> {
    if !first {
        sink.write_all(b",")?;
    }
    write!(sink, "\"{key}\":")?;
    write_escaped(sink, value)
}

/// Writes `value` as a JSON string literal with proper escaping.
fn write_escaped<W: Write>(sink: &mut W, value: &str) -> io::Result<()> {
    sink.write_all(b"\"")?;
    for ch in value.chars() {
        match ch {
            '"' => sink.write_all(b"\\\"")?,
            '\\' => sink.write_all(b"\\\\")?,
            '\n' => sink.write_all(b"\\n")?,
            '\r' => sink.write_all(b"\\r")?,
            '\t' => sink.write_all(b"\\t")?,
            ch if (ch as u32) < 0x20 => write!(sink, "\\u{:04x}", ch as u32)?,
            ch => write!(sink, "{ch}")?,
        }
    }
    sink.write_all(b"\"")
}

#[cfg(test)]
mod tests {
    use cask_core::PackageId;
    use chrono::Utc;

    use super::*;

    fn metadata() -> PackageMetadata {
        let package = Package {
            id: PackageId::new("mlugg", "zig-clap"),
            description: "command line argument parsing".to_string(),
            topics: vec!["zig".to_string(), "cli".to_string()],
            license: "MIT".to_string(),
            homepage: Some("https://example.com".to_string()),
            source_url: Some("https://github.com/mlugg/zig-clap".to_string()),
            stars: 420,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            private: false,
            dependencies: Vec::new(),
        };
        let mut meta = PackageMetadata::new(&package, Version::new(0, 6, 0));
        meta.minimum_version = Some(Version::new(0, 11, 0));
        meta
    }

    #[test]
    fn test_fixed_field_order() {
        assert_eq!(
            metadata().to_json_string(),
            concat!(
                "{\"name\":\"zig-clap\",",
                "\"version\":\"0.6.0\",",
                "\"description\":\"command line argument parsing\",",
                "\"author\":\"mlugg\",",
                "\"license\":\"MIT\",",
                "\"homepage\":\"https://example.com\",",
                "\"repository\":\"https://github.com/mlugg/zig-clap\",",
                "\"keywords\":[\"zig\",\"cli\"],",
                "\"minimum_version\":\"0.11.0\"}"
            )
        );
    }

    #[test]
    fn test_optional_fields_omitted_not_null() {
        let mut meta = metadata();
        meta.homepage = None;
        meta.repository = None;
        meta.keywords.clear();
        meta.minimum_version = None;

        let json = meta.to_json_string();
        assert!(!json.contains("homepage"));
        assert!(!json.contains("repository"));
        assert!(!json.contains("keywords"));
        assert!(!json.contains("minimum_version"));
        assert!(!json.contains("null"));
    }

    #[test]
    fn test_required_fields_emitted_when_blank() {
        let mut meta = metadata();
        meta.description.clear();
        meta.license.clear();

        let json = meta.to_json_string();
        assert!(json.contains("\"description\":\"\""));
        assert!(json.contains("\"license\":\"\""));
    }

    #[test]
    fn test_buffered_and_streamed_are_byte_identical() {
        let meta = metadata();
        let mut streamed = Vec::new();
        meta.write_json(&mut streamed).unwrap();
        assert_eq!(streamed, meta.to_json_string().into_bytes());
    }

    #[test]
    fn test_string_escaping() {
        let mut meta = metadata();
        meta.description = "say \"hello\"\nC:\\path\ttab\u{1}".to_string();

        let json = meta.to_json_string();
        assert!(json.contains(r#"\"hello\""#));
        assert!(json.contains(r"\n"));
        assert!(json.contains(r"C:\\path"));
        assert!(json.contains(r"\t"));
        assert!(json.contains(r"\u0001"));
    }
}
