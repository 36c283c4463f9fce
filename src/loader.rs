use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Where a Cadence template lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
	/// Remote template, retrieved over HTTP(S).
	Url(Url),
	/// Local file. `file://` URLs are normalised to this variant.
	Path(PathBuf),
}

impl Source {
	/// Interpret a user-supplied location.  Anything that is not an
	/// `http`, `https` or `file` URL is treated as a filesystem path.
	pub fn parse(location: &str) -> Self {
		match Url::parse(location) {
			Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Url(url),
			Ok(url) if url.scheme() == "file" => url
				.to_file_path()
				.map(Self::Path)
				.unwrap_or_else(|_| Self::Path(PathBuf::from(location))),
			_ => Self::Path(PathBuf::from(location)),
		}
	}
}

impl fmt::Display for Source {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Url(url) => write!(f, "{url}"),
			Self::Path(path) => write!(f, "{}", path.display()),
		}
	}
}

/// A compiled placeholder pattern plus the literal text each matched
/// token is replaced with.
#[derive(Debug, Clone)]
pub struct Substitution {
	pattern: Regex,
	replacements: BTreeMap<String, String>,
}

impl Substitution {
	/// Use an explicit pattern.  Every match is looked up verbatim in
	/// `replacements`.  A pattern that can match the empty string is
	/// rejected, since it would match between every character.
	pub fn new<I, K, V>(pattern: &str, replacements: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let pattern = Regex::new(pattern)?;
		if pattern.is_match("") {
			return Err(Error::InvalidArgument(format!(
				"substitution pattern `{pattern}` matches the empty string"
			)));
		}
		Ok(Self {
			pattern,
			replacements: collect_replacements(replacements)?,
		})
	}

	/// Build the pattern as an alternation of the (escaped) tokens
	/// themselves.  Returns `None` when there is nothing to replace.
	pub fn from_tokens<I, K, V>(replacements: I) -> Result<Option<Self>>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let replacements = collect_replacements(replacements)?;
		if replacements.is_empty() {
			return Ok(None);
		}

		// Longest first, so `0x01` never shadows `0x010`.
		let mut tokens: Vec<&str> = replacements.keys().map(String::as_str).collect();
		tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
		let alternation = tokens
			.iter()
			.map(|t| regex::escape(t))
			.collect::<Vec<_>>()
			.join("|");

		let pattern = Regex::new(&format!("({alternation})"))?;
		Ok(Some(Self { pattern, replacements }))
	}

	pub fn pattern(&self) -> &str {
		self.pattern.as_str()
	}

	pub fn replacements(&self) -> &BTreeMap<String, String> {
		&self.replacements
	}

	/// Replace every match in `text`.  A match with no replacement entry
	/// fails the whole substitution rather than leaking the raw token.
	pub fn apply(&self, text: &str) -> Result<String> {
		let mut out = String::with_capacity(text.len());
		let mut last = 0;

		for m in self.pattern.find_iter(text) {
			let token = m.as_str();
			let replacement =
				self.replacements
					.get(token)
					.ok_or_else(|| Error::MissingSubstitution {
						token: token.to_owned(),
					})?;
			out.push_str(&text[last..m.start()]);
			out.push_str(replacement);
			last = m.end();
		}

		out.push_str(&text[last..]);
		Ok(out)
	}
}

fn collect_replacements<I, K, V>(replacements: I) -> Result<BTreeMap<String, String>>
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<String>,
{
	replacements
		.into_iter()
		.map(|(k, v)| {
			let token: String = k.into();
			if token.is_empty() {
				return Err(Error::InvalidArgument("empty placeholder token".into()));
			}
			Ok((token, v.into()))
		})
		.collect()
}

/// Fetches template text and applies placeholder substitution.
///
/// Every call performs a fresh retrieval; nothing is cached between
/// calls, so edits to a template or to the address book are picked up
/// immediately.
#[derive(Clone, Default)]
pub struct CodeLoader {
	http: reqwest::Client,
}

impl CodeLoader {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_client(http: reqwest::Client) -> Self {
		Self { http }
	}

	/// Retrieve the raw template text.
	pub async fn fetch(&self, source: &Source) -> Result<String> {
		let fetch_err = |reason: String| Error::Fetch {
			location: source.to_string(),
			reason,
		};

		let bytes = match source {
			Source::Url(url) => {
				let resp = self
					.http
					.get(url.clone())
					.send()
					.await
					.map_err(|e| fetch_err(e.to_string()))?;
				let status = resp.status();
				if !status.is_success() {
					return Err(fetch_err(format!("HTTP {status}")));
				}
				resp.bytes()
					.await
					.map_err(|e| fetch_err(e.to_string()))?
					.to_vec()
			}
			Source::Path(path) => tokio::fs::read(path)
				.await
				.map_err(|e| fetch_err(e.to_string()))?,
		};

		debug!(%source, bytes = bytes.len(), "fetched template");
		String::from_utf8(bytes).map_err(|e| Error::Encoding(e.to_string()))
	}

	/// Fetch `source` and, if given, apply `substitution` to it.
	pub async fn load(&self, source: &Source, substitution: Option<&Substitution>) -> Result<String> {
		let raw = self.fetch(source).await?;
		match substitution {
			Some(sub) => {
				debug!(pattern = sub.pattern(), "applying substitution");
				sub.apply(&raw)
			}
			None => Ok(raw),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn addresses() -> Substitution {
		Substitution::from_tokens([
			("0x01", "0xee82856bf20e2aa6"),
			("0x02", "0x01cf0e2f2f715450"),
		])
		.unwrap()
		.unwrap()
	}

	#[test]
	fn no_match_is_identity() {
		let text = "transaction { execute { log(\"hi\") } }";
		assert_eq!(addresses().apply(text).unwrap(), text);
	}

	#[test]
	fn replaces_every_occurrence() {
		let text = "import A from 0x01\nimport B from 0x02\nimport C from 0x01\n";
		let out = addresses().apply(text).unwrap();
		assert_eq!(
			out,
			"import A from 0xee82856bf20e2aa6\nimport B from 0x01cf0e2f2f715450\nimport C from 0xee82856bf20e2aa6\n"
		);
	}

	#[test]
	fn placeholder_count_is_preserved() {
		let text = "contract Foo {} // 0xAA 0xAA\nimport Bar from 0xAA";
		let sub = Substitution::from_tokens([("0xAA", "0x01")]).unwrap().unwrap();
		let out = sub.apply(text).unwrap();
		assert_eq!(out.matches("0xAA").count(), 0);
		assert_eq!(out.matches("0x01").count(), text.matches("0xAA").count());
	}

	#[test]
	fn explicit_pattern_without_entry_fails() {
		let sub = Substitution::new("(0x01|0x03)", [("0x01", "0xf8d6e0586b0a20c7")]).unwrap();
		let err = sub.apply("import X from 0x03").unwrap_err();
		assert!(matches!(err, Error::MissingSubstitution { ref token } if token == "0x03"));
	}

	#[test]
	fn invalid_pattern_is_reported() {
		let err = Substitution::new("(0x01", [("0x01", "a")]).unwrap_err();
		assert!(matches!(err, Error::InvalidPattern(_)));
	}

	#[test]
	fn tokens_are_escaped_and_longest_first() {
		let sub = Substitution::from_tokens([("a.b", "X"), ("a.bc", "Y")])
			.unwrap()
			.unwrap();
		assert_eq!(sub.apply("a.bc a.b axb").unwrap(), "Y X axb");
	}

	#[test]
	fn empty_token_is_rejected() {
		let err = Substitution::from_tokens([("0x01", "0xee82856bf20e2aa6"), ("", "X")]).unwrap_err();
		assert!(matches!(err, Error::InvalidArgument(_)));

		let err = Substitution::new("(0x01)", [("", "X")]).unwrap_err();
		assert!(matches!(err, Error::InvalidArgument(_)));
	}

	#[test]
	fn pattern_matching_empty_string_is_rejected() {
		for pattern in ["", "(0x01|)", "(0x01)?", "a*"] {
			let err = Substitution::new(pattern, [("0x01", "0xee82856bf20e2aa6")]).unwrap_err();
			assert!(matches!(err, Error::InvalidArgument(_)), "{pattern}");
		}
	}

	#[test]
	fn empty_map_yields_no_substitution() {
		let none = Substitution::from_tokens(Vec::<(String, String)>::new()).unwrap();
		assert!(none.is_none());
	}

	#[test]
	fn source_parsing() {
		assert!(matches!(
			Source::parse("http://localhost:3000/FT.cdc"),
			Source::Url(_)
		));
		assert_eq!(
			Source::parse("cadence/contracts/FT.cdc"),
			Source::Path(PathBuf::from("cadence/contracts/FT.cdc"))
		);
		assert_eq!(
			Source::parse("file:///tmp/FT.cdc"),
			Source::Path(PathBuf::from("/tmp/FT.cdc"))
		);
	}

	#[tokio::test]
	async fn loads_from_disk_and_refetches() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("setup.cdc");
		std::fs::write(&path, "import FT from 0x01").unwrap();

		let loader = CodeLoader::new();
		let source = Source::Path(path.clone());
		let sub = addresses();

		let first = loader.load(&source, Some(&sub)).await.unwrap();
		let second = loader.load(&source, Some(&sub)).await.unwrap();
		assert_eq!(first, "import FT from 0xee82856bf20e2aa6");
		assert_eq!(first, second);

		std::fs::write(&path, "import NFT from 0x02").unwrap();
		let third = loader.load(&source, Some(&sub)).await.unwrap();
		assert_eq!(third, "import NFT from 0x01cf0e2f2f715450");
	}

	#[tokio::test]
	async fn missing_file_is_a_fetch_error() {
		let loader = CodeLoader::new();
		let err = loader
			.load(&Source::parse("/definitely/not/here.cdc"), None)
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Fetch { .. }));
	}

	#[tokio::test]
	async fn non_utf8_is_an_encoding_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("bad.cdc");
		std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

		let err = CodeLoader::new()
			.load(&Source::Path(path), None)
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Encoding(_)));
	}
}
