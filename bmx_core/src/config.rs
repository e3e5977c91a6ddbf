use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::BmxError;
use crate::BmxResult;

/// The directive marker used when no configuration overrides it.
pub const DEFAULT_MARKER: &str = "##@";

/// Supported config file locations in discovery order (highest precedence
/// first). Paths are relative to the directory of the source file.
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["bmx.toml", ".bmx.toml", ".config/bmx.toml"];

/// Configuration loaded from a `bmx.toml` file.
///
/// ```toml
/// # Lines starting with this marker (after indentation) are directives.
/// marker = "//@"
///
/// # Render import sites on the rayon thread pool.
/// parallel = true
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BmxConfig {
	/// The marker that introduces a directive line.
	#[serde(default = "default_marker")]
	pub marker: String,
	/// When true, segments are rendered in parallel. Output is identical either
	/// way.
	#[serde(default = "default_parallel")]
	pub parallel: bool,
}

impl Default for BmxConfig {
	fn default() -> Self {
		Self {
			marker: default_marker(),
			parallel: default_parallel(),
		}
	}
}

fn default_marker() -> String {
	DEFAULT_MARKER.to_string()
}

fn default_parallel() -> bool {
	true
}

impl BmxConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(dir: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| dir.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file in `dir`.
	/// Returns `None` if there is none.
	pub fn load(dir: &Path) -> BmxResult<Option<BmxConfig>> {
		let Some(config_path) = Self::resolve_path(dir) else {
			return Ok(None);
		};

		Self::load_path(&config_path).map(Some)
	}

	/// Load the config from an explicit file path.
	pub fn load_path(path: &Path) -> BmxResult<BmxConfig> {
		let content = std::fs::read_to_string(path)?;
		let config = Self::parse(&content)?;
		tracing::debug!(path = %path.display(), marker = %config.marker, "loaded config");

		Ok(config)
	}

	/// Parse and validate config file content.
	pub fn parse(content: &str) -> BmxResult<BmxConfig> {
		let config: BmxConfig =
			toml::from_str(content).map_err(|e| BmxError::ConfigParse(e.to_string()))?;
		validate_marker(&config.marker)?;

		Ok(config)
	}

	/// Replace the marker, validating it first.
	pub fn with_marker(mut self, marker: impl Into<String>) -> BmxResult<Self> {
		let marker = marker.into();
		validate_marker(&marker)?;
		self.marker = marker;

		Ok(self)
	}
}

/// A marker must be non-empty and free of whitespace, otherwise directive
/// detection would be ambiguous.
pub fn validate_marker(marker: &str) -> BmxResult<()> {
	if marker.is_empty() || marker.chars().any(char::is_whitespace) {
		return Err(BmxError::InvalidMarker(marker.to_string()));
	}

	Ok(())
}
