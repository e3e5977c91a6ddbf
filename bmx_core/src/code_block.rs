/// Largest number of empty lines a block may insert between batches.
pub const MAX_SPACING: usize = u16::MAX as usize;

/// A re-indentable chunk of text assembled from one or more appended batches.
///
/// Every call to [`CodeBlock::add`] re-bases its own batch to column zero, so
/// the stored lines only carry indentation that is relative within a batch.
/// The block can then be rendered at any call site with [`CodeBlock::render`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlock {
	/// Number of empty lines inserted between appended batches.
	spacing: usize,
	lines: Vec<String>,
}

impl CodeBlock {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_spacing(spacing: usize) -> Self {
		Self {
			spacing,
			lines: Vec::new(),
		}
	}

	pub fn set_spacing(&mut self, spacing: usize) -> &mut Self {
		self.spacing = spacing;
		self
	}

	/// The normalized lines stored so far.
	pub fn lines(&self) -> &[String] {
		&self.lines
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	/// Append a batch of text.
	///
	/// Leading and trailing whitespace-only lines of the batch are dropped,
	/// `spacing` empty lines are inserted when the block already has content,
	/// and the longest leading-whitespace prefix shared by the batch's non-blank
	/// lines is removed from every line of the batch.
	pub fn add(&mut self, text: &str) -> &mut Self {
		let lines: Vec<&str> = text.split('\n').collect();
		let start = lines
			.iter()
			.position(|line| !is_blank(line))
			.unwrap_or(lines.len());
		let end = lines
			.iter()
			.rposition(|line| !is_blank(line))
			.map_or(start, |index| index + 1);
		let batch = &lines[start..end.max(start)];

		if !self.is_empty() {
			self.lines
				.extend(std::iter::repeat_n(String::new(), self.spacing));
		}

		let indent = common_indent(batch);
		self.lines
			.extend(batch.iter().map(|line| strip_chars(line, indent).to_string()));

		self
	}

	/// Render every stored line prefixed with `indent`, joined by newlines.
	pub fn render(&self, indent: &str) -> String {
		self.lines
			.iter()
			.map(|line| format!("{indent}{line}"))
			.collect::<Vec<_>>()
			.join("\n")
	}
}

fn is_blank(line: &str) -> bool {
	line.chars().all(char::is_whitespace)
}

/// The leading whitespace of a line.
pub(crate) fn leading_whitespace(line: &str) -> &str {
	let end = line
		.char_indices()
		.find(|(_, ch)| !ch.is_whitespace())
		.map_or(line.len(), |(index, _)| index);
	&line[..end]
}

/// Length in characters of the longest leading-whitespace prefix shared by all
/// non-blank lines. Blank lines do not participate.
fn common_indent(lines: &[&str]) -> usize {
	let mut candidate: Option<&str> = None;

	for line in lines.iter().filter(|line| !is_blank(line)) {
		let indent = leading_whitespace(line);
		candidate = Some(match candidate {
			None => indent,
			Some(current) => {
				let shared: usize = current
					.chars()
					.zip(indent.chars())
					.take_while(|(a, b)| a == b)
					.map(|(a, _)| a.len_utf8())
					.sum();
				&current[..shared]
			}
		});
	}

	candidate.map_or(0, |prefix| prefix.chars().count())
}

/// Drop the first `count` characters of `line`. Lines shorter than `count`
/// become empty.
fn strip_chars(line: &str, count: usize) -> &str {
	line.char_indices()
		.nth(count)
		.map_or("", |(index, _)| &line[index..])
}
