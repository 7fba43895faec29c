//! Fancy diagnostics support using `ariadne`.
//!
//! A [`ChartParseError`] carries the byte range of the offending line, so it
//! can be rendered as an `ariadne::Report` that points into the chart text.
//! Ariadne works out rows and columns from the byte offsets.
//!
//! # Usage Example
//!
//! ```rust
//! use chart_editor::{chart::parse_chart, diagnostics::emit_chart_error};
//!
//! let source = "[Note]\n100, 9, 1\n";
//! if let Err(err) = parse_chart(source) {
//!     emit_chart_error("Song.txt", source, &err);
//! }
//! ```

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::chart::{ChartParseError, ChartWarning};

/// Simple source container that holds the filename and source text.
///
/// ```rust
/// use chart_editor::diagnostics::SimpleSource;
///
/// let source = SimpleSource::new("Song.txt", "[Note]\n");
/// assert_eq!(source.name(), "Song.txt");
/// assert_eq!(source.text(), "[Note]\n");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleSource<'a> {
    name: &'a str,
    text: &'a str,
}

impl<'a> SimpleSource<'a> {
    /// Create a new source container instance.
    #[must_use]
    pub const fn new(name: &'a str, text: &'a str) -> Self {
        Self { name, text }
    }

    /// Get source text content.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Get source file name.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }
}

/// Trait for converting positioned errors to `ariadne::Report`.
pub trait ToAriadne {
    /// Convert error to ariadne Report.
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)>;
}

/// Helper to build a styled ariadne `Report` consistently.
#[must_use]
pub fn build_report<'a>(
    src: &SimpleSource<'a>,
    kind: ReportKind<'a>,
    range: Range<usize>,
    title: &str,
    label_message: impl ToString,
    color: Color,
) -> Report<'a, (String, Range<usize>)> {
    let filename = src.name().to_string();
    Report::build(kind, (filename.clone(), range.clone()))
        .with_message(title)
        .with_label(
            Label::new((filename, range))
                .with_message(label_message.to_string())
                .with_color(color),
        )
        .finish()
}

impl ToAriadne for ChartParseError {
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)> {
        build_report(
            src,
            ReportKind::Error,
            self.span.clone(),
            &format!("malformed chart at line {}", self.line),
            &self.kind,
            Color::Red,
        )
    }
}

/// Byte range of the 1-based `line` in `text`, without its line break.
fn line_span(text: &str, line: usize) -> Range<usize> {
    let mut start = 0;
    for (index, chunk) in text.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            return start..start + chunk.trim_end_matches(['\r', '\n']).len();
        }
        start += chunk.len();
    }
    text.len()..text.len()
}

impl ToAriadne for ChartWarning {
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)> {
        let range = match self {
            Self::UnknownSection { line, .. }
            | Self::UnknownKey { line, .. }
            | Self::DuplicateKey { line, .. }
            | Self::UnrecognizedLine { line } => line_span(src.text(), *line),
            _ => 0..0,
        };
        build_report(
            src,
            ReportKind::Warning,
            range,
            "chart warning",
            self,
            Color::Yellow,
        )
    }
}

/// Print a rendered [`ChartParseError`] to stderr.
pub fn emit_chart_error(name: &str, source: &str, error: &ChartParseError) {
    let simple = SimpleSource::new(name, source);
    let _ = error
        .to_report(&simple)
        .eprint((name.to_string(), Source::from(source)));
}

/// Print every [`ChartWarning`] to stderr.
pub fn emit_chart_warnings<'a>(
    name: &'a str,
    source: &'a str,
    warnings: impl IntoIterator<Item = &'a ChartWarning>,
) {
    let simple = SimpleSource::new(name, source);
    let ariadne_source = Source::from(source);
    for warning in warnings {
        let report = warning.to_report(&simple);
        let _ = report.eprint((name.to_string(), ariadne_source.clone()));
    }
}
