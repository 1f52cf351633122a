//! Diagnostic rendering
//!
//! Turns `TypeError` values into human-readable reports (via `ariadne`)
//! or machine-readable JSON lines. The checker itself never prints;
//! the host binary decides where and in what format diagnostics go.

use std::collections::HashMap;
use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};
use serde_json::json;

use crate::ast::shared::{SourceId, Span};
use crate::typeck::errors::TypeError;

// ============================================================================
// Source cache
// ============================================================================

/// Holds source text for span rendering.
#[derive(Default)]
pub struct SourceCache {
    sources: HashMap<SourceId, (String, Source<String>)>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: SourceId, name: impl Into<String>, text: impl Into<String>) {
        self.sources
            .insert(id, (name.into(), Source::from(text.into())));
    }
}

impl ariadne::Cache<SourceId> for &mut SourceCache {
    type Storage = String;

    fn fetch(&mut self, id: &SourceId) -> Result<&Source<String>, Box<dyn fmt::Debug + '_>> {
        self.sources
            .get(id)
            .map(|(_, src)| src)
            .ok_or_else(|| Box::new(format!("unknown source {:?}", id)) as Box<dyn fmt::Debug>)
    }

    fn display<'b>(&self, id: &'b SourceId) -> Option<Box<dyn fmt::Display + 'b>> {
        let name = self.sources.get(id).map(|(name, _)| name.clone())?;
        Some(Box::new(name))
    }
}

impl ariadne::Span for Span {
    type SourceId = SourceId;

    fn source(&self) -> &SourceId {
        &self.source
    }

    fn start(&self) -> usize {
        self.start as usize
    }

    fn end(&self) -> usize {
        self.end as usize
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Render one error as a terminal report.
pub fn render(err: &TypeError, cache: &mut SourceCache) -> String {
    let span = err.span();
    let mut buf = Vec::new();
    let result = Report::build(ReportKind::Error, span.source, span.start as usize)
        .with_code(err.code())
        .with_message(err.message())
        .with_label(
            Label::new(span)
                .with_message(err.message())
                .with_color(Color::Red),
        )
        .finish()
        .write(&mut *cache, &mut buf);
    match result {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        // A span outside the cached sources still yields the message.
        Err(_) => format!("{}\n", err),
    }
}

/// Render every error, in order, separated by blank lines.
pub fn render_all(errors: &[TypeError], cache: &mut SourceCache) -> String {
    errors
        .iter()
        .map(|e| render(e, cache))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One JSON object per diagnostic, for tooling.
pub fn to_json(err: &TypeError) -> serde_json::Value {
    let span = err.span();
    json!({
        "code": err.code(),
        "message": err.message(),
        "span": span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn mismatch(span: Span) -> TypeError {
        TypeError::Mismatch {
            t1: Type::int32(),
            t2: Type::bool(),
            loc: span,
        }
    }

    #[test]
    fn test_render_with_source() {
        let id = SourceId(1);
        let mut cache = SourceCache::new();
        cache.add(id, "main.nc", "def bad(): Int32 = true\n");
        let out = render(&mismatch(Span::new(id, 19, 23)), &mut cache);
        assert!(out.contains("E2001"));
        assert!(out.contains("main.nc"));
    }

    #[test]
    fn test_render_without_source_degrades() {
        let mut cache = SourceCache::new();
        let out = render(&mismatch(Span::new(SourceId(9), 0, 1)), &mut cache);
        assert!(out.contains("E2001"));
    }

    #[test]
    fn test_json_shape() {
        let v = to_json(&mismatch(Span::new(SourceId(1), 2, 3)));
        assert_eq!(v["code"], "E2001");
        assert_eq!(v["span"]["start"], 2);
    }
}
