// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! iCalendar (RFC 5545) formatter module.
//!
//! Writes [`Component`] trees back to the content-line text format, folding
//! long lines on UTF-8 character boundaries.
//!
//! # Example
//!
//! ```
//! use recurcal_ical::{Component, Property, formatter::format};
//!
//! let event = Component::new("VEVENT").with_property(Property::new("SUMMARY", "Standup"));
//! let text = format(&[Component::new("VCALENDAR").with_child(event)]).unwrap();
//! assert!(text.contains("SUMMARY:Standup\r\n"));
//! ```

mod value;

use std::io::{self, Write};

use crate::component::{Component, Parameter, Property};
use crate::keyword::{KW_BEGIN, KW_END};

/// Format components to a `String` using the default options.
///
/// # Errors
///
/// Returns an error if writing to the internal buffer fails or if the output
/// contains invalid UTF-8 data.
pub fn format(components: &[Component]) -> io::Result<String> {
    FormatOptions::default().write_to_string(components)
}

/// Formatting options for the iCalendar formatter.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Maximum line length in octets before folding.
    /// - `None`: no line folding
    /// - `Some(n)`: fold lines longer than n octets
    ///
    /// Default: `Some(75)` for RFC 5545 compliance.
    pub folding: Option<usize>,

    /// Line folding style.
    ///
    /// Default: `FoldingStyle::Space` (CRLF + SPACE).
    pub folding_style: FoldingStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            folding: Some(75),
            folding_style: FoldingStyle::default(),
        }
    }
}

impl FormatOptions {
    /// Set the line folding option.
    #[must_use]
    pub const fn folding(mut self, folding: Option<usize>) -> Self {
        self.folding = folding;
        self
    }

    /// Set the line folding style.
    #[must_use]
    pub const fn folding_style(mut self, style: FoldingStyle) -> Self {
        self.folding_style = style;
        self
    }

    /// Write components to any `Write` implementer.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write(&self, components: &[Component], w: &mut impl Write) -> io::Result<()> {
        let mut formatter = Formatter::new(w, *self);
        for component in components {
            formatter.write_component(component)?;
        }
        formatter.flush()
    }

    /// Write components to a `String`.
    ///
    /// # Errors
    /// Returns an error if writing fails or if the output contains invalid UTF-8 data.
    pub fn write_to_string(&self, components: &[Component]) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write(components, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Line folding style for RFC 5545 formatting.
///
/// Folded lines start with CRLF followed by a single whitespace character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FoldingStyle {
    /// CRLF + SPACE (RFC 5545 default)
    #[default]
    Space,
    /// CRLF + TAB
    Tab,
}

impl FoldingStyle {
    const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Space => b"\r\n ",
            Self::Tab => b"\r\n\t",
        }
    }
}

/// iCalendar formatter that writes to any `Write` implementer.
///
/// Bytes written through the [`Write`] impl are folded; line endings are
/// emitted with [`Formatter::writeln`].
#[derive(Debug)]
pub struct Formatter<W: Write> {
    writer: W,
    options: FormatOptions,
    /// Current line length in bytes, excluding the pending CRLF.
    line_length: usize,
}

impl<W: Write> Formatter<W> {
    /// Create a new formatter with options.
    #[must_use]
    pub const fn new(writer: W, options: FormatOptions) -> Self {
        Self {
            writer,
            options,
            line_length: 0,
        }
    }

    /// Consumes this formatter, returning the underlying writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Write a component, its properties and its children.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_component(&mut self, component: &Component) -> io::Result<()> {
        self.with_block(&component.name, |f| {
            for prop in &component.properties {
                f.write_property(prop)?;
            }
            for child in &component.children {
                f.write_component(child)?;
            }
            Ok(())
        })
    }

    /// Write a single content line.
    ///
    /// The value is written verbatim, so TEXT values must already be escaped.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_property(&mut self, prop: &Property) -> io::Result<()> {
        write!(self, "{}", prop.name)?;
        for param in &prop.parameters {
            write_parameter(self, param)?;
        }
        write!(self, ":{}", prop.value)?;
        self.writeln()
    }

    fn with_block(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut Self) -> io::Result<()>,
    ) -> io::Result<()> {
        write!(self, "{KW_BEGIN}:{name}")?;
        self.writeln()?;
        body(self)?;
        write!(self, "{KW_END}:{name}")?;
        self.writeln()
    }

    /// Write a CRLF line ending.
    pub fn writeln(&mut self) -> io::Result<()> {
        self.writer.write_all(b"\r\n")?;
        self.line_length = 0;
        Ok(())
    }

    fn insert_fold(&mut self) -> io::Result<()> {
        self.writer
            .write_all(self.options.folding_style.as_bytes())?;
        self.line_length = 1;
        Ok(())
    }
}

fn write_parameter<W: Write>(f: &mut Formatter<W>, param: &Parameter) -> io::Result<()> {
    write!(f, ";{}=", param.name)?;
    for (i, value) in param.values.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        if value.contains([':', ';', ',']) {
            write!(f, "\"{value}\"")?;
        } else {
            write!(f, "{value}")?;
        }
    }
    Ok(())
}

impl<W: Write> Write for Formatter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(max_len) = self.options.folding else {
            return self.writer.write(buf);
        };

        let mut remaining = buf;
        while !remaining.is_empty() {
            if self.line_length >= max_len {
                self.insert_fold()?;
            }

            let available = max_len.saturating_sub(self.line_length);
            let mut n = safe_write_length(remaining, available);
            if n == 0 {
                // a single character wider than the whole line
                n = char_len(remaining);
            }

            let (head, tail) = remaining.split_at(n);
            self.writer.write_all(head)?;
            self.line_length += n;
            remaining = tail;

            if !remaining.is_empty() && self.line_length > 1 {
                self.insert_fold()?;
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Longest prefix of `buf` no longer than `max_bytes` that ends on a UTF-8
/// character boundary.
fn safe_write_length(buf: &[u8], max_bytes: usize) -> usize {
    if max_bytes >= buf.len() {
        return buf.len();
    }
    let mut pos = max_bytes;
    while pos > 0 && buf.get(pos).is_some_and(|b| b & 0xC0 == 0x80) {
        pos -= 1;
    }
    pos
}

fn char_len(buf: &[u8]) -> usize {
    let lead = buf.first().copied().unwrap_or(0);
    let len = match lead {
        0xF0.. => 4,
        0xE0.. => 3,
        0xC0.. => 2,
        _ => 1,
    };
    len.min(buf.len())
}
