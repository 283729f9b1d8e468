// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;
use std::fmt;

use colored::{Color, Colorize};
use unicode_width::UnicodeWidthStr;

/// A column of a table over rows of type `T`.
pub trait TableColumn<T> {
    fn name(&self) -> Cow<'_, str>;

    fn format<'a>(&self, data: &'a T) -> Cow<'a, str>;

    fn padding_direction(&self) -> PaddingDirection {
        PaddingDirection::Left
    }

    fn color(&self, _data: &T) -> Option<Color> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingDirection {
    Left,
    Right,
}

/// How a table is rendered.
pub trait TableStyle {
    fn write<T, C: TableColumn<T>>(
        &self,
        f: &mut fmt::Formatter<'_>,
        columns: &[C],
        data: &[T],
    ) -> fmt::Result;
}

#[derive(Debug)]
pub struct Table<'a, S: TableStyle, C: TableColumn<T>, T> {
    style: S,
    columns: &'a [C],
    data: &'a [T],
}

impl<'a, S: TableStyle, C: TableColumn<T>, T> Table<'a, S, C, T> {
    pub fn new(style: S, columns: &'a [C], data: &'a [T]) -> Self {
        Self {
            style,
            columns,
            data,
        }
    }
}

impl<S: TableStyle, C: TableColumn<T>, T> fmt::Display for Table<'_, S, C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.style.write(f, self.columns, self.data)
    }
}

/// Aligned plain text, one row per line.
#[derive(Debug, Clone)]
pub struct TableStyleBasic {
    separator: &'static str,
    colored: bool,
}

impl TableStyleBasic {
    pub fn new() -> Self {
        Self {
            separator: "  ",
            colored: true,
        }
    }

    #[cfg(test)]
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }
}

impl TableStyle for TableStyleBasic {
    fn write<T, C: TableColumn<T>>(
        &self,
        f: &mut fmt::Formatter<'_>,
        columns: &[C],
        data: &[T],
    ) -> fmt::Result {
        let cells: Vec<Vec<Cow<'_, str>>> = data
            .iter()
            .map(|row| columns.iter().map(|col| col.format(row)).collect())
            .collect();

        let mut widths = vec![0; columns.len()];
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }

        for (i, (row, data)) in cells.iter().zip(data).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for (j, (col, cell)) in columns.iter().zip(row).enumerate() {
                let last = j + 1 == columns.len();
                let pad = widths[j].saturating_sub(cell.width());
                let cell = match col.padding_direction() {
                    // Last column does not need padding if it's left-aligned
                    PaddingDirection::Left if last => cell.to_string(),
                    PaddingDirection::Left => format!("{cell}{}", " ".repeat(pad)),
                    PaddingDirection::Right => format!("{}{cell}", " ".repeat(pad)),
                };
                match col.color(data) {
                    Some(color) if self.colored => write!(f, "{}", cell.color(color))?,
                    _ => write!(f, "{cell}")?,
                }
                if !last {
                    write!(f, "{}", self.separator)?;
                }
            }
        }
        Ok(())
    }
}

/// A JSON array with one object per row, keyed by column name.
#[derive(Debug, Clone, Copy)]
pub struct TableStyleJson;

impl TableStyleJson {
    pub fn new() -> Self {
        Self
    }
}

impl TableStyle for TableStyleJson {
    fn write<T, C: TableColumn<T>>(
        &self,
        f: &mut fmt::Formatter<'_>,
        columns: &[C],
        data: &[T],
    ) -> fmt::Result {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = data
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| {
                        let key = col.name().to_lowercase().replace(' ', "_");
                        (key, serde_json::Value::String(col.format(row).into_owned()))
                    })
                    .collect()
            })
            .collect();
        let json = serde_json::to_string_pretty(&rows).map_err(|_| fmt::Error)?;
        write!(f, "{json}")
    }
}
