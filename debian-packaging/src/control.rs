// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Control file stanzas.

A control file is a series of stanzas (paragraphs) separated by blank lines.
Each stanza holds `Name: value` fields. A line starting with a space or tab
continues the value of the preceding field. Lines starting with `#` are
ignored.

See <https://www.debian.org/doc/debian-policy/ch-controlfields.html>.
*/

use crate::error::{DebianError, Result};

/// A single `Name: value` field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ControlField {
    name: String,
    /// First line followed by any continuation lines, joined with `\n`.
    value: String,
}

impl ControlField {
    /// The field name, as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full value, continuation lines included.
    ///
    /// Whitespace surrounding each line is removed.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The value on the line holding the field name.
    pub fn first_line(&self) -> &str {
        self.value.split('\n').next().unwrap_or_default()
    }

    /// Continuation lines of the value.
    pub fn continuation_lines(&self) -> impl Iterator<Item = &str> {
        self.value.split('\n').skip(1)
    }
}

/// A stanza of control fields, in file order.
///
/// Lookups ignore ASCII case. When a name repeats, the last occurrence wins.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ControlParagraph {
    fields: Vec<ControlField>,
}

impl ControlParagraph {
    /// Parse the first stanza of `text`.
    ///
    /// Leading blank lines are skipped. Errors in later stanzas are not reported.
    pub fn parse_first(text: &str) -> Result<Option<Self>> {
        Stanzas::new(text).next().transpose()
    }

    /// Parse every stanza in `text`.
    pub fn parse_all(text: &str) -> Result<Vec<Self>> {
        Stanzas::new(text).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &ControlField> {
        self.fields.iter()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&ControlField> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// The full value of the named field.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).map(ControlField::value)
    }

    fn push(&mut self, line_number: usize, line: &str) -> Result<()> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| syntax_error(line_number, "missing colon"))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(syntax_error(line_number, "empty field name"));
        }

        self.fields.push(ControlField {
            name: name.to_string(),
            value: value.trim().to_string(),
        });

        Ok(())
    }

    fn continue_last(&mut self, line_number: usize, line: &str) -> Result<()> {
        let field = self
            .fields
            .last_mut()
            .ok_or_else(|| syntax_error(line_number, "continuation line without a field"))?;

        field.value.push('\n');
        field.value.push_str(line.trim());

        Ok(())
    }
}

fn syntax_error(line: usize, reason: &'static str) -> DebianError {
    DebianError::ControlSyntax { line, reason }
}

/// Iterator of stanzas over control file text.
///
/// Iteration ends after the first error.
pub struct Stanzas<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    failed: bool,
}

impl<'a> Stanzas<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            failed: false,
        }
    }

    fn next_stanza(&mut self) -> Result<Option<ControlParagraph>> {
        let mut paragraph = ControlParagraph::default();

        for (index, line) in self.lines.by_ref() {
            let line_number = index + 1;

            if line.trim().is_empty() {
                if paragraph.is_empty() {
                    continue;
                }
                return Ok(Some(paragraph));
            }

            if line.starts_with('#') {
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                paragraph.continue_last(line_number, line)?;
            } else {
                paragraph.push(line_number, line)?;
            }
        }

        Ok(if paragraph.is_empty() {
            None
        } else {
            Some(paragraph)
        })
    }
}

impl<'a> Iterator for Stanzas<'a> {
    type Item = Result<ControlParagraph>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let res = self.next_stanza().transpose();
        if matches!(res, Some(Err(_))) {
            self.failed = true;
        }

        res
    }
}
