// Sequential cursor over configuration lines

use crate::core::error::{ComtradeError, Result};

/// Walks the configuration grammar one line at a time. Every advance is
/// checked against the remaining lines, so running out of input surfaces as
/// a structural error naming what was expected.
pub struct LineCursor<'a> {
    lines: Vec<&'a str>,
    position: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        Self { lines, position: 0 }
    }

    /// 1-based number of the line the next call to `next_line` returns.
    pub fn line_number(&self) -> usize {
        self.position + 1
    }

    pub fn remaining(&self) -> usize {
        self.lines.len() - self.position
    }

    pub fn next_line(&mut self, expected: &str) -> Result<&'a str> {
        let line = self.lines.get(self.position).copied().ok_or_else(|| {
            ComtradeError::structural(
                self.line_number(),
                format!("unexpected end of configuration, expected {}", expected),
            )
        })?;
        self.position += 1;
        Ok(line)
    }

    /// Takes the next `count` lines, failing before consuming any if fewer remain.
    pub fn take(&mut self, count: usize, expected: &str) -> Result<Vec<(usize, &'a str)>> {
        if self.remaining() < count {
            return Err(ComtradeError::structural(
                self.lines.len() + 1,
                format!(
                    "unexpected end of configuration, expected {} {} line(s), {} left",
                    count,
                    expected,
                    self.remaining()
                ),
            ));
        }
        let start = self.position;
        self.position += count;
        Ok((start..self.position)
            .map(|i| (i + 1, self.lines[i]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_carriage_returns() {
        let mut cursor = LineCursor::new("a,b\r\nc\r\n");
        assert_eq!(cursor.next_line("first").unwrap(), "a,b");
        assert_eq!(cursor.line_number(), 2);
        assert_eq!(cursor.next_line("second").unwrap(), "c");
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_take_checks_bounds_before_consuming() {
        let mut cursor = LineCursor::new("1\n2\n3");
        let err = cursor.take(4, "analog channel").unwrap_err();
        assert!(matches!(err, ComtradeError::Structural { line: 4, .. }));
        assert_eq!(cursor.remaining(), 3);

        let taken = cursor.take(2, "analog channel").unwrap();
        assert_eq!(taken, vec![(1, "1"), (2, "2")]);
        assert_eq!(cursor.next_line("third").unwrap(), "3");
        assert!(cursor.next_line("fourth").is_err());
    }
}
