/// A position in the source text. All fields are 0-based; `column` counts
/// bytes from the start of the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub offset: usize,
    pub row: usize,
    pub column: usize,
}

/// Half-open range of source text covered by a token or error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Point,
    pub end: Point,
}

pub trait Spanning {
    fn span(&self) -> Span;
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Point {
    pub fn point_span(&self) -> Span {
        Span {
            start: *self,
            end: *self,
        }
    }

    /// Renders the line containing this point with a caret under its column.
    pub fn caret_diagnostic(&self, source: &str) -> String {
        let line = source.lines().nth(self.row).unwrap_or("");
        let column = self.column.min(line.len());
        let mut diag = String::new();
        diag.push_str(&format!("{:>4} | {}\n", self.row + 1, line));
        diag.push_str("     | ");
        for c in line.get(..column).unwrap_or(line).chars() {
            diag.push(if c == '\t' { '\t' } else { ' ' });
        }
        diag.push_str("^\n");
        diag
    }
}

impl core::fmt::Display for Point {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}
