//! Line-oriented CSV reader for question import files
//!
//! Records never span lines: the text is split on LF/CRLF first, blank lines
//! are dropped, and each remaining line is tokenized on its own. The first
//! line is the header row.

use tracing::debug;

/// One data row, values aligned with [`CsvTable::headers`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// 1-based line number in the source text
    pub line: usize,
    values: Vec<String>,
}

impl CsvRow {
    /// Value of column `index`, empty when out of range
    pub fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Parsed CSV: normalized headers plus accepted data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    /// Trimmed, unquoted, lower-cased header names
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    /// Index of the column named `name` (already normalized).
    ///
    /// When a header repeats, the right-most column wins.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().rposition(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    Quoted,
}

/// Split one line into trimmed fields.
///
/// `"` toggles quoting; `""` inside quotes is a literal quote; `,` outside
/// quotes ends a field. Quote characters themselves are not kept.
///
/// ```
/// use pathway_import::csv::split_fields;
///
/// assert_eq!(split_fields(r#"a, "b,c" ,"say ""hi""""#), vec!["a", "b,c", r#"say "hi""#]);
/// ```
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut state = State::Unquoted;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (state, c) {
            (State::Quoted, '"') if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            (State::Quoted, '"') => state = State::Unquoted,
            (State::Unquoted, '"') => state = State::Quoted,
            (State::Unquoted, ',') => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            (_, c) => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Trim and drop one leading and one trailing `"`
fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

fn normalize_header(raw: &str) -> String {
    strip_quotes(raw).to_lowercase()
}

/// Parse CSV text into a header row and data rows.
///
/// Rows with fewer fields than the header are dropped; fields beyond the
/// header length are ignored. Empty input yields an empty table.
pub fn parse_csv(text: &str) -> CsvTable {
    let mut lines = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let headers: Vec<String> = match lines.next() {
        Some((_, header_line)) => split_fields(header_line)
            .iter()
            .map(|h| normalize_header(h))
            .collect(),
        None => return CsvTable::default(),
    };

    let mut rows = Vec::new();
    for (index, line) in lines {
        let fields = split_fields(line);
        if fields.len() < headers.len() {
            debug!(
                line = index + 1,
                fields = fields.len(),
                expected = headers.len(),
                "Dropping short CSV row"
            );
            continue;
        }

        let values = fields
            .iter()
            .take(headers.len())
            .map(|f| strip_quotes(f).to_string())
            .collect();

        rows.push(CsvRow {
            line: index + 1,
            values,
        });
    }

    CsvTable { headers, rows }
}
