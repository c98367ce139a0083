//! Header alias table for import CSVs
//!
//! Each logical field accepts a snake_case and a "space case" spelling. The
//! table is resolved against a file's headers once; rows are then read by
//! column index.

use crate::csv::{CsvRow, CsvTable};

/// Logical columns of an import file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AssessmentSlug,
    QuestionOrder,
    QuestionText,
    QuestionType,
    VoiceScript,
    /// Accepted but not used
    Required,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::AssessmentSlug,
        Field::QuestionOrder,
        Field::QuestionText,
        Field::QuestionType,
        Field::VoiceScript,
        Field::Required,
    ];

    /// Accepted spellings, in lookup order
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::AssessmentSlug => &["assessment_slug", "assessment slug"],
            Field::QuestionOrder => &["question_order", "question order"],
            Field::QuestionText => &["question_text", "question text"],
            Field::QuestionType => &["question_type", "question type"],
            Field::VoiceScript => &["voice_script", "voice script"],
            Field::Required => &["required"],
        }
    }
}

/// Spellings tried for `option{n}`, in lookup order
pub fn option_aliases(n: usize) -> [String; 6] {
    [
        format!("option{}", n),
        format!("Option{}", n),
        format!("OPTION{}", n),
        format!("option {}", n),
        format!("Option {}", n),
        format!("OPTION {}", n),
    ]
}

/// Column indexes for every logical field, resolved once per file
#[derive(Debug, Clone, Default)]
pub struct ResolvedHeaders {
    fields: Vec<(Field, Vec<usize>)>,
    /// `options[n - 1]` holds the candidate columns for `option{n}`
    options: Vec<Vec<usize>>,
}

impl ResolvedHeaders {
    pub fn resolve(table: &CsvTable) -> Self {
        let fields = Field::ALL
            .iter()
            .map(|field| {
                let columns = field
                    .aliases()
                    .iter()
                    .filter_map(|alias| table.column(alias))
                    .collect();
                (*field, columns)
            })
            .collect();

        let mut options = Vec::new();
        for n in 1.. {
            let columns = option_columns(table, n);
            if columns.is_empty() {
                break;
            }
            options.push(columns);
        }

        Self { fields, options }
    }

    /// First non-empty value among the field's aliases, trimmed
    pub fn value<'a>(&self, row: &'a CsvRow, field: Field) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, columns)| first_non_empty(row, columns))
    }

    /// Whether the file has any column for `field`
    pub fn has(&self, field: Field) -> bool {
        self.fields
            .iter()
            .any(|(f, columns)| *f == field && !columns.is_empty())
    }

    /// Option values of `row`, contiguous from `option1`.
    ///
    /// Collection stops at the first `n` without a non-empty value, so a gap
    /// hides every later option.
    pub fn options(&self, row: &CsvRow) -> Vec<String> {
        self.options
            .iter()
            .map_while(|columns| first_non_empty(row, columns))
            .map(str::to_string)
            .collect()
    }
}

/// Candidate columns for `option{n}`: the listed spellings first, then any
/// header equal to one of them ignoring case
fn option_columns(table: &CsvTable, n: usize) -> Vec<usize> {
    let aliases = option_aliases(n);
    let mut columns: Vec<usize> = aliases.iter().filter_map(|a| table.column(a)).collect();

    for (index, header) in table.headers.iter().enumerate() {
        let matches = aliases.iter().any(|a| a.eq_ignore_ascii_case(header));
        if matches && !columns.contains(&index) {
            columns.push(index);
        }
    }

    columns
}

fn first_non_empty<'a>(row: &'a CsvRow, columns: &[usize]) -> Option<&'a str> {
    columns
        .iter()
        .map(|i| row.value(*i).trim())
        .find(|v| !v.is_empty())
}
