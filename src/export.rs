use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use std::path::Path;

/// A finished report. Never modified after [ReportGenerator](crate::ReportGenerator) hands
/// it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The serialized PDF
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Suggested download name, see [report_file_name]
    pub file_name: String,
}

impl Report {
    /// The report as a `data:` URI, for embedding in a viewer or a download link
    pub fn to_data_uri(&self) -> String {
        format!("data:application/pdf;base64,{}", STANDARD.encode(&self.bytes))
    }

    /// Write the PDF to `path`, replacing any existing file
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// `{project}_{DD.MM.YYYY}.pdf`, with characters that can't appear in a file name replaced
/// by underscores
pub fn report_file_name(project: &str, date: NaiveDate) -> String {
    let project: String = project
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let project = if project.is_empty() {
        "report".to_string()
    } else {
        project
    };
    format!("{project}_{}.pdf", date.format("%d.%m.%Y"))
}
