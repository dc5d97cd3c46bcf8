use colored::Colorize;

use pxdgen_common::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};

pub struct Reporter {
    color: bool,
    warning_level: u8,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            warning_level: 1,
        }
    }

    pub fn with_warning_level(mut self, warning_level: u8) -> Self {
        self.warning_level = warning_level;
        self
    }

    /// Errors are always shown; warnings from level 1, everything else from
    /// level 2.
    pub fn is_visible(&self, diagnostic: &Diagnostic) -> bool {
        match diagnostic.category {
            DiagnosticCategory::Error => true,
            DiagnosticCategory::Warning => self.warning_level >= 1,
            DiagnosticCategory::Suggestion | DiagnosticCategory::Message => self.warning_level >= 2,
        }
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics.iter().filter(|d| self.is_visible(d)) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let location = self.format_location(&diagnostic.file, diagnostic.line, diagnostic.column);
        let category = self.format_category(diagnostic.category);
        let code = self.format_code(diagnostic.code);

        let mut output = location;
        output.push_str(" - ");
        output.push_str(&category);
        if !code.is_empty() {
            output.push(' ');
            output.push_str(&code);
        }
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
        }

        output
    }

    /// One line per failed input plus the totals; empty when nothing failed.
    pub fn render_summary(&self, diagnostics: &[Diagnostic]) -> String {
        let mut failed_files: Vec<&str> = Vec::new();
        let mut errors = 0usize;
        for diagnostic in diagnostics.iter().filter(|d| d.is_error()) {
            errors += 1;
            if !failed_files.contains(&diagnostic.file.as_str()) {
                failed_files.push(&diagnostic.file);
            }
        }
        if errors == 0 {
            return String::new();
        }

        let mut out = String::new();
        for file in &failed_files {
            out.push_str(&format!("  {}\n", self.format_file(file)));
        }
        let noun = if errors == 1 { "error" } else { "errors" };
        let files = if failed_files.len() == 1 { "file" } else { "files" };
        let totals = format!("Found {errors} {noun} in {} {files}.", failed_files.len());
        out.push_str(&totals);
        out
    }

    fn format_related(&self, related: &DiagnosticRelatedInformation) -> String {
        let location = self.format_location(&related.file, related.line, related.column);
        let prefix = if self.color {
            "  Related".dimmed().to_string()
        } else {
            "  Related".to_string()
        };

        format!("{}: {} - {}", prefix, location, related.message_text)
    }

    fn format_location(&self, file: &str, line: u32, column: u32) -> String {
        let file = self.format_file(file);
        if line == 0 {
            return file;
        }
        format!("{}:{}:{}", file, line, column.max(1))
    }

    fn format_file(&self, file: &str) -> String {
        if file.is_empty() {
            "pxdgen".to_string()
        } else {
            file.to_string()
        }
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };

        if !self.color {
            return label.to_string();
        }

        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        if code == 0 {
            return String::new();
        }

        let label = format!("PXD{}", code);
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}
