//! Colored formatter implementation with terminal color support
//!
//! Same layout as the plain formatter, with ANSI colors driven by each
//! field's tone and Unicode icons on section headers.

use super::formatter::{
    worst_severity, Field, FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat, Tone,
};
use crate::{
    analyzer::Analysis,
    error::{AppError, Result},
    models::{HealthAssessment, HealthCategory, Severity},
};
use colored::*;
use std::fmt::Write as _;

/// Round-trip time classification for color coding
#[derive(Debug, Clone, PartialEq)]
pub enum PerformanceLevel {
    Excellent,  // < 50ms
    Good,       // 50-100ms
    Fair,       // 100-300ms
    Poor,       // 300-1000ms
    VeryPoor,   // > 1000ms
}

impl PerformanceLevel {
    /// Determine performance level from a round-trip time in milliseconds
    pub fn from_response_time(time_ms: f64) -> Self {
        if time_ms < 50.0 {
            Self::Excellent
        } else if time_ms < 100.0 {
            Self::Good
        } else if time_ms < 300.0 {
            Self::Fair
        } else if time_ms < 1000.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    /// Get color for this performance level
    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Excellent | Self::Good => Tone::Good,
            Self::Fair => Tone::Fair,
            Self::Poor | Self::VeryPoor => Tone::Bad,
        }
    }

    /// Get descriptive text
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

impl ColorScheme {
    fn tone(&self, tone: Tone) -> Option<Color> {
        match tone {
            Tone::Neutral => None,
            Tone::Good => Some(self.success),
            Tone::Fair => Some(self.warning),
            Tone::Bad => Some(self.error),
        }
    }

    fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::Critical => self.error,
        }
    }

    fn category(&self, category: HealthCategory) -> Color {
        match category {
            HealthCategory::Excellent | HealthCategory::Good => self.success,
            HealthCategory::Fair => self.warning,
            HealthCategory::Poor | HealthCategory::Critical => self.error,
        }
    }
}

fn section_icon(title: &str) -> &'static str {
    match title {
        "Interface" => "🔌",
        "WiFi" => "📶",
        "Latency" => "⏱️",
        "Online" => "🌐",
        _ => "📋",
    }
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "ℹ️",
        Severity::Warning => "⚠️",
        Severity::Critical => "🔴",
    }
}

fn fmt_error(context: &str) -> impl Fn(std::fmt::Error) -> AppError + '_ {
    move |e| AppError::io(format!("Failed to format {}: {}", context, e))
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        let plain_formatter = PlainFormatter::new(options.clone());
        Self {
            plain_formatter,
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    /// Apply bold formatting if colors are enabled
    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Apply dimmed formatting if colors are enabled
    fn dimmed(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.dimmed()
        } else {
            text.normal()
        }
    }

    /// Create a colored section header
    fn create_section_header(&self, title: &str, icon: &str) -> String {
        if self.options.enable_color {
            format!("{} {}", icon, title.bold().color(self.color_scheme.header))
        } else {
            format!("{} {}", icon, title)
        }
    }

    fn field_value(&self, field: &Field) -> ColoredString {
        match (&field.value, self.color_scheme.tone(field.tone)) {
            (None, _) => self.dimmed(field.display_value()),
            (Some(value), Some(color)) => self.colorize(value, color),
            (Some(value), None) => value.normal(),
        }
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, analysis: &Analysis) -> Result<String> {
        let mut output = String::new();
        let title = format!("Network Analysis: {}", analysis.record.name);

        writeln!(output, "{}", self.create_section_header(&title, "🔍")).map_err(fmt_error("header"))?;
        writeln!(output, "{}", self.colorize(&"─".repeat(60), self.color_scheme.border))
            .map_err(fmt_error("header"))?;
        write!(
            output,
            "{} {}  {} {}  {} {}",
            self.dimmed("Mode:"),
            self.colorize(&analysis.mode.to_string(), self.color_scheme.info),
            self.dimmed("Started:"),
            analysis.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.dimmed("Duration:"),
            super::formatter::format_duration(analysis.duration.as_secs_f64() * 1000.0)
        )
        .map_err(fmt_error("header"))?;

        Ok(output)
    }

    fn format_section(&self, title: &str, fields: &[Field]) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.create_section_header(title, section_icon(title)))
            .map_err(fmt_error("section"))?;
        for field in fields {
            if field.value.is_none() && !self.options.verbose_mode {
                continue;
            }
            writeln!(
                output,
                "   {:<16} {}",
                format!("{}:", field.label),
                self.field_value(field)
            )
            .map_err(fmt_error("section"))?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_table(&self, title: &str, format: &TableFormat, rows: &[RowData]) -> Result<String> {
        let mut output = String::new();
        let heading = format!("{} ({})", title, rows.len());
        writeln!(output, "{}", self.create_section_header(&heading, "📋")).map_err(fmt_error("table"))?;
        for line in self.plain_formatter.create_table(format, rows).lines() {
            let line = if line.starts_with('+') {
                self.colorize(line, self.color_scheme.border)
            } else {
                line.normal()
            };
            writeln!(output, "{}", line).map_err(fmt_error("table"))?;
        }
        Ok(output.trim_end().to_string())
    }

    fn format_assessment(&self, assessment: &HealthAssessment) -> Result<String> {
        let mut output = String::new();
        let color = self.color_scheme.category(assessment.category);

        writeln!(output, "{}", self.create_section_header("Health Assessment", "🩺"))
            .map_err(fmt_error("assessment"))?;
        write!(
            output,
            "   Score: {}  Category: {}",
            self.colorize(&format!("{}/100", assessment.score), color).bold(),
            self.colorize(&assessment.category.to_string(), color)
        )
        .map_err(fmt_error("assessment"))?;

        if let Some(worst) = worst_severity(assessment) {
            write!(
                output,
                "\n\n{}",
                self.create_section_header("Warnings", severity_icon(worst))
            )
            .map_err(fmt_error("assessment"))?;
            for warning in &assessment.warnings {
                write!(
                    output,
                    "\n   {} {} {}",
                    self.colorize(&format!("[{}]", warning.severity), self.color_scheme.severity(warning.severity)),
                    self.bold(&format!("{}:", warning.area)),
                    warning.message
                )
                .map_err(fmt_error("assessment"))?;
            }
        }

        if self.options.verbose_mode && !assessment.deductions.is_empty() {
            write!(output, "\n\n{}", self.create_section_header("Deductions", "➖"))
                .map_err(fmt_error("assessment"))?;
            for deduction in &assessment.deductions {
                write!(
                    output,
                    "\n   {} {}: {}",
                    self.colorize(&format!("-{:<3}", deduction.points), self.color_scheme.error),
                    deduction.area,
                    self.dimmed(&deduction.reason)
                )
                .map_err(fmt_error("assessment"))?;
            }
        }

        Ok(output)
    }

    fn format_recommendations(&self, assessment: &HealthAssessment) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.create_section_header("Recommendations", "💡"))
            .map_err(fmt_error("recommendations"))?;
        if assessment.recommendations.is_empty() {
            write!(output, "   {}", self.colorize("✅ No issues found.", self.color_scheme.success))
                .map_err(fmt_error("recommendations"))?;
        } else {
            for (index, recommendation) in assessment.recommendations.iter().enumerate() {
                writeln!(output, "   {}. {}", self.bold(&(index + 1).to_string()), recommendation)
                    .map_err(fmt_error("recommendations"))?;
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("⚠️  {}", self.colorize(warning, self.color_scheme.warning)))
    }
}
