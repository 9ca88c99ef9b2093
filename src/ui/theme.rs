use crate::finding::Severity;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub info: Style,
    pub dim: Style,
    pub high: Style,
    pub medium: Style,
    pub low: Style,
}

impl Theme {
    /// Colors only on an interactive terminal and when `NO_COLOR` is unset
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            high: Style::new().red().bold(),
            medium: Style::new().yellow(),
            low: Style::new().bright_black(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            high: Style::new(),
            medium: Style::new(),
            low: Style::new(),
        }
    }

    pub fn severity(&self, severity: Severity) -> Style {
        match severity {
            Severity::High => self.high.clone(),
            Severity::Medium => self.medium.clone(),
            Severity::Low => self.low.clone(),
            Severity::None => self.success.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
