use tabled::{
    settings::{Style as TableStyle, Width},
    Table,
};
use terminal_size::{terminal_size, Width as TermWidth};

use aeye::Verdict;
use anstyle::Ansi256Color;
use clap::builder::{styling::Style as ClapStyle, Styles};
use console::{Color, Style};
use once_cell::sync::Lazy;

const STEEL_BLUE: Ansi256Color = Ansi256Color(67);
const WALNUT: Ansi256Color = Ansi256Color(137);
const WHITE: Ansi256Color = Ansi256Color(255);
const BRIGHT_WHITE: Ansi256Color = Ansi256Color(231);
const GREEN: Ansi256Color = Ansi256Color(34);
const RED: Ansi256Color = Ansi256Color(160);
const YELLOW: Ansi256Color = Ansi256Color(220);
const LIGHT_BLUE: Ansi256Color = Ansi256Color(75);
const DARK_GRAY: Ansi256Color = Ansi256Color(240);
const PLUM: Ansi256Color = Ansi256Color(96);
const DARK_RED: Ansi256Color = Ansi256Color(52);

fn to_console_color(color: Ansi256Color) -> Color {
    Color::Color256(color.0)
}

/// Console styles for report and log output.
pub struct Theme {
    pub primary: Style,
    pub secondary: Style,
    pub emphasis: Style,
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub info: Style,
    pub subtle: Style,
    pub highlight: Style,
}

impl Default for Theme {
    fn default() -> Self {
        let fg = |color: Ansi256Color| Style::new().fg(to_console_color(color));
        Self {
            primary: fg(STEEL_BLUE),
            secondary: fg(WALNUT),
            emphasis: fg(WHITE).bold(),
            success: fg(GREEN).bold(),
            error: fg(RED).bold(),
            warning: fg(YELLOW).bold(),
            info: fg(LIGHT_BLUE),
            subtle: fg(DARK_GRAY),
            highlight: fg(PLUM).bold(),
        }
    }
}

pub fn theme() -> &'static Theme {
    static THEME: Lazy<Theme> = Lazy::new(Theme::default);
    &THEME
}

impl Theme {
    /// Green for an accepted sample, red for a rejected one.
    pub fn verdict(&self, verdict: Verdict) -> &Style {
        if verdict.is_in_range() {
            &self.success
        } else {
            &self.error
        }
    }
}

fn clap_fg(color: Ansi256Color) -> ClapStyle {
    ClapStyle::new().fg_color(Some(color.into()))
}

/// Help output uses the same palette as reports.
pub fn clap_styles() -> Styles {
    Styles::plain()
        .header(clap_fg(STEEL_BLUE).bold())
        .usage(clap_fg(WHITE).bold())
        .literal(clap_fg(BRIGHT_WHITE))
        .placeholder(clap_fg(WALNUT).italic())
        .error(clap_fg(RED).bold())
        .invalid(clap_fg(DARK_RED).bold())
        .valid(clap_fg(PLUM).bold())
}

pub trait FitToTerminal {
    fn fit_to_terminal(self, max_width: Option<usize>, expand: bool) -> Self;
}

impl FitToTerminal for Table {
    fn fit_to_terminal(mut self, max_width: Option<usize>, expand: bool) -> Self {
        let term_w = terminal_size()
            .map(|(TermWidth(w), _)| w as usize)
            .unwrap_or(80);
        let maxw = max_width.map_or(term_w, |w| w.min(term_w));

        if self.total_width() > maxw {
            self.with(Width::wrap(maxw));
        } else if expand {
            self.with(Width::increase(maxw));
        }
        self
    }
}

/// Rounded table sized to the terminal, used by every listing.
pub fn listing<I, T>(rows: I) -> Table
where
    I: IntoIterator<Item = T>,
    T: tabled::Tabled,
{
    let mut table = Table::new(rows);
    table.with(TableStyle::modern_rounded());
    table.fit_to_terminal(None, true)
}
