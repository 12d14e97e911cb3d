use ratatui::style::Color;

/// Inspector palette
pub struct Theme {
    pub fg: Color,
    pub comment: Color,
    /// Brackets, plain tokens, the unit name in the status bar
    pub accent: Color,
    pub keyword: Color,
    pub string: Color,
    pub number: Color,
    /// Called names and top-level outline rows
    pub name: Color,
    /// `replace` lines and substituted tokens
    pub directive: Color,
    pub ok: Color,
    pub error: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub bar_bg: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    comment: Color::Rgb(108, 112, 134),
    accent: Color::Rgb(137, 180, 250),
    keyword: Color::Rgb(203, 166, 247),
    string: Color::Rgb(166, 227, 161),
    number: Color::Rgb(250, 179, 135),
    name: Color::Rgb(249, 226, 175),
    directive: Color::Rgb(148, 226, 213),
    ok: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(88, 91, 112),
    bar_bg: Color::Rgb(49, 50, 68),
};
