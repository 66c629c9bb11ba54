use crate::config::Theme;
use crate::models::Quadrant;
use ratatui::style::Color;

/// Parses a named color, an `r,g,b` triple or `#rrggbb`. Unknown values reset.
pub fn parse_color(value: &str) -> Color {
    let value = value.trim().to_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex).unwrap_or(Color::Reset);
    }
    if value.contains(',') {
        return parse_rgb_triple(&value).unwrap_or(Color::Reset);
    }
    match value.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        "white" => Color::White,
        _ => Color::Reset,
    }
}

fn parse_rgb_triple(value: &str) -> Option<Color> {
    let parts: Vec<u8> = value
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [r, g, b] => Some(Color::Rgb(*r, *g, *b)),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[derive(Debug, Clone)]
pub struct ThemeTokens {
    pub ui_border_default: Color,
    pub ui_border_active: Color,
    pub ui_highlight: Color,
    pub ui_muted: Color,
    pub ui_accent: Color,
    pub task_done: Color,
    pub task_open: Color,
    pub toast_info: Color,
    pub toast_success: Color,
    pub toast_error: Color,
    quadrants: [Color; 4],
}

impl ThemeTokens {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            ui_border_default: parse_color(&theme.border_default),
            ui_border_active: parse_color(&theme.border_active),
            ui_highlight: parse_color(&theme.text_highlight),
            ui_muted: parse_color(&theme.muted),
            ui_accent: parse_color(&theme.accent),
            task_done: parse_color(&theme.task_done),
            task_open: parse_color(&theme.task_open),
            toast_info: parse_color(&theme.toast_info),
            toast_success: parse_color(&theme.toast_success),
            toast_error: parse_color(&theme.toast_error),
            quadrants: theme.quadrants.clone().map(|value| parse_color(&value)),
        }
    }

    pub fn quadrant(&self, quadrant: Quadrant) -> Color {
        self.quadrants[quadrant.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_colors_case_insensitive() {
        assert_eq!(parse_color("Blue"), Color::Blue);
        assert_eq!(parse_color("DaRkGrAy"), Color::DarkGray);
        assert_eq!(parse_color("grey"), Color::Gray);
    }

    #[test]
    fn parses_rgb_and_hex() {
        assert_eq!(parse_color(" 10 , 20 , 30 "), Color::Rgb(10, 20, 30));
        assert_eq!(parse_color("#FF8000"), Color::Rgb(255, 128, 0));
    }

    #[test]
    fn invalid_values_fall_back_to_reset() {
        assert_eq!(parse_color("not-a-color"), Color::Reset);
        assert_eq!(parse_color("1,2"), Color::Reset);
        assert_eq!(parse_color("1,2,300"), Color::Reset);
        assert_eq!(parse_color("#12345"), Color::Reset);
    }

    #[test]
    fn quadrant_colors_follow_theme_order() {
        let mut theme = Theme::default();
        theme.quadrants[2] = "Magenta".to_string();
        let tokens = ThemeTokens::from_theme(&theme);
        assert_eq!(tokens.quadrant(Quadrant::Q3), Color::Magenta);
        assert_eq!(tokens.quadrant(Quadrant::Q1), Color::LightRed);
    }
}
