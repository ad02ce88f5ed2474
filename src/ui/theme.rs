use ratatui::style::Color;

// Card board palette: dark surface, gray borders, one orange accent for titles.
//
// Status colors live in `format.rs`; this file only holds the chrome around them.
pub const FG: Color = Color::Rgb(229, 231, 235);
pub const MUTED: Color = Color::Rgb(107, 114, 128);
pub const BORDER: Color = Color::Rgb(55, 65, 81);
pub const BAR_BG: Color = Color::Rgb(14, 18, 24);

pub const ACCENT: Color = Color::Rgb(255, 159, 26);
pub const BRANCH: Color = Color::Rgb(192, 132, 252);
pub const OWNER: Color = Color::Rgb(103, 232, 249);

pub const PROGRESS_FILLED: Color = Color::Rgb(134, 239, 172); // light green
pub const PROGRESS_EMPTY: Color = Color::Rgb(55, 65, 81);
pub const WARNING: Color = Color::Rgb(248, 113, 113); // soft red
