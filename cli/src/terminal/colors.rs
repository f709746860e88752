use colored::Color;

pub const PRIMARY: Color = Color::BrightWhite;
pub const ACCENT: Color = Color::BrightCyan;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_ADDR: Color = Color::TrueColor { r: 95, g: 175, b: 255 };
pub const IPV4_PREFIX: Color = Color::TrueColor { r: 135, g: 135, b: 255 };
pub const MAC_ADDR: Color = Color::TrueColor { r: 255, g: 175, b: 95 };
pub const MODEL: Color = Color::BrightMagenta;

pub const NEW_HOST: Color = Color::BrightGreen;
pub const FROZEN: Color = Color::BrightBlue;
pub const DRIFT: Color = Color::BrightYellow;
