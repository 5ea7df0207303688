//! Operator-facing progress lines.

use colored::{Color, Colorize};

pub fn line(text: &str, color: Color) {
    println!("{}", text.color(color));
}

pub fn plain(text: &str) {
    println!("{text}");
}

pub fn solution(path: &str) {
    line(path, Color::Yellow);
}

pub fn progress(text: &str) {
    line(text, Color::Green);
}

pub fn success(text: &str) {
    line(text, Color::Green);
}

pub fn warning(text: &str) {
    line(text, Color::Yellow);
}

pub fn failure(text: &str) {
    line(text, Color::Red);
}
