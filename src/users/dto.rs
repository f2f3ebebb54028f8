use serde::Deserialize;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Form body for POST /update-profile.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub username: String,
    pub birthdate: String,
}

pub fn parse_birthdate(input: &str) -> Option<Date> {
    Date::parse(input.trim(), DATE_FORMAT).ok()
}

pub fn format_birthdate(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}
