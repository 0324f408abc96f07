//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an optional price as whole KES, or an em dash when absent.
///
/// Usage in templates: `{{ bag.pricing|kes }}`
#[askama::filter_fn]
pub fn kes(
    value: &Option<sonie_atelier_core::Price>,
    _env: &dyn askama::Values,
) -> askama::Result<String> {
    Ok(value
        .as_ref()
        .map_or_else(|| "\u{2014}".to_owned(), |p| p.display_kes()))
}
