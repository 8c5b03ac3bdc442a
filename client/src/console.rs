//! Browser console diagnostics.

pub fn info(message: &str) {
    web_sys::console::info_1(&message.into());
}

pub fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

pub fn error(message: &str) {
    web_sys::console::error_1(&message.into());
}

/// Wall-clock time in the visitor's locale, e.g. `3:04:05 PM`.
pub fn local_time() -> String {
    js_sys::Date::new_0()
        .to_locale_time_string("default")
        .into()
}
