//! Fuzz target: `parse_menu_file`
//!
//! Drives arbitrary bytes through the menu definition parser in two
//! languages and asserts it never panics and never yields a label that
//! spans lines.
//!
//! cargo fuzz run fuzz_menu_file

#![no_main]

use cnc_interlock::menu::parse_menu_file;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for language in ["en", "de"] {
        let line = parse_menu_file(data, language);
        assert!(!line.label.contains('\n'), "label spans lines");
    }
});
