use std::fs;

use kolink_core::settings;

pub fn settings_export() {
    print!("{}", settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(settings::parse_settings_toml(&content), "Error: {}");
    println!(
        "OK: build.strict={}, matching.short_match_boundary={}, loader.verify_checksum={}",
        s.build.strict, s.matching.short_match_boundary, s.loader.verify_checksum
    );
}

/// Install a custom settings file before any command reads `settings()`.
pub fn load_settings(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    die!(settings::init_custom(&content), "Error in {file}: {}");
}
