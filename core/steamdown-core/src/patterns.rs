//! Compiled regex patterns for parsing Steam files and `reg.exe` output.
//!
//! Compiled once on first use. Update these if Valve changes the VDF/ACF
//! layout or Windows changes the `reg query` output format.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// VDF / ACF Regexes
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_VDF_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""path"\s+"((?:[^"\\]|\\.)+)""#).unwrap());
pub static RE_ACF_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""name"\s+"((?:[^"\\]|\\.)+)""#).unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// Registry Output Regexes
// ═══════════════════════════════════════════════════════════════════════════════

/// A value line: four-space indent, name, type, optional data.
pub static RE_REG_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {4}(.*?) {4}(REG_[A-Z_]+)(?: {4}(.*))?$").unwrap()
});
pub static RE_REG_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^HKEY_[A-Z_]+(\\.*)?$").unwrap());
