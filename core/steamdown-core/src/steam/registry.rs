//! Registry access through `reg.exe`.
//!
//! We shell out to `reg query` and parse its text output rather than binding
//! the registry API directly. The parser is platform-neutral and tested
//! against captured output.

use std::collections::HashMap;
use std::process::Command;

use tracing::debug;

use crate::error::{Result, SteamdownError};
use crate::patterns::{RE_REG_KEY, RE_REG_VALUE};

pub const STEAM_KEY_WOW64: &str = r"HKLM\SOFTWARE\WOW6432Node\Valve\Steam";
pub const STEAM_KEY: &str = r"HKLM\SOFTWARE\Valve\Steam";
pub const STEAM_APPS_KEY: &str = r"HKCU\Software\Valve\Steam\Apps";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegValue {
    Dword(u64),
    Text(String),
    Other { kind: String, data: String },
}

impl RegValue {
    fn parse(kind: &str, data: &str) -> Self {
        match kind {
            "REG_DWORD" | "REG_QWORD" => parse_hex(data)
                .map(RegValue::Dword)
                .unwrap_or_else(|| RegValue::Other {
                    kind: kind.to_string(),
                    data: data.to_string(),
                }),
            "REG_SZ" | "REG_EXPAND_SZ" => RegValue::Text(data.to_string()),
            _ => RegValue::Other {
                kind: kind.to_string(),
                data: data.to_string(),
            },
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RegValue::Dword(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RegValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

fn parse_hex(data: &str) -> Option<u64> {
    let digits = data.trim().trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).ok()
}

/// One key block from `reg query` output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryKey {
    /// Full key path as printed by `reg.exe`, e.g. `HKEY_CURRENT_USER\Software\...`.
    pub path: String,
    pub values: HashMap<String, RegValue>,
}

impl RegistryKey {
    pub fn name(&self) -> &str {
        self.path
            .rsplit_once('\\')
            .map(|(_, name)| name)
            .unwrap_or(&self.path)
    }

    pub fn dword(&self, name: &str) -> u64 {
        self.values.get(name).and_then(RegValue::as_u64).unwrap_or(0)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(RegValue::as_str)
    }
}

/// Parses `reg query` output into key blocks, in output order.
///
/// Value lines before the first key header are ignored.
pub fn parse_reg_query(output: &str) -> Vec<RegistryKey> {
    let mut keys: Vec<RegistryKey> = Vec::new();
    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        if RE_REG_KEY.is_match(line) {
            keys.push(RegistryKey {
                path: line.trim().to_string(),
                values: HashMap::new(),
            });
            continue;
        }

        let Some(captures) = RE_REG_VALUE.captures(line) else {
            continue;
        };
        let Some(current) = keys.last_mut() else {
            continue;
        };
        let name = captures.get(1).map_or("", |m| m.as_str()).to_string();
        let kind = captures.get(2).map_or("", |m| m.as_str());
        let data = captures.get(3).map_or("", |m| m.as_str()).trim_end();
        current.values.insert(name, RegValue::parse(kind, data));
    }
    keys
}

/// Keys that are direct children of the key the query was rooted at.
///
/// `reg query /s` prints the root first; its immediate subkeys are the ones
/// with exactly one more path segment.
pub fn direct_children(keys: &[RegistryKey]) -> Vec<&RegistryKey> {
    let Some(root) = keys.first() else {
        return Vec::new();
    };
    let prefix = format!("{}\\", root.path.to_ascii_lowercase());
    keys.iter()
        .skip(1)
        .filter(|key| {
            let lower = key.path.to_ascii_lowercase();
            lower
                .strip_prefix(&prefix)
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('\\'))
        })
        .collect()
}

/// Source of raw `reg query` text.
pub trait RegistrySource: Send + Sync {
    /// Returns `Ok(None)` when the key does not exist.
    fn query(&self, key: &str, recursive: bool) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Default)]
pub struct RegExe;

impl RegistrySource for RegExe {
    fn query(&self, key: &str, recursive: bool) -> Result<Option<String>> {
        let mut command = super::hidden_command("reg");
        command.arg("query").arg(key);
        if recursive {
            command.arg("/s");
        }
        run_reg(command, key)
    }
}

fn run_reg(mut command: Command, key: &str) -> Result<Option<String>> {
    let output = command.output().map_err(|err| SteamdownError::CommandFailed {
        command: format!("reg query {}", key),
        details: err.to_string(),
    })?;

    if output.status.success() {
        return Ok(Some(String::from_utf8_lossy(&output.stdout).to_string()));
    }

    // reg.exe exits 1 for a missing key; there is no separate code for it.
    debug!(
        key,
        status = %output.status,
        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
        "Registry key not readable"
    );
    Ok(None)
}

/// Reads a single string value, `None` if the key or value is missing.
pub fn query_text_value(
    source: &dyn RegistrySource,
    key: &str,
    name: &str,
) -> Result<Option<String>> {
    let Some(output) = source.query(key, false)? else {
        return Ok(None);
    };
    Ok(parse_reg_query(&output)
        .into_iter()
        .find_map(|entry| entry.text(name).map(str::to_string)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPS_OUTPUT: &str = "\r
HKEY_CURRENT_USER\\Software\\Valve\\Steam\\Apps\r
\r
HKEY_CURRENT_USER\\Software\\Valve\\Steam\\Apps\\730\r
    Installed    REG_DWORD    0x1\r
    Updating    REG_DWORD    0x0\r
    Running    REG_DWORD    0x0\r
    Name    REG_SZ    Counter-Strike 2\r
\r
HKEY_CURRENT_USER\\Software\\Valve\\Steam\\Apps\\570\r
    Updating    REG_DWORD    0x1\r
    Name    REG_SZ    Dota 2\r
    BytesToDownload    REG_QWORD    0x2540be400\r
\r
HKEY_CURRENT_USER\\Software\\Valve\\Steam\\Apps\\570\\Extra\r
    Flag    REG_DWORD    0x1\r
";

    #[test]
    fn parse_reg_query_groups_values_by_key() {
        let keys = parse_reg_query(APPS_OUTPUT);
        assert_eq!(keys.len(), 4);
        assert!(keys[0].values.is_empty());
        assert_eq!(keys[1].name(), "730");
        assert_eq!(keys[1].text("Name"), Some("Counter-Strike 2"));
        assert_eq!(keys[1].dword("Installed"), 1);
        assert_eq!(keys[2].dword("Updating"), 1);
        assert_eq!(keys[2].dword("BytesToDownload"), 10_000_000_000);
    }

    #[test]
    fn missing_dword_reads_as_zero() {
        let keys = parse_reg_query(APPS_OUTPUT);
        assert_eq!(keys[1].dword("Downloading"), 0);
        assert_eq!(keys[1].dword("Name"), 0);
    }

    #[test]
    fn direct_children_skips_root_and_grandchildren() {
        let keys = parse_reg_query(APPS_OUTPUT);
        let names: Vec<_> = direct_children(&keys).iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["730", "570"]);
    }

    #[test]
    fn parse_keeps_spaces_inside_text_data() {
        let output = "HKEY_LOCAL_MACHINE\\SOFTWARE\\WOW6432Node\\Valve\\Steam\n    InstallPath    REG_SZ    C:\\Program Files (x86)\\Steam\n";
        let keys = parse_reg_query(output);
        assert_eq!(
            keys[0].text("InstallPath"),
            Some("C:\\Program Files (x86)\\Steam")
        );
    }

    #[test]
    fn parse_ignores_noise_lines() {
        let output = "ERROR: something\n    Orphan    REG_SZ    x\nEnd of search: 0 match(es) found.\n";
        assert!(parse_reg_query(output).is_empty());
    }

    struct FixedSource(Option<&'static str>);

    impl RegistrySource for FixedSource {
        fn query(&self, _key: &str, _recursive: bool) -> Result<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    #[test]
    fn query_text_value_handles_missing_key() {
        let missing = FixedSource(None);
        assert_eq!(
            query_text_value(&missing, STEAM_KEY, "InstallPath").expect("query"),
            None
        );

        let present = FixedSource(Some(
            "HKEY_LOCAL_MACHINE\\SOFTWARE\\Valve\\Steam\n    InstallPath    REG_SZ    D:\\Steam\n",
        ));
        assert_eq!(
            query_text_value(&present, STEAM_KEY, "InstallPath").expect("query"),
            Some("D:\\Steam".to_string())
        );
    }
}
