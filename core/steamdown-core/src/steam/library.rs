//! Steam library folders and app manifests.

use fs_err as fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::patterns::{RE_ACF_NAME, RE_VDF_PATH};

/// Undoes VDF string escaping (`\\` and `\"`).
fn unescape_vdf(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Extracts every `"path"` entry from `libraryfolders.vdf` content.
pub fn parse_library_folders(vdf: &str) -> Vec<PathBuf> {
    RE_VDF_PATH
        .captures_iter(vdf)
        .filter_map(|captures| captures.get(1))
        .map(|m| PathBuf::from(unescape_vdf(m.as_str())))
        .collect()
}

/// Extracts the `"name"` field from an `appmanifest_<id>.acf` file.
pub fn parse_manifest_name(acf: &str) -> Option<String> {
    RE_ACF_NAME
        .captures(acf)
        .and_then(|captures| captures.get(1))
        .map(|m| unescape_vdf(m.as_str()))
        .filter(|name| !name.trim().is_empty())
}

/// All library roots: the install folder first, then any extra libraries.
pub fn library_folders(steam_path: &Path) -> Vec<PathBuf> {
    let mut folders = vec![steam_path.to_path_buf()];
    let vdf_path = steam_path.join("steamapps").join("libraryfolders.vdf");
    if !vdf_path.exists() {
        return folders;
    }

    match fs::read_to_string(&vdf_path) {
        Ok(content) => {
            for folder in parse_library_folders(&content) {
                if !folders.iter().any(|known| same_folder(known, &folder)) {
                    folders.push(folder);
                }
            }
        }
        Err(err) => {
            warn!(error = %err, "Failed to read libraryfolders.vdf");
        }
    }
    folders
}

fn same_folder(left: &Path, right: &Path) -> bool {
    let normalize = |path: &Path| {
        path.to_string_lossy()
            .trim_end_matches(['\\', '/'])
            .to_ascii_lowercase()
    };
    normalize(left) == normalize(right)
}

/// Looks up the game name for `app_id` in the first library that has its manifest.
pub fn manifest_name(app_id: &str, libraries: &[PathBuf]) -> Option<String> {
    let file_name = format!("appmanifest_{}.acf", app_id);
    for library in libraries {
        let manifest_path = library.join("steamapps").join(&file_name);
        if !manifest_path.exists() {
            continue;
        }
        match fs::read_to_string(&manifest_path) {
            Ok(content) => {
                if let Some(name) = parse_manifest_name(&content) {
                    return Some(name);
                }
            }
            Err(err) => {
                warn!(error = %err, "Failed to read app manifest");
            }
        }
    }
    None
}
