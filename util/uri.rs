/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::{Path, PathBuf};

use url::Url;

use crate::util::bcp47::Bcp47;

/// Host part of `url`, or an empty string when it has none or does not parse.
pub fn hostname(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

pub fn is_local_file(url: &str) -> bool {
    Url::parse(url).map(|u| u.scheme() == "file").unwrap_or(false)
}

/// Filesystem path for a `file://` URL. Bare absolute paths are accepted too.
pub fn local_path(url: &str) -> Option<PathBuf> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "file" => parsed.to_file_path().ok(),
        Ok(_) => None,
        Err(_) => {
            let path = Path::new(url);
            path.is_absolute().then(|| path.to_path_buf())
        }
    }
}

pub fn scheme(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.scheme().to_string())
}

/// Localised candidates for the platform error page, most specific first:
///
/// ```text
/// <dir>/resources/<language>/<script>[/<region>]/html/<file>
/// <dir>/resources/<language>/<region>/html/<file>
/// <dir>/resources/<language>/html/<file>
/// <dir>/resources/html/<file>
/// <location>
/// ```
pub fn error_page_paths(location: &Path, language: &str) -> Vec<PathBuf> {
    let Some(file_name) = location.file_name() else {
        return Vec::new();
    };
    let search_dir = location.parent().unwrap_or_else(|| Path::new("/"));
    let resources = search_dir.join("resources");

    let mut paths = Vec::with_capacity(5);
    if let Ok(tag) = language.parse::<Bcp47>() {
        if let Some(script) = tag.script() {
            let mut dir = resources.join(tag.language()).join(script);
            if let Some(region) = tag.region() {
                dir = dir.join(region);
            }
            paths.push(dir.join("html").join(file_name));
        }
        if let Some(region) = tag.region() {
            paths.push(
                resources
                    .join(tag.language())
                    .join(region)
                    .join("html")
                    .join(file_name),
            );
        }
        paths.push(resources.join(tag.language()).join("html").join(file_name));
    }
    paths.push(resources.join("html").join(file_name));
    paths.push(location.to_path_buf());
    paths
}
