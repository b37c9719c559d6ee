//! Path helpers
//!
//! Two flavors of path arithmetic live here. The source map helpers
//! (`join`, `relative`, `normalize`, `is_absolute`) follow the URL-aware rules
//! used inside source maps, where a path that is not under the root is left
//! alone. The file helpers (`dirname`, `resolve`, `relative_path`) are POSIX
//! style and purely lexical; the current directory is consulted only when one
//! side is absolute and the other is not.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([\w+\-.]+):)?//(?:(\w+:\w+)@)?([\w.]*)(?::(\d+))?(\S*)$")
        .unwrap()
});
static DATA_URL_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:.+,.+$").unwrap());
static SCHEME_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+://").unwrap());
static SLASHES_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"/+").unwrap());
static EXHAUSTED_ROOT_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^/]+:/)?/*$").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub auth: String,
    pub host: String,
    pub port: String,
    pub path: String,
}

/// True for `scheme://...` references, which are never rewritten.
pub fn is_url(path: &str) -> bool {
    SCHEME_REGEXP.is_match(path)
}

pub fn url_parse(url: &str) -> Option<UrlParts> {
    let captures = URL_REGEXP.captures(url)?;
    let group = |i: usize| captures.get(i).map_or("", |m| m.as_str()).to_owned();
    Some(UrlParts {
        scheme: group(1),
        auth: group(2),
        host: group(3),
        port: group(4),
        path: group(5),
    })
}

pub fn url_generate(parts: &UrlParts) -> String {
    let mut url = String::new();
    if !parts.scheme.is_empty() {
        url.push_str(&parts.scheme);
        url.push(':');
    }
    url.push_str("//");
    if !parts.auth.is_empty() {
        url.push_str(&parts.auth);
        url.push('@');
    }
    url.push_str(&parts.host);
    if !parts.port.is_empty() {
        url.push(':');
        url.push_str(&parts.port);
    }
    url.push_str(&parts.path);
    url
}

pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || URL_REGEXP.is_match(path)
}

/// Collapse `.` and `..` segments and repeated slashes. URL paths are
/// normalized in place.
pub fn normalize(path: &str) -> String {
    let url = url_parse(path);
    let target = match &url {
        Some(parts) if parts.path.is_empty() => return path.to_owned(),
        Some(parts) => parts.path.as_str(),
        None => path,
    };
    let absolute = is_absolute(target);

    let mut parts: Vec<&str> = SLASHES_REGEXP.split(target).collect();
    let mut up = 0usize;
    let mut i = parts.len();
    while i > 0 {
        i -= 1;
        let part = parts[i];
        if part == "." {
            parts.remove(i);
        } else if part == ".." {
            up += 1;
        } else if up > 0 {
            if part.is_empty() {
                // above the root is a no-op
                let end = (i + 1 + up).min(parts.len());
                parts.drain(i + 1..end);
                up = 0;
            } else {
                let end = (i + 2).min(parts.len());
                parts.drain(i..end);
                up -= 1;
            }
        }
    }

    let mut normalized = parts.join("/");
    if normalized.is_empty() {
        normalized = if absolute { "/".into() } else { ".".into() };
    }

    match url {
        Some(mut parts) => {
            parts.path = normalized;
            url_generate(&parts)
        }
        None => normalized,
    }
}

/// Join `path` onto `root`. Absolute paths, scheme-relative URLs and data
/// URIs win over the root.
pub fn join(root: &str, path: &str) -> String {
    let root = if root.is_empty() { "." } else { root };
    let path = if path.is_empty() { "." } else { path };

    let path_url = url_parse(path);
    let root_url = url_parse(root);
    let root = match &root_url {
        Some(parts) if parts.path.is_empty() => "/",
        Some(parts) => parts.path.as_str(),
        None => root,
    };

    if let Some(mut parts) = path_url.clone() {
        if parts.scheme.is_empty() {
            if let Some(root_parts) = &root_url {
                parts.scheme = root_parts.scheme.clone();
            }
            return url_generate(&parts);
        }
    }

    if path_url.is_some() || DATA_URL_REGEXP.is_match(path) {
        return path.to_owned();
    }

    if let Some(root_parts) = &root_url {
        if root_parts.host.is_empty() && root_parts.path.is_empty() {
            let mut parts = root_parts.clone();
            parts.host = path.to_owned();
            return url_generate(&parts);
        }
    }

    let joined = if path.starts_with('/') {
        path.to_owned()
    } else {
        normalize(&format!("{}/{}", root.trim_end_matches('/'), path))
    };

    match root_url {
        Some(mut parts) => {
            parts.path = joined;
            url_generate(&parts)
        }
        None => joined,
    }
}

/// Make `path` relative to `root`. A path outside the root comes back
/// unchanged.
pub fn relative(root: &str, path: &str) -> String {
    let root = if root.is_empty() { "." } else { root };
    let mut root = root.strip_suffix('/').unwrap_or(root).to_owned();

    let mut level = 0usize;
    while !path.starts_with(&format!("{}/", root)) {
        let Some(index) = root.rfind('/') else {
            return path.to_owned();
        };
        root.truncate(index);
        if EXHAUSTED_ROOT_REGEXP.is_match(&root) {
            return path.to_owned();
        }
        level += 1;
    }

    format!("{}{}", "../".repeat(level), &path[root.len() + 1..])
}

/// POSIX dirname: `"a/b.css"` is `"a"`, `"b.css"` is `"."`.
pub fn dirname(path: &str) -> String {
    if path.is_empty() {
        return ".".into();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".into();
    }
    match trimmed.rfind('/') {
        None => ".".into(),
        Some(index) => {
            let parent = trimmed[..index].trim_end_matches('/');
            if parent.is_empty() {
                "/".into()
            } else {
                parent.to_owned()
            }
        }
    }
}

/// Lexical POSIX normalization. Leading `..` of relative paths are kept.
pub fn normalize_file(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".into(),
        (false, false) => joined,
    }
}

/// Resolve `path` against `base`. Stays relative when both are relative.
pub fn resolve(base: &str, path: &str) -> String {
    if path.starts_with('/') || base.is_empty() {
        normalize_file(path)
    } else {
        normalize_file(&format!("{}/{}", base, path))
    }
}

fn absolutize(path: &str) -> String {
    if path.starts_with('/') {
        return normalize_file(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => resolve(&cwd.to_string_lossy(), path),
        Err(_) => normalize_file(path),
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".").collect()
}

/// Relative path leading from directory `from` to `to`.
pub fn relative_path(from: &str, to: &str) -> String {
    let mut from = normalize_file(from);
    let mut to = normalize_file(to);
    if from.starts_with('/') != to.starts_with('/') || from.starts_with("..") {
        from = absolutize(&from);
        to = absolutize(&to);
    }
    if from == to {
        return String::new();
    }

    let from_parts = segments(&from);
    let to_parts = segments(&to);
    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_parts.len() - common];
    parts.extend_from_slice(&to_parts[common..]);
    parts.join("/")
}
