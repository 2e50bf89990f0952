//! Pure naming rules for files in the mirror.
//!
//! Everything here is deterministic and touches no state; collision handling
//! lives in [`OutputStore`](super::OutputStore).

use std::path::Path;

use crate::config::PageLayout;
use crate::uri::CanonicalUri;
use crate::utils::constants::{
    CLIENT_DIR, DEFAULT_PAGE_NAME, MAX_ASSET_NAME_CHARS, PAGES_DIR, UNKNOWN_ASSET_NAME,
};

/// Asset category, which is also the directory under `client/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Images,
    Styles,
    Scripts,
    Fonts,
}

impl AssetKind {
    /// Directory name under `client/`
    #[must_use]
    pub fn dir(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Fonts => "fonts",
        }
    }

    /// Category from a file extension; unknown extensions are treated as images.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "css" => Self::Styles,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Self::Fonts,
            _ => Self::Images,
        }
    }

    #[must_use]
    pub fn from_uri(uri: &CanonicalUri) -> Self {
        let ext = uri
            .last_segment()
            .and_then(|segment| Path::new(segment).extension())
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }
}

/// File name for an asset: the last path segment, fragment dropped,
/// sanitized, and cut to its trailing 50 characters.
#[must_use]
pub fn asset_file_name(uri: &CanonicalUri) -> String {
    let segment = uri.last_segment().unwrap_or_default();
    let segment = segment.split('#').next().unwrap_or_default();
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    let sanitized = sanitize_filename::sanitize(decoded.trim());

    let name = keep_trailing_chars(&sanitized, MAX_ASSET_NAME_CHARS);
    let name = name.trim_start_matches(['.', '-', ' ']);
    if name.is_empty() {
        UNKNOWN_ASSET_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// `client/{kind}/{name}`
#[must_use]
pub fn asset_path(kind: AssetKind, name: &str) -> String {
    format!("{CLIENT_DIR}/{}/{name}", kind.dir())
}

/// Insert `-{n}` before the extension of the last path component.
#[must_use]
pub fn with_suffix(path: &str, n: usize) -> String {
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path),
    };
    let renamed = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
        _ => format!("{file}-{n}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{renamed}"),
        None => renamed,
    }
}

/// Output path of a page relative to the mirror root, before collision handling.
///
/// The URI path names the file: an empty file name becomes `default.html`, and
/// `.html` is appended unless the name already ends in `.html`, `.htm` or `.php`.
#[must_use]
pub fn page_file_name(uri: &CanonicalUri, layout: PageLayout) -> String {
    let decoded = urlencoding::decode(uri.path())
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| uri.path().to_string());
    let normalized = decoded.replace('\\', "/");

    let mut segments: Vec<String> = normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(sanitize_filename::sanitize)
        .filter(|s| !s.is_empty())
        .collect();

    if normalized.ends_with('/') || segments.is_empty() {
        segments.push(DEFAULT_PAGE_NAME.to_string());
    } else if let Some(last) = segments.last_mut()
        && !has_page_extension(last)
    {
        last.push_str(".html");
    }

    match layout {
        PageLayout::Flat => {
            let flat = segments.join("-");
            flat.trim_matches('-').to_string()
        }
        PageLayout::Original => format!("{PAGES_DIR}/{}", segments.join("/")),
    }
}

/// Base name shared by a page's bundle files.
///
/// The page's path below the mirror root (or `pages/`), flattened with `-` and
/// without extension: `pages/docs/intro.html` gives `docs-intro`.
#[must_use]
pub fn page_stem(page_path: &str) -> String {
    let below_root = page_path
        .strip_prefix(PAGES_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(page_path);
    let without_ext = match below_root.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() && !stem.ends_with('/') => stem,
        _ => below_root,
    };
    without_ext.replace(['/', '\\'], "-").trim_matches('-').to_string()
}

/// Paths of the three per-page bundle files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    pub style: String,
    pub preload_script: String,
    pub script: String,
}

impl BundlePaths {
    #[must_use]
    pub fn for_page(page_path: &str) -> Self {
        let stem = page_stem(page_path);
        Self {
            style: format!("{CLIENT_DIR}/styles/pages/{stem}.css"),
            preload_script: format!("{CLIENT_DIR}/scripts/pages/{stem}-preload.js"),
            script: format!("{CLIENT_DIR}/scripts/pages/{stem}.js"),
        }
    }
}

/// URL reference from the file at `from` to the file at `to`, both relative
/// to the mirror root.
///
/// Segments are percent-encoded: file names are stored decoded, and a bare
/// `#`, `%` or space would not survive as an `href` or an unquoted `url()`.
#[must_use]
pub fn relative_ref(from: &str, to: &str) -> String {
    let from_dir = Path::new(from).parent().unwrap_or_else(|| Path::new(""));
    let path = pathdiff::diff_paths(Path::new(to), from_dir)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|| to.to_string());
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

fn has_page_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm") || lower.ends_with(".php")
}

fn keep_trailing_chars(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    let skip = count - max;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
