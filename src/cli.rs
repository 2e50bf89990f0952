//! Command-line interface of `kodegen-sitemirror`.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;

use crate::config::{MirrorConfig, PageLayout};
use crate::utils::constants::{
    CHROME_USER_AGENT, DEFAULT_LANG, DEFAULT_MAX_CONCURRENT_ASSETS, DEFAULT_SETTLE_TIMEOUT_SECS,
};

/// Long flags that are also accepted with a single dash (`-output dir`).
const LEGACY_FLAGS: &[&str] = &[
    "output", "url", "proxyhost", "ph", "proxyport", "pp", "proxy", "useragent", "ua", "lang",
    "timeout", "full", "origin",
];

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "kodegen-sitemirror",
    version,
    about = "Mirror a website into a self-contained local copy",
    long_about = "Renders pages in headless Chromium, downloads their scripts, stylesheets, \
                  images and fonts under client/, and rewrites every reference so the copy \
                  works offline. With --full, every page listed in the site's sitemap.xml \
                  is mirrored and links between them point at the local files."
)]
pub struct Cli {
    /// Directory the mirror is written to (created if missing)
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Page to mirror; https:// is assumed when no scheme is given
    #[arg(short = 'u', long)]
    pub url: String,

    /// Proxy host, used together with --proxyport
    #[arg(long, visible_alias = "ph")]
    pub proxyhost: Option<String>,

    /// Proxy port, used together with --proxyhost
    #[arg(long, visible_alias = "pp")]
    pub proxyport: Option<u16>,

    /// Proxy as host:port; takes precedence over --proxyhost/--proxyport
    #[arg(short = 'p', long)]
    pub proxy: Option<String>,

    /// User agent for the browser and for asset downloads
    #[arg(long, visible_alias = "ua", default_value = CHROME_USER_AGENT)]
    pub useragent: String,

    /// Accept-Language / browser language
    #[arg(short = 'l', long, default_value = DEFAULT_LANG)]
    pub lang: String,

    /// Seconds to let a page run its scripts after navigation
    #[arg(short = 't', long, default_value_t = DEFAULT_SETTLE_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Mirror every page listed in the site's sitemap
    #[arg(long, visible_alias = "f")]
    pub full: bool,

    /// Keep the site's directory structure under pages/ instead of flat file names
    #[arg(long, visible_alias = "o")]
    pub origin: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Assets downloaded concurrently per page
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_ASSETS)]
    pub max_concurrent_assets: usize,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse the process arguments, accepting legacy single-dash long flags.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_legacy_flags(std::env::args_os()))
    }

    /// `host:port` of the configured proxy, if any.
    pub fn proxy_address(&self) -> Result<Option<String>> {
        if let Some(proxy) = self.proxy.as_deref() {
            return Ok(Some(proxy.trim().to_string()));
        }
        match (self.proxyhost.as_deref(), self.proxyport) {
            (Some(host), Some(port)) => Ok(Some(format!("{}:{port}", host.trim()))),
            (Some(_), None) => bail!("--proxyhost needs --proxyport"),
            (None, Some(_)) => bail!("--proxyport needs --proxyhost"),
            (None, None) => Ok(None),
        }
    }

    pub fn into_config(self) -> Result<MirrorConfig> {
        let proxy = self.proxy_address()?;
        let layout = if self.origin {
            PageLayout::Original
        } else {
            PageLayout::Flat
        };

        MirrorConfig::builder()
            .output_dir(self.output)
            .start_url(self.url)
            .full_site(self.full)
            .layout(layout)
            .proxy(proxy)
            .user_agent(self.useragent)
            .lang(self.lang)
            .settle_timeout_secs(self.timeout)
            .headless(!self.headed)
            .max_concurrent_assets(self.max_concurrent_assets)
            .build()
    }
}

/// Rewrite `-name` / `-name=value` to `--name` for the known legacy flags.
///
/// Everything else, short flags included, passes through untouched.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-').filter(|r| !r.starts_with('-')) else {
                return arg;
            };
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if LEGACY_FLAGS.contains(&name) {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(normalize_legacy_flags(args.iter().copied()))
    }

    #[test]
    fn legacy_single_dash_flags_are_accepted() {
        let cli = parse(&[
            "kodegen-sitemirror",
            "-output",
            "out",
            "-url",
            "site.test",
            "-ph",
            "127.0.0.1",
            "-pp",
            "8080",
            "-timeout=3",
            "-full",
            "-origin",
        ]);
        assert_eq!(cli.output, PathBuf::from("out"));
        assert_eq!(cli.url, "site.test");
        assert_eq!(cli.timeout, 3);
        assert!(cli.full && cli.origin);
        assert_eq!(cli.proxy_address().unwrap().as_deref(), Some("127.0.0.1:8080"));
    }

    #[test]
    fn short_and_double_dash_forms_are_untouched() {
        let args = normalize_legacy_flags(["bin", "-o", "out", "--url", "x", "-t", "2", "--f"]);
        assert_eq!(args, ["bin", "-o", "out", "--url", "x", "-t", "2", "--f"].map(OsString::from));

        let cli = parse(&["bin", "-o", "out", "-u", "x", "--f", "--o"]);
        assert!(cli.full && cli.origin);
        assert_eq!(cli.lang, "en-US");
        assert_eq!(cli.useragent, CHROME_USER_AGENT);
    }

    #[test]
    fn explicit_proxy_wins_and_half_proxies_fail() {
        let cli = parse(&["bin", "-o", "out", "-u", "x", "-p", "proxy.test:3128", "-ph", "h"]);
        assert_eq!(cli.proxy_address().unwrap().as_deref(), Some("proxy.test:3128"));

        let cli = parse(&["bin", "-o", "out", "-u", "x", "-ph", "h"]);
        assert!(cli.proxy_address().is_err());
    }

    #[test]
    fn into_config_applies_flags() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[
            "bin",
            "-output",
            dir.path().to_str().unwrap(),
            "-url",
            "site.test/docs",
            "-full",
            "-lang",
            "de-DE",
        ]);
        let config = cli.into_config().unwrap();
        assert!(config.is_full_site());
        assert_eq!(config.layout(), PageLayout::Flat);
        assert_eq!(config.lang(), "de-DE");
        assert_eq!(config.start_url().as_str(), "https://site.test/docs");
    }
}
