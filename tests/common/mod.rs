// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! [`StubRepo`] is an in-memory artifact store: it serves version listings,
//! plugin archives with a generated `META-INF/MANIFEST.MF`, and an advisory
//! feed, and counts every request so tests can assert on cache behaviour.

#![allow(dead_code)]

use plugdeps::{Config, Error, Fetcher, RemoteConfig, Result, Session};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;

pub const PLUGINS_URL: &str = "https://repo.test/download/plugins";
pub const CORE_URL: &str = "https://repo.test/download/war";
pub const FEED_URL: &str = "https://repo.test/update-center.json";

/// In-memory remote serving listings, archives and the advisory feed
#[derive(Default)]
pub struct StubRepo {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    published: Mutex<BTreeMap<String, Vec<String>>>,
    requests: Mutex<Vec<String>>,
}

impl StubRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Publish `name:version` declaring `deps` as `(name, version, optional)`
    pub fn publish(&self, name: &str, version: &str, deps: &[(&str, &str, bool)]) {
        let url = format!("{}/{}/{}/{}.hpi", PLUGINS_URL, name, version, name);
        self.responses
            .lock()
            .unwrap()
            .insert(url, plugin_archive(name, deps));

        let mut published = self.published.lock().unwrap();
        let versions = published.entry(name.to_string()).or_default();
        versions.push(version.to_string());

        let listing = listing_html(name, &format!("{}.hpi", name), versions);
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{}/{}/", PLUGINS_URL, name), listing.into_bytes());
    }

    /// Publish core releases (listing only)
    pub fn publish_core(&self, versions: &[&str]) {
        let versions: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        let listing = listing_html("war", "jenkins.war", &versions);
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{}/", CORE_URL), listing.into_bytes());
    }

    /// Serve `document` as the advisory feed
    pub fn set_feed(&self, document: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(FEED_URL.to_string(), document.as_bytes().to_vec());
    }

    /// Number of requests made so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of archive downloads made so far
    pub fn download_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.ends_with(".hpi") || url.ends_with(".war"))
            .count()
    }
}

impl Fetcher for StubRepo {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::NotFound(url.to_string()))
    }
}

/// Directory listing in the shape served by the update site
pub fn listing_html(name: &str, file_name: &str, versions: &[String]) -> String {
    let mut html = String::from("<html><body><ul>\n");
    for version in versions {
        html.push_str(&format!(
            "<li><a href='/download/{}/{}/{}'>{}</a></li>\n",
            name, version, file_name, version
        ));
    }
    html.push_str("</ul></body></html>\n");
    html
}

/// Build a plugin archive whose manifest declares `deps`
pub fn plugin_archive(name: &str, deps: &[(&str, &str, bool)]) -> Vec<u8> {
    let mut manifest = format!("Manifest-Version: 1.0\r\nShort-Name: {}\r\n", name);
    if !deps.is_empty() {
        let list = deps
            .iter()
            .map(|(dep, version, optional)| {
                if *optional {
                    format!("{}:{};resolution:=optional", dep, version)
                } else {
                    format!("{}:{}", dep, version)
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        manifest.push_str(&fold_line(&format!("Plugin-Dependencies: {}", list)));
    }

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(manifest.as_bytes()).unwrap();
    zip.start_file("WEB-INF/lib/placeholder.txt", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"placeholder").unwrap();
    zip.finish().unwrap().into_inner()
}

/// Wrap a manifest line at 72 bytes with single-space continuations
fn fold_line(line: &str) -> String {
    let bytes = line.as_bytes();
    let mut out = String::new();
    let mut start = 0;
    let mut width = 72;
    while start < bytes.len() {
        let end = (start + width).min(bytes.len());
        if start > 0 {
            out.push(' ');
        }
        out.push_str(&line[start..end]);
        out.push_str("\r\n");
        start = end;
        width = 71;
    }
    out
}

/// Configuration pointing at the stub remote
pub fn stub_config(cache_dir: Option<&Path>) -> Config {
    Config {
        cache_dir: cache_dir.map(Path::to_path_buf),
        remote: RemoteConfig {
            plugins_url: PLUGINS_URL.to_string(),
            core_url: CORE_URL.to_string(),
            feed_url: FEED_URL.to_string(),
            ..RemoteConfig::default()
        },
        ..Config::default()
    }
}

/// Session over `repo` with its cache in `cache_dir`
pub fn stub_session(repo: &Arc<StubRepo>, cache_dir: &Path) -> Session {
    Session::with_fetcher(stub_config(Some(cache_dir)), repo.clone()).unwrap()
}
