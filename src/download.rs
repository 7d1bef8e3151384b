//! Cached downloads of MassIVE spectrum files.
//!
//! The pipeline only needs the [`Fetch`] capability: turn a [`FileRecord`]
//! into a local path. [`MassiveDownloader`] implements it over HTTP with an
//! on-disk cache laid out as `<cache_dir>/<accession>/<filename>`; a cached
//! file is returned as-is without touching the network.
//!
//! Downloads stream into a sibling `*.part` file that is renamed into place
//! only once the body has been written completely.
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::record::FileRecord;

/// MassIVE's public file download endpoint.
pub const MASSIVE_DOWNLOAD_URL: &str = "https://massive.ucsd.edu/ProteoSAFe/DownloadResultFile";

/// Resolve a record to a local file, downloading it if needed.
pub trait Fetch {
    fn fetch(&self, record: &FileRecord) -> Result<PathBuf>;
}

/// HTTP downloader backed by a local cache directory.
pub struct MassiveDownloader {
    cache_dir: PathBuf,
    base_url: reqwest::Url,
    client: reqwest::blocking::Client,
}

impl MassiveDownloader {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_base_url(cache_dir, MASSIVE_DOWNLOAD_URL)
    }

    pub fn with_base_url(cache_dir: impl Into<PathBuf>, base_url: &str) -> Result<Self> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| Error::InvalidUrl { url: base_url.to_string(), reason: e.to_string() })?;
        // Raw files run to gigabytes; no overall request timeout.
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<std::time::Duration>)
            .user_agent(concat!("mskb-split/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { cache_dir: cache_dir.into(), base_url, client })
    }

    pub fn cache_dir(&self) -> &Path { &self.cache_dir }

    /// Where `record` lives in the cache, whether or not it has been fetched.
    pub fn local_path(&self, record: &FileRecord) -> PathBuf {
        let mut p = self.cache_dir.join(&record.accession);
        for part in record.filename.split('/').filter(|s| !s.is_empty() && *s != "." && *s != "..") {
            p.push(part);
        }
        p
    }

    /// Remote URL for `record`, with the file path percent-encoded.
    pub fn url_for(&self, record: &FileRecord) -> reqwest::Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("file", &format!("f.{}/{}", record.accession, record.filename))
            .append_pair("forceDownload", "true");
        url
    }

    fn download_to(&self, url: reqwest::Url, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut response = self.client.get(url.clone()).send()?;
        if !response.status().is_success() {
            return Err(Error::DownloadStatus { url: url.to_string(), status: response.status() });
        }

        let partial = partial_path(dest);
        let written = {
            let mut out = BufWriter::new(File::create(&partial)?);
            let n = io::copy(&mut response, &mut out);
            n.and_then(|n| out.flush().map(|_| n))
        };
        match written.and_then(|n| fs::rename(&partial, dest).map(|_| n)) {
            Ok(n) => {
                debug!("wrote {} bytes to {}", n, dest.display());
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e.into())
            }
        }
    }
}

impl Fetch for MassiveDownloader {
    fn fetch(&self, record: &FileRecord) -> Result<PathBuf> {
        let dest = self.local_path(record);
        if dest.is_file() {
            debug!("cache hit for {}", record);
            return Ok(dest);
        }
        info!("Downloading {}...", record);
        self.download_to(self.url_for(record), &dest)?;
        Ok(dest)
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
