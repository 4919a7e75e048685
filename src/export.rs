//! Writes the store's views to disk
//!
//! Layout under the output directory:
//! - `classic/<view>.txt` newline-joined addresses, always written
//! - `classic/<view>.<ext>` and `advanced/<view>.<ext>` per configured format
//!
//! XML and YAML wrap each view in a `proxies` root; the global advanced view
//! uses `Proxies` for its XML root.

use crate::error::{ProxyError, Result};
use crate::proxy::{ProxyAggregate, ProxyRecord, ProxyStore, ProxyType};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Serialization format for exported views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Xml,
    Yaml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Xml,
        ExportFormat::Yaml,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            _ => Err(format!("Invalid export format: {}. Use: json, csv, xml, yaml", s)),
        }
    }
}

/// A view entry that knows its CSV layout and XML root element
trait ExportRow: Serialize {
    const XML_ROOT: &'static str = "proxies";

    fn header() -> Option<&'static [&'static str]>;
    fn fields(&self) -> Vec<String>;
}

#[derive(Serialize)]
struct XmlView<'a, T> {
    #[serde(rename = "Proxy")]
    proxies: &'a [T],
}

#[derive(Serialize)]
struct YamlView<'a, T> {
    proxies: &'a [T],
}

impl ExportRow for String {
    fn header() -> Option<&'static [&'static str]> {
        None
    }

    fn fields(&self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl ExportRow for ProxyRecord {
    fn header() -> Option<&'static [&'static str]> {
        Some(&["Proxy", "IP", "Port", "TimeTaken", "CheckedAt"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.proxy.clone(),
            self.ip.clone(),
            self.port.to_string(),
            self.time_taken.to_string(),
            self.checked_at.clone(),
        ]
    }
}

impl ExportRow for ProxyAggregate {
    const XML_ROOT: &'static str = "Proxies";

    fn header() -> Option<&'static [&'static str]> {
        Some(&["Proxy", "IP", "Port", "Categories", "TimeTaken", "CheckedAt"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.proxy.clone(),
            self.ip.clone(),
            self.port.to_string(),
            self.categories_label(),
            self.time_taken.to_string(),
            self.checked_at.clone(),
        ]
    }
}

/// Writes classic and advanced views for `all` and each protocol
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    formats: Vec<ExportFormat>,
}

impl Exporter {
    pub fn new<P: AsRef<Path>>(output_dir: P, formats: Vec<ExportFormat>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            formats,
        }
    }

    /// Export every view. Returns the paths written.
    pub fn export(&self, store: &ProxyStore) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        written.extend(self.save_view(
            "all",
            &store.all_classic_view(),
            &store.all_advanced_view(),
        )?);
        for category in ProxyType::SUPPORTED {
            let name = category.scheme();
            written.extend(self.save_view(
                &name,
                &store.classic_view(&category),
                &store.advanced_view(&category),
            )?);
        }

        info!(
            files = written.len(),
            dir = %self.output_dir.display(),
            "exported proxy lists"
        );
        Ok(written)
    }

    fn save_view<A: ExportRow>(
        &self,
        name: &str,
        classic: &[String],
        advanced: &[A],
    ) -> Result<Vec<PathBuf>> {
        let classic_dir = self.output_dir.join("classic");
        let advanced_dir = self.output_dir.join("advanced");
        fs::create_dir_all(&classic_dir)?;
        fs::create_dir_all(&advanced_dir)?;

        let mut written = Vec::new();

        let txt = classic_dir.join(format!("{}.txt", name));
        fs::write(&txt, classic.join("\n"))?;
        written.push(txt);

        for format in &self.formats {
            let path = classic_dir.join(format!("{}.{}", name, format));
            Self::write(&path, *format, classic)?;
            written.push(path);

            let path = advanced_dir.join(format!("{}.{}", name, format));
            Self::write(&path, *format, advanced)?;
            written.push(path);
        }

        debug!(view = name, entries = classic.len(), "saved view");
        Ok(written)
    }

    fn write<T: ExportRow>(path: &Path, format: ExportFormat, rows: &[T]) -> Result<()> {
        let file = File::create(path)?;
        match format {
            ExportFormat::Json => {
                let mut writer = BufWriter::new(file);
                serde_json::to_writer(&mut writer, rows)?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
                if let Some(header) = T::header() {
                    writer.write_record(header)?;
                }
                for row in rows {
                    writer.write_record(row.fields())?;
                }
                writer.flush()?;
            }
            ExportFormat::Xml => {
                let xml = quick_xml::se::to_string_with_root(T::XML_ROOT, &XmlView { proxies: rows })
                    .map_err(|e| ProxyError::Xml(e.to_string()))?;
                let mut writer = BufWriter::new(file);
                writer.write_all(xml.as_bytes())?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
            ExportFormat::Yaml => {
                let mut writer = BufWriter::new(file);
                serde_yaml::to_writer(&mut writer, &YamlView { proxies: rows })?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}
