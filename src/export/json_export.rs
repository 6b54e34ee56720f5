use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::export::Exporter;
use crate::pipeline::ExportReport;

/// Writes the export report as `manifest.json`.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.out_dir.join("manifest.json")
    }
}

impl Exporter for JsonExporter {
    fn export(&self, report: &ExportReport) -> Result<()> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create output directory {}", self.out_dir.display()))?;
        let path = self.manifest_path();
        let data = serde_json::to_string_pretty(report)?;
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Region;
    use crate::core::model::Orientation;
    use crate::pipeline::EntryExport;
    use tempfile::TempDir;

    #[test]
    fn manifest_lists_regions_and_skips() -> Result<()> {
        let dir = TempDir::new()?;
        let report = ExportReport {
            entries: vec![
                EntryExport {
                    headword: "林檎".to_string(),
                    pages: vec![3, 4],
                    regions: vec![Region {
                        x: 1,
                        y: 2,
                        width: 3,
                        height: 4,
                        page: 3,
                        orientation: Orientation::Vertical,
                        members: 2,
                    }],
                    image: Some(PathBuf::from("entry_0001.png")),
                    skipped: None,
                },
                EntryExport {
                    headword: "蜜柑".to_string(),
                    pages: vec![4],
                    regions: Vec::new(),
                    image: None,
                    skipped: Some("no OCR region matched the entry text".to_string()),
                },
            ],
            cancelled: false,
        };

        let exporter = JsonExporter::new(dir.path().join("out"));
        exporter.export(&report)?;

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(exporter.manifest_path())?)?;
        assert_eq!(written["entries"][0]["regions"][0]["orientation"], "vertical");
        assert_eq!(written["entries"][0]["image"], "entry_0001.png");
        assert!(written["entries"][1]["image"].is_null());
        assert_eq!(written["cancelled"], false);
        Ok(())
    }

    #[test]
    fn unwritable_out_dir_names_the_directory() -> Result<()> {
        let dir = TempDir::new()?;
        let blocker = dir.path().join("out");
        fs::write(&blocker, "")?;
        let report = ExportReport {
            entries: Vec::new(),
            cancelled: false,
        };
        let err = JsonExporter::new(blocker).export(&report).unwrap_err();
        assert!(format!("{err:#}").contains("failed to create output directory"));
        Ok(())
    }
}
