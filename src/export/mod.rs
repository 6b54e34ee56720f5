pub mod json_export;

use anyhow::Result;

use crate::pipeline::ExportReport;

pub use json_export::JsonExporter;

pub trait Exporter {
    fn export(&self, report: &ExportReport) -> Result<()>;
}
