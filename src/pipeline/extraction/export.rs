//! Download formats for an extracted record.

use super::types::ExtractedFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json; charset=utf-8",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Indented JSON, field → value, absent fields as `null`.
pub fn to_json(fields: &ExtractedFields) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(fields)
}

/// Two columns, `field,value`, one row per field; absent fields are empty.
pub fn to_csv(fields: &ExtractedFields) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["field", "value"])?;
    for (field, value) in fields.iter() {
        writer.write_record([field.as_str(), value.unwrap_or("")])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn render(fields: &ExtractedFields, format: ExportFormat) -> Result<String, String> {
    match format {
        ExportFormat::Json => to_json(fields).map_err(|e| e.to_string()),
        ExportFormat::Csv => to_csv(fields).map_err(|e| e.to_string()),
    }
}
