//! Predictor catalogue command

use anyhow::Result;
use forecast_lib::ModelRegistry;
use tabled::Tabled;

use crate::output::{format_optional, print_json, print_table, OutputFormat};

/// Row for the models table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAE")]
    mae: String,
    #[tabled(rename = "RMSE")]
    rmse: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// List the available predictors
pub fn list_models(registry: &ModelRegistry, format: OutputFormat) -> Result<()> {
    let entries = registry.entries();

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Table => {
            let rows: Vec<ModelRow> = entries
                .iter()
                .map(|e| ModelRow {
                    key: e.key.clone(),
                    name: e.name.clone(),
                    mae: format_optional(e.mae),
                    rmse: format_optional(e.rmse),
                    description: e.description.clone(),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}
