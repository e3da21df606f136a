//! `tokens`: the placeholder catalogue

use crate::{CliResult, OutputFormatArg};
use console::style;
use pagewright::test_data::PlaceholderEngine;
use serde_json::json;

/// Catalogue with one sample expansion per token, as an aligned table or a
/// JSON array
pub fn execute_tokens(format: OutputFormatArg) -> CliResult<String> {
    let catalogue = PlaceholderEngine::catalogue();
    let engine = PlaceholderEngine::new();
    let samples: Vec<String> = catalogue
        .iter()
        .map(|info| engine.replace_tokens(info.token))
        .collect();
    match format {
        OutputFormatArg::Json => {
            let entries: Vec<_> = catalogue
                .iter()
                .zip(&samples)
                .map(|(info, sample)| {
                    json!({
                        "token": info.token,
                        "description": info.description,
                        "example": sample,
                    })
                })
                .collect();
            Ok(serde_json::to_string_pretty(&entries)?)
        }
        OutputFormatArg::Text => {
            let width = catalogue
                .iter()
                .map(|info| info.token.len())
                .max()
                .unwrap_or(0);
            let mut out = format!("{}\n", style("Placeholder tokens").bold().underlined());
            for (info, sample) in catalogue.iter().zip(&samples) {
                out.push_str(&format!(
                    "  {}  {}\n  {:<width$}  {} {}\n",
                    style(format!("{:<width$}", info.token)).cyan(),
                    info.description,
                    "",
                    style("e.g.").dim(),
                    style(format!("{sample:?}")).green(),
                ));
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_text_lists_every_token() {
        console::set_colors_enabled(false);
        let out = execute_tokens(OutputFormatArg::Text).unwrap();
        for info in PlaceholderEngine::catalogue() {
            assert!(out.contains(info.token), "missing {}", info.token);
        }
        assert!(out.contains("<GuidNew>"));
    }

    #[test]
    fn test_json_round_trips() {
        let out = execute_tokens(OutputFormatArg::Json).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), PlaceholderEngine::catalogue().len());
        assert!(entries.iter().all(|e| e["description"].is_string()));
        let guid = entries
            .iter()
            .find(|e| e["token"] == "<GuidEmpty>")
            .unwrap();
        assert_eq!(guid["example"], "0".repeat(32));
    }
}
