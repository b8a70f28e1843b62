//! WASM <-> JavaScript bridge, framework agnostic.

use advisor_core::{AdvisorConfig, ThresholdType};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsAdvisorConfig {
    #[serde(default)]
    threshold_type: Option<ThresholdType>,
}

impl From<JsAdvisorConfig> for AdvisorConfig {
    fn from(cfg: JsAdvisorConfig) -> Self {
        let mut base = AdvisorConfig::default();
        if let Some(threshold_type) = cfg.threshold_type {
            base.threshold_type = threshold_type;
        }
        base
    }
}

/// Builds a recommendation from a combined knowledge object and a patient
/// document `{patient, blood_tests}`.
#[wasm_bindgen]
pub fn generate_recommendation(
    knowledge: JsValue,
    document: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let knowledge_value = from_value::<serde_json::Value>(knowledge)
        .map_err(|err| JsValue::from_str(&format!("Could not read knowledge JSON: {err}")))?;
    let document_value = from_value::<serde_json::Value>(document)
        .map_err(|err| JsValue::from_str(&format!("Could not read patient document: {err}")))?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsAdvisorConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            AdvisorConfig::from(cfg)
        }
        None => AdvisorConfig::default(),
    };

    let recommendation = advisor_io::recommend_from_values(&knowledge_value, &document_value, cfg)
        .map_err(|err| JsValue::from_str(&format!("Advisor error: {err}")))?;

    to_value(&recommendation)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize recommendation: {err}")))
}

/// Panel interpretation (categories, thyroid, lipids, liver, hormones,
/// glucose/insulin) of a patient document.
#[wasm_bindgen]
pub fn interpret_panel(knowledge: JsValue, document: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let knowledge_value = from_value::<serde_json::Value>(knowledge)
        .map_err(|err| JsValue::from_str(&format!("Could not read knowledge JSON: {err}")))?;
    let document_value = from_value::<serde_json::Value>(document)
        .map_err(|err| JsValue::from_str(&format!("Could not read patient document: {err}")))?;

    let interpretation = advisor_io::interpret_from_values(&knowledge_value, &document_value)
        .map_err(|err| JsValue::from_str(&format!("Advisor error: {err}")))?;

    to_value(&interpretation)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize interpretation: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_config_overrides_only_given_fields() {
        let empty: JsAdvisorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(AdvisorConfig::from(empty), AdvisorConfig::default());

        let lab: JsAdvisorConfig = serde_json::from_str(r#"{"threshold_type": "lab"}"#).unwrap();
        assert_eq!(AdvisorConfig::from(lab).threshold_type, ThresholdType::Lab);
    }
}
