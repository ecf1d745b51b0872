use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::money::Money;
use crate::policy::normalize::number_value;

/// An optional extra a tutor offers on top of the session itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOn {
    id: String,
    label: String,
    price_delta: Money,
    default_selected: bool,
}

impl AddOn {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn price_delta(&self) -> Money {
        self.price_delta
    }

    pub fn default_selected(&self) -> bool {
        self.default_selected
    }
}

/// Parses an add-on catalog, dropping entries without a usable id.
pub(crate) fn add_ons_from_value(raw: Option<&Value>, defaults: &[AddOn]) -> Vec<AddOn> {
    let Some(entries) = raw.and_then(Value::as_array) else {
        return defaults.to_vec();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").and_then(Value::as_str)?.trim();
            if id.is_empty() {
                return None;
            }
            let label = entry
                .get("label")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .unwrap_or(id);
            let price_delta = entry
                .get("priceDelta")
                .or_else(|| entry.get("price"))
                .and_then(number_value)
                .map(|v| Money::from_major(v.max(0.0)))
                .unwrap_or(Money::ZERO);
            let default_selected = entry
                .get("defaultSelected")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            Some(AddOn {
                id: id.to_owned(),
                label: label.to_owned(),
                price_delta,
                default_selected,
            })
        })
        .collect()
}
