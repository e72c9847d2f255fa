//! On-disk shape of the inventory file.
//!
//! The file nests items two levels deep, `{group: {subgroup: [item, ..]}}`,
//! and reserves the top-level `rules` key for pricing rules that this crate
//! carries through untouched. Older files hold a flat array of items; those
//! still load, with bare categories filed under the `general` subgroup so a
//! later save reads back the same.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use camquote_core::domain::inventory::{InventoryItem, InventoryItemId, RESERVED_GROUP};

use crate::repositories::RepositoryError;

const DEFAULT_NAME: &str = "Unknown Item";
const DEFAULT_UNIT: &str = "piece";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventoryDocument {
    pub items: Vec<InventoryItem>,
    pub rules: Option<Value>,
}

impl InventoryDocument {
    pub fn decode(raw: &str) -> Result<Self, RepositoryError> {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|error| RepositoryError::Decode(format!("inventory file: {error}")))?;

        match parsed {
            Value::Object(sections) => decode_nested(sections),
            Value::Array(entries) => decode_flat(entries),
            _ => Err(RepositoryError::Decode(
                "inventory file must be an object of groups or an array of items".to_string(),
            )),
        }
    }

    /// Writes items back grouped by category; `rules` is emitted verbatim.
    pub fn encode(&self) -> Result<String, RepositoryError> {
        let mut root = Map::new();

        for item in &self.items {
            let (group, subgroup) = item.category_path();
            if group == RESERVED_GROUP {
                return Err(RepositoryError::Encode(format!(
                    "item `{}` uses the reserved `{RESERVED_GROUP}` group",
                    item.id.as_str()
                )));
            }

            let group_entry =
                root.entry(group.to_string()).or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(subgroups) = group_entry else {
                continue;
            };
            let subgroup_entry =
                subgroups.entry(subgroup.to_string()).or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(entries) = subgroup_entry {
                entries.push(encode_item(item));
            }
        }

        if let Some(rules) = &self.rules {
            root.insert(RESERVED_GROUP.to_string(), rules.clone());
        }

        serde_json::to_string_pretty(&Value::Object(root))
            .map_err(|error| RepositoryError::Encode(error.to_string()))
    }
}

fn decode_nested(sections: Map<String, Value>) -> Result<InventoryDocument, RepositoryError> {
    let mut document = InventoryDocument::default();

    for (group, section) in sections {
        if group == RESERVED_GROUP {
            document.rules = Some(section);
            continue;
        }
        let Value::Object(subgroups) = section else {
            continue;
        };

        for (subgroup, entries) in subgroups {
            let Value::Array(entries) = entries else {
                continue;
            };
            for entry in entries {
                document.items.push(decode_nested_item(&group, &subgroup, &entry)?);
            }
        }
    }

    Ok(document)
}

fn decode_nested_item(
    group: &str,
    subgroup: &str,
    entry: &Value,
) -> Result<InventoryItem, RepositoryError> {
    let name = entry.get("name").and_then(Value::as_str);
    let id = match entry.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => format!("{group}_{subgroup}_{}", name.unwrap_or("unknown")),
    };
    let price = match entry.get("rate") {
        None | Some(Value::Null) => Decimal::ZERO,
        Some(value) => decimal_from_json(value).ok_or_else(|| {
            RepositoryError::Decode(format!("inventory item `{id}` has a non-numeric rate"))
        })?,
    };
    let description = entry
        .get("description")
        .and_then(Value::as_str)
        .or(name)
        .map(str::to_string);

    Ok(InventoryItem {
        id: InventoryItemId(id),
        name: name.unwrap_or(DEFAULT_NAME).to_string(),
        category: format!("{group}/{subgroup}"),
        price,
        unit: entry.get("unit").and_then(Value::as_str).unwrap_or(DEFAULT_UNIT).to_string(),
        description,
    })
}

fn decode_flat(entries: Vec<Value>) -> Result<InventoryDocument, RepositoryError> {
    let items = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut item = serde_json::from_value::<InventoryItem>(entry).map_err(|error| {
                RepositoryError::Decode(format!("inventory item {index}: {error}"))
            })?;
            item.normalize_category();
            Ok(item)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InventoryDocument { items, rules: None })
}

fn encode_item(item: &InventoryItem) -> Value {
    let mut entry = Map::new();
    entry.insert("id".to_string(), Value::String(item.id.as_str().to_string()));
    entry.insert("name".to_string(), Value::String(item.name.clone()));
    entry.insert("rate".to_string(), decimal_to_json(item.price));
    entry.insert("unit".to_string(), Value::String(item.unit.clone()));
    if let Some(description) = &item.description {
        entry.insert("description".to_string(), Value::String(description.clone()));
    }
    Value::Object(entry)
}

fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}

fn decimal_to_json(value: Decimal) -> Value {
    let normalized = value.normalize();
    if normalized.scale() == 0 {
        if let Ok(whole) = i64::try_from(normalized) {
            return Value::from(whole);
        }
    }
    serde_json::from_str(&normalized.to_string()).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use camquote_core::domain::inventory::{InventoryItem, InventoryItemId};

    use super::InventoryDocument;
    use crate::repositories::RepositoryError;

    const NESTED: &str = r#"{
  "cameras": {
    "ip_cameras": [
      {"id": "cam-ip-4mp", "name": "IP Camera 4MP", "rate": 4500, "unit": "piece", "description": "4MP bullet"},
      {"name": "IP Camera 2MP", "rate": 2800.5}
    ]
  },
  "cables": {
    "coaxial": [{"name": "RG59", "unit": "meter"}],
    "notes": "not a list"
  },
  "rules": {"bulk_discount": {"threshold": 10}},
  "version": 3
}"#;

    #[test]
    fn nested_items_get_defaults_and_category_paths() {
        let document = InventoryDocument::decode(NESTED).expect("decode nested");
        let find = |id: &str| document.items.iter().find(|item| item.id.as_str() == id);

        assert_eq!(document.items.len(), 3);
        assert!(find("cam-ip-4mp").is_some());

        let cable = find("cables_coaxial_RG59").expect("generated cable id");
        assert_eq!(cable.category, "cables/coaxial");
        assert_eq!(cable.price, Decimal::ZERO);
        assert_eq!(cable.unit, "meter");
        assert_eq!(cable.description.as_deref(), Some("RG59"));

        let camera = find("cameras_ip_cameras_IP Camera 2MP").expect("generated camera id");
        assert_eq!(camera.price, Decimal::new(28005, 1));
        assert_eq!(camera.unit, "piece");
    }

    #[test]
    fn rules_section_is_kept_aside_and_written_back_verbatim() {
        let document = InventoryDocument::decode(NESTED).expect("decode nested");
        assert_eq!(document.rules, Some(json!({"bulk_discount": {"threshold": 10}})));

        let encoded = InventoryDocument::decode(&document.encode().expect("encode"))
            .expect("decode encoded");
        assert_eq!(encoded.rules, document.rules);
        assert_eq!(encoded.items, document.items);
    }

    #[test]
    fn nameless_item_falls_back_to_placeholders() {
        let document =
            InventoryDocument::decode(r#"{"misc": {"general": [{}]}}"#).expect("decode");
        let item = &document.items[0];

        assert_eq!(item.id.as_str(), "misc_general_unknown");
        assert_eq!(item.name, "Unknown Item");
        assert_eq!(item.description, None);
    }

    #[test]
    fn legacy_flat_array_still_loads() {
        let raw = r#"[{"id": "nvr-8", "name": "8 Channel NVR", "category": "recorders/nvr",
                      "price": 12000, "unit": "piece"}]"#;
        let document = InventoryDocument::decode(raw).expect("decode flat");

        assert_eq!(document.items.len(), 1);
        assert_eq!(document.items[0].price, Decimal::new(12_000, 0));
        assert_eq!(document.rules, None);
    }

    #[test]
    fn encode_groups_items_and_writes_whole_rates_as_integers() {
        let document = InventoryDocument {
            items: vec![InventoryItem {
                id: InventoryItemId::from("adaptor-12v"),
                name: "12V Adaptor".to_string(),
                category: "power/general".to_string(),
                price: Decimal::new(3000, 1),
                unit: "piece".to_string(),
                description: None,
            }],
            rules: None,
        };

        let value: serde_json::Value =
            serde_json::from_str(&document.encode().expect("encode")).expect("valid json");
        assert_eq!(
            value,
            json!({"power": {"general": [
                {"id": "adaptor-12v", "name": "12V Adaptor", "rate": 300, "unit": "piece"}
            ]}})
        );
    }

    #[test]
    fn categories_survive_a_save_and_reload() {
        let raw = r#"[
            {"id": "adaptor-12v", "name": "12V Adaptor", "category": "power", "price": 300, "unit": "piece"},
            {"id": "smps-4ch", "name": "4CH SMPS", "category": "power/smps", "price": 950, "unit": "piece"}
        ]"#;
        let loaded = InventoryDocument::decode(raw).expect("decode flat");
        let categories: Vec<_> = loaded.items.iter().map(|item| item.category.as_str()).collect();
        assert_eq!(categories, vec!["power/general", "power/smps"]);

        let reloaded = InventoryDocument::decode(&loaded.encode().expect("encode"))
            .expect("decode encoded");
        let mut before: Vec<_> =
            loaded.items.iter().map(|item| (item.id.as_str(), item.category.as_str())).collect();
        let mut after: Vec<_> =
            reloaded.items.iter().map(|item| (item.id.as_str(), item.category.as_str())).collect();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn non_numeric_rate_is_a_decode_error() {
        let outcome = InventoryDocument::decode(r#"{"a": {"b": [{"id": "x", "rate": true}]}}"#);
        assert!(matches!(outcome, Err(RepositoryError::Decode(message)) if message.contains("`x`")));
    }

    #[test]
    fn scalar_root_is_rejected() {
        assert!(matches!(InventoryDocument::decode("42"), Err(RepositoryError::Decode(_))));
    }
}
