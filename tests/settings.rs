use serde::Deserialize;
use serde_json::json;
use weft_di::{DiError, Settings};

#[derive(Debug, Deserialize, PartialEq)]
struct Limits {
    items: u32,
    weight: f64,
}

#[test]
fn dotted_lookup_walks_objects_and_arrays() {
    let settings = Settings::from_value(json!({
        "Shop": {
            "limits": {"items": 20, "weight": 12.5},
            "regions": ["eu", "us"]
        }
    }));

    assert_eq!(settings.get("Shop.limits.items"), Some(&json!(20)));
    assert_eq!(settings.get("Shop.regions.1"), Some(&json!("us")));
    assert!(settings.get("Shop.regions.7").is_none());
    assert!(settings.get("Shop.limits.items.deeper").is_none());
    assert_eq!(settings.get(""), Some(settings.root()));
}

#[test]
fn typed_lookup() {
    let settings = Settings::from_json_str(r#"{"Shop": {"limits": {"items": 20, "weight": 12.5}}}"#).unwrap();

    let limits: Option<Limits> = settings.get_as("Shop.limits").unwrap();
    assert_eq!(limits, Some(Limits { items: 20, weight: 12.5 }));
    assert_eq!(settings.get_as::<Limits>("Shop.other").unwrap(), None);
    assert!(matches!(
        settings.get_as::<u32>("Shop.limits"),
        Err(DiError::Configuration(_))
    ));
}

#[test]
fn malformed_source_is_a_configuration_error() {
    assert!(matches!(
        Settings::from_json_str("{not json"),
        Err(DiError::Configuration(_))
    ));
}

#[test]
fn merge_is_deep_and_right_biased() {
    let base = Settings::from_value(json!({"Shop": {"currency": "EUR", "limits": {"items": 20}}}));
    let overlay = Settings::from_value(json!({"Shop": {"limits": {"items": 5}, "open": true}}));
    let merged = base.merge(overlay);

    assert_eq!(merged.get("Shop.currency"), Some(&json!("EUR")));
    assert_eq!(merged.get("Shop.limits.items"), Some(&json!(5)));
    assert_eq!(merged.get("Shop.open"), Some(&json!(true)));
}

#[test]
fn variables_map_double_underscores_to_nesting() {
    let settings = Settings::from_vars(
        "WEFT",
        vec![
            ("WEFT_Shop__limits__items".to_string(), "9".to_string()),
            ("WEFT_Shop__name".to_string(), "corner store".to_string()),
            ("WEFT_Shop__tags".to_string(), r#"["a","b"]"#.to_string()),
            ("WEFTX_ignored".to_string(), "1".to_string()),
            ("WEFT_".to_string(), "empty".to_string()),
        ],
    );

    assert_eq!(settings.get("Shop.limits.items"), Some(&json!(9)));
    assert_eq!(settings.get("Shop.name"), Some(&json!("corner store")));
    assert_eq!(settings.get("Shop.tags.1"), Some(&json!("b")));
    assert_eq!(settings.root().as_object().map(|o| o.len()), Some(1));
}

#[test]
fn collection_layers_settings_in_order() {
    let mut services = weft_di::ServiceCollection::new();
    services
        .with_settings(Settings::from_value(json!({"Shop": {"currency": "EUR", "open": false}})))
        .with_settings(Settings::from_value(json!({"Shop": {"open": true}})));
    let container = services.build();

    assert_eq!(container.settings().get("Shop.currency"), Some(&json!("EUR")));
    assert_eq!(container.settings().get("Shop.open"), Some(&json!(true)));
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_source() {
    let settings = Settings::from_yaml_str("Shop:\n  limits:\n    items: 3\n").unwrap();
    assert_eq!(settings.get("Shop.limits.items"), Some(&json!(3)));
}
