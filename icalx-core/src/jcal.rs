//! RFC 7265 jCal serialization ([SUPPLEMENT] "jCal output"):
//! `Component::to_jcal()` renders `[name_lc, [[prop_lc, {params}, type_lc,
//! value_json], ...], [child_jcal, ...]]` using the same per-kind type
//! token the ValueCodec already tracks.

use serde_json::{json, Value as Json};

use icalx_syntax::values::{Value, ValueKind};

use crate::component::Component;
use crate::property::Property;

pub fn component_to_jcal(component: &Component) -> Json {
    let name = component.kind.name().to_ascii_lowercase();

    let properties: Vec<Json> = component.properties().iter().map(property_to_jcal).collect();
    let children: Vec<Json> = component.children().iter().map(component_to_jcal).collect();

    json!([name, properties, children])
}

fn property_to_jcal(property: &Property) -> Json {
    let name = property.name.to_ascii_lowercase();

    let mut params = serde_json::Map::new();
    for icalx_syntax::content_line::ContentLineParam(key, value) in &property.params.0 {
        params.insert(key.to_ascii_lowercase(), json!(value));
    }

    let type_token = value_kind_token(property.value.kind());
    let value_json = value_to_jcal(&property.value);

    json!([name, Json::Object(params), type_token, value_json])
}

fn value_kind_token(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Date => "date",
        ValueKind::DateTime => "date-time",
        ValueKind::Time => "time",
        ValueKind::Duration => "duration",
        ValueKind::Period => "period",
        ValueKind::UtcOffset => "utc-offset",
        ValueKind::Text => "text",
        ValueKind::Binary => "binary",
        ValueKind::Boolean => "boolean",
        ValueKind::Integer => "integer",
        ValueKind::Float => "float",
        ValueKind::Uri => "uri",
        ValueKind::CalAddress => "cal-address",
        ValueKind::Recur => "recur",
    }
}

/// Multi-valued TEXT serializes as a JSON array per jCal's multi-value
/// rule; everything else is a scalar rendered through the same
/// `format()` each value kind already implements.
fn value_to_jcal(value: &Value) -> Json {
    match value {
        Value::Text(values) if values.len() > 1 => Json::Array(values.iter().map(|v| json!(v)).collect()),
        Value::Text(values) => json!(values.first().cloned().unwrap_or_default()),
        Value::Boolean(b) => json!(*b),
        Value::Integer(i) => json!(*i),
        Value::Float(f) => json!(*f),
        other => json!(other.format()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icalx_syntax::content_line::parse_lines;
    use icalx_syntax::security::SecurityGate;

    #[test]
    fn renders_vevent_as_jcal_array() {
        let logical: Vec<String> = ["BEGIN:VEVENT", "UID:abc", "SUMMARY:Demo", "DTSTART:20240101T090000Z", "END:VEVENT"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let parsed = parse_lines(&logical, true).unwrap();
        let component = crate::component::assemble(&parsed, true, &SecurityGate::default()).unwrap().0;

        let rendered = component_to_jcal(&component);
        assert_eq!(rendered[0], json!("vevent"));
        let props = rendered[1].as_array().unwrap();
        assert!(props.iter().any(|p| p[0] == json!("summary") && p[3] == json!("Demo")));
    }
}
