//! The `json` namespace: marshal and unmarshal.

use serde_json::Value as JsonValue;

use crate::error::ErrorKind;
use crate::interpreter::value::{HashKey, HashMapObj, Object};

use super::{Arity, Registry};

/// Convert an object to a JSON value. Decimals follow the global quoting flag.
pub fn object_to_json(value: &Object) -> Result<JsonValue, String> {
    match value {
        Object::Nil => Ok(JsonValue::Null),
        Object::Boolean(b) => Ok(JsonValue::Bool(*b)),
        Object::Integer(n) => Ok(JsonValue::Number((*n).into())),
        Object::UInteger(n) => Ok(JsonValue::Number((*n).into())),
        Object::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| format!("cannot convert float {} to JSON", f)),
        Object::Decimal(d) => serde_json::from_str(&d.to_json_text()).map_err(|e| e.to_string()),
        Object::String(s) => Ok(JsonValue::String(s.clone())),
        Object::Array(items) => {
            let items: Result<Vec<JsonValue>, String> = items.read().iter().map(object_to_json).collect();
            Ok(JsonValue::Array(items?))
        }
        Object::Tuple(items) => {
            let items: Result<Vec<JsonValue>, String> = items.iter().map(object_to_json).collect();
            Ok(JsonValue::Array(items?))
        }
        Object::Hash(map) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in map.read().iter() {
                obj.insert(k.to_string(), object_to_json(v)?);
            }
            Ok(JsonValue::Object(obj))
        }
        Object::Instance(instance) => {
            let fields = instance.fields.read();
            let mut names: Vec<&String> = fields.keys().collect();
            names.sort();
            let mut obj = serde_json::Map::new();
            for name in names {
                obj.insert(name.clone(), object_to_json(&fields[name])?);
            }
            Ok(JsonValue::Object(obj))
        }
        other => Err(format!("cannot convert {} to JSON", other.type_name())),
    }
}

pub fn json_to_object(json: &JsonValue) -> Object {
    match json {
        JsonValue::Null => Object::Nil,
        JsonValue::Bool(b) => Object::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Object::Integer(i)
            } else if let Some(u) = n.as_u64() {
                Object::UInteger(u)
            } else {
                Object::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Object::String(s.clone()),
        JsonValue::Array(items) => Object::array(items.iter().map(json_to_object).collect()),
        JsonValue::Object(obj) => {
            let map: HashMapObj = obj
                .iter()
                .map(|(k, v)| (HashKey::Str(k.clone()), json_to_object(v)))
                .collect();
            Object::hash(map)
        }
    }
}

/// Register the `json` namespace.
pub fn register_json_builtins(registry: &mut Registry) {
    // json.marshal(value) - JSON text
    registry.define_in("json", "marshal", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        let json = object_to_json(&args[0]).map_err(|e| ctx.error(ErrorKind::JsonError(e)))?;
        serde_json::to_string(&json)
            .map(Object::String)
            .map_err(|e| ctx.error(ErrorKind::JsonError(e.to_string())))
    });

    // json.unmarshal(text) - parsed value
    registry.define_in("json", "unmarshal", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        let text = ctx.string_arg(&args, 0)?;
        let json: JsonValue =
            serde_json::from_str(&text).map_err(|e| ctx.error(ErrorKind::JsonError(e.to_string())))?;
        Ok(json_to_object(&json))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hash_keeps_insertion_order() {
        let mut map = HashMapObj::new();
        map.insert(HashKey::Str("b".into()), Object::Integer(1));
        map.insert(HashKey::Str("a".into()), Object::array(vec![Object::Boolean(true), Object::Nil]));
        let json = object_to_json(&Object::hash(map)).unwrap();
        assert_eq!(json.to_string(), r#"{"b":1,"a":[true,null]}"#);
    }

    #[test]
    fn test_parse_numbers() {
        let json: JsonValue = serde_json::from_str("[1, 18446744073709551615, 2.5]").unwrap();
        assert_eq!(
            json_to_object(&json),
            Object::array(vec![Object::Integer(1), Object::UInteger(u64::MAX), Object::Float(2.5)])
        );
    }

    #[test]
    fn test_functions_are_not_serializable() {
        assert!(object_to_json(&Object::Once(std::sync::Arc::new(
            crate::interpreter::sync::ScriptOnce::new()
        )))
        .is_err());
    }
}
