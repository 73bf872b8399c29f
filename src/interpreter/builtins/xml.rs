//! The `xml` namespace: marshal and unmarshal.
//!
//! Documents map onto nested hashes. An element with only text becomes a string,
//! an empty element nil, and anything with children or attributes a hash.
//! Attributes are keyed `@name`; text mixed with children is kept under `_text`.
//! Repeated child elements collect into an array.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::ErrorKind;
use crate::interpreter::value::{HashKey, HashMapObj, Object};

use super::{Arity, Registry};

const TEXT_KEY: &str = "_text";
const ITEM_TAG: &str = "item";

fn valid_tag(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_sequence(value: &Object) -> bool {
    matches!(value, Object::Array(_) | Object::Tuple(_) | Object::List(_))
}

fn scalar_text(value: &Object) -> Option<String> {
    match value {
        Object::Boolean(_)
        | Object::Integer(_)
        | Object::UInteger(_)
        | Object::Float(_)
        | Object::Decimal(_)
        | Object::String(_) => Some(value.inspect()),
        Object::Time(t) => Some(t.to_rfc3339()),
        _ => None,
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), String> {
    writer.write_event(event).map_err(|e| e.to_string())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Object) -> Result<(), String> {
    if !valid_tag(name) {
        return Err(format!("invalid element name '{}'", name));
    }
    if value.is_nil() {
        return write(writer, Event::Empty(BytesStart::new(name)));
    }
    if let Some(text) = scalar_text(value) {
        write(writer, Event::Start(BytesStart::new(name)))?;
        write(writer, Event::Text(BytesText::new(&text)))?;
        return write(writer, Event::End(BytesEnd::new(name)));
    }
    write(writer, Event::Start(BytesStart::new(name)))?;
    match value {
        Object::Hash(map) => {
            for (key, child) in map.read().iter() {
                let key = key.to_string();
                match child.iter_items() {
                    Some(items) if is_sequence(child) => {
                        for item in &items {
                            write_element(writer, &key, item)?;
                        }
                    }
                    _ => write_element(writer, &key, child)?,
                }
            }
        }
        sequence if is_sequence(sequence) => {
            for item in sequence.iter_items().unwrap_or_default() {
                write_element(writer, ITEM_TAG, &item)?;
            }
        }
        other => return Err(format!("cannot convert {} to XML", other.type_name())),
    }
    write(writer, Event::End(BytesEnd::new(name)))
}

/// XML text for `value` under a `root` element.
pub fn marshal(value: &Object, root: &str) -> Result<String, String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, root, value)?;
    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

/// Element being read: its children so far and its text.
struct Open {
    name: String,
    children: HashMapObj,
    text: String,
}

impl Open {
    fn new(start: &BytesStart<'_>) -> Result<Self, String> {
        let mut children = HashMapObj::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            children.insert(HashKey::Str(key), Object::String(value.into_owned()));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            children,
            text: String::new(),
        })
    }

    fn finish(mut self) -> (String, Object) {
        let text = self.text.trim();
        let value = match (self.children.is_empty(), text.is_empty()) {
            (true, true) => Object::Nil,
            (true, false) => Object::string(text),
            (false, false) => {
                self.children.insert(HashKey::Str(TEXT_KEY.to_string()), Object::string(text));
                Object::hash(self.children)
            }
            (false, true) => Object::hash(self.children),
        };
        (self.name, value)
    }

    /// Add a child; a repeated name turns the entry into an array.
    fn adopt(&mut self, name: String, value: Object) {
        let key = HashKey::Str(name);
        match self.children.get(&key) {
            Some(Object::Array(items)) => items.write().push(value),
            Some(existing) => {
                let items = Object::array(vec![existing.clone(), value]);
                self.children.insert(key, items);
            }
            None => {
                self.children.insert(key, value);
            }
        }
    }
}

/// Parse a document into `{root: value}`.
pub fn unmarshal(text: &str) -> Result<Object, String> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Open> = Vec::new();
    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        let finished = match event {
            Event::Start(start) => {
                stack.push(Open::new(&start)?);
                None
            }
            Event::Empty(start) => Some(Open::new(&start)?.finish()),
            Event::End(_) => stack.pop().map(Open::finish),
            Event::Text(content) => {
                let content = content.unescape().map_err(|e| e.to_string())?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&content);
                }
                None
            }
            Event::CData(content) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&content));
                }
                None
            }
            Event::Eof => return Err("unexpected end of document".to_string()),
            _ => None,
        };
        if let Some((name, value)) = finished {
            match stack.last_mut() {
                Some(parent) => parent.adopt(name, value),
                None => {
                    let mut root = HashMapObj::new();
                    root.insert(HashKey::Str(name), value);
                    return Ok(Object::hash(root));
                }
            }
        }
    }
}

/// Register the `xml` namespace.
pub fn register_xml_builtins(registry: &mut Registry) {
    // xml.marshal(value, root?) - XML text
    registry.define_in("xml", "marshal", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
        let root = match args.get(1) {
            None => "root".to_string(),
            Some(_) => ctx.string_arg(&args, 1)?,
        };
        marshal(&args[0], &root)
            .map(Object::String)
            .map_err(|e| ctx.error(ErrorKind::XmlError(e)))
    });

    // xml.unmarshal(text) - {root: value}
    registry.define_in("xml", "unmarshal", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        let text = ctx.string_arg(&args, 0)?;
        unmarshal(&text).map_err(|e| ctx.error(ErrorKind::XmlError(e)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hash(entries: Vec<(&str, Object)>) -> Object {
        Object::hash(entries.into_iter().map(|(k, v)| (HashKey::Str(k.to_string()), v)).collect())
    }

    #[test]
    fn test_marshal_nests_hashes_and_repeats_arrays() {
        let value = hash(vec![
            ("name", Object::string("a < b")),
            ("tags", Object::array(vec![Object::string("x"), Object::string("y")])),
            ("note", Object::Nil),
        ]);
        assert_eq!(
            marshal(&value, "doc").unwrap(),
            "<doc><name>a &lt; b</name><tags>x</tags><tags>y</tags><note/></doc>"
        );
        assert_eq!(
            marshal(&Object::array(vec![Object::Integer(1), Object::Integer(2)]), "list").unwrap(),
            "<list><item>1</item><item>2</item></list>"
        );
    }

    #[test]
    fn test_marshal_rejects_bad_names_and_values() {
        assert!(marshal(&hash(vec![("1st", Object::Integer(1))]), "root").is_err());
        assert!(marshal(&Object::list(Default::default()), "has space").is_err());
        let once = Object::Once(std::sync::Arc::new(crate::interpreter::sync::ScriptOnce::new()));
        assert_eq!(marshal(&once, "root").unwrap_err(), "cannot convert ONCE to XML");
    }

    #[test]
    fn test_unmarshal_builds_hashes() {
        let doc = r#"<order id="7"><item>bolt</item><item>nut</item><total>3</total><gift/></order>"#;
        let expected = hash(vec![(
            "order",
            hash(vec![
                ("@id", Object::string("7")),
                ("item", Object::array(vec![Object::string("bolt"), Object::string("nut")])),
                ("total", Object::string("3")),
                ("gift", Object::Nil),
            ]),
        )]);
        assert_eq!(unmarshal(doc).unwrap(), expected);
    }

    #[test]
    fn test_unmarshal_rejects_malformed_documents() {
        assert!(unmarshal("<a><b></a>").is_err());
        assert!(unmarshal("<a>").is_err());
        assert!(unmarshal("").is_err());
    }
}
