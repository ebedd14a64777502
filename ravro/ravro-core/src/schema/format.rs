use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result, Write as _},
};

use super::{Field, FieldAction, Schema, SchemaNode};
use crate::value::Value;

/// Parsing canonical form of a schema: attributes that do not affect the
/// wire layout are dropped, and a named type seen a second time is written
/// as its name only.
pub fn canonical_form(schema: &Schema) -> String {
    Canonical {
        schema,
        defaults: false,
    }
    .to_string()
}

/// Canonical form extended with the field attributes codecs depend on.
pub(crate) fn cache_form(schema: &Schema) -> String {
    Canonical {
        schema,
        defaults: true,
    }
    .to_string()
}

pub(crate) fn quoted(name: &str) -> String {
    format!("\"{}\"", Escaped(name))
}

struct Canonical<'a> {
    schema: &'a Schema,
    defaults: bool,
}

impl Display for Canonical<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write_schema(self.schema, self.defaults, &mut HashSet::new(), f)
    }
}

fn write_schema(
    schema: &Schema,
    defaults: bool,
    seen: &mut HashSet<String>,
    out: &mut Formatter<'_>,
) -> Result {
    match schema.node() {
        SchemaNode::Record(r) => {
            if !seen.insert(r.name().to_owned()) {
                return write!(out, "\"{}\"", Escaped(r.name()));
            }
            write!(
                out,
                "{{\"name\":\"{}\",\"type\":\"record\",\"fields\":[",
                Escaped(r.name())
            )?;
            for (i, field) in r.fields().iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write!(out, "{{\"name\":\"{}\",\"type\":", Escaped(field.name()))?;
                write_schema(field.schema(), defaults, seen, out)?;
                if defaults {
                    write_resolution(field, out)?;
                }
                out.write_char('}')?;
            }
            out.write_str("]}")
        }
        SchemaNode::Enum(e) => {
            if !seen.insert(e.name().to_owned()) {
                return write!(out, "\"{}\"", Escaped(e.name()));
            }
            write!(
                out,
                "{{\"name\":\"{}\",\"type\":\"enum\",\"symbols\":[",
                Escaped(e.name())
            )?;
            for (i, symbol) in e.symbols().iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write!(out, "\"{}\"", Escaped(symbol))?;
            }
            out.write_str("]}")
        }
        SchemaNode::Fixed(fx) => {
            if !seen.insert(fx.name().to_owned()) {
                return write!(out, "\"{}\"", Escaped(fx.name()));
            }
            write!(
                out,
                "{{\"name\":\"{}\",\"type\":\"fixed\",\"size\":{}}}",
                Escaped(fx.name()),
                fx.size()
            )
        }
        SchemaNode::Array(items) => {
            out.write_str("{\"type\":\"array\",\"items\":")?;
            write_schema(items, defaults, seen, out)?;
            out.write_char('}')
        }
        SchemaNode::Map(values) => {
            out.write_str("{\"type\":\"map\",\"values\":")?;
            write_schema(values, defaults, seen, out)?;
            out.write_char('}')
        }
        SchemaNode::Union(branches) => {
            out.write_char('[')?;
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write_schema(branch, defaults, seen, out)?;
            }
            out.write_char(']')
        }
        SchemaNode::Ref(r) => write!(out, "\"{}\"", Escaped(r.name())),
        _ => write!(out, "\"{}\"", schema.kind()),
    }
}

/// Field attributes that change how a codec resolves the field: its default,
/// its aliases and whether it is read from the wire at all.
fn write_resolution(field: &Field, out: &mut Formatter<'_>) -> Result {
    if let Some(default) = field.default() {
        out.write_str(",\"default\":")?;
        write_json(default, out)?;
    }
    if !field.aliases().is_empty() {
        out.write_str(",\"aliases\":[")?;
        for (i, alias) in field.aliases().iter().enumerate() {
            if i > 0 {
                out.write_char(',')?;
            }
            write!(out, "\"{}\"", Escaped(alias))?;
        }
        out.write_char(']')?;
    }
    if field.action() == FieldAction::SetDefault {
        out.write_str(",\"action\":\"default\"")?;
    }
    Ok(())
}

/// JSON rendering of a default value. Bytes map each octet to one code point.
fn write_json(value: &Value, out: &mut Formatter<'_>) -> Result {
    match value {
        Value::Null => out.write_str("null"),
        Value::Boolean(v) => write!(out, "{v}"),
        Value::Int(v) => write!(out, "{v}"),
        Value::Long(v) => write!(out, "{v}"),
        Value::Float(v) => write!(out, "{v:?}"),
        Value::Double(v) => write!(out, "{v:?}"),
        Value::String(s) | Value::Enum(s) => write!(out, "\"{}\"", Escaped(s)),
        Value::Bytes(b) | Value::Fixed(b) => {
            let latin1: String = b.iter().map(|&byte| char::from(byte)).collect();
            write!(out, "\"{}\"", Escaped(&latin1))
        }
        Value::Array(items) => {
            out.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write_json(item, out)?;
            }
            out.write_char(']')
        }
        Value::Record(fields) => {
            out.write_char('{')?;
            for (i, (name, v)) in fields.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write!(out, "\"{}\":", Escaped(name))?;
                write_json(v, out)?;
            }
            out.write_char('}')
        }
        Value::Map(entries) => {
            out.write_char('{')?;
            for (i, (key, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write!(out, "\"{}\":", Escaped(key))?;
                write_json(v, out)?;
            }
            out.write_char('}')
        }
    }
}

struct Escaped<'a>(&'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for c in self.0.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c if c.is_control() || u32::from(c) > 0x7e && u32::from(c) < 0x100 => {
                    write!(f, "\\u{:04x}", u32::from(c))?
                }
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}
