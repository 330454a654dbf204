//! Strict mode
//!
//! Walks a schema document before it reaches the validator and rejects
//! anything the Draft 2020-12 dialect does not define. Local `$ref`
//! pointers are resolved here too, and reference chains that loop without
//! consuming any part of the instance are refused.

use serde_json::Value;
use std::collections::HashSet;

use crate::error::SchemaError;

/// Keywords whose value is a single subschema
const SUBSCHEMA: &[&str] = &[
    "additionalProperties",
    "items",
    "contains",
    "propertyNames",
    "not",
    "if",
    "then",
    "else",
    "unevaluatedItems",
    "unevaluatedProperties",
    "contentSchema",
];

/// Keywords whose value maps names to subschemas
const SUBSCHEMA_MAP: &[&str] = &[
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

/// Keywords whose value is a non-empty list of subschemas
const SUBSCHEMA_LIST: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords that never hold subschemas
const PLAIN: &[&str] = &[
    // core
    "$schema",
    "$id",
    "$anchor",
    "$dynamicRef",
    "$dynamicAnchor",
    "$vocabulary",
    "$comment",
    // validation
    "type",
    "const",
    "enum",
    "multipleOf",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "maxItems",
    "minItems",
    "uniqueItems",
    "maxContains",
    "minContains",
    "maxProperties",
    "minProperties",
    "required",
    "dependentRequired",
    // meta-data
    "title",
    "description",
    "default",
    "deprecated",
    "readOnly",
    "writeOnly",
    "examples",
    // content
    "contentEncoding",
    "contentMediaType",
];

/// Format names defined by the format-annotation vocabulary
const FORMATS: &[&str] = &[
    "date-time",
    "date",
    "time",
    "duration",
    "email",
    "idn-email",
    "hostname",
    "idn-hostname",
    "ipv4",
    "ipv6",
    "uri",
    "uri-reference",
    "iri",
    "iri-reference",
    "uuid",
    "uri-template",
    "json-pointer",
    "relative-json-pointer",
    "regex",
];

/// In-place applicators: they apply to the same instance location
const IN_PLACE: &[&str] = &["not", "if", "then", "else"];
const IN_PLACE_LIST: &[&str] = &["allOf", "anyOf", "oneOf"];

/// `true` when `name` belongs to the Draft 2020-12 vocabulary
pub(crate) fn is_keyword(name: &str) -> bool {
    matches!(name, "$ref" | "format")
        || SUBSCHEMA.contains(&name)
        || SUBSCHEMA_MAP.contains(&name)
        || SUBSCHEMA_LIST.contains(&name)
        || PLAIN.contains(&name)
}

/// Run every strict-mode check over a schema document
pub(crate) fn check(schema: &Value) -> Result<(), SchemaError> {
    if !schema.is_object() && !schema.is_boolean() {
        return Err(SchemaError::InvalidRoot);
    }
    let mut walker = Walker {
        root: schema,
        references: Vec::new(),
    };
    walker.walk(schema, "#")?;
    walker.check_cycles()
}

struct Walker<'a> {
    root: &'a Value,
    references: Vec<&'a str>,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, node: &'a Value, location: &str) -> Result<(), SchemaError> {
        let map = match node {
            Value::Bool(_) => return Ok(()),
            Value::Object(map) => map,
            _ => {
                return Err(SchemaError::invalid(
                    "schema",
                    location,
                    "expected an object or boolean",
                ))
            }
        };

        for (keyword, value) in map {
            let here = format!("{}/{}", location, escape(keyword));
            let name = keyword.as_str();
            if name == "$ref" {
                let reference = value
                    .as_str()
                    .ok_or_else(|| SchemaError::invalid(name, location, "expected a string"))?;
                resolve(self.root, reference)?;
                self.references.push(reference);
            } else if name == "format" {
                let format = value
                    .as_str()
                    .ok_or_else(|| SchemaError::invalid(name, location, "expected a string"))?;
                if !FORMATS.contains(&format) {
                    return Err(SchemaError::UnknownFormat {
                        format: format.to_string(),
                        location: location.to_string(),
                    });
                }
            } else if name == "items" && value.is_array() {
                return Err(SchemaError::invalid(
                    name,
                    location,
                    "expected a single schema, tuples use prefixItems",
                ));
            } else if SUBSCHEMA.contains(&name) {
                self.walk(value, &here)?;
            } else if SUBSCHEMA_MAP.contains(&name) {
                let members = value.as_object().ok_or_else(|| {
                    SchemaError::invalid(name, location, "expected an object of schemas")
                })?;
                for (member, sub) in members {
                    self.walk(sub, &format!("{}/{}", here, escape(member)))?;
                }
            } else if SUBSCHEMA_LIST.contains(&name) {
                let items = value
                    .as_array()
                    .filter(|items| !items.is_empty())
                    .ok_or_else(|| {
                        SchemaError::invalid(name, location, "expected a non-empty array")
                    })?;
                for (i, sub) in items.iter().enumerate() {
                    self.walk(sub, &format!("{}/{}", here, i))?;
                }
            } else if !PLAIN.contains(&name) {
                return Err(SchemaError::UnknownKeyword {
                    keyword: keyword.clone(),
                    location: location.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_cycles(&self) -> Result<(), SchemaError> {
        let mut cleared = HashSet::new();
        for reference in self.references.iter().copied() {
            let mut trail = Vec::new();
            self.follow(reference, &mut trail, &mut cleared)?;
        }
        Ok(())
    }

    /// Depth-first over references reachable without leaving the instance location
    fn follow(
        &self,
        reference: &'a str,
        trail: &mut Vec<&'a str>,
        cleared: &mut HashSet<&'a str>,
    ) -> Result<(), SchemaError> {
        if cleared.contains(reference) {
            return Ok(());
        }
        if trail.contains(&reference) {
            return Err(SchemaError::RefCycle {
                reference: reference.to_string(),
            });
        }
        let Some(target) = resolve(self.root, reference)? else {
            return Ok(());
        };

        trail.push(reference);
        let mut next = Vec::new();
        in_place_references(target, &mut next);
        for onward in next {
            self.follow(onward, trail, cleared)?;
        }
        trail.pop();
        cleared.insert(reference);
        Ok(())
    }
}

/// Resolve a document-local JSON pointer reference
///
/// Anchors and non-local URIs return `None` and are left to the validator.
fn resolve<'v>(root: &'v Value, reference: &str) -> Result<Option<&'v Value>, SchemaError> {
    let pointer = match reference.strip_prefix('#') {
        Some("") => return Ok(Some(root)),
        Some(pointer) if pointer.starts_with('/') => pointer,
        _ => return Ok(None),
    };
    root.pointer(pointer)
        .map(Some)
        .ok_or_else(|| SchemaError::UnresolvedRef {
            reference: reference.to_string(),
        })
}

fn in_place_references<'v>(node: &'v Value, out: &mut Vec<&'v str>) {
    let Value::Object(map) = node else {
        return;
    };
    if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
        out.push(reference);
    }
    for keyword in IN_PLACE {
        if let Some(sub) = map.get(*keyword) {
            in_place_references(sub, out);
        }
    }
    for keyword in IN_PLACE_LIST {
        if let Some(Value::Array(subs)) = map.get(*keyword) {
            for sub in subs {
                in_place_references(sub, out);
            }
        }
    }
    if let Some(Value::Object(subs)) = map.get("dependentSchemas") {
        for sub in subs.values() {
            in_place_references(sub, out);
        }
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
