//! Reader/writer compatibility for JSON Schema.
//!
//! The decision model is instance-set inclusion: the check passes when
//! every instance the writer schema accepts is also accepted by the
//! reader schema. Full inclusion is undecidable, so the checker applies
//! the keyword-by-keyword rule table: widening is compatible, tightening
//! is not, with the open/closed content model deciding how property
//! additions and removals behave.

use crate::schema::{Draft, JsonSchema};
use regex::Regex;
use schemata_model::CheckResult;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Recursion ceiling for mutually referential schemas.
const MAX_DEPTH: usize = 64;

/// Check that `reader` accepts every instance `writer` accepts.
pub fn check(reader: &JsonSchema, writer: &JsonSchema) -> CheckResult {
    let checker = Checker {
        reader_doc: reader,
        writer_doc: writer,
    };
    let messages = checker.check_schema(&reader.root, &writer.root, "#", 0);
    CheckResult::from_messages(messages)
}

struct Checker<'a> {
    reader_doc: &'a JsonSchema,
    writer_doc: &'a JsonSchema,
}

impl Checker<'_> {
    fn check_schema(&self, reader: &Value, writer: &Value, path: &str, depth: usize) -> Vec<String> {
        if depth > MAX_DEPTH {
            return Vec::new();
        }
        let reader = self.reader_doc.deref(reader);
        let writer = self.writer_doc.deref(writer);

        if is_nothing(writer) || is_everything(reader) {
            return Vec::new();
        }
        if is_nothing(reader) {
            return vec![format!("{path}: reader schema accepts no instances")];
        }

        let reader = self.merge_all_of(reader);
        let writer = self.merge_all_of(writer);
        let reader_branches = branches(&reader);
        let writer_branches = branches(&writer);

        if reader_branches.len() == 1 && writer_branches.len() == 1 {
            return self.check_keywords(&reader_branches[0], &writer_branches[0], path, depth);
        }

        let mut messages = Vec::new();
        for (i, writer_branch) in writer_branches.iter().enumerate() {
            let accepted = reader_branches.iter().any(|reader_branch| {
                self.check_schema(reader_branch, writer_branch, path, depth + 1)
                    .is_empty()
            });
            if !accepted {
                messages.push(format!(
                    "{path}: no reader branch accepts writer branch {i}"
                ));
            }
        }
        messages
    }

    fn check_keywords(&self, reader: &Value, writer: &Value, path: &str, depth: usize) -> Vec<String> {
        if is_nothing(writer) || is_everything(reader) {
            return Vec::new();
        }
        if is_nothing(reader) {
            return vec![format!("{path}: reader schema accepts no instances")];
        }
        let empty = Map::new();
        let r = reader.as_object().unwrap_or(&empty);
        let w = writer.as_object().unwrap_or(&empty);

        let mut messages = Vec::new();
        self.check_type(r, w, path, &mut messages);
        self.check_enum(r, w, path, &mut messages);
        self.check_const_and_pattern(r, w, path, &mut messages);
        self.check_numeric_bounds(r, w, path, &mut messages);
        self.check_count_bounds(r, w, path, &mut messages);
        self.check_multiple_of(r, w, path, &mut messages);
        self.check_required(r, w, path, &mut messages);
        self.check_object_model(r, w, path, depth, &mut messages);
        self.check_array_model(r, w, path, depth, &mut messages);
        self.check_dependencies(r, w, path, depth, &mut messages);
        self.check_not(r, w, path, depth, &mut messages);
        messages
    }

    fn check_type(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, messages: &mut Vec<String>) {
        let Some(r_types) = type_set(r) else {
            return;
        };
        let Some(w_types) = type_set(w) else {
            messages.push(format!("{path}: type constraint added where the writer had none"));
            return;
        };
        for w_type in &w_types {
            let widened = r_types.contains(w_type.as_str())
                || (w_type == "integer" && r_types.contains("number"));
            if !widened {
                messages.push(format!(
                    "{path}: type '{w_type}' is no longer accepted by the reader"
                ));
            }
        }
    }

    fn check_enum(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, messages: &mut Vec<String>) {
        let Some(r_values) = enum_values(r) else {
            return;
        };
        let Some(w_values) = enum_values(w) else {
            messages.push(format!("{path}: enum constraint added where the writer had none"));
            return;
        };
        let removed: Vec<String> = w_values
            .iter()
            .filter(|v| !r_values.contains(*v))
            .map(|v| v.to_string())
            .collect();
        if !removed.is_empty() {
            messages.push(format!(
                "{path}: enum values [{}] were removed from the reader",
                removed.join(", ")
            ));
        }
    }

    fn check_const_and_pattern(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, messages: &mut Vec<String>) {
        if let Some(r_pattern) = r.get("pattern").and_then(Value::as_str) {
            match w.get("pattern").and_then(Value::as_str) {
                Some(w_pattern) if w_pattern == r_pattern => {}
                Some(w_pattern) => messages.push(format!(
                    "{path}: pattern changed from '{w_pattern}' to '{r_pattern}'"
                )),
                None => messages.push(format!("{path}: pattern '{r_pattern}' added")),
            }
        }
        if r.get("uniqueItems").and_then(Value::as_bool) == Some(true)
            && w.get("uniqueItems").and_then(Value::as_bool) != Some(true)
        {
            messages.push(format!("{path}: uniqueItems constraint added"));
        }
        if let Some(r_names) = r.get("propertyNames") {
            match w.get("propertyNames") {
                Some(w_names) if w_names == r_names => {}
                Some(_) | None if is_everything(r_names) => {}
                Some(_) | None => {
                    messages.push(format!("{path}: propertyNames constraint added or changed"))
                }
            }
        }
    }

    fn check_numeric_bounds(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, messages: &mut Vec<String>) {
        if let Some((r_min, r_exclusive)) = lower_bound(r) {
            match lower_bound(w) {
                None => messages.push(format!("{path}: minimum constraint added")),
                Some((w_min, w_exclusive)) => {
                    if r_min > w_min || (r_min == w_min && r_exclusive && !w_exclusive) {
                        messages.push(format!(
                            "{path}: minimum tightened from {w_min} to {r_min}"
                        ));
                    }
                }
            }
        }
        if let Some((r_max, r_exclusive)) = upper_bound(r) {
            match upper_bound(w) {
                None => messages.push(format!("{path}: maximum constraint added")),
                Some((w_max, w_exclusive)) => {
                    if r_max < w_max || (r_max == w_max && r_exclusive && !w_exclusive) {
                        messages.push(format!(
                            "{path}: maximum tightened from {w_max} to {r_max}"
                        ));
                    }
                }
            }
        }
    }

    fn check_count_bounds(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, messages: &mut Vec<String>) {
        for key in ["minLength", "minItems", "minProperties"] {
            if let Some(r_min) = get_u64(r, key) {
                let w_min = get_u64(w, key).unwrap_or(0);
                if r_min > w_min {
                    messages.push(format!("{path}: {key} increased from {w_min} to {r_min}"));
                }
            }
        }
        for key in ["maxLength", "maxItems", "maxProperties"] {
            if let Some(r_max) = get_u64(r, key) {
                match get_u64(w, key) {
                    None => messages.push(format!("{path}: {key} constraint added")),
                    Some(w_max) if r_max < w_max => {
                        messages.push(format!("{path}: {key} reduced from {w_max} to {r_max}"))
                    }
                    Some(_) => {}
                }
            }
        }
    }

    fn check_multiple_of(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, messages: &mut Vec<String>) {
        let Some(r_multiple) = get_f64(r, "multipleOf") else {
            return;
        };
        match get_f64(w, "multipleOf") {
            None => messages.push(format!("{path}: multipleOf constraint added")),
            Some(w_multiple) => {
                let ratio = w_multiple / r_multiple;
                let divides = ratio >= 1.0 - 1e-9 && (ratio - ratio.round()).abs() < 1e-9;
                if !divides {
                    messages.push(format!(
                        "{path}: multipleOf changed from {w_multiple} to {r_multiple}, which does not divide it"
                    ));
                }
            }
        }
    }

    fn check_required(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, messages: &mut Vec<String>) {
        let r_required = string_set(r, "required");
        let w_required = string_set(w, "required");
        let added: Vec<&String> = r_required.difference(&w_required).collect();
        if !added.is_empty() {
            messages.push(format!(
                "{path}: required properties [{}] added",
                added
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    fn check_object_model(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, depth: usize, messages: &mut Vec<String>) {
        let mut names: BTreeSet<&String> = BTreeSet::new();
        if let Some(props) = r.get("properties").and_then(Value::as_object) {
            names.extend(props.keys());
        }
        if let Some(props) = w.get("properties").and_then(Value::as_object) {
            names.extend(props.keys());
        }

        for name in names {
            let r_sub = property_schema(r, name);
            let w_sub = property_schema(w, name);
            if is_nothing(&w_sub) {
                continue;
            }
            if is_nothing(&r_sub) {
                messages.push(format!(
                    "{path}: property '{name}' is no longer accepted by the reader"
                ));
                continue;
            }
            messages.extend(self.check_schema(
                &r_sub,
                &w_sub,
                &format!("{path}/properties/{name}"),
                depth + 1,
            ));
        }

        let r_additional = additional_properties(r);
        let w_additional = additional_properties(w);
        if !is_nothing(&w_additional) {
            if is_nothing(&r_additional) && !r.contains_key("patternProperties") {
                messages.push(format!(
                    "{path}: reader closed a content model the writer leaves open"
                ));
            } else if !is_nothing(&r_additional) {
                messages.extend(self.check_schema(
                    &r_additional,
                    &w_additional,
                    &format!("{path}/additionalProperties"),
                    depth + 1,
                ));
            }
        }

        let r_patterns = pattern_properties(r);
        let w_patterns = pattern_properties(w);
        for (pattern, r_sub) in &r_patterns {
            match w_patterns.get(pattern) {
                Some(w_sub) => messages.extend(self.check_schema(
                    r_sub,
                    w_sub,
                    &format!("{path}/patternProperties/{pattern}"),
                    depth + 1,
                )),
                None if is_nothing(&w_additional) => {}
                None => messages.extend(self.check_schema(
                    r_sub,
                    &w_additional,
                    &format!("{path}/patternProperties/{pattern}"),
                    depth + 1,
                )),
            }
        }
        for (pattern, w_sub) in &w_patterns {
            if r_patterns.contains_key(pattern) {
                continue;
            }
            if is_nothing(&r_additional) {
                messages.push(format!(
                    "{path}: patternProperties '{pattern}' removed while the reader is closed"
                ));
            } else {
                messages.extend(self.check_schema(
                    &r_additional,
                    w_sub,
                    &format!("{path}/patternProperties/{pattern}"),
                    depth + 1,
                ));
            }
        }
    }

    fn check_array_model(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, depth: usize, messages: &mut Vec<String>) {
        let (r_tuple, r_tail) = tuple_model(r, self.reader_doc.draft);
        let (w_tuple, w_tail) = tuple_model(w, self.writer_doc.draft);

        let positions = r_tuple.len().max(w_tuple.len());
        for i in 0..positions {
            let r_item = r_tuple.get(i).unwrap_or(&r_tail);
            let w_item = w_tuple.get(i).unwrap_or(&w_tail);
            if is_nothing(w_item) {
                continue;
            }
            if is_nothing(r_item) {
                messages.push(format!(
                    "{path}: array position {i} is no longer accepted by the reader"
                ));
                continue;
            }
            messages.extend(self.check_schema(
                r_item,
                w_item,
                &format!("{path}/items/{i}"),
                depth + 1,
            ));
        }

        if !is_nothing(&w_tail) {
            if is_nothing(&r_tail) {
                messages.push(format!(
                    "{path}: reader no longer accepts additional array items"
                ));
            } else {
                messages.extend(self.check_schema(
                    &r_tail,
                    &w_tail,
                    &format!("{path}/items"),
                    depth + 1,
                ));
            }
        }
    }

    fn check_dependencies(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, depth: usize, messages: &mut Vec<String>) {
        let r_required = dependent_required(r);
        let w_required = dependent_required(w);
        for (key, r_list) in &r_required {
            match w_required.get(key) {
                None => messages.push(format!(
                    "{path}: dependent required properties for '{key}' added"
                )),
                Some(w_list) => {
                    let missing: Vec<&str> = r_list
                        .iter()
                        .filter(|p| !w_list.contains(*p))
                        .map(|p| p.as_str())
                        .collect();
                    if !missing.is_empty() {
                        messages.push(format!(
                            "{path}: dependency on '{key}' now also requires [{}]",
                            missing.join(", ")
                        ));
                    }
                }
            }
        }

        let r_schemas = dependent_schemas(r);
        let w_schemas = dependent_schemas(w);
        for (key, r_schema) in &r_schemas {
            match w_schemas.get(key) {
                None if is_everything(r_schema) => {}
                None => messages.push(format!("{path}: dependent schema for '{key}' added")),
                Some(w_schema) => messages.extend(self.check_schema(
                    r_schema,
                    w_schema,
                    &format!("{path}/dependencies/{key}"),
                    depth + 1,
                )),
            }
        }
    }

    fn check_not(&self, r: &Map<String, Value>, w: &Map<String, Value>, path: &str, depth: usize, messages: &mut Vec<String>) {
        let Some(r_not) = r.get("not") else {
            return;
        };
        match w.get("not") {
            None => messages.push(format!("{path}: 'not' constraint added")),
            Some(w_not) => {
                // reader = ¬A, writer = ¬B; ¬A ⊇ ¬B holds iff B ⊇ A,
                // so the roles (and documents) swap.
                let swapped = Checker {
                    reader_doc: self.writer_doc,
                    writer_doc: self.reader_doc,
                };
                messages.extend(swapped.check_schema(
                    w_not,
                    r_not,
                    &format!("{path}/not"),
                    depth + 1,
                ));
            }
        }
    }

    /// Fold `allOf` branches into a single constraint object.
    fn merge_all_of(&self, value: &Value) -> Value {
        let Some(obj) = value.as_object() else {
            return value.clone();
        };
        let Some(all_of) = obj.get("allOf").and_then(Value::as_array) else {
            return value.clone();
        };
        let mut merged: Map<String, Value> = obj
            .iter()
            .filter(|(key, _)| key.as_str() != "allOf")
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        for branch in all_of {
            let branch = self.merge_all_of(branch);
            if let Some(branch_obj) = branch.as_object() {
                merge_constraints(&mut merged, branch_obj);
            }
        }
        Value::Object(merged)
    }
}

/// Decompose a schema into its `anyOf`/`oneOf` branches, each folded
/// with the sibling keywords. A schema without combinators is its own
/// single branch.
fn branches(value: &Value) -> Vec<Value> {
    let Some(obj) = value.as_object() else {
        return vec![value.clone()];
    };
    let combinator = ["anyOf", "oneOf"]
        .iter()
        .find(|key| obj.get(**key).and_then(Value::as_array).is_some());
    let Some(combinator) = combinator else {
        return vec![value.clone()];
    };
    let list = obj
        .get(*combinator)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let siblings: Map<String, Value> = obj
        .iter()
        .filter(|(key, _)| key.as_str() != *combinator)
        .map(|(key, entry)| (key.clone(), entry.clone()))
        .collect();
    list.into_iter()
        .map(|branch| {
            let mut merged = siblings.clone();
            if let Some(branch_obj) = branch.as_object() {
                merge_constraints(&mut merged, branch_obj);
            }
            Value::Object(merged)
        })
        .collect()
}

/// Conjunction of two constraint objects, used when folding `allOf`.
fn merge_constraints(base: &mut Map<String, Value>, add: &Map<String, Value>) {
    for (key, value) in add {
        match base.get_mut(key) {
            None => {
                base.insert(key.clone(), value.clone());
            }
            Some(existing) => match key.as_str() {
                "required" => {
                    let mut union = string_list(existing);
                    for item in string_list(value) {
                        if !union.contains(&item) {
                            union.push(item);
                        }
                    }
                    *existing = Value::Array(union.into_iter().map(Value::String).collect());
                }
                "properties" | "patternProperties" => {
                    if let (Some(base_map), Some(add_map)) =
                        (existing.as_object().cloned(), value.as_object())
                    {
                        let mut out = base_map;
                        for (name, add_schema) in add_map {
                            match out.get(name) {
                                None => {
                                    out.insert(name.clone(), add_schema.clone());
                                }
                                Some(base_schema) => {
                                    let wrapped = serde_json::json!({
                                        "allOf": [base_schema, add_schema]
                                    });
                                    out.insert(name.clone(), wrapped);
                                }
                            }
                        }
                        *existing = Value::Object(out);
                    }
                }
                "minimum" | "minLength" | "minItems" | "minProperties" | "exclusiveMinimum" => {
                    if let (Some(a), Some(b)) = (existing.as_f64(), value.as_f64()) {
                        if b > a {
                            *existing = value.clone();
                        }
                    }
                }
                "maximum" | "maxLength" | "maxItems" | "maxProperties" | "exclusiveMaximum" => {
                    if let (Some(a), Some(b)) = (existing.as_f64(), value.as_f64()) {
                        if b < a {
                            *existing = value.clone();
                        }
                    }
                }
                "type" => {
                    let a: BTreeSet<String> = type_names(existing).into_iter().collect();
                    let b: BTreeSet<String> = type_names(value).into_iter().collect();
                    let both: Vec<Value> = a
                        .intersection(&b)
                        .map(|t| Value::String(t.clone()))
                        .collect();
                    *existing = Value::Array(both);
                }
                "enum" => {
                    if let (Some(a), Some(b)) = (existing.as_array().cloned(), value.as_array()) {
                        let both: Vec<Value> =
                            a.into_iter().filter(|v| b.contains(v)).collect();
                        *existing = Value::Array(both);
                    }
                }
                // First occurrence wins for remaining keywords.
                _ => {}
            },
        }
    }
}

/// `false` or `{"not": {}}` / `{"not": true}`: accepts no instances.
fn is_nothing(value: &Value) -> bool {
    match value {
        Value::Bool(false) => true,
        Value::Object(obj) => {
            obj.len() == 1
                && obj
                    .get("not")
                    .map(is_everything)
                    .unwrap_or(false)
        }
        _ => false,
    }
}

/// `true` or `{}`: accepts every instance.
fn is_everything(value: &Value) -> bool {
    match value {
        Value::Bool(true) => true,
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

fn type_set(obj: &Map<String, Value>) -> Option<BTreeSet<String>> {
    obj.get("type").map(|t| type_names(t).into_iter().collect())
}

fn type_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn enum_values(obj: &Map<String, Value>) -> Option<Vec<Value>> {
    if let Some(values) = obj.get("enum").and_then(Value::as_array) {
        return Some(values.clone());
    }
    obj.get("const").map(|c| vec![c.clone()])
}

fn lower_bound(obj: &Map<String, Value>) -> Option<(f64, bool)> {
    let minimum = get_f64(obj, "minimum");
    let exclusive = match obj.get("exclusiveMinimum") {
        Some(Value::Number(n)) => n.as_f64().map(|v| (v, true)),
        Some(Value::Bool(true)) => minimum.map(|v| (v, true)),
        _ => None,
    };
    match (minimum.map(|v| (v, false)), exclusive) {
        (Some(a), Some(b)) => Some(if b.0 > a.0 || (b.0 == a.0 && b.1) { b } else { a }),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

fn upper_bound(obj: &Map<String, Value>) -> Option<(f64, bool)> {
    let maximum = get_f64(obj, "maximum");
    let exclusive = match obj.get("exclusiveMaximum") {
        Some(Value::Number(n)) => n.as_f64().map(|v| (v, true)),
        Some(Value::Bool(true)) => maximum.map(|v| (v, true)),
        _ => None,
    };
    match (maximum.map(|v| (v, false)), exclusive) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 || (b.0 == a.0 && b.1) { b } else { a }),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

fn get_f64(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

fn get_u64(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    obj.get(key).and_then(Value::as_u64)
}

fn string_set(obj: &Map<String, Value>, key: &str) -> BTreeSet<String> {
    obj.get(key)
        .map(string_list)
        .unwrap_or_default()
        .into_iter()
        .collect()
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The schema governing property `name`: a declared property, the first
/// matching pattern property, or the additional-properties tail.
fn property_schema(obj: &Map<String, Value>, name: &str) -> Value {
    if let Some(schema) = obj
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|props| props.get(name))
    {
        return schema.clone();
    }
    if let Some(patterns) = obj.get("patternProperties").and_then(Value::as_object) {
        for (pattern, schema) in patterns {
            if let Ok(re) = Regex::new(pattern) {
                if re.is_match(name) {
                    return schema.clone();
                }
            }
        }
    }
    additional_properties(obj)
}

fn additional_properties(obj: &Map<String, Value>) -> Value {
    obj.get("additionalProperties")
        .cloned()
        .unwrap_or(Value::Bool(true))
}

fn pattern_properties(obj: &Map<String, Value>) -> BTreeMap<String, Value> {
    obj.get("patternProperties")
        .and_then(Value::as_object)
        .map(|patterns| {
            patterns
                .iter()
                .map(|(pattern, schema)| (pattern.clone(), schema.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// The positional (tuple) schemas and the tail schema covering every
/// further position, per the side's draft.
fn tuple_model(obj: &Map<String, Value>, draft: Draft) -> (Vec<Value>, Value) {
    match draft {
        Draft::Draft2020 => {
            let tuple = obj
                .get("prefixItems")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let tail = obj.get("items").cloned().unwrap_or(Value::Bool(true));
            (tuple, tail)
        }
        Draft::Draft7 => match obj.get("items") {
            Some(Value::Array(tuple)) => {
                let tail = obj
                    .get("additionalItems")
                    .cloned()
                    .unwrap_or(Value::Bool(true));
                (tuple.clone(), tail)
            }
            Some(single) => (Vec::new(), single.clone()),
            None => (Vec::new(), Value::Bool(true)),
        },
    }
}

fn dependent_required(obj: &Map<String, Value>) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    if let Some(deps) = obj.get("dependentRequired").and_then(Value::as_object) {
        for (key, value) in deps {
            out.insert(key.clone(), string_list(value));
        }
    }
    if let Some(deps) = obj.get("dependencies").and_then(Value::as_object) {
        for (key, value) in deps {
            if value.is_array() {
                out.insert(key.clone(), string_list(value));
            }
        }
    }
    out
}

fn dependent_schemas(obj: &Map<String, Value>) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    if let Some(deps) = obj.get("dependentSchemas").and_then(Value::as_object) {
        for (key, value) in deps {
            out.insert(key.clone(), value.clone());
        }
    }
    if let Some(deps) = obj.get("dependencies").and_then(Value::as_object) {
        for (key, value) in deps {
            if !value.is_array() {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JsonSchema;

    fn assert_compatible(reader: &str, writer: &str) {
        let reader = JsonSchema::parse(reader).unwrap();
        let writer = JsonSchema::parse(writer).unwrap();
        let result = check(&reader, &writer);
        assert!(
            result.is_compatible(),
            "expected compatible, got: {:?}",
            result.messages()
        );
    }

    fn assert_incompatible(reader: &str, writer: &str) {
        let reader = JsonSchema::parse(reader).unwrap();
        let writer = JsonSchema::parse(writer).unwrap();
        let result = check(&reader, &writer);
        assert!(!result.is_compatible(), "expected incompatible");
        assert!(!result.messages().is_empty());
    }

    #[test]
    fn identical_schemas_are_compatible() {
        let schema = r#"{"type": "object", "properties": {"name": {"type": "string"}}}"#;
        assert_compatible(schema, schema);
    }

    #[test]
    fn removing_pattern_is_compatible() {
        assert_compatible(
            r#"{"$schema": "https://json-schema.org/draft/2020-12/schema", "type": "string"}"#,
            r#"{"$schema": "https://json-schema.org/draft/2020-12/schema", "type": "string", "pattern": "^[0-9a-f-]{36}$"}"#,
        );
        assert_incompatible(
            r#"{"type": "string", "pattern": "^[0-9a-f-]{36}$"}"#,
            r#"{"type": "string"}"#,
        );
    }

    #[test]
    fn type_widening_is_one_way() {
        assert_compatible(
            r#"{"type": ["string", "null"]}"#,
            r#"{"type": "string"}"#,
        );
        assert_incompatible(
            r#"{"type": "string"}"#,
            r#"{"type": ["string", "null"]}"#,
        );
        assert_compatible(r#"{"type": "number"}"#, r#"{"type": "integer"}"#);
        assert_incompatible(r#"{"type": "integer"}"#, r#"{"type": "number"}"#);
    }

    #[test]
    fn adding_required_property_to_open_model_is_incompatible() {
        assert_incompatible(
            r#"{
                "type": "object",
                "properties": {"name": {"type": "string"}, "age": {"type": "integer"}},
                "required": ["name", "age"]
            }"#,
            r#"{
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
            }"#,
        );
    }

    #[test]
    fn adding_optional_property_to_closed_model_is_compatible() {
        assert_compatible(
            r#"{
                "type": "object",
                "properties": {"name": {"type": "string"}, "age": {"type": "integer"}},
                "additionalProperties": false
            }"#,
            r#"{
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "additionalProperties": false
            }"#,
        );
    }

    #[test]
    fn adding_constrained_property_to_open_model_is_incompatible() {
        assert_incompatible(
            r#"{
                "type": "object",
                "properties": {"age": {"type": "integer"}}
            }"#,
            r#"{"type": "object"}"#,
        );
    }

    #[test]
    fn removing_property_needs_open_reader() {
        assert_compatible(
            r#"{"type": "object"}"#,
            r#"{"type": "object", "properties": {"age": {"type": "integer"}}}"#,
        );
        assert_incompatible(
            r#"{"type": "object", "additionalProperties": false}"#,
            r#"{"type": "object", "properties": {"age": {"type": "integer"}}}"#,
        );
    }

    #[test]
    fn closing_an_open_model_is_incompatible() {
        assert_incompatible(
            r#"{"type": "object", "additionalProperties": false}"#,
            r#"{"type": "object"}"#,
        );
    }

    #[test]
    fn numeric_bounds_loosen_only() {
        assert_compatible(
            r#"{"type": "integer", "minimum": 0}"#,
            r#"{"type": "integer", "minimum": 5}"#,
        );
        assert_incompatible(
            r#"{"type": "integer", "minimum": 5}"#,
            r#"{"type": "integer", "minimum": 0}"#,
        );
        assert_compatible(
            r#"{"type": "integer"}"#,
            r#"{"type": "integer", "maximum": 10}"#,
        );
        assert_incompatible(
            r#"{"type": "integer", "maximum": 10}"#,
            r#"{"type": "integer"}"#,
        );
        assert_incompatible(
            r#"{"type": "integer", "exclusiveMinimum": 5}"#,
            r#"{"type": "integer", "minimum": 5}"#,
        );
    }

    #[test]
    fn length_bounds_follow_the_same_rule() {
        assert_compatible(
            r#"{"type": "string", "maxLength": 20}"#,
            r#"{"type": "string", "maxLength": 10}"#,
        );
        assert_incompatible(
            r#"{"type": "string", "maxLength": 5}"#,
            r#"{"type": "string", "maxLength": 10}"#,
        );
        assert_incompatible(
            r#"{"type": "array", "minItems": 2}"#,
            r#"{"type": "array"}"#,
        );
    }

    #[test]
    fn multiple_of_divisor_rule() {
        assert_compatible(
            r#"{"type": "integer", "multipleOf": 2}"#,
            r#"{"type": "integer", "multipleOf": 4}"#,
        );
        assert_incompatible(
            r#"{"type": "integer", "multipleOf": 4}"#,
            r#"{"type": "integer", "multipleOf": 2}"#,
        );
        assert_compatible(
            r#"{"type": "integer"}"#,
            r#"{"type": "integer", "multipleOf": 3}"#,
        );
    }

    #[test]
    fn enum_superset_rule() {
        assert_compatible(
            r#"{"enum": ["a", "b", "c"]}"#,
            r#"{"enum": ["a", "b"]}"#,
        );
        assert_incompatible(r#"{"enum": ["a"]}"#, r#"{"enum": ["a", "b"]}"#);
        assert_incompatible(r#"{"enum": ["x"]}"#, r#"{"enum": ["a", "b"]}"#);
    }

    #[test]
    fn const_is_a_singleton_enum() {
        assert_compatible(r#"{"enum": ["a", "b"]}"#, r#"{"const": "a"}"#);
        assert_incompatible(r#"{"const": "a"}"#, r#"{"enum": ["a", "b"]}"#);
    }

    #[test]
    fn combinator_branch_widening() {
        assert_compatible(
            r#"{"anyOf": [{"type": "string"}, {"type": "integer"}]}"#,
            r#"{"anyOf": [{"type": "string"}]}"#,
        );
        assert_incompatible(
            r#"{"anyOf": [{"type": "string"}]}"#,
            r#"{"anyOf": [{"type": "string"}, {"type": "integer"}]}"#,
        );
    }

    #[test]
    fn singleton_one_of_equals_plain_schema() {
        assert_compatible(r#"{"oneOf": [{"type": "string"}]}"#, r#"{"type": "string"}"#);
        assert_compatible(r#"{"type": "string"}"#, r#"{"oneOf": [{"type": "string"}]}"#);
    }

    #[test]
    fn all_of_merges_into_conjunction() {
        assert_compatible(
            r#"{"type": "object", "properties": {"a": {"type": "string"}}}"#,
            r#"{"allOf": [
                {"type": "object", "properties": {"a": {"type": "string"}}},
                {"required": ["a"]}
            ]}"#,
        );
        assert_incompatible(
            r#"{"allOf": [{"type": "object"}, {"required": ["a"]}]}"#,
            r#"{"type": "object"}"#,
        );
    }

    #[test]
    fn draft7_tuple_positions_check_positionally() {
        assert_compatible(
            r#"{"items": [{"type": "string"}, {"type": "number"}]}"#,
            r#"{"items": [{"type": "string"}, {"type": "integer"}]}"#,
        );
        assert_incompatible(
            r#"{"items": [{"type": "string"}, {"type": "integer"}]}"#,
            r#"{"items": [{"type": "string"}, {"type": "number"}]}"#,
        );
    }

    #[test]
    fn new_trailing_position_checks_against_writer_tail() {
        // Writer tail is open: a stricter new position narrows it.
        assert_incompatible(
            r#"{"items": [{"type": "string"}, {"type": "integer"}]}"#,
            r#"{"items": [{"type": "string"}]}"#,
        );
        // Matching the writer tail schema widens nothing.
        assert_compatible(
            r#"{"items": [{"type": "string"}, {"type": "integer"}], "additionalItems": {"type": "integer"}}"#,
            r#"{"items": [{"type": "string"}], "additionalItems": {"type": "integer"}}"#,
        );
    }

    #[test]
    fn prefix_items_draft2020() {
        assert_compatible(
            r#"{"$schema": "https://json-schema.org/draft/2020-12/schema",
                "prefixItems": [{"type": "number"}], "items": {"type": "string"}}"#,
            r#"{"$schema": "https://json-schema.org/draft/2020-12/schema",
                "prefixItems": [{"type": "integer"}], "items": {"type": "string"}}"#,
        );
    }

    #[test]
    fn dependent_required_added_is_incompatible() {
        assert_incompatible(
            r#"{"dependentRequired": {"credit_card": ["billing_address"]}}"#,
            r#"{}"#,
        );
        assert_compatible(
            r#"{}"#,
            r#"{"dependentRequired": {"credit_card": ["billing_address"]}}"#,
        );
    }

    #[test]
    fn refs_resolve_before_comparison() {
        assert_compatible(
            r##"{
                "definitions": {"name": {"type": "string"}},
                "type": "object",
                "properties": {"name": {"$ref": "#/definitions/name"}}
            }"##,
            r#"{
                "type": "object",
                "properties": {"name": {"type": "string"}}
            }"#,
        );
    }

    #[test]
    fn incompatible_messages_are_ordered_and_pathed() {
        let reader = JsonSchema::parse(
            r#"{
                "type": "object",
                "properties": {
                    "a": {"type": "integer"},
                    "b": {"type": "integer"}
                }
            }"#,
        )
        .unwrap();
        let writer = JsonSchema::parse(
            r#"{
                "type": "object",
                "properties": {
                    "a": {"type": "string"},
                    "b": {"type": "string"}
                }
            }"#,
        )
        .unwrap();
        let result = check(&reader, &writer);
        let messages = result.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("#/properties/a"));
        assert!(messages[1].contains("#/properties/b"));
    }
}
