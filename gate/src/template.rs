// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! CloudFormation aware YAML loading.
//!
//! Templates are parsed with `serde_yaml` and converted into a `serde_json::Value`
//! with every short form intrinsic function (`!Ref`, `!Sub`, `!GetAtt` ...) rewritten
//! into its long form (`Ref`, `Fn::Sub`, `Fn::GetAtt` ...). Mapping order is kept.

use lazy_static::lazy_static;
use serde_json::{Map, Number, Value};
use serde_yaml::value::TaggedValue;
use std::collections::HashMap;

use crate::errors::{Error, Result};

lazy_static! {
    static ref SHORT_FORM_TO_LONG_MAPPING: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("Ref", "Ref");
        m.insert("Condition", "Condition");
        m.insert("GetAtt", "Fn::GetAtt");
        m.insert("Base64", "Fn::Base64");
        m.insert("Cidr", "Fn::Cidr");
        m.insert("Sub", "Fn::Sub");
        m.insert("GetAZs", "Fn::GetAZs");
        m.insert("ImportValue", "Fn::ImportValue");
        m.insert("Select", "Fn::Select");
        m.insert("Split", "Fn::Split");
        m.insert("Join", "Fn::Join");
        m.insert("FindInMap", "Fn::FindInMap");
        m.insert("Transform", "Fn::Transform");
        m.insert("Length", "Fn::Length");
        m.insert("ToJsonString", "Fn::ToJsonString");
        m.insert("And", "Fn::And");
        m.insert("Equals", "Fn::Equals");
        m.insert("If", "Fn::If");
        m.insert("Not", "Fn::Not");
        m.insert("Or", "Fn::Or");
        m
    };
}

/// Parses a template and returns it in long form. The document root must be a mapping.
pub fn load_template(text: &str) -> Result<Value> {
    let yaml = serde_yaml::from_str::<serde_yaml::Value>(text)?;
    let value = convert(yaml)?;
    match value {
        Value::Object(_) => Ok(value),
        other => Err(Error::TemplateError(format!(
            "expected a mapping at the document root, found {}",
            type_name(&other)
        ))),
    }
}

fn convert(value: serde_yaml::Value) -> Result<Value> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => convert_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(
            seq.into_iter()
                .map(convert)
                .collect::<Result<Vec<Value>>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(key_string(key)?, convert(value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => convert_tagged(*tagged)?,
    })
}

fn convert_tagged(tagged: TaggedValue) -> Result<Value> {
    let tag = tagged.tag.to_string();
    let short = tag.trim_start_matches('!');
    let long = match SHORT_FORM_TO_LONG_MAPPING.get(short) {
        Some(long) => *long,
        None => {
            return Err(Error::TemplateError(format!(
                "unsupported YAML tag `{}`",
                tag
            )))
        }
    };

    let inner = match (short, tagged.value) {
        // !GetAtt Resource.Attribute is the scalar shorthand for [Resource, Attribute]
        ("GetAtt", serde_yaml::Value::String(s)) => match s.split_once('.') {
            Some((resource, attribute)) => Value::Array(vec![
                Value::String(resource.to_string()),
                Value::String(attribute.to_string()),
            ]),
            None => Value::String(s),
        },
        (_, value) => convert(value)?,
    };

    let mut map = Map::with_capacity(1);
    map.insert(long.to_string(), inner);
    Ok(Value::Object(map))
}

fn convert_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(Number::from(i))
    } else if let Some(u) = n.as_u64() {
        Value::Number(Number::from(u))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(n.to_string()), Value::Number)
    }
}

fn key_string(key: serde_yaml::Value) -> Result<String> {
    Ok(match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => String::from("null"),
        other => {
            return Err(Error::TemplateError(format!(
                "mapping keys must be scalars, found {}",
                serde_yaml::to_string(&other)?.trim_end()
            )))
        }
    })
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod template_tests;
