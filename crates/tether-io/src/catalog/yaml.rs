// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{CatalogError, RawEntry};
use serde_yaml::Value;

/// Reads a top-level sequence of maps. Scalar keys and values are read as
/// text, the way an XML attribute would be; nested sequences, maps and nulls
/// are skipped. An element that is not a map becomes an empty entry so that
/// it is reported as incomplete.
pub(super) fn read_entries(text: &str) -> Result<Vec<RawEntry>, CatalogError> {
    let root: Value = serde_yaml::from_str(text)?;
    let sequence = match root {
        Value::Sequence(sequence) => sequence,
        Value::Null => return Ok(Vec::new()),
        _ => return Err(CatalogError::NotASequence),
    };

    let entries = sequence
        .into_iter()
        .map(|element| match element {
            Value::Mapping(map) => map
                .into_iter()
                .filter_map(|(key, value)| match (scalar_text(&key), scalar_text(&value)) {
                    (Some(key), Some(value)) => Some((key, value)),
                    _ => {
                        log::debug!("Ignoring non-scalar catalog field {:?}", key);
                        None
                    }
                })
                .collect(),
            _ => RawEntry::new(),
        })
        .collect();
    Ok(entries)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_values_are_read_as_text() {
        let entries =
            read_entries("- Name: 101\n  Path: a.ron\n  Weight: 3\n  Dyeable: true\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].contains(&("Name".to_string(), "101".to_string())));
        assert!(entries[0].contains(&("Weight".to_string(), "3".to_string())));
        assert!(entries[0].contains(&("Dyeable".to_string(), "true".to_string())));
    }

    #[test]
    fn nested_and_null_values_are_skipped() {
        let entries =
            read_entries("- Name: A\n  Path: a.ron\n  Tags: [x, y]\n  Extra: ~\n  Sub: {k: v}\n")
                .unwrap();
        assert_eq!(entries[0].len(), 2);
    }

    #[test]
    fn empty_sequence_has_no_items() {
        assert!(read_entries("[]").unwrap().is_empty());
        assert!(read_entries("~").unwrap().is_empty());
    }

    #[test]
    fn mapping_root_is_rejected() {
        assert!(matches!(read_entries("Name: A\n"), Err(CatalogError::NotASequence)));
    }
}
