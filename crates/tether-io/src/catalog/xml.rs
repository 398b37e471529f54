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

const ITEM_TAG: &str = "item";

/// Collects the attributes of every `<item>` element, wherever it is nested.
pub(super) fn read_entries(text: &str) -> Result<Vec<RawEntry>, CatalogError> {
    let doc = roxmltree::Document::parse(text)?;
    let entries = doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == ITEM_TAG)
        .map(|node| {
            node.attributes()
                .map(|attr| (attr.name().to_string(), attr.value().to_string()))
                .collect()
        })
        .collect();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_items_are_found() {
        let entries = read_entries(
            r#"<catalog><group><item Name="A" Path="a.ron"/></group><item Name="B" Path="b.ron"/></catalog>"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0][0], ("Name".to_string(), "A".to_string()));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(matches!(read_entries("<catalog><item"), Err(CatalogError::Xml(_))));
    }
}
