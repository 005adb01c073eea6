// crates/devdesc-rs-eds/src/tree.rs

//! Generic tree form of an EDS file for the diff analyzer.
//!
//! `EDS` → `Section@name` → `Entry@key`, where the entry text is its fields
//! joined by `,` after comment stripping.

use crate::lexer::lex;
use crate::parser::decode_text;
use devdesc_rs::error::Result;
use devdesc_rs::tree::DocNode;

pub fn read_tree(bytes: &[u8], source_file: &str) -> Result<DocNode> {
    let text = decode_text(bytes);
    let mut root = DocNode::new("EDS");
    for section in lex(&text, source_file)? {
        let mut node = DocNode::new("Section").with_attr("name", section.name.as_str());
        for entry in &section.entries {
            let mut child = DocNode::new("Entry").with_attr("key", entry.key.as_str());
            let value = entry.value();
            if !value.is_empty() {
                child.text = Some(value);
            }
            node.children.push(child);
        }
        root.children.push(node);
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_and_entries() {
        let text = b"[File]\n DescText = \"Demo\"; $ comment\n[Device]\n VendCode = 1;\n Empty = ;\n";
        let tree = read_tree(text, "t.eds").unwrap();
        assert_eq!(tree.name, "EDS");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].attr("name"), Some("File"));
        let entry = &tree.children[0].children[0];
        assert_eq!(entry.attr("key"), Some("DescText"));
        assert_eq!(entry.text.as_deref(), Some("\"Demo\""));
        assert!(tree.children[1].children[1].text.is_none());
        // root + 2 sections (with name) + 3 entries (with key)
        assert_eq!(tree.node_count(), 11);
    }
}
