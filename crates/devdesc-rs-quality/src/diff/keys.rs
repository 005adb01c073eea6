// crates/devdesc-rs-quality/src/diff/keys.rs

use devdesc_rs::DocNode;
use serde::Deserialize;

/// Tunables of the structural comparison.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Attribute sets that identify a child among its siblings, tried in
    /// order. The first attribute of a set is required, the rest are added
    /// to the key when present.
    pub identity_keys: Vec<Vec<String>>,
    /// Weight of a value change that is only whitespace or number notation.
    pub cosmetic_weight: f64,
    /// A missing or extra subtree weighs its node count instead of one.
    pub weight_subtrees: bool,
    pub check_order: bool,
    pub order_weight: f64,
}

impl Default for DiffConfig {
    fn default() -> Self {
        let keys: &[&[&str]] = &[
            &["id"],
            &["index", "subindex", "subIndex"],
            &["code"],
            &["menuId"],
            &["variableId", "subindex"],
            &["xml:lang"],
            &["name"],
            &["key"],
        ];
        Self {
            identity_keys: keys
                .iter()
                .map(|set| set.iter().map(|s| s.to_string()).collect())
                .collect(),
            cosmetic_weight: 0.1,
            weight_subtrees: true,
            check_order: true,
            order_weight: 0.0,
        }
    }
}

impl DiffConfig {
    /// `Name[attr=value,...]` for a keyed node, the bare name otherwise.
    pub fn identity(&self, node: &DocNode) -> String {
        for set in &self.identity_keys {
            let Some((first, rest)) = set.split_first() else {
                continue;
            };
            let Some(value) = node.attr(first) else {
                continue;
            };
            let mut parts = vec![format!("{}={}", first, value)];
            for name in rest {
                if let Some(value) = node.attr(name) {
                    parts.push(format!("{}={}", name, value));
                }
            }
            return format!("{}[{}]", node.name, parts.join(","));
        }
        node.name.clone()
    }
}

/// Keys every child by its identity plus its occurrence among siblings of
/// the same identity, so repeated unkeyed elements still line up.
pub(crate) fn keyed_children<'a>(node: &'a DocNode, config: &DiffConfig) -> Vec<(String, &'a DocNode)> {
    let mut seen: Vec<(String, usize)> = Vec::new();
    node.children
        .iter()
        .map(|child| {
            let base = config.identity(child);
            let occurrence = match seen.iter_mut().find(|(b, _)| *b == base) {
                Some((_, n)) => {
                    *n += 1;
                    *n
                }
                None => {
                    seen.push((base.clone(), 0));
                    0
                }
            };
            let key = if occurrence == 0 {
                base
            } else {
                format!("{}[{}]", base, occurrence + 1)
            };
            (key, child)
        })
        .collect()
}

/// Equal once whitespace runs are collapsed, or the same number written
/// differently (`0x10` and `16`).
pub(crate) fn is_cosmetic(expected: &str, actual: &str) -> bool {
    let collapse = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapse(expected) == collapse(actual) {
        return true;
    }
    match (parse_number(expected), parse_number(actual)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok()? as f64,
        None => digits.parse::<f64>().ok().filter(|v| v.is_finite())?,
    };
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_prefers_first_matching_set() {
        let config = DiffConfig::default();
        let var = DocNode::new("Variable")
            .with_attr("id", "V_Temp")
            .with_attr("index", "64");
        assert_eq!(config.identity(&var), "Variable[id=V_Temp]");
        let std_ref = DocNode::new("StdVariableRef")
            .with_attr("index", "24")
            .with_attr("subindex", "1");
        assert_eq!(config.identity(&std_ref), "StdVariableRef[index=24,subindex=1]");
        assert_eq!(config.identity(&DocNode::new("Text")), "Text");
    }

    #[test]
    fn test_repeated_siblings_get_occurrence_suffix() {
        let config = DiffConfig::default();
        let parent = DocNode::new("List")
            .with_child(DocNode::new("Item"))
            .with_child(DocNode::new("Item"))
            .with_child(DocNode::new("Other").with_attr("id", "a"));
        let keys: Vec<String> = keyed_children(&parent, &config)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["Item", "Item[2]", "Other[id=a]"]);
    }

    #[test]
    fn test_cosmetic_values() {
        assert!(is_cosmetic("Flow  sensor ", "Flow sensor"));
        assert!(is_cosmetic("0x10", "16"));
        assert!(is_cosmetic("1.50", "1.5"));
        assert!(!is_cosmetic("16", "17"));
        assert!(!is_cosmetic("Flow", "Flux"));
    }
}
