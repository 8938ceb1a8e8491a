//! Structured node encoding: one record per node

use super::{check_index, check_references, Encoding, NodeStore};
use crate::model::{Fragment, Node, NodeIndex, NodeSpec, Padding, MAX_NODES, MAX_SIBLINGS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum fragment length for the structured encoding
pub const VALUE_CAP: usize = 28;

/// A stored node. The fragment is right-padded to [`VALUE_CAP`] bytes and
/// siblings are kept as a dense list (no empty slots).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct NodeRecord {
    value: [u8; VALUE_CAP],
    left_child: NodeIndex,
    right_child: NodeIndex,
    siblings: Vec<NodeIndex>,
}

/// Node store keeping one [`NodeRecord`] per slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecords")]
pub struct StructuredNodeStore {
    records: Vec<Option<NodeRecord>>,
}

/// Serialized form; the record count and sibling lists are checked on load
#[derive(Deserialize)]
struct StoredRecords {
    records: Vec<Option<NodeRecord>>,
}

impl TryFrom<StoredRecords> for StructuredNodeStore {
    type Error = Error;

    fn try_from(stored: StoredRecords) -> Result<Self> {
        if stored.records.len() != MAX_NODES as usize {
            return Err(Error::Corruption(format!(
                "expected {} node records, found {}",
                MAX_NODES,
                stored.records.len()
            )));
        }
        let oversized = stored
            .records
            .iter()
            .flatten()
            .find(|record| record.siblings.len() > MAX_SIBLINGS);
        if let Some(record) = oversized {
            return Err(Error::TooManySiblings {
                count: record.siblings.len(),
                max: MAX_SIBLINGS,
            });
        }
        Ok(StructuredNodeStore {
            records: stored.records,
        })
    }
}

impl StructuredNodeStore {
    pub fn new() -> Self {
        StructuredNodeStore {
            records: vec![None; MAX_NODES as usize],
        }
    }
}

impl Default for StructuredNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for StructuredNodeStore {
    fn encoding(&self) -> Encoding {
        Encoding::Structured
    }

    fn write(&mut self, spec: &NodeSpec) -> Result<()> {
        check_index(spec.index)?;
        let fragment = Fragment::pad(spec.value.as_bytes(), VALUE_CAP, Padding::Trailing)?;
        check_references(spec, false)?;

        let mut value = [0u8; VALUE_CAP];
        value.copy_from_slice(fragment.padded());
        self.records[spec.index as usize - 1] = Some(NodeRecord {
            value,
            left_child: spec.left_child,
            right_child: spec.right_child,
            siblings: spec.siblings.clone(),
        });
        Ok(())
    }

    fn read(&self, index: NodeIndex) -> Result<Node> {
        check_index(index)?;
        let record = self.records[index as usize - 1]
            .as_ref()
            .ok_or(Error::NoNodeStored(index))?;
        Ok(Node {
            index,
            value: Fragment::from_padded(record.value.to_vec(), Padding::Trailing),
            left_child: record.left_child,
            right_child: record.right_child,
            siblings: record.siblings.clone(),
        })
    }

    fn contains(&self, index: NodeIndex) -> bool {
        index >= 1 && index <= MAX_NODES && self.records[index as usize - 1].is_some()
    }

    fn len(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_before_any_write() {
        let store = StructuredNodeStore::new();
        assert!(matches!(store.read(1), Err(Error::NoNodeStored(1))));
    }

    #[test]
    fn test_store_and_get_node() {
        let mut store = StructuredNodeStore::new();
        store.write(&NodeSpec::new(1, "hello").children(2, 3)).unwrap();
        let node = store.read(1).unwrap();
        assert_eq!(node.left_child, 2);
        assert_eq!(node.right_child, 3);
        assert!(node.siblings.is_empty());
        assert_eq!(
            node.value.to_hex(),
            "0x68656c6c6f0000000000000000000000000000000000000000000000"
        );
        assert!(matches!(store.read(2), Err(Error::NoNodeStored(2))));
    }

    #[test]
    fn test_zero_sibling_is_rejected() {
        let mut store = StructuredNodeStore::new();
        let err = store
            .write(&NodeSpec::new(1, "hello").children(2, 3).siblings(&[5, 0]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfRange {
                field: "sibling",
                index: 0,
                ..
            }
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_dense_siblings_keep_order() {
        let mut store = StructuredNodeStore::new();
        store
            .write(&NodeSpec::new(8, "hello").children(11, 12).siblings(&[7, 9, 10]))
            .unwrap();
        let node = store.read(8).unwrap();
        assert_eq!(node.siblings, vec![7, 9, 10]);
        assert_eq!(node.sibling_slots(), [7, 9, 10, 0]);
    }

    #[test]
    fn test_deserialize_checks_record_count() {
        let mut store = StructuredNodeStore::new();
        store.write(&NodeSpec::new(1, "hello").children(2, 3)).unwrap();
        let restored: StructuredNodeStore =
            serde_json::from_str(&serde_json::to_string(&store).unwrap()).unwrap();
        assert_eq!(restored, store);

        assert!(serde_json::from_str::<StructuredNodeStore>(r#"{"records": []}"#).is_err());
    }

    #[test]
    fn test_full_width_fragment_roundtrip() {
        let mut store = StructuredNodeStore::new();
        let value = "abcdefghijklmnopqrstuvwxyz12";
        store.write(&NodeSpec::new(25, value)).unwrap();
        let node = store.read(25).unwrap();
        assert_eq!(node.value.padded(), value.as_bytes());
        assert_eq!(node.value.text(), value);
    }
}
