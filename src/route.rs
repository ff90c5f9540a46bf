//! # Routes and Cluster Values
//!
//! A [`Route`] is the caller-specified targeting policy for a command in a
//! multi-node deployment. Whether a reply is a single merged value or a
//! per-node mapping is decided solely by the route the caller supplied,
//! never by inspecting the payload shape.

use std::collections::HashMap;

use crate::convert::{into_string, Responder};
use crate::error::{Error, Result};
use crate::value::Value;

/// Which node of a slot's replication group a single-node route targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
    Primary,
    Replica,
}

/// Targeting policy for a command in a cluster deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Any single node, chosen by the core.
    Random,
    /// Fan out to every node.
    AllNodes,
    /// Fan out to every primary.
    AllPrimaries,
    /// The node owning the given hash slot.
    SlotId { slot: u16, slot_type: SlotType },
    /// The node owning the slot this key hashes to.
    SlotKey { key: String, slot_type: SlotType },
    /// A specific node by address.
    ByAddress { host: String, port: u16 },
}

impl Route {
    /// Whether this route targets exactly one node. Multi-node routes fan
    /// the command out and produce a per-address reply mapping.
    pub fn is_single_node(&self) -> bool {
        !matches!(self, Route::AllNodes | Route::AllPrimaries)
    }
}

/// The result of a routed command: either one merged value (single-node
/// route) or the converted value of every node, keyed by node address.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterValue<T> {
    Single(T),
    PerNode(HashMap<String, T>),
}

impl<T> ClusterValue<T> {
    /// Unwrap the single-node variant; errors if the value is per-node.
    pub fn into_single(self) -> Result<T> {
        match self {
            ClusterValue::Single(value) => Ok(value),
            ClusterValue::PerNode(map) => Err(Error::unexpected_return_type(
                "single value",
                format!("{} node entries", map.len()),
            )),
        }
    }

    /// Unwrap the per-node variant; errors if the value is single.
    pub fn into_per_node(self) -> Result<HashMap<String, T>> {
        match self {
            ClusterValue::PerNode(map) => Ok(map),
            ClusterValue::Single(_) => {
                Err(Error::unexpected_return_type("per-node mapping", "single value"))
            }
        }
    }
}

/// Aggregate a routed reply into a [`ClusterValue`], applying the scalar
/// responder per payload.
///
/// Single-node routes unwrap: a bare payload converts directly, a one-entry
/// address mapping is unwrapped, and a multi-entry mapping is rejected;
/// picking an arbitrary entry would hide a core/binding mismatch.
/// Multi-node routes require an address mapping and convert every entry,
/// preserving the addresses verbatim as keys.
pub(crate) fn aggregate<T>(
    route: &Route,
    reply: Value,
    responder: &Responder<T>,
) -> Result<ClusterValue<T>> {
    if route.is_single_node() {
        match reply {
            Value::Map(mut pairs) => {
                if pairs.len() != 1 {
                    return Err(Error::unexpected_return_type(
                        "reply from exactly one node",
                        format!("{} node entries", pairs.len()),
                    ));
                }
                let (_, value) = pairs.remove(0);
                Ok(ClusterValue::Single(responder.apply(value)?))
            }
            other => Ok(ClusterValue::Single(responder.apply(other)?)),
        }
    } else {
        match reply {
            Value::Map(pairs) => {
                let mut per_node = HashMap::with_capacity(pairs.len());
                for (address, value) in pairs {
                    per_node.insert(into_string(address)?, responder.apply(value)?);
                }
                Ok(ClusterValue::PerNode(per_node))
            }
            other => Err(Error::unexpected_return_type(
                "per-node mapping",
                other.kind_name(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{into_i64, into_some_string};

    fn bulk(text: &str) -> Value {
        Value::BulkString(text.as_bytes().to_vec())
    }

    #[test]
    fn test_route_node_cardinality() {
        assert!(Route::Random.is_single_node());
        assert!(Route::ByAddress {
            host: "node1".to_string(),
            port: 7379
        }
        .is_single_node());
        assert!(Route::SlotKey {
            key: "k".to_string(),
            slot_type: SlotType::Primary
        }
        .is_single_node());
        assert!(!Route::AllNodes.is_single_node());
        assert!(!Route::AllPrimaries.is_single_node());
    }

    #[test]
    fn test_single_node_unwraps_one_entry_mapping() {
        let responder = Responder::nullable("string", || None, into_some_string);
        let reply = Value::Map(vec![(bulk("10.0.0.1:7379"), bulk("conn-name"))]);
        let route = Route::Random;
        let value = aggregate(&route, reply, &responder).unwrap();
        assert_eq!(value, ClusterValue::Single(Some("conn-name".to_string())));
    }

    #[test]
    fn test_single_node_accepts_bare_payload() {
        let responder = Responder::required("integer", into_i64);
        let value = aggregate(&Route::Random, Value::Int(5), &responder).unwrap();
        assert_eq!(value, ClusterValue::Single(5));
    }

    #[test]
    fn test_single_node_rejects_multi_entry_mapping() {
        let responder = Responder::required("integer", into_i64);
        let reply = Value::Map(vec![
            (bulk("10.0.0.1:7379"), Value::Int(1)),
            (bulk("10.0.0.2:7379"), Value::Int(2)),
        ]);
        let err = aggregate(&Route::Random, reply, &responder).unwrap_err();
        assert!(matches!(err, Error::UnexpectedReturnType { .. }));
    }

    #[test]
    fn test_multi_node_preserves_addresses() {
        let responder = Responder::required("integer", into_i64);
        let reply = Value::Map(vec![
            (bulk("10.0.0.1:7379"), Value::Int(1)),
            (bulk("10.0.0.2:7379"), Value::Int(2)),
        ]);
        let value = aggregate(&Route::AllPrimaries, reply, &responder).unwrap();
        let per_node = value.into_per_node().unwrap();
        assert_eq!(per_node.len(), 2);
        assert_eq!(per_node["10.0.0.1:7379"], 1);
        assert_eq!(per_node["10.0.0.2:7379"], 2);
    }

    #[test]
    fn test_multi_node_rejects_bare_payload() {
        let responder = Responder::required("integer", into_i64);
        let err = aggregate(&Route::AllNodes, Value::Int(1), &responder).unwrap_err();
        assert!(matches!(err, Error::UnexpectedReturnType { .. }));
    }

    #[test]
    fn test_multi_node_converts_each_entry_independently() {
        let responder = Responder::required("integer", into_i64);
        let reply = Value::Map(vec![
            (bulk("10.0.0.1:7379"), Value::Int(1)),
            (bulk("10.0.0.2:7379"), bulk("not-an-int")),
        ]);
        assert!(aggregate(&Route::AllNodes, reply, &responder).is_err());
    }
}
