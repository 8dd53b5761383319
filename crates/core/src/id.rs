//! Strongly-typed identifiers for workflow engine entities.
//!
//! `WorkflowId` and `ExecutionId` are random UUIDs minted by the engine.
//! `NodeId` is author-supplied (`"A"`, `"fetch_user"`, ...) and must stay
//! unique only within the workflow that declares it, so it is a string
//! key rather than a UUID.

use domain_key::{define_domain, define_uuid, key_type};

pub use domain_key::{KeyParseError, UuidParseError};

define_uuid!(pub WorkflowIdDomain => WorkflowId);
define_uuid!(pub ExecutionIdDomain => ExecutionId);

define_domain!(pub NodeIdDomain, "node");
key_type!(pub NodeId, NodeIdDomain);

define_domain!(pub EdgeIdDomain, "edge");
key_type!(pub EdgeId, EdgeIdDomain);

define_domain!(pub SubscriberIdDomain, "subscriber");
key_type!(pub SubscriberId, SubscriberIdDomain);

define_domain!(pub NodeTypeDomain, "node-type");
key_type!(pub NodeTypeKey, NodeTypeDomain);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_id_v4_is_not_nil() {
        assert!(!WorkflowId::v4().is_nil());
    }

    #[test]
    fn execution_id_round_trips_through_json() {
        let id = ExecutionId::v4();
        let json = serde_json::to_string(&id).unwrap();
        let back: ExecutionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn node_id_is_stable_string_key() {
        let a = NodeId::new("A").unwrap();
        let b = NodeId::new("A").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "A");
    }

    #[test]
    fn distinct_node_ids_are_not_equal() {
        let a = NodeId::new("A").unwrap();
        let b = NodeId::new("B").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn node_id_ordering_is_lexicographic() {
        let a = NodeId::new("A").unwrap();
        let b = NodeId::new("B").unwrap();
        assert!(a < b);
    }

    #[test]
    fn workflow_and_execution_ids_are_distinct_types() {
        fn accepts_workflow(_: WorkflowId) {}
        fn accepts_execution(_: ExecutionId) {}
        accepts_workflow(WorkflowId::v4());
        accepts_execution(ExecutionId::v4());
    }
}
