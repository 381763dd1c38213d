//! Membership Module Tests
//!
//! Validates the fundamental components of the cluster membership system.
//!
//! ## Test Scopes
//! - **Data Structures**: Ensures uniqueness of IDs and correct serialization of wire DTOs.
//! - **Registry Logic**: Join/leave/rejoin, duplicate detection, snapshots, liveness reaping.
//! - **Service Logic**: Joining through the trait and re-joining after expiry.
//! - **Remote Logic**: Joining through an HTTP seed whose answers can get lost.

#[cfg(test)]
mod tests {
    use crate::membership::error::MembershipError;
    use crate::membership::handlers::{handle_join, handle_live};
    use crate::membership::protocol::{ENDPOINT_JOIN, ENDPOINT_LIVE, JoinRequest, JoinResponse};
    use crate::membership::registry::NodeRegistry;
    use crate::membership::remote::RemoteMembership;
    use crate::membership::service::{Membership, MembershipService};
    use crate::membership::types::{Node, NodeId, NodeRole};
    use axum::{
        Extension, Json, Router,
        http::StatusCode,
        routing::{get, post},
    };
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_util::sync::CancellationToken;

    fn server(name: &str, port: u16) -> Node {
        let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
        Node::server(NodeId(name.to_string()), addr)
    }

    // ============================================================
    // NODE ID TESTS
    // ============================================================

    #[test]
    fn test_node_id_is_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();

        assert_ne!(id1, id2, "Each NodeId should be unique");
    }

    #[test]
    fn test_node_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(NodeId("node-1".to_string()));
        set.insert(NodeId("node-1".to_string())); // duplicate
        set.insert(NodeId("node-2".to_string()));

        assert_eq!(set.len(), 2, "HashSet should have 2 unique NodeIds");
    }

    // ============================================================
    // NODE TESTS
    // ============================================================

    #[test]
    fn test_server_and_client_constructors() {
        let s = server("s1", 5000);
        let c = Node::client(NodeId("c1".to_string()));

        assert!(s.is_server());
        assert_eq!(s.addr, Some("127.0.0.1:5000".parse().unwrap()));
        assert_eq!(c.role, NodeRole::Client);
        assert!(c.addr.is_none());
    }

    #[test]
    fn test_node_serialization() {
        let node = server("test-node", 6000);

        let json = serde_json::to_string(&node).expect("Serialization failed");
        assert!(json.contains("\"role\":\"server\""));

        let restored: Node = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(restored, node);
    }

    // ============================================================
    // REGISTRY TESTS
    // ============================================================

    #[test]
    fn test_join_returns_node_id() {
        let registry = NodeRegistry::new();

        let id = registry.join(server("s1", 5000)).unwrap();

        assert_eq!(id, NodeId("s1".to_string()));
        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_join_fails_while_live() {
        let registry = NodeRegistry::new();
        registry.join(server("s1", 5000)).unwrap();

        let result = registry.join(server("s1", 5001));

        assert_eq!(
            result,
            Err(MembershipError::DuplicateNode(NodeId("s1".to_string())))
        );
        // The original registration is untouched.
        assert_eq!(
            registry.list_live()[0].addr,
            Some("127.0.0.1:5000".parse().unwrap())
        );
    }

    #[test]
    fn test_rejoin_after_leave() {
        let registry = NodeRegistry::new();
        let id = registry.join(server("s1", 5000)).unwrap();

        registry.leave(&id).unwrap();
        assert!(registry.is_empty());

        assert!(registry.join(server("s1", 5000)).is_ok());
    }

    #[test]
    fn test_leave_unknown_node() {
        let registry = NodeRegistry::new();

        let result = registry.leave(&NodeId("ghost".to_string()));

        assert!(matches!(result, Err(MembershipError::UnknownNode(_))));
    }

    #[test]
    fn test_list_live_is_a_sorted_snapshot() {
        let registry = NodeRegistry::new();
        registry.join(server("b", 5001)).unwrap();
        registry.join(server("a", 5000)).unwrap();

        let snapshot = registry.list_live();
        registry.join(server("c", 5002)).unwrap();
        registry.leave(&NodeId("a".to_string())).unwrap();

        let ids: Vec<&str> = snapshot.iter().map(|n| n.id.0.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"], "Snapshot must not change after the fact");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_live_servers_excludes_clients() {
        let registry = NodeRegistry::new();
        registry.join(server("s1", 5000)).unwrap();
        registry.join(Node::client(NodeId("c1".to_string()))).unwrap();

        let servers = registry.live_servers();

        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].id, NodeId("s1".to_string()));
        assert_eq!(registry.list_live().len(), 2);
    }

    #[test]
    fn test_heartbeat_unknown_node() {
        let registry = NodeRegistry::new();

        let result = registry.heartbeat(&NodeId("ghost".to_string()));

        assert!(matches!(result, Err(MembershipError::UnknownNode(_))));
    }

    #[tokio::test]
    async fn test_reap_expired_removes_silent_nodes() {
        let registry = NodeRegistry::new();
        registry.join(server("silent", 5000)).unwrap();
        registry.join(server("chatty", 5001)).unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        registry.heartbeat(&NodeId("chatty".to_string())).unwrap();

        let reaped = registry.reap_expired(Duration::from_millis(40));

        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].id, NodeId("silent".to_string()));
        assert!(registry.contains(&NodeId("chatty".to_string())));

        // A reaped identity may join again.
        assert!(registry.join(server("silent", 5000)).is_ok());
    }

    #[tokio::test]
    async fn test_reaper_loop_stops_on_cancellation() {
        let registry = NodeRegistry::new();
        registry.join(server("s1", 5000)).unwrap();
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(registry.clone().reaper_loop(
            Duration::from_millis(10),
            Duration::from_millis(5),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(registry.is_empty(), "Silent node should have been reaped");

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reaper did not stop")
            .unwrap();
    }

    // ============================================================
    // SERVICE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_service_join_through_trait() {
        let registry = NodeRegistry::new();
        let backend: Arc<dyn Membership> = registry.clone();

        let service =
            MembershipService::join(server("s1", 5000), backend, Duration::from_secs(1))
                .await
                .expect("join failed");

        assert_eq!(service.local_id(), &NodeId("s1".to_string()));
        assert_eq!(service.live_servers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_service_join_duplicate_is_fatal() {
        let registry = NodeRegistry::new();
        registry.join(server("s1", 5000)).unwrap();

        let result =
            MembershipService::join(server("s1", 5001), registry, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(MembershipError::DuplicateNode(_))));
    }

    #[tokio::test]
    async fn test_service_rejoins_after_expiry() {
        let registry = NodeRegistry::new();
        let service = MembershipService::join(
            server("s1", 5000),
            registry.clone(),
            Duration::from_millis(10),
        )
        .await
        .unwrap();

        // Simulate the seed reaping us.
        registry.leave(&NodeId("s1".to_string())).unwrap();
        assert!(registry.is_empty());

        let shutdown = CancellationToken::new();
        service.clone().start(shutdown.clone()).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        shutdown.cancel();

        assert!(registry.contains(&NodeId("s1".to_string())));
    }

    #[tokio::test]
    async fn test_service_leave() {
        let registry = NodeRegistry::new();
        let service =
            MembershipService::join(server("s1", 5000), registry.clone(), Duration::from_secs(1))
                .await
                .unwrap();

        service.leave().await;

        assert!(registry.is_empty());
    }

    // ============================================================
    // REMOTE MEMBERSHIP TESTS
    // ============================================================

    /// Registers every join, but answers the first one only after the caller has given up.
    async fn late_first_answer(
        Extension(registry): Extension<Arc<NodeRegistry>>,
        Extension(first): Extension<Arc<AtomicBool>>,
        Json(req): Json<JoinRequest>,
    ) -> (StatusCode, Json<JoinResponse>) {
        let answer = handle_join(Extension(registry), Json(req)).await;
        if first.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1500)).await;
        }
        answer
    }

    async fn seed_losing_first_answer(registry: Arc<NodeRegistry>) -> SocketAddr {
        let app = Router::new()
            .route(ENDPOINT_JOIN, post(late_first_answer))
            .route(ENDPOINT_LIVE, get(handle_live))
            .layer(Extension(registry))
            .layer(Extension(Arc::new(AtomicBool::new(true))));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_remote_join_accepts_registration_from_lost_attempt() {
        // ARRANGE
        let registry = NodeRegistry::new();
        let seed = seed_losing_first_answer(registry.clone()).await;
        let remote = RemoteMembership::new(seed);
        let node = server("node-1", 5001);

        // ACT: the first attempt times out, the retry runs into its own registration.
        let joined = remote.join(node.clone()).await;

        // ASSERT
        assert_eq!(joined, Ok(NodeId("node-1".to_string())));
        assert_eq!(registry.list_live(), vec![node]);
    }

    #[tokio::test]
    async fn test_remote_join_still_rejects_other_live_node() {
        let registry = NodeRegistry::new();
        registry.join(server("node-1", 5001)).unwrap();
        let seed = seed_losing_first_answer(registry.clone()).await;
        let remote = RemoteMembership::new(seed);

        let joined = remote.join(server("node-1", 5002)).await;

        assert_eq!(
            joined,
            Err(MembershipError::DuplicateNode(NodeId("node-1".to_string())))
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list_live()[0].addr, Some("127.0.0.1:5001".parse().unwrap()));
    }
}
