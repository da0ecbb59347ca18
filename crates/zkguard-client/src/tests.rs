//! Unit tests for the memory store and the client wrapper.

use std::sync::Arc;

use test_case::test_case;
use zkguard_acl::{AclProvider, DigestCredentialsProvider, ZkCredentials};
use zkguard_types::{
    Acl, AclList, CreateMode, NodePath, Permission, Perms, Scheme, SessionIdentity,
};

use crate::{
    Connector, Handshake, MemoryStore, StoreOptions, ZkClient, ZkClientBuilder, ZkError,
    ZkSession,
};

fn path(p: &str) -> NodePath {
    NodePath::parse(p).unwrap()
}

fn read_only() -> AclList {
    AclList::single(Acl::world(Perms::READ))
}

// ============================================================================
// Memory store
// ============================================================================

#[test]
fn root_exists_and_is_open() {
    let store = MemoryStore::new();
    let session = store.anonymous().connect(&[]).unwrap();

    let stat = session.exists(&NodePath::root()).unwrap().unwrap();
    assert_eq!(stat.num_children, 0);
    assert_eq!(store.acl_of(&NodePath::root()).unwrap(), Some(AclList::open()));
    assert_eq!(store.node_count().unwrap(), 1);
}

#[test]
fn create_requires_parent() {
    let store = MemoryStore::new();
    let session = store.anonymous().connect(&[]).unwrap();

    let err = session
        .create(&path("/a/b"), b"", CreateMode::Persistent, &AclList::open())
        .unwrap_err();
    assert_eq!(err, ZkError::NoNode { path: path("/a/b") });
}

#[test]
fn create_twice_is_node_exists() {
    let store = MemoryStore::new();
    let session = store.anonymous().connect(&[]).unwrap();
    let acl = AclList::open();

    session.create(&path("/a"), b"1", CreateMode::Persistent, &acl).unwrap();
    let err = session
        .create(&path("/a"), b"2", CreateMode::Persistent, &acl)
        .unwrap_err();
    assert!(err.is_node_exists());
    assert_eq!(session.get_data(&path("/a")).unwrap().0.as_ref(), b"1");
}

#[test]
fn create_root_is_node_exists() {
    let store = MemoryStore::new();
    let session = store.anonymous().connect(&[]).unwrap();
    let err = session
        .create(&NodePath::root(), b"", CreateMode::Persistent, &AclList::open())
        .unwrap_err();
    assert!(err.is_node_exists());
}

#[test]
fn no_auth_is_checked_before_node_exists() {
    let store = MemoryStore::new();
    let owner = store.kerberos("solr").connect(&[]).unwrap();
    let guest = store.anonymous().connect(&[]).unwrap();
    let restricted = AclList::new(Acl::world(Perms::READ), [Acl::sasl("solr", Perms::ALL)]);
    owner
        .create(&path("/p"), b"", CreateMode::Persistent, &restricted)
        .unwrap();
    owner
        .create(&path("/p/child"), b"", CreateMode::Persistent, &AclList::open())
        .unwrap();

    let err = guest
        .create(&path("/p/child"), b"", CreateMode::Persistent, &AclList::open())
        .unwrap_err();
    assert_eq!(
        err,
        ZkError::NoAuth {
            path: path("/p/child"),
            required: Permission::Create,
        }
    );
    assert!(
        owner
            .create(&path("/p/child"), b"", CreateMode::Persistent, &AclList::open())
            .unwrap_err()
            .is_node_exists()
    );
}

#[test]
fn children_are_sorted_and_counted() {
    let store = MemoryStore::new();
    let session = store.anonymous().connect(&[]).unwrap();
    let acl = AclList::open();
    for name in ["/p", "/p/c", "/p/a", "/p/b"] {
        session.create(&path(name), b"", CreateMode::Persistent, &acl).unwrap();
    }

    assert_eq!(session.get_children(&path("/p")).unwrap(), ["a", "b", "c"]);
    assert_eq!(session.exists(&path("/p")).unwrap().unwrap().num_children, 3);
}

#[test]
fn delete_checks_parent_then_children() {
    let store = MemoryStore::new();
    let session = store.anonymous().connect(&[]).unwrap();
    let acl = AclList::open();
    session.create(&path("/p"), b"", CreateMode::Persistent, &acl).unwrap();
    session.create(&path("/p/c"), b"", CreateMode::Persistent, &acl).unwrap();

    assert_eq!(
        session.delete(&path("/p")).unwrap_err(),
        ZkError::NotEmpty { path: path("/p") }
    );
    assert_eq!(
        session.delete(&path("/p/missing")).unwrap_err(),
        ZkError::NoNode { path: path("/p/missing") }
    );
    session.delete(&path("/p/c")).unwrap();
    session.delete(&path("/p")).unwrap();
    assert!(session.exists(&path("/p")).unwrap().is_none());
    assert!(matches!(
        session.delete(&NodePath::root()),
        Err(ZkError::BadArguments(_))
    ));
}

#[test]
fn read_only_node_denies_write_but_not_metadata() {
    let store = MemoryStore::new();
    let session = store.anonymous().connect(&[]).unwrap();
    session
        .create(&path("/ro"), b"data", CreateMode::Persistent, &read_only())
        .unwrap();

    assert_eq!(session.get_data(&path("/ro")).unwrap().0.as_ref(), b"data");
    assert!(session.set_data(&path("/ro"), b"x").unwrap_err().is_no_auth());
    assert!(session.exists(&path("/ro")).unwrap().is_some());
    assert_eq!(session.get_acl(&path("/ro")).unwrap().0, read_only());
}

#[test]
fn unreadable_node_still_reports_acl() {
    let store = MemoryStore::new();
    let owner = store.kerberos("solr").connect(&[]).unwrap();
    let guest = store.anonymous().connect(&[]).unwrap();
    let sasl_only = AclList::single(Acl::sasl("solr", Perms::ALL));
    owner
        .create(&path("/secret"), b"s", CreateMode::Persistent, &sasl_only)
        .unwrap();

    assert_eq!(
        guest.get_data(&path("/secret")).unwrap_err(),
        ZkError::NoAuth {
            path: path("/secret"),
            required: Permission::Read,
        }
    );
    assert!(guest.get_children(&path("/secret")).unwrap_err().is_no_auth());
    assert_eq!(guest.get_acl(&path("/secret")).unwrap().0, sasl_only);
    assert_eq!(owner.get_data(&path("/secret")).unwrap().0.as_ref(), b"s");
}

#[test]
fn skip_acl_grants_everything() {
    let store = MemoryStore::with_options(StoreOptions {
        skip_acl: true,
        ..StoreOptions::default()
    });
    let session = store.anonymous().connect(&[]).unwrap();
    session
        .create(&path("/ro"), b"", CreateMode::Persistent, &read_only())
        .unwrap();
    session.set_data(&path("/ro"), b"changed").unwrap();
    session
        .create(&path("/ro/child"), b"", CreateMode::Persistent, &read_only())
        .unwrap();
}

#[test_case("solr", false, false, "solr"; "plain principal")]
#[test_case("solr/host.example.com@EXAMPLE.COM", false, false, "solr/host.example.com@EXAMPLE.COM"; "kept")]
#[test_case("solr/host.example.com@EXAMPLE.COM", true, false, "solr@EXAMPLE.COM"; "host removed")]
#[test_case("solr/host.example.com@EXAMPLE.COM", false, true, "solr/host.example.com"; "realm removed")]
#[test_case("solr/host.example.com@EXAMPLE.COM", true, true, "solr"; "both removed")]
#[test_case("solr@EXAMPLE.COM", true, true, "solr"; "no host")]
fn principal_normalization(principal: &str, remove_host: bool, remove_realm: bool, expected: &str) {
    let options = StoreOptions {
        remove_host_from_principal: remove_host,
        remove_realm_from_principal: remove_realm,
        ..StoreOptions::default()
    };
    assert_eq!(options.normalize_principal(principal), expected);
}

#[test]
fn kerberos_handshake_sets_identity() {
    let store = MemoryStore::with_options(StoreOptions::short_principals());
    let session = store
        .kerberos("solr/node1@EXAMPLE.COM")
        .connect(&[])
        .unwrap();
    assert_eq!(session.identity(), &SessionIdentity::authenticated("solr"));
    assert_eq!(session.auth_ids(), [(Scheme::Sasl, "solr".to_string())]);
}

#[test]
fn sasl_disabled_connects_anonymously() {
    let store = MemoryStore::with_options(StoreOptions {
        sasl_enabled: false,
        ..StoreOptions::default()
    });
    let session = store.kerberos("solr").connect(&[]).unwrap();
    assert!(session.identity().is_anonymous());
    assert!(session.auth_ids().is_empty());

    let rejected = store
        .connector(Handshake::Rejected {
            reason: "bad ticket".to_string(),
        })
        .connect(&[])
        .unwrap();
    assert!(rejected.identity().is_anonymous());
}

#[test]
fn rejected_handshake_is_auth_failed() {
    let store = MemoryStore::new();
    let err = store
        .connector(Handshake::Rejected {
            reason: "clock skew too great".to_string(),
        })
        .connect(&[])
        .unwrap_err();
    assert_eq!(err, ZkError::AuthFailed("clock skew too great".to_string()));
}

#[test]
fn digest_credentials_set_identity_and_auth_id() {
    let store = MemoryStore::new();
    let session = store
        .anonymous()
        .connect(&[ZkCredentials::digest("super", "secret")])
        .unwrap();
    assert_eq!(session.identity(), &SessionIdentity::digest("super"));
    assert_eq!(
        session.auth_ids(),
        [(Scheme::Digest, "super:lK75jTNcA+U9vtVEw5vB51mj/w4=".to_string())]
    );
}

#[test]
fn sasl_identity_wins_over_digest() {
    let store = MemoryStore::new();
    let session = store
        .kerberos("solr")
        .connect(&[ZkCredentials::digest("super", "secret")])
        .unwrap();
    assert_eq!(session.identity(), &SessionIdentity::authenticated("solr"));
    assert_eq!(session.auth_ids().len(), 2);
}

#[test]
fn malformed_or_unsupported_credentials_fail() {
    let store = MemoryStore::new();
    let err = store
        .anonymous()
        .connect(&[ZkCredentials::new(Scheme::Digest, b"no-colon".to_vec())])
        .unwrap_err();
    assert!(matches!(err, ZkError::AuthFailed(_)));

    let err = store
        .anonymous()
        .connect(&[ZkCredentials::new(Scheme::World, b"anyone".to_vec())])
        .unwrap_err();
    assert!(matches!(err, ZkError::AuthFailed(_)));
}

#[test]
fn disconnect_and_outage_are_connection_loss() {
    let store = MemoryStore::new();
    let session = store.anonymous().connect(&[]).unwrap();

    session.disconnect();
    let err = session.exists(&NodePath::root()).unwrap_err();
    assert_eq!(err, ZkError::ConnectionLoss);
    assert!(err.is_retryable());
    session.disconnect();
    session.reconnect();
    session.reconnect();
    assert!(session.exists(&NodePath::root()).is_ok());

    store.set_available(false);
    assert_eq!(session.get_children(&NodePath::root()).unwrap_err(), ZkError::ConnectionLoss);
    assert_eq!(store.anonymous().connect(&[]).unwrap_err(), ZkError::ConnectionLoss);
    store.set_available(true);
    assert!(session.get_children(&NodePath::root()).is_ok());
}

#[test]
fn closed_session_rejects_operations() {
    let store = MemoryStore::new();
    let session = store.anonymous().connect(&[]).unwrap();
    session.close().unwrap();
    session.close().unwrap();
    assert!(session.is_closed());
    assert_eq!(session.exists(&NodePath::root()).unwrap_err(), ZkError::SessionClosed);

    // A closed session stays closed.
    session.disconnect();
    session.reconnect();
    assert_eq!(session.exists(&NodePath::root()).unwrap_err(), ZkError::SessionClosed);
}

#[test]
fn sessions_get_distinct_ids() {
    let store = MemoryStore::new();
    let a = store.anonymous().connect(&[]).unwrap();
    let b = store.anonymous().connect(&[]).unwrap();
    assert_ne!(a.session_id(), b.session_id());
}

// ============================================================================
// Client
// ============================================================================

#[test]
fn builder_defaults_to_open_provider() {
    let store = MemoryStore::new();
    let client = ZkClientBuilder::new().connect(&store.anonymous()).unwrap();
    assert_eq!(client.acl_provider(), &AclProvider::Open);
    assert!(client.identity().is_anonymous());
    assert!(client.credentials_provider().credentials().is_empty());

    client
        .create("/security.json", b"{}", CreateMode::Persistent, true)
        .unwrap();
    assert_eq!(client.get_acl("/security.json").unwrap(), AclList::open());
}

#[test]
fn client_rejects_malformed_paths() {
    let store = MemoryStore::new();
    let client = ZkClientBuilder::new().connect(&store.anonymous()).unwrap();

    for bad in ["", "relative", "/trailing/", "/a//b", "/a/./b"] {
        assert!(
            matches!(
                client.create(bad, b"", CreateMode::Persistent, false),
                Err(ZkError::BadArguments(_))
            ),
            "{bad:?} should be rejected"
        );
        assert!(matches!(client.exists(bad), Err(ZkError::BadArguments(_))));
    }
}

#[test]
fn create_returns_path_and_stores_data() {
    let store = MemoryStore::new();
    let client = ZkClientBuilder::new().connect(&store.anonymous()).unwrap();

    let created = client
        .create("/node", b"payload", CreateMode::Ephemeral, false)
        .unwrap();
    assert_eq!(created, path("/node"));
    assert_eq!(client.get_data("/node").unwrap().as_ref(), b"payload");
    assert_eq!(client.stat("/node").unwrap().unwrap().mode, CreateMode::Ephemeral);
}

#[test]
fn make_path_creates_ancestors_with_open_acl() {
    let store = MemoryStore::new();
    let client = ZkClientBuilder::new()
        .with_acl_provider(AclProvider::sasl_restricted())
        .connect(&store.kerberos("solr"))
        .unwrap();

    client
        .make_path("/a/b/c", b"leaf", CreateMode::Persistent, true)
        .unwrap();

    for ancestor in ["/a", "/a/b"] {
        assert_eq!(client.get_acl(ancestor).unwrap(), AclList::open());
        assert!(client.get_data(ancestor).unwrap().is_empty());
        assert_eq!(
            client.stat(ancestor).unwrap().unwrap().mode,
            CreateMode::Persistent
        );
    }
    let leaf = client.get_acl("/a/b/c").unwrap();
    assert_eq!(leaf.perms_for(Scheme::World, ""), Perms::READ);
    assert_eq!(leaf.perms_for(Scheme::Sasl, "solr"), Perms::ALL);
}

#[test]
fn make_path_existing_terminal() {
    let store = MemoryStore::new();
    let client = ZkClientBuilder::new().connect(&store.anonymous()).unwrap();
    client
        .make_path("/x/y", b"first", CreateMode::Persistent, false)
        .unwrap();

    client
        .make_path("/x/y", b"second", CreateMode::Persistent, false)
        .unwrap();
    assert_eq!(client.get_data("/x/y").unwrap().as_ref(), b"first");

    let err = client
        .make_path_with("/x/y", b"third", CreateMode::Persistent, false, true)
        .unwrap_err();
    assert_eq!(err, ZkError::NodeExists { path: path("/x/y") });

    client.make_path("/", b"", CreateMode::Persistent, false).unwrap();
    assert!(
        client
            .make_path_with("/", b"", CreateMode::Persistent, false, true)
            .unwrap_err()
            .is_node_exists()
    );
}

#[test]
fn make_path_skips_existing_protected_ancestor() {
    let store = MemoryStore::new();
    let owner = ZkClientBuilder::new()
        .with_acl_provider(AclProvider::sasl_restricted())
        .connect(&store.kerberos("solr"))
        .unwrap();
    owner.make_path("/p", b"", CreateMode::Persistent, true).unwrap();
    owner.make_path("/p/q", b"", CreateMode::Persistent, false).unwrap();

    // /p/q exists, so it is not re-created under the protected /p.
    let guest = ZkClientBuilder::new().connect(&store.anonymous()).unwrap();
    guest
        .make_path("/p/q/r", b"", CreateMode::Persistent, false)
        .unwrap();
    assert!(guest.exists("/p/q/r").unwrap());
}

#[test]
fn make_path_existing_node_under_protected_parent() {
    let store = MemoryStore::new();
    let owner = ZkClientBuilder::new()
        .with_acl_provider(AclProvider::sasl_restricted())
        .connect(&store.kerberos("solr"))
        .unwrap();
    owner.make_path("/protected", b"", CreateMode::Persistent, true).unwrap();
    owner
        .make_path("/protected/child", b"", CreateMode::Persistent, false)
        .unwrap();

    // The guest lacks CREATE on /protected but the terminal already exists.
    let guest = ZkClientBuilder::new().connect(&store.anonymous()).unwrap();
    guest
        .make_path("/protected/child", b"", CreateMode::Persistent, false)
        .unwrap();
    let err = guest
        .make_path_with("/protected/child", b"", CreateMode::Persistent, false, true)
        .unwrap_err();
    assert!(err.is_node_exists());
    guest
        .make_path("/protected/child/deeper", b"", CreateMode::Persistent, false)
        .unwrap();
    assert!(guest.exists("/protected/child/deeper").unwrap());

    // A node that does not exist yet still needs CREATE on its parent.
    let err = guest
        .make_path("/protected/other", b"", CreateMode::Persistent, false)
        .unwrap_err();
    assert!(err.is_no_auth());
}

#[test]
fn clean_removes_subtree() {
    let store = MemoryStore::new();
    let client = ZkClientBuilder::new().connect(&store.anonymous()).unwrap();
    for p in ["/t/a/1", "/t/a/2", "/t/b", "/keep"] {
        client.make_path(p, b"", CreateMode::Persistent, false).unwrap();
    }

    client.clean("/t").unwrap();
    assert!(!client.exists("/t").unwrap());
    assert!(client.exists("/keep").unwrap());
    client.clean("/t").unwrap();

    client.clean("/").unwrap();
    assert!(client.get_children("/").unwrap().is_empty());
    assert_eq!(store.node_count().unwrap(), 1);
}

#[test]
fn clean_stops_at_protected_nodes() {
    let store = MemoryStore::new();
    let owner = ZkClientBuilder::new()
        .with_acl_provider(AclProvider::sasl_restricted())
        .connect(&store.kerberos("solr"))
        .unwrap();
    owner.make_path("/t", b"", CreateMode::Persistent, false).unwrap();
    owner
        .create("/t/locked", b"", CreateMode::Persistent, true)
        .unwrap();
    owner
        .create("/t/locked/inner", b"", CreateMode::Persistent, false)
        .unwrap();

    let guest = ZkClientBuilder::new().connect(&store.anonymous()).unwrap();
    let err = guest.clean("/t").unwrap_err();
    assert_eq!(
        err,
        ZkError::NoAuth {
            path: path("/t/locked/inner"),
            required: Permission::Delete,
        }
    );
    assert!(guest.exists("/t/locked/inner").unwrap());

    owner.clean("/t").unwrap();
    assert!(!owner.exists("/t").unwrap());
}

#[test]
fn close_is_idempotent_and_blocks_operations() {
    let store = MemoryStore::new();
    let client = ZkClientBuilder::new().connect(&store.anonymous()).unwrap();
    client.close().unwrap();
    client.close().unwrap();
    assert!(client.is_closed());
    assert!(client.session().is_closed());
    assert_eq!(client.exists("/").unwrap_err(), ZkError::SessionClosed);
    assert_eq!(
        client
            .make_path("/a", b"", CreateMode::Persistent, false)
            .unwrap_err(),
        ZkError::SessionClosed
    );
}

#[test]
fn drop_closes_session() {
    let store = MemoryStore::new();
    let session = Arc::new(store.anonymous().connect(&[]).unwrap());
    let client = ZkClient::from_session(Arc::clone(&session), AclProvider::Open);
    assert!(!session.is_closed());
    drop(client);
    assert!(session.is_closed());
}

#[test]
fn digest_client_connects_with_its_credentials() {
    let store = MemoryStore::new();
    let admin = DigestCredentialsProvider::new("admin", "secret").unwrap();
    let client = ZkClientBuilder::new()
        .with_acl_provider(AclProvider::digest_restricted(&admin))
        .with_credentials_provider(admin.clone())
        .connect(&store.anonymous())
        .unwrap();

    assert_eq!(client.identity(), &SessionIdentity::digest("admin"));
    assert_eq!(client.credentials_provider().credentials().len(), 1);
    client
        .create("/security.json", b"{}", CreateMode::Persistent, false)
        .unwrap();
    client.set_data("/security.json", b"{\"v\":2}").unwrap();
    assert_eq!(
        client.get_acl("/security.json").unwrap().perms_for(Scheme::Digest, &admin.digest_id()),
        Perms::ALL
    );
}

#[test]
fn client_debug_hides_passwords() {
    let store = MemoryStore::new();
    let admin = DigestCredentialsProvider::new("admin", "hunter2").unwrap();
    let client = ZkClientBuilder::new()
        .with_credentials_provider(admin)
        .connect(&store.anonymous())
        .unwrap();
    let debug = format!("{client:?}");
    assert!(debug.contains("admin"));
    assert!(!debug.contains("hunter2"));
}

#[test]
fn error_paths() {
    let err = ZkError::NoAuth {
        path: path("/a"),
        required: Permission::Write,
    };
    assert_eq!(err.path(), Some(&path("/a")));
    assert!(!err.is_retryable());
    assert_eq!(ZkError::ConnectionLoss.path(), None);

    let from_path: ZkError = NodePath::parse("nope").unwrap_err().into();
    assert!(matches!(from_path, ZkError::BadArguments(_)));
}
