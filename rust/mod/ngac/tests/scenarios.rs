use std::collections::BTreeSet;
use std::sync::Arc;

use blossom_core::ServiceConfig;
use blossom_kv::{KVStore, MemoryStore, RedbStore};

use ngac::differ::diff;
use ngac::model::operations::admin;
use ngac::model::{
    EventPattern, Graph, Node, NodeKind, Obligation, Operations, SubjectMatcher,
};
use ngac::{Command, EventContext, NgacError, NgacService, PolicyStore};

const ADMIN: &str = "Org1 Admin:Org1MSP";

fn root_store() -> PolicyStore {
    let mut g = Graph::new();
    for (name, kind) in [
        ("root", NodeKind::PolicyClass),
        ("creators", NodeKind::UserAttribute),
        ("others", NodeKind::UserAttribute),
        ("carol", NodeKind::User),
        ("dave", NodeKind::User),
    ] {
        g.create_node(Node::new(name, kind)).unwrap();
    }
    g.assign("creators", "root").unwrap();
    g.assign("others", "root").unwrap();
    g.assign("carol", "creators").unwrap();
    g.assign("dave", "others").unwrap();
    g.associate("creators", "root", Operations::from_iter([admin::CREATE_NODE]))
        .unwrap();
    PolicyStore::new(g)
}

#[test]
fn test_create_under_root_needs_create_node() {
    let mut store = root_store();
    let create = Command::CreateNode {
        node: Node::new("ua1", NodeKind::UserAttribute),
        parents: BTreeSet::from(["root".to_string()]),
    };

    let err = store
        .apply_as_principal("dave", std::slice::from_ref(&create))
        .unwrap_err();
    assert!(matches!(err, NgacError::AccessDenied(_)));
    assert!(!store.graph.contains("ua1"));

    store.apply_as_principal("carol", &[create]).unwrap();
    assert!(store.graph.has_assignment("ua1", "root"));
}

#[test]
fn test_dissociate_revokes_listing() {
    let mut g = Graph::new();
    g.create_node(Node::new("pc", NodeKind::PolicyClass)).unwrap();
    g.create_node(Node::new("admin", NodeKind::UserAttribute)).unwrap();
    g.create_node(Node::new("assets", NodeKind::ObjectAttribute)).unwrap();
    g.create_node(Node::new("alice", NodeKind::User)).unwrap();
    g.assign("admin", "pc").unwrap();
    g.assign("assets", "pc").unwrap();
    g.associate("admin", "assets", Operations::from_iter(["view"])).unwrap();
    g.assign("alice", "admin").unwrap();

    let mut store = PolicyStore::new(g);
    assert_eq!(
        store.decider().list_permissions("alice", "assets").unwrap(),
        Operations::from_iter(["view"])
    );

    store
        .apply_as_system(&[Command::Dissociate {
            subject: "admin".into(),
            target: "assets".into(),
        }])
        .unwrap();
    assert!(store
        .decider()
        .list_permissions("alice", "assets")
        .unwrap()
        .is_empty());
}

#[test]
fn test_status_event_promotes_account() {
    let mut g = Graph::new();
    for (name, kind) in [
        ("Status", NodeKind::PolicyClass),
        ("active", NodeKind::UserAttribute),
        ("pending", NodeKind::UserAttribute),
        ("Account_UA", NodeKind::UserAttribute),
        ("member", NodeKind::User),
        ("records", NodeKind::ObjectAttribute),
        ("ledger", NodeKind::Object),
    ] {
        g.create_node(Node::new(name, kind)).unwrap();
    }
    g.assign("active", "Status").unwrap();
    g.assign("pending", "Status").unwrap();
    g.assign("Account_UA", "pending").unwrap();
    g.assign("member", "Account_UA").unwrap();
    g.assign("records", "Status").unwrap();
    g.assign("ledger", "records").unwrap();
    g.associate("pending", "records", Operations::from_iter(["view"])).unwrap();
    g.associate("active", "records", Operations::from_iter(["view", "edit"]))
        .unwrap();

    let mut store = PolicyStore::new(g);
    store
        .add_obligation(Obligation {
            name: "set_account_active".into(),
            trigger: EventPattern {
                subject: SubjectMatcher::Any,
                event: "set_account_active".into(),
                args: vec![],
            },
            response: vec![
                Command::Deassign {
                    child: "Account_UA".into(),
                    parent: "pending".into(),
                },
                Command::Assign {
                    child: "Account_UA".into(),
                    parent: "active".into(),
                },
            ],
        })
        .unwrap();

    assert!(!store.decider().decide("member", "ledger", "edit").unwrap());

    // The raising principal holds nothing at all.
    let fired = store
        .process_event(&EventContext::new("stranger", "set_account_active"))
        .unwrap();
    assert_eq!(fired, vec!["set_account_active"]);
    assert!(store.decider().decide("member", "ledger", "edit").unwrap());
}

#[test]
fn test_escalation_attempt_leaves_store_untouched() {
    let svc = NgacService::new(Arc::new(MemoryStore::new()), ServiceConfig::default());
    svc.init(ADMIN).unwrap();
    let before = svc.graph("blossom").unwrap();

    // A stranger tries to grant themselves everything on RBAC_OA.
    let mut proposed = before.clone();
    proposed
        .create_node(Node::new("mallory_UA", NodeKind::UserAttribute))
        .unwrap();
    proposed.assign("mallory_UA", "RBAC_UA").unwrap();
    proposed
        .associate("mallory_UA", "RBAC_OA", Operations::all())
        .unwrap();

    let err = svc
        .update_graph("blossom", "mallory:Org9MSP", &proposed)
        .unwrap_err();
    assert!(matches!(err, NgacError::AccessDenied(_)));
    assert_eq!(svc.graph("blossom").unwrap(), before);

    // The same change by the administrator is a dependent batch: the
    // association needs a node that only the batch creates.
    let err = svc.update_graph("blossom", ADMIN, &proposed).unwrap_err();
    assert!(matches!(err, NgacError::AccessDenied(_)));
    assert_eq!(svc.graph("blossom").unwrap(), before);
}

#[test]
fn test_applied_diff_reaches_proposed_graph() {
    let mut store = PolicyStore::new(Graph::new());
    let ledger = store.graph.clone();

    let mut proposed = Graph::new();
    for (name, kind) in [
        ("pc", NodeKind::PolicyClass),
        ("ua", NodeKind::UserAttribute),
        ("u", NodeKind::User),
        ("oa", NodeKind::ObjectAttribute),
        ("o", NodeKind::Object),
    ] {
        proposed.create_node(Node::new(name, kind)).unwrap();
    }
    proposed.assign("ua", "pc").unwrap();
    proposed.assign("u", "ua").unwrap();
    proposed.assign("oa", "pc").unwrap();
    proposed.assign("o", "oa").unwrap();
    proposed
        .associate("ua", "oa", Operations::from_iter(["read"]))
        .unwrap();

    let commands = diff(&ledger, &proposed);
    store.apply_as_system(&commands).unwrap();
    assert_eq!(store.graph, proposed);
    assert!(diff(&store.graph, &proposed).is_empty());

    // And back again.
    store.apply_as_system(&diff(&proposed, &ledger)).unwrap();
    assert_eq!(store.graph, ledger);
}

#[test]
fn test_associate_never_removes_permissions() {
    let mut store = root_store();
    store
        .graph
        .create_node(Node::new("files", NodeKind::ObjectAttribute))
        .unwrap();
    store.graph.assign("files", "root").unwrap();

    // carol already holds "create node" on files through root.
    let steps: [(&str, &str, Operations); 6] = [
        ("creators", "files", Operations::from_iter(["read"])),
        ("creators", "root", Operations::from_iter(["write"])),
        ("others", "files", Operations::from_iter(["delete"])),
        ("creators", "files", Operations::new()),
        ("creators", "files", Operations::from_iter(["write"])),
        ("creators", "root", Operations::all()),
    ];

    let mut before = store.decider().list_permissions("carol", "files").unwrap();
    assert!(before.allows(admin::CREATE_NODE));
    for (subject, target, operations) in steps {
        store
            .apply_as_system(&[Command::Associate {
                subject: subject.into(),
                target: target.into(),
                operations: operations.clone(),
            }])
            .unwrap();
        let after = store.decider().list_permissions("carol", "files").unwrap();
        for op in before.iter() {
            assert!(after.allows(op), "{subject} -> {target} dropped {op}");
        }
        before = after;
    }

    assert!(before.allows("read"));
    assert!(before.allows("write"));
    assert!(before.contains("*"));
}

#[test]
fn test_update_deleting_attribute_skips_cascaded_edges() {
    let mut g = Graph::new();
    for (name, kind) in [
        ("root", NodeKind::PolicyClass),
        ("admins", NodeKind::UserAttribute),
        ("keepers", NodeKind::UserAttribute),
        ("staff", NodeKind::UserAttribute),
        ("admin", NodeKind::User),
        ("keeper", NodeKind::User),
        ("files", NodeKind::ObjectAttribute),
        ("archive", NodeKind::ObjectAttribute),
        ("doc", NodeKind::Object),
    ] {
        g.create_node(Node::new(name, kind)).unwrap();
    }
    for (child, parent) in [
        ("admins", "root"),
        ("keepers", "root"),
        ("staff", "root"),
        ("admin", "admins"),
        ("keeper", "keepers"),
        ("files", "root"),
        ("archive", "root"),
        ("doc", "files"),
    ] {
        g.assign(child, parent).unwrap();
    }
    g.associate("admins", "root", Operations::all()).unwrap();
    g.associate("staff", "files", Operations::from_iter(["read"]))
        .unwrap();
    // Everything the batch needs except "deassign from" on root.
    g.associate("keepers", "files", Operations::all()).unwrap();
    g.associate("keepers", "archive", Operations::all()).unwrap();
    for subject in ["staff", "keepers"] {
        g.associate("keepers", subject, Operations::from_iter([admin::DISSOCIATE]))
            .unwrap();
    }

    // Move doc into archive and drop files.
    let mut proposed = g.clone();
    proposed.assign("doc", "archive").unwrap();
    proposed.delete_node("files").unwrap();

    let mut store = PolicyStore::new(g.clone());
    let commands = diff(&store.graph, &proposed);
    assert_eq!(commands.first(), Some(&Command::DeleteNode { name: "files".into() }));
    assert!(commands.contains(&Command::Assign {
        child: "doc".into(),
        parent: "archive".into(),
    }));
    assert!(commands.contains(&Command::Deassign {
        child: "doc".into(),
        parent: "files".into(),
    }));
    assert!(commands.contains(&Command::Dissociate {
        subject: "staff".into(),
        target: "files".into(),
    }));
    // The deleted node's own parent edge goes with the delete.
    assert!(!commands.contains(&Command::Deassign {
        child: "files".into(),
        parent: "root".into(),
    }));

    let err = store.update_graph("keeper", &proposed).unwrap_err();
    assert!(matches!(err, NgacError::AccessDenied(_)));
    assert_eq!(store.graph, g);

    let applied = store.update_graph("admin", &proposed).unwrap();
    assert_eq!(applied, commands);
    assert_eq!(store.graph, proposed);
    assert!(!store.graph.has_association("staff", "files"));
    assert!(store.graph.has_assignment("doc", "archive"));
}

#[test]
fn test_policy_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ngac.redb");

    let graph = {
        let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&path).unwrap());
        let svc = NgacService::new(kv, ServiceConfig::default());
        svc.init(ADMIN).unwrap();
        svc.graph("blossom").unwrap()
    };

    let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&path).unwrap());
    let svc = NgacService::new(kv, ServiceConfig::default());
    assert_eq!(svc.graph("blossom").unwrap(), graph);
    assert!(svc.decide("blossom", ADMIN, "blossom", "init_blossom").unwrap());
    assert!(matches!(svc.init(ADMIN), Err(NgacError::DuplicateName(_))));
}
