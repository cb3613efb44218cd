use tracing::info;

use crate::error::NgacError;
use crate::model::operations::resource::*;
use crate::model::{
    EventPattern, Graph, Node, NodeKind, Obligation, Operations, StatusTier, SubjectMatcher,
};
use crate::pap::account::status_transition;
use crate::pap::create_in;
use crate::pap::naming::{self, dac, rbac, status};
use crate::policy_store::PolicyStore;

pub const EVENT_SET_ACCOUNT_ACTIVE: &str = "set_account_active";
pub const EVENT_SET_ACCOUNT_PENDING: &str = "set_account_pending";
pub const EVENT_SET_ACCOUNT_INACTIVE: &str = "set_account_inactive";
pub const ARG_ACCOUNT_NAME: &str = "accountName";

/// A freshly configured partition: base policy plus default obligations.
pub fn base_store(admin: &str) -> Result<PolicyStore, NgacError> {
    let mut graph = Graph::new();
    configure(&mut graph, admin)?;

    let mut store = PolicyStore::new(graph);
    for obligation in default_obligations() {
        store.add_obligation(obligation)?;
    }
    Ok(store)
}

/// Build the super, RBAC, DAC and Status policies into an empty graph.
///
/// `admin` is the administrator's principal; it is placed under its own user
/// attribute, which receives `*` on the base attributes of every policy class.
pub fn configure(graph: &mut Graph, admin: &str) -> Result<(), NgacError> {
    let admin_ua = naming::user_attribute(admin);
    configure_super(graph, admin, &admin_ua)?;
    configure_rbac(graph, &admin_ua)?;
    configure_dac(graph, &admin_ua)?;
    configure_status(graph, &admin_ua)?;
    info!(admin, nodes = graph.len(), "base policy configured");
    Ok(())
}

fn configure_super(graph: &mut Graph, admin: &str, admin_ua: &str) -> Result<(), NgacError> {
    graph.create_node(Node::new(naming::BLOSSOM_PC, NodeKind::PolicyClass))?;
    create_in(graph, admin_ua, NodeKind::UserAttribute, &[naming::BLOSSOM_PC])?;
    create_in(graph, admin, NodeKind::User, &[admin_ua])?;
    create_in(graph, naming::BLOSSOM_OA, NodeKind::ObjectAttribute, &[naming::BLOSSOM_PC])?;
    create_in(graph, naming::BLOSSOM_OBJECT, NodeKind::Object, &[naming::BLOSSOM_OA])?;
    graph.associate(admin_ua, naming::BLOSSOM_OA, Operations::from_iter([INIT_BLOSSOM]))
}

fn configure_rbac(graph: &mut Graph, admin_ua: &str) -> Result<(), NgacError> {
    graph.create_node(Node::new(rbac::PC, NodeKind::PolicyClass))?;
    create_in(graph, rbac::UA, NodeKind::UserAttribute, &[rbac::PC])?;
    create_in(graph, rbac::OA, NodeKind::ObjectAttribute, &[rbac::PC])?;
    create_in(graph, rbac::ACCOUNTS_UA, NodeKind::UserAttribute, &[rbac::UA])?;
    graph.associate(admin_ua, rbac::UA, Operations::all())?;
    graph.associate(admin_ua, rbac::OA, Operations::all())?;

    for container in [rbac::ACCOUNTS_OA, rbac::ASSETS_OA, rbac::SWIDS_OA] {
        create_in(graph, container, NodeKind::ObjectAttribute, &[rbac::OA])?;
    }
    for role in [
        rbac::SYSTEM_OWNER,
        rbac::SYSTEM_ADMINISTRATOR,
        rbac::ACQUISITION_SPECIALIST,
    ] {
        create_in(graph, role, NodeKind::UserAttribute, &[rbac::UA])?;
    }

    // System owners manage their account; administrators run licenses;
    // acquisition specialists mostly look.
    graph.associate(
        rbac::SYSTEM_OWNER,
        rbac::ACCOUNTS_OA,
        Operations::from_iter([
            VIEW_ACCOUNT,
            VIEW_ACCOUNT_LICENSES,
            UPLOAD_ATO,
            VIEW_ATO,
            VIEW_MSPID,
            VIEW_USERS,
            VIEW_STATUS,
        ]),
    )?;
    graph.associate(
        rbac::SYSTEM_ADMINISTRATOR,
        rbac::ASSETS_OA,
        Operations::from_iter([VIEW_ASSET, CHECKOUT, CHECKIN, REPORT_SWID]),
    )?;
    graph.associate(
        rbac::SYSTEM_ADMINISTRATOR,
        rbac::ACCOUNTS_OA,
        Operations::from_iter([VIEW_ACCOUNT, VIEW_ACCOUNT_LICENSES]),
    )?;
    graph.associate(
        rbac::SYSTEM_ADMINISTRATOR,
        rbac::SWIDS_OA,
        Operations::from_iter([VIEW_SWID, REPORT_SWID]),
    )?;
    graph.associate(
        rbac::ACQUISITION_SPECIALIST,
        rbac::ASSETS_OA,
        Operations::from_iter([VIEW_ASSET]),
    )?;
    graph.associate(
        rbac::ACQUISITION_SPECIALIST,
        rbac::ACCOUNTS_OA,
        Operations::from_iter([VIEW_ACCOUNT_LICENSES, VIEW_ACCOUNT, VIEW_STATUS]),
    )?;
    graph.associate(
        rbac::ACQUISITION_SPECIALIST,
        rbac::SWIDS_OA,
        Operations::from_iter([VIEW_SWID]),
    )
}

fn configure_dac(graph: &mut Graph, admin_ua: &str) -> Result<(), NgacError> {
    graph.create_node(Node::new(dac::PC, NodeKind::PolicyClass))?;
    create_in(graph, dac::UA, NodeKind::UserAttribute, &[dac::PC])?;
    create_in(graph, dac::OA, NodeKind::ObjectAttribute, &[dac::PC])?;
    graph.associate(admin_ua, dac::UA, Operations::all())?;
    graph.associate(admin_ua, dac::OA, Operations::all())?;

    create_in(graph, dac::ASSETS_OA, NodeKind::ObjectAttribute, &[dac::OA])?;
    graph.associate(admin_ua, dac::ASSETS_OA, Operations::all())?;
    graph.associate(
        dac::UA,
        dac::ASSETS_OA,
        Operations::from_iter([VIEW_ASSET, CHECKOUT, CHECKIN]),
    )
}

fn configure_status(graph: &mut Graph, admin_ua: &str) -> Result<(), NgacError> {
    graph.create_node(Node::new(status::PC, NodeKind::PolicyClass))?;
    create_in(graph, status::UA, NodeKind::UserAttribute, &[status::PC])?;
    create_in(graph, status::OA, NodeKind::ObjectAttribute, &[status::PC])?;
    graph.associate(admin_ua, status::UA, Operations::all())?;
    graph.associate(admin_ua, status::OA, Operations::all())?;

    for container in [status::ACCOUNTS_OA, status::ASSETS_OA, status::SWIDS_OA] {
        create_in(graph, container, NodeKind::ObjectAttribute, &[status::OA])?;
    }

    create_in(graph, status::ACTIVE, NodeKind::UserAttribute, &[status::UA])?;
    create_in(graph, status::PENDING, NodeKind::UserAttribute, &[status::UA])?;
    // Inactive accounts keep exactly the pending grants.
    create_in(graph, status::INACTIVE, NodeKind::UserAttribute, &[status::PENDING])?;

    graph.associate(status::ACTIVE, status::ACCOUNTS_OA, Operations::all())?;
    graph.associate(
        status::PENDING,
        status::ACCOUNTS_OA,
        Operations::from_iter([
            VIEW_ACCOUNT,
            UPLOAD_ATO,
            VIEW_ATO,
            VIEW_MSPID,
            VIEW_USERS,
            VIEW_STATUS,
            VIEW_ACCOUNT_LICENSES,
        ]),
    )?;
    graph.associate(status::ACTIVE, status::ASSETS_OA, Operations::all())?;
    graph.associate(status::ACTIVE, status::SWIDS_OA, Operations::all())
}

/// Event raised when an account moves into `tier`.
pub fn event_for_tier(tier: StatusTier) -> &'static str {
    match tier {
        StatusTier::Active => EVENT_SET_ACCOUNT_ACTIVE,
        StatusTier::Pending => EVENT_SET_ACCOUNT_PENDING,
        StatusTier::Inactive => EVENT_SET_ACCOUNT_INACTIVE,
    }
}

/// Obligations moving an account's user attribute between status attributes,
/// raised by any principal with the `accountName` argument.
pub fn default_obligations() -> Vec<Obligation> {
    let template_ua = naming::account_ua(&format!("<{}>", ARG_ACCOUNT_NAME));
    [StatusTier::Active, StatusTier::Pending, StatusTier::Inactive]
        .into_iter()
        .map(|tier| {
            let event = event_for_tier(tier);
            Obligation {
                name: event.to_string(),
                trigger: EventPattern {
                    subject: SubjectMatcher::Any,
                    event: event.to_string(),
                    args: vec![ARG_ACCOUNT_NAME.to_string()],
                },
                response: status_transition(&template_ua, tier),
            }
        })
        .collect()
}
