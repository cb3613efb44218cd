use std::collections::BTreeMap;

use tracing::info;

use crate::command::Command;
use crate::error::NgacError;
use crate::model::operations::resource::{REMOVE_ACCOUNT, UPDATE_ACCOUNT_STATUS};
use crate::model::{
    Account, AccountStatus, Graph, Node, NodeKind, Operations, Prohibition, StatusTier,
};
use crate::pap::create_in;
use crate::pap::naming::{self, dac, rbac, status};
use crate::policy_store::apply_batch;

/// Add an account to the graph.
///
/// Creates the three role holders, the account's user attribute (in DAC and
/// under `pending`), its object attribute, info object and assets container,
/// and grants the account `*` on its own object attribute.
pub fn request_account(graph: &mut Graph, account: &Account) -> Result<(), NgacError> {
    validate(account)?;

    let users = [
        (&account.users.system_owner, rbac::SYSTEM_OWNER),
        (&account.users.acquisition_specialist, rbac::ACQUISITION_SPECIALIST),
        (&account.users.system_administrator, rbac::SYSTEM_ADMINISTRATOR),
    ];

    let account_ua = naming::account_ua(&account.name);
    let account_oa = naming::account_oa(&account.name);
    let info = naming::account_info(&account.name);

    create_in(
        graph,
        &account_ua,
        NodeKind::UserAttribute,
        &[dac::UA, status::PENDING],
    )?;
    for (common_name, role) in users {
        let user = naming::username(common_name, &account.mspid);
        create_in(graph, &user, NodeKind::User, &[account_ua.as_str(), role])?;
    }

    create_in(graph, &account_oa, NodeKind::ObjectAttribute, &[dac::OA])?;
    graph.create_node(
        Node::new(&info, NodeKind::Object)
            .with_property("account", &account.name)
            .with_property("type", "account"),
    )?;
    for parent in [account_oa.as_str(), rbac::ACCOUNTS_OA, status::ACCOUNTS_OA] {
        graph.assign(&info, parent)?;
    }
    create_in(
        graph,
        &naming::account_assets_oa(&account.name),
        NodeKind::ObjectAttribute,
        &[account_oa.as_str()],
    )?;

    graph.associate(&account_ua, &account_oa, Operations::all())?;
    info!(account = %account.name, mspid = %account.mspid, "account requested");
    Ok(())
}

/// Keeps an account's own members from changing or removing the account,
/// which their `*` grant on the account object attribute would otherwise allow.
pub fn self_administration_prohibition(account: &str) -> Prohibition {
    Prohibition {
        name: format!("{} self-administration", account),
        subject: naming::account_ua(account),
        target: naming::account_info(account),
        operations: Operations::from_iter([UPDATE_ACCOUNT_STATUS, REMOVE_ACCOUNT]),
    }
}

/// Whether the account's user attribute currently sits under `active`.
pub fn is_active(graph: &Graph, account: &str) -> Result<bool, NgacError> {
    Ok(graph
        .parents(&naming::account_ua(account))?
        .contains(status::ACTIVE))
}

fn validate(account: &Account) -> Result<(), NgacError> {
    if account.name.is_empty() {
        return Err(NgacError::Validation("account name is required".into()));
    }
    if account.mspid.is_empty() {
        return Err(NgacError::Validation("account mspid is required".into()));
    }
    for (role, user) in [
        ("system owner", &account.users.system_owner),
        ("acquisition specialist", &account.users.acquisition_specialist),
        ("system administrator", &account.users.system_administrator),
    ] {
        if user.is_empty() {
            return Err(NgacError::Validation(format!("request missing {}", role)));
        }
    }
    Ok(())
}

/// Commands moving `account_ua` into `tier`.
///
/// Deassigns are no-ops when the edge is already gone, so a transition can
/// be replayed safely.
pub fn status_transition(account_ua: &str, tier: StatusTier) -> Vec<Command> {
    let assign = |parent: &str| Command::Assign {
        child: account_ua.to_string(),
        parent: parent.to_string(),
    };
    let deassign = |parent: &str| Command::Deassign {
        child: account_ua.to_string(),
        parent: parent.to_string(),
    };

    match tier {
        StatusTier::Active => vec![
            deassign(status::PENDING),
            deassign(status::INACTIVE),
            assign(status::ACTIVE),
        ],
        StatusTier::Pending => vec![
            assign(status::PENDING),
            deassign(status::INACTIVE),
            deassign(status::ACTIVE),
        ],
        StatusTier::Inactive => vec![
            deassign(status::PENDING),
            assign(status::INACTIVE),
            deassign(status::ACTIVE),
        ],
    }
}

/// Move an account into the status attribute matching `new_status`.
pub fn update_account_status(
    graph: &mut Graph,
    account: &str,
    new_status: AccountStatus,
) -> Result<(), NgacError> {
    let commands = status_transition(&naming::account_ua(account), new_status.tier());
    apply_batch(graph, &commands)
}

/// Names of every account, found by the info objects' `type=account` property.
pub fn find_accounts(graph: &Graph) -> Vec<String> {
    let filter = BTreeMap::from([("type".to_string(), "account".to_string())]);
    graph
        .find_nodes(Some(NodeKind::Object), &filter)
        .into_iter()
        .filter_map(|n| n.properties.get("account").cloned())
        .collect()
}
