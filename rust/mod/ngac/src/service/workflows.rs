use tracing::{info, warn};

use crate::epp::EventContext;
use crate::error::NgacError;
use crate::model::operations::resource::*;
use crate::model::{Account, AccountStatus, Asset, SwidReport};
use crate::pap::naming::{self, rbac};
use crate::pap::policy::{event_for_tier, ARG_ACCOUNT_NAME};
use crate::pap::{account, asset, swid};
use crate::policy_store::PolicyStore;

use super::NgacService;

impl NgacService {
    /// Register a new account in the pending tier. Open to any principal.
    pub fn request_account(&self, principal: &str, request: &Account) -> Result<(), NgacError> {
        self.transact(&self.config.shared_partition, |store| {
            account::request_account(&mut store.graph, request)?;
            store.add_prohibition(account::self_administration_prohibition(&request.name))
        })?;
        info!(principal, account = %request.name, "account request stored");
        Ok(())
    }

    /// Names of the accounts `principal` may view.
    pub fn list_accounts(&self, principal: &str) -> Result<Vec<String>, NgacError> {
        let store = self.load(&self.config.shared_partition)?;
        if !store.graph.contains(principal) {
            return Ok(Vec::new());
        }
        let decider = store.decider();
        let mut visible = Vec::new();
        for name in account::find_accounts(&store.graph) {
            if decider.decide(principal, &naming::account_info(&name), VIEW_ACCOUNT)? {
                visible.push(name);
            }
        }
        Ok(visible)
    }

    /// Move an account to `status` by raising the matching status event.
    pub fn update_account_status(
        &self,
        principal: &str,
        account_name: &str,
        status: AccountStatus,
    ) -> Result<(), NgacError> {
        self.transact(&self.config.shared_partition, |store| {
            let info = naming::account_info(account_name);
            Self::authorize(store, principal, &info, UPDATE_ACCOUNT_STATUS)?;

            let ctx = EventContext::new(principal, event_for_tier(status.tier()))
                .with_arg(ARG_ACCOUNT_NAME, account_name);
            let fired = store.process_event(&ctx)?;
            if fired.is_empty() {
                warn!(account = account_name, "no status obligation installed, moving directly");
                account::update_account_status(&mut store.graph, account_name, status)?;
            }
            Ok(())
        })?;
        info!(principal, account = account_name, ?status, "account status updated");
        Ok(())
    }

    pub fn onboard_asset(&self, principal: &str, new_asset: &Asset) -> Result<(), NgacError> {
        self.transact(&self.config.shared_partition, |store| {
            Self::authorize(store, principal, rbac::ASSETS_OA, ONBOARD_ASSET)?;
            asset::onboard_asset(&mut store.graph, new_asset)
        })
    }

    pub fn offboard_asset(&self, principal: &str, asset_id: &str) -> Result<(), NgacError> {
        self.transact(&self.config.shared_partition, |store| {
            Self::authorize(store, principal, &naming::asset_oa(asset_id), OFFBOARD_ASSET)?;
            asset::offboard_asset(&mut store.graph, asset_id)
        })
    }

    /// Check licenses of an asset out to the principal's account.
    /// The account must be active.
    pub fn checkout(
        &self,
        principal: &str,
        account_name: &str,
        asset_id: &str,
        licenses: &[String],
    ) -> Result<(), NgacError> {
        self.transact(&self.config.shared_partition, |store| {
            Self::authorize(store, principal, &naming::asset_oa(asset_id), CHECKOUT)?;
            require_member(store, principal, account_name)?;
            require_active(store, account_name)?;
            asset::checkout(&mut store.graph, account_name, asset_id, licenses)
        })?;
        info!(
            principal,
            account = account_name,
            asset = asset_id,
            licenses = licenses.len(),
            "licenses checked out"
        );
        Ok(())
    }

    /// Return licenses. Inactive accounts may still check in.
    pub fn checkin(
        &self,
        principal: &str,
        account_name: &str,
        asset_id: &str,
        licenses: &[String],
    ) -> Result<(), NgacError> {
        self.transact(&self.config.shared_partition, |store| {
            Self::authorize(store, principal, &naming::asset_oa(asset_id), CHECKIN)?;
            require_member(store, principal, account_name)?;
            asset::checkin(&mut store.graph, account_name, asset_id, licenses)
        })?;
        info!(
            principal,
            account = account_name,
            asset = asset_id,
            licenses = licenses.len(),
            "licenses checked in"
        );
        Ok(())
    }

    pub fn report_swid(&self, principal: &str, report: &SwidReport) -> Result<(), NgacError> {
        self.transact(&self.config.shared_partition, |store| {
            let license = naming::license_object(&report.asset_id, &report.license);
            Self::authorize(store, principal, &license, REPORT_SWID)?;
            require_member(store, principal, &report.account)?;
            require_active(store, &report.account)?;
            swid::report_swid(&mut store.graph, report)
        })
    }
}

fn require_member(
    store: &PolicyStore,
    principal: &str,
    account_name: &str,
) -> Result<(), NgacError> {
    let account_ua = naming::account_ua(account_name);
    if !store.graph.contains(&account_ua) {
        return Err(NgacError::NotFound(format!("account {:?}", account_name)));
    }
    if !store.graph.ascendants(principal)?.contains(&account_ua) {
        return Err(NgacError::AccessDenied(format!(
            "{:?} is not a member of account {:?}",
            principal, account_name
        )));
    }
    Ok(())
}

fn require_active(store: &PolicyStore, account_name: &str) -> Result<(), NgacError> {
    if account::is_active(&store.graph, account_name)? {
        Ok(())
    } else {
        Err(NgacError::AccessDenied(format!(
            "account {:?} is not active",
            account_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use blossom_core::ServiceConfig;
    use blossom_kv::MemoryStore;

    use super::*;
    use crate::model::AccountUsers;
    use crate::pap::naming::status;

    const ADMIN: &str = "Org1 Admin:Org1MSP";
    const OWNER: &str = "owen:Org2MSP";
    const SYSADMIN: &str = "sally:Org2MSP";

    fn service() -> Arc<NgacService> {
        let svc = NgacService::new(Arc::new(MemoryStore::new()), ServiceConfig::default());
        svc.init(ADMIN).unwrap();
        svc.request_account(
            "anyone",
            &Account {
                name: "acme".into(),
                mspid: "Org2MSP".into(),
                users: AccountUsers {
                    system_owner: "owen".into(),
                    system_administrator: "sally".into(),
                    acquisition_specialist: "aqua".into(),
                },
            },
        )
        .unwrap();
        svc.onboard_asset(
            ADMIN,
            &Asset {
                id: "office".into(),
                licenses: vec!["k1".into(), "k2".into()],
            },
        )
        .unwrap();
        svc
    }

    #[test]
    fn test_account_cannot_approve_itself() {
        let svc = service();
        let err = svc
            .update_account_status(OWNER, "acme", AccountStatus::Approved)
            .unwrap_err();
        assert!(matches!(err, NgacError::AccessDenied(_)));
        let graph = svc.graph("blossom").unwrap();
        assert!(graph.has_assignment("acme_UA", status::PENDING));
    }

    #[test]
    fn test_admin_approves_account() {
        let svc = service();
        svc.update_account_status(ADMIN, "acme", AccountStatus::Approved)
            .unwrap();
        let graph = svc.graph("blossom").unwrap();
        assert!(graph.has_assignment("acme_UA", status::ACTIVE));
        assert!(!graph.has_assignment("acme_UA", status::PENDING));

        assert!(matches!(
            svc.update_account_status(ADMIN, "ghost", AccountStatus::Approved),
            Err(NgacError::NotFound(_))
        ));
    }

    #[test]
    fn test_checkout_requires_active_account() {
        let svc = service();
        let keys = vec!["k1".to_string()];
        let err = svc.checkout(SYSADMIN, "acme", "office", &keys).unwrap_err();
        assert!(matches!(err, NgacError::AccessDenied(m) if m.contains("not active")));

        svc.update_account_status(ADMIN, "acme", AccountStatus::Approved)
            .unwrap();
        svc.checkout(SYSADMIN, "acme", "office", &keys).unwrap();
        assert!(svc
            .graph("blossom")
            .unwrap()
            .has_assignment("office:k1", "acme_OA"));

        // Going inactive does not block returning licenses.
        svc.update_account_status(ADMIN, "acme", AccountStatus::InactiveSecurityRisk)
            .unwrap();
        svc.checkin(SYSADMIN, "acme", "office", &keys).unwrap();
        assert!(!svc
            .graph("blossom")
            .unwrap()
            .has_assignment("office:k1", "acme_OA"));
    }

    #[test]
    fn test_checkout_only_for_own_account() {
        let svc = service();
        svc.update_account_status(ADMIN, "acme", AccountStatus::Approved)
            .unwrap();
        let keys = vec!["k1".to_string()];
        assert!(matches!(
            svc.checkout(ADMIN, "acme", "office", &keys),
            Err(NgacError::AccessDenied(_))
        ));
        assert!(matches!(
            svc.checkout(SYSADMIN, "nobody", "office", &keys),
            Err(NgacError::NotFound(_))
        ));
    }

    #[test]
    fn test_onboard_and_offboard_need_permission() {
        let svc = service();
        let asset = Asset {
            id: "cad".into(),
            licenses: vec!["c1".into()],
        };
        assert!(matches!(
            svc.onboard_asset(OWNER, &asset),
            Err(NgacError::AccessDenied(_))
        ));
        svc.onboard_asset(ADMIN, &asset).unwrap();

        assert!(matches!(
            svc.offboard_asset(SYSADMIN, "cad"),
            Err(NgacError::AccessDenied(_))
        ));
        svc.offboard_asset(ADMIN, "cad").unwrap();
        assert!(!svc.graph("blossom").unwrap().contains("cad:c1"));
    }

    #[test]
    fn test_report_swid() {
        let svc = service();
        let report = SwidReport {
            primary_tag: "swid-1".into(),
            asset_id: "office".into(),
            license: "k2".into(),
            account: "acme".into(),
        };
        assert!(matches!(
            svc.report_swid(SYSADMIN, &report),
            Err(NgacError::AccessDenied(_))
        ));

        svc.update_account_status(ADMIN, "acme", AccountStatus::Approved)
            .unwrap();
        svc.report_swid(SYSADMIN, &report).unwrap();
        let graph = svc.graph("blossom").unwrap();
        assert!(graph.has_assignment("office:k2", "swid-1"));
        assert!(graph.has_assignment("swid-1", "acme_OA"));
    }

    #[test]
    fn test_list_accounts_filters_by_view() {
        let svc = service();
        assert_eq!(svc.list_accounts(ADMIN).unwrap(), vec!["acme"]);
        assert_eq!(svc.list_accounts(OWNER).unwrap(), vec!["acme"]);
        assert!(svc.list_accounts("stranger:Org7MSP").unwrap().is_empty());
    }
}
