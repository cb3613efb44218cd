use tracing::info;

use crate::error::NgacError;
use crate::model::{Asset, Graph, NodeKind};
use crate::pap::create_in;
use crate::pap::naming::{self, dac, rbac, status};

/// Add an asset: an object attribute holding one object per license, placed
/// in the RBAC, DAC and Status asset containers.
pub fn onboard_asset(graph: &mut Graph, asset: &Asset) -> Result<(), NgacError> {
    if asset.id.is_empty() {
        return Err(NgacError::Validation("asset id is required".into()));
    }

    let asset_oa = naming::asset_oa(&asset.id);
    create_in(
        graph,
        &asset_oa,
        NodeKind::ObjectAttribute,
        &[rbac::ASSETS_OA, dac::ASSETS_OA, status::ASSETS_OA],
    )?;
    for license in &asset.licenses {
        create_in(
            graph,
            &naming::license_object(&asset.id, license),
            NodeKind::Object,
            &[asset_oa.as_str()],
        )?;
    }

    info!(asset = %asset.id, licenses = asset.licenses.len(), "asset onboarded");
    Ok(())
}

/// Remove an asset's license objects, then the asset itself.
pub fn offboard_asset(graph: &mut Graph, asset_id: &str) -> Result<(), NgacError> {
    let asset_oa = naming::asset_oa(asset_id);
    let licenses: Vec<String> = graph.children(&asset_oa)?.iter().cloned().collect();
    for license in &licenses {
        graph.delete_node(license)?;
    }
    graph.delete_node(&asset_oa)?;

    info!(asset = asset_id, licenses = licenses.len(), "asset offboarded");
    Ok(())
}

/// Place license objects in the account's object attribute.
pub fn checkout(
    graph: &mut Graph,
    account: &str,
    asset_id: &str,
    licenses: &[String],
) -> Result<(), NgacError> {
    let account_oa = naming::account_oa(account);
    for license in licenses {
        graph.assign(&naming::license_object(asset_id, license), &account_oa)?;
    }
    Ok(())
}

/// Take license objects back out of the account's object attribute.
pub fn checkin(
    graph: &mut Graph,
    account: &str,
    asset_id: &str,
    licenses: &[String],
) -> Result<(), NgacError> {
    let account_oa = naming::account_oa(account);
    for license in licenses {
        graph.deassign(&naming::license_object(asset_id, license), &account_oa)?;
    }
    Ok(())
}
