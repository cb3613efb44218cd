use tracing::info;

use crate::error::NgacError;
use crate::model::{Graph, NodeKind, SwidReport};
use crate::pap::create_in;
use crate::pap::naming::{self, rbac, status};

/// Record a SwID tag: its object attribute sits in the SwIDs containers and
/// the reporting account, and holds the license it was reported against.
pub fn report_swid(graph: &mut Graph, report: &SwidReport) -> Result<(), NgacError> {
    if report.primary_tag.is_empty() {
        return Err(NgacError::Validation("swid primary tag is required".into()));
    }

    let swid_oa = naming::swid_oa(&report.primary_tag);
    let account_oa = naming::account_oa(&report.account);
    create_in(
        graph,
        &swid_oa,
        NodeKind::ObjectAttribute,
        &[rbac::SWIDS_OA, account_oa.as_str(), status::SWIDS_OA],
    )?;
    graph.assign(
        &naming::license_object(&report.asset_id, &report.license),
        &swid_oa,
    )?;

    info!(swid = %report.primary_tag, account = %report.account, "swid reported");
    Ok(())
}
