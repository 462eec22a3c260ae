use pkg_types::Resource;

use crate::error::InfrastructureError;
use crate::store::ObjectStore;

/// Find an existing resource that conflicts with `candidate`.
///
/// Lists the candidate's kind in its namespace. On update, pass the
/// candidate's own name as `prior_name` so its stored revision is skipped.
/// Two concurrent creates may both come back clean; callers that need
/// strict uniqueness serialize admission and persistence themselves.
pub async fn check_unique<R, F>(
    store: &dyn ObjectStore,
    candidate: &R,
    prior_name: Option<&str>,
    conflicts: F,
) -> Result<Option<R>, InfrastructureError>
where
    R: Resource,
    F: Fn(&R, &R) -> bool,
{
    let namespace = &candidate.metadata().namespace;
    let existing = store
        .list(R::KIND, namespace)
        .await
        .map_err(|e| InfrastructureError {
            kind: R::KIND,
            namespace: namespace.clone(),
            source: e.into(),
        })?;

    Ok(existing
        .into_iter()
        .filter_map(R::from_any)
        .filter(|r| prior_name != Some(r.metadata().name.as_str()))
        .find(|r| conflicts(r, candidate)))
}
