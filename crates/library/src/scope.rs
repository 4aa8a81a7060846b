use crate::error::{ErrorKind, Result};
use lectio_corpus::{Catalog, UnitMeta};

/// Units a search or sample should cover, in catalog order.
///
/// Explicit unit ids win over a collection; with neither, the whole catalog is
/// in scope. Unknown ids and unknown collections are reported rather than
/// silently narrowing the scope to nothing.
pub(crate) fn resolve<'a>(
    catalog: &'a Catalog,
    collection: Option<&str>,
    unit_ids: Option<&[String]>,
) -> Result<Vec<&'a UnitMeta>> {
    if let Some(ids) = unit_ids.filter(|ids| !ids.is_empty()) {
        let unknown: Vec<&str> = ids.iter().map(String::as_str).filter(|id| !catalog.contains(id)).collect();
        if !unknown.is_empty() {
            exn::bail!(ErrorKind::NotFound(format!("units {}", unknown.join(", "))));
        }
        // Catalog order, not request order, and no duplicates.
        return Ok(catalog.units().iter().filter(|meta| ids.contains(&meta.id)).collect());
    }
    if let Some(collection) = collection {
        return match catalog.collection(collection) {
            Some(units) => Ok(units),
            None => exn::bail!(ErrorKind::NotFound(format!("collection {collection:?}"))),
        };
    }
    Ok(catalog.units().iter().collect())
}
