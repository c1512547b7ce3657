use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

lazy_static! {
    static ref CATALOG: RwLock<Option<Arc<HashMap<i64, String>>>> = RwLock::new(None);
}

/// Installs the vehicle catalog, a map from the client's `typeCompDescr`
/// vehicle descriptor to a short display name.
///
/// The catalog is process wide. The first install wins and the table is
/// read only from then on; a repeat install is ignored and reported with
/// `false`. Where the caller gets the table from (the vendor API, a cached
/// file) is its own business.
pub fn install(catalog: HashMap<i64, String>) -> bool {
    let mut slot = CATALOG.write().unwrap();
    if slot.is_some() {
        return false;
    }
    *slot = Some(Arc::new(catalog));
    true
}

/// Whether a catalog has been installed yet.
pub fn is_installed() -> bool {
    CATALOG.read().unwrap().is_some()
}

/// Looks up the short display name for a vehicle descriptor. `None` when
/// no catalog is installed or the descriptor is not in it.
pub fn short_name(type_comp_descr: i64) -> Option<String> {
    let slot = CATALOG.read().unwrap();
    slot.as_ref()?.get(&type_comp_descr).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_once() {
        let mut catalog = HashMap::new();
        catalog.insert(7169, "IS-3".to_string());
        install(catalog);

        assert!(is_installed());
        assert_eq!(short_name(7169).as_deref(), Some("IS-3"));
        assert_eq!(short_name(1), None);

        // A second install must not replace the table
        let mut other = HashMap::new();
        other.insert(7169, "Maus".to_string());
        assert!(!install(other));
        assert_eq!(short_name(7169).as_deref(), Some("IS-3"));
    }
}
