//! Storage layout of the vote engine

use daogov_core::{Address, Hash};

pub fn scheme(id: &Hash) -> String {
    format!("vote/schemes/{}", id)
}

pub fn item(id: &Hash) -> String {
    format!("vote/items/{}", id)
}

pub fn result(id: &Hash) -> String {
    format!("vote/results/{}", id)
}

pub fn record(item_id: &Hash, voter: &Address) -> String {
    format!("vote/records/{}/{}", item_id, voter)
}

/// Locked amount of `voter` across every item of a DAO
pub fn dao_custody(dao_id: &Hash, voter: &Address) -> String {
    format!("vote/dao_custody/{}/{}", dao_id, voter)
}

/// Locked amount of `voter` on a single item
pub fn item_custody(dao_id: &Hash, voter: &Address, item_id: &Hash) -> String {
    format!("{}{}", item_custody_prefix(dao_id, voter), item_id)
}

pub fn item_custody_prefix(dao_id: &Hash, voter: &Address) -> String {
    format!("vote/item_custody/{}/{}/", dao_id, voter)
}
