//! Storage layout of the election engine

use daogov_core::{Address, Hash};

pub fn config(dao_id: &Hash) -> String {
    format!("election/config/{}", dao_id)
}

pub fn candidates(dao_id: &Hash) -> String {
    format!("election/candidates/{}", dao_id)
}

pub fn information(dao_id: &Hash, candidate: &Address) -> String {
    format!("election/information/{}/{}", dao_id, candidate)
}

/// Candidates an admin manages
pub fn managed(dao_id: &Hash, admin: &Address) -> String {
    format!("election/managed/{}/{}", dao_id, admin)
}

pub fn banned(dao_id: &Hash, address: &Address) -> String {
    format!("election/banned/{}/{}", dao_id, address)
}

pub fn open_term(dao_id: &Hash) -> String {
    format!("election/open_term/{}", dao_id)
}

pub fn latest_term(dao_id: &Hash) -> String {
    format!("election/latest_term/{}", dao_id)
}

pub fn snapshot(dao_id: &Hash, term: u64) -> String {
    format!("election/snapshots/{}/{:020}", dao_id, term)
}
