//! Storage layout of the governance engine

use daogov_core::{Address, Hash};

pub fn scheme(scheme_address: &Address) -> String {
    format!("governance/schemes/{}", scheme_address)
}

/// Scheme addresses registered for a DAO
pub fn dao_schemes(dao_id: &Hash) -> String {
    format!("governance/dao_schemes/{}", dao_id)
}

pub fn time_period(dao_id: &Hash) -> String {
    format!("governance/time_periods/{}", dao_id)
}

pub fn proposal(id: &Hash) -> String {
    format!("governance/proposals/{}", id)
}

pub fn executed(id: &Hash) -> String {
    format!("governance/executed/{}", id)
}

pub fn vetoed(id: &Hash) -> String {
    format!("governance/vetoed/{}", id)
}
