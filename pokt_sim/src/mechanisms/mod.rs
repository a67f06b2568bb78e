//! Mechanisms: the only stage that mutates the world.
//!
//! Every mechanism is a thin call into one of `WorldState`'s narrow mutation
//! methods, so balance and reference invariants are enforced in one place.
//! A single mutation either commits completely or returns a
//! `StateInvariantError` and leaves the state untouched. Chains that run
//! several mechanisms in a row are not atomic: when a later one fails, the
//! earlier ones stay committed.

mod application;
mod gateway;
mod service;
mod servicer;
mod session;

pub use application::{add_application, link_delegation, unlink_delegation};
pub use gateway::{add_gateway, modify_gateway_stake, update_understaked_gateways};
pub use service::{add_service, link_service_mechanism};
pub use servicer::{
    add_servicer, pay_servicer, record_jail_slash, servicer_update_pause_height,
    unlink_service_mechanism,
};
pub use session::{collect_relay_fees, create_new_session, remove_session, serve_session};

use pokt_core::spaces::{BurnSpace, ModifyBalanceSpace, RemoveAgentSpace, StakeTransferSpaces};
use pokt_core::{StateInvariantError, WorldState};

/// Applies a signed delta to an agent's liquid holdings.
pub fn modify_pokt_holdings(state: &mut WorldState, space: &ModifyBalanceSpace) -> Result<(), StateInvariantError> {
    state.adjust_holdings(space.public_key, space.amount).map(|_| ())
}

/// Applies a signed delta to an agent's escrow.
pub fn modify_stake(state: &mut WorldState, space: &ModifyBalanceSpace) -> Result<(), StateInvariantError> {
    state.adjust_stake(space.public_key, space.amount).map(|_| ())
}

/// Moves POKT from holdings into escrow.
///
/// The debit is checked first so a rejected transfer leaves both balances
/// unchanged.
pub fn stake_transfer(state: &mut WorldState, spaces: &StakeTransferSpaces) -> Result<(), StateInvariantError> {
    modify_pokt_holdings(state, &spaces.holdings)?;
    modify_stake(state, &spaces.stake)
}

/// Burns stake out of circulation.
pub fn burn_pokt_mechanism(state: &mut WorldState, space: &BurnSpace) -> Result<(), StateInvariantError> {
    state.burn_stake(space.public_key, space.amount).map(|_| ())
}

/// Removes an agent of any kind, scrubbing back-references.
pub fn remove_agent(state: &mut WorldState, space: &RemoveAgentSpace) -> Result<(), StateInvariantError> {
    state.remove_agent(space.public_key)
}
