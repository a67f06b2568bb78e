use pokt_core::spaces::{NewSessionSpace, ProtocolFeeSpace, ServeSessionSpace};
use pokt_core::{StateInvariantError, WorldState};
use pokt_env::SessionId;

pub fn create_new_session(state: &mut WorldState, space: &NewSessionSpace) -> Result<SessionId, StateInvariantError> {
    state.create_session(space)
}

pub fn serve_session(state: &mut WorldState, space: &ServeSessionSpace) -> Result<(), StateInvariantError> {
    state.serve_session(space.session, space.processed_relays)
}

pub fn remove_session(state: &mut WorldState, session: SessionId) -> Result<(), StateInvariantError> {
    state.remove_session(session).map(|_| ())
}

/// Credits the DAO and block proposer shares of a relay payment.
pub fn collect_relay_fees(state: &mut WorldState, space: &ProtocolFeeSpace) -> Result<(), StateInvariantError> {
    state.collect_fees(space)
}
