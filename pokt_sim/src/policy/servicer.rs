//! Servicer-side policies, including the relay serving policy that prices
//! served relays and splits the payment.

use super::stake_transfer_policy;
use pokt_core::spaces::{
    BurnSpace, JailSpace, JailSpaces, LeaveSpace, ModifyBalanceSpace, PauseHeightSpace,
    ProtocolFeeSpace, RelayRequestSpace, RelayServingSpaces, RemoveAgentSpace, ServeSessionSpace,
    ServicerJoinSpace, ServicerLeaveSpaces, ServicerPaymentSpace, SlashSpace, StakeSpace,
    StakeTransferSpaces, UnlinkServiceSpace,
};
use pokt_core::{ParamSet, Session, Stage, WorldState};
use pokt_env::{AgentId, AgentKey, AgentKind, Upokt};

// =============================================================================
// JOIN / STAKE / LEAVE
// =============================================================================

/// Admits a joining servicer if it stakes at least the protocol minimum.
/// Unknown and duplicate services are dropped and the list is capped at
/// `max_chains_servicer`.
pub fn servicer_join_policy(
    state: &WorldState,
    params: &ParamSet,
    space: ServicerJoinSpace,
) -> Stage<ServicerJoinSpace> {
    if !(space.stake_amount >= params.system.minimum_stake_servicer) {
        return Stage::Skipped;
    }
    if !space.personal_holdings.is_finite() || space.personal_holdings < 0.0 {
        return Stage::Skipped;
    }

    let mut services: Vec<AgentId> = Vec::new();
    for service in space.services.iter().copied() {
        if state.services().contains_key(&service) && !services.contains(&service) {
            services.push(service);
        }
    }
    services.truncate(params.system.max_chains_servicer);

    Stage::Fired(ServicerJoinSpace { services, ..space })
}

pub fn servicer_stake_policy(state: &WorldState, space: &StakeSpace) -> Stage<StakeTransferSpaces> {
    if space.public_key.kind != AgentKind::Servicer {
        return Stage::Skipped;
    }
    stake_transfer_policy(state, space)
}

/// Departing servicers first unlink every service they offer, then are removed.
pub fn servicer_leave_policy(state: &WorldState, leave: &LeaveSpace) -> ServicerLeaveSpaces {
    let mut out = ServicerLeaveSpaces::default();
    for id in leave.leaving() {
        let Some(servicer) = state.servicer(id) else {
            continue;
        };
        out.unlinks.extend(servicer.services.iter().map(|service| UnlinkServiceSpace {
            servicer: id,
            service: *service,
        }));
        out.removals.push(RemoveAgentSpace {
            public_key: AgentKey::servicer(id),
        });
    }
    out
}

// =============================================================================
// JAILING
// =============================================================================

/// Pauses the servicer at the current height and slashes
/// `staked * slash_fraction_downtime`.
pub fn jail_node_policy(state: &WorldState, params: &ParamSet, space: &JailSpace) -> Stage<JailSpaces> {
    let Some(servicer) = state.servicer(space.servicer) else {
        return Stage::Skipped;
    };
    if servicer.is_jailed() {
        return Stage::Skipped;
    }
    Stage::Fired(JailSpaces {
        pause: PauseHeightSpace {
            servicer: servicer.id,
            pause_height: Some(state.height()),
        },
        slash: SlashSpace {
            servicer: servicer.id,
            height: state.height(),
            amount: servicer.staked_pokt * params.system.slash_fraction_downtime,
        },
    })
}

/// Releases a jailed servicer, provided it still meets the minimum stake.
pub fn unjail_policy(state: &WorldState, params: &ParamSet, space: &JailSpace) -> Stage<PauseHeightSpace> {
    match state.servicer(space.servicer) {
        Some(servicer)
            if servicer.is_jailed() && servicer.staked_pokt >= params.system.minimum_stake_servicer =>
        {
            Stage::Fired(PauseHeightSpace {
                servicer: servicer.id,
                pause_height: None,
            })
        }
        _ => Stage::Skipped,
    }
}

// =============================================================================
// RELAY SERVING
// =============================================================================

/// Relays the payer can pay for at `price` each without going negative.
pub fn affordable_relays(stake: Upokt, price: f64) -> u64 {
    if !(stake > 0.0 && stake.is_finite() && price > 0.0) {
        return 0;
    }
    let mut n = (stake / price).floor() as u64;
    // floor(stake / price) * price can still exceed stake by an ulp
    while n > 0 && n as f64 * price > stake {
        n -= 1;
    }
    n
}

/// Each servicer's share of the remaining relays, reduced by its QoS.
///
/// Remaining relays are split evenly; the first `remaining % k` servicers
/// take one extra. A servicer serves `floor(share * qos)`. Jailed or departed
/// servicers, and servicers that dropped the session's service, serve nothing.
fn serving_quotas(state: &WorldState, session: &Session) -> Vec<(AgentId, u64)> {
    let k = session.servicers.len() as u64;
    if k == 0 {
        return Vec::new();
    }
    let base = session.number_of_relays / k;
    let extra = session.number_of_relays % k;

    session
        .servicers
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let share = base + u64::from((i as u64) < extra);
            let quota = match state.servicer(*id) {
                Some(s) if !s.is_jailed() && session.service.map_or(true, |svc| s.offers(svc)) => {
                    (share as f64 * s.qos).floor() as u64
                }
                _ => 0,
            };
            (*id, quota)
        })
        .collect()
}

/// Serves relays against a session and prices them.
///
/// Processed relays are capped by what the payer can afford. The payment
/// is `processed * relays_to_tokens_multiplier`; servicers share
/// `servicer_allocation` of it pro rata to the relays each served, and the
/// remainder goes to the DAO and block proposer. The session is flagged for
/// teardown once no relays remain, the payer cannot afford another relay, or
/// the pass served nothing (serving is deterministic, so it never would).
pub fn servicer_relay_policy(
    state: &WorldState,
    params: &ParamSet,
    space: &RelayRequestSpace,
) -> Stage<RelayServingSpaces> {
    let Some(session) = state.session(space.session) else {
        return Stage::Skipped;
    };
    let Some(payer) = state.agent(session.payer.key()) else {
        return Stage::Skipped;
    };
    let system = &params.system;
    let price = system.relays_to_tokens_multiplier;
    let stake = payer.staked_pokt();

    let mut budget = affordable_relays(stake, price).min(session.number_of_relays);
    let mut served: Vec<(AgentId, u64)> = Vec::new();
    for (id, quota) in serving_quotas(state, session) {
        let n = quota.min(budget);
        budget -= n;
        if n > 0 {
            served.push((id, n));
        }
    }
    let processed: u64 = served.iter().map(|(_, n)| n).sum();

    let amount = processed as f64 * price;
    let servicer_pool = amount * system.servicer_allocation;
    let payouts = served
        .iter()
        .map(|(id, n)| ServicerPaymentSpace {
            servicer: *id,
            service: session.service,
            relays: *n,
            amount: servicer_pool * *n as f64 / processed as f64,
        })
        .collect();
    let fees = ProtocolFeeSpace {
        dao: amount * system.dao_allocation,
        block_proposer: amount * system.block_proposer_allocation,
    };

    let after_payment = (stake - amount).max(0.0);
    let burn_amount = (system.app_burn_per_relay * processed as f64).min(after_payment);
    let burn = (burn_amount > 0.0).then_some(BurnSpace {
        public_key: session.payer.key(),
        amount: burn_amount,
    });

    let remaining = session.number_of_relays - processed;
    let exhausted = remaining == 0 || processed == 0 || after_payment - burn_amount < price;

    Stage::Fired(RelayServingSpaces {
        payment: ModifyBalanceSpace {
            public_key: session.payer.key(),
            amount: -amount,
        },
        payer: session.payer,
        payouts,
        fees,
        burn,
        serve: ServeSessionSpace {
            session: session.id,
            processed_relays: processed,
        },
        teardown: exhausted.then_some(session.id),
    })
}
