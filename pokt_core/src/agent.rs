//! Behavior shared by every staked agent.

use pokt_env::{AgentKey, Upokt};
use serde::{Deserialize, Serialize};

/// Lifecycle of an agent's stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StakeStatus {
    #[default]
    Staked,
    Unstaking,
    Unstaked,
}

/// An agent holding liquid and escrowed POKT.
///
/// Balances are read through this trait by policies and written only by
/// `WorldState`, which enforces non-negativity before touching them.
pub trait Staker {
    /// The agent's identity token.
    fn key(&self) -> AgentKey;

    /// Liquid, unstaked balance.
    fn pokt_holdings(&self) -> Upokt;

    /// Escrowed balance.
    fn staked_pokt(&self) -> Upokt;

    /// Mutable access to the liquid balance.
    fn pokt_holdings_mut(&mut self) -> &mut Upokt;

    /// Mutable access to the escrowed balance.
    fn staked_pokt_mut(&mut self) -> &mut Upokt;

    /// Sum of liquid and escrowed balances.
    fn total_pokt(&self) -> Upokt {
        self.pokt_holdings() + self.staked_pokt()
    }
}

/// Implements `Staker` for a struct with `pokt_holdings`/`staked_pokt` fields.
macro_rules! impl_staker {
    ($ty:ty, $ctor:path) => {
        impl $crate::agent::Staker for $ty {
            fn key(&self) -> pokt_env::AgentKey {
                $ctor(self.id)
            }

            fn pokt_holdings(&self) -> pokt_env::Upokt {
                self.pokt_holdings
            }

            fn staked_pokt(&self) -> pokt_env::Upokt {
                self.staked_pokt
            }

            fn pokt_holdings_mut(&mut self) -> &mut pokt_env::Upokt {
                &mut self.pokt_holdings
            }

            fn staked_pokt_mut(&mut self) -> &mut pokt_env::Upokt {
                &mut self.staked_pokt
            }
        }
    };
}

pub(crate) use impl_staker;
