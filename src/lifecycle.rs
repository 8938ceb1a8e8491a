//! Token ownership ledger
//!
//! Tracks who holds which token, how many owners each token has had, and the
//! logical clock used to measure holding duration. The clock ticks once per
//! mint and once per transfer; burns leave it alone.
//!
//! Every mutating call checks everything first, so a rejected call changes
//! nothing.

use crate::model::{Address, TokenId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Population limits for a poem's tokens
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationLimits {
    /// Tokens that can ever be minted
    pub max_supply: u32,
    /// Mints allowed per address, over the poem's lifetime
    pub mints_per_address: u32,
    /// Tokens one address may hold at once
    pub max_held: u32,
}

impl Default for PopulationLimits {
    fn default() -> Self {
        PopulationLimits {
            max_supply: 7,
            mints_per_address: 1,
            max_held: 3,
        }
    }
}

/// A live token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub owner: Address,
    /// Holders so far, starting at 1
    pub num_owners: u32,
}

/// What a burn needs to know about the token before it goes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurnTicket {
    pub token: TokenId,
    pub num_blocks_held: u64,
    pub num_owners: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    limits: PopulationLimits,
    tokens: BTreeMap<TokenId, TokenRecord>,
    balances: BTreeMap<Address, u32>,
    minted_by: BTreeMap<Address, u32>,
    last_transfered_at: BTreeMap<Address, u64>,
    clock: u64,
    minted: u32,
}

impl Ledger {
    pub fn new(limits: PopulationLimits) -> Self {
        Ledger {
            limits,
            tokens: BTreeMap::new(),
            balances: BTreeMap::new(),
            minted_by: BTreeMap::new(),
            last_transfered_at: BTreeMap::new(),
            clock: 0,
            minted: 0,
        }
    }

    pub fn limits(&self) -> &PopulationLimits {
        &self.limits
    }

    /// Current logical clock value
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Tokens minted so far, burned ones included
    pub fn minted(&self) -> u32 {
        self.minted
    }

    /// Tokens currently alive
    pub fn live(&self) -> usize {
        self.tokens.len()
    }

    pub fn balance_of(&self, address: &Address) -> u32 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn token(&self, token: TokenId) -> Result<&TokenRecord> {
        self.tokens.get(&token).ok_or(Error::TokenNotFound(token))
    }

    pub fn tokens(&self) -> impl Iterator<Item = (TokenId, &TokenRecord)> {
        self.tokens.iter().map(|(id, record)| (*id, record))
    }

    /// Clock ticks since `address` last received a token
    pub fn holding_duration(&self, address: &Address) -> u64 {
        let since = self.last_transfered_at.get(address).copied().unwrap_or(0);
        self.clock.saturating_sub(since)
    }

    /// Check a mint to `to`, returning the id it would get
    pub fn check_mint(&self, to: &Address) -> Result<TokenId> {
        if to.is_zero() {
            return Err(Error::ZeroAddress);
        }
        if self.minted >= self.limits.max_supply {
            return Err(Error::OutOfTokens);
        }
        if self.minted_by.get(to).copied().unwrap_or(0) >= self.limits.mints_per_address {
            return Err(Error::AlreadyMinted(*to));
        }
        self.check_room(to)?;
        Ok(self.minted + 1)
    }

    pub fn mint(&mut self, to: &Address) -> Result<TokenId> {
        let token = self.check_mint(to)?;
        self.minted += 1;
        *self.minted_by.entry(*to).or_insert(0) += 1;
        self.tokens.insert(
            token,
            TokenRecord {
                owner: *to,
                num_owners: 1,
            },
        );
        self.receive(to);
        Ok(token)
    }

    /// Check a transfer of `token` from `from` to `to`
    pub fn check_transfer(&self, from: &Address, to: &Address, token: TokenId) -> Result<()> {
        if to.is_zero() {
            return Err(Error::ZeroAddress);
        }
        self.check_owner(from, token)?;
        if from != to {
            self.check_room(to)?;
        }
        Ok(())
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, token: TokenId) -> Result<()> {
        self.check_transfer(from, to, token)?;
        if let Some(record) = self.tokens.get_mut(&token) {
            record.owner = *to;
            record.num_owners = record.num_owners.saturating_add(1);
        }
        self.release(from);
        self.receive(to);
        Ok(())
    }

    /// Check a burn of `token` by `holder`, capturing its counters
    pub fn check_burn(&self, holder: &Address, token: TokenId) -> Result<BurnTicket> {
        let record = self.check_owner(holder, token)?;
        Ok(BurnTicket {
            token,
            num_blocks_held: self.holding_duration(holder),
            num_owners: record.num_owners,
        })
    }

    pub fn burn(&mut self, holder: &Address, token: TokenId) -> Result<BurnTicket> {
        let ticket = self.check_burn(holder, token)?;
        self.tokens.remove(&token);
        self.release(holder);
        Ok(ticket)
    }

    fn check_owner(&self, address: &Address, token: TokenId) -> Result<&TokenRecord> {
        let record = self.token(token)?;
        if record.owner != *address {
            return Err(Error::NotOwner {
                token,
                address: *address,
            });
        }
        Ok(record)
    }

    fn check_room(&self, address: &Address) -> Result<()> {
        if self.balance_of(address) >= self.limits.max_held {
            return Err(Error::HoldingLimit(*address));
        }
        Ok(())
    }

    fn receive(&mut self, address: &Address) {
        self.clock += 1;
        *self.balances.entry(*address).or_insert(0) += 1;
        self.last_transfered_at.insert(*address, self.clock);
    }

    fn release(&mut self, address: &Address) {
        if let Some(balance) = self.balances.get_mut(address) {
            *balance = balance.saturating_sub(1);
            if *balance == 0 {
                self.balances.remove(address);
            }
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(PopulationLimits::default())
    }
}
