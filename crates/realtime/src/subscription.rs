//! Desired and confirmed module subscriptions.
//!
//! Several consumers may want the same module, so desire is reference
//! counted: the wire `subscribe` goes out on the first interest and the
//! `unsubscribe` on the last withdrawal.

use std::collections::{BTreeMap, BTreeSet};

use rentdesk_protocol::Module;

/// Tracks which modules are wanted and which the server has confirmed.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionRegistry {
    interest: BTreeMap<Module, usize>,
    confirmed: BTreeSet<Module>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one interest in `module`. Returns `true` if this is the first,
    /// i.e. a `subscribe` frame should be sent.
    pub fn declare(&mut self, module: Module) -> bool {
        let count = self.interest.entry(module).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Removes one interest in `module`. Returns `true` if it was the last,
    /// i.e. an `unsubscribe` frame should be sent.
    pub fn withdraw(&mut self, module: Module) -> bool {
        let Some(count) = self.interest.get_mut(&module) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.interest.remove(&module);
            self.confirmed.remove(&module);
            true
        } else {
            false
        }
    }

    /// Modules currently desired, in table order.
    pub fn desired(&self) -> Vec<Module> {
        self.interest.keys().copied().collect()
    }

    pub fn is_desired(&self, module: Module) -> bool {
        self.interest.contains_key(&module)
    }

    /// Whether no module is desired at all.
    pub fn is_empty(&self) -> bool {
        self.interest.is_empty()
    }

    /// Records a `subscription_confirmed`. Confirmations for modules nobody
    /// wants any more are ignored; returns whether it was recorded.
    pub fn confirm(&mut self, module: Module) -> bool {
        if self.is_desired(module) {
            self.confirmed.insert(module);
            true
        } else {
            false
        }
    }

    pub fn is_confirmed(&self, module: Module) -> bool {
        self.confirmed.contains(&module)
    }

    pub fn confirmed(&self) -> Vec<Module> {
        self.confirmed.iter().copied().collect()
    }

    /// Forgets every confirmation. Called whenever the socket closes, since
    /// the server keeps no subscription state across connections.
    pub fn clear_confirmed(&mut self) {
        self.confirmed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_declare_requests_subscribe() {
        let mut reg = SubscriptionRegistry::new();
        assert!(reg.declare(Module::Orders));
        assert!(!reg.declare(Module::Orders));
        assert_eq!(reg.desired(), vec![Module::Orders]);
    }

    #[test]
    fn last_withdraw_requests_unsubscribe() {
        let mut reg = SubscriptionRegistry::new();
        reg.declare(Module::Quotes);
        reg.declare(Module::Quotes);
        assert!(!reg.withdraw(Module::Quotes));
        assert!(reg.is_desired(Module::Quotes));
        assert!(reg.withdraw(Module::Quotes));
        assert!(!reg.is_desired(Module::Quotes));
        assert!(reg.is_empty());
    }

    #[test]
    fn withdraw_unknown_is_noop() {
        let mut reg = SubscriptionRegistry::new();
        assert!(!reg.withdraw(Module::Bookings));
        assert!(reg.is_empty());
    }

    #[test]
    fn confirm_only_desired_modules() {
        let mut reg = SubscriptionRegistry::new();
        reg.declare(Module::Bookings);
        assert!(reg.confirm(Module::Bookings));
        assert!(!reg.confirm(Module::Orders));
        assert_eq!(reg.confirmed(), vec![Module::Bookings]);
    }

    #[test]
    fn withdraw_drops_confirmation() {
        let mut reg = SubscriptionRegistry::new();
        reg.declare(Module::Bookings);
        reg.confirm(Module::Bookings);
        reg.withdraw(Module::Bookings);
        assert!(!reg.is_confirmed(Module::Bookings));
    }

    #[test]
    fn clear_confirmed_keeps_desire() {
        let mut reg = SubscriptionRegistry::new();
        reg.declare(Module::Bookings);
        reg.declare(Module::Orders);
        reg.confirm(Module::Bookings);
        reg.clear_confirmed();
        assert!(reg.confirmed().is_empty());
        assert_eq!(reg.desired(), vec![Module::Bookings, Module::Orders]);
    }

    #[test]
    fn resubscribe_set_tracks_current_desire() {
        // Arbitrary interleavings of declare/withdraw: the set resubscribed
        // on reconnect always matches what is desired right now.
        let ops: &[(bool, Module)] = &[
            (true, Module::Orders),
            (true, Module::Quotes),
            (true, Module::Orders),
            (false, Module::Orders),
            (true, Module::Bookings),
            (false, Module::Quotes),
            (false, Module::Orders),
            (true, Module::Quotes),
        ];
        let mut reg = SubscriptionRegistry::new();
        let mut counts: BTreeMap<Module, usize> = BTreeMap::new();
        for &(declare, module) in ops {
            if declare {
                reg.declare(module);
                *counts.entry(module).or_default() += 1;
            } else {
                reg.withdraw(module);
                if let Some(c) = counts.get_mut(&module) {
                    *c -= 1;
                }
            }
            let expected: Vec<Module> = counts
                .iter()
                .filter(|(_, c)| **c > 0)
                .map(|(&module, _)| module)
                .collect();
            assert_eq!(reg.desired(), expected);
        }
        assert_eq!(reg.desired(), vec![Module::Bookings, Module::Quotes]);
    }
}
