use std::collections::VecDeque;

use weave_explore::ExplorationStrategy;

/// Strategies taking turns, one per iteration, in round-robin order.
pub struct Portfolio {
    strategies: VecDeque<Box<dyn ExplorationStrategy>>,
}

impl Portfolio {
    /// `None` if `strategies` is empty.
    pub fn new(strategies: Vec<Box<dyn ExplorationStrategy>>) -> Option<Self> {
        if strategies.is_empty() {
            return None;
        }
        Some(Self {
            strategies: strategies.into(),
        })
    }

    pub fn single(strategy: Box<dyn ExplorationStrategy>) -> Self {
        Self {
            strategies: VecDeque::from(vec![strategy]),
        }
    }

    /// Add a strategy at the back of the rotation.
    pub fn push(&mut self, strategy: Box<dyn ExplorationStrategy>) {
        self.strategies.push_back(strategy);
    }

    /// Move the active strategy to the back.
    pub fn rotate(&mut self) {
        self.strategies.rotate_left(1);
    }

    pub fn active(&self) -> &dyn ExplorationStrategy {
        // Never empty; enforced by the constructors.
        &*self.strategies[0]
    }

    pub fn active_mut(&mut self) -> &mut dyn ExplorationStrategy {
        &mut *self.strategies[0]
    }

    pub fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut (dyn ExplorationStrategy + 'static)> + '_ {
        self.strategies.iter_mut().map(|s| &mut **s)
    }

    /// Every strategy except the active one, in rotation order.
    pub fn waiting_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut (dyn ExplorationStrategy + 'static)> + '_ {
        self.strategies.iter_mut().skip(1).map(|s| &mut **s)
    }

    /// Strategy names in current order.
    pub fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
