use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use super::error::AiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Estimate,
    Augment,
    Search,
    Parse,
    Recipe,
}

/// Latest request generation per user and flow. A call whose generation is
/// no longer the latest when it completes has been superseded. Generations
/// come from one counter so a number is never handed out twice; entries
/// live only while a call for that user and flow is in flight.
#[derive(Debug, Default)]
pub struct RequestGenerations {
    latest: Mutex<HashMap<(Uuid, Flow), u64>>,
    issued: AtomicU64,
}

#[derive(Debug)]
pub struct Ticket {
    owner: Uuid,
    flow: Flow,
    generation: u64,
}

impl RequestGenerations {
    pub fn begin(&self, owner: Uuid, flow: Flow) -> Ticket {
        let generation = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.insert((owner, flow), generation);
        Ticket {
            owner,
            flow,
            generation,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.get(&(ticket.owner, ticket.flow)) == Some(&ticket.generation)
    }

    /// Passes `result` through only if no newer call has started. The
    /// latest call clears its entry on the way out.
    pub fn finish<T>(&self, ticket: Ticket, result: Result<T, AiError>) -> Result<T, AiError> {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (ticket.owner, ticket.flow);
        if latest.get(&key) != Some(&ticket.generation) {
            drop(latest);
            tracing::info!(owner = %ticket.owner, flow = ?ticket.flow, "discarding superseded AI result");
            return Err(AiError::Superseded);
        }
        latest.remove(&key);
        result
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_call_supersedes_older() {
        let gens = RequestGenerations::default();
        let owner = Uuid::new_v4();
        let first = gens.begin(owner, Flow::Search);
        let second = gens.begin(owner, Flow::Search);

        assert_eq!(gens.finish(first, Ok(1)), Err(AiError::Superseded));
        assert_eq!(gens.finish(second, Ok(2)), Ok(2));
    }

    #[test]
    fn flows_and_users_are_independent() {
        let gens = RequestGenerations::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let search = gens.begin(a, Flow::Search);
        let _parse = gens.begin(a, Flow::Parse);
        let _other_user = gens.begin(b, Flow::Search);
        assert!(gens.is_current(&search));
    }

    #[test]
    fn finished_calls_leave_nothing_behind() {
        let gens = RequestGenerations::default();
        let owner = Uuid::new_v4();
        for _ in 0..3 {
            let ticket = gens.begin(owner, Flow::Parse);
            assert_eq!(gens.finish(ticket, Ok(())), Ok(()));
        }
        assert_eq!(gens.tracked(), 0);

        let first = gens.begin(owner, Flow::Parse);
        let second = gens.begin(owner, Flow::Parse);
        assert_eq!(gens.finish(second, Ok(2)), Ok(2));
        let third = gens.begin(owner, Flow::Parse);
        // a call started before the cleared one is still stale
        assert_eq!(gens.finish(first, Ok(1)), Err(AiError::Superseded));
        assert_eq!(gens.finish(third, Ok(3)), Ok(3));
        assert_eq!(gens.tracked(), 0);
    }
}
