//! Ensemble slot filling
//!
//! Runs `k` independent extractions concurrently and keeps the majority
//! result. Members that error (or panic) are discarded. Votes are tallied in
//! spawn order, so a tie goes to the lowest-numbered member no matter which
//! task finished first.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::{ActionExtractor, SlotFill};
use crate::error::AssistantError;
use crate::models::{ActionKind, Message};
use crate::Result;

pub struct EnsembleExtractor {
    inner: Arc<dyn ActionExtractor>,
    size: usize,
}

impl EnsembleExtractor {
    pub fn new(inner: Arc<dyn ActionExtractor>, size: usize) -> Self {
        Self {
            inner,
            size: size.max(1),
        }
    }
}

#[async_trait]
impl ActionExtractor for EnsembleExtractor {
    async fn extract(&self, messages: &[Message], kind: ActionKind) -> Result<SlotFill> {
        let shared: Arc<[Message]> = Arc::from(messages);

        let handles: Vec<_> = (0..self.size)
            .map(|_| {
                let inner = self.inner.clone();
                let messages = shared.clone();
                tokio::spawn(async move { inner.extract(&messages, kind).await })
            })
            .collect();

        let mut results = Vec::with_capacity(self.size);
        let mut last_error = String::new();

        for (member, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(fill)) => results.push(fill),
                Ok(Err(e)) => {
                    warn!(member, error = %e, "Ensemble member failed, discarding");
                    last_error = e.to_string();
                }
                Err(join_error) => {
                    warn!(member, error = %join_error, "Ensemble member aborted, discarding");
                    last_error = join_error.to_string();
                }
            }
        }

        let survivors = results.len();
        let winner = majority_vote(results).ok_or_else(|| AssistantError::EnsembleExhausted {
            attempts: self.size,
            last_error,
        })?;

        info!(action = %kind, members = self.size, survivors, "Ensemble vote decided");
        Ok(winner)
    }
}

/// Most frequent candidate by canonical JSON; ties go to the first seen.
pub fn majority_vote<T: Serialize>(candidates: Vec<T>) -> Option<T> {
    // Value objects are BTreeMap-backed, so keys come out sorted.
    let keys: Vec<String> = candidates
        .iter()
        .map(|candidate| {
            serde_json::to_value(candidate)
                .map(|value| value.to_string())
                .unwrap_or_default()
        })
        .collect();

    let mut votes: HashMap<&str, usize> = HashMap::new();
    for key in &keys {
        *votes.entry(key.as_str()).or_default() += 1;
    }

    let mut winner: Option<(usize, usize)> = None;
    for (index, key) in keys.iter().enumerate() {
        let count = votes[key.as_str()];
        if winner.map_or(true, |(_, best)| count > best) {
            winner = Some((index, count));
        }
    }

    let (index, _) = winner?;
    candidates.into_iter().nth(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionParams;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn transfer(amount: &str) -> SlotFill {
        SlotFill::Complete(ActionParams::Transfer {
            receiver: "Nam".into(),
            amount: amount.into(),
            msg: None,
        })
    }

    /// Fails the first `failures` calls, then answers from `answers` by call index.
    struct CountingStub {
        calls: AtomicUsize,
        failures: usize,
        answers: Vec<SlotFill>,
    }

    #[async_trait]
    impl ActionExtractor for CountingStub {
        async fn extract(&self, _messages: &[Message], _kind: ActionKind) -> Result<SlotFill> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(AssistantError::ParseError("marker 'RESULT:' not found".into()));
            }
            Ok(self.answers[(call - self.failures) % self.answers.len()].clone())
        }
    }

    /// First caller answers last, after a delay.
    struct SlowFirstStub {
        calls: AtomicUsize,
        finished: std::sync::Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl ActionExtractor for SlowFirstStub {
        async fn extract(&self, _messages: &[Message], _kind: ActionKind) -> Result<SlotFill> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            if let Ok(mut finished) = self.finished.lock() {
                finished.push(call);
            }
            let answer = ["A", "B", "C"][call % 3];
            Ok(SlotFill::Clarify(answer.into()))
        }
    }

    fn messages() -> Vec<Message> {
        vec![Message::new("Minh", "Chuyển Nam 300k")]
    }

    #[test]
    fn test_majority_wins() {
        let a = transfer("300000");
        let b = transfer("30000");
        assert_eq!(majority_vote(vec![a.clone(), a.clone(), b.clone()]), Some(a.clone()));
        assert_eq!(majority_vote(vec![b.clone(), a.clone(), a.clone()]), Some(a));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let a = transfer("1");
        let b = transfer("2");
        let c = SlotFill::Clarify("Bạn muốn chuyển bao nhiêu tiền?".into());
        assert_eq!(majority_vote(vec![a.clone(), b.clone(), c.clone()]), Some(a));
        assert_eq!(majority_vote(vec![c.clone(), b, c.clone()]), Some(c));
        assert_eq!(majority_vote::<SlotFill>(vec![]), None);
    }

    #[tokio::test]
    async fn test_ensemble_majority() {
        let stub = Arc::new(CountingStub {
            calls: AtomicUsize::new(0),
            failures: 0,
            answers: vec![transfer("300000"), transfer("300000"), transfer("30000")],
        });
        let ensemble = EnsembleExtractor::new(stub.clone(), 3);

        let fill = ensemble.extract(&messages(), ActionKind::Transfer).await.unwrap();
        assert_eq!(fill, transfer("300000"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_tie_goes_to_first_spawned_not_first_finished() {
        let stub = Arc::new(SlowFirstStub {
            calls: AtomicUsize::new(0),
            finished: std::sync::Mutex::new(Vec::new()),
        });
        let ensemble = EnsembleExtractor::new(stub.clone(), 3);

        let fill = ensemble.extract(&messages(), ActionKind::Transfer).await.unwrap();
        assert_eq!(fill, SlotFill::Clarify("A".into()));
        assert_eq!(*stub.finished.lock().unwrap(), vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn test_failed_members_are_discarded() {
        let stub = Arc::new(CountingStub {
            calls: AtomicUsize::new(0),
            failures: 2,
            answers: vec![transfer("300000")],
        });
        let ensemble = EnsembleExtractor::new(stub, 3);

        let fill = ensemble.extract(&messages(), ActionKind::Transfer).await.unwrap();
        assert_eq!(fill, transfer("300000"));
    }

    #[tokio::test]
    async fn test_all_members_failing_is_fatal() {
        let stub = Arc::new(CountingStub {
            calls: AtomicUsize::new(0),
            failures: 10,
            answers: vec![transfer("1")],
        });
        let ensemble = EnsembleExtractor::new(stub, 3);

        let err = ensemble.extract(&messages(), ActionKind::Transfer).await.unwrap_err();
        assert!(matches!(err, AssistantError::EnsembleExhausted { attempts: 3, .. }));
    }
}
