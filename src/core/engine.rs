// src/core/engine.rs
use crate::connectors::traits::{Puller, Trader};
use crate::error::EngineError;
use crate::strategies::traits::Rule;
use anyhow::{Context, Result};
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinError;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ended {
    Signal,
    Puller,
    Trader,
}

impl fmt::Display for Ended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ended::Signal => "stop signal",
            Ended::Puller => "puller",
            Ended::Trader => "trader",
        })
    }
}

/// Runs a rule by wiring a puller to a trader through a single-slot candle
/// channel. The rule is lent to the trader task for the duration of a run
/// and handed back once both tasks are joined.
pub struct Strategy<R> {
    rule: Option<R>,
    state: RunnerState,
}

impl<R> Strategy<R>
where
    R: Rule + 'static,
{
    pub fn new(rule: R) -> Self {
        Self {
            rule: Some(rule),
            state: RunnerState::Stopped,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// `None` only after the trader task panicked and took the rule with it.
    pub fn rule(&self) -> Option<&R> {
        self.rule.as_ref()
    }

    /// Runs until `stop` fires (or its sender is dropped) or until either
    /// task ends. Both tasks are signalled and joined before returning; the
    /// task that ended first decides the outcome. The trader is returned so
    /// the caller can query its profit.
    pub async fn run<P, T>(&mut self, mut stop: oneshot::Receiver<()>, puller: P, trader: T) -> Result<T>
    where
        P: Puller + 'static,
        T: Trader + 'static,
    {
        let mut rule = self.rule.take().ok_or(EngineError::RuleUnavailable)?;
        let name = rule.name();
        self.state = RunnerState::Running;
        info!(rule = %name, "runner : starting");

        let (candles_tx, candles_rx) = mpsc::channel(1);
        let (stop_puller_tx, stop_puller) = oneshot::channel();
        let (stop_trader_tx, stop_trader) = oneshot::channel();

        let mut puller = puller;
        let mut pulling = tokio::spawn(async move { puller.pull(stop_puller, candles_tx).await });

        let mut trader = trader;
        let mut trading = tokio::spawn(async move {
            let result = trader.trade(stop_trader, candles_rx, &mut rule).await;
            (trader, rule, result)
        });

        let mut pulled = None;
        let mut traded = None;
        let ended = tokio::select! {
            _ = &mut stop => Ended::Signal,
            res = &mut pulling => {
                pulled = Some(res);
                Ended::Puller
            }
            res = &mut trading => {
                traded = Some(res);
                Ended::Trader
            }
        };
        info!(rule = %name, ended = %ended, "runner : stopping");

        // either side may already be gone
        let _ = stop_puller_tx.send(());
        let _ = stop_trader_tx.send(());

        let pulled = match pulled {
            Some(res) => res,
            None => pulling.await,
        };
        let traded = match traded {
            Some(res) => res,
            None => trading.await,
        };
        self.state = RunnerState::Stopped;

        let pulled = joined(pulled, "puller");
        let (trader, traded) = match traded {
            Ok((trader, rule, result)) => {
                self.rule = Some(rule);
                (Some(trader), result)
            }
            Err(e) => (None, joined(Err(e), "trader")),
        };

        let (first, second) = match ended {
            Ended::Puller => (pulled, traded),
            Ended::Signal | Ended::Trader => (traded, pulled),
        };
        if let Err(e) = first.and(second) {
            error!(rule = %name, error = %e, "runner : stopped with error");
            return Err(e);
        }

        info!(rule = %name, "runner : stopped");
        trader.context("runner : trader task lost")
    }
}

fn joined(res: std::result::Result<Result<()>, JoinError>, task: &'static str) -> Result<()> {
    res.with_context(|| format!("runner : {task} task panicked"))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::traits::Stop;
    use crate::types::{Candle, Signal};
    use async_trait::async_trait;

    #[derive(Default)]
    struct Counting {
        seen: usize,
    }

    impl Rule for Counting {
        fn name(&self) -> String {
            "counting".into()
        }

        fn assert(&mut self, _candle: &Candle) -> Signal {
            self.seen += 1;
            Signal::Hold
        }
    }

    /// Pushes `bars` candles, optionally fails, otherwise waits for stop.
    struct FakePuller {
        bars: usize,
        fail: bool,
    }

    #[async_trait]
    impl Puller for FakePuller {
        async fn pull(&mut self, stop: Stop, candles: mpsc::Sender<Candle>) -> Result<()> {
            for _ in 0..self.bars {
                if candles.send(Candle::default()).await.is_err() {
                    return Ok(());
                }
            }
            if self.fail {
                anyhow::bail!("data source unreachable");
            }
            let _ = stop.await;
            Ok(())
        }
    }

    /// Consumes at most `take` candles, then returns (or fails).
    #[derive(Debug)]
    struct FakeTrader {
        take: usize,
        fail: bool,
        traded: usize,
    }

    impl FakeTrader {
        fn new(take: usize) -> Self {
            Self {
                take,
                fail: false,
                traded: 0,
            }
        }
    }

    #[async_trait]
    impl Trader for FakeTrader {
        async fn trade(
            &mut self,
            mut stop: Stop,
            mut candles: mpsc::Receiver<Candle>,
            rule: &mut dyn Rule,
        ) -> Result<()> {
            while self.traded < self.take {
                tokio::select! {
                    _ = &mut stop => return Ok(()),
                    candle = candles.recv() => match candle {
                        Some(candle) => {
                            rule.assert(&candle);
                            self.traded += 1;
                        }
                        None => return Ok(()),
                    },
                }
            }
            if self.fail {
                anyhow::bail!("order rejected");
            }
            Ok(())
        }

        async fn profit(&self) -> f64 {
            self.traded as f64
        }
    }

    #[tokio::test]
    async fn trader_exit_stops_the_puller() {
        let mut strategy = Strategy::new(Counting::default());
        let (_stop_tx, stop) = oneshot::channel();
        let puller = FakePuller { bars: 10, fail: false };

        let trader = strategy.run(stop, puller, FakeTrader::new(4)).await.unwrap();

        assert_eq!(trader.profit().await, 4.0);
        assert_eq!(strategy.rule().unwrap().seen, 4);
        assert_eq!(strategy.state(), RunnerState::Stopped);
    }

    #[tokio::test]
    async fn stop_signal_joins_both_tasks() {
        let mut strategy = Strategy::new(Counting::default());
        let (stop_tx, stop) = oneshot::channel();
        stop_tx.send(()).unwrap();
        let puller = FakePuller { bars: 0, fail: false };

        let trader = strategy
            .run(stop, puller, FakeTrader::new(usize::MAX))
            .await
            .unwrap();

        assert_eq!(trader.traded, 0);
        assert_eq!(strategy.state(), RunnerState::Stopped);
        assert!(strategy.rule().is_some());
    }

    #[tokio::test]
    async fn puller_error_is_returned() {
        let mut strategy = Strategy::new(Counting::default());
        let (_stop_tx, stop) = oneshot::channel();
        let puller = FakePuller { bars: 2, fail: true };

        let err = strategy
            .run(stop, puller, FakeTrader::new(usize::MAX))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("data source unreachable"));
        assert!(strategy.rule().is_some());
        assert_eq!(strategy.state(), RunnerState::Stopped);
    }

    #[tokio::test]
    async fn trader_error_is_returned_and_rule_kept() {
        let mut strategy = Strategy::new(Counting::default());
        let (_stop_tx, stop) = oneshot::channel();
        let puller = FakePuller { bars: 5, fail: false };
        let trader = FakeTrader {
            take: 1,
            fail: true,
            traded: 0,
        };

        let err = strategy.run(stop, puller, trader).await.unwrap_err();

        assert!(err.to_string().contains("order rejected"));
        assert_eq!(strategy.rule().unwrap().seen, 1);

        // the rule is back, so the strategy can run again
        let (_stop_tx, stop) = oneshot::channel();
        let puller = FakePuller { bars: 5, fail: false };
        strategy.run(stop, puller, FakeTrader::new(2)).await.unwrap();
        assert_eq!(strategy.rule().unwrap().seen, 3);
    }
}
