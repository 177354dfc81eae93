//! Simulation controller.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, warn};

use tinydex_common::{Address, Result as LedgerResult, TokenAmount};
use tinydex_ledger::{Ledger, Receipt};

use crate::accounts::{AccountFactory, SimulatedAccount};
use crate::metrics::{OperationKind, SimulationMetrics};
use crate::scenario::{AssertCondition, Scenario, ScenarioStep};

/// Tokens each holder receives before a load run.
const LOAD_FUNDING_WHOLE: u64 = 10_000;

/// Counts events seen by a subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObservedEvents {
    /// Records received.
    pub received: u64,
    /// Records dropped because the subscriber lagged.
    pub lagged: u64,
}

/// Controls the simulation.
pub struct SimulationController {
    /// Ledger under test.
    ledger: Arc<Ledger>,
    /// Simulated holders.
    accounts: Vec<SimulatedAccount>,
    /// Base seed; worker `i` uses `seed + i`.
    seed: u64,
    /// Simulation metrics.
    metrics: Arc<Mutex<SimulationMetrics>>,
}

impl SimulationController {
    /// Create a new simulation controller.
    pub fn new(ledger: Arc<Ledger>, account_count: usize, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!(accounts = account_count, seed, "Creating simulation controller");

        Self {
            ledger,
            accounts: AccountFactory::create_accounts(account_count),
            seed,
            metrics: Arc::new(Mutex::new(SimulationMetrics::new())),
        }
    }

    /// Run a scenario, failing on the first unmet expectation.
    pub fn run_scenario(&self, scenario: &Scenario) -> anyhow::Result<()> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        for (index, step) in scenario.steps.iter().enumerate() {
            self.execute_step(step)
                .map_err(|e| anyhow::anyhow!("Step {} of {} failed: {}", index, scenario.name, e))?;
        }

        Ok(())
    }

    /// Execute a single scenario step.
    fn execute_step(&self, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Transfer {
                from,
                to,
                amount,
                expect_error,
            } => {
                let (from, to, amount) = (self.address(from)?, self.address(to)?, parse_amount(amount)?);
                let result = self.timed(OperationKind::Transfer, || {
                    self.ledger.transfer(from, to, amount)
                });
                check_outcome(result, expect_error.as_deref())
            }
            ScenarioStep::Approve {
                owner,
                spender,
                amount,
                expect_error,
            } => {
                let (owner, spender, amount) =
                    (self.address(owner)?, self.address(spender)?, parse_amount(amount)?);
                let result = self.timed(OperationKind::Approve, || {
                    self.ledger.approve(owner, spender, amount)
                });
                check_outcome(result, expect_error.as_deref())
            }
            ScenarioStep::TransferFrom {
                spender,
                owner,
                to,
                amount,
                expect_error,
            } => {
                let spender = self.address(spender)?;
                let owner = self.address(owner)?;
                let to = self.address(to)?;
                let amount = parse_amount(amount)?;
                let result = self.timed(OperationKind::TransferFrom, || {
                    self.ledger.transfer_from(spender, owner, to, amount)
                });
                check_outcome(result, expect_error.as_deref())
            }
            ScenarioStep::Assert { condition } => self.check_condition(condition),
        }
    }

    fn check_condition(&self, condition: &AssertCondition) -> anyhow::Result<()> {
        match condition {
            AssertCondition::BalanceEquals { account, amount } => {
                let expected = parse_amount(amount)?;
                let actual = self.ledger.balance_of(&self.address(account)?);
                if actual != expected {
                    anyhow::bail!("balance of {} is {}, expected {}", account, actual, expected);
                }
            }
            AssertCondition::AllowanceEquals {
                owner,
                spender,
                amount,
            } => {
                let expected = parse_amount(amount)?;
                let actual = self
                    .ledger
                    .allowance(&self.address(owner)?, &self.address(spender)?);
                if actual != expected {
                    anyhow::bail!(
                        "allowance of {} over {} is {}, expected {}",
                        spender,
                        owner,
                        actual,
                        expected
                    );
                }
            }
            AssertCondition::SupplyConserved => {
                let report = self.ledger.verify_integrity();
                if !report.is_consistent() {
                    anyhow::bail!(
                        "balances sum to {:?}, total supply is {}",
                        report.balance_sum,
                        report.total_supply
                    );
                }
            }
        }
        debug!(?condition, "Assertion held");
        Ok(())
    }

    /// Drive `operations` random calls split across `workers` tasks.
    ///
    /// Returns what a subscriber attached for the run observed.
    pub async fn run_load(&self, operations: usize, workers: usize) -> anyhow::Result<ObservedEvents> {
        if self.accounts.len() < 2 {
            anyhow::bail!("Load run needs at least 2 accounts");
        }
        let workers = workers.max(1);

        AccountFactory::fund(
            &self.ledger,
            &self.accounts,
            TokenAmount::from_whole(LOAD_FUNDING_WHOLE),
        )?;
        info!(
            accounts = self.accounts.len(),
            funding = LOAD_FUNDING_WHOLE,
            "Funded simulated accounts"
        );

        let mut rx = self.ledger.subscribe();

        let addresses: Arc<Vec<Address>> =
            Arc::new(self.accounts.iter().map(|a| a.address).collect());
        let per_worker = operations / workers;
        let remainder = operations % workers;

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let count = per_worker + usize::from(worker < remainder);
            let ledger = Arc::clone(&self.ledger);
            let addresses = Arc::clone(&addresses);
            let metrics = Arc::clone(&self.metrics);
            let seed = self.seed.wrapping_add(worker as u64);

            handles.push(tokio::spawn(async move {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut local = SimulationMetrics::new();
                for _ in 0..count {
                    run_random_operation(&ledger, &addresses, &mut rng, &mut local);
                    tokio::task::yield_now().await;
                }
                metrics.lock().merge(&local);
            }));
        }

        for handle in handles {
            handle.await?;
        }

        let mut observed = ObservedEvents::default();
        loop {
            match rx.try_recv() {
                Ok(_) => observed.received += 1,
                Err(TryRecvError::Lagged(skipped)) => observed.lagged += skipped,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if observed.lagged > 0 {
            warn!(lagged = observed.lagged, "Event subscriber fell behind");
        }

        Ok(observed)
    }

    /// Get simulation metrics.
    pub fn get_metrics(&self) -> SimulationMetrics {
        self.metrics.lock().clone()
    }

    fn address(&self, label: &str) -> anyhow::Result<Address> {
        AccountFactory::resolve(&self.ledger, &self.accounts, label)
            .ok_or_else(|| anyhow::anyhow!("Unknown account label: {}", label))
    }

    fn timed<F>(&self, kind: OperationKind, call: F) -> LedgerResult<Receipt>
    where
        F: FnOnce() -> LedgerResult<Receipt>,
    {
        let start = Instant::now();
        let result = call();
        record(&mut self.metrics.lock(), kind, &result, start);
        result
    }
}

fn record(
    metrics: &mut SimulationMetrics,
    kind: OperationKind,
    result: &LedgerResult<Receipt>,
    start: Instant,
) {
    match result {
        Ok(_) => metrics.record_success(kind, start.elapsed().as_micros() as u64),
        Err(e) => metrics.record_failure(e.error_code()),
    }
}

/// One random call: 60% transfer, 20% approve, 20% transfer_from.
fn run_random_operation(
    ledger: &Ledger,
    addresses: &[Address],
    rng: &mut StdRng,
    metrics: &mut SimulationMetrics,
) {
    let pick = |rng: &mut StdRng| addresses[rng.gen_range(0..addresses.len())];
    let a = pick(rng);
    let b = pick(rng);
    let c = pick(rng);
    // Up to a quarter of the initial funding, with a fractional part
    let amount = TokenAmount::from_base_units(
        rng.gen_range(0..LOAD_FUNDING_WHOLE as u128 / 4) * tinydex_common::BASE_UNITS_PER_TOKEN
            + rng.gen_range(0..tinydex_common::BASE_UNITS_PER_TOKEN),
    );

    let start = Instant::now();
    let roll = rng.gen_range(0..10);
    let (kind, result) = match roll {
        0..=5 => (OperationKind::Transfer, ledger.transfer(a, b, amount)),
        6 | 7 => (OperationKind::Approve, ledger.approve(a, b, amount)),
        _ => (
            OperationKind::TransferFrom,
            ledger.transfer_from(a, b, c, amount),
        ),
    };
    record(metrics, kind, &result, start);
}

fn parse_amount(amount: &str) -> anyhow::Result<TokenAmount> {
    let value = Decimal::from_str_exact(amount)
        .map_err(|e| anyhow::anyhow!("Invalid amount {}: {}", amount, e))?;
    TokenAmount::from_decimal(value)
        .ok_or_else(|| anyhow::anyhow!("Amount out of range: {}", amount))
}

fn check_outcome(result: LedgerResult<Receipt>, expect_error: Option<&str>) -> anyhow::Result<()> {
    match (result, expect_error) {
        (Ok(_), None) => Ok(()),
        (Err(e), Some(code)) if e.error_code() == code => {
            debug!(error_code = code, "Call rejected as expected");
            Ok(())
        }
        (Ok(receipt), Some(code)) => Err(anyhow::anyhow!(
            "expected {} but call succeeded with {} event(s)",
            code,
            receipt.events.len()
        )),
        (Err(e), _) => Err(anyhow::anyhow!("unexpected rejection {}: {}", e.error_code(), e)),
    }
}
