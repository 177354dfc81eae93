//! Simulation scenarios.

use serde::{Deserialize, Serialize};

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
///
/// Accounts are referenced by label (`deployer`, `null`, or a simulated
/// holder such as `alice`). Amounts are whole-token decimals like `"10"` or
/// `"0.5"`. `expect_error` names the error code the call must fail with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Direct transfer.
    Transfer {
        from: String,
        to: String,
        amount: String,
        expect_error: Option<String>,
    },
    /// Set an allowance.
    Approve {
        owner: String,
        spender: String,
        amount: String,
        expect_error: Option<String>,
    },
    /// Delegated transfer.
    TransferFrom {
        spender: String,
        owner: String,
        to: String,
        amount: String,
        expect_error: Option<String>,
    },
    /// Assert a condition.
    Assert { condition: AssertCondition },
}

/// Conditions that can be asserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssertCondition {
    /// Account balance equals.
    BalanceEquals { account: String, amount: String },
    /// Allowance equals.
    AllowanceEquals {
        owner: String,
        spender: String,
        amount: String,
    },
    /// Balances add up to the total supply.
    SupplyConserved,
}

fn transfer(from: &str, to: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::Transfer {
        from: from.to_string(),
        to: to.to_string(),
        amount: amount.to_string(),
        expect_error: None,
    }
}

fn approve(owner: &str, spender: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::Approve {
        owner: owner.to_string(),
        spender: spender.to_string(),
        amount: amount.to_string(),
        expect_error: None,
    }
}

fn transfer_from(spender: &str, owner: &str, to: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::TransferFrom {
        spender: spender.to_string(),
        owner: owner.to_string(),
        to: to.to_string(),
        amount: amount.to_string(),
        expect_error: None,
    }
}

fn balance(account: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::Assert {
        condition: AssertCondition::BalanceEquals {
            account: account.to_string(),
            amount: amount.to_string(),
        },
    }
}

fn allowance(owner: &str, spender: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::Assert {
        condition: AssertCondition::AllowanceEquals {
            owner: owner.to_string(),
            spender: spender.to_string(),
            amount: amount.to_string(),
        },
    }
}

fn conserved() -> ScenarioStep {
    ScenarioStep::Assert {
        condition: AssertCondition::SupplyConserved,
    }
}

/// Attach an expected error code to a call step.
fn expecting(step: ScenarioStep, code: &str) -> ScenarioStep {
    let code = Some(code.to_string());
    match step {
        ScenarioStep::Transfer { from, to, amount, .. } => ScenarioStep::Transfer {
            from,
            to,
            amount,
            expect_error: code,
        },
        ScenarioStep::Approve { owner, spender, amount, .. } => ScenarioStep::Approve {
            owner,
            spender,
            amount,
            expect_error: code,
        },
        ScenarioStep::TransferFrom { spender, owner, to, amount, .. } => {
            ScenarioStep::TransferFrom {
                spender,
                owner,
                to,
                amount,
                expect_error: code,
            }
        }
        other => other,
    }
}

impl Scenario {
    /// Load a built-in scenario by name, or a JSON scenario file.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        if name.ends_with(".json") {
            let text = std::fs::read_to_string(name)?;
            return Ok(serde_json::from_str(&text)?);
        }

        match name {
            "walkthrough" => Ok(Self::walkthrough()),
            "approve-overwrite" => Ok(Self::approve_overwrite()),
            "rejections" => Ok(Self::rejections()),
            _ => Err(anyhow::anyhow!(
                "Unknown scenario: {} (available: {})",
                name,
                Self::names().join(", ")
            )),
        }
    }

    /// Names of the built-in scenarios.
    pub fn names() -> &'static [&'static str] {
        &["walkthrough", "approve-overwrite", "rejections"]
    }

    /// Genesis, a direct transfer, an unfunded transfer, and a full
    /// delegated spend followed by an over-allowance attempt.
    fn walkthrough() -> Self {
        Self {
            name: "walkthrough".to_string(),
            description: "Genesis, transfer, rejected transfer, delegated transfer".to_string(),
            steps: vec![
                balance("deployer", "21000000"),
                balance("alice", "0"),
                transfer("deployer", "bob", "10"),
                balance("deployer", "20999990"),
                balance("bob", "10"),
                expecting(transfer("alice", "bob", "100"), "INSUFFICIENT_BALANCE"),
                balance("bob", "10"),
                approve("deployer", "carol", "100"),
                allowance("deployer", "carol", "100"),
                transfer_from("carol", "deployer", "dave", "100"),
                balance("dave", "100"),
                balance("deployer", "20999890"),
                allowance("deployer", "carol", "0"),
                approve("deployer", "carol", "5"),
                expecting(
                    transfer_from("carol", "deployer", "dave", "6"),
                    "INSUFFICIENT_ALLOWANCE",
                ),
                balance("dave", "100"),
                conserved(),
            ],
        }
    }

    /// Approving twice keeps only the latest value.
    fn approve_overwrite() -> Self {
        Self {
            name: "approve-overwrite".to_string(),
            description: "Approve is a set, not an increment".to_string(),
            steps: vec![
                approve("deployer", "alice", "100"),
                approve("deployer", "alice", "30"),
                allowance("deployer", "alice", "30"),
                transfer_from("alice", "deployer", "alice", "30"),
                allowance("deployer", "alice", "0"),
                expecting(
                    transfer_from("alice", "deployer", "alice", "0.000000000000000001"),
                    "INSUFFICIENT_ALLOWANCE",
                ),
                conserved(),
            ],
        }
    }

    /// Every rejection kind, with state unchanged afterwards.
    fn rejections() -> Self {
        Self {
            name: "rejections".to_string(),
            description: "Each error kind is reported and has no effect".to_string(),
            steps: vec![
                expecting(transfer("deployer", "null", "1"), "INVALID_RECIPIENT"),
                expecting(approve("deployer", "null", "1"), "INVALID_SPENDER"),
                expecting(
                    transfer_from("alice", "deployer", "null", "1"),
                    "INVALID_RECIPIENT",
                ),
                expecting(
                    transfer_from("alice", "deployer", "bob", "1"),
                    "INSUFFICIENT_ALLOWANCE",
                ),
                approve("bob", "alice", "1000"),
                expecting(
                    transfer_from("alice", "bob", "carol", "1"),
                    "INSUFFICIENT_BALANCE",
                ),
                allowance("bob", "alice", "1000"),
                balance("deployer", "21000000"),
                conserved(),
            ],
        }
    }
}
