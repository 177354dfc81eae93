//! Simulated token holders.

use tinydex_common::{Address, Result, TokenAmount};
use tinydex_ledger::Ledger;

/// A simulated account.
#[derive(Debug, Clone)]
pub struct SimulatedAccount {
    /// Short label, e.g. `alice`.
    pub label: String,
    /// Address derived from the label.
    pub address: Address,
}

impl SimulatedAccount {
    /// Create an account whose address is derived from `label`.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            address: Address::derive(&label),
            label,
        }
    }
}

/// Account factory for creating test holders.
pub struct AccountFactory;

impl AccountFactory {
    /// Create N simulated accounts.
    pub fn create_accounts(count: usize) -> Vec<SimulatedAccount> {
        let names = [
            "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy",
        ];

        (0..count)
            .map(|i| match names.get(i) {
                Some(name) => SimulatedAccount::new(*name),
                None => SimulatedAccount::new(format!("holder_{}", i)),
            })
            .collect()
    }

    /// Fund every account from the deployer.
    pub fn fund(ledger: &Ledger, accounts: &[SimulatedAccount], amount: TokenAmount) -> Result<()> {
        let deployer = ledger.deployer();
        for account in accounts {
            ledger.transfer(deployer, account.address, amount)?;
        }
        Ok(())
    }

    /// Look up an account by label; `deployer` resolves to the genesis account.
    pub fn resolve(ledger: &Ledger, accounts: &[SimulatedAccount], label: &str) -> Option<Address> {
        if label == "deployer" {
            return Some(ledger.deployer());
        }
        if label == "null" {
            return Some(Address::ZERO);
        }
        accounts
            .iter()
            .find(|a| a.label == label)
            .map(|a| a.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_accounts() {
        let accounts = AccountFactory::create_accounts(12);
        assert_eq!(accounts.len(), 12);
        assert_eq!(accounts[0].label, "alice");
        assert_eq!(accounts[11].label, "holder_11");
        assert_eq!(accounts[1].address, Address::derive("bob"));
    }

    #[test]
    fn test_fund_and_resolve() {
        let ledger = Ledger::with_deployer(Address::derive("deployer")).unwrap();
        let accounts = AccountFactory::create_accounts(3);

        AccountFactory::fund(&ledger, &accounts, TokenAmount::from_whole(50)).unwrap();

        let carol = AccountFactory::resolve(&ledger, &accounts, "carol").unwrap();
        assert_eq!(ledger.balance_of(&carol), TokenAmount::from_whole(50));
        assert_eq!(
            AccountFactory::resolve(&ledger, &accounts, "deployer"),
            Some(ledger.deployer())
        );
        assert_eq!(AccountFactory::resolve(&ledger, &accounts, "null"), Some(Address::ZERO));
        assert!(AccountFactory::resolve(&ledger, &accounts, "mallory").is_none());
    }
}
