//! Provider wiring and treasury balance reads.

use alloy::{
    network::{Ethereum, EthereumWallet, NetworkWallet},
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use anyhow::{Context, Result};

use crate::decode::tokens_from_wei;

/// Read-only provider for balance queries.
pub async fn connect_provider(rpc_url: &str) -> Result<DynProvider> {
    let provider = ProviderBuilder::new()
        .connect(rpc_url)
        .await
        .context("Failed to connect to RPC endpoint")?
        .erased();
    Ok(provider)
}

/// Signing provider for transaction submission. Returns the provider and the
/// signer address.
pub async fn connect_signing_provider(
    rpc_url: &str,
    private_key: &str,
) -> Result<(DynProvider, Address)> {
    let signer: PrivateKeySigner = private_key
        .trim_start_matches("0x")
        .parse()
        .context("Failed to parse private key")?;
    let wallet = EthereumWallet::from(signer);
    let address = <EthereumWallet as NetworkWallet<Ethereum>>::default_signer_address(&wallet);

    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect(rpc_url)
        .await
        .context("Failed to connect to RPC endpoint")?
        .erased();
    Ok((provider, address))
}

/// Reads the treasury staking contract's native-token balance.
pub struct BalanceClient {
    provider: DynProvider,
    staking_contract: Address,
}

impl BalanceClient {
    pub fn new(provider: DynProvider, staking_contract: Address) -> Self {
        Self {
            provider,
            staking_contract,
        }
    }

    /// Current native balance of the staking contract, in whole tokens.
    pub async fn staking_balance_tokens(&self) -> Result<f64> {
        let wei = self
            .provider
            .get_balance(self.staking_contract)
            .await
            .context("Failed to fetch staking contract balance")?;
        Ok(tokens_from_wei(wei))
    }
}
