//! Read-only gateway operations
//!
//! Each wrapper normalizes its hex arguments, adds the protocol version and
//! forwards to [`GatewayClient::query`]. Numeric range arguments travel as strings.

use super::client::GatewayClient;
use super::types::{GatewayResponse, Operation};
use crate::encoding::{hex_fix, now_timestamp, string_to_hex, SystemClock};
use crate::error::ClientResult;

use serde_json::json;

impl GatewayClient {
    // Smart contracts

    /// Dry-run a smart contract project
    pub async fn test_contract(
        &self,
        blockchain: &str,
        from: &str,
        project: &str,
    ) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "From": hex_fix(from),
            "Timestamp": now_timestamp(&SystemClock),
            "Project": string_to_hex(project),
            "Version": self.version(),
        });
        self.query(Operation::TestContract, body).await
    }

    /// Call a contract's local endpoint
    pub async fn call_contract(
        &self,
        blockchain: &str,
        from: &str,
        address: &str,
        request: &str,
    ) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "From": hex_fix(from),
            "Address": hex_fix(address),
            "Request": string_to_hex(request),
            "Timestamp": now_timestamp(&SystemClock),
            "Version": self.version(),
        });
        self.query(Operation::CallContract, body).await
    }

    // Wallets

    pub async fn check_wallet(&self, blockchain: &str, address: &str) -> ClientResult<GatewayResponse> {
        self.query(Operation::CheckWallet, self.address_body(blockchain, address))
            .await
    }

    pub async fn get_wallet(&self, blockchain: &str, address: &str) -> ClientResult<GatewayResponse> {
        self.query(Operation::GetWallet, self.address_body(blockchain, address))
            .await
    }

    pub async fn get_latest_transactions(
        &self,
        blockchain: &str,
        address: &str,
    ) -> ClientResult<GatewayResponse> {
        self.query(
            Operation::GetLatestTransactions,
            self.address_body(blockchain, address),
        )
        .await
    }

    /// Balance of one asset (e.g. `CIRX`) in a wallet
    pub async fn get_wallet_balance(
        &self,
        blockchain: &str,
        address: &str,
        asset: &str,
    ) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "Address": hex_fix(address),
            "Asset": asset,
            "Version": self.version(),
        });
        self.query(Operation::GetWalletBalance, body).await
    }

    pub async fn get_wallet_nonce(&self, blockchain: &str, address: &str) -> ClientResult<GatewayResponse> {
        self.query(Operation::GetWalletNonce, self.address_body(blockchain, address))
            .await
    }

    // Domains and assets

    /// Resolve a domain name to its wallet address
    pub async fn get_domain(&self, blockchain: &str, name: &str) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "Domain": name,
            "Version": self.version(),
        });
        self.query(Operation::ResolveDomain, body).await
    }

    pub async fn get_asset_list(&self, blockchain: &str) -> ClientResult<GatewayResponse> {
        self.query(Operation::GetAssetList, self.chain_body(blockchain))
            .await
    }

    pub async fn get_asset(&self, blockchain: &str, name: &str) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "AssetName": name,
            "Version": self.version(),
        });
        self.query(Operation::GetAsset, body).await
    }

    /// Total, circulating and residual supply of an asset
    pub async fn get_asset_supply(&self, blockchain: &str, name: &str) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "AssetName": name,
            "Version": self.version(),
        });
        self.query(Operation::GetAssetSupply, body).await
    }

    pub async fn get_voucher(&self, blockchain: &str, code: u64) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "Code": code.to_string(),
            "Version": self.version(),
        });
        self.query(Operation::GetVoucher, body).await
    }

    // Blocks

    /// Blocks in `[start, end]`; with `end == 0`, the last `start` blocks
    pub async fn get_block_range(
        &self,
        blockchain: &str,
        start: u64,
        end: u64,
    ) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "Start": start.to_string(),
            "End": end.to_string(),
            "Version": self.version(),
        });
        self.query(Operation::GetBlockRange, body).await
    }

    pub async fn get_block(&self, blockchain: &str, number: u64) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "BlockNumber": number.to_string(),
            "Version": self.version(),
        });
        self.query(Operation::GetBlock, body).await
    }

    /// Block height
    pub async fn get_block_count(&self, blockchain: &str) -> ClientResult<GatewayResponse> {
        self.query(Operation::GetBlockCount, self.chain_body(blockchain))
            .await
    }

    pub async fn get_analytics(&self, blockchain: &str) -> ClientResult<GatewayResponse> {
        self.query(Operation::GetAnalytics, self.chain_body(blockchain))
            .await
    }

    /// Blockchains available on the network
    pub async fn get_blockchains(&self) -> ClientResult<GatewayResponse> {
        self.query(Operation::GetBlockchains, json!({})).await
    }

    // Transactions

    pub async fn get_pending_transaction(
        &self,
        blockchain: &str,
        tx_id: &str,
    ) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "ID": hex_fix(tx_id),
            "Version": self.version(),
        });
        self.query(Operation::GetPendingTransaction, body).await
    }

    /// Search a transaction among pending ones, then in blocks `[start, end]`
    pub async fn get_transaction_by_id(
        &self,
        blockchain: &str,
        tx_id: &str,
        start: u64,
        end: u64,
    ) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "ID": hex_fix(tx_id),
            "Start": start.to_string(),
            "End": end.to_string(),
            "Version": self.version(),
        });
        self.query(Operation::GetTransactionById, body).await
    }

    /// Transactions broadcast by a node
    pub async fn get_transactions_by_node(
        &self,
        blockchain: &str,
        node_id: &str,
        start: u64,
        end: u64,
    ) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "NodeID": hex_fix(node_id),
            "Start": start.to_string(),
            "End": end.to_string(),
            "Version": self.version(),
        });
        self.query(Operation::GetTransactionByNode, body).await
    }

    /// Transactions where `address` is sender or recipient
    pub async fn get_transactions_by_address(
        &self,
        blockchain: &str,
        address: &str,
        start: u64,
        end: u64,
    ) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "Address": hex_fix(address),
            "Start": start.to_string(),
            "End": end.to_string(),
            "Version": self.version(),
        });
        self.query(Operation::GetTransactionByAddress, body).await
    }

    pub async fn get_transactions_by_date(
        &self,
        blockchain: &str,
        address: &str,
        start_date: &str,
        end_date: &str,
    ) -> ClientResult<GatewayResponse> {
        let body = json!({
            "Blockchain": hex_fix(blockchain),
            "Address": hex_fix(address),
            "StartDate": start_date,
            "EndDate": end_date,
            "Version": self.version(),
        });
        self.query(Operation::GetTransactionByDate, body).await
    }

    fn chain_body(&self, blockchain: &str) -> serde_json::Value {
        json!({
            "Blockchain": hex_fix(blockchain),
            "Version": self.version(),
        })
    }

    fn address_body(&self, blockchain: &str, address: &str) -> serde_json::Value {
        json!({
            "Blockchain": hex_fix(blockchain),
            "Address": hex_fix(address),
            "Version": self.version(),
        })
    }
}
