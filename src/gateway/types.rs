//! Gateway wire types: operation names and the response envelope

use crate::error::{ClientError, ClientResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result code the gateway uses for success
pub const RESULT_OK: i64 = 200;

/// Gateway operations; each is a path segment appended to the base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    TestContract,
    CallContract,
    CheckWallet,
    GetWallet,
    GetLatestTransactions,
    GetWalletBalance,
    GetWalletNonce,
    ResolveDomain,
    GetAssetList,
    GetAsset,
    GetAssetSupply,
    GetVoucher,
    GetBlockRange,
    GetBlock,
    GetBlockCount,
    GetAnalytics,
    GetBlockchains,
    GetPendingTransaction,
    GetTransactionById,
    GetTransactionByNode,
    GetTransactionByAddress,
    GetTransactionByDate,
    AddTransaction,
}

impl Operation {
    pub const ALL: [Operation; 23] = [
        Operation::TestContract,
        Operation::CallContract,
        Operation::CheckWallet,
        Operation::GetWallet,
        Operation::GetLatestTransactions,
        Operation::GetWalletBalance,
        Operation::GetWalletNonce,
        Operation::ResolveDomain,
        Operation::GetAssetList,
        Operation::GetAsset,
        Operation::GetAssetSupply,
        Operation::GetVoucher,
        Operation::GetBlockRange,
        Operation::GetBlock,
        Operation::GetBlockCount,
        Operation::GetAnalytics,
        Operation::GetBlockchains,
        Operation::GetPendingTransaction,
        Operation::GetTransactionById,
        Operation::GetTransactionByNode,
        Operation::GetTransactionByAddress,
        Operation::GetTransactionByDate,
        Operation::AddTransaction,
    ];

    /// Endpoint name as the gateway spells it
    pub fn endpoint(&self) -> &'static str {
        match self {
            Operation::TestContract => "Circular_TestContract_",
            Operation::CallContract => "Circular_CallContract_",
            Operation::CheckWallet => "Circular_CheckWallet_",
            Operation::GetWallet => "Circular_GetWallet_",
            Operation::GetLatestTransactions => "Circular_GetLatestTransactions_",
            Operation::GetWalletBalance => "Circular_GetWalletBalance_",
            Operation::GetWalletNonce => "Circular_GetWalletNonce_",
            Operation::ResolveDomain => "Circular_ResolveDomain_",
            Operation::GetAssetList => "Circular_GetAssetList_",
            Operation::GetAsset => "Circular_GetAsset_",
            Operation::GetAssetSupply => "Circular_GetAssetSupply_",
            Operation::GetVoucher => "Circular_GetVoucher_",
            Operation::GetBlockRange => "Circular_GetBlockRange_",
            Operation::GetBlock => "Circular_GetBlock_",
            Operation::GetBlockCount => "Circular_GetBlockHeight_",
            Operation::GetAnalytics => "Circular_GetAnalytics_",
            Operation::GetBlockchains => "Circular_GetBlockchains_",
            Operation::GetPendingTransaction => "Circular_GetPendingTransaction_",
            Operation::GetTransactionById => "Circular_GetTransactionbyID_",
            Operation::GetTransactionByNode => "Circular_GetTransactionbyNode_",
            Operation::GetTransactionByAddress => "Circular_GetTransactionbyAddress_",
            Operation::GetTransactionByDate => "Circular_GetTransactionbyDate_",
            Operation::AddTransaction => "Circular_AddTransaction_",
        }
    }

    /// Look up an operation by endpoint name, with or without the `Circular_` decoration
    pub fn from_name(name: &str) -> Option<Operation> {
        let wanted = name
            .trim_start_matches("Circular_")
            .trim_end_matches('_')
            .to_ascii_lowercase();

        Operation::ALL.into_iter().find(|op| {
            op.endpoint()
                .trim_start_matches("Circular_")
                .trim_end_matches('_')
                .eq_ignore_ascii_case(&wanted)
        })
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Response envelope: `{ "Result": <code>, "Response": <payload>, "Node": <id> }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    #[serde(rename = "Result")]
    pub result: i64,
    #[serde(rename = "Response", default)]
    pub response: Value,
    #[serde(rename = "Node", default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl GatewayResponse {
    /// Build from any JSON body; a missing or non-numeric `Result` counts as failure (0)
    pub fn from_value(body: Value) -> Self {
        let result = body.get("Result").and_then(Value::as_i64).unwrap_or(0);
        let node = body
            .get("Node")
            .and_then(Value::as_str)
            .map(str::to_string);
        let response = match body {
            Value::Object(mut map) => map
                .remove("Response")
                .or_else(|| map.remove("error"))
                .unwrap_or(Value::Null),
            _ => Value::Null,
        };

        Self {
            result,
            response,
            node,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == RESULT_OK
    }

    /// Turn a non-200 result into [`ClientError::Gateway`]
    pub fn into_result(self) -> ClientResult<Value> {
        if self.is_success() {
            return Ok(self.response);
        }

        let message = match &self.response {
            Value::String(s) => s.clone(),
            Value::Null => "no response".to_string(),
            other => other.to_string(),
        };
        Err(ClientError::Gateway {
            code: self.result,
            message,
        })
    }
}

/// What happened to a transaction handed to the gateway
///
/// Submission never fails with an error: the caller always learns whether the
/// transaction reached the network.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The gateway answered with a JSON envelope (any result code)
    Response(GatewayResponse),
    /// The gateway answered with something that is not JSON
    Unparsed { status: u16, message: String },
    /// The gateway could not be reached
    Unreachable { message: String, error: String },
}

impl SubmitOutcome {
    pub(crate) fn unreachable(error: impl std::fmt::Display) -> Self {
        SubmitOutcome::Unreachable {
            message: "Server unreachable".to_string(),
            error: error.to_string(),
        }
    }

    /// True when the gateway accepted the transaction with result 200
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Response(r) if r.is_success())
    }

    pub fn response(&self) -> Option<&GatewayResponse> {
        match self {
            SubmitOutcome::Response(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_names() {
        assert_eq!(Operation::GetBlockCount.endpoint(), "Circular_GetBlockHeight_");
        assert_eq!(
            Operation::GetTransactionById.endpoint(),
            "Circular_GetTransactionbyID_"
        );
        assert_eq!(Operation::AddTransaction.to_string(), "Circular_AddTransaction_");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            Operation::from_name("Circular_GetBlockchains_"),
            Some(Operation::GetBlockchains)
        );
        assert_eq!(
            Operation::from_name("gettransactionbyid"),
            Some(Operation::GetTransactionById)
        );
        assert_eq!(Operation::from_name("Mint"), None);
    }

    #[test]
    fn test_envelope_parsing() {
        let response = GatewayResponse::from_value(json!({
            "Result": 200,
            "Response": {"Nonce": 4},
            "Node": "fc8f"
        }));
        assert!(response.is_success());
        assert_eq!(response.node.as_deref(), Some("fc8f"));
        assert_eq!(response.into_result().unwrap(), json!({"Nonce": 4}));
    }

    #[test]
    fn test_failure_envelopes() {
        let rejected = GatewayResponse::from_value(json!({
            "Result": 119,
            "Response": "Invalid Signature"
        }));
        match rejected.into_result() {
            Err(ClientError::Gateway { code, message }) => {
                assert_eq!(code, 119);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected {:?}", other),
        }

        let bare = GatewayResponse::from_value(json!({"error": "bad request"}));
        assert_eq!(bare.result, 0);
        assert_eq!(bare.response, json!("bad request"));
        assert!(!bare.is_success());
    }

    #[test]
    fn test_submit_outcome_success() {
        let ok = SubmitOutcome::Response(GatewayResponse::from_value(json!({"Result": 200})));
        assert!(ok.is_success());
        assert!(!SubmitOutcome::unreachable("connection refused").is_success());
    }
}
