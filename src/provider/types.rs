/// Enhanced-transaction provider payload types
///
/// Wire shapes follow the provider's camelCase JSON. Unknown fields are
/// ignored so payload additions upstream don't break ingestion; token
/// amounts arrive either as floats (transfers) or as raw integer strings
/// scaled by 10^decimals (account data and swap events).

use serde::{ Deserialize, Serialize };
use serde_json::Value;

/// One entry from the signature listing endpoint (newest first)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
}

/// Enhanced transaction record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnhancedTransaction {
    pub signature: String,
    pub timestamp: i64,
    pub slot: u64,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub source: String,
    /// Non-null when the transaction failed on chain
    pub transaction_error: Option<Value>,
    pub native_transfers: Vec<NativeTransfer>,
    pub token_transfers: Vec<TokenTransfer>,
    pub account_data: Vec<AccountData>,
    pub events: TransactionEvents,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NativeTransfer {
    pub from_user_account: Option<String>,
    pub to_user_account: Option<String>,
    /// Lamports
    pub amount: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenTransfer {
    pub from_user_account: Option<String>,
    pub to_user_account: Option<String>,
    pub mint: String,
    /// Real (decimal-adjusted) amount
    pub token_amount: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountData {
    pub account: String,
    /// Signed lamports delta for this account
    pub native_balance_change: i64,
    pub token_balance_changes: Vec<TokenBalanceChange>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenBalanceChange {
    pub mint: String,
    /// Owner of the token account; may differ from the outer account
    pub user_account: String,
    pub raw_token_amount: RawTokenAmount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTokenAmount {
    /// Signed raw integer amount as a string, scaled by 10^decimals
    pub token_amount: String,
    pub decimals: u8,
}

impl RawTokenAmount {
    /// Decimal-adjusted real value
    pub fn to_real(&self) -> f64 {
        let raw: f64 = self.token_amount.parse().unwrap_or(0.0);
        raw / (10f64).powi(self.decimals as i32)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionEvents {
    pub swap: Option<SwapEvent>,
}

/// Structured swap event declared by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwapEvent {
    pub native_input: Option<NativeSwapLeg>,
    pub native_output: Option<NativeSwapLeg>,
    pub token_inputs: Vec<TokenSwapLeg>,
    pub token_outputs: Vec<TokenSwapLeg>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NativeSwapLeg {
    pub account: String,
    /// Lamports as a string
    pub amount: String,
}

impl NativeSwapLeg {
    pub fn to_sol(&self) -> f64 {
        let lamports: f64 = self.amount.parse().unwrap_or(0.0);
        lamports / (crate::constants::LAMPORTS_PER_SOL as f64)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenSwapLeg {
    pub user_account: String,
    pub mint: String,
    pub raw_token_amount: RawTokenAmount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instruction {
    pub program_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_payload() {
        let json =
            r#"{
            "signature": "sig1",
            "timestamp": 1700000000,
            "slot": 250000000,
            "type": "SWAP",
            "source": "JUPITER",
            "transactionError": null,
            "nativeTransfers": [
                {"fromUserAccount": "w1", "toUserAccount": "pool", "amount": 1000000000}
            ],
            "tokenTransfers": [
                {"fromUserAccount": "pool", "toUserAccount": "w1", "mint": "mint1", "tokenAmount": 42.5}
            ]
        }"#;

        let tx: EnhancedTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.signature, "sig1");
        assert_eq!(tx.tx_type, "SWAP");
        assert!(tx.transaction_error.is_none());
        assert_eq!(tx.native_transfers[0].amount, 1_000_000_000);
        assert_eq!(tx.token_transfers[0].token_amount, 42.5);
        assert!(tx.events.swap.is_none());
    }

    #[test]
    fn test_raw_token_amount_scaling() {
        let amount = RawTokenAmount {
            token_amount: "-2500000".to_string(),
            decimals: 6,
        };
        assert_eq!(amount.to_real(), -2.5);
    }

    #[test]
    fn test_swap_event_native_leg() {
        let leg = NativeSwapLeg {
            account: "w1".to_string(),
            amount: "500000000".to_string(),
        };
        assert_eq!(leg.to_sol(), 0.5);
    }
}
