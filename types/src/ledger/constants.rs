use super::{AccountId, CoinId, HolderId};

/// The economy-wide source and sink. May carry a negative balance.
pub const SYSTEM_ACCOUNT: AccountId = AccountId(0);

/// Holder owning [SYSTEM_ACCOUNT].
pub const SYSTEM_HOLDER: HolderId = HolderId(0);

/// Coin seeded at genesis and used for the account-creation stake.
pub const DEFAULT_COIN: CoinId = CoinId(0);

/// Stake granted to every new account
pub const INITIAL_STAKE: u64 = 1_000;

/// Shortest chain-hash prefix accepted by lookups (also the prefix index bucket width)
pub const MIN_PREFIX_LENGTH: usize = 6;

/// Width of a hex-rendered SHA-256 digest
pub const DIGEST_HEX_LENGTH: usize = 64;

/// Maximum coin name length
pub const MAX_NAME_LENGTH: usize = 32;

/// Maximum transaction reason length
pub const MAX_REASON_LENGTH: usize = 256;

/// Maximum length of a game id or secret (hex characters)
pub const MAX_SECRET_LENGTH: usize = 1_024;

/// Maximum number of entries held by one index value
pub const MAX_INDEX_ENTRIES: usize = 1 << 24;

/// Maximum number of coins or accounts tracked by one record
pub const MAX_RECORD_ENTRIES: usize = 4_096;

// Default reasons written to the ledger
pub const TRANSFER_REASON: &str = "No reason provided - transaction";
pub const FORCE_TRANSFER_REASON: &str = "No reason provided - Force transaction";
pub const CONSOLIDATION_REASON: &str = "Holder consolidation";
pub const HOLDER_PAYMENT_REASON: &str = "Holder payment";
pub const GAME_SETTLEMENT_REASON: &str = "Game settlement";
pub const REWARD_PAYOUT_REASON: &str = "Reward payout";
